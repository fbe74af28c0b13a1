pub mod handlers;
pub mod keysyms;

pub use handlers::{ButtonBinding, KeyBinding, clean_mask, handle_button_press, handle_key_press};

use serde::Deserialize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
pub enum KeyAction {
    Spawn,
    KillClient,
    Quit,
    Restart,
    ToggleBar,
    SetTabMode,
    FocusStack,
    FocusTiled,
    FocusSameFloat,
    FocusMaster,
    FocusUrgent,
    FocusWindow,
    Zoom,
    IncNumMaster,
    SetMasterFactor,
    SetMasterExtra,
    SetStackExtra,
    SetLayout,
    SetAttach,
    ToggleFloating,
    ToggleFullScreen,
    View,
    ToggleView,
    Tag,
    ToggleTag,
    SwapTags,
    ShiftView,
    ShiftTag,
    FocusMonitor,
    TagMonitor,
    ScratchShow,
    ScratchHide,
    ScratchToggle,
    ScratchClaim,
    ScratchRelease,
    HideClient,
    ShowAllHidden,
    MoveMouse,
    ResizeMouse,
    None,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum Arg {
    None,
    Int(i32),
    UInt(u32),
    Float(f32),
    Str(String),
    Array(Vec<String>),
}

impl Arg {
    pub const fn none() -> Self {
        Arg::None
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Arg::Int(value) => Some(*value),
            Arg::UInt(value) => i32::try_from(*value).ok(),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u32> {
        match self {
            Arg::UInt(value) => Some(*value),
            Arg::Int(value) => u32::try_from(*value).ok(),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Arg::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// The command line for `Spawn`; a plain string runs through `sh -c`.
    pub fn as_command(&self) -> Option<Vec<String>> {
        match self {
            Arg::Str(command) => Some(vec!["sh".into(), "-c".into(), command.clone()]),
            Arg::Array(argv) if !argv.is_empty() => Some(argv.clone()),
            _ => None,
        }
    }
}
