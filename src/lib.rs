pub mod bar;
pub mod client;
pub mod config;
pub mod errors;
pub mod keyboard;
pub mod layout;
pub mod monitor;
pub mod process;
pub mod size_hints;
pub mod status;
pub mod systray;
pub mod window_manager;
pub mod x;

use crate::client::TagMask;
use crate::errors::ConfigError;
use crate::keyboard::Arg;
use serde::Deserialize;

/// Tag masks are 32 bits wide; one bit stays free so the all-tags mask
/// never collides with a sentinel.
pub const MAX_TAGS: usize = 31;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct ColorScheme {
    pub foreground: u32,
    pub background: u32,
    pub border: u32,
}

/// Matched against new windows; `None` fields match anything and the other
/// fields use substring matching.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Rule {
    pub class: Option<String>,
    pub instance: Option<String>,
    pub title: Option<String>,
    pub tags: TagMask,
    pub floating: bool,
    pub centered: bool,
    /// Monitor index, or -1 for the selected monitor.
    pub monitor: i32,
    pub scratch_key: i32,
}

impl Rule {
    pub fn matches(&self, class: &str, instance: &str, title: &str) -> bool {
        let matches = |pattern: &Option<String>, value: &str| {
            pattern
                .as_deref()
                .is_none_or(|pattern| value.contains(pattern))
        };
        matches(&self.class, class) && matches(&self.instance, instance) && matches(&self.title, title)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Scratchpad {
    pub key: i32,
    pub command: Vec<String>,
}

#[derive(Clone)]
pub struct Config {
    // Appearance
    pub border_width: u32,
    pub font: String,
    pub show_bar: bool,
    pub top_bar: bool,
    pub tab_mode: monitor::TabMode,
    pub top_tab: bool,
    pub snap: i32,

    // Gaps
    pub gaps_enabled: bool,
    pub gap_inner_horizontal: u32,
    pub gap_inner_vertical: u32,
    pub gap_outer_horizontal: u32,
    pub gap_outer_vertical: u32,

    // Layout defaults
    pub master_factor: f32,
    pub num_master: i32,
    pub resize_hints: bool,
    pub min_slot_height: i32,
    pub layouts: Vec<layout::LayoutType>,
    pub attach_policies: Vec<monitor::AttachPolicy>,

    // Basics
    pub modkey: x11rb::protocol::xproto::KeyButMask,
    pub tags: Vec<String>,
    pub keybindings: Vec<keyboard::KeyBinding>,
    pub buttons: Vec<keyboard::ButtonBinding>,
    pub rules: Vec<Rule>,
    pub scratchpads: Vec<Scratchpad>,
    pub signals: Vec<status::SignalBinding>,
    pub notify_command: Vec<String>,
    pub autostart: Vec<Vec<String>>,

    // Systray
    pub systray_enabled: bool,
    pub systray_spacing: u32,

    // Color schemes
    pub scheme_normal: ColorScheme,
    pub scheme_selected: ColorScheme,
    pub scheme_urgent: ColorScheme,
    pub status_schemes: Vec<ColorScheme>,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.tags.len() {
            0 => Err(ConfigError::NoTags),
            count if count > MAX_TAGS => Err(ConfigError::TooManyTags(count)),
            _ => Ok(()),
        }
    }

    /// Mask with one bit per configured tag.
    pub fn tag_mask(&self) -> TagMask {
        (1u32 << self.tags.len().min(MAX_TAGS)) - 1
    }

    pub fn gaps(&self) -> layout::GapConfig {
        if !self.gaps_enabled {
            return layout::GapConfig::default();
        }
        layout::GapConfig {
            inner_horizontal: self.gap_inner_horizontal as i32,
            inner_vertical: self.gap_inner_vertical as i32,
            outer_horizontal: self.gap_outer_horizontal as i32,
            outer_vertical: self.gap_outer_vertical as i32,
        }
    }

    pub fn scratchpad_command(&self, key: i32) -> Option<&[String]> {
        self.scratchpads
            .iter()
            .find(|scratchpad| scratchpad.key == key)
            .map(|scratchpad| scratchpad.command.as_slice())
    }
}

fn command(argv: &[&str]) -> Arg {
    Arg::Array(argv.iter().map(|arg| arg.to_string()).collect())
}

impl Default for Config {
    fn default() -> Self {
        use crate::bar::ClickRegion;
        use crate::keyboard::keysyms::*;
        use crate::keyboard::{ButtonBinding, KeyAction, KeyBinding};
        use crate::layout::LayoutType;
        use crate::monitor::{AttachPolicy, TabMode};
        use crate::status::{ArgKind, SignalBinding};
        use x11rb::protocol::xproto::KeyButMask;

        const MODKEY: KeyButMask = KeyButMask::MOD4;
        const SHIFT: KeyButMask = KeyButMask::SHIFT;
        const CONTROL: KeyButMask = KeyButMask::CONTROL;
        const ALT: KeyButMask = KeyButMask::MOD1;

        const TERMINAL: &str = "st";

        let key = |modifiers: &[KeyButMask], keysym: Keysym, func: KeyAction, arg: Arg| {
            KeyBinding::new(modifiers.to_vec(), keysym, func, arg)
        };

        let mut keybindings = vec![
            key(&[MODKEY], XK_P, KeyAction::Spawn, command(&["dmenu_run"])),
            key(&[MODKEY, SHIFT], XK_RETURN, KeyAction::Spawn, command(&[TERMINAL])),
            key(&[MODKEY], XK_B, KeyAction::ToggleBar, Arg::None),
            key(&[MODKEY, SHIFT], XK_T, KeyAction::SetTabMode, Arg::None),
            key(&[MODKEY], XK_J, KeyAction::FocusStack, Arg::Int(1)),
            key(&[MODKEY], XK_K, KeyAction::FocusStack, Arg::Int(-1)),
            key(&[MODKEY, ALT], XK_J, KeyAction::FocusTiled, Arg::Int(1)),
            key(&[MODKEY, ALT], XK_K, KeyAction::FocusTiled, Arg::Int(-1)),
            key(&[MODKEY, CONTROL], XK_J, KeyAction::FocusSameFloat, Arg::Int(1)),
            key(&[MODKEY, CONTROL], XK_K, KeyAction::FocusSameFloat, Arg::Int(-1)),
            key(&[MODKEY], XK_M, KeyAction::FocusMaster, Arg::None),
            key(&[MODKEY], XK_U, KeyAction::FocusUrgent, Arg::None),
            key(&[MODKEY], XK_I, KeyAction::IncNumMaster, Arg::Int(1)),
            key(&[MODKEY], XK_D, KeyAction::IncNumMaster, Arg::Int(-1)),
            key(&[MODKEY], XK_H, KeyAction::SetMasterFactor, Arg::Float(-0.05)),
            key(&[MODKEY], XK_L, KeyAction::SetMasterFactor, Arg::Float(0.05)),
            key(&[MODKEY, SHIFT], XK_H, KeyAction::SetMasterExtra, Arg::Int(20)),
            key(&[MODKEY, SHIFT], XK_L, KeyAction::SetMasterExtra, Arg::Int(-20)),
            key(&[MODKEY, SHIFT], XK_O, KeyAction::SetStackExtra, Arg::Int(20)),
            key(&[MODKEY, SHIFT], XK_Y, KeyAction::SetStackExtra, Arg::Int(-20)),
            key(&[MODKEY], XK_RETURN, KeyAction::Zoom, Arg::None),
            key(&[MODKEY], XK_TAB, KeyAction::View, Arg::UInt(0)),
            key(&[MODKEY, SHIFT], XK_C, KeyAction::KillClient, Arg::None),
            key(&[MODKEY], XK_T, KeyAction::SetLayout, Arg::UInt(0)),
            key(&[MODKEY], XK_E, KeyAction::SetLayout, Arg::UInt(1)),
            key(&[MODKEY], XK_F, KeyAction::SetLayout, Arg::UInt(2)),
            key(&[MODKEY, SHIFT], XK_F, KeyAction::SetLayout, Arg::UInt(3)),
            key(&[MODKEY], XK_SPACE, KeyAction::SetLayout, Arg::None),
            key(&[MODKEY, SHIFT], XK_SPACE, KeyAction::ToggleFloating, Arg::None),
            key(&[MODKEY], XK_Y, KeyAction::ToggleFullScreen, Arg::None),
            key(&[MODKEY, ALT], XK_A, KeyAction::SetAttach, Arg::None),
            key(&[MODKEY, ALT], XK_1, KeyAction::SetAttach, Arg::UInt(0)),
            key(&[MODKEY, ALT], XK_2, KeyAction::SetAttach, Arg::UInt(1)),
            key(&[MODKEY, ALT], XK_3, KeyAction::SetAttach, Arg::UInt(2)),
            key(&[MODKEY], XK_0, KeyAction::View, Arg::UInt(!0)),
            key(&[MODKEY, SHIFT], XK_0, KeyAction::Tag, Arg::UInt(!0)),
            key(&[MODKEY], XK_COMMA, KeyAction::FocusMonitor, Arg::Int(-1)),
            key(&[MODKEY], XK_PERIOD, KeyAction::FocusMonitor, Arg::Int(1)),
            key(&[MODKEY, SHIFT], XK_COMMA, KeyAction::TagMonitor, Arg::Int(-1)),
            key(&[MODKEY, SHIFT], XK_PERIOD, KeyAction::TagMonitor, Arg::Int(1)),
            key(&[MODKEY], XK_RIGHT, KeyAction::ShiftView, Arg::Int(1)),
            key(&[MODKEY], XK_LEFT, KeyAction::ShiftView, Arg::Int(-1)),
            key(&[MODKEY, SHIFT], XK_RIGHT, KeyAction::ShiftTag, Arg::Int(1)),
            key(&[MODKEY, SHIFT], XK_LEFT, KeyAction::ShiftTag, Arg::Int(-1)),
            key(&[MODKEY], XK_GRAVE, KeyAction::ScratchToggle, Arg::Int(1)),
            key(&[MODKEY], XK_C, KeyAction::ScratchToggle, Arg::Int(2)),
            key(&[MODKEY], XK_V, KeyAction::ScratchToggle, Arg::Int(3)),
            key(&[MODKEY, SHIFT], XK_GRAVE, KeyAction::ScratchClaim, Arg::Int(-1)),
            key(&[MODKEY, ALT], XK_GRAVE, KeyAction::ScratchToggle, Arg::Int(-1)),
            key(&[MODKEY, CONTROL], XK_GRAVE, KeyAction::ScratchRelease, Arg::None),
            key(&[MODKEY], XK_S, KeyAction::HideClient, Arg::None),
            key(&[MODKEY, SHIFT], XK_S, KeyAction::ShowAllHidden, Arg::None),
            key(&[MODKEY, SHIFT], XK_R, KeyAction::Restart, Arg::None),
            key(&[MODKEY, SHIFT], XK_Q, KeyAction::Quit, Arg::None),
        ];

        let tag_keys = [XK_1, XK_2, XK_3, XK_4, XK_5, XK_6, XK_7, XK_8, XK_9];
        for (index, &keysym) in tag_keys.iter().enumerate() {
            let mask = Arg::UInt(1 << index);
            keybindings.extend([
                key(&[MODKEY], keysym, KeyAction::View, mask.clone()),
                key(&[MODKEY, CONTROL], keysym, KeyAction::ToggleView, mask.clone()),
                key(&[MODKEY, SHIFT], keysym, KeyAction::Tag, mask.clone()),
                key(&[MODKEY, CONTROL, SHIFT], keysym, KeyAction::ToggleTag, mask.clone()),
                key(&[MODKEY, ALT, SHIFT], keysym, KeyAction::SwapTags, mask),
            ]);
        }

        let button = |click: ClickRegion, modifiers: &[KeyButMask], button: u8, func: KeyAction, arg: Arg| {
            ButtonBinding::new(click, modifiers.to_vec(), button, func, arg)
        };

        let buttons = vec![
            button(ClickRegion::LayoutSymbol, &[], 1, KeyAction::SetLayout, Arg::None),
            button(ClickRegion::LayoutSymbol, &[], 3, KeyAction::SetLayout, Arg::UInt(2)),
            button(ClickRegion::WindowTitle, &[], 2, KeyAction::Zoom, Arg::None),
            button(ClickRegion::StatusText, &[], 2, KeyAction::Spawn, command(&[TERMINAL])),
            button(ClickRegion::ClientWindow, &[MODKEY], 1, KeyAction::MoveMouse, Arg::None),
            button(ClickRegion::ClientWindow, &[MODKEY], 2, KeyAction::ToggleFloating, Arg::None),
            button(ClickRegion::ClientWindow, &[MODKEY], 3, KeyAction::ResizeMouse, Arg::None),
            button(ClickRegion::TagBar, &[], 1, KeyAction::View, Arg::None),
            button(ClickRegion::TagBar, &[], 3, KeyAction::ToggleView, Arg::None),
            button(ClickRegion::TagBar, &[MODKEY], 1, KeyAction::Tag, Arg::None),
            button(ClickRegion::TagBar, &[MODKEY], 3, KeyAction::ToggleTag, Arg::None),
            button(ClickRegion::TabBar, &[], 1, KeyAction::FocusWindow, Arg::None),
        ];

        let signals = vec![
            SignalBinding::new("focusstack", KeyAction::FocusStack, ArgKind::Int),
            SignalBinding::new("setmfact", KeyAction::SetMasterFactor, ArgKind::Float),
            SignalBinding::new("incnmaster", KeyAction::IncNumMaster, ArgKind::Int),
            SignalBinding::new("togglebar", KeyAction::ToggleBar, ArgKind::None),
            SignalBinding::new("togglefloating", KeyAction::ToggleFloating, ArgKind::None),
            SignalBinding::new("killclient", KeyAction::KillClient, ArgKind::None),
            SignalBinding::new("zoom", KeyAction::Zoom, ArgKind::None),
            SignalBinding::new("setlayoutex", KeyAction::SetLayout, ArgKind::UInt),
            SignalBinding::new("viewex", KeyAction::View, ArgKind::TagIndex),
            SignalBinding::new("toggleviewex", KeyAction::ToggleView, ArgKind::TagIndex),
            SignalBinding::new("tagex", KeyAction::Tag, ArgKind::TagIndex),
            SignalBinding::new("toggletagex", KeyAction::ToggleTag, ArgKind::TagIndex),
            SignalBinding::new("shiftview", KeyAction::ShiftView, ArgKind::Int),
            SignalBinding::new("scratchtoggle", KeyAction::ScratchToggle, ArgKind::Int),
            SignalBinding::new("quit", KeyAction::Quit, ArgKind::None),
        ];

        Self {
            border_width: 1,
            font: "monospace:size=10".to_string(),
            show_bar: true,
            top_bar: true,
            tab_mode: TabMode::Auto,
            top_tab: true,
            snap: 32,
            gaps_enabled: true,
            gap_inner_horizontal: 10,
            gap_inner_vertical: 10,
            gap_outer_horizontal: 10,
            gap_outer_vertical: 10,
            master_factor: 0.55,
            num_master: 1,
            resize_hints: false,
            min_slot_height: 32,
            layouts: vec![
                LayoutType::Tile,
                LayoutType::Deck,
                LayoutType::Monocle,
                LayoutType::Floating,
            ],
            attach_policies: vec![
                AttachPolicy::Front,
                AttachPolicy::Aside,
                AttachPolicy::Below,
                AttachPolicy::Above,
                AttachPolicy::Bottom,
            ],
            modkey: MODKEY,
            tags: (1..=9).map(|tag| tag.to_string()).collect(),
            keybindings,
            buttons,
            rules: vec![
                Rule {
                    class: Some("Gimp".into()),
                    floating: true,
                    monitor: -1,
                    ..Rule::default()
                },
                Rule {
                    class: Some("firefox".into()),
                    tags: 1 << 8,
                    monitor: -1,
                    ..Rule::default()
                },
                Rule {
                    instance: Some("scratchterm".into()),
                    floating: true,
                    centered: true,
                    monitor: -1,
                    scratch_key: 1,
                    ..Rule::default()
                },
                Rule {
                    instance: Some("scratchcalc".into()),
                    floating: true,
                    centered: true,
                    monitor: -1,
                    scratch_key: 2,
                    ..Rule::default()
                },
                Rule {
                    instance: Some("scratchmixer".into()),
                    floating: true,
                    centered: true,
                    monitor: -1,
                    scratch_key: 3,
                    ..Rule::default()
                },
            ],
            scratchpads: vec![
                Scratchpad {
                    key: 1,
                    command: vec![TERMINAL.into(), "-n".into(), "scratchterm".into()],
                },
                Scratchpad {
                    key: 2,
                    command: ["st", "-n", "scratchcalc", "-e", "bc", "-lq"]
                        .map(String::from)
                        .to_vec(),
                },
                Scratchpad {
                    key: 3,
                    command: ["st", "-n", "scratchmixer", "-e", "alsamixer"]
                        .map(String::from)
                        .to_vec(),
                },
            ],
            signals,
            notify_command: vec!["notify-send".into(), "tagwm".into()],
            autostart: Vec::new(),
            systray_enabled: true,
            systray_spacing: 2,
            scheme_normal: ColorScheme {
                foreground: 0xbbbbbb,
                background: 0x222222,
                border: 0x444444,
            },
            scheme_selected: ColorScheme {
                foreground: 0xeeeeee,
                background: 0x005577,
                border: 0x005577,
            },
            scheme_urgent: ColorScheme {
                foreground: 0x222222,
                background: 0xd7875f,
                border: 0xff0000,
            },
            status_schemes: vec![
                ColorScheme {
                    foreground: 0xbbbbbb,
                    background: 0x222222,
                    border: 0x444444,
                },
                ColorScheme {
                    foreground: 0xeeeeee,
                    background: 0x005577,
                    border: 0x005577,
                },
                ColorScheme {
                    foreground: 0xff5f5f,
                    background: 0x222222,
                    border: 0x444444,
                },
                ColorScheme {
                    foreground: 0x87d787,
                    background: 0x222222,
                    border: 0x444444,
                },
            ],
        }
    }
}
