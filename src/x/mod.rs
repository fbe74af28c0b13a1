//! The boundary between the window manager and the X server.
//!
//! Everything the core needs from the display is expressed through
//! [`XConn`] so that the event handling and bookkeeping can be driven by an
//! in-memory connection in tests.
use crate::bar::BarSegment;
use crate::errors::WmResult;
use crate::keyboard::keysyms::Keysym;
use crate::keyboard::{ButtonBinding, KeyBinding};
use crate::layout::WindowGeometry;
use crate::size_hints::SizeHints;
use x11rb::protocol::xproto::Window;

pub mod atoms;
pub mod xconn;

#[cfg(test)]
pub mod mock;

pub use xconn::X11rbConn;

/// ICCCM `WM_STATE` values the window manager writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WmState {
    Withdrawn,
    Normal,
    Iconic,
}

impl WmState {
    pub fn as_u32(self) -> u32 {
        match self {
            Self::Withdrawn => 0,
            Self::Normal => 1,
            Self::Iconic => 3,
        }
    }

    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Withdrawn),
            1 => Some(Self::Normal),
            3 => Some(Self::Iconic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    DeleteWindow,
    TakeFocus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorKind {
    Normal,
    Move,
    Resize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowAttributes {
    pub override_redirect: bool,
    pub viewable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WmHints {
    pub urgent: bool,
    /// The input field, when the client set one.
    pub input: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowType {
    pub is_dialog: bool,
    pub is_fullscreen: bool,
}

/// `_NET_WM_STATE` client message actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateAction {
    Remove,
    Add,
    Toggle,
}

impl StateAction {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Remove),
            1 => Some(Self::Add),
            2 => Some(Self::Toggle),
            _ => None,
        }
    }

    /// The resulting state for something currently in `current`.
    pub fn apply(self, current: bool) -> bool {
        match self {
            Self::Remove => false,
            Self::Add => true,
            Self::Toggle => !current,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessageKind {
    Fullscreen(StateAction),
    ActiveWindow,
    /// `SYSTEM_TRAY_REQUEST_DOCK` sent to the tray window.
    DockRequest(Window),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    Name,
    TransientFor,
    NormalHints,
    Hints,
    WindowType,
    XembedInfo,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfigureRequest {
    pub window: Window,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub border_width: Option<i32>,
    pub sibling: Option<Window>,
    pub stack_mode: Option<u32>,
}

impl ConfigureRequest {
    /// Position changed while size was left alone.
    pub fn is_move_only(&self) -> bool {
        (self.x.is_some() || self.y.is_some()) && self.width.is_none() && self.height.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum XEvent {
    MapRequest(Window),
    UnmapNotify {
        window: Window,
        synthetic: bool,
    },
    DestroyNotify(Window),
    ConfigureRequest(ConfigureRequest),
    ConfigureNotify {
        window: Window,
        width: i32,
        height: i32,
    },
    /// Pointer crossings that are neither grabs nor moves into a child.
    EnterNotify {
        window: Window,
        root_x: i32,
        root_y: i32,
    },
    MotionNotify {
        window: Window,
        root_x: i32,
        root_y: i32,
        time: u32,
    },
    ButtonPress {
        window: Window,
        event_x: i32,
        root_x: i32,
        root_y: i32,
        button: u8,
        state: u16,
    },
    ButtonRelease,
    KeyPress {
        keysym: Keysym,
        state: u16,
    },
    PropertyNotify {
        window: Window,
        property: Property,
        deleted: bool,
    },
    ClientMessage {
        window: Window,
        kind: ClientMessageKind,
    },
    Expose {
        window: Window,
        count: u16,
    },
    FocusIn(Window),
    MappingNotify,
    ResizeRequest {
        window: Window,
        width: i32,
        height: i32,
    },
}

/// Requests the window manager issues against the display.
///
/// Reads against a window that has already gone away resolve to "absent"
/// (`None`, empty strings or default hints) instead of an error.
pub trait XConn {
    fn root(&self) -> Window;
    /// Usable outputs, de-duplicated and sorted top-left first.
    fn outputs(&self) -> WmResult<Vec<WindowGeometry>>;
    fn next_event(&self) -> WmResult<XEvent>;
    fn flush(&self) -> WmResult<()>;

    fn existing_windows(&self) -> WmResult<Vec<Window>>;
    fn window_attributes(&self, window: Window) -> WmResult<Option<WindowAttributes>>;
    /// Inner geometry and border width.
    fn window_geometry(&self, window: Window) -> WmResult<Option<(WindowGeometry, i32)>>;
    fn wm_state(&self, window: Window) -> WmResult<Option<WmState>>;
    fn transient_for(&self, window: Window) -> WmResult<Option<Window>>;
    fn window_title(&self, window: Window) -> WmResult<String>;
    /// `(instance, class)` from `WM_CLASS`.
    fn window_class(&self, window: Window) -> WmResult<(String, String)>;
    fn size_hints(&self, window: Window) -> WmResult<Option<SizeHints>>;
    fn wm_hints(&self, window: Window) -> WmResult<Option<WmHints>>;
    fn set_urgency_hint(&self, window: Window, urgent: bool) -> WmResult<()>;
    fn window_type(&self, window: Window) -> WmResult<WindowType>;
    fn supports_protocol(&self, window: Window, protocol: Protocol) -> WmResult<bool>;
    fn send_protocol(&self, window: Window, protocol: Protocol) -> WmResult<()>;
    fn root_name(&self) -> WmResult<String>;

    fn configure_client(&self, window: Window, geometry: WindowGeometry, border_width: i32) -> WmResult<()>;
    fn send_configure_notify(&self, window: Window, geometry: WindowGeometry, border_width: i32) -> WmResult<()>;
    fn forward_configure_request(&self, request: &ConfigureRequest) -> WmResult<()>;
    fn move_window(&self, window: Window, x: i32, y: i32) -> WmResult<()>;
    fn move_resize_window(&self, window: Window, geometry: WindowGeometry) -> WmResult<()>;
    fn set_border_width(&self, window: Window, width: i32) -> WmResult<()>;
    fn set_border_color(&self, window: Window, color: u32) -> WmResult<()>;
    fn map(&self, window: Window) -> WmResult<()>;
    fn unmap(&self, window: Window) -> WmResult<()>;
    fn raise(&self, window: Window) -> WmResult<()>;
    /// Stacks every window directly below the one before it.
    fn restack(&self, windows: &[Window]) -> WmResult<()>;
    fn kill_client(&self, window: Window) -> WmResult<()>;
    /// `None` gives focus back to the root window.
    fn set_input_focus(&self, window: Option<Window>) -> WmResult<()>;
    fn select_client_input(&self, window: Window) -> WmResult<()>;
    fn set_wm_state(&self, window: Window, state: WmState) -> WmResult<()>;

    fn grab_keys(&self, bindings: &[KeyBinding]) -> WmResult<()>;
    fn grab_buttons(&self, window: Window, focused: bool, buttons: &[ButtonBinding]) -> WmResult<()>;
    /// Returns false when another client holds the pointer.
    fn grab_pointer(&self, cursor: CursorKind) -> WmResult<bool>;
    fn ungrab_pointer(&self) -> WmResult<()>;
    fn query_pointer(&self) -> WmResult<(i32, i32)>;
    fn warp_pointer(&self, window: Window, x: i32, y: i32) -> WmResult<()>;

    fn set_client_list(&self, windows: &[Window]) -> WmResult<()>;
    fn set_active_window(&self, window: Option<Window>) -> WmResult<()>;
    fn set_current_desktop(&self, desktop: u32) -> WmResult<()>;
    fn set_desktop_names(&self, names: &[String]) -> WmResult<()>;
    fn set_client_desktop(&self, window: Window, desktop: u32) -> WmResult<()>;
    fn set_fullscreen_state(&self, window: Window, fullscreen: bool) -> WmResult<()>;

    fn create_bar(&self, geometry: WindowGeometry) -> WmResult<Window>;
    fn destroy_window(&self, window: Window) -> WmResult<()>;
    fn text_width(&self, text: &str) -> i32;
    fn font_height(&self) -> i32;
    fn draw_segments(&self, window: Window, width: i32, height: i32, segments: &[BarSegment]) -> WmResult<()>;

    /// Creates the tray window and claims the tray selection. `None` when
    /// another tray owns it.
    fn create_systray(&self, background: u32) -> WmResult<Option<Window>>;
    /// Reparents an icon into the tray and tells it so. Returns the icon's
    /// current size.
    fn embed_icon(&self, tray: Window, icon: Window) -> WmResult<Option<(i32, i32)>>;
    /// `_XEMBED_INFO` flags of an icon.
    fn xembed_flags(&self, icon: Window) -> WmResult<Option<u32>>;

    fn spawn(&self, argv: &[String]) {
        crate::process::spawn_detached(argv);
    }
}
