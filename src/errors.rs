use x11rb::protocol::ErrorKind;

pub type WmResult<T> = Result<T, WmError>;

#[derive(Debug)]
pub enum WmError {
    X11(X11Error),
    Io(std::io::Error),
    Config(ConfigError),
}

#[derive(Debug)]
pub enum X11Error {
    ConnectError(x11rb::errors::ConnectError),
    ConnectionError(x11rb::errors::ConnectionError),
    ReplyError(x11rb::errors::ReplyError),
    ReplyOrIdError(x11rb::errors::ReplyOrIdError),
    DisplayOpenFailed,
    FontLoadFailed(String),
    DrawCreateFailed,
    OtherWmRunning,
}

#[derive(Debug)]
pub enum ConfigError {
    ParseError(ron::error::SpannedError),
    CouldNotReadConfig(std::io::Error),
    NoTags,
    TooManyTags(usize),
    InvalidModkey(String),
    UnknownKey(String),
}

impl std::fmt::Display for WmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::X11(error) => write!(f, "{}", error),
            Self::Io(error) => write!(f, "{}", error),
            Self::Config(error) => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for WmError {}

impl std::fmt::Display for X11Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectError(err) => write!(f, "{}", err),
            Self::ConnectionError(err) => write!(f, "{}", err),
            Self::ReplyError(err) => write!(f, "{}", err),
            Self::ReplyOrIdError(err) => write!(f, "{}", err),
            Self::DisplayOpenFailed => write!(f, "cannot open display"),
            Self::FontLoadFailed(font_name) => write!(f, "cannot load font: {}", font_name),
            Self::DrawCreateFailed => write!(f, "failed to create XftDraw"),
            Self::OtherWmRunning => write!(f, "another window manager is already running"),
        }
    }
}

impl std::error::Error for X11Error {}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParseError(err) => write!(f, "Failed to parse RON config: {}", err),
            Self::CouldNotReadConfig(err) => write!(f, "Could not read config: {}", err),
            Self::NoTags => write!(f, "at least one tag must be configured"),
            Self::TooManyTags(count) => {
                write!(f, "{} tags configured, at most 31 are supported", count)
            }
            Self::InvalidModkey(key) => write!(f, "Invalid modkey: {}", key),
            Self::UnknownKey(key) => write!(f, "Unknown key: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

impl<T: Into<X11Error>> From<T> for WmError {
    fn from(value: T) -> Self {
        Self::X11(value.into())
    }
}

impl From<std::io::Error> for WmError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ConfigError> for WmError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<ron::error::SpannedError> for ConfigError {
    fn from(value: ron::error::SpannedError) -> Self {
        ConfigError::ParseError(value)
    }
}

impl From<x11rb::errors::ConnectError> for X11Error {
    fn from(value: x11rb::errors::ConnectError) -> Self {
        X11Error::ConnectError(value)
    }
}

impl From<x11rb::errors::ConnectionError> for X11Error {
    fn from(value: x11rb::errors::ConnectionError) -> Self {
        X11Error::ConnectionError(value)
    }
}

impl From<x11rb::errors::ReplyError> for X11Error {
    fn from(value: x11rb::errors::ReplyError) -> Self {
        X11Error::ReplyError(value)
    }
}

impl From<x11rb::errors::ReplyOrIdError> for X11Error {
    fn from(value: x11rb::errors::ReplyOrIdError) -> Self {
        X11Error::ReplyOrIdError(value)
    }
}

pub mod opcode {
    pub const CONFIGURE_WINDOW: u8 = 12;
    pub const GRAB_BUTTON: u8 = 28;
    pub const GRAB_KEY: u8 = 33;
    pub const SET_INPUT_FOCUS: u8 = 42;
    pub const COPY_AREA: u8 = 62;
    pub const POLY_SEGMENT: u8 = 66;
    pub const POLY_FILL_RECTANGLE: u8 = 70;
    pub const POLY_TEXT8: u8 = 74;
}

/// Asynchronous protocol errors that are expected races with clients going
/// away, and are dropped without logging above debug level.
pub fn is_ignorable(major_opcode: u8, kind: ErrorKind) -> bool {
    use opcode::*;

    matches!(
        (major_opcode, kind),
        (_, ErrorKind::Window)
            | (SET_INPUT_FOCUS, ErrorKind::Match)
            | (POLY_TEXT8, ErrorKind::Drawable)
            | (POLY_FILL_RECTANGLE, ErrorKind::Drawable)
            | (POLY_SEGMENT, ErrorKind::Drawable)
            | (CONFIGURE_WINDOW, ErrorKind::Match)
            | (GRAB_BUTTON, ErrorKind::Access)
            | (GRAB_KEY, ErrorKind::Access)
            | (COPY_AREA, ErrorKind::Drawable)
    )
}

pub fn is_ignorable_error(error: &x11rb::x11_utils::X11Error) -> bool {
    is_ignorable(error.major_opcode, error.error_kind)
}

/// Replies that failed only because the target window vanished.
pub fn is_vanished_window(error: &x11rb::errors::ReplyError) -> bool {
    match error {
        x11rb::errors::ReplyError::X11Error(inner) => {
            matches!(inner.error_kind, ErrorKind::Window | ErrorKind::Drawable)
        }
        _ => false,
    }
}
