use crate::client::Client;
use crate::layout::WindowGeometry;

pub mod flags {
    pub const P_MIN_SIZE: u32 = 1 << 4;
    pub const P_MAX_SIZE: u32 = 1 << 5;
    pub const P_RESIZE_INC: u32 = 1 << 6;
    pub const P_ASPECT: u32 = 1 << 7;
    pub const P_BASE_SIZE: u32 = 1 << 8;
}

pub mod offset {
    pub const FLAGS: usize = 0;
    pub const MIN_WIDTH: usize = 5;
    pub const MIN_HEIGHT: usize = 6;
    pub const MAX_WIDTH: usize = 7;
    pub const MAX_HEIGHT: usize = 8;
    pub const WIDTH_INC: usize = 9;
    pub const HEIGHT_INC: usize = 10;
    pub const MIN_ASPECT_X: usize = 11;
    pub const MIN_ASPECT_Y: usize = 12;
    pub const MAX_ASPECT_X: usize = 13;
    pub const MAX_ASPECT_Y: usize = 14;
    pub const BASE_WIDTH: usize = 15;
    pub const BASE_HEIGHT: usize = 16;
}

/// Number of 32-bit words in a `WM_NORMAL_HINTS` property.
pub const WORD_COUNT: usize = 18;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SizeHints {
    pub base_width: i32,
    pub base_height: i32,
    pub min_width: i32,
    pub min_height: i32,
    pub max_width: i32,
    pub max_height: i32,
    pub increment_width: i32,
    pub increment_height: i32,
    pub min_aspect: f32,
    pub max_aspect: f32,
}

fn ratio(numerator: u32, denominator: u32) -> f32 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f32 / denominator as f32
    }
}

impl SizeHints {
    /// Decodes the raw `WM_NORMAL_HINTS` words. A short or missing property
    /// yields empty hints.
    pub fn from_words(words: &[u32]) -> Self {
        if words.len() < WORD_COUNT {
            return Self::default();
        }

        let word = |index: usize| words[index] as i32;
        let hint_flags = words[offset::FLAGS];
        let has = |flag: u32| hint_flags & flag != 0;

        let (base_width, base_height) = if has(flags::P_BASE_SIZE) {
            (word(offset::BASE_WIDTH), word(offset::BASE_HEIGHT))
        } else if has(flags::P_MIN_SIZE) {
            (word(offset::MIN_WIDTH), word(offset::MIN_HEIGHT))
        } else {
            (0, 0)
        };

        let (increment_width, increment_height) = if has(flags::P_RESIZE_INC) {
            (word(offset::WIDTH_INC), word(offset::HEIGHT_INC))
        } else {
            (0, 0)
        };

        let (max_width, max_height) = if has(flags::P_MAX_SIZE) {
            (word(offset::MAX_WIDTH), word(offset::MAX_HEIGHT))
        } else {
            (0, 0)
        };

        let (min_width, min_height) = if has(flags::P_MIN_SIZE) {
            (word(offset::MIN_WIDTH), word(offset::MIN_HEIGHT))
        } else if has(flags::P_BASE_SIZE) {
            (word(offset::BASE_WIDTH), word(offset::BASE_HEIGHT))
        } else {
            (0, 0)
        };

        let (min_aspect, max_aspect) = if has(flags::P_ASPECT) {
            (
                ratio(words[offset::MIN_ASPECT_Y], words[offset::MIN_ASPECT_X]),
                ratio(words[offset::MAX_ASPECT_X], words[offset::MAX_ASPECT_Y]),
            )
        } else {
            (0.0, 0.0)
        };

        Self {
            base_width: base_width.max(0),
            base_height: base_height.max(0),
            min_width: min_width.max(0),
            min_height: min_height.max(0),
            max_width: max_width.max(0),
            max_height: max_height.max(0),
            increment_width: increment_width.max(0),
            increment_height: increment_height.max(0),
            min_aspect,
            max_aspect,
        }
    }

    pub fn is_fixed(&self) -> bool {
        self.max_width > 0
            && self.max_height > 0
            && self.max_width == self.min_width
            && self.max_height == self.min_height
    }

    /// ICCCM 4.1.2.3 size resolution for a requested inner size.
    pub fn constrain(&self, mut width: i32, mut height: i32) -> (i32, i32) {
        let base_is_min = self.base_width == self.min_width && self.base_height == self.min_height;

        if !base_is_min {
            width -= self.base_width;
            height -= self.base_height;
        }

        if self.min_aspect > 0.0 && self.max_aspect > 0.0 && width > 0 && height > 0 {
            if self.max_aspect < width as f32 / height as f32 {
                width = (height as f32 * self.max_aspect + 0.5) as i32;
            } else if self.min_aspect < height as f32 / width as f32 {
                height = (width as f32 * self.min_aspect + 0.5) as i32;
            }
        }

        if base_is_min {
            width -= self.base_width;
            height -= self.base_height;
        }

        if self.increment_width > 0 {
            width -= width.rem_euclid(self.increment_width);
        }
        if self.increment_height > 0 {
            height -= height.rem_euclid(self.increment_height);
        }

        width = (width + self.base_width).max(self.min_width);
        height = (height + self.base_height).max(self.min_height);

        if self.max_width > 0 {
            width = width.min(self.max_width);
        }
        if self.max_height > 0 {
            height = height.min(self.max_height);
        }

        (width, height)
    }
}

/// Bounds a proposed geometry is resolved against.
#[derive(Debug, Clone, Copy)]
pub struct ClampContext {
    /// The whole virtual screen, used for interactive moves.
    pub screen: WindowGeometry,
    /// Work area of the client's monitor.
    pub window_area: WindowGeometry,
    pub bar_height: i32,
    /// Whether ICCCM size hints are honoured for this client right now.
    pub respect_hints: bool,
}

/// Resolves a proposed inner geometry for `client`, returning the corrected
/// box and whether it differs from the client's current geometry.
///
/// Interactive moves may leave a window partly off screen but never wholly
/// outside the virtual screen; otherwise the window is kept from leaving its
/// monitor's work area. Sizes are resolved before positions so a resolved
/// box resolves to itself.
pub fn clamp_geometry(
    client: &Client,
    proposed: WindowGeometry,
    interactive: bool,
    context: &ClampContext,
) -> (WindowGeometry, bool) {
    let mut width = proposed.width.max(1);
    let mut height = proposed.height.max(1);

    height = height.max(context.bar_height);
    width = width.max(context.bar_height);

    if context.respect_hints && client.hints_valid {
        (width, height) = client.hints.constrain(width, height);
    }

    width = width.max(1);
    height = height.max(1);

    let border = 2 * client.border_width;
    let mut x = proposed.x_coordinate;
    let mut y = proposed.y_coordinate;

    if interactive {
        let screen = context.screen;
        if x > screen.right() {
            x = screen.right() - client.width_with_border();
        }
        if y > screen.bottom() {
            y = screen.bottom() - client.height_with_border();
        }
        if x + width + border < screen.x_coordinate {
            x = screen.x_coordinate;
        }
        if y + height + border < screen.y_coordinate {
            y = screen.y_coordinate;
        }
    } else {
        let area = context.window_area;
        if x >= area.right() {
            x = area.right() - client.width_with_border();
        }
        if y >= area.bottom() {
            y = area.bottom() - client.height_with_border();
        }
        if x + width + border <= area.x_coordinate {
            x = area.x_coordinate;
        }
        if y + height + border <= area.y_coordinate {
            y = area.y_coordinate;
        }
    }

    let resolved = WindowGeometry::new(x, y, width, height);
    (resolved, resolved != client.geometry)
}
