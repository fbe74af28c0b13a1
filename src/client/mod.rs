use crate::layout::WindowGeometry;
use crate::size_hints::SizeHints;
use x11rb::protocol::xproto::Window;

pub type TagMask = u32;

/// Floating is tri-state so that clients floated automatically (dialogs,
/// transients, fixed-size windows) can drop back to tiled when their hints
/// change, while a user's choice sticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FloatState {
    #[default]
    Tiled,
    Floating,
    AutoFloating,
}

impl FloatState {
    pub fn is_floating(&self) -> bool {
        !matches!(self, Self::Tiled)
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    pub window: Window,
    pub name: String,
    pub class: String,
    pub instance: String,
    /// Inner geometry, border excluded.
    pub geometry: WindowGeometry,
    pub old_geometry: WindowGeometry,
    /// Last floating position and size, restored when leaving tiled mode.
    pub float_geometry: WindowGeometry,
    pub border_width: i32,
    pub old_border_width: i32,
    pub hints: SizeHints,
    pub hints_valid: bool,
    pub is_fixed: bool,
    pub float_state: FloatState,
    pub is_urgent: bool,
    pub never_focus: bool,
    pub is_fullscreen: bool,
    pub old_float_state: FloatState,
    pub is_hidden: bool,
    pub is_centered: bool,
    pub tags: TagMask,
    /// 0 for ordinary clients, otherwise the scratchpad slot this client holds.
    pub scratch_key: i32,
    pub monitor_index: usize,
}

impl Client {
    pub fn new(window: Window, monitor_index: usize, tags: TagMask) -> Self {
        Self {
            window,
            name: String::new(),
            class: String::new(),
            instance: String::new(),
            geometry: WindowGeometry::default(),
            old_geometry: WindowGeometry::default(),
            float_geometry: WindowGeometry::default(),
            border_width: 0,
            old_border_width: 0,
            hints: SizeHints::default(),
            hints_valid: false,
            is_fixed: false,
            float_state: FloatState::Tiled,
            is_urgent: false,
            never_focus: false,
            is_fullscreen: false,
            old_float_state: FloatState::Tiled,
            is_hidden: false,
            is_centered: false,
            tags,
            scratch_key: 0,
            monitor_index,
        }
    }

    pub fn is_floating(&self) -> bool {
        self.float_state.is_floating()
    }

    pub fn width_with_border(&self) -> i32 {
        self.geometry.width + 2 * self.border_width
    }

    pub fn height_with_border(&self) -> i32 {
        self.geometry.height + 2 * self.border_width
    }

    /// Geometry including the border on every side.
    pub fn outer_geometry(&self) -> WindowGeometry {
        WindowGeometry::new(
            self.geometry.x_coordinate,
            self.geometry.y_coordinate,
            self.width_with_border(),
            self.height_with_border(),
        )
    }

    pub fn is_visible_on(&self, tagset: TagMask) -> bool {
        !self.is_hidden && self.tags & tagset != 0
    }

    pub fn is_tiled_on(&self, tagset: TagMask) -> bool {
        !self.is_floating() && self.is_visible_on(tagset)
    }

    pub fn apply_size_hints(&mut self, hints: SizeHints) {
        self.hints = hints;
        self.hints_valid = true;
        self.is_fixed = hints.is_fixed();
    }
}
