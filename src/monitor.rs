use crate::Config;
use crate::client::TagMask;
use crate::layout::{LayoutType, WindowGeometry};
use serde::Deserialize;
use x11rb::protocol::xproto::Window;

/// Index of the lowest set tag bit.
pub fn unmask_tag(mask: TagMask) -> usize {
    mask.trailing_zeros() as usize
}

/// Where a newly managed client is inserted into its monitor's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum AttachPolicy {
    /// List head; the new client becomes master.
    Front,
    /// List tail.
    Bottom,
    /// Directly before the selected client.
    Above,
    /// Directly after the selected client.
    Below,
    /// After the current masters, so the master area stays put.
    Aside,
}

impl AttachPolicy {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Bottom => "bottom",
            Self::Above => "above",
            Self::Below => "below",
            Self::Aside => "aside",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum TabMode {
    Never,
    Auto,
    Always,
}

impl TabMode {
    pub fn next(&self) -> Self {
        match self {
            Self::Never => Self::Auto,
            Self::Auto => Self::Always,
            Self::Always => Self::Never,
        }
    }
}

/// Layout state remembered for a single tag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TagSettings {
    pub num_master: i32,
    pub master_factor: f32,
    pub selected_layout_index: usize,
    pub layouts: [LayoutType; 2],
    pub selected_attach_index: usize,
    pub attach_policies: [AttachPolicy; 2],
    pub tab_mode: TabMode,
    pub master_extra: i32,
    pub stack_extra: i32,
}

impl TagSettings {
    pub fn from_config(config: &Config) -> Self {
        let layout = |index: usize| {
            config
                .layouts
                .get(index)
                .or(config.layouts.first())
                .copied()
                .unwrap_or(LayoutType::Tile)
        };
        let policy = |index: usize| {
            config
                .attach_policies
                .get(index)
                .or(config.attach_policies.first())
                .copied()
                .unwrap_or(AttachPolicy::Front)
        };

        Self {
            num_master: config.num_master,
            master_factor: config.master_factor,
            selected_layout_index: 0,
            layouts: [layout(0), layout(1)],
            selected_attach_index: 0,
            attach_policies: [policy(0), policy(1)],
            tab_mode: config.tab_mode,
            master_extra: 0,
            stack_extra: 0,
        }
    }
}

/// One settings slot per tag plus slot 0 for the all-tags view.
#[derive(Debug, Clone)]
pub struct Pertag {
    pub current_tag: usize,
    pub previous_tag: usize,
    pub settings: Vec<TagSettings>,
    pub defaults: TagSettings,
}

impl Pertag {
    pub fn new(tag_count: usize, defaults: TagSettings) -> Self {
        Self {
            current_tag: 1,
            previous_tag: 1,
            settings: vec![defaults; tag_count + 1],
            defaults,
        }
    }

    pub fn reset(&mut self, tag: usize) {
        if let Some(slot) = self.settings.get_mut(tag) {
            *slot = self.defaults;
        }
    }

    /// Pertag slot for a view mask: 0 for all tags, otherwise lowest tag + 1.
    pub fn slot_for(mask: TagMask, all_tags: TagMask) -> usize {
        if mask == all_tags {
            0
        } else {
            unmask_tag(mask) + 1
        }
    }
}

#[derive(Debug, Clone)]
pub struct Monitor {
    pub monitor_number: usize,
    pub layout_symbol: String,
    pub master_factor: f32,
    pub num_master: i32,
    pub master_extra: i32,
    pub stack_extra: i32,
    pub screen: WindowGeometry,
    pub window_area: WindowGeometry,
    pub bar_y_position: i32,
    pub tab_y_position: i32,
    pub selected_tags_index: usize,
    pub tagset: [TagMask; 2],
    pub selected_layout_index: usize,
    pub layouts: [LayoutType; 2],
    pub selected_attach_index: usize,
    pub attach_policies: [AttachPolicy; 2],
    pub show_bar: bool,
    pub top_bar: bool,
    pub tab_mode: TabMode,
    pub show_tab: bool,
    pub top_tab: bool,
    pub bar_window: Option<Window>,
    pub tab_window: Option<Window>,
    /// Managed windows in tiling order.
    pub clients: Vec<Window>,
    /// Managed windows in focus order, most recent first.
    pub stack: Vec<Window>,
    pub selected_client: Option<Window>,
    pub tiled_count: usize,
    pub pertag: Pertag,
}

impl Monitor {
    pub fn new(monitor_number: usize, screen: WindowGeometry, config: &Config) -> Self {
        let defaults = TagSettings::from_config(config);

        let mut monitor = Self {
            monitor_number,
            layout_symbol: defaults.layouts[0].symbol().to_string(),
            master_factor: defaults.master_factor,
            num_master: defaults.num_master,
            master_extra: 0,
            stack_extra: 0,
            screen,
            window_area: screen,
            bar_y_position: 0,
            tab_y_position: 0,
            selected_tags_index: 0,
            tagset: [1, 1],
            selected_layout_index: 0,
            layouts: defaults.layouts,
            selected_attach_index: 0,
            attach_policies: defaults.attach_policies,
            show_bar: config.show_bar,
            top_bar: config.top_bar,
            tab_mode: config.tab_mode,
            show_tab: false,
            top_tab: config.top_tab,
            bar_window: None,
            tab_window: None,
            clients: Vec::new(),
            stack: Vec::new(),
            selected_client: None,
            tiled_count: 0,
            pertag: Pertag::new(config.tags.len(), defaults),
        };
        monitor.restore_tag_settings();
        monitor
    }

    pub fn selected_tags(&self) -> TagMask {
        self.tagset[self.selected_tags_index]
    }

    pub fn layout(&self) -> LayoutType {
        self.layouts[self.selected_layout_index]
    }

    pub fn attach_policy(&self) -> AttachPolicy {
        self.attach_policies[self.selected_attach_index]
    }

    /// Loads the live layout values from the current tag's slot.
    pub fn restore_tag_settings(&mut self) {
        let Some(settings) = self.pertag.settings.get(self.pertag.current_tag).copied() else {
            return;
        };

        self.num_master = settings.num_master;
        self.master_factor = settings.master_factor;
        self.selected_layout_index = settings.selected_layout_index;
        self.layouts = settings.layouts;
        self.selected_attach_index = settings.selected_attach_index;
        self.attach_policies = settings.attach_policies;
        self.tab_mode = settings.tab_mode;
        self.master_extra = settings.master_extra;
        self.stack_extra = settings.stack_extra;
    }

    /// Writes the live layout values into the current tag's slot.
    pub fn store_tag_settings(&mut self) {
        let settings = TagSettings {
            num_master: self.num_master,
            master_factor: self.master_factor,
            selected_layout_index: self.selected_layout_index,
            layouts: self.layouts,
            selected_attach_index: self.selected_attach_index,
            attach_policies: self.attach_policies,
            tab_mode: self.tab_mode,
            master_extra: self.master_extra,
            stack_extra: self.stack_extra,
        };
        if let Some(slot) = self.pertag.settings.get_mut(self.pertag.current_tag) {
            *slot = settings;
        }
    }

    pub fn wants_tab_bar(&self, visible_tiled: usize) -> bool {
        match self.tab_mode {
            TabMode::Never => false,
            TabMode::Always => true,
            TabMode::Auto => self.layout().stacks_clients() && visible_tiled > 1,
        }
    }

    /// Recomputes the work area from the screen, reserving space for the
    /// bar and, when shown, the tab bar.
    pub fn update_bar_position(&mut self, bar_height: i32, tab_height: i32) {
        let mut area = self.screen;

        if self.show_bar {
            area.height -= bar_height;
            if self.top_bar {
                self.bar_y_position = area.y_coordinate;
                area.y_coordinate += bar_height;
            } else {
                self.bar_y_position = area.bottom();
            }
        } else {
            self.bar_y_position = -bar_height;
        }

        if self.show_tab {
            area.height -= tab_height;
            if self.top_tab {
                self.tab_y_position = area.y_coordinate;
                area.y_coordinate += tab_height;
            } else {
                self.tab_y_position = area.bottom();
            }
        } else {
            self.tab_y_position = -tab_height;
        }

        self.window_area = area;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> Monitor {
        Monitor::new(0, WindowGeometry::new(0, 0, 1280, 800), &Config::default())
    }

    #[test]
    fn starts_on_the_first_tag() {
        let monitor = monitor();
        assert_eq!(monitor.selected_tags(), 1);
        assert_eq!(monitor.pertag.current_tag, 1);
        assert_eq!(monitor.pertag.settings.len(), Config::default().tags.len() + 1);
    }

    #[test]
    fn settings_round_trip_through_the_current_slot() {
        let mut monitor = monitor();
        monitor.master_factor = 0.7;
        monitor.selected_layout_index = 1;
        monitor.store_tag_settings();

        monitor.pertag.current_tag = 2;
        monitor.restore_tag_settings();
        assert_eq!(monitor.selected_layout_index, 0);

        monitor.pertag.current_tag = 1;
        monitor.restore_tag_settings();
        assert_eq!(monitor.master_factor, 0.7);
        assert_eq!(monitor.selected_layout_index, 1);
    }

    #[test]
    fn top_bar_and_bottom_tabs_shrink_the_work_area() {
        let mut monitor = monitor();
        monitor.show_bar = true;
        monitor.top_bar = true;
        monitor.show_tab = true;
        monitor.top_tab = false;

        monitor.update_bar_position(20, 18);

        assert_eq!(monitor.bar_y_position, 0);
        assert_eq!(monitor.tab_y_position, 800 - 18);
        assert_eq!(monitor.window_area, WindowGeometry::new(0, 20, 1280, 762));
    }

    #[test]
    fn hidden_bar_is_moved_off_screen() {
        let mut monitor = monitor();
        monitor.show_bar = false;
        monitor.show_tab = false;

        monitor.update_bar_position(20, 18);

        assert_eq!(monitor.bar_y_position, -20);
        assert_eq!(monitor.window_area, monitor.screen);
    }

    #[test]
    fn auto_tabs_only_for_stacking_layouts() {
        let mut monitor = monitor();
        monitor.tab_mode = TabMode::Auto;
        monitor.layouts = [LayoutType::Tile, LayoutType::Monocle];

        assert!(!monitor.wants_tab_bar(3));
        monitor.selected_layout_index = 1;
        assert!(monitor.wants_tab_bar(3));
        assert!(!monitor.wants_tab_bar(1));
    }

    #[test]
    fn all_tags_view_uses_slot_zero() {
        assert_eq!(Pertag::slot_for(0b111, 0b111), 0);
        assert_eq!(Pertag::slot_for(0b100, 0b111), 3);
        assert_eq!(Pertag::slot_for(0b110, 0b111), 2);
    }
}
