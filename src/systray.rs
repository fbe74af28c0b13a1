//! Bookkeeping for the system tray host: which icon windows are docked,
//! their sizes, and where they sit inside the tray window.

use crate::layout::WindowGeometry;
use x11rb::protocol::xproto::Window;

pub const SYSTEM_TRAY_REQUEST_DOCK: u32 = 0;
pub const XEMBED_EMBEDDED_NOTIFY: u32 = 0;
pub const XEMBED_WINDOW_ACTIVATE: u32 = 1;
pub const XEMBED_WINDOW_DEACTIVATE: u32 = 2;
pub const XEMBED_EMBEDDED_VERSION: u32 = 0;
pub const XEMBED_MAPPED: u32 = 1 << 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrayIcon {
    pub window: Window,
    pub width: i32,
    pub height: i32,
    pub mapped: bool,
}

#[derive(Debug, Clone)]
pub struct Systray {
    pub window: Window,
    pub icons: Vec<TrayIcon>,
}

/// Scales an icon's requested size to the bar height, keeping its aspect.
pub fn fit_icon(width: i32, height: i32, bar_height: i32) -> (i32, i32) {
    let width = if width == height || height <= 0 {
        bar_height
    } else if height == bar_height {
        width
    } else {
        (bar_height as f32 * (width as f32 / height as f32)) as i32
    };
    (width.max(1), bar_height)
}

impl Systray {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            icons: Vec::new(),
        }
    }

    pub fn contains(&self, window: Window) -> bool {
        self.icons.iter().any(|icon| icon.window == window)
    }

    pub fn add_icon(&mut self, window: Window, width: i32, height: i32, bar_height: i32) {
        if self.contains(window) {
            return;
        }
        let (width, height) = fit_icon(width, height, bar_height);
        self.icons.insert(
            0,
            TrayIcon {
                window,
                width,
                height,
                mapped: true,
            },
        );
    }

    pub fn remove_icon(&mut self, window: Window) -> bool {
        let before = self.icons.len();
        self.icons.retain(|icon| icon.window != window);
        self.icons.len() != before
    }

    pub fn resize_icon(&mut self, window: Window, width: i32, height: i32, bar_height: i32) -> bool {
        let Some(icon) = self.icons.iter_mut().find(|icon| icon.window == window) else {
            return false;
        };
        (icon.width, icon.height) = fit_icon(width, height, bar_height);
        true
    }

    /// Records the `_XEMBED_INFO` mapped flag; returns the new state if it
    /// changed.
    pub fn set_mapped(&mut self, window: Window, flags: u32) -> Option<bool> {
        let icon = self.icons.iter_mut().find(|icon| icon.window == window)?;
        let mapped = flags & XEMBED_MAPPED != 0;
        if icon.mapped == mapped {
            return None;
        }
        icon.mapped = mapped;
        Some(mapped)
    }

    /// Icon boxes relative to the tray window.
    pub fn layout(&self, spacing: i32) -> Vec<(Window, WindowGeometry)> {
        let mut x = 0;
        self.icons
            .iter()
            .filter(|icon| icon.mapped)
            .map(|icon| {
                x += spacing;
                let geometry = WindowGeometry::new(x, 0, icon.width, icon.height);
                x += icon.width;
                (icon.window, geometry)
            })
            .collect()
    }

    /// Width of the tray window; 0 when nothing is shown.
    pub fn width(&self, spacing: i32) -> i32 {
        match self.layout(spacing).last() {
            Some((_, geometry)) => geometry.right() + spacing,
            None => 0,
        }
    }
}
