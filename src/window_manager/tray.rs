use super::WindowManager;
use crate::errors::WmResult;
use crate::layout::WindowGeometry;
use crate::systray::Systray;
use crate::x::XConn;
use tracing::{debug, info};
use x11rb::protocol::xproto::Window;

impl<X: XConn> WindowManager<X> {
    pub(super) fn is_systray_icon(&self, window: Window) -> bool {
        self.systray
            .as_ref()
            .is_some_and(|systray| systray.contains(window))
    }

    pub(super) fn is_systray_window(&self, window: Window) -> bool {
        self.systray
            .as_ref()
            .is_some_and(|systray| systray.window == window)
    }

    pub(super) fn systray_width(&self) -> i32 {
        if !self.config.systray_enabled {
            return 0;
        }
        self.systray
            .as_ref()
            .map_or(0, |systray| systray.width(self.config.systray_spacing as i32))
    }

    /// Creates the tray on first use, then places icons and the tray window
    /// at the right end of the selected monitor's bar.
    pub(super) fn update_systray(&mut self) -> WmResult<()> {
        if !self.config.systray_enabled {
            return Ok(());
        }
        if self.systray.is_none() {
            match self.conn.create_systray(self.config.scheme_normal.background)? {
                Some(window) => {
                    info!(window, "acquired systray selection");
                    self.systray = Some(Systray::new(window));
                }
                None => {
                    debug!("systray selection is owned elsewhere");
                    self.config.systray_enabled = false;
                    return Ok(());
                }
            }
        }
        let Some(systray) = &self.systray else {
            return Ok(());
        };

        let spacing = self.config.systray_spacing as i32;
        for (icon, geometry) in systray.layout(spacing) {
            self.conn.move_resize_window(icon, geometry)?;
        }

        let monitor = self.selmon();
        let width = systray.width(spacing).max(1);
        let y = if monitor.show_bar {
            monitor.bar_y_position
        } else {
            -self.bar_height
        };
        self.conn.move_resize_window(
            systray.window,
            WindowGeometry::new(monitor.screen.right() - width, y, width, self.bar_height),
        )?;
        self.conn.raise(systray.window)?;
        Ok(())
    }

    pub(super) fn dock_icon(&mut self, icon: Window) -> WmResult<()> {
        let Some(tray) = self.systray.as_ref().map(|systray| systray.window) else {
            return Ok(());
        };
        let Some((width, height)) = self.conn.embed_icon(tray, icon)? else {
            return Ok(());
        };
        if let Some(systray) = self.systray.as_mut() {
            systray.add_icon(icon, width, height, self.bar_height);
        }
        debug!(icon, width, height, "docked systray icon");

        self.conn.map(icon)?;
        self.update_systray()?;
        self.draw_bar(self.selected_monitor)
    }

    pub(super) fn remove_systray_icon(&mut self, icon: Window) -> WmResult<()> {
        if let Some(systray) = self.systray.as_mut()
            && systray.remove_icon(icon)
        {
            debug!(icon, "removed systray icon");
            self.update_systray()?;
            self.draw_bar(self.selected_monitor)?;
        }
        Ok(())
    }

    pub(super) fn resize_systray_icon(&mut self, icon: Window, width: i32, height: i32) -> WmResult<()> {
        let bar_height = self.bar_height;
        if let Some(systray) = self.systray.as_mut()
            && systray.resize_icon(icon, width, height, bar_height)
        {
            self.update_systray()?;
            self.draw_bar(self.selected_monitor)?;
        }
        Ok(())
    }

    /// Follows the `XEMBED_MAPPED` flag of an icon's `_XEMBED_INFO`.
    pub(super) fn update_systray_icon_state(&mut self, icon: Window) -> WmResult<()> {
        let Some(flags) = self.conn.xembed_flags(icon)? else {
            return Ok(());
        };
        let Some(mapped) = self
            .systray
            .as_mut()
            .and_then(|systray| systray.set_mapped(icon, flags))
        else {
            return Ok(());
        };

        if mapped {
            self.conn.map(icon)?;
        } else {
            self.conn.unmap(icon)?;
        }
        self.update_systray()?;
        self.draw_bar(self.selected_monitor)
    }
}
