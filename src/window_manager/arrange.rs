use super::WindowManager;
use crate::errors::WmResult;
use crate::layout::{ArrangeContext, WindowGeometry};
use crate::x::XConn;
use x11rb::protocol::xproto::Window;

impl<X: XConn> WindowManager<X> {
    /// Shows and hides clients for the current views and re-runs the layout
    /// of one monitor, or of every monitor when `monitor` is `None`.
    pub(super) fn arrange(&mut self, monitor: Option<usize>) -> WmResult<()> {
        let indices: Vec<usize> = match monitor {
            Some(index) => vec![index],
            None => (0..self.monitors.len()).collect(),
        };

        for &index in &indices {
            self.show_hide(index)?;
        }
        for &index in &indices {
            self.arrange_monitor(index)?;
            self.restack(index)?;
        }
        Ok(())
    }

    /// Moves visible clients into place and hidden ones off screen to the
    /// left.
    fn show_hide(&mut self, monitor_index: usize) -> WmResult<()> {
        let monitor = &self.monitors[monitor_index];
        let tagset = monitor.selected_tags();
        let floating_layout = !monitor.layout().is_tiling();
        let stack = monitor.stack.clone();

        for window in stack {
            let Some(client) = self.clients.get(&window) else {
                continue;
            };
            let geometry = client.geometry;

            if client.is_visible_on(tagset) {
                self.conn
                    .move_window(window, geometry.x_coordinate, geometry.y_coordinate)?;
                if (floating_layout || client.is_floating()) && !client.is_fullscreen {
                    self.resize(window, geometry, false)?;
                }
            } else {
                self.conn.move_window(
                    window,
                    -2 * client.width_with_border(),
                    geometry.y_coordinate,
                )?;
            }
        }
        Ok(())
    }

    fn arrange_monitor(&mut self, monitor_index: usize) -> WmResult<()> {
        let tiled = self.tiled_clients(monitor_index);
        let gaps = self.config.gaps();
        let min_slot_height = self.config.min_slot_height;

        let monitor = &mut self.monitors[monitor_index];
        monitor.tiled_count = tiled.len();

        let show_tab = monitor.wants_tab_bar(tiled.len());
        if show_tab != monitor.show_tab {
            monitor.show_tab = show_tab;
            self.update_bar_position(monitor_index)?;
        }

        let monitor = &mut self.monitors[monitor_index];
        let layout = monitor.layout();
        monitor.layout_symbol = layout.symbol().to_string();
        if tiled.is_empty() {
            return Ok(());
        }

        let context = ArrangeContext {
            area: monitor.window_area,
            num_master: usize::try_from(monitor.num_master).unwrap_or(0),
            master_factor: monitor.master_factor,
            gaps,
            master_extra: monitor.master_extra,
            stack_extra: monitor.stack_extra,
            min_slot_height,
        };
        let Some(arrangement) = layout.arrange(tiled.len(), &context) else {
            return Ok(());
        };

        monitor.layout_symbol = arrangement.symbol;
        if (monitor.master_extra, monitor.stack_extra) != (arrangement.master_extra, arrangement.stack_extra) {
            monitor.master_extra = arrangement.master_extra;
            monitor.stack_extra = arrangement.stack_extra;
            monitor.store_tag_settings();
        }

        for (window, outer) in tiled.into_iter().zip(arrangement.geometries) {
            let border_width = self.clients.get(&window).map_or(0, |client| client.border_width);
            let inner = WindowGeometry::new(
                outer.x_coordinate,
                outer.y_coordinate,
                outer.width - 2 * border_width,
                outer.height - 2 * border_width,
            );
            self.resize(window, inner, false)?;
        }
        Ok(())
    }

    /// Redraws the bars and fixes the stacking order: a floating selection
    /// goes on top, tiled clients sit below the bar in focus order.
    pub(super) fn restack(&mut self, monitor_index: usize) -> WmResult<()> {
        self.draw_bar(monitor_index)?;

        let monitor = &self.monitors[monitor_index];
        let Some(selected) = monitor.selected_client else {
            return Ok(());
        };
        let tiling = monitor.layout().is_tiling();

        if self.clients.get(&selected).is_some_and(|client| client.is_floating()) || !tiling {
            self.conn.raise(selected)?;
        }

        if tiling {
            let order: Vec<Window> = monitor
                .bar_window
                .into_iter()
                .chain(
                    monitor
                        .stack
                        .iter()
                        .copied()
                        .filter(|&window| self.is_tiled_visible(window)),
                )
                .collect();
            self.conn.restack(&order)?;
        }
        Ok(())
    }

    /// Recomputes the work area and moves the bar and tab windows.
    pub(super) fn update_bar_position(&mut self, monitor_index: usize) -> WmResult<()> {
        let (bar_height, tab_height) = (self.bar_height, self.tab_height);
        let monitor = &mut self.monitors[monitor_index];
        monitor.update_bar_position(bar_height, tab_height);

        let screen = monitor.screen;
        if let Some(bar) = monitor.bar_window {
            self.conn.move_resize_window(
                bar,
                WindowGeometry::new(screen.x_coordinate, monitor.bar_y_position, screen.width, bar_height),
            )?;
        }
        if let Some(tab) = monitor.tab_window {
            self.conn.move_resize_window(
                tab,
                WindowGeometry::new(screen.x_coordinate, monitor.tab_y_position, screen.width, tab_height),
            )?;
        }
        Ok(())
    }
}
