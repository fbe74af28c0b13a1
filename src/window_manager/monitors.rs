use super::WindowManager;
use crate::errors::WmResult;
use crate::layout::WindowGeometry;
use crate::monitor::Monitor;
use crate::x::XConn;
use tracing::info;
use x11rb::protocol::xproto::Window;

impl<X: XConn> WindowManager<X> {
    /// Re-reads the outputs, creating, resizing or removing monitors.
    /// Clients of removed monitors move to the first one. Returns whether
    /// anything changed.
    pub(super) fn update_geometry(&mut self) -> WmResult<bool> {
        let outputs = self.conn.outputs()?;
        let mut dirty = false;

        for (index, &output) in outputs.iter().enumerate() {
            let changed = match self.monitors.get_mut(index) {
                Some(monitor) if monitor.screen == output => false,
                Some(monitor) => {
                    monitor.screen = output;
                    true
                }
                None => {
                    self.monitors.push(Monitor::new(index, output, &self.config));
                    true
                }
            };
            if changed {
                self.update_bar_position(index)?;
                dirty = true;
            }
        }

        while self.monitors.len() > outputs.len().max(1) {
            self.remove_last_monitor()?;
            dirty = true;
        }

        self.screen = bounding_box(&outputs);
        if dirty {
            info!(monitors = self.monitors.len(), "output layout changed");
        }
        Ok(dirty)
    }

    fn remove_last_monitor(&mut self) -> WmResult<()> {
        let Some(removed) = self.monitors.pop() else {
            return Ok(());
        };

        for &window in &removed.clients {
            if let Some(client) = self.clients.get_mut(&window) {
                client.monitor_index = 0;
            }
            self.attach(window);
            self.attach_stack(window);
            self.update_client_desktop(window)?;
        }

        for window in [removed.bar_window, removed.tab_window].into_iter().flatten() {
            self.bar_segments.remove(&window);
            self.conn.destroy_window(window)?;
        }
        if self.selected_monitor >= self.monitors.len() {
            self.selected_monitor = 0;
        }
        Ok(())
    }

    /// Monitor whose work area overlaps `rect` the most, defaulting to the
    /// selected one.
    pub(super) fn rect_to_monitor(&self, rect: WindowGeometry) -> usize {
        let mut best = self.selected_monitor;
        let mut best_area = 0;
        for (index, monitor) in self.monitors.iter().enumerate() {
            let area = monitor.window_area.intersection_area(&rect);
            if area > best_area {
                best_area = area;
                best = index;
            }
        }
        best
    }

    /// Monitor a window belongs to: the owner of a bar, the monitor of a
    /// client, or the one under the pointer for the root window.
    pub(super) fn window_to_monitor(&self, window: Window, root_x: i32, root_y: i32) -> usize {
        if window == self.conn.root() {
            return self.rect_to_monitor(WindowGeometry::new(root_x, root_y, 1, 1));
        }
        if let Some(index) = self
            .monitors
            .iter()
            .position(|monitor| monitor.bar_window == Some(window) || monitor.tab_window == Some(window))
        {
            return index;
        }
        self.clients
            .get(&window)
            .map_or(self.selected_monitor, |client| client.monitor_index)
    }

    fn monitor_in_direction(&self, direction: i32) -> usize {
        let count = self.monitors.len() as i32;
        (self.selected_monitor as i32 + direction.signum()).rem_euclid(count) as usize
    }

    /// Moves a client to another monitor, where it takes that monitor's
    /// current tags.
    pub(super) fn send_to_monitor(&mut self, window: Window, target: usize) -> WmResult<()> {
        let Some(client) = self.clients.get(&window) else {
            return Ok(());
        };
        if client.monitor_index == target || target >= self.monitors.len() {
            return Ok(());
        }

        self.unfocus(window, true)?;
        self.detach(window);
        self.detach_stack(window);
        let tags = self.monitors[target].selected_tags();
        if let Some(client) = self.clients.get_mut(&window) {
            client.monitor_index = target;
            client.tags = tags;
        }
        self.attach(window);
        self.attach_stack(window);
        self.update_client_desktop(window)?;
        self.focus(None)?;
        self.arrange(None)
    }

    pub(super) fn focus_monitor(&mut self, direction: i32) -> WmResult<()> {
        if self.monitors.len() <= 1 {
            return Ok(());
        }
        let target = self.monitor_in_direction(direction);
        if target == self.selected_monitor {
            return Ok(());
        }
        if let Some(selected) = self.selected_client() {
            self.unfocus(selected, false)?;
        }
        self.selected_monitor = target;
        self.focus(None)
    }

    pub(super) fn tag_monitor(&mut self, direction: i32) -> WmResult<()> {
        let Some(window) = self.selected_client() else {
            return Ok(());
        };
        if self.monitors.len() <= 1 {
            return Ok(());
        }
        let target = self.monitor_in_direction(direction);
        self.send_to_monitor(window, target)
    }
}

fn bounding_box(outputs: &[WindowGeometry]) -> WindowGeometry {
    let Some(first) = outputs.first() else {
        return WindowGeometry::default();
    };
    let (left, top, right, bottom) = outputs.iter().fold(
        (first.x_coordinate, first.y_coordinate, first.right(), first.bottom()),
        |(left, top, right, bottom), output| {
            (
                left.min(output.x_coordinate),
                top.min(output.y_coordinate),
                right.max(output.right()),
                bottom.max(output.bottom()),
            )
        },
    );
    WindowGeometry::new(left, top, right - left, bottom - top)
}
