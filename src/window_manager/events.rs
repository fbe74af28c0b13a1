use super::WindowManager;
use crate::bar::{ClickRegion, segment_at};
use crate::client::FloatState;
use crate::errors::WmResult;
use crate::keyboard::{Arg, KeyAction, handle_button_press, handle_key_press};
use crate::keyboard::keysyms::Keysym;
use crate::x::{ClientMessageKind, ConfigureRequest, Property, WmState, XConn, XEvent};
use tracing::trace;
use x11rb::protocol::xproto::Window;

impl<X: XConn> WindowManager<X> {
    pub(super) fn dispatch(&mut self, event: XEvent) -> WmResult<()> {
        trace!(?event, "dispatching");

        match event {
            XEvent::MapRequest(window) => self.map_request(window),
            XEvent::UnmapNotify { window, synthetic } => self.unmap_notify(window, synthetic),
            XEvent::DestroyNotify(window) => self.destroy_notify(window),
            XEvent::ConfigureRequest(request) => self.configure_request(request),
            XEvent::ConfigureNotify { window, .. } => self.configure_notify(window),
            XEvent::EnterNotify {
                window,
                root_x,
                root_y,
            } => self.enter_notify(window, root_x, root_y),
            XEvent::MotionNotify {
                window,
                root_x,
                root_y,
                ..
            } => self.motion_notify(window, root_x, root_y),
            XEvent::ButtonPress {
                window,
                event_x,
                root_x,
                root_y,
                button,
                state,
            } => self.button_press(window, event_x, root_x, root_y, button, state),
            XEvent::ButtonRelease => Ok(()),
            XEvent::KeyPress { keysym, state } => self.key_press(keysym, state),
            XEvent::PropertyNotify {
                window,
                property,
                deleted,
            } => self.property_notify(window, property, deleted),
            XEvent::ClientMessage { window, kind } => self.client_message(window, kind),
            XEvent::Expose { window, count } => self.expose(window, count),
            XEvent::FocusIn(window) => self.focus_in(window),
            XEvent::MappingNotify => self.conn.grab_keys(&self.config.keybindings),
            XEvent::ResizeRequest {
                window,
                width,
                height,
            } => self.resize_systray_icon(window, width, height),
        }
    }

    fn map_request(&mut self, window: Window) -> WmResult<()> {
        if self.is_systray_icon(window) {
            self.conn.map(window)?;
            return self.update_systray();
        }
        let Some(attributes) = self.conn.window_attributes(window)? else {
            return Ok(());
        };
        if attributes.override_redirect || self.clients.contains_key(&window) {
            return Ok(());
        }
        match self.conn.window_geometry(window)? {
            Some((geometry, border_width)) => self.manage(window, geometry, border_width),
            None => Ok(()),
        }
    }

    fn unmap_notify(&mut self, window: Window, synthetic: bool) -> WmResult<()> {
        if self.clients.contains_key(&window) {
            if synthetic {
                self.conn.set_wm_state(window, WmState::Withdrawn)
            } else {
                self.unmanage(window, false)
            }
        } else if self.is_systray_icon(window) {
            // Icons unmap themselves without being destroyed; keep them shown.
            self.conn.map(window)?;
            self.update_systray()
        } else {
            Ok(())
        }
    }

    fn destroy_notify(&mut self, window: Window) -> WmResult<()> {
        if self.clients.contains_key(&window) {
            self.unmanage(window, true)
        } else {
            self.remove_systray_icon(window)
        }
    }

    /// Floating clients (or any client without a tiling layout) get what
    /// they ask for; tiled clients are told their current geometry.
    fn configure_request(&mut self, request: ConfigureRequest) -> WmResult<()> {
        let window = request.window;
        let tiling = self.selmon().layout().is_tiling();
        let Some(client) = self.clients.get_mut(&window) else {
            return self.conn.forward_configure_request(&request);
        };

        if let Some(border_width) = request.border_width {
            client.border_width = border_width;
            return Ok(());
        }
        if !client.is_floating() && tiling {
            return self
                .conn
                .send_configure_notify(window, client.geometry, client.border_width);
        }

        let screen = self.monitors[client.monitor_index].screen;
        let geometry = &mut client.geometry;
        if let Some(x) = request.x {
            client.old_geometry.x_coordinate = geometry.x_coordinate;
            geometry.x_coordinate = screen.x_coordinate + x;
        }
        if let Some(y) = request.y {
            client.old_geometry.y_coordinate = geometry.y_coordinate;
            geometry.y_coordinate = screen.y_coordinate + y;
        }
        if let Some(width) = request.width {
            client.old_geometry.width = geometry.width;
            geometry.width = width;
        }
        if let Some(height) = request.height {
            client.old_geometry.height = geometry.height;
            geometry.height = height;
        }

        let outer_width = client.width_with_border();
        let outer_height = client.height_with_border();
        if client.is_floating() {
            if client.geometry.right() > screen.right() {
                client.geometry.x_coordinate = screen.x_coordinate + (screen.width / 2 - outer_width / 2);
            }
            if client.geometry.bottom() > screen.bottom() {
                client.geometry.y_coordinate = screen.y_coordinate + (screen.height / 2 - outer_height / 2);
            }
            client.float_geometry = client.geometry;
        }

        let geometry = client.geometry;
        let border_width = client.border_width;
        if request.is_move_only() {
            self.conn.send_configure_notify(window, geometry, border_width)?;
        }
        if self.is_visible(window) {
            self.conn.move_resize_window(window, geometry)?;
        }
        Ok(())
    }

    /// The root window changed size: re-read outputs and lay everything out
    /// again.
    fn configure_notify(&mut self, window: Window) -> WmResult<()> {
        if window != self.conn.root() || !self.update_geometry()? {
            return Ok(());
        }

        self.update_bars()?;
        for index in 0..self.monitors.len() {
            self.update_bar_position(index)?;
            let screen = self.monitors[index].screen;
            let fullscreen: Vec<Window> = self.monitors[index]
                .clients
                .iter()
                .copied()
                .filter(|window| self.clients.get(window).is_some_and(|client| client.is_fullscreen))
                .collect();
            for window in fullscreen {
                self.resize_client(window, screen)?;
            }
        }
        self.update_systray()?;
        self.focus(None)?;
        self.arrange(None)
    }

    fn enter_notify(&mut self, window: Window, root_x: i32, root_y: i32) -> WmResult<()> {
        let client = self.clients.contains_key(&window).then_some(window);
        let monitor = self.window_to_monitor(window, root_x, root_y);

        if monitor != self.selected_monitor {
            if let Some(selected) = self.selected_client() {
                self.unfocus(selected, true)?;
            }
            self.selected_monitor = monitor;
        } else if client.is_none() || client == self.selected_client() {
            return Ok(());
        }
        self.focus(client)
    }

    /// Pointer motion over the root window switches monitors.
    fn motion_notify(&mut self, window: Window, root_x: i32, root_y: i32) -> WmResult<()> {
        if window != self.conn.root() {
            return Ok(());
        }
        let monitor = self.window_to_monitor(window, root_x, root_y);
        if let Some(previous) = self.motion_monitor
            && previous != monitor
        {
            if let Some(selected) = self.selected_client() {
                self.unfocus(selected, true)?;
            }
            self.selected_monitor = monitor;
            self.focus(None)?;
        }
        self.motion_monitor = Some(monitor);
        Ok(())
    }

    fn button_press(
        &mut self,
        window: Window,
        event_x: i32,
        root_x: i32,
        root_y: i32,
        button: u8,
        state: u16,
    ) -> WmResult<()> {
        let monitor = self.window_to_monitor(window, root_x, root_y);
        if monitor != self.selected_monitor {
            if let Some(selected) = self.selected_client() {
                self.unfocus(selected, true)?;
            }
            self.selected_monitor = monitor;
            self.focus(None)?;
        }

        let (region, clicked) = if let Some(segments) = self.bar_segments.get(&window) {
            match segment_at(segments, event_x) {
                Some(segment) if segment.region == ClickRegion::TagBar => {
                    (ClickRegion::TagBar, Arg::UInt(1 << segment.index))
                }
                Some(segment) if segment.region == ClickRegion::TabBar => {
                    (ClickRegion::TabBar, Arg::UInt(segment.index as u32))
                }
                Some(segment) => (segment.region, Arg::None),
                None => return Ok(()),
            }
        } else if self.clients.contains_key(&window) {
            self.focus(Some(window))?;
            self.restack(self.selected_monitor)?;
            (ClickRegion::ClientWindow, Arg::None)
        } else {
            (ClickRegion::RootWindow, Arg::None)
        };

        let Some((action, arg)) = handle_button_press(region, button, state, &self.config.buttons) else {
            return Ok(());
        };
        let arg = match (region, arg) {
            (ClickRegion::TagBar | ClickRegion::TabBar, Arg::None) => clicked,
            (_, arg) => arg,
        };
        self.execute(action, arg)
    }

    fn key_press(&mut self, keysym: Keysym, state: u16) -> WmResult<()> {
        let (action, arg) = handle_key_press(keysym, state, &self.config.keybindings);
        if action == KeyAction::None {
            return Ok(());
        }
        self.execute(action, arg)
    }

    fn property_notify(&mut self, window: Window, property: Property, deleted: bool) -> WmResult<()> {
        if window == self.conn.root() && property == Property::Name {
            return self.update_status();
        }
        if self.is_systray_icon(window) {
            if property == Property::XembedInfo {
                self.update_systray_icon_state(window)?;
            }
            return Ok(());
        }
        if deleted || !self.clients.contains_key(&window) {
            return Ok(());
        }

        match property {
            Property::TransientFor => {
                let parent = self.conn.transient_for(window)?;
                let parent_managed = parent.is_some_and(|parent| self.clients.contains_key(&parent));
                if let Some(client) = self.clients.get_mut(&window)
                    && !client.is_floating()
                    && parent_managed
                {
                    client.float_state = FloatState::AutoFloating;
                    let monitor_index = client.monitor_index;
                    self.arrange(Some(monitor_index))?;
                }
                Ok(())
            }
            Property::NormalHints => {
                let was_floating = self.clients.get(&window).is_some_and(|client| client.is_floating());
                self.update_size_hints(window)?;
                match self.clients.get(&window) {
                    Some(client) if client.is_floating() != was_floating => {
                        let monitor_index = client.monitor_index;
                        self.arrange(Some(monitor_index))
                    }
                    _ => Ok(()),
                }
            }
            Property::Hints => {
                self.update_wm_hints(window)?;
                self.draw_bars()
            }
            Property::Name => {
                self.update_title(window)?;
                match self.clients.get(&window).map(|client| client.monitor_index) {
                    Some(monitor_index) if self.monitors[monitor_index].selected_client == Some(window) => {
                        self.draw_bar(monitor_index)
                    }
                    _ => Ok(()),
                }
            }
            Property::WindowType => self.update_window_type(window),
            Property::XembedInfo | Property::Other => Ok(()),
        }
    }

    fn client_message(&mut self, window: Window, kind: ClientMessageKind) -> WmResult<()> {
        match kind {
            ClientMessageKind::DockRequest(icon) if self.is_systray_window(window) => self.dock_icon(icon),
            ClientMessageKind::Fullscreen(action) => {
                let Some(current) = self.clients.get(&window).map(|client| client.is_fullscreen) else {
                    return Ok(());
                };
                self.set_fullscreen(window, action.apply(current))
            }
            ClientMessageKind::ActiveWindow => {
                let urgent = self.clients.get(&window).is_some_and(|client| client.is_urgent);
                if self.clients.contains_key(&window) && self.selected_client() != Some(window) && !urgent {
                    self.set_urgent(window, true)?;
                    self.draw_bars()?;
                }
                Ok(())
            }
            ClientMessageKind::DockRequest(_) | ClientMessageKind::Other => Ok(()),
        }
    }

    fn expose(&mut self, window: Window, count: u16) -> WmResult<()> {
        if count != 0 {
            return Ok(());
        }
        if let Some(index) = self
            .monitors
            .iter()
            .position(|monitor| monitor.bar_window == Some(window) || monitor.tab_window == Some(window))
        {
            self.draw_bar(index)?;
            if index == self.selected_monitor {
                self.update_systray()?;
            }
        }
        Ok(())
    }

    /// Some clients grab focus on their own; give it back to the selection.
    fn focus_in(&mut self, window: Window) -> WmResult<()> {
        match self.selected_client() {
            Some(selected) if selected != window => self.set_focus(selected),
            _ => Ok(()),
        }
    }
}
