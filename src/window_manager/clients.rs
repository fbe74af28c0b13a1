use super::WindowManager;
use crate::client::{Client, FloatState};
use crate::errors::WmResult;
use crate::layout::WindowGeometry;
use crate::monitor::{AttachPolicy, unmask_tag};
use crate::size_hints::{ClampContext, clamp_geometry};
use crate::x::{Protocol, WmState, XConn};
use tracing::{debug, info};
use x11rb::protocol::xproto::Window;

impl<X: XConn> WindowManager<X> {
    /// Adopts windows that were already mapped (or iconified) before we
    /// started. Transients go last so their parents are managed first.
    pub(super) fn scan(&mut self) -> WmResult<()> {
        let windows = self.conn.existing_windows()?;
        let mut transients = Vec::new();

        for window in windows {
            if !self.is_manageable_at_startup(window)? {
                continue;
            }
            if self.conn.transient_for(window)?.is_some() {
                transients.push(window);
                continue;
            }
            self.manage_existing(window)?;
        }

        for window in transients {
            self.manage_existing(window)?;
        }
        Ok(())
    }

    fn is_manageable_at_startup(&self, window: Window) -> WmResult<bool> {
        if self.clients.contains_key(&window) || self.is_systray_icon(window) {
            return Ok(false);
        }
        let Some(attributes) = self.conn.window_attributes(window)? else {
            return Ok(false);
        };
        if attributes.override_redirect {
            return Ok(false);
        }
        Ok(attributes.viewable || self.conn.wm_state(window)? == Some(WmState::Iconic))
    }

    fn manage_existing(&mut self, window: Window) -> WmResult<()> {
        if let Some((geometry, border_width)) = self.conn.window_geometry(window)? {
            self.manage(window, geometry, border_width)?;
        }
        Ok(())
    }

    pub(super) fn manage(&mut self, window: Window, geometry: WindowGeometry, border_width: i32) -> WmResult<()> {
        let mut client = Client::new(window, self.selected_monitor, 0);
        client.geometry = geometry;
        client.old_geometry = geometry;
        client.float_geometry = geometry;
        client.old_border_width = border_width;
        client.name = self.conn.window_title(window)?;

        let transient_for = self.conn.transient_for(window)?;
        match transient_for.and_then(|parent| self.clients.get(&parent)) {
            Some(parent) => {
                client.monitor_index = parent.monitor_index;
                client.tags = parent.tags;
            }
            None => self.apply_rules(&mut client)?,
        }

        let area = self.monitors[client.monitor_index].window_area;
        if client.geometry.x_coordinate + client.width_with_border() > area.right() {
            client.geometry.x_coordinate = area.right() - client.width_with_border();
        }
        if client.geometry.y_coordinate + client.height_with_border() > area.bottom() {
            client.geometry.y_coordinate = area.bottom() - client.height_with_border();
        }
        client.geometry.x_coordinate = client.geometry.x_coordinate.max(area.x_coordinate);
        client.geometry.y_coordinate = client.geometry.y_coordinate.max(area.y_coordinate);

        client.border_width = self.config.border_width as i32;
        self.conn.set_border_width(window, client.border_width)?;
        self.conn
            .set_border_color(window, self.config.scheme_normal.border)?;
        self.conn
            .send_configure_notify(window, client.geometry, client.border_width)?;

        let monitor_index = client.monitor_index;
        info!(window, class = %client.class, tags = client.tags, monitor = monitor_index, "managing window");
        self.clients.insert(window, client);

        self.update_window_type(window)?;
        self.update_size_hints(window)?;
        self.update_wm_hints(window)?;

        if let Some(client) = self.clients.get_mut(&window) {
            if client.is_centered {
                client.geometry.x_coordinate =
                    area.x_coordinate + (area.width - client.width_with_border()) / 2;
                client.geometry.y_coordinate =
                    area.y_coordinate + (area.height - client.height_with_border()) / 2;
            }
            if !client.is_floating() && (transient_for.is_some() || client.is_fixed) {
                client.float_state = FloatState::AutoFloating;
            }
            client.old_float_state = client.float_state;
            client.float_geometry = client.geometry;
        }

        self.conn.select_client_input(window)?;
        self.conn
            .grab_buttons(window, false, &self.config.buttons)?;

        if self.clients.get(&window).is_some_and(|client| client.is_floating()) {
            self.conn.raise(window)?;
        }

        self.attach(window);
        self.attach_stack(window);
        self.update_client_list()?;
        self.update_client_desktop(window)?;

        if let Some(client) = self.clients.get(&window) {
            self.conn.move_window(
                window,
                client.geometry.x_coordinate + 2 * self.screen.width,
                client.geometry.y_coordinate,
            )?;
        }
        self.conn.set_wm_state(window, WmState::Normal)?;

        if monitor_index == self.selected_monitor
            && let Some(selected) = self.selected_client()
        {
            self.unfocus(selected, false)?;
        }
        self.monitors[monitor_index].selected_client = Some(window);
        self.arrange(Some(monitor_index))?;
        self.conn.map(window)?;
        self.focus(None)?;
        Ok(())
    }

    fn apply_rules(&self, client: &mut Client) -> WmResult<()> {
        let (instance, class) = self.conn.window_class(client.window)?;
        client.float_state = FloatState::Tiled;
        client.tags = 0;

        for rule in &self.config.rules {
            if !rule.matches(&class, &instance, &client.name) {
                continue;
            }
            client.is_centered |= rule.centered;
            if rule.floating {
                client.float_state = FloatState::Floating;
            }
            client.tags |= rule.tags;
            if rule.scratch_key != 0 && client.scratch_key == 0 {
                if self.find_scratch(rule.scratch_key).is_none() {
                    client.scratch_key = rule.scratch_key;
                } else {
                    debug!(key = rule.scratch_key, "scratch key already live");
                }
            }
            if let Ok(monitor) = usize::try_from(rule.monitor)
                && monitor < self.monitors.len()
            {
                client.monitor_index = monitor;
            }
        }

        client.instance = instance;
        client.class = class;

        let all_tags = self.all_tags();
        client.tags = if client.tags & all_tags != 0 {
            client.tags & all_tags
        } else {
            self.monitors[client.monitor_index].selected_tags()
        };
        Ok(())
    }

    pub(super) fn unmanage(&mut self, window: Window, destroyed: bool) -> WmResult<()> {
        let Some(client) = self.clients.get(&window) else {
            return Ok(());
        };
        let monitor_index = client.monitor_index;
        let old_border_width = client.old_border_width;

        self.detach(window);
        self.detach_stack(window);

        if !destroyed {
            self.conn.set_border_width(window, old_border_width)?;
            self.conn.set_wm_state(window, WmState::Withdrawn)?;
        }
        self.clients.remove(&window);
        info!(window, destroyed, "unmanaged window");

        self.focus(None)?;
        self.update_client_list()?;
        self.arrange(Some(monitor_index))?;
        Ok(())
    }

    pub(super) fn kill_client(&mut self) -> WmResult<()> {
        let Some(window) = self.selected_client() else {
            return Ok(());
        };
        if self.conn.supports_protocol(window, Protocol::DeleteWindow)? {
            self.conn.send_protocol(window, Protocol::DeleteWindow)
        } else {
            self.conn.kill_client(window)
        }
    }

    /// Inserts a client into its monitor's list according to the active
    /// attach policy.
    pub(super) fn attach(&mut self, window: Window) {
        let Some(client) = self.clients.get(&window) else {
            return;
        };
        let monitor = &self.monitors[client.monitor_index];
        let selected = monitor
            .selected_client
            .filter(|&selected| selected != window)
            .filter(|selected| self.clients.get(selected).is_some_and(|c| !c.is_floating()))
            .and_then(|selected| monitor.clients.iter().position(|&w| w == selected));

        let position = match monitor.attach_policy() {
            AttachPolicy::Front => 0,
            AttachPolicy::Bottom => monitor.clients.len(),
            AttachPolicy::Above => selected.unwrap_or(0),
            AttachPolicy::Below => selected.map_or(monitor.clients.len(), |index| index + 1),
            AttachPolicy::Aside => {
                let num_master = usize::try_from(monitor.num_master).unwrap_or(0);
                let tagset = monitor.selected_tags();
                monitor
                    .clients
                    .iter()
                    .enumerate()
                    .filter(|(_, other)| {
                        self.clients
                            .get(other)
                            .is_some_and(|other| other.is_tiled_on(tagset))
                    })
                    .nth(num_master.saturating_sub(1))
                    .filter(|_| num_master > 0)
                    .map_or(monitor.clients.len(), |(index, _)| index + 1)
            }
        };

        let monitor_index = client.monitor_index;
        self.monitors[monitor_index].clients.insert(position, window);
    }

    pub(super) fn detach(&mut self, window: Window) {
        if let Some(monitor_index) = self.clients.get(&window).map(|client| client.monitor_index) {
            self.monitors[monitor_index].clients.retain(|&other| other != window);
        }
    }

    pub(super) fn attach_stack(&mut self, window: Window) {
        if let Some(monitor_index) = self.clients.get(&window).map(|client| client.monitor_index) {
            self.monitors[monitor_index].stack.insert(0, window);
        }
    }

    /// Removes a client from its monitor's focus stack. Removing the selected
    /// client moves the selection to the next visible entry.
    pub(super) fn detach_stack(&mut self, window: Window) {
        let Some(monitor_index) = self.clients.get(&window).map(|client| client.monitor_index) else {
            return;
        };
        self.monitors[monitor_index].stack.retain(|&other| other != window);

        if self.monitors[monitor_index].selected_client == Some(window) {
            let next = self.monitors[monitor_index]
                .stack
                .iter()
                .copied()
                .find(|&other| self.is_visible(other));
            self.monitors[monitor_index].selected_client = next;
        }
    }

    /// Resolves `proposed` through the size-hint rules and applies it when
    /// anything changed.
    pub(super) fn resize(&mut self, window: Window, proposed: WindowGeometry, interactive: bool) -> WmResult<()> {
        let Some(client) = self.clients.get(&window) else {
            return Ok(());
        };
        let monitor = &self.monitors[client.monitor_index];
        let context = ClampContext {
            screen: self.screen,
            window_area: monitor.window_area,
            bar_height: self.bar_height,
            respect_hints: self.config.resize_hints
                || client.is_floating()
                || !monitor.layout().is_tiling(),
        };

        let (geometry, changed) = clamp_geometry(client, proposed, interactive, &context);
        if changed {
            self.resize_client(window, geometry)?;
        }
        Ok(())
    }

    pub(super) fn resize_client(&mut self, window: Window, geometry: WindowGeometry) -> WmResult<()> {
        let Some(client) = self.clients.get_mut(&window) else {
            return Ok(());
        };
        client.old_geometry = client.geometry;
        client.geometry = geometry;
        let border_width = client.border_width;

        self.conn.configure_client(window, geometry, border_width)?;
        self.conn.send_configure_notify(window, geometry, border_width)?;
        Ok(())
    }

    pub(super) fn update_title(&mut self, window: Window) -> WmResult<()> {
        let title = self.conn.window_title(window)?;
        if let Some(client) = self.clients.get_mut(&window) {
            client.name = title;
        }
        Ok(())
    }

    /// Re-reads `WM_NORMAL_HINTS`. A client floated for being fixed-size
    /// drops back to tiled once it no longer is; one that becomes fixed floats.
    pub(super) fn update_size_hints(&mut self, window: Window) -> WmResult<()> {
        let hints = self.conn.size_hints(window)?.unwrap_or_default();
        let Some(client) = self.clients.get_mut(&window) else {
            return Ok(());
        };
        let was_fixed = client.is_fixed;
        client.apply_size_hints(hints);

        match (client.float_state, was_fixed, client.is_fixed) {
            (FloatState::AutoFloating, true, false) => client.float_state = FloatState::Tiled,
            (FloatState::Tiled, _, true) => client.float_state = FloatState::AutoFloating,
            _ => {}
        }
        Ok(())
    }

    pub(super) fn update_wm_hints(&mut self, window: Window) -> WmResult<()> {
        let Some(hints) = self.conn.wm_hints(window)? else {
            return Ok(());
        };
        let is_selected = self.selected_client() == Some(window);
        let Some(client) = self.clients.get_mut(&window) else {
            return Ok(());
        };

        if is_selected && hints.urgent {
            self.conn.set_urgency_hint(window, false)?;
        } else {
            client.is_urgent = hints.urgent;
        }
        client.never_focus = hints.input.is_some_and(|input| !input);
        Ok(())
    }

    pub(super) fn update_window_type(&mut self, window: Window) -> WmResult<()> {
        let window_type = self.conn.window_type(window)?;
        if window_type.is_fullscreen {
            self.set_fullscreen(window, true)?;
        }
        if window_type.is_dialog
            && let Some(client) = self.clients.get_mut(&window)
            && !client.is_floating()
        {
            client.float_state = FloatState::AutoFloating;
        }
        Ok(())
    }

    pub(super) fn set_urgent(&mut self, window: Window, urgent: bool) -> WmResult<()> {
        let Some(client) = self.clients.get_mut(&window) else {
            return Ok(());
        };
        client.is_urgent = urgent;
        self.conn.set_urgency_hint(window, urgent)?;
        if urgent {
            self.conn
                .set_border_color(window, self.config.scheme_urgent.border)?;
        }
        Ok(())
    }

    pub(super) fn set_fullscreen(&mut self, window: Window, fullscreen: bool) -> WmResult<()> {
        let Some(client) = self.clients.get(&window) else {
            return Ok(());
        };
        if client.is_fullscreen == fullscreen {
            return Ok(());
        }
        let monitor_index = client.monitor_index;
        let screen = self.monitors[monitor_index].screen;
        self.conn.set_fullscreen_state(window, fullscreen)?;

        if fullscreen {
            if let Some(client) = self.clients.get_mut(&window) {
                client.is_fullscreen = true;
                client.old_float_state = client.float_state;
                client.old_border_width = client.border_width;
                client.border_width = 0;
                client.float_state = FloatState::Floating;
            }
            self.resize_client(window, screen)?;
            self.conn.raise(window)?;
        } else {
            let Some(client) = self.clients.get_mut(&window) else {
                return Ok(());
            };
            client.is_fullscreen = false;
            client.float_state = client.old_float_state;
            client.border_width = client.old_border_width;
            let restored = client.old_geometry;
            self.resize_client(window, restored)?;
            self.arrange(Some(monitor_index))?;
        }
        Ok(())
    }

    pub(super) fn update_client_list(&self) -> WmResult<()> {
        let windows: Vec<Window> = self
            .monitors
            .iter()
            .flat_map(|monitor| monitor.clients.iter().copied())
            .collect();
        self.conn.set_client_list(&windows)
    }

    /// Publishes `_NET_WM_DESKTOP` as the client's lowest tag.
    pub(super) fn update_client_desktop(&self, window: Window) -> WmResult<()> {
        let Some(client) = self.clients.get(&window) else {
            return Ok(());
        };
        if client.tags == 0 {
            return Ok(());
        }
        self.conn
            .set_client_desktop(window, unmask_tag(client.tags) as u32)
    }
}
