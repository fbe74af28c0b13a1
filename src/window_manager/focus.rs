use super::WindowManager;
use crate::client::Client;
use crate::errors::WmResult;
use crate::monitor::unmask_tag;
use crate::x::{Protocol, XConn};
use x11rb::protocol::xproto::Window;

impl<X: XConn> WindowManager<X> {
    /// Focuses `window`, or the most recently focused visible client of the
    /// selected monitor when `window` is absent or not visible.
    pub(super) fn focus(&mut self, window: Option<Window>) -> WmResult<()> {
        let target = window.filter(|&window| self.is_visible(window)).or_else(|| {
            self.selmon()
                .stack
                .iter()
                .copied()
                .find(|&window| self.is_visible(window))
        });

        if let Some(selected) = self.selected_client()
            && Some(selected) != target
        {
            self.unfocus(selected, false)?;
        }

        match target {
            Some(window) => {
                if let Some(monitor_index) = self.clients.get(&window).map(|client| client.monitor_index) {
                    self.selected_monitor = monitor_index;
                }
                if self.clients.get(&window).is_some_and(|client| client.is_urgent) {
                    self.set_urgent(window, false)?;
                }
                self.detach_stack(window);
                self.attach_stack(window);
                self.conn
                    .grab_buttons(window, true, &self.config.buttons)?;
                self.conn
                    .set_border_color(window, self.config.scheme_selected.border)?;
                self.set_focus(window)?;
            }
            None => {
                self.conn.set_input_focus(None)?;
                self.conn.set_active_window(None)?;
            }
        }

        self.selmon_mut().selected_client = target;
        self.draw_bars()
    }

    pub(super) fn unfocus(&mut self, window: Window, reset_input_focus: bool) -> WmResult<()> {
        if !self.clients.contains_key(&window) {
            return Ok(());
        }
        self.conn
            .grab_buttons(window, false, &self.config.buttons)?;
        self.conn
            .set_border_color(window, self.config.scheme_normal.border)?;
        if reset_input_focus {
            self.conn.set_input_focus(None)?;
            self.conn.set_active_window(None)?;
        }
        Ok(())
    }

    pub(super) fn set_focus(&mut self, window: Window) -> WmResult<()> {
        let never_focus = self
            .clients
            .get(&window)
            .is_none_or(|client| client.never_focus);
        if !never_focus {
            self.conn.set_input_focus(Some(window))?;
            self.conn.set_active_window(Some(window))?;
        }
        if self.conn.supports_protocol(window, Protocol::TakeFocus)? {
            self.conn.send_protocol(window, Protocol::TakeFocus)?;
        }
        Ok(())
    }

    /// Next (or previous) client in list order after the selection that
    /// satisfies `accept`, wrapping around.
    fn cycle_from_selected<F>(&self, direction: i32, accept: F) -> Option<Window>
    where
        F: Fn(&Client) -> bool,
    {
        let selected = self.selected_client()?;
        let clients = &self.selmon().clients;
        let start = clients.iter().position(|&window| window == selected)?;
        let count = clients.len();

        (1..count)
            .map(|offset| {
                if direction > 0 {
                    clients[(start + offset) % count]
                } else {
                    clients[(start + count - offset) % count]
                }
            })
            .find(|window| self.clients.get(window).is_some_and(&accept) && self.is_visible(*window))
    }

    fn focus_and_restack(&mut self, window: Option<Window>) -> WmResult<()> {
        if let Some(window) = window {
            self.focus(Some(window))?;
            self.restack(self.selected_monitor)?;
        }
        Ok(())
    }

    pub(super) fn focus_stack(&mut self, direction: i32) -> WmResult<()> {
        if self
            .selected_client()
            .and_then(|window| self.clients.get(&window))
            .is_none_or(|client| client.is_fullscreen)
        {
            return Ok(());
        }
        let next = self.cycle_from_selected(direction, |_| true);
        self.focus_and_restack(next)
    }

    pub(super) fn focus_tiled(&mut self, direction: i32) -> WmResult<()> {
        let next = self.cycle_from_selected(direction, |client| !client.is_floating());
        self.focus_and_restack(next)
    }

    /// Moves between clients sharing the selection's floating state.
    pub(super) fn focus_same_float(&mut self, direction: i32) -> WmResult<()> {
        let Some(floating) = self
            .selected_client()
            .and_then(|window| self.clients.get(&window))
            .map(|client| client.is_floating())
        else {
            return Ok(());
        };
        let next = self.cycle_from_selected(direction, |client| client.is_floating() == floating);
        self.focus_and_restack(next)
    }

    pub(super) fn focus_master(&mut self) -> WmResult<()> {
        let master = self.tiled_clients(self.selected_monitor).first().copied();
        self.focus_and_restack(master)
    }

    /// Finds the first urgent client on any monitor, views its lowest tag
    /// there and focuses it.
    pub(super) fn focus_urgent(&mut self) -> WmResult<()> {
        let urgent = self.monitors.iter().enumerate().find_map(|(index, monitor)| {
            monitor
                .stack
                .iter()
                .copied()
                .find(|window| self.clients.get(window).is_some_and(|client| client.is_urgent))
                .map(|window| (index, window))
        });
        let Some((monitor_index, window)) = urgent else {
            return Ok(());
        };
        let Some(tags) = self.clients.get(&window).map(|client| client.tags) else {
            return Ok(());
        };

        if monitor_index != self.selected_monitor {
            if let Some(selected) = self.selected_client() {
                self.unfocus(selected, false)?;
            }
            self.selected_monitor = monitor_index;
        }
        if tags != 0 && tags & self.selmon().selected_tags() == 0 {
            self.view(1 << unmask_tag(tags))?;
        }
        self.focus(Some(window))?;
        self.restack(monitor_index)
    }

    /// Focuses the `index`-th tab, counted over visible tiled clients.
    pub(super) fn focus_window(&mut self, index: usize) -> WmResult<()> {
        let target = self.tiled_clients(self.selected_monitor).get(index).copied();
        self.focus_and_restack(target)
    }
}
