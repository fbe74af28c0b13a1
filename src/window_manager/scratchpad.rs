//! Scratchpads: keyed slots that each hold at most one client. A hidden
//! scratchpad client keeps its window mapped but carries no tags.

use super::WindowManager;
use crate::errors::WmResult;
use crate::x::XConn;
use tracing::debug;
use x11rb::protocol::xproto::Window;

impl<X: XConn> WindowManager<X> {
    /// First client on any monitor holding `key`.
    pub(super) fn find_scratch(&self, key: i32) -> Option<Window> {
        self.monitors
            .iter()
            .flat_map(|monitor| monitor.clients.iter())
            .copied()
            .find(|window| {
                self.clients
                    .get(window)
                    .is_some_and(|client| client.scratch_key == key)
            })
    }

    fn selected_scratch_key(&self) -> Option<i32> {
        self.selected_client()
            .and_then(|window| self.clients.get(&window))
            .map(|client| client.scratch_key)
    }

    /// Brings the client holding `key` onto the current view, or spawns the
    /// command registered for the key.
    pub(super) fn scratch_show(&mut self, key: i32) -> WmResult<()> {
        if key == 0 {
            return Ok(());
        }
        let Some(window) = self.find_scratch(key) else {
            match self.config.scratchpad_command(key) {
                Some(command) => {
                    debug!(key, "spawning scratchpad");
                    self.conn.spawn(command);
                }
                None => debug!(key, "no client or command for scratch key"),
            }
            return Ok(());
        };

        let index = self.selected_monitor;
        if self.clients.get(&window).is_some_and(|client| client.monitor_index != index) {
            self.send_to_monitor(window, index)?;
        }

        let tags = self.monitors[index].selected_tags();
        if let Some(client) = self.clients.get_mut(&window) {
            client.tags = tags;
        }
        self.update_client_desktop(window)?;
        self.focus(Some(window))?;
        self.arrange(Some(index))
    }

    /// Hides the selected client if it holds `key`.
    pub(super) fn scratch_hide(&mut self, key: i32) -> WmResult<()> {
        if key == 0 || self.selected_scratch_key() != Some(key) {
            return Ok(());
        }
        let Some(window) = self.selected_client() else {
            return Ok(());
        };
        if let Some(client) = self.clients.get_mut(&window) {
            client.tags = 0;
        }
        self.focus(None)?;
        self.arrange(Some(self.selected_monitor))
    }

    pub(super) fn scratch_toggle(&mut self, key: i32) -> WmResult<()> {
        if self.selected_scratch_key() == Some(key) {
            self.scratch_hide(key)
        } else {
            self.scratch_show(key)
        }
    }

    /// Makes the selected client the holder of `key`, unless another client
    /// already holds it.
    pub(super) fn scratch_claim(&mut self, key: i32) -> WmResult<()> {
        let Some(window) = self.selected_client() else {
            return Ok(());
        };
        if key == 0 {
            return Ok(());
        }
        if let Some(holder) = self.find_scratch(key)
            && holder != window
        {
            self.notify(&format!("scratchpad {key} is already taken"));
            return Ok(());
        }
        if let Some(client) = self.clients.get_mut(&window) {
            client.scratch_key = key;
        }
        Ok(())
    }

    pub(super) fn scratch_release(&mut self) -> WmResult<()> {
        let Some(window) = self.selected_client() else {
            return Ok(());
        };
        if let Some(client) = self.clients.get_mut(&window) {
            client.scratch_key = 0;
        }
        Ok(())
    }
}
