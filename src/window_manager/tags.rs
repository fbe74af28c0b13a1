use super::WindowManager;
use crate::client::TagMask;
use crate::errors::WmResult;
use crate::monitor::{Pertag, unmask_tag};
use crate::x::XConn;
use x11rb::protocol::xproto::Window;

/// Rotates the low `tag_count` bits of `mask` by one position.
pub(super) fn rotate_tags(mask: TagMask, direction: i32, tag_count: usize) -> TagMask {
    let all = (1u32 << tag_count) - 1;
    let mask = mask & all;
    let shift = tag_count as u32 - 1;
    if direction > 0 {
        ((mask << 1) | (mask >> shift)) & all
    } else {
        ((mask >> 1) | (mask << shift)) & all
    }
}

impl<X: XConn> WindowManager<X> {
    /// Switches the selected monitor to `mask`. A zero mask goes back to the
    /// previous view.
    pub(super) fn view(&mut self, mask: TagMask) -> WmResult<()> {
        let all_tags = self.all_tags();
        let mask = mask & all_tags;
        let index = self.selected_monitor;
        if mask == self.monitors[index].selected_tags() {
            return Ok(());
        }

        if !self.view_has_clients(index) {
            let monitor = &mut self.monitors[index];
            monitor.pertag.reset(monitor.pertag.current_tag);
        }

        let monitor = &mut self.monitors[index];
        monitor.selected_tags_index ^= 1;
        if mask != 0 {
            monitor.tagset[monitor.selected_tags_index] = mask;
            monitor.pertag.previous_tag = monitor.pertag.current_tag;
            monitor.pertag.current_tag = Pertag::slot_for(mask, all_tags);
        } else {
            std::mem::swap(&mut monitor.pertag.current_tag, &mut monitor.pertag.previous_tag);
        }
        monitor.restore_tag_settings();

        self.focus(None)?;
        self.arrange(Some(index))?;
        self.update_current_desktop()
    }

    /// XORs `mask` into the current view. The clients in the master area
    /// before the change are moved to the front so they stay masters.
    pub(super) fn toggle_view(&mut self, mask: TagMask) -> WmResult<()> {
        let all_tags = self.all_tags();
        let index = self.selected_monitor;
        let new_tagset = self.monitors[index].selected_tags() ^ (mask & all_tags);
        if new_tagset == 0 {
            return Ok(());
        }

        let num_master = usize::try_from(self.monitors[index].num_master).unwrap_or(0);
        let masters: Vec<Window> = self
            .tiled_clients(index)
            .into_iter()
            .take(num_master)
            .collect();

        let monitor = &mut self.monitors[index];
        monitor.tagset[monitor.selected_tags_index] = new_tagset;

        let pertag = &mut monitor.pertag;
        if new_tagset == all_tags {
            pertag.previous_tag = pertag.current_tag;
            pertag.current_tag = 0;
        } else if pertag.current_tag == 0 || new_tagset & (1 << (pertag.current_tag - 1)) == 0 {
            pertag.previous_tag = pertag.current_tag;
            pertag.current_tag = unmask_tag(new_tagset) + 1;
        }
        monitor.restore_tag_settings();

        for &window in masters.iter().rev() {
            monitor.clients.retain(|&other| other != window);
            monitor.clients.insert(0, window);
        }

        self.focus(None)?;
        self.arrange(Some(index))?;
        self.update_current_desktop()
    }

    pub(super) fn tag(&mut self, mask: TagMask) -> WmResult<()> {
        let mask = mask & self.all_tags();
        let Some(window) = self.selected_client() else {
            return Ok(());
        };
        if mask == 0 {
            return Ok(());
        }
        if let Some(client) = self.clients.get_mut(&window) {
            client.tags = mask;
        }
        self.update_client_desktop(window)?;
        self.focus(None)?;
        self.arrange(Some(self.selected_monitor))
    }

    /// XORs `mask` into the selected client's tags, refusing to leave it
    /// with none.
    pub(super) fn toggle_tag(&mut self, mask: TagMask) -> WmResult<()> {
        let Some(window) = self.selected_client() else {
            return Ok(());
        };
        let all_tags = self.all_tags();
        let Some(client) = self.clients.get_mut(&window) else {
            return Ok(());
        };
        let new_tags = client.tags ^ (mask & all_tags);
        if new_tags == 0 {
            return Ok(());
        }
        client.tags = new_tags;

        self.update_client_desktop(window)?;
        self.focus(None)?;
        self.arrange(Some(self.selected_monitor))
    }

    /// Exchanges the contents and saved layout state of the current single
    /// tag and `mask`, then views `mask`.
    pub(super) fn swap_tags(&mut self, mask: TagMask) -> WmResult<()> {
        let all_tags = self.all_tags();
        let new_tag = mask & all_tags;
        let index = self.selected_monitor;
        let current = self.monitors[index].selected_tags();
        let single = |mask: TagMask| mask != 0 && mask & (mask - 1) == 0;
        if new_tag == current || !single(new_tag) || !single(current) {
            return Ok(());
        }

        let windows = self.monitors[index].clients.clone();
        for window in windows {
            if let Some(client) = self.clients.get_mut(&window)
                && client.tags & (new_tag | current) != 0
            {
                client.tags ^= current ^ new_tag;
                if client.tags == 0 {
                    client.tags = new_tag;
                }
            }
            self.update_client_desktop(window)?;
        }

        let monitor = &mut self.monitors[index];
        let current_slot = Pertag::slot_for(current, all_tags);
        let new_slot = Pertag::slot_for(new_tag, all_tags);
        monitor.pertag.settings.swap(current_slot, new_slot);
        monitor.tagset[monitor.selected_tags_index] = new_tag;
        monitor.pertag.previous_tag = current_slot;
        monitor.pertag.current_tag = new_slot;
        monitor.restore_tag_settings();

        self.focus(None)?;
        self.arrange(Some(index))?;
        self.update_current_desktop()
    }

    /// Union of the tags of the selected monitor's clients, leaving out
    /// `except`.
    fn occupied_tags(&self, except: Option<Window>) -> TagMask {
        self.selmon()
            .clients
            .iter()
            .filter(|&&window| Some(window) != except)
            .filter_map(|window| self.clients.get(window))
            .fold(0, |occupied, client| occupied | client.tags)
    }

    /// Rotates the view until it lands on an occupied tag.
    fn next_occupied_view(&self, direction: i32, occupied: TagMask) -> Option<TagMask> {
        let tag_count = self.config.tags.len();
        let current = self.selmon().selected_tags();
        let mut next = current;
        for _ in 0..tag_count {
            next = rotate_tags(next, direction, tag_count);
            if next & occupied != 0 {
                return (next != current).then_some(next);
            }
        }
        None
    }

    pub(super) fn shift_view(&mut self, direction: i32) -> WmResult<()> {
        let occupied = self.occupied_tags(None);
        match self.next_occupied_view(direction, occupied) {
            Some(mask) => self.view(mask),
            None => Ok(()),
        }
    }

    /// Moves the selected client to the next tag holding other clients, or
    /// simply the adjacent tag when there is none.
    pub(super) fn shift_tag(&mut self, direction: i32) -> WmResult<()> {
        let Some(window) = self.selected_client() else {
            return Ok(());
        };
        let occupied = self.occupied_tags(Some(window));
        let mask = self.next_occupied_view(direction, occupied).unwrap_or_else(|| {
            rotate_tags(self.selmon().selected_tags(), direction, self.config.tags.len())
        });
        self.tag(mask)
    }

    fn view_has_clients(&self, monitor_index: usize) -> bool {
        let monitor = &self.monitors[monitor_index];
        let tagset = monitor.selected_tags();
        monitor
            .clients
            .iter()
            .filter_map(|window| self.clients.get(window))
            .any(|client| client.tags & tagset != 0)
    }

    pub(super) fn update_current_desktop(&self) -> WmResult<()> {
        let tags = self.selmon().selected_tags();
        self.conn.set_current_desktop(unmask_tag(tags) as u32)
    }
}
