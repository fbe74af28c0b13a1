use super::WindowManager;
use crate::errors::WmResult;
use crate::keyboard::{Arg, KeyAction};
use crate::monitor::TabMode;
use crate::x::{WmState, XConn};
use tracing::{debug, info, warn};
use x11rb::protocol::xproto::Window;

const TAB_MODES: [TabMode; 3] = [TabMode::Never, TabMode::Auto, TabMode::Always];

impl<X: XConn> WindowManager<X> {
    /// Runs one bound action. Arguments of the wrong kind make the action
    /// a no-op.
    pub fn execute(&mut self, action: KeyAction, arg: Arg) -> WmResult<()> {
        debug!(?action, ?arg, "executing action");

        match action {
            KeyAction::Spawn => {
                match arg.as_command() {
                    Some(command) => self.conn.spawn(&command),
                    None => warn!(?arg, "spawn without a command"),
                }
                Ok(())
            }
            KeyAction::KillClient => self.kill_client(),
            KeyAction::Quit => {
                info!("quitting");
                self.running = false;
                Ok(())
            }
            KeyAction::Restart => {
                info!("restarting");
                self.restart = true;
                self.running = false;
                Ok(())
            }
            KeyAction::ToggleBar => self.toggle_bar(),
            KeyAction::SetTabMode => self.set_tab_mode(arg.as_uint()),
            KeyAction::FocusStack => with_int(&arg, |direction| self.focus_stack(direction)),
            KeyAction::FocusTiled => with_int(&arg, |direction| self.focus_tiled(direction)),
            KeyAction::FocusSameFloat => with_int(&arg, |direction| self.focus_same_float(direction)),
            KeyAction::FocusMaster => self.focus_master(),
            KeyAction::FocusUrgent => self.focus_urgent(),
            KeyAction::FocusWindow => match arg.as_uint() {
                Some(index) => self.focus_window(index as usize),
                None => Ok(()),
            },
            KeyAction::Zoom => self.zoom(),
            KeyAction::IncNumMaster => with_int(&arg, |delta| self.inc_num_master(delta)),
            KeyAction::SetMasterFactor => match arg.as_float() {
                Some(factor) => self.set_master_factor(factor),
                None => Ok(()),
            },
            KeyAction::SetMasterExtra => with_int(&arg, |delta| self.set_extra(delta, true)),
            KeyAction::SetStackExtra => with_int(&arg, |delta| self.set_extra(delta, false)),
            KeyAction::SetLayout => self.set_layout(arg.as_uint()),
            KeyAction::SetAttach => self.set_attach(arg.as_uint()),
            KeyAction::ToggleFloating => self.toggle_floating(),
            KeyAction::ToggleFullScreen => self.toggle_fullscreen(),
            KeyAction::View => with_mask(&arg, |mask| self.view(mask)),
            KeyAction::ToggleView => with_mask(&arg, |mask| self.toggle_view(mask)),
            KeyAction::Tag => with_mask(&arg, |mask| self.tag(mask)),
            KeyAction::ToggleTag => with_mask(&arg, |mask| self.toggle_tag(mask)),
            KeyAction::SwapTags => with_mask(&arg, |mask| self.swap_tags(mask)),
            KeyAction::ShiftView => with_int(&arg, |direction| self.shift_view(direction)),
            KeyAction::ShiftTag => with_int(&arg, |direction| self.shift_tag(direction)),
            KeyAction::FocusMonitor => with_int(&arg, |direction| self.focus_monitor(direction)),
            KeyAction::TagMonitor => with_int(&arg, |direction| self.tag_monitor(direction)),
            KeyAction::ScratchShow => with_int(&arg, |key| self.scratch_show(key)),
            KeyAction::ScratchHide => with_int(&arg, |key| self.scratch_hide(key)),
            KeyAction::ScratchToggle => with_int(&arg, |key| self.scratch_toggle(key)),
            KeyAction::ScratchClaim => with_int(&arg, |key| self.scratch_claim(key)),
            KeyAction::ScratchRelease => self.scratch_release(),
            KeyAction::HideClient => self.hide_client(),
            KeyAction::ShowAllHidden => self.show_all_hidden(),
            KeyAction::MoveMouse => self.move_mouse(),
            KeyAction::ResizeMouse => self.resize_mouse(),
            KeyAction::None => Ok(()),
        }
    }

    /// Re-arranges the selected monitor when it has a selection, otherwise
    /// only its bar needs repainting.
    fn refresh_selected_monitor(&mut self) -> WmResult<()> {
        let index = self.selected_monitor;
        if self.selected_client().is_some() {
            self.arrange(Some(index))
        } else {
            self.draw_bar(index)
        }
    }

    fn toggle_bar(&mut self) -> WmResult<()> {
        let index = self.selected_monitor;
        let monitor = self.selmon_mut();
        monitor.show_bar = !monitor.show_bar;
        self.update_bar_position(index)?;
        self.update_systray()?;
        self.arrange(Some(index))
    }

    /// Cycles the tab bar mode, or picks `Never`, `Auto` or `Always` by
    /// index.
    fn set_tab_mode(&mut self, index: Option<u32>) -> WmResult<()> {
        let monitor = self.selmon_mut();
        monitor.tab_mode = match index {
            Some(index) => match TAB_MODES.get(index as usize) {
                Some(mode) => *mode,
                None => return Ok(()),
            },
            None => monitor.tab_mode.next(),
        };
        monitor.store_tag_settings();
        self.arrange(Some(self.selected_monitor))
    }

    /// Swaps to the other layout slot, or installs `layouts[index]` into the
    /// active slot, flipping slots first when it differs from the current
    /// layout.
    fn set_layout(&mut self, index: Option<u32>) -> WmResult<()> {
        let layout = match index {
            Some(index) => match self.config.layouts.get(index as usize) {
                Some(layout) => Some(*layout),
                None => return Ok(()),
            },
            None => None,
        };

        let monitor = self.selmon_mut();
        if layout.is_none_or(|layout| layout != monitor.layout()) {
            monitor.selected_layout_index ^= 1;
        }
        if let Some(layout) = layout {
            monitor.layouts[monitor.selected_layout_index] = layout;
        }
        monitor.layout_symbol = monitor.layout().symbol().to_string();
        monitor.store_tag_settings();

        self.refresh_selected_monitor()
    }

    fn set_attach(&mut self, index: Option<u32>) -> WmResult<()> {
        let policy = match index {
            Some(index) => match self.config.attach_policies.get(index as usize) {
                Some(policy) => Some(*policy),
                None => return Ok(()),
            },
            None => None,
        };

        let monitor = self.selmon_mut();
        if policy.is_none_or(|policy| policy != monitor.attach_policy()) {
            monitor.selected_attach_index ^= 1;
        }
        if let Some(policy) = policy {
            monitor.attach_policies[monitor.selected_attach_index] = policy;
        }
        monitor.store_tag_settings();
        debug!(policy = monitor.attach_policy().symbol(), "attach policy changed");
        Ok(())
    }

    /// Values below 1.0 adjust the factor, larger ones set it to
    /// `factor - 1.0`. Results outside `0.05..=0.95` are dropped.
    fn set_master_factor(&mut self, factor: f32) -> WmResult<()> {
        let monitor = self.selmon_mut();
        if !monitor.layout().is_tiling() {
            return Ok(());
        }
        let factor = if factor < 1.0 {
            monitor.master_factor + factor
        } else {
            factor - 1.0
        };
        if !(0.05..=0.95).contains(&factor) {
            return Ok(());
        }
        monitor.master_factor = factor;
        monitor.store_tag_settings();
        self.arrange(Some(self.selected_monitor))
    }

    fn inc_num_master(&mut self, delta: i32) -> WmResult<()> {
        let monitor = self.selmon_mut();
        monitor.num_master = (monitor.num_master + delta).max(0);
        monitor.store_tag_settings();
        self.arrange(Some(self.selected_monitor))
    }

    /// Grows or shrinks the first master (or stack) slot; zero resets it.
    fn set_extra(&mut self, delta: i32, master: bool) -> WmResult<()> {
        let monitor = self.selmon_mut();
        let extra = if master {
            &mut monitor.master_extra
        } else {
            &mut monitor.stack_extra
        };
        *extra = if delta == 0 { 0 } else { *extra + delta };
        monitor.store_tag_settings();
        self.arrange(Some(self.selected_monitor))
    }

    /// Moves the selected tiled client to the master position, or the next
    /// tiled client when it already is master.
    fn zoom(&mut self) -> WmResult<()> {
        let Some(selected) = self.selected_client() else {
            return Ok(());
        };
        if !self.selmon().layout().is_tiling()
            || self.clients.get(&selected).is_none_or(|client| client.is_floating())
        {
            return Ok(());
        }

        let tiled = self.tiled_clients(self.selected_monitor);
        let target = if tiled.first() == Some(&selected) {
            match tiled.get(1) {
                Some(&next) => next,
                None => return Ok(()),
            }
        } else {
            selected
        };
        self.pop(target)
    }

    fn pop(&mut self, window: Window) -> WmResult<()> {
        let Some(monitor_index) = self.clients.get(&window).map(|client| client.monitor_index) else {
            return Ok(());
        };
        let monitor = &mut self.monitors[monitor_index];
        monitor.clients.retain(|&other| other != window);
        monitor.clients.insert(0, window);
        self.focus(Some(window))?;
        self.arrange(Some(monitor_index))
    }

    fn toggle_fullscreen(&mut self) -> WmResult<()> {
        let Some(window) = self.selected_client() else {
            return Ok(());
        };
        let fullscreen = self.clients.get(&window).is_some_and(|client| client.is_fullscreen);
        self.set_fullscreen(window, !fullscreen)
    }

    fn hide_client(&mut self) -> WmResult<()> {
        let Some(window) = self.selected_client() else {
            return Ok(());
        };
        if let Some(client) = self.clients.get_mut(&window) {
            client.is_hidden = true;
        }
        self.conn.set_wm_state(window, WmState::Iconic)?;
        self.focus(None)?;
        self.arrange(Some(self.selected_monitor))
    }

    fn show_all_hidden(&mut self) -> WmResult<()> {
        let windows = self.selmon().clients.clone();
        for window in windows {
            let Some(client) = self.clients.get_mut(&window) else {
                continue;
            };
            if client.is_hidden {
                client.is_hidden = false;
                self.conn.set_wm_state(window, WmState::Normal)?;
            }
        }
        self.focus(None)?;
        self.arrange(Some(self.selected_monitor))
    }
}

fn with_int<F>(arg: &Arg, action: F) -> WmResult<()>
where
    F: FnOnce(i32) -> WmResult<()>,
{
    arg.as_int().map_or(Ok(()), action)
}

fn with_mask<F>(arg: &Arg, action: F) -> WmResult<()>
where
    F: FnOnce(u32) -> WmResult<()>,
{
    arg.as_uint().map_or(Ok(()), action)
}
