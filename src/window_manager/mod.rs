//! The window manager core: client bookkeeping, tags, layouts and event
//! handling, driven through an [`XConn`].

mod actions;
mod arrange;
mod clients;
mod drawing;
mod events;
mod focus;
mod monitors;
mod mouse;
mod scratchpad;
mod tags;
mod tray;

#[cfg(test)]
mod tests;

pub use mouse::{DragState, MOTION_INTERVAL_MS};

use crate::Config;
use crate::bar::BarSegment;
use crate::client::{Client, TagMask};
use crate::errors::WmResult;
use crate::layout::WindowGeometry;
use crate::monitor::Monitor;
use crate::status::StatusSegment;
use crate::systray::Systray;
use crate::x::XConn;
use crate::x::XEvent;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info};
use x11rb::protocol::xproto::Window;

pub struct WindowManager<X: XConn> {
    conn: X,
    config: Config,
    clients: HashMap<Window, Client>,
    monitors: Vec<Monitor>,
    selected_monitor: usize,
    /// Bounding box of every output.
    screen: WindowGeometry,
    bar_height: i32,
    tab_height: i32,
    /// Horizontal padding around bar text, one font height.
    text_padding: i32,
    status: Vec<StatusSegment>,
    systray: Option<Systray>,
    /// Last painted segments per bar or tab window, used to resolve clicks.
    bar_segments: HashMap<Window, Vec<BarSegment>>,
    /// Monitor the pointer was last seen on while moving over the root.
    motion_monitor: Option<usize>,
    drag: DragState,
    deferred: VecDeque<XEvent>,
    running: bool,
    restart: bool,
}

impl<X: XConn> WindowManager<X> {
    pub fn new(conn: X, config: Config) -> WmResult<Self> {
        config.validate()?;

        let font_height = conn.font_height();
        let bar_height = (font_height as f32 * 1.5) as i32;

        let mut wm = Self {
            conn,
            config,
            clients: HashMap::new(),
            monitors: Vec::new(),
            selected_monitor: 0,
            screen: WindowGeometry::default(),
            bar_height,
            tab_height: bar_height,
            text_padding: font_height,
            status: Vec::new(),
            systray: None,
            bar_segments: HashMap::new(),
            motion_monitor: None,
            drag: DragState::Idle,
            deferred: VecDeque::new(),
            running: true,
            restart: false,
        };

        wm.update_geometry()?;
        wm.update_bars()?;
        wm.update_systray()?;
        wm.update_status()?;
        wm.conn.set_desktop_names(&wm.config.tags)?;
        wm.update_current_desktop()?;
        wm.conn.grab_keys(&wm.config.keybindings)?;
        wm.focus(None)?;

        info!(
            monitors = wm.monitors.len(),
            tags = wm.config.tags.len(),
            "window manager initialised"
        );
        Ok(wm)
    }

    /// Adopts existing windows, runs autostart commands and processes events
    /// until `Quit` or `Restart`. Returns whether a restart was requested.
    pub fn run(&mut self) -> WmResult<bool> {
        self.scan()?;
        for command in &self.config.autostart {
            self.conn.spawn(command);
        }
        self.conn.flush()?;

        while self.running {
            let event = self.conn.next_event()?;
            self.handle_event(event)?;
            self.conn.flush()?;
        }

        self.cleanup()?;
        Ok(self.restart)
    }

    /// Routes one event. During a drag only configure requests, exposes and
    /// map requests are handled right away; the rest wait for the release.
    pub fn handle_event(&mut self, event: XEvent) -> WmResult<()> {
        if self.drag.is_active() {
            return self.handle_drag_event(event);
        }
        self.dispatch(event)
    }

    fn cleanup(&mut self) -> WmResult<()> {
        let all_tags = self.config.tag_mask();
        for monitor in &mut self.monitors {
            monitor.tagset[monitor.selected_tags_index] = all_tags;
        }
        let windows: Vec<Window> = self
            .monitors
            .iter()
            .flat_map(|monitor| monitor.stack.iter().copied())
            .collect();
        for window in windows {
            self.unmanage(window, false)?;
        }

        for monitor in &self.monitors {
            for window in [monitor.bar_window, monitor.tab_window].into_iter().flatten() {
                self.conn.destroy_window(window)?;
            }
        }
        if let Some(systray) = self.systray.take() {
            for icon in &systray.icons {
                self.conn.unmap(icon.window)?;
            }
            self.conn.destroy_window(systray.window)?;
        }

        self.conn.set_input_focus(None)?;
        self.conn.set_active_window(None)?;
        self.conn.flush()?;
        debug!("cleaned up");
        Ok(())
    }

    fn selmon(&self) -> &Monitor {
        &self.monitors[self.selected_monitor]
    }

    fn selmon_mut(&mut self) -> &mut Monitor {
        &mut self.monitors[self.selected_monitor]
    }

    fn selected_client(&self) -> Option<Window> {
        self.selmon().selected_client
    }

    fn is_visible(&self, window: Window) -> bool {
        self.clients.get(&window).is_some_and(|client| {
            self.monitors
                .get(client.monitor_index)
                .is_some_and(|monitor| client.is_visible_on(monitor.selected_tags()))
        })
    }

    fn is_tiled_visible(&self, window: Window) -> bool {
        self.is_visible(window) && self.clients.get(&window).is_some_and(|client| !client.is_floating())
    }

    /// Visible tiled clients of a monitor in list order.
    fn tiled_clients(&self, monitor_index: usize) -> Vec<Window> {
        let monitor = &self.monitors[monitor_index];
        let tagset = monitor.selected_tags();
        monitor
            .clients
            .iter()
            .copied()
            .filter(|window| {
                self.clients
                    .get(window)
                    .is_some_and(|client| client.is_tiled_on(tagset))
            })
            .collect()
    }

    fn all_tags(&self) -> TagMask {
        self.config.tag_mask()
    }

    fn notify(&self, message: &str) {
        if self.config.notify_command.is_empty() {
            return;
        }
        let mut command = self.config.notify_command.clone();
        command.push(message.to_string());
        self.conn.spawn(&command);
    }
}
