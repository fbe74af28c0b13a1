use super::WindowManager;
use crate::client::FloatState;
use crate::errors::WmResult;
use crate::layout::WindowGeometry;
use crate::x::{CursorKind, XConn, XEvent};
use tracing::debug;
use x11rb::protocol::xproto::Window;

/// Motion events closer together than this are dropped while dragging.
pub const MOTION_INTERVAL_MS: u32 = 1000 / 60;

/// An interactive move or resize in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Moving {
        window: Window,
        pointer_origin: (i32, i32),
        geometry_origin: WindowGeometry,
        last_motion: u32,
    },
    Resizing {
        window: Window,
        geometry_origin: WindowGeometry,
        last_motion: u32,
    },
}

impl DragState {
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    fn window(&self) -> Option<Window> {
        match self {
            Self::Idle => None,
            Self::Moving { window, .. } | Self::Resizing { window, .. } => Some(*window),
        }
    }

    /// Records `time` as the latest handled motion unless it is too soon
    /// after the previous one.
    fn accept_motion(&mut self, time: u32) -> bool {
        let last = match self {
            Self::Idle => return false,
            Self::Moving { last_motion, .. } | Self::Resizing { last_motion, .. } => last_motion,
        };
        if time.wrapping_sub(*last) <= MOTION_INTERVAL_MS {
            return false;
        }
        *last = time;
        true
    }
}

impl<X: XConn> WindowManager<X> {
    pub(super) fn move_mouse(&mut self) -> WmResult<()> {
        let Some(window) = self.selected_client() else {
            return Ok(());
        };
        let Some(client) = self.clients.get(&window) else {
            return Ok(());
        };
        if client.is_fullscreen {
            return Ok(());
        }
        let geometry_origin = client.geometry;

        self.restack(self.selected_monitor)?;
        if !self.conn.grab_pointer(CursorKind::Move)? {
            return Ok(());
        }
        let pointer_origin = self.conn.query_pointer()?;

        self.drag = DragState::Moving {
            window,
            pointer_origin,
            geometry_origin,
            last_motion: 0,
        };
        debug!(window, "started interactive move");
        Ok(())
    }

    pub(super) fn resize_mouse(&mut self) -> WmResult<()> {
        let Some(window) = self.selected_client() else {
            return Ok(());
        };
        let Some(client) = self.clients.get(&window) else {
            return Ok(());
        };
        if client.is_fullscreen {
            return Ok(());
        }
        let geometry_origin = client.geometry;
        let border_width = client.border_width;

        self.restack(self.selected_monitor)?;
        if !self.conn.grab_pointer(CursorKind::Resize)? {
            return Ok(());
        }
        self.conn.warp_pointer(
            window,
            geometry_origin.width + border_width - 1,
            geometry_origin.height + border_width - 1,
        )?;

        self.drag = DragState::Resizing {
            window,
            geometry_origin,
            last_motion: 0,
        };
        debug!(window, "started interactive resize");
        Ok(())
    }

    /// Event routing while a drag is active.
    pub(super) fn handle_drag_event(&mut self, event: XEvent) -> WmResult<()> {
        match event {
            XEvent::ConfigureRequest(_) | XEvent::Expose { .. } | XEvent::MapRequest(_) => {
                self.dispatch(event)
            }
            XEvent::MotionNotify {
                root_x,
                root_y,
                time,
                ..
            } => {
                if !self.drag.accept_motion(time) {
                    return Ok(());
                }
                match self.drag {
                    DragState::Moving {
                        window,
                        pointer_origin,
                        geometry_origin,
                        ..
                    } => self.drag_move(window, pointer_origin, geometry_origin, root_x, root_y),
                    DragState::Resizing {
                        window,
                        geometry_origin,
                        ..
                    } => self.drag_resize(window, geometry_origin, root_x, root_y),
                    DragState::Idle => Ok(()),
                }
            }
            XEvent::ButtonRelease => self.finish_drag(),
            other => {
                self.deferred.push_back(other);
                Ok(())
            }
        }
    }

    fn drag_move(
        &mut self,
        window: Window,
        pointer_origin: (i32, i32),
        geometry_origin: WindowGeometry,
        root_x: i32,
        root_y: i32,
    ) -> WmResult<()> {
        let Some(client) = self.clients.get(&window) else {
            return Ok(());
        };
        let area = self.selmon().window_area;
        let snap = self.config.snap;
        let width = client.width_with_border();
        let height = client.height_with_border();

        let mut x = geometry_origin.x_coordinate + (root_x - pointer_origin.0);
        let mut y = geometry_origin.y_coordinate + (root_y - pointer_origin.1);

        if (area.x_coordinate - x).abs() < snap {
            x = area.x_coordinate;
        } else if (area.right() - (x + width)).abs() < snap {
            x = area.right() - width;
        }
        if (area.y_coordinate - y).abs() < snap {
            y = area.y_coordinate;
        } else if (area.bottom() - (y + height)).abs() < snap {
            y = area.bottom() - height;
        }

        let current = client.geometry;
        let tiling = self.selmon().layout().is_tiling();
        if !client.is_floating()
            && tiling
            && ((x - current.x_coordinate).abs() > snap || (y - current.y_coordinate).abs() > snap)
        {
            self.toggle_floating()?;
        }

        if !tiling || self.clients.get(&window).is_some_and(|client| client.is_floating()) {
            self.resize(
                window,
                WindowGeometry::new(x, y, current.width, current.height),
                true,
            )?;
        }
        Ok(())
    }

    fn drag_resize(&mut self, window: Window, geometry_origin: WindowGeometry, root_x: i32, root_y: i32) -> WmResult<()> {
        let Some(client) = self.clients.get(&window) else {
            return Ok(());
        };
        let border_width = client.border_width;
        let width = (root_x - geometry_origin.x_coordinate - 2 * border_width + 1).max(1);
        let height = (root_y - geometry_origin.y_coordinate - 2 * border_width + 1).max(1);

        let own_area = self.monitors[client.monitor_index].window_area;
        let area = self.selmon().window_area;
        let within = own_area.x_coordinate + width >= area.x_coordinate
            && own_area.x_coordinate + width <= area.right()
            && own_area.y_coordinate + height >= area.y_coordinate
            && own_area.y_coordinate + height <= area.bottom();

        let current = client.geometry;
        let tiling = self.selmon().layout().is_tiling();
        if within
            && !client.is_floating()
            && tiling
            && ((width - current.width).abs() > self.config.snap || (height - current.height).abs() > self.config.snap)
        {
            self.toggle_floating()?;
        }

        if !tiling || self.clients.get(&window).is_some_and(|client| client.is_floating()) {
            self.resize(
                window,
                WindowGeometry::new(current.x_coordinate, current.y_coordinate, width, height),
                true,
            )?;
        }
        Ok(())
    }

    /// Ends the drag: hands the client to the monitor it now mostly covers
    /// and replays the events that arrived meanwhile.
    fn finish_drag(&mut self) -> WmResult<()> {
        let drag = std::mem::replace(&mut self.drag, DragState::Idle);

        if let DragState::Resizing { window, .. } = drag
            && let Some(client) = self.clients.get(&window)
        {
            self.conn.warp_pointer(
                window,
                client.geometry.width + client.border_width - 1,
                client.geometry.height + client.border_width - 1,
            )?;
            self.deferred
                .retain(|event| !matches!(event, XEvent::EnterNotify { .. }));
        }
        self.conn.ungrab_pointer()?;

        if let Some(window) = drag.window()
            && let Some(client) = self.clients.get(&window)
        {
            let target = self.rect_to_monitor(client.geometry);
            if target != self.selected_monitor {
                self.send_to_monitor(window, target)?;
                self.selected_monitor = target;
                self.focus(None)?;
            }
        }
        debug!("finished drag");

        while !self.drag.is_active() {
            let Some(event) = self.deferred.pop_front() else {
                break;
            };
            self.handle_event(event)?;
        }
        Ok(())
    }

    pub(super) fn toggle_floating(&mut self) -> WmResult<()> {
        let Some(window) = self.selected_client() else {
            return Ok(());
        };
        let Some(client) = self.clients.get_mut(&window) else {
            return Ok(());
        };
        if client.is_fullscreen {
            return Ok(());
        }

        client.float_state = match client.float_state {
            FloatState::Tiled => FloatState::Floating,
            FloatState::Floating | FloatState::AutoFloating => FloatState::Tiled,
        };
        if client.is_floating() {
            let restored = client.float_geometry;
            self.resize(window, restored, false)?;
        } else {
            client.float_geometry = client.geometry;
        }
        self.arrange(Some(self.selected_monitor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motion_is_throttled_to_sixty_hertz() {
        let mut drag = DragState::Resizing {
            window: 1,
            geometry_origin: WindowGeometry::default(),
            last_motion: 0,
        };

        assert!(drag.accept_motion(100));
        assert!(!drag.accept_motion(100 + MOTION_INTERVAL_MS));
        assert!(drag.accept_motion(101 + MOTION_INTERVAL_MS));
    }

    #[test]
    fn idle_accepts_nothing() {
        let mut drag = DragState::Idle;
        assert!(!drag.accept_motion(1000));
        assert!(!drag.is_active());
    }
}
