//! An in-memory [`XConn`] that records what the window manager asked for.
use super::{
    ConfigureRequest, CursorKind, Protocol, WindowAttributes, WindowType, WmHints, WmState, XConn,
    XEvent,
};
use crate::bar::BarSegment;
use crate::errors::{WmError, WmResult};
use crate::keyboard::{ButtonBinding, KeyBinding};
use crate::layout::WindowGeometry;
use crate::size_hints::SizeHints;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use x11rb::protocol::xproto::Window;

pub const CHAR_WIDTH: i32 = 8;
pub const FONT_HEIGHT: i32 = 16;

#[derive(Debug, Clone, Default)]
pub struct MockWindow {
    pub title: String,
    pub instance: String,
    pub class: String,
    pub geometry: WindowGeometry,
    pub border_width: i32,
    pub transient_for: Option<Window>,
    pub size_hints: Option<SizeHints>,
    pub wm_hints: Option<WmHints>,
    pub window_type: WindowType,
    pub protocols: Vec<Protocol>,
    pub override_redirect: bool,
    pub viewable: bool,
    pub wm_state: Option<WmState>,
    pub xembed_flags: Option<u32>,
}

impl MockWindow {
    pub fn new(instance: &str, class: &str) -> Self {
        Self {
            title: format!("{instance} window"),
            instance: instance.to_string(),
            class: class.to_string(),
            geometry: WindowGeometry::new(10, 10, 300, 200),
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct MockState {
    pub outputs: Vec<WindowGeometry>,
    pub events: VecDeque<XEvent>,
    pub windows: HashMap<Window, MockWindow>,
    pub mapped: HashSet<Window>,
    pub focused: Option<Window>,
    pub active_window: Option<Window>,
    pub client_list: Vec<Window>,
    pub current_desktop: u32,
    pub desktop_names: Vec<String>,
    pub client_desktops: HashMap<Window, u32>,
    pub fullscreen_states: HashMap<Window, bool>,
    pub border_colors: HashMap<Window, u32>,
    pub stacking: Vec<Window>,
    pub raised: Vec<Window>,
    pub spawned: Vec<Vec<String>>,
    pub killed: Vec<Window>,
    pub protocol_messages: Vec<(Window, Protocol)>,
    pub pointer: (i32, i32),
    pub pointer_grabbed: bool,
    pub root_name: String,
    pub bars: Vec<Window>,
    pub drawn: HashMap<Window, Vec<BarSegment>>,
    pub systray: Option<Window>,
    pub embedded: Vec<Window>,
    pub next_id: Window,
}

/// Window ids handed out by the mock start here so they never collide with
/// ids chosen by tests.
const FIRST_GENERATED_ID: Window = 0x10_0000;

pub struct MockXConn {
    pub state: RefCell<MockState>,
}

impl MockXConn {
    pub fn new(outputs: Vec<WindowGeometry>) -> Self {
        Self {
            state: RefCell::new(MockState {
                outputs,
                next_id: FIRST_GENERATED_ID,
                ..MockState::default()
            }),
        }
    }

    pub fn single(width: i32, height: i32) -> Self {
        Self::new(vec![WindowGeometry::new(0, 0, width, height)])
    }

    pub fn add_window(&self, window: Window, mock: MockWindow) {
        self.state.borrow_mut().windows.insert(window, mock);
    }

    pub fn remove_window(&self, window: Window) {
        let mut state = self.state.borrow_mut();
        state.windows.remove(&window);
        state.mapped.remove(&window);
    }

    pub fn geometry_of(&self, window: Window) -> Option<WindowGeometry> {
        self.state.borrow().windows.get(&window).map(|mock| mock.geometry)
    }

    pub fn border_of(&self, window: Window) -> Option<i32> {
        self.state.borrow().windows.get(&window).map(|mock| mock.border_width)
    }

    pub fn focused(&self) -> Option<Window> {
        self.state.borrow().focused
    }

    pub fn spawned(&self) -> Vec<Vec<String>> {
        self.state.borrow().spawned.clone()
    }

    pub fn is_mapped(&self, window: Window) -> bool {
        self.state.borrow().mapped.contains(&window)
    }

    fn with_window<F>(&self, window: Window, update: F)
    where
        F: FnOnce(&mut MockWindow),
    {
        if let Some(mock) = self.state.borrow_mut().windows.get_mut(&window) {
            update(mock);
        }
    }

    fn read<T, F>(&self, window: Window, read: F) -> Option<T>
    where
        F: FnOnce(&MockWindow) -> T,
    {
        self.state.borrow().windows.get(&window).map(read)
    }
}

impl XConn for MockXConn {
    fn root(&self) -> Window {
        1
    }

    fn outputs(&self) -> WmResult<Vec<WindowGeometry>> {
        Ok(self.state.borrow().outputs.clone())
    }

    fn next_event(&self) -> WmResult<XEvent> {
        self.state.borrow_mut().events.pop_front().ok_or_else(|| {
            WmError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "no more mock events",
            ))
        })
    }

    fn flush(&self) -> WmResult<()> {
        Ok(())
    }

    fn existing_windows(&self) -> WmResult<Vec<Window>> {
        let mut windows: Vec<Window> = self.state.borrow().windows.keys().copied().collect();
        windows.sort_unstable();
        Ok(windows)
    }

    fn window_attributes(&self, window: Window) -> WmResult<Option<WindowAttributes>> {
        Ok(self.read(window, |mock| WindowAttributes {
            override_redirect: mock.override_redirect,
            viewable: mock.viewable,
        }))
    }

    fn window_geometry(&self, window: Window) -> WmResult<Option<(WindowGeometry, i32)>> {
        Ok(self.read(window, |mock| (mock.geometry, mock.border_width)))
    }

    fn wm_state(&self, window: Window) -> WmResult<Option<WmState>> {
        Ok(self.read(window, |mock| mock.wm_state).flatten())
    }

    fn transient_for(&self, window: Window) -> WmResult<Option<Window>> {
        Ok(self.read(window, |mock| mock.transient_for).flatten())
    }

    fn window_title(&self, window: Window) -> WmResult<String> {
        Ok(self.read(window, |mock| mock.title.clone()).unwrap_or_default())
    }

    fn window_class(&self, window: Window) -> WmResult<(String, String)> {
        Ok(self
            .read(window, |mock| (mock.instance.clone(), mock.class.clone()))
            .unwrap_or_default())
    }

    fn size_hints(&self, window: Window) -> WmResult<Option<SizeHints>> {
        Ok(self.read(window, |mock| mock.size_hints).flatten())
    }

    fn wm_hints(&self, window: Window) -> WmResult<Option<WmHints>> {
        Ok(self.read(window, |mock| mock.wm_hints).flatten())
    }

    fn set_urgency_hint(&self, window: Window, urgent: bool) -> WmResult<()> {
        self.with_window(window, |mock| {
            if let Some(hints) = mock.wm_hints.as_mut() {
                hints.urgent = urgent;
            }
        });
        Ok(())
    }

    fn window_type(&self, window: Window) -> WmResult<WindowType> {
        Ok(self.read(window, |mock| mock.window_type).unwrap_or_default())
    }

    fn supports_protocol(&self, window: Window, protocol: Protocol) -> WmResult<bool> {
        Ok(self
            .read(window, |mock| mock.protocols.contains(&protocol))
            .unwrap_or(false))
    }

    fn send_protocol(&self, window: Window, protocol: Protocol) -> WmResult<()> {
        self.state.borrow_mut().protocol_messages.push((window, protocol));
        Ok(())
    }

    fn root_name(&self) -> WmResult<String> {
        Ok(self.state.borrow().root_name.clone())
    }

    fn configure_client(&self, window: Window, geometry: WindowGeometry, border_width: i32) -> WmResult<()> {
        self.with_window(window, |mock| {
            mock.geometry = geometry;
            mock.border_width = border_width;
        });
        Ok(())
    }

    fn send_configure_notify(&self, _window: Window, _geometry: WindowGeometry, _border_width: i32) -> WmResult<()> {
        Ok(())
    }

    fn forward_configure_request(&self, request: &ConfigureRequest) -> WmResult<()> {
        self.with_window(request.window, |mock| {
            let geometry = &mut mock.geometry;
            geometry.x_coordinate = request.x.unwrap_or(geometry.x_coordinate);
            geometry.y_coordinate = request.y.unwrap_or(geometry.y_coordinate);
            geometry.width = request.width.unwrap_or(geometry.width);
            geometry.height = request.height.unwrap_or(geometry.height);
        });
        Ok(())
    }

    fn move_window(&self, window: Window, x: i32, y: i32) -> WmResult<()> {
        self.with_window(window, |mock| {
            mock.geometry.x_coordinate = x;
            mock.geometry.y_coordinate = y;
        });
        Ok(())
    }

    fn move_resize_window(&self, window: Window, geometry: WindowGeometry) -> WmResult<()> {
        self.with_window(window, |mock| mock.geometry = geometry);
        Ok(())
    }

    fn set_border_width(&self, window: Window, width: i32) -> WmResult<()> {
        self.with_window(window, |mock| mock.border_width = width);
        Ok(())
    }

    fn set_border_color(&self, window: Window, color: u32) -> WmResult<()> {
        self.state.borrow_mut().border_colors.insert(window, color);
        Ok(())
    }

    fn map(&self, window: Window) -> WmResult<()> {
        self.state.borrow_mut().mapped.insert(window);
        self.with_window(window, |mock| mock.viewable = true);
        Ok(())
    }

    fn unmap(&self, window: Window) -> WmResult<()> {
        self.state.borrow_mut().mapped.remove(&window);
        self.with_window(window, |mock| mock.viewable = false);
        Ok(())
    }

    fn raise(&self, window: Window) -> WmResult<()> {
        self.state.borrow_mut().raised.push(window);
        Ok(())
    }

    fn restack(&self, windows: &[Window]) -> WmResult<()> {
        self.state.borrow_mut().stacking = windows.to_vec();
        Ok(())
    }

    fn kill_client(&self, window: Window) -> WmResult<()> {
        self.state.borrow_mut().killed.push(window);
        Ok(())
    }

    fn set_input_focus(&self, window: Option<Window>) -> WmResult<()> {
        self.state.borrow_mut().focused = window;
        Ok(())
    }

    fn select_client_input(&self, _window: Window) -> WmResult<()> {
        Ok(())
    }

    fn set_wm_state(&self, window: Window, state: WmState) -> WmResult<()> {
        self.with_window(window, |mock| mock.wm_state = Some(state));
        Ok(())
    }

    fn grab_keys(&self, _bindings: &[KeyBinding]) -> WmResult<()> {
        Ok(())
    }

    fn grab_buttons(&self, _window: Window, _focused: bool, _buttons: &[ButtonBinding]) -> WmResult<()> {
        Ok(())
    }

    fn grab_pointer(&self, _cursor: CursorKind) -> WmResult<bool> {
        self.state.borrow_mut().pointer_grabbed = true;
        Ok(true)
    }

    fn ungrab_pointer(&self) -> WmResult<()> {
        self.state.borrow_mut().pointer_grabbed = false;
        Ok(())
    }

    fn query_pointer(&self) -> WmResult<(i32, i32)> {
        Ok(self.state.borrow().pointer)
    }

    fn warp_pointer(&self, window: Window, x: i32, y: i32) -> WmResult<()> {
        let origin = self
            .read(window, |mock| (mock.geometry.x_coordinate, mock.geometry.y_coordinate))
            .unwrap_or((0, 0));
        self.state.borrow_mut().pointer = (origin.0 + x, origin.1 + y);
        Ok(())
    }

    fn set_client_list(&self, windows: &[Window]) -> WmResult<()> {
        self.state.borrow_mut().client_list = windows.to_vec();
        Ok(())
    }

    fn set_active_window(&self, window: Option<Window>) -> WmResult<()> {
        self.state.borrow_mut().active_window = window;
        Ok(())
    }

    fn set_current_desktop(&self, desktop: u32) -> WmResult<()> {
        self.state.borrow_mut().current_desktop = desktop;
        Ok(())
    }

    fn set_desktop_names(&self, names: &[String]) -> WmResult<()> {
        self.state.borrow_mut().desktop_names = names.to_vec();
        Ok(())
    }

    fn set_client_desktop(&self, window: Window, desktop: u32) -> WmResult<()> {
        self.state.borrow_mut().client_desktops.insert(window, desktop);
        Ok(())
    }

    fn set_fullscreen_state(&self, window: Window, fullscreen: bool) -> WmResult<()> {
        self.state.borrow_mut().fullscreen_states.insert(window, fullscreen);
        Ok(())
    }

    fn create_bar(&self, geometry: WindowGeometry) -> WmResult<Window> {
        let mut state = self.state.borrow_mut();
        let window = state.next_id;
        state.next_id += 1;
        state.bars.push(window);
        state.mapped.insert(window);
        state.windows.insert(
            window,
            MockWindow {
                geometry,
                override_redirect: true,
                viewable: true,
                ..MockWindow::default()
            },
        );
        Ok(window)
    }

    fn destroy_window(&self, window: Window) -> WmResult<()> {
        let mut state = self.state.borrow_mut();
        state.bars.retain(|&bar| bar != window);
        state.windows.remove(&window);
        state.mapped.remove(&window);
        state.drawn.remove(&window);
        Ok(())
    }

    fn text_width(&self, text: &str) -> i32 {
        text.chars().count() as i32 * CHAR_WIDTH
    }

    fn font_height(&self) -> i32 {
        FONT_HEIGHT
    }

    fn draw_segments(&self, window: Window, _width: i32, _height: i32, segments: &[BarSegment]) -> WmResult<()> {
        self.state.borrow_mut().drawn.insert(window, segments.to_vec());
        Ok(())
    }

    fn create_systray(&self, _background: u32) -> WmResult<Option<Window>> {
        let mut state = self.state.borrow_mut();
        let window = state.next_id;
        state.next_id += 1;
        state.systray = Some(window);
        state.windows.insert(
            window,
            MockWindow {
                geometry: WindowGeometry::new(0, 0, 1, 1),
                override_redirect: true,
                ..MockWindow::default()
            },
        );
        Ok(Some(window))
    }

    fn embed_icon(&self, _tray: Window, icon: Window) -> WmResult<Option<(i32, i32)>> {
        let size = self.read(icon, |mock| (mock.geometry.width, mock.geometry.height));
        if size.is_some() {
            self.state.borrow_mut().embedded.push(icon);
        }
        Ok(size)
    }

    fn xembed_flags(&self, icon: Window) -> WmResult<Option<u32>> {
        Ok(self.read(icon, |mock| mock.xembed_flags).flatten())
    }

    fn spawn(&self, argv: &[String]) {
        self.state.borrow_mut().spawned.push(argv.to_vec());
    }
}
