use super::atoms::AtomCache;
use super::{
    ClientMessageKind, ConfigureRequest, CursorKind, Property, Protocol, StateAction,
    WindowAttributes, WindowType, WmHints, WmState, XConn, XEvent,
};
use crate::bar::{BarPainter, BarSegment};
use crate::bar::ClickRegion;
use crate::errors::{WmResult, X11Error, is_ignorable_error, is_vanished_window};
use crate::keyboard::keysyms::Keysym;
use crate::keyboard::{ButtonBinding, KeyBinding};
use crate::layout::WindowGeometry;
use crate::size_hints::SizeHints;
use crate::systray::{SYSTEM_TRAY_REQUEST_DOCK, XEMBED_EMBEDDED_NOTIFY, XEMBED_EMBEDDED_VERSION};
use std::cell::RefCell;
use tracing::{debug, error};
use x11rb::COPY_DEPTH_FROM_PARENT;
use x11rb::CURRENT_TIME;
use x11rb::NONE;
use x11rb::connection::Connection;
use x11rb::cursor::Handle as CursorHandle;
use x11rb::errors::ReplyError;
use x11rb::protocol::ErrorKind;
use x11rb::protocol::Event;
use x11rb::protocol::xinerama::ConnectionExt as _;
use x11rb::protocol::xproto::{
    self, Allow, AtomEnum, ButtonIndex, ChangeWindowAttributesAux, ClientMessageEvent, CloseDown,
    ConfigWindow, ConfigureNotifyEvent, ConfigureWindowAux, ConnectionExt as _, CreateWindowAux,
    Cursor, EventMask, GrabMode, GrabStatus, InputFocus, MapState, ModMask, NotifyDetail,
    NotifyMode, PropMode, Screen, SetMode, StackMode, Window, WindowClass,
};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

fn root_event_mask() -> EventMask {
    EventMask::SUBSTRUCTURE_REDIRECT
        | EventMask::SUBSTRUCTURE_NOTIFY
        | EventMask::BUTTON_PRESS
        | EventMask::POINTER_MOTION
        | EventMask::ENTER_WINDOW
        | EventMask::LEAVE_WINDOW
        | EventMask::STRUCTURE_NOTIFY
        | EventMask::PROPERTY_CHANGE
}

fn client_event_mask() -> EventMask {
    EventMask::ENTER_WINDOW | EventMask::FOCUS_CHANGE | EventMask::PROPERTY_CHANGE | EventMask::STRUCTURE_NOTIFY
}

fn button_mask() -> EventMask {
    EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE
}

const WM_HINTS_INPUT: u32 = 1 << 0;
const WM_HINTS_URGENCY: u32 = 1 << 8;

/// Grabs are repeated with caps lock and num lock so bindings work with
/// either latched.
fn ignored_modifiers() -> [u16; 4] {
    let lock = u16::from(ModMask::LOCK);
    let num_lock = u16::from(ModMask::M2);
    [0, lock, num_lock, lock | num_lock]
}

fn absent_if_vanished<T>(result: Result<T, ReplyError>) -> WmResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(error) if is_vanished_window(&error) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

struct Cursors {
    normal: Cursor,
    moving: Cursor,
    resizing: Cursor,
}

struct KeyboardMapping {
    min_keycode: u8,
    keysyms_per_keycode: u8,
    keysyms: Vec<Keysym>,
}

impl KeyboardMapping {
    fn load(connection: &RustConnection) -> WmResult<Self> {
        let setup = connection.setup();
        let min_keycode = setup.min_keycode;
        let count = setup.max_keycode - min_keycode + 1;
        let reply = connection.get_keyboard_mapping(min_keycode, count)?.reply()?;

        Ok(Self {
            min_keycode,
            keysyms_per_keycode: reply.keysyms_per_keycode,
            keysyms: reply.keysyms,
        })
    }

    fn keysym(&self, keycode: u8) -> Keysym {
        let per = self.keysyms_per_keycode as usize;
        let index = keycode.saturating_sub(self.min_keycode) as usize * per;
        self.keysyms.get(index).copied().unwrap_or(0)
    }

    fn keycodes(&self, keysym: Keysym) -> Vec<u8> {
        let per = (self.keysyms_per_keycode as usize).max(1);
        self.keysyms
            .chunks(per)
            .enumerate()
            .filter(|(_, syms)| syms.first() == Some(&keysym))
            .map(|(offset, _)| self.min_keycode + offset as u8)
            .collect()
    }
}

/// Production connection: x11rb for the protocol, Xft for text.
pub struct X11rbConn {
    connection: RustConnection,
    screen: Screen,
    root: Window,
    atoms: AtomCache,
    check_window: Window,
    cursors: Cursors,
    painter: RefCell<BarPainter>,
    keyboard: RefCell<KeyboardMapping>,
}

impl X11rbConn {
    /// Connects to `$DISPLAY`, takes substructure redirection on the root
    /// window and publishes the EWMH support properties.
    pub fn new(font: &str) -> WmResult<Self> {
        let (connection, screen_number) = x11rb::connect(None)?;
        let screen = connection.setup().roots[screen_number].clone();
        let root = screen.root;

        let atoms = AtomCache::new(&connection)?.reply()?;

        let resource_database = x11rb::resource_manager::new_from_default(&connection)?;
        let cursor_handle = CursorHandle::new(&connection, screen_number, &resource_database)?.reply()?;
        let cursors = Cursors {
            normal: cursor_handle.load_cursor(&connection, "left_ptr")?,
            moving: cursor_handle.load_cursor(&connection, "fleur")?,
            resizing: cursor_handle.load_cursor(&connection, "sizing")?,
        };

        let redirect = connection
            .change_window_attributes(
                root,
                &ChangeWindowAttributesAux::new()
                    .event_mask(root_event_mask())
                    .cursor(cursors.normal),
            )?
            .check();
        match redirect {
            Ok(()) => {}
            Err(ReplyError::X11Error(error)) if error.error_kind == ErrorKind::Access => {
                return Err(X11Error::OtherWmRunning.into());
            }
            Err(error) => return Err(error.into()),
        }

        let check_window = connection.generate_id()?;
        connection.create_window(
            COPY_DEPTH_FROM_PARENT,
            check_window,
            root,
            0,
            0,
            1,
            1,
            0,
            WindowClass::INPUT_OUTPUT,
            screen.root_visual,
            &CreateWindowAux::new(),
        )?;
        for window in [check_window, root] {
            connection.change_property32(
                PropMode::REPLACE,
                window,
                atoms._NET_SUPPORTING_WM_CHECK,
                AtomEnum::WINDOW,
                &[check_window],
            )?;
        }
        connection.change_property8(
            PropMode::REPLACE,
            check_window,
            atoms._NET_WM_NAME,
            atoms.UTF8_STRING,
            b"tagwm",
        )?;
        connection.change_property32(
            PropMode::REPLACE,
            root,
            atoms._NET_SUPPORTED,
            AtomEnum::ATOM,
            &atoms.supported(),
        )?;
        connection.delete_property(root, atoms._NET_CLIENT_LIST)?;

        let painter = BarPainter::new(&connection, &screen, screen_number, font)?;
        let keyboard = KeyboardMapping::load(&connection)?;
        connection.flush()?;

        Ok(Self {
            connection,
            screen,
            root,
            atoms,
            check_window,
            cursors,
            painter: RefCell::new(painter),
            keyboard: RefCell::new(keyboard),
        })
    }

    fn property32(&self, window: Window, property: u32, kind: u32, length: u32) -> WmResult<Vec<u32>> {
        let reply = absent_if_vanished(
            self.connection
                .get_property(false, window, property, kind, 0, length)?
                .reply(),
        )?;
        Ok(reply
            .and_then(|reply| reply.value32().map(|values| values.collect()))
            .unwrap_or_default())
    }

    fn text_property(&self, window: Window, property: u32, kind: u32) -> WmResult<Option<String>> {
        let reply = absent_if_vanished(
            self.connection
                .get_property(false, window, property, kind, 0, u32::MAX)?
                .reply(),
        )?;
        Ok(reply
            .filter(|reply| !reply.value.is_empty())
            .map(|reply| String::from_utf8_lossy(&reply.value).into_owned()))
    }

    fn protocol_atom(&self, protocol: Protocol) -> u32 {
        match protocol {
            Protocol::DeleteWindow => self.atoms.WM_DELETE_WINDOW,
            Protocol::TakeFocus => self.atoms.WM_TAKE_FOCUS,
        }
    }

    fn send_message(&self, window: Window, message_type: u32, data: [u32; 5], mask: EventMask) -> WmResult<()> {
        let event = ClientMessageEvent::new(32, window, message_type, data);
        self.connection.send_event(false, window, mask, event)?;
        Ok(())
    }

    fn property_kind(&self, atom: u32) -> Property {
        let atoms = &self.atoms;
        if atom == u32::from(AtomEnum::WM_NAME) || atom == atoms._NET_WM_NAME {
            Property::Name
        } else if atom == u32::from(AtomEnum::WM_TRANSIENT_FOR) {
            Property::TransientFor
        } else if atom == u32::from(AtomEnum::WM_NORMAL_HINTS) {
            Property::NormalHints
        } else if atom == u32::from(AtomEnum::WM_HINTS) {
            Property::Hints
        } else if atom == atoms._NET_WM_WINDOW_TYPE {
            Property::WindowType
        } else if atom == atoms._XEMBED_INFO {
            Property::XembedInfo
        } else {
            Property::Other
        }
    }

    fn client_message_kind(&self, event: &ClientMessageEvent) -> ClientMessageKind {
        let data = event.data.as_data32();
        let atoms = &self.atoms;

        if event.type_ == atoms._NET_WM_STATE {
            let names_fullscreen =
                data[1] == atoms._NET_WM_STATE_FULLSCREEN || data[2] == atoms._NET_WM_STATE_FULLSCREEN;
            match StateAction::from_u32(data[0]) {
                Some(action) if names_fullscreen => ClientMessageKind::Fullscreen(action),
                _ => ClientMessageKind::Other,
            }
        } else if event.type_ == atoms._NET_ACTIVE_WINDOW {
            ClientMessageKind::ActiveWindow
        } else if event.type_ == atoms._NET_SYSTEM_TRAY_OPCODE && data[1] == SYSTEM_TRAY_REQUEST_DOCK {
            ClientMessageKind::DockRequest(data[2])
        } else {
            ClientMessageKind::Other
        }
    }

    fn translate(&self, event: Event) -> WmResult<Option<XEvent>> {
        let translated = match event {
            Event::MapRequest(event) => XEvent::MapRequest(event.window),
            Event::UnmapNotify(event) => XEvent::UnmapNotify {
                window: event.window,
                synthetic: event.response_type & 0x80 != 0,
            },
            Event::DestroyNotify(event) => XEvent::DestroyNotify(event.window),
            Event::ConfigureRequest(event) => {
                let mask = event.value_mask;
                let has = |flag: ConfigWindow| mask.contains(flag);
                XEvent::ConfigureRequest(ConfigureRequest {
                    window: event.window,
                    x: has(ConfigWindow::X).then_some(i32::from(event.x)),
                    y: has(ConfigWindow::Y).then_some(i32::from(event.y)),
                    width: has(ConfigWindow::WIDTH).then_some(i32::from(event.width)),
                    height: has(ConfigWindow::HEIGHT).then_some(i32::from(event.height)),
                    border_width: has(ConfigWindow::BORDER_WIDTH).then_some(i32::from(event.border_width)),
                    sibling: has(ConfigWindow::SIBLING).then_some(event.sibling),
                    stack_mode: has(ConfigWindow::STACK_MODE).then_some(u32::from(event.stack_mode)),
                })
            }
            Event::ConfigureNotify(event) => XEvent::ConfigureNotify {
                window: event.window,
                width: i32::from(event.width),
                height: i32::from(event.height),
            },
            Event::EnterNotify(event) => {
                let ignored = event.mode != NotifyMode::NORMAL || event.detail == NotifyDetail::INFERIOR;
                if ignored && event.event != self.root {
                    return Ok(None);
                }
                XEvent::EnterNotify {
                    window: event.event,
                    root_x: i32::from(event.root_x),
                    root_y: i32::from(event.root_y),
                }
            }
            Event::MotionNotify(event) => XEvent::MotionNotify {
                window: event.event,
                root_x: i32::from(event.root_x),
                root_y: i32::from(event.root_y),
                time: event.time,
            },
            Event::ButtonPress(event) => {
                self.connection.allow_events(Allow::REPLAY_POINTER, event.time)?;
                XEvent::ButtonPress {
                    window: event.event,
                    event_x: i32::from(event.event_x),
                    root_x: i32::from(event.root_x),
                    root_y: i32::from(event.root_y),
                    button: event.detail,
                    state: u16::from(event.state),
                }
            }
            Event::ButtonRelease(_) => XEvent::ButtonRelease,
            Event::KeyPress(event) => XEvent::KeyPress {
                keysym: self.keyboard.borrow().keysym(event.detail),
                state: u16::from(event.state),
            },
            Event::PropertyNotify(event) => XEvent::PropertyNotify {
                window: event.window,
                property: self.property_kind(event.atom),
                deleted: event.state == xproto::Property::DELETE,
            },
            Event::ClientMessage(event) => XEvent::ClientMessage {
                window: event.window,
                kind: self.client_message_kind(&event),
            },
            Event::Expose(event) => XEvent::Expose {
                window: event.window,
                count: event.count,
            },
            Event::FocusIn(event) => XEvent::FocusIn(event.event),
            Event::MappingNotify(event) => {
                if event.request == xproto::Mapping::KEYBOARD {
                    *self.keyboard.borrow_mut() = KeyboardMapping::load(&self.connection)?;
                }
                XEvent::MappingNotify
            }
            Event::ResizeRequest(event) => XEvent::ResizeRequest {
                window: event.window,
                width: i32::from(event.width),
                height: i32::from(event.height),
            },
            Event::Error(error) => {
                if is_ignorable_error(&error) {
                    debug!(kind = ?error.error_kind, major_opcode = error.major_opcode, "ignoring protocol race");
                } else {
                    error!(?error, "unexpected protocol error");
                }
                return Ok(None);
            }
            _ => return Ok(None),
        };
        Ok(Some(translated))
    }
}

impl XConn for X11rbConn {
    fn root(&self) -> Window {
        self.root
    }

    fn outputs(&self) -> WmResult<Vec<WindowGeometry>> {
        let fallback = || {
            vec![WindowGeometry::new(
                0,
                0,
                i32::from(self.screen.width_in_pixels),
                i32::from(self.screen.height_in_pixels),
            )]
        };

        let xinerama_active = self
            .connection
            .xinerama_is_active()
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .is_some_and(|reply| reply.state != 0);
        if !xinerama_active {
            return Ok(fallback());
        }

        let Ok(cookie) = self.connection.xinerama_query_screens() else {
            return Ok(fallback());
        };
        let Ok(reply) = cookie.reply() else {
            return Ok(fallback());
        };

        let mut outputs: Vec<WindowGeometry> = Vec::new();
        for info in &reply.screen_info {
            if info.width == 0 || info.height == 0 {
                continue;
            }
            let geometry = WindowGeometry::new(
                i32::from(info.x_org),
                i32::from(info.y_org),
                i32::from(info.width),
                i32::from(info.height),
            );
            if !outputs.contains(&geometry) {
                outputs.push(geometry);
            }
        }

        if outputs.is_empty() {
            return Ok(fallback());
        }
        outputs.sort_by_key(|output| (output.y_coordinate, output.x_coordinate));
        Ok(outputs)
    }

    fn next_event(&self) -> WmResult<XEvent> {
        loop {
            self.connection.flush()?;
            let event = self.connection.wait_for_event()?;
            if let Some(event) = self.translate(event)? {
                return Ok(event);
            }
        }
    }

    fn flush(&self) -> WmResult<()> {
        self.connection.flush()?;
        Ok(())
    }

    fn existing_windows(&self) -> WmResult<Vec<Window>> {
        Ok(self.connection.query_tree(self.root)?.reply()?.children)
    }

    fn window_attributes(&self, window: Window) -> WmResult<Option<WindowAttributes>> {
        let reply = absent_if_vanished(self.connection.get_window_attributes(window)?.reply())?;
        Ok(reply.map(|reply| WindowAttributes {
            override_redirect: reply.override_redirect,
            viewable: reply.map_state == MapState::VIEWABLE,
        }))
    }

    fn window_geometry(&self, window: Window) -> WmResult<Option<(WindowGeometry, i32)>> {
        let reply = absent_if_vanished(self.connection.get_geometry(window)?.reply())?;
        Ok(reply.map(|reply| {
            (
                WindowGeometry::new(
                    i32::from(reply.x),
                    i32::from(reply.y),
                    i32::from(reply.width),
                    i32::from(reply.height),
                ),
                i32::from(reply.border_width),
            )
        }))
    }

    fn wm_state(&self, window: Window) -> WmResult<Option<WmState>> {
        let words = self.property32(window, self.atoms.WM_STATE, self.atoms.WM_STATE, 2)?;
        Ok(words.first().and_then(|&state| WmState::from_u32(state)))
    }

    fn transient_for(&self, window: Window) -> WmResult<Option<Window>> {
        let words = self.property32(
            window,
            AtomEnum::WM_TRANSIENT_FOR.into(),
            AtomEnum::WINDOW.into(),
            1,
        )?;
        Ok(words.first().copied().filter(|&parent| parent != NONE))
    }

    fn window_title(&self, window: Window) -> WmResult<String> {
        if let Some(title) = self.text_property(window, self.atoms._NET_WM_NAME, self.atoms.UTF8_STRING)? {
            return Ok(title);
        }
        Ok(self
            .text_property(window, AtomEnum::WM_NAME.into(), AtomEnum::ANY.into())?
            .unwrap_or_default())
    }

    fn window_class(&self, window: Window) -> WmResult<(String, String)> {
        let raw = self
            .text_property(window, AtomEnum::WM_CLASS.into(), AtomEnum::STRING.into())?
            .unwrap_or_default();
        let mut parts = raw.split('\0');
        let instance = parts.next().unwrap_or_default().to_string();
        let class = parts.next().unwrap_or_default().to_string();
        Ok((instance, class))
    }

    fn size_hints(&self, window: Window) -> WmResult<Option<SizeHints>> {
        let words = self.property32(
            window,
            AtomEnum::WM_NORMAL_HINTS.into(),
            AtomEnum::WM_SIZE_HINTS.into(),
            crate::size_hints::WORD_COUNT as u32,
        )?;
        if words.is_empty() {
            return Ok(None);
        }
        Ok(Some(SizeHints::from_words(&words)))
    }

    fn wm_hints(&self, window: Window) -> WmResult<Option<WmHints>> {
        let words = self.property32(window, AtomEnum::WM_HINTS.into(), AtomEnum::WM_HINTS.into(), 9)?;
        let Some(&flags) = words.first() else {
            return Ok(None);
        };
        Ok(Some(WmHints {
            urgent: flags & WM_HINTS_URGENCY != 0,
            input: (flags & WM_HINTS_INPUT != 0).then(|| words.get(1).is_some_and(|&input| input != 0)),
        }))
    }

    fn set_urgency_hint(&self, window: Window, urgent: bool) -> WmResult<()> {
        let mut words = self.property32(window, AtomEnum::WM_HINTS.into(), AtomEnum::WM_HINTS.into(), 9)?;
        let Some(flags) = words.first_mut() else {
            return Ok(());
        };
        if urgent {
            *flags |= WM_HINTS_URGENCY;
        } else {
            *flags &= !WM_HINTS_URGENCY;
        }
        self.connection.change_property32(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_HINTS,
            AtomEnum::WM_HINTS,
            &words,
        )?;
        Ok(())
    }

    fn window_type(&self, window: Window) -> WmResult<WindowType> {
        let states = self.property32(window, self.atoms._NET_WM_STATE, AtomEnum::ATOM.into(), 32)?;
        let types = self.property32(window, self.atoms._NET_WM_WINDOW_TYPE, AtomEnum::ATOM.into(), 32)?;
        Ok(WindowType {
            is_dialog: types.contains(&self.atoms._NET_WM_WINDOW_TYPE_DIALOG),
            is_fullscreen: states.contains(&self.atoms._NET_WM_STATE_FULLSCREEN),
        })
    }

    fn supports_protocol(&self, window: Window, protocol: Protocol) -> WmResult<bool> {
        let protocols = self.property32(window, self.atoms.WM_PROTOCOLS, AtomEnum::ATOM.into(), 32)?;
        Ok(protocols.contains(&self.protocol_atom(protocol)))
    }

    fn send_protocol(&self, window: Window, protocol: Protocol) -> WmResult<()> {
        self.send_message(
            window,
            self.atoms.WM_PROTOCOLS,
            [self.protocol_atom(protocol), CURRENT_TIME, 0, 0, 0],
            EventMask::NO_EVENT,
        )
    }

    fn root_name(&self) -> WmResult<String> {
        Ok(self
            .text_property(self.root, AtomEnum::WM_NAME.into(), AtomEnum::ANY.into())?
            .unwrap_or_default())
    }

    fn configure_client(&self, window: Window, geometry: WindowGeometry, border_width: i32) -> WmResult<()> {
        self.connection.configure_window(
            window,
            &ConfigureWindowAux::new()
                .x(geometry.x_coordinate)
                .y(geometry.y_coordinate)
                .width(geometry.width.max(1) as u32)
                .height(geometry.height.max(1) as u32)
                .border_width(border_width.max(0) as u32),
        )?;
        Ok(())
    }

    fn send_configure_notify(&self, window: Window, geometry: WindowGeometry, border_width: i32) -> WmResult<()> {
        let event = ConfigureNotifyEvent {
            response_type: xproto::CONFIGURE_NOTIFY_EVENT,
            sequence: 0,
            event: window,
            window,
            above_sibling: NONE,
            x: geometry.x_coordinate as i16,
            y: geometry.y_coordinate as i16,
            width: geometry.width.max(1) as u16,
            height: geometry.height.max(1) as u16,
            border_width: border_width.max(0) as u16,
            override_redirect: false,
        };
        self.connection
            .send_event(false, window, EventMask::STRUCTURE_NOTIFY, event)?;
        Ok(())
    }

    fn forward_configure_request(&self, request: &ConfigureRequest) -> WmResult<()> {
        let mut aux = ConfigureWindowAux::new();
        aux.x = request.x;
        aux.y = request.y;
        aux.width = request.width.map(|width| width.max(1) as u32);
        aux.height = request.height.map(|height| height.max(1) as u32);
        aux.border_width = request.border_width.map(|border| border.max(0) as u32);
        aux.sibling = request.sibling;
        aux.stack_mode = request.stack_mode.map(|mode| StackMode::from(mode as u8));
        self.connection.configure_window(request.window, &aux)?;
        Ok(())
    }

    fn move_window(&self, window: Window, x: i32, y: i32) -> WmResult<()> {
        self.connection
            .configure_window(window, &ConfigureWindowAux::new().x(x).y(y))?;
        Ok(())
    }

    fn move_resize_window(&self, window: Window, geometry: WindowGeometry) -> WmResult<()> {
        self.connection.configure_window(
            window,
            &ConfigureWindowAux::new()
                .x(geometry.x_coordinate)
                .y(geometry.y_coordinate)
                .width(geometry.width.max(1) as u32)
                .height(geometry.height.max(1) as u32),
        )?;
        Ok(())
    }

    fn set_border_width(&self, window: Window, width: i32) -> WmResult<()> {
        self.connection.configure_window(
            window,
            &ConfigureWindowAux::new().border_width(width.max(0) as u32),
        )?;
        Ok(())
    }

    fn set_border_color(&self, window: Window, color: u32) -> WmResult<()> {
        self.connection
            .change_window_attributes(window, &ChangeWindowAttributesAux::new().border_pixel(color))?;
        Ok(())
    }

    fn map(&self, window: Window) -> WmResult<()> {
        self.connection.map_window(window)?;
        Ok(())
    }

    fn unmap(&self, window: Window) -> WmResult<()> {
        self.connection.unmap_window(window)?;
        Ok(())
    }

    fn raise(&self, window: Window) -> WmResult<()> {
        self.connection.configure_window(
            window,
            &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
        )?;
        Ok(())
    }

    fn restack(&self, windows: &[Window]) -> WmResult<()> {
        for pair in windows.windows(2) {
            self.connection.configure_window(
                pair[1],
                &ConfigureWindowAux::new()
                    .sibling(pair[0])
                    .stack_mode(StackMode::BELOW),
            )?;
        }
        Ok(())
    }

    fn kill_client(&self, window: Window) -> WmResult<()> {
        self.connection.grab_server()?;
        self.connection.set_close_down_mode(CloseDown::DESTROY_ALL)?;
        self.connection.kill_client(window)?;
        self.connection.ungrab_server()?;
        Ok(())
    }

    fn set_input_focus(&self, window: Option<Window>) -> WmResult<()> {
        let target = window.unwrap_or(self.root);
        self.connection
            .set_input_focus(InputFocus::POINTER_ROOT, target, CURRENT_TIME)?;
        Ok(())
    }

    fn select_client_input(&self, window: Window) -> WmResult<()> {
        self.connection.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new().event_mask(client_event_mask()),
        )?;
        Ok(())
    }

    fn set_wm_state(&self, window: Window, state: WmState) -> WmResult<()> {
        self.connection.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms.WM_STATE,
            self.atoms.WM_STATE,
            &[state.as_u32(), NONE],
        )?;
        Ok(())
    }

    fn grab_keys(&self, bindings: &[KeyBinding]) -> WmResult<()> {
        self.connection
            .ungrab_key(xproto::Grab::ANY, self.root, ModMask::ANY)?;

        let keyboard = self.keyboard.borrow();
        for binding in bindings {
            for keycode in keyboard.keycodes(binding.keysym) {
                for ignored in ignored_modifiers() {
                    self.connection.grab_key(
                        true,
                        self.root,
                        ModMask::from(binding.modifier_mask() | ignored),
                        keycode,
                        GrabMode::ASYNC,
                        GrabMode::ASYNC,
                    )?;
                }
            }
        }
        Ok(())
    }

    fn grab_buttons(&self, window: Window, focused: bool, buttons: &[ButtonBinding]) -> WmResult<()> {
        self.connection
            .ungrab_button(ButtonIndex::ANY, window, ModMask::ANY)?;

        if !focused {
            self.connection.grab_button(
                false,
                window,
                button_mask(),
                GrabMode::SYNC,
                GrabMode::SYNC,
                NONE,
                NONE,
                ButtonIndex::ANY,
                ModMask::ANY,
            )?;
        }

        for binding in buttons.iter().filter(|binding| binding.click == ClickRegion::ClientWindow) {
            for ignored in ignored_modifiers() {
                self.connection.grab_button(
                    false,
                    window,
                    button_mask(),
                    GrabMode::ASYNC,
                    GrabMode::SYNC,
                    NONE,
                    NONE,
                    ButtonIndex::from(binding.button),
                    ModMask::from(binding.modifier_mask() | ignored),
                )?;
            }
        }
        Ok(())
    }

    fn grab_pointer(&self, cursor: CursorKind) -> WmResult<bool> {
        let cursor = match cursor {
            CursorKind::Normal => self.cursors.normal,
            CursorKind::Move => self.cursors.moving,
            CursorKind::Resize => self.cursors.resizing,
        };
        let reply = self
            .connection
            .grab_pointer(
                false,
                self.root,
                button_mask() | EventMask::POINTER_MOTION,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                NONE,
                cursor,
                CURRENT_TIME,
            )?
            .reply()?;
        Ok(reply.status == GrabStatus::SUCCESS)
    }

    fn ungrab_pointer(&self) -> WmResult<()> {
        self.connection.ungrab_pointer(CURRENT_TIME)?;
        Ok(())
    }

    fn query_pointer(&self) -> WmResult<(i32, i32)> {
        let reply = self.connection.query_pointer(self.root)?.reply()?;
        Ok((i32::from(reply.root_x), i32::from(reply.root_y)))
    }

    fn warp_pointer(&self, window: Window, x: i32, y: i32) -> WmResult<()> {
        self.connection
            .warp_pointer(NONE, window, 0, 0, 0, 0, x as i16, y as i16)?;
        Ok(())
    }

    fn set_client_list(&self, windows: &[Window]) -> WmResult<()> {
        self.connection.change_property32(
            PropMode::REPLACE,
            self.root,
            self.atoms._NET_CLIENT_LIST,
            AtomEnum::WINDOW,
            windows,
        )?;
        Ok(())
    }

    fn set_active_window(&self, window: Option<Window>) -> WmResult<()> {
        match window {
            Some(window) => {
                self.connection.change_property32(
                    PropMode::REPLACE,
                    self.root,
                    self.atoms._NET_ACTIVE_WINDOW,
                    AtomEnum::WINDOW,
                    &[window],
                )?;
            }
            None => {
                self.connection
                    .delete_property(self.root, self.atoms._NET_ACTIVE_WINDOW)?;
            }
        }
        Ok(())
    }

    fn set_current_desktop(&self, desktop: u32) -> WmResult<()> {
        self.connection.change_property32(
            PropMode::REPLACE,
            self.root,
            self.atoms._NET_CURRENT_DESKTOP,
            AtomEnum::CARDINAL,
            &[desktop],
        )?;
        Ok(())
    }

    fn set_desktop_names(&self, names: &[String]) -> WmResult<()> {
        self.connection.change_property32(
            PropMode::REPLACE,
            self.root,
            self.atoms._NET_NUMBER_OF_DESKTOPS,
            AtomEnum::CARDINAL,
            &[names.len() as u32],
        )?;

        let mut joined = Vec::new();
        for name in names {
            joined.extend_from_slice(name.as_bytes());
            joined.push(0);
        }
        self.connection.change_property8(
            PropMode::REPLACE,
            self.root,
            self.atoms._NET_DESKTOP_NAMES,
            self.atoms.UTF8_STRING,
            &joined,
        )?;
        Ok(())
    }

    fn set_client_desktop(&self, window: Window, desktop: u32) -> WmResult<()> {
        self.connection.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms._NET_WM_DESKTOP,
            AtomEnum::CARDINAL,
            &[desktop],
        )?;
        Ok(())
    }

    fn set_fullscreen_state(&self, window: Window, fullscreen: bool) -> WmResult<()> {
        let states: &[u32] = if fullscreen {
            &[self.atoms._NET_WM_STATE_FULLSCREEN]
        } else {
            &[]
        };
        self.connection.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms._NET_WM_STATE,
            AtomEnum::ATOM,
            states,
        )?;
        Ok(())
    }

    fn create_bar(&self, geometry: WindowGeometry) -> WmResult<Window> {
        let window = self.connection.generate_id()?;
        self.connection.create_window(
            COPY_DEPTH_FROM_PARENT,
            window,
            self.root,
            geometry.x_coordinate as i16,
            geometry.y_coordinate as i16,
            geometry.width.max(1) as u16,
            geometry.height.max(1) as u16,
            0,
            WindowClass::INPUT_OUTPUT,
            self.screen.root_visual,
            &CreateWindowAux::new()
                .background_pixel(self.screen.black_pixel)
                .override_redirect(1)
                .event_mask(EventMask::EXPOSURE | EventMask::BUTTON_PRESS)
                .cursor(self.cursors.normal),
        )?;
        self.connection.change_property8(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_CLASS,
            AtomEnum::STRING,
            b"tagwm\0tagwm\0",
        )?;
        self.connection.map_window(window)?;
        self.raise(window)?;
        Ok(window)
    }

    fn destroy_window(&self, window: Window) -> WmResult<()> {
        self.painter.borrow_mut().forget(window);
        self.connection.unmap_window(window)?;
        self.connection.destroy_window(window)?;
        Ok(())
    }

    fn text_width(&self, text: &str) -> i32 {
        self.painter.borrow().text_width(text)
    }

    fn font_height(&self) -> i32 {
        self.painter.borrow().font_height()
    }

    fn draw_segments(&self, window: Window, width: i32, height: i32, segments: &[BarSegment]) -> WmResult<()> {
        self.painter
            .borrow_mut()
            .paint(&self.connection, window, width, height, segments)
    }

    fn create_systray(&self, background: u32) -> WmResult<Option<Window>> {
        let window = self.connection.generate_id()?;
        self.connection.create_window(
            COPY_DEPTH_FROM_PARENT,
            window,
            self.root,
            0,
            0,
            1,
            1,
            0,
            WindowClass::INPUT_OUTPUT,
            self.screen.root_visual,
            &CreateWindowAux::new()
                .background_pixel(background)
                .override_redirect(1)
                .event_mask(
                    EventMask::SUBSTRUCTURE_NOTIFY | EventMask::BUTTON_PRESS | EventMask::EXPOSURE,
                ),
        )?;
        self.connection.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms._NET_SYSTEM_TRAY_ORIENTATION,
            AtomEnum::CARDINAL,
            &[self.atoms._NET_SYSTEM_TRAY_ORIENTATION_HORZ],
        )?;
        self.connection.map_window(window)?;
        self.raise(window)?;
        self.connection
            .set_selection_owner(window, self.atoms._NET_SYSTEM_TRAY_S0, CURRENT_TIME)?;

        let owner = self
            .connection
            .get_selection_owner(self.atoms._NET_SYSTEM_TRAY_S0)?
            .reply()?
            .owner;
        if owner != window {
            error!("unable to obtain the system tray selection");
            self.connection.destroy_window(window)?;
            return Ok(None);
        }

        self.send_message(
            self.root,
            self.atoms.MANAGER,
            [CURRENT_TIME, self.atoms._NET_SYSTEM_TRAY_S0, window, 0, 0],
            EventMask::STRUCTURE_NOTIFY,
        )?;
        Ok(Some(window))
    }

    fn embed_icon(&self, tray: Window, icon: Window) -> WmResult<Option<(i32, i32)>> {
        let Some((geometry, _)) = self.window_geometry(icon)? else {
            return Ok(None);
        };

        self.connection.change_save_set(SetMode::INSERT, icon)?;
        self.connection.change_window_attributes(
            icon,
            &ChangeWindowAttributesAux::new().event_mask(
                EventMask::STRUCTURE_NOTIFY | EventMask::PROPERTY_CHANGE | EventMask::RESIZE_REDIRECT,
            ),
        )?;
        self.connection.reparent_window(icon, tray, 0, 0)?;
        self.send_message(
            icon,
            self.atoms._XEMBED,
            [CURRENT_TIME, XEMBED_EMBEDDED_NOTIFY, 0, tray, XEMBED_EMBEDDED_VERSION],
            EventMask::STRUCTURE_NOTIFY,
        )?;
        Ok(Some((geometry.width, geometry.height)))
    }

    fn xembed_flags(&self, icon: Window) -> WmResult<Option<u32>> {
        let words = self.property32(icon, self.atoms._XEMBED_INFO, self.atoms._XEMBED_INFO, 2)?;
        Ok(words.get(1).copied())
    }
}

impl Drop for X11rbConn {
    fn drop(&mut self) {
        let _ = self.connection.destroy_window(self.check_window);
        let _ = self
            .connection
            .set_input_focus(InputFocus::POINTER_ROOT, self.root, CURRENT_TIME);
        let _ = self.connection.delete_property(self.root, self.atoms._NET_ACTIVE_WINDOW);
        let _ = self.connection.flush();
    }
}
