use super::*;
use crate::bar::ClickRegion;
use crate::client::FloatState;
use crate::keyboard::keysyms::XK_2;
use crate::keyboard::{Arg, KeyAction};
use crate::layout::LayoutType;
use crate::x::mock::{MockWindow, MockXConn};
use crate::x::{ClientMessageKind, ConfigureRequest, Property, StateAction, WindowType};
use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;
use simple_test_case::test_case;
use std::collections::HashSet;
use x11rb::protocol::xproto::KeyButMask;

const ROOT: Window = 1;

fn test_config() -> Config {
    Config {
        show_bar: false,
        gaps_enabled: false,
        systray_enabled: false,
        ..Config::default()
    }
}

fn wm_with(conn: MockXConn, config: Config) -> WindowManager<MockXConn> {
    WindowManager::new(conn, config).expect("window manager starts")
}

fn single_monitor() -> WindowManager<MockXConn> {
    wm_with(MockXConn::single(1280, 800), test_config())
}

fn terminal() -> MockWindow {
    MockWindow::new("term", "XTerm")
}

fn map(wm: &mut WindowManager<MockXConn>, window: Window, mock: MockWindow) {
    wm.conn.add_window(window, mock);
    wm.handle_event(XEvent::MapRequest(window)).expect("map request");
}

fn run(wm: &mut WindowManager<MockXConn>, action: KeyAction, arg: Arg) {
    wm.execute(action, arg).expect("action succeeds");
}

fn set_root_name(wm: &mut WindowManager<MockXConn>, name: &str) {
    wm.conn.state.borrow_mut().root_name = name.to_string();
    wm.handle_event(XEvent::PropertyNotify {
        window: ROOT,
        property: Property::Name,
        deleted: false,
    })
    .expect("property notify");
}

#[test]
fn three_clients_tile_into_master_and_even_stack() {
    let config = Config {
        master_factor: 0.6,
        ..test_config()
    };
    let mut wm = wm_with(MockXConn::single(1280, 800), config);
    for window in [10, 11, 12] {
        map(&mut wm, window, terminal());
    }

    let order = wm.monitors[0].clients.clone();
    let outer: Vec<WindowGeometry> = order
        .iter()
        .map(|window| wm.clients[window].outer_geometry())
        .collect();

    assert_eq!(order, vec![12, 11, 10]);
    assert_eq!(
        outer,
        vec![
            WindowGeometry::new(0, 0, 768, 800),
            WindowGeometry::new(768, 0, 512, 400),
            WindowGeometry::new(768, 400, 512, 400),
        ]
    );
    assert_eq!(wm.conn.geometry_of(12), Some(WindowGeometry::new(0, 0, 766, 798)));
}

#[test]
fn new_clients_take_focus() {
    let mut wm = single_monitor();
    map(&mut wm, 10, terminal());
    map(&mut wm, 11, terminal());

    assert_eq!(wm.selected_client(), Some(11));
    assert_eq!(wm.conn.focused(), Some(11));
    assert_eq!(wm.monitors[0].stack, vec![11, 10]);
    assert_eq!(wm.conn.state.borrow().client_list, vec![11, 10]);
}

#[test]
fn destroying_the_selection_focuses_the_previous_client() {
    let mut wm = single_monitor();
    map(&mut wm, 10, terminal());
    map(&mut wm, 11, terminal());

    wm.handle_event(XEvent::DestroyNotify(11)).unwrap();

    assert!(!wm.clients.contains_key(&11));
    assert_eq!(wm.selected_client(), Some(10));
    assert_eq!(wm.conn.geometry_of(10), Some(WindowGeometry::new(0, 0, 1278, 798)));
}

#[test]
fn showing_an_empty_scratchpad_spawns_its_command() {
    let mut wm = single_monitor();
    let command = wm.config.scratchpad_command(3).map(<[String]>::to_vec);

    run(&mut wm, KeyAction::ScratchShow, Arg::Int(3));

    assert_eq!(wm.conn.spawned().last().cloned(), command);
}

#[test]
fn scratchpad_toggles_between_hidden_and_the_current_view() {
    let mut wm = single_monitor();
    map(&mut wm, 10, terminal());
    map(&mut wm, 20, MockWindow::new("scratchmixer", "St"));

    let scratch = &wm.clients[&20];
    assert_eq!(scratch.scratch_key, 3);
    assert!(scratch.is_floating());

    run(&mut wm, KeyAction::ScratchToggle, Arg::Int(3));
    assert_eq!(wm.clients[&20].tags, 0);
    assert_eq!(wm.selected_client(), Some(10));

    run(&mut wm, KeyAction::View, Arg::UInt(1 << 4));
    run(&mut wm, KeyAction::ScratchToggle, Arg::Int(3));
    assert_eq!(wm.clients[&20].tags, 1 << 4);
    assert_eq!(wm.selected_client(), Some(20));
    assert!(wm.conn.spawned().is_empty());
}

#[test]
fn a_scratch_key_has_one_holder() {
    let mut wm = single_monitor();
    map(&mut wm, 20, MockWindow::new("scratchmixer", "St"));
    map(&mut wm, 21, MockWindow::new("scratchmixer", "St"));

    assert_eq!(wm.clients[&21].scratch_key, 0);

    run(&mut wm, KeyAction::ScratchClaim, Arg::Int(3));

    assert_eq!(wm.clients[&21].scratch_key, 0);
    let notified = wm.conn.spawned();
    assert_eq!(
        notified.last().and_then(|argv| argv.last()).map(String::as_str),
        Some("scratchpad 3 is already taken")
    );

    run(&mut wm, KeyAction::ScratchClaim, Arg::Int(-1));
    assert_eq!(wm.clients[&21].scratch_key, -1);
}

#[test]
fn tagging_the_selection_away_moves_focus() {
    let mut wm = single_monitor();
    run(&mut wm, KeyAction::View, Arg::UInt(1 << 1));
    map(&mut wm, 10, terminal());
    map(&mut wm, 11, terminal());
    assert_eq!(wm.selected_client(), Some(11));

    run(&mut wm, KeyAction::Tag, Arg::UInt(1 << 4));

    assert_eq!(wm.clients[&11].tags, 1 << 4);
    assert!(!wm.is_visible(11));
    assert_eq!(wm.selected_client(), Some(10));
    assert_eq!(wm.conn.focused(), Some(10));
    assert!(wm.conn.geometry_of(11).is_some_and(|geometry| geometry.x_coordinate < 0));
}

#[test_case(0b0001, 0b0001; "the only tag cannot be removed")]
#[test_case(0b0010, 0b0011; "a second tag is added")]
#[test]
fn toggle_tag_keeps_at_least_one_tag(mask: u32, expected: u32) {
    let mut wm = single_monitor();
    map(&mut wm, 10, terminal());

    run(&mut wm, KeyAction::ToggleTag, Arg::UInt(mask));

    assert_eq!(wm.clients[&10].tags, expected);
}

#[test]
fn pertag_remembers_layout_per_view() {
    let mut wm = single_monitor();
    map(&mut wm, 10, terminal());

    run(&mut wm, KeyAction::SetLayout, Arg::UInt(2));
    assert_eq!(wm.selmon().layout(), LayoutType::Monocle);

    run(&mut wm, KeyAction::View, Arg::UInt(1 << 1));
    assert_eq!(wm.selmon().layout(), LayoutType::Tile);

    run(&mut wm, KeyAction::View, Arg::UInt(0));
    assert_eq!(wm.selmon().selected_tags(), 1);
    assert_eq!(wm.selmon().layout(), LayoutType::Monocle);
}

#[test]
fn swapping_tags_moves_clients_and_settings() {
    let mut wm = single_monitor();
    map(&mut wm, 10, terminal());
    run(&mut wm, KeyAction::IncNumMaster, Arg::Int(1));

    run(&mut wm, KeyAction::SwapTags, Arg::UInt(1 << 3));

    assert_eq!(wm.clients[&10].tags, 1 << 3);
    assert_eq!(wm.selmon().selected_tags(), 1 << 3);
    assert_eq!(wm.selmon().num_master, 2);
}

#[test]
fn swapping_keeps_clients_on_both_tags_visible() {
    let mut wm = single_monitor();
    map(&mut wm, 10, terminal());
    run(&mut wm, KeyAction::ToggleTag, Arg::UInt(1 << 3));
    assert_eq!(wm.clients[&10].tags, 0b1001);

    run(&mut wm, KeyAction::SwapTags, Arg::UInt(1 << 3));

    assert_eq!(wm.clients[&10].tags, 1 << 3);
    assert!(wm.is_visible(10));
}

#[test]
fn leaving_an_emptied_tag_forgets_its_layout() {
    let mut wm = single_monitor();
    map(&mut wm, 10, terminal());
    run(&mut wm, KeyAction::SetLayout, Arg::UInt(2));
    run(&mut wm, KeyAction::Tag, Arg::UInt(1 << 1));

    run(&mut wm, KeyAction::View, Arg::UInt(1 << 1));
    run(&mut wm, KeyAction::SetLayout, Arg::UInt(1));
    run(&mut wm, KeyAction::View, Arg::UInt(1));
    assert_eq!(wm.selmon().layout(), LayoutType::Tile);

    run(&mut wm, KeyAction::View, Arg::UInt(1 << 1));
    assert_eq!(wm.selmon().layout(), LayoutType::Deck);
}

#[test]
fn toggling_a_view_in_keeps_the_master() {
    let mut wm = single_monitor();
    run(&mut wm, KeyAction::View, Arg::UInt(1 << 1));
    map(&mut wm, 10, terminal());
    map(&mut wm, 11, terminal());
    run(&mut wm, KeyAction::View, Arg::UInt(1));
    map(&mut wm, 12, terminal());
    run(&mut wm, KeyAction::View, Arg::UInt(1 << 1));
    assert_eq!(wm.monitors[0].clients, vec![12, 11, 10]);

    run(&mut wm, KeyAction::ToggleView, Arg::UInt(1));

    assert_eq!(wm.selmon().selected_tags(), 0b11);
    assert_eq!(wm.monitors[0].clients, vec![11, 12, 10]);
    assert_eq!(wm.tiled_clients(0).first(), Some(&11));
}

#[test]
fn shifting_the_view_skips_empty_tags() {
    let mut wm = single_monitor();
    map(&mut wm, 10, terminal());
    map(&mut wm, 11, terminal());
    run(&mut wm, KeyAction::Tag, Arg::UInt(1 << 3));

    run(&mut wm, KeyAction::ShiftView, Arg::Int(1));
    assert_eq!(wm.selmon().selected_tags(), 1 << 3);

    run(&mut wm, KeyAction::ShiftView, Arg::Int(1));
    assert_eq!(wm.selmon().selected_tags(), 1);

    run(&mut wm, KeyAction::ShiftView, Arg::Int(-1));
    assert_eq!(wm.selmon().selected_tags(), 1 << 3);
}

#[test]
fn shifting_a_client_lands_on_the_next_occupied_tag() {
    let mut wm = single_monitor();
    map(&mut wm, 10, terminal());
    run(&mut wm, KeyAction::ShiftTag, Arg::Int(1));
    assert_eq!(wm.clients[&10].tags, 1 << 1);

    run(&mut wm, KeyAction::View, Arg::UInt(1 << 1));
    map(&mut wm, 11, terminal());
    run(&mut wm, KeyAction::Tag, Arg::UInt(1 << 5));
    run(&mut wm, KeyAction::FocusStack, Arg::Int(1));
    assert_eq!(wm.selected_client(), Some(10));

    run(&mut wm, KeyAction::ShiftTag, Arg::Int(-1));
    assert_eq!(wm.clients[&10].tags, 1 << 5);
}

#[test_case(4, false, false, vec![11, 10, 12]; "bottom")]
#[test_case(3, true, false, vec![11, 12, 10]; "above the selection")]
#[test_case(3, true, true, vec![12, 11, 10]; "above a floating selection goes to the head")]
#[test_case(2, false, false, vec![11, 12, 10]; "below the selection")]
#[test_case(2, false, true, vec![11, 10, 12]; "below a floating selection goes to the tail")]
#[test_case(1, false, false, vec![11, 12, 10]; "aside the master")]
#[test_case(1, false, true, vec![11, 10, 12]; "aside skips floating clients")]
#[test]
fn attach_policies_place_new_clients(
    policy: u32,
    select_next: bool,
    float_selection: bool,
    expected: Vec<Window>,
) {
    let mut wm = single_monitor();
    map(&mut wm, 10, terminal());
    map(&mut wm, 11, terminal());
    if select_next {
        run(&mut wm, KeyAction::FocusStack, Arg::Int(1));
    }
    if float_selection {
        run(&mut wm, KeyAction::ToggleFloating, Arg::None);
    }
    run(&mut wm, KeyAction::SetAttach, Arg::UInt(policy));

    map(&mut wm, 12, terminal());

    assert_eq!(wm.monitors[0].clients, expected);
}

#[test]
fn aside_counts_the_masters_of_the_current_view() {
    let mut wm = single_monitor();
    map(&mut wm, 10, terminal());
    run(&mut wm, KeyAction::Tag, Arg::UInt(1 << 8));
    map(&mut wm, 11, terminal());
    run(&mut wm, KeyAction::ToggleView, Arg::UInt(1 << 8));
    assert_eq!(wm.tiled_clients(0), vec![11, 10]);
    run(&mut wm, KeyAction::SetAttach, Arg::UInt(1));

    map(&mut wm, 12, MockWindow::new("Navigator", "firefox"));

    assert_eq!(wm.clients[&12].tags, 1 << 8);
    assert_eq!(wm.monitors[0].clients, vec![11, 12, 10]);
}

#[test]
fn directional_focus_respects_floating_state() {
    let mut wm = single_monitor();
    for window in [10, 11, 12] {
        map(&mut wm, window, terminal());
    }
    run(&mut wm, KeyAction::FocusStack, Arg::Int(1));
    run(&mut wm, KeyAction::ToggleFloating, Arg::None);
    assert!(wm.clients[&11].is_floating());

    run(&mut wm, KeyAction::FocusSameFloat, Arg::Int(1));
    assert_eq!(wm.selected_client(), Some(11));

    run(&mut wm, KeyAction::FocusStack, Arg::Int(-1));
    assert_eq!(wm.selected_client(), Some(12));

    run(&mut wm, KeyAction::FocusTiled, Arg::Int(1));
    assert_eq!(wm.selected_client(), Some(10));

    run(&mut wm, KeyAction::FocusSameFloat, Arg::Int(1));
    assert_eq!(wm.selected_client(), Some(12));
}

#[test]
fn clients_on_a_removed_output_move_to_the_first_monitor() {
    let outputs = vec![
        WindowGeometry::new(0, 0, 1280, 800),
        WindowGeometry::new(1280, 0, 1280, 800),
    ];
    let mut wm = wm_with(MockXConn::new(outputs), test_config());
    run(&mut wm, KeyAction::FocusMonitor, Arg::Int(1));
    map(&mut wm, 10, terminal());
    assert_eq!(wm.clients[&10].monitor_index, 1);

    wm.conn.state.borrow_mut().outputs.truncate(1);
    wm.handle_event(XEvent::ConfigureNotify {
        window: ROOT,
        width: 1280,
        height: 800,
    })
    .unwrap();

    assert_eq!(wm.monitors.len(), 1);
    assert_eq!(wm.clients[&10].monitor_index, 0);
    assert_eq!(wm.monitors[0].clients, vec![10]);
    assert_eq!(wm.selected_monitor, 0);
}

#[test]
fn resizing_onto_another_monitor_hands_the_client_over() {
    let outputs = vec![
        WindowGeometry::new(0, 0, 1280, 800),
        WindowGeometry::new(1280, 0, 1280, 800),
    ];
    let mut wm = wm_with(MockXConn::new(outputs), test_config());
    run(&mut wm, KeyAction::FocusMonitor, Arg::Int(1));
    run(&mut wm, KeyAction::View, Arg::UInt(1 << 2));
    run(&mut wm, KeyAction::FocusMonitor, Arg::Int(-1));

    let mut mock = terminal();
    mock.geometry = WindowGeometry::new(1100, 100, 150, 100);
    map(&mut wm, 30, mock);
    run(&mut wm, KeyAction::ToggleFloating, Arg::None);
    assert_eq!(wm.clients[&30].geometry, WindowGeometry::new(1100, 100, 150, 100));

    run(&mut wm, KeyAction::ResizeMouse, Arg::None);
    assert!(wm.drag.is_active());
    wm.handle_event(XEvent::MotionNotify {
        window: ROOT,
        root_x: 2100,
        root_y: 300,
        time: 100,
    })
    .unwrap();
    wm.handle_event(XEvent::ButtonRelease).unwrap();

    let client = &wm.clients[&30];
    assert_eq!(client.geometry, WindowGeometry::new(1100, 100, 999, 199));
    assert_eq!(client.monitor_index, 1);
    assert_eq!(client.tags, 1 << 2);
    assert_eq!(wm.selected_monitor, 1);
    assert_eq!(wm.monitors[1].selected_client, Some(30));
    assert!(!wm.conn.state.borrow().pointer_grabbed);
}

#[test]
fn events_during_a_drag_wait_for_the_release() {
    let mut wm = single_monitor();
    map(&mut wm, 10, terminal());
    map(&mut wm, 11, terminal());

    run(&mut wm, KeyAction::MoveMouse, Arg::None);
    wm.handle_event(XEvent::KeyPress {
        keysym: XK_2,
        state: u16::from(KeyButMask::MOD4),
    })
    .unwrap();
    wm.handle_event(XEvent::EnterNotify {
        window: 10,
        root_x: 5,
        root_y: 5,
    })
    .unwrap();
    assert_eq!(wm.deferred.len(), 2);
    assert_eq!(wm.selmon().selected_tags(), 1);

    wm.conn.add_window(12, terminal());
    wm.handle_event(XEvent::MapRequest(12)).unwrap();
    assert!(wm.clients.contains_key(&12));

    wm.handle_event(XEvent::ButtonRelease).unwrap();

    assert!(!wm.drag.is_active());
    assert!(wm.deferred.is_empty());
    assert_eq!(wm.selmon().selected_tags(), 1 << 1);
}

#[test]
fn fast_motion_is_dropped_while_dragging() {
    let mut wm = single_monitor();
    let mut mock = MockWindow::new("dialog", "Dialog");
    mock.window_type = WindowType {
        is_dialog: true,
        is_fullscreen: false,
    };
    mock.geometry = WindowGeometry::new(100, 100, 200, 100);
    map(&mut wm, 10, mock);
    wm.conn.state.borrow_mut().pointer = (150, 150);

    run(&mut wm, KeyAction::MoveMouse, Arg::None);
    let motion = |root_x, time| XEvent::MotionNotify {
        window: ROOT,
        root_x,
        root_y: 150,
        time,
    };
    wm.handle_event(motion(250, 100)).unwrap();
    wm.handle_event(motion(350, 100 + MOTION_INTERVAL_MS)).unwrap();

    assert_eq!(wm.clients[&10].geometry.x_coordinate, 200);
}

#[test]
fn fullscreen_requests_cover_the_monitor_and_restore() {
    let mut wm = single_monitor();
    map(&mut wm, 10, terminal());
    let fullscreen = |action| XEvent::ClientMessage {
        window: 10,
        kind: ClientMessageKind::Fullscreen(action),
    };

    wm.handle_event(fullscreen(StateAction::Add)).unwrap();
    assert!(wm.clients[&10].is_fullscreen);
    assert_eq!(wm.conn.geometry_of(10), Some(WindowGeometry::new(0, 0, 1280, 800)));
    assert_eq!(wm.conn.border_of(10), Some(0));

    wm.handle_event(fullscreen(StateAction::Toggle)).unwrap();
    let client = &wm.clients[&10];
    assert!(!client.is_fullscreen);
    assert_eq!(client.float_state, FloatState::Tiled);
    assert_eq!(wm.conn.geometry_of(10), Some(WindowGeometry::new(0, 0, 1278, 798)));
    assert_eq!(wm.conn.border_of(10), Some(1));
}

#[test]
fn activation_requests_mark_clients_urgent() {
    let mut wm = single_monitor();
    map(&mut wm, 10, terminal());
    run(&mut wm, KeyAction::Tag, Arg::UInt(1 << 2));
    map(&mut wm, 11, terminal());

    wm.handle_event(XEvent::ClientMessage {
        window: 10,
        kind: ClientMessageKind::ActiveWindow,
    })
    .unwrap();
    assert!(wm.clients[&10].is_urgent);

    run(&mut wm, KeyAction::FocusUrgent, Arg::None);

    assert_eq!(wm.selmon().selected_tags(), 1 << 2);
    assert_eq!(wm.selected_client(), Some(10));
    assert!(!wm.clients[&10].is_urgent);
}

#[test]
fn floating_clients_get_their_configure_requests() {
    let mut wm = single_monitor();
    map(&mut wm, 10, terminal());
    let mut dialog = MockWindow::new("dialog", "Dialog");
    dialog.window_type = WindowType {
        is_dialog: true,
        is_fullscreen: false,
    };
    map(&mut wm, 11, dialog);

    let request = |window| {
        XEvent::ConfigureRequest(ConfigureRequest {
            window,
            x: Some(50),
            y: Some(60),
            width: Some(400),
            height: Some(300),
            ..ConfigureRequest::default()
        })
    };
    wm.handle_event(request(11)).unwrap();
    wm.handle_event(request(10)).unwrap();

    assert_eq!(wm.conn.geometry_of(11), Some(WindowGeometry::new(50, 60, 400, 300)));
    assert_eq!(wm.clients[&11].float_geometry, WindowGeometry::new(50, 60, 400, 300));
    assert_eq!(wm.conn.geometry_of(10), Some(WindowGeometry::new(0, 0, 1278, 798)));
}

#[test_case("#!viewex ui 2", 1 << 2; "tag index becomes a mask")]
#[test_case("#!viewex ui 40", 1; "out of range tag index is ignored")]
#[test_case("#!viewex i 2", 1; "mistyped argument is ignored")]
#[test_case("#!nosuchsignal", 1; "unknown signal is ignored")]
#[test_case("#!viewex ui", 1; "missing value is ignored")]
#[test]
fn status_signals_drive_actions(name: &str, expected_view: u32) {
    let mut wm = single_monitor();

    set_root_name(&mut wm, name);

    assert_eq!(wm.selmon().selected_tags(), expected_view);
}

#[test]
fn float_signals_set_the_master_factor() {
    let mut wm = single_monitor();
    set_root_name(&mut wm, "#!setmfact f 1.7");
    assert!((wm.selmon().master_factor - 0.7).abs() < 1e-6);
}

#[test]
fn tag_indexes_beyond_the_configured_tags_are_ignored() {
    let mut wm = single_monitor();
    set_root_name(&mut wm, "#!viewex ui 2");
    assert_eq!(wm.selmon().selected_tags(), 1 << 2);

    for index in [9, 12, 30] {
        set_root_name(&mut wm, &format!("#!viewex ui {}", index));
        assert_eq!(wm.selmon().selected_tags(), 1 << 2);
    }
}

#[test]
fn master_factor_outside_its_range_is_left_alone() {
    let mut wm = single_monitor();
    run(&mut wm, KeyAction::SetMasterFactor, Arg::Float(0.3));
    assert!((wm.selmon().master_factor - 0.85).abs() < 1e-6);

    run(&mut wm, KeyAction::SetMasterFactor, Arg::Float(0.3));
    assert!((wm.selmon().master_factor - 0.85).abs() < 1e-6);

    run(&mut wm, KeyAction::SetMasterFactor, Arg::Float(1.99));
    assert!((wm.selmon().master_factor - 0.85).abs() < 1e-6);
}

#[test]
fn status_text_is_split_into_schemes() {
    let mut wm = single_monitor();

    set_root_name(&mut wm, "\u{1}cpu\u{3} 42%");
    let texts: Vec<(&str, usize)> = wm
        .status
        .iter()
        .map(|segment| (segment.text.as_str(), segment.scheme))
        .collect();
    assert_eq!(texts, vec![("cpu", 0), (" 42%", 2)]);

    set_root_name(&mut wm, "");
    assert!(wm.status[0].text.starts_with("tagwm-"));
}

#[test]
fn clicking_a_tag_cell_views_that_tag() {
    let config = Config {
        show_bar: true,
        ..test_config()
    };
    let mut wm = wm_with(MockXConn::single(1280, 800), config);
    let bar = wm.monitors[0].bar_window.expect("bar exists");
    let x = wm.bar_segments[&bar]
        .iter()
        .find(|segment| segment.region == ClickRegion::TagBar && segment.index == 2)
        .map(|segment| segment.x + 1)
        .expect("third tag cell");

    wm.handle_event(XEvent::ButtonPress {
        window: bar,
        event_x: x,
        root_x: x,
        root_y: 1,
        button: 1,
        state: 0,
    })
    .unwrap();

    assert_eq!(wm.selmon().selected_tags(), 1 << 2);
}

#[test]
fn clicking_a_tab_focuses_its_client() {
    let mut wm = single_monitor();
    for window in [10, 11, 12] {
        map(&mut wm, window, terminal());
    }
    run(&mut wm, KeyAction::SetLayout, Arg::UInt(2));
    assert!(wm.selmon().show_tab);
    assert_eq!(wm.selmon().window_area, WindowGeometry::new(0, 24, 1280, 776));

    let tab = wm.monitors[0].tab_window.expect("tab bar exists");
    let x = wm.bar_segments[&tab]
        .iter()
        .find(|segment| segment.region == ClickRegion::TabBar && segment.index == 2)
        .map(|segment| segment.x + 1)
        .expect("third tab");

    wm.handle_event(XEvent::ButtonPress {
        window: tab,
        event_x: x,
        root_x: x,
        root_y: 1,
        button: 1,
        state: 0,
    })
    .unwrap();

    assert_eq!(wm.selected_client(), Some(10));
}

#[test]
fn tray_icons_dock_and_reserve_bar_space() {
    let config = Config {
        show_bar: true,
        systray_enabled: true,
        ..test_config()
    };
    let mut wm = wm_with(MockXConn::single(1280, 800), config);
    let tray = wm.systray.as_ref().map(|systray| systray.window).expect("tray exists");
    let icon = MockWindow {
        geometry: WindowGeometry::new(0, 0, 16, 16),
        ..MockWindow::default()
    };
    wm.conn.add_window(50, icon);

    wm.handle_event(XEvent::ClientMessage {
        window: tray,
        kind: ClientMessageKind::DockRequest(50),
    })
    .unwrap();

    assert!(wm.is_systray_icon(50));
    assert!(wm.conn.is_mapped(50));
    assert_eq!(wm.systray_width(), 2 + 24 + 2);

    wm.handle_event(XEvent::DestroyNotify(50)).unwrap();
    assert!(!wm.is_systray_icon(50));
    assert_eq!(wm.systray_width(), 0);
}

#[derive(Debug, Clone)]
enum Op {
    Map,
    Unmap(u8),
    View(u8),
    ToggleView(u8),
    Tag(u8),
    ToggleTag(u8),
    SwapTags(u8),
    FocusStack(bool),
    Zoom,
    ToggleFloating,
    SetLayout(u8),
    ScratchClaim(u8),
    ScratchToggle(u8),
    ScratchRelease,
}

impl Arbitrary for Op {
    fn arbitrary(g: &mut Gen) -> Self {
        let value = u8::arbitrary(g);
        match u8::arbitrary(g) % 16 {
            0..=2 => Self::Map,
            3 => Self::Unmap(value),
            4 => Self::View(value),
            5 => Self::ToggleView(value),
            6 => Self::Tag(value),
            7 => Self::ToggleTag(value),
            8 => Self::SwapTags(value),
            9 => Self::FocusStack(value % 2 == 0),
            10 => Self::Zoom,
            11 => Self::ToggleFloating,
            12 => Self::SetLayout(value),
            13 => Self::ScratchClaim(value),
            14 => Self::ScratchToggle(value),
            _ => Self::ScratchRelease,
        }
    }
}

fn tag_of(value: u8) -> Arg {
    Arg::UInt(1 << (value % 9))
}

fn scratch_key(value: u8) -> Arg {
    Arg::Int(i32::from(value % 3) + 1)
}

fn apply(wm: &mut WindowManager<MockXConn>, op: Op, next_window: &mut Window) -> WmResult<()> {
    match op {
        Op::Map => {
            let window = *next_window;
            *next_window += 1;
            wm.conn.add_window(window, terminal());
            wm.handle_event(XEvent::MapRequest(window))
        }
        Op::Unmap(value) => {
            let mut windows: Vec<Window> = wm.clients.keys().copied().collect();
            windows.sort_unstable();
            match windows.get(usize::from(value) % windows.len().max(1)) {
                Some(&window) => wm.handle_event(XEvent::UnmapNotify {
                    window,
                    synthetic: false,
                }),
                None => Ok(()),
            }
        }
        Op::View(value) => wm.execute(KeyAction::View, tag_of(value)),
        Op::ToggleView(value) => wm.execute(KeyAction::ToggleView, tag_of(value)),
        Op::Tag(value) => wm.execute(KeyAction::Tag, tag_of(value)),
        Op::ToggleTag(value) => wm.execute(KeyAction::ToggleTag, tag_of(value)),
        Op::SwapTags(value) => wm.execute(KeyAction::SwapTags, tag_of(value)),
        Op::FocusStack(forward) => wm.execute(KeyAction::FocusStack, Arg::Int(if forward { 1 } else { -1 })),
        Op::Zoom => wm.execute(KeyAction::Zoom, Arg::None),
        Op::ToggleFloating => wm.execute(KeyAction::ToggleFloating, Arg::None),
        Op::SetLayout(value) => wm.execute(KeyAction::SetLayout, Arg::UInt(u32::from(value % 4))),
        Op::ScratchClaim(value) => wm.execute(KeyAction::ScratchClaim, scratch_key(value)),
        Op::ScratchToggle(value) => wm.execute(KeyAction::ScratchToggle, scratch_key(value)),
        Op::ScratchRelease => wm.execute(KeyAction::ScratchRelease, Arg::None),
    }
}

/// Every client sits in exactly one monitor's list and focus stack, and the
/// selection is one of them.
fn bookkeeping_is_consistent(wm: &WindowManager<MockXConn>) -> bool {
    let mut listed = 0;
    for (index, monitor) in wm.monitors.iter().enumerate() {
        let mut clients = monitor.clients.clone();
        let mut stack = monitor.stack.clone();
        clients.sort_unstable();
        stack.sort_unstable();
        if clients != stack || clients.windows(2).any(|pair| pair[0] == pair[1]) {
            return false;
        }
        let owned = clients
            .iter()
            .all(|window| wm.clients.get(window).is_some_and(|client| client.monitor_index == index));
        if !owned || monitor.selected_client.is_some_and(|window| !monitor.stack.contains(&window)) {
            return false;
        }
        listed += clients.len();
    }
    listed == wm.clients.len()
}

fn scratch_keys_are_unique(wm: &WindowManager<MockXConn>) -> bool {
    let keys: Vec<i32> = wm
        .clients
        .values()
        .map(|client| client.scratch_key)
        .filter(|&key| key != 0)
        .collect();
    keys.len() == keys.iter().collect::<HashSet<_>>().len()
}

fn only_hidden_scratchpads_lack_tags(wm: &WindowManager<MockXConn>) -> bool {
    wm.clients
        .values()
        .all(|client| client.tags != 0 || client.scratch_key != 0)
}

#[quickcheck]
fn invariants_hold_across_operations(ops: Vec<Op>) -> bool {
    let mut wm = single_monitor();
    let mut next_window = 100;

    ops.into_iter().all(|op| {
        apply(&mut wm, op, &mut next_window).is_ok()
            && bookkeeping_is_consistent(&wm)
            && scratch_keys_are_unique(&wm)
            && only_hidden_scratchpads_lack_tags(&wm)
    })
}

#[quickcheck]
fn viewing_twice_is_viewing_once(value: u8) -> bool {
    let mut wm = single_monitor();
    map(&mut wm, 10, terminal());

    let snapshot = |wm: &WindowManager<MockXConn>| {
        let monitor = wm.selmon();
        (
            monitor.selected_tags(),
            monitor.selected_tags_index,
            monitor.pertag.current_tag,
            monitor.pertag.previous_tag,
        )
    };

    run(&mut wm, KeyAction::View, tag_of(value));
    let once = snapshot(&wm);
    run(&mut wm, KeyAction::View, tag_of(value));
    once == snapshot(&wm)
}
