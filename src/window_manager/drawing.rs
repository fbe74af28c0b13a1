use super::WindowManager;
use crate::bar::{BarContent, BarTheme, TabCell, TagCell, layout_bar, layout_tabs};
use crate::errors::WmResult;
use crate::layout::WindowGeometry;
use crate::status::{StatusSegment, StatusUpdate, parse_status, resolve_signal};
use crate::x::XConn;
use tracing::debug;

impl<X: XConn> WindowManager<X> {
    fn theme(&self) -> BarTheme<'_> {
        BarTheme {
            normal: self.config.scheme_normal,
            selected: self.config.scheme_selected,
            urgent: self.config.scheme_urgent,
            status_schemes: &self.config.status_schemes,
            padding: self.text_padding,
        }
    }

    /// Creates bar and tab windows for monitors that lack them.
    pub(super) fn update_bars(&mut self) -> WmResult<()> {
        for index in 0..self.monitors.len() {
            let monitor = &self.monitors[index];
            let screen = monitor.screen;

            if monitor.bar_window.is_none() {
                let bar = self.conn.create_bar(WindowGeometry::new(
                    screen.x_coordinate,
                    monitor.bar_y_position,
                    screen.width,
                    self.bar_height,
                ))?;
                self.monitors[index].bar_window = Some(bar);
            }

            let monitor = &self.monitors[index];
            if monitor.tab_window.is_none() {
                let tab = self.conn.create_bar(WindowGeometry::new(
                    screen.x_coordinate,
                    monitor.tab_y_position,
                    screen.width,
                    self.tab_height,
                ))?;
                self.monitors[index].tab_window = Some(tab);
            }
        }
        Ok(())
    }

    pub(super) fn draw_bars(&mut self) -> WmResult<()> {
        for index in 0..self.monitors.len() {
            self.draw_bar(index)?;
        }
        Ok(())
    }

    /// Paints the bar and, when shown, the tab bar of one monitor.
    pub(super) fn draw_bar(&mut self, monitor_index: usize) -> WmResult<()> {
        let monitor = &self.monitors[monitor_index];
        let is_selected_monitor = monitor_index == self.selected_monitor;

        if let Some(bar) = monitor.bar_window.filter(|_| monitor.show_bar) {
            let selected = monitor.selected_client.and_then(|window| self.clients.get(&window));
            let tags = self
                .config
                .tags
                .iter()
                .enumerate()
                .map(|(index, name)| {
                    let bit = 1 << index;
                    let on_tag = || {
                        monitor
                            .clients
                            .iter()
                            .filter_map(|window| self.clients.get(window))
                            .filter(move |client| client.tags & bit != 0)
                    };
                    TagCell {
                        name: name.clone(),
                        selected: monitor.selected_tags() & bit != 0,
                        occupied: on_tag().next().is_some(),
                        urgent: on_tag().any(|client| client.is_urgent),
                        holds_selection: selected.is_some_and(|client| client.tags & bit != 0),
                    }
                })
                .collect();

            let reserved_right = if is_selected_monitor {
                self.systray_width()
            } else {
                0
            };
            let content = BarContent {
                tags,
                layout_symbol: &monitor.layout_symbol,
                title: selected.map(|client| client.name.as_str()),
                status: &self.status,
                is_selected_monitor,
                reserved_right,
            };
            let width = monitor.screen.width;
            let segments = layout_bar(&content, width, &self.theme(), |text| self.conn.text_width(text));
            self.conn
                .draw_segments(bar, width, self.bar_height, &segments)?;
            self.bar_segments.insert(bar, segments);
        }

        let monitor = &self.monitors[monitor_index];
        if let Some(tab) = monitor.tab_window.filter(|_| monitor.show_tab) {
            let tiled = self.tiled_clients(monitor_index);
            let tabs: Vec<TabCell> = tiled
                .iter()
                .filter_map(|window| self.clients.get(window))
                .map(|client| TabCell {
                    title: &client.name,
                    selected: monitor.selected_client == Some(client.window),
                })
                .collect();
            let width = monitor.screen.width;
            let segments = layout_tabs(&tabs, width, &self.theme());
            self.conn
                .draw_segments(tab, width, self.tab_height, &segments)?;
            self.bar_segments.insert(tab, segments);
        }
        Ok(())
    }

    /// Re-reads the root window name: either new status text or a control
    /// message naming a signal.
    pub(super) fn update_status(&mut self) -> WmResult<()> {
        let raw = self.conn.root_name()?;

        match parse_status(&raw) {
            StatusUpdate::Text(segments) if segments.is_empty() => {
                self.status = vec![StatusSegment {
                    text: format!("tagwm-{}", env!("CARGO_PKG_VERSION")),
                    scheme: 0,
                }];
            }
            StatusUpdate::Text(segments) => self.status = segments,
            StatusUpdate::Signal { name, arg } => {
                match resolve_signal(&name, arg, &self.config.signals, self.config.tags.len()) {
                    Some((action, arg)) => return self.execute(action, arg),
                    None => debug!(%name, "ignoring unknown or mistyped signal"),
                }
                return Ok(());
            }
            StatusUpdate::Malformed => {
                debug!(%raw, "ignoring malformed status signal");
                return Ok(());
            }
        }

        self.draw_bar(self.selected_monitor)
    }
}
