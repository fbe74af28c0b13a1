pub mod font;
pub mod painter;

pub use painter::BarPainter;

use crate::ColorScheme;
use crate::status::StatusSegment;
use serde::Deserialize;

/// What a button press landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ClickRegion {
    TagBar,
    LayoutSymbol,
    StatusText,
    WindowTitle,
    TabBar,
    ClientWindow,
    RootWindow,
}

/// Small square drawn in the corner of a tag cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    None,
    Occupied,
    /// The tag holds the monitor's selected client.
    Selected,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarSegment {
    pub x: i32,
    pub width: i32,
    pub text: String,
    pub scheme: ColorScheme,
    pub indicator: Indicator,
    pub region: ClickRegion,
    /// Tag index for tag cells, client position for tabs, otherwise 0.
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct TagCell {
    pub name: String,
    pub selected: bool,
    pub occupied: bool,
    pub urgent: bool,
    pub holds_selection: bool,
}

#[derive(Debug, Clone)]
pub struct BarContent<'a> {
    pub tags: Vec<TagCell>,
    pub layout_symbol: &'a str,
    pub title: Option<&'a str>,
    pub status: &'a [StatusSegment],
    pub is_selected_monitor: bool,
    /// Pixels kept free at the right edge, used by the systray.
    pub reserved_right: i32,
}

#[derive(Debug, Clone)]
pub struct BarTheme<'a> {
    pub normal: ColorScheme,
    pub selected: ColorScheme,
    pub urgent: ColorScheme,
    pub status_schemes: &'a [ColorScheme],
    /// Horizontal padding added around every text cell.
    pub padding: i32,
}

impl BarTheme<'_> {
    fn status_scheme(&self, index: usize) -> ColorScheme {
        self.status_schemes
            .get(index)
            .or(self.status_schemes.last())
            .copied()
            .unwrap_or(self.normal)
    }
}

/// Lays the bar out left to right: tags, layout symbol, selected title,
/// and right-aligned status text on the selected monitor.
pub fn layout_bar<F>(content: &BarContent, width: i32, theme: &BarTheme, text_width: F) -> Vec<BarSegment>
where
    F: Fn(&str) -> i32,
{
    let cell_width = |text: &str| text_width(text) + theme.padding;
    let mut segments = Vec::new();
    let mut x = 0;

    for (index, tag) in content.tags.iter().enumerate() {
        let width = cell_width(&tag.name);
        let scheme = if tag.urgent {
            theme.urgent
        } else if tag.selected {
            theme.selected
        } else {
            theme.normal
        };
        let indicator = match (tag.occupied, tag.holds_selection) {
            (true, true) => Indicator::Selected,
            (true, false) => Indicator::Occupied,
            _ => Indicator::None,
        };

        segments.push(BarSegment {
            x,
            width,
            text: tag.name.clone(),
            scheme,
            indicator,
            region: ClickRegion::TagBar,
            index,
        });
        x += width;
    }

    let symbol_width = cell_width(content.layout_symbol);
    segments.push(BarSegment {
        x,
        width: symbol_width,
        text: content.layout_symbol.to_string(),
        scheme: theme.normal,
        indicator: Indicator::None,
        region: ClickRegion::LayoutSymbol,
        index: 0,
    });
    x += symbol_width;

    let right_edge = width - content.reserved_right;
    let mut status_segments = Vec::new();
    if content.is_selected_monitor && !content.status.is_empty() {
        let total: i32 = content
            .status
            .iter()
            .map(|segment| text_width(&segment.text))
            .sum::<i32>()
            + theme.padding;
        let mut status_x = (right_edge - total).max(x);
        status_x += theme.padding / 2;

        for segment in content.status {
            let width = text_width(&segment.text);
            status_segments.push(BarSegment {
                x: status_x,
                width,
                text: segment.text.clone(),
                scheme: theme.status_scheme(segment.scheme),
                indicator: Indicator::None,
                region: ClickRegion::StatusText,
                index: 0,
            });
            status_x += width;
        }
    }

    let status_start = status_segments
        .first()
        .map(|segment| segment.x - theme.padding / 2)
        .unwrap_or(right_edge);
    let title_width = status_start - x;
    if title_width > 0 {
        let (text, scheme) = match content.title {
            Some(title) if content.is_selected_monitor => (title.to_string(), theme.selected),
            Some(title) => (title.to_string(), theme.normal),
            None => (String::new(), theme.normal),
        };
        segments.push(BarSegment {
            x,
            width: title_width,
            text,
            scheme,
            indicator: Indicator::None,
            region: ClickRegion::WindowTitle,
            index: 0,
        });
    }

    segments.extend(status_segments);
    segments
}

#[derive(Debug, Clone)]
pub struct TabCell<'a> {
    pub title: &'a str,
    pub selected: bool,
}

/// Splits the tab bar evenly between the visible tiled clients.
pub fn layout_tabs(tabs: &[TabCell], width: i32, theme: &BarTheme) -> Vec<BarSegment> {
    if tabs.is_empty() {
        return Vec::new();
    }

    let count = tabs.len() as i32;
    let even = width / count;
    let remainder = width % count;
    let mut x = 0;

    tabs.iter()
        .enumerate()
        .map(|(index, tab)| {
            let width = even + i32::from((index as i32) < remainder);
            let segment = BarSegment {
                x,
                width,
                text: tab.title.to_string(),
                scheme: if tab.selected { theme.selected } else { theme.normal },
                indicator: Indicator::None,
                region: ClickRegion::TabBar,
                index,
            };
            x += width;
            segment
        })
        .collect()
}

pub fn segment_at(segments: &[BarSegment], x: i32) -> Option<&BarSegment> {
    segments
        .iter()
        .find(|segment| x >= segment.x && x < segment.x + segment.width)
}
