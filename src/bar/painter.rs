use super::font::{Font, FontDraw};
use super::{BarSegment, Indicator};
use crate::errors::{WmResult, X11Error};
use std::collections::HashMap;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

/// Paints laid-out bar and tab segments. Text goes through Xft on a second
/// Xlib display, rectangles through the core protocol.
pub struct BarPainter {
    font: Font,
    display: *mut x11::xlib::Display,
    screen_number: i32,
    graphics_context: Gcontext,
    draws: HashMap<Window, FontDraw>,
}

impl BarPainter {
    pub fn new(
        connection: &RustConnection,
        screen: &Screen,
        screen_number: usize,
        font_name: &str,
    ) -> WmResult<Self> {
        let display = unsafe { x11::xlib::XOpenDisplay(std::ptr::null()) };
        if display.is_null() {
            return Err(X11Error::DisplayOpenFailed.into());
        }
        let font = Font::new(display, screen_number as i32, font_name)?;

        let graphics_context = connection.generate_id()?;
        connection.create_gc(
            graphics_context,
            screen.root,
            &CreateGCAux::new().graphics_exposures(0),
        )?;

        Ok(Self {
            font,
            display,
            screen_number: screen_number as i32,
            graphics_context,
            draws: HashMap::new(),
        })
    }

    pub fn font_height(&self) -> i32 {
        self.font.height()
    }

    pub fn text_width(&self, text: &str) -> i32 {
        self.font.text_width(text)
    }

    fn ensure_font_draw(&mut self, window: Window) -> WmResult<()> {
        if !self.draws.contains_key(&window) {
            let visual = unsafe { x11::xlib::XDefaultVisual(self.display, self.screen_number) };
            let colormap = unsafe { x11::xlib::XDefaultColormap(self.display, self.screen_number) };
            let draw = FontDraw::new(self.display, window as x11::xlib::Drawable, visual, colormap)?;
            self.draws.insert(window, draw);
        }
        Ok(())
    }

    fn fill(
        &self,
        connection: &RustConnection,
        window: Window,
        color: u32,
        rectangle: Rectangle,
    ) -> WmResult<()> {
        connection.change_gc(self.graphics_context, &ChangeGCAux::new().foreground(color))?;
        connection.poly_fill_rectangle(window, self.graphics_context, &[rectangle])?;
        Ok(())
    }

    pub fn paint(
        &mut self,
        connection: &RustConnection,
        window: Window,
        width: i32,
        height: i32,
        segments: &[BarSegment],
    ) -> WmResult<()> {
        self.ensure_font_draw(window)?;

        let background = segments
            .first()
            .map(|segment| segment.scheme.background)
            .unwrap_or(0);
        self.fill(
            connection,
            window,
            background,
            Rectangle {
                x: 0,
                y: 0,
                width: width.max(1) as u16,
                height: height.max(1) as u16,
            },
        )?;

        let font_height = self.font.height();
        let padding = font_height / 2;
        let text_y = (height - font_height) / 2 + self.font.ascent();
        let box_size = font_height / 6 + 2;

        for segment in segments {
            self.fill(
                connection,
                window,
                segment.scheme.background,
                Rectangle {
                    x: segment.x as i16,
                    y: 0,
                    width: segment.width.max(0) as u16,
                    height: height.max(1) as u16,
                },
            )?;

            let text = self.font.truncate(&segment.text, segment.width - padding);
            if let Some(draw) = self.draws.get(&window)
                && !text.is_empty()
            {
                draw.draw_text(&self.font, segment.scheme.foreground, segment.x + padding / 2, text_y, text);
            }

            if segment.indicator != Indicator::None {
                let rectangle = Rectangle {
                    x: (segment.x + box_size / 2) as i16,
                    y: (box_size / 2) as i16,
                    width: box_size as u16,
                    height: box_size as u16,
                };
                connection.change_gc(
                    self.graphics_context,
                    &ChangeGCAux::new().foreground(segment.scheme.foreground),
                )?;
                if segment.indicator == Indicator::Selected {
                    connection.poly_fill_rectangle(window, self.graphics_context, &[rectangle])?;
                } else {
                    connection.poly_rectangle(window, self.graphics_context, &[rectangle])?;
                }
            }
        }

        connection.flush()?;
        unsafe {
            x11::xlib::XFlush(self.display);
        }

        Ok(())
    }

    pub fn forget(&mut self, window: Window) {
        self.draws.remove(&window);
    }
}

impl Drop for BarPainter {
    fn drop(&mut self) {
        self.draws.clear();
    }
}
