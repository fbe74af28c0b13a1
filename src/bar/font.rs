use crate::errors::{WmResult, X11Error};
use std::ffi::CString;
use x11::xft::{XftColor, XftDraw, XftDrawStringUtf8, XftFont, XftFontOpenName};
use x11::xlib::{Colormap, Display, Drawable, Visual};
use x11::xrender::XRenderColor;

pub struct Font {
    xft_font: *mut XftFont,
    display: *mut Display,
}

impl Font {
    pub fn new(display: *mut Display, screen: i32, font_name: &str) -> WmResult<Self> {
        let font_name_cstr = CString::new(font_name)
            .map_err(|_| X11Error::FontLoadFailed(font_name.to_string()))?;

        let xft_font = unsafe { XftFontOpenName(display, screen, font_name_cstr.as_ptr()) };

        if xft_font.is_null() {
            return Err(X11Error::FontLoadFailed(font_name.to_string()).into());
        }

        Ok(Font { xft_font, display })
    }

    pub fn height(&self) -> i32 {
        unsafe { (*self.xft_font).height }
    }

    pub fn ascent(&self) -> i32 {
        unsafe { (*self.xft_font).ascent }
    }

    pub fn text_width(&self, text: &str) -> i32 {
        unsafe {
            let mut extents = std::mem::zeroed();
            x11::xft::XftTextExtentsUtf8(
                self.display,
                self.xft_font,
                text.as_ptr(),
                text.len() as i32,
                &mut extents,
            );
            extents.xOff as i32
        }
    }

    /// Longest prefix of `text` that fits in `max_width` pixels.
    pub fn truncate<'a>(&self, text: &'a str, max_width: i32) -> &'a str {
        if self.text_width(text) <= max_width {
            return text;
        }

        let mut end = text.len();
        while end > 0 {
            end -= 1;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            if self.text_width(&text[..end]) <= max_width {
                break;
            }
        }
        &text[..end]
    }
}

impl Drop for Font {
    fn drop(&mut self) {
        unsafe {
            if !self.xft_font.is_null() {
                x11::xft::XftFontClose(self.display, self.xft_font);
            }
        }
    }
}

pub struct FontDraw {
    xft_draw: *mut XftDraw,
}

impl FontDraw {
    pub fn new(
        display: *mut Display,
        drawable: Drawable,
        visual: *mut Visual,
        colormap: Colormap,
    ) -> WmResult<Self> {
        let xft_draw = unsafe { x11::xft::XftDrawCreate(display, drawable, visual, colormap) };

        if xft_draw.is_null() {
            return Err(X11Error::DrawCreateFailed.into());
        }

        Ok(FontDraw { xft_draw })
    }

    pub fn draw_text(&self, font: &Font, color: u32, x: i32, y: i32, text: &str) {
        let red = ((color >> 16) & 0xFF) as u16;
        let green = ((color >> 8) & 0xFF) as u16;
        let blue = (color & 0xFF) as u16;

        let render_color = XRenderColor {
            red: red << 8 | red,
            green: green << 8 | green,
            blue: blue << 8 | blue,
            alpha: 0xFFFF,
        };

        let mut xft_color: XftColor = unsafe { std::mem::zeroed() };

        unsafe {
            x11::xft::XftColorAllocValue(
                x11::xft::XftDrawDisplay(self.xft_draw),
                x11::xft::XftDrawVisual(self.xft_draw),
                x11::xft::XftDrawColormap(self.xft_draw),
                &render_color,
                &mut xft_color,
            );

            XftDrawStringUtf8(
                self.xft_draw,
                &xft_color,
                font.xft_font,
                x,
                y,
                text.as_ptr(),
                text.len() as i32,
            );

            x11::xft::XftColorFree(
                x11::xft::XftDrawDisplay(self.xft_draw),
                x11::xft::XftDrawVisual(self.xft_draw),
                x11::xft::XftDrawColormap(self.xft_draw),
                &mut xft_color,
            );
        }
    }
}

impl Drop for FontDraw {
    fn drop(&mut self) {
        unsafe {
            if !self.xft_draw.is_null() {
                x11::xft::XftDrawDestroy(self.xft_draw);
            }
        }
    }
}
