//! Small software raster used to paint card faces. Coordinates are logical
//! units; the canvas scales them by its pixel ratio.

use fontdue::Font;
use image::{imageops, Rgba, RgbaImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Baseline {
    Top,
    Middle,
}

pub struct CardCanvas {
    image: RgbaImage,
    scale: f32,
}

impl CardCanvas {
    /// `side_px` is the physical edge length; `scale` maps logical to physical.
    pub fn new(side_px: u32, scale: f32) -> Self {
        Self {
            image: RgbaImage::new(side_px, side_px),
            scale,
        }
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    fn blend(&mut self, x: i64, y: i64, color: Rgba<u8>, coverage: f32) {
        if x < 0 || y < 0 || x >= self.image.width() as i64 || y >= self.image.height() as i64 {
            return;
        }
        let a = (color.0[3] as f32 / 255.0) * coverage.clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        let dst = self.image.get_pixel_mut(x as u32, y as u32);
        let da = dst.0[3] as f32 / 255.0;
        let out_a = a + da * (1.0 - a);
        for c in 0..3 {
            let s = color.0[c] as f32;
            let d = dst.0[c] as f32;
            let v = if out_a > 0.0 {
                (s * a + d * da * (1.0 - a)) / out_a
            } else {
                0.0
            };
            dst.0[c] = v.round().clamp(0.0, 255.0) as u8;
        }
        dst.0[3] = (out_a * 255.0).round() as u8;
    }

    /// Physical pixel span covered by a logical interval.
    fn span(&self, start: f32, len: f32, limit: u32) -> (u32, u32) {
        let a = (start * self.scale).round().clamp(0.0, limit as f32) as u32;
        let b = ((start + len) * self.scale).round().clamp(0.0, limit as f32) as u32;
        (a, b)
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba<u8>) {
        let (x0, x1) = self.span(x, w, self.image.width());
        let (y0, y1) = self.span(y, h, self.image.height());
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px as i64, py as i64, color, 1.0);
            }
        }
    }

    pub fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, line: f32, color: Rgba<u8>) {
        let line = self.min_line(line);
        self.fill_rect(x, y, w, line, color);
        self.fill_rect(x, y + h - line, w, line, color);
        self.fill_rect(x, y, line, h, color);
        self.fill_rect(x + w - line, y, line, h, color);
    }

    /// Lines thinner than one physical pixel would vanish.
    fn min_line(&self, line: f32) -> f32 {
        line.max(1.0 / self.scale)
    }

    /// Anti-aliased outline of a rounded rectangle.
    pub fn stroke_round_rect(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        radius: f32,
        line: f32,
        color: Rgba<u8>,
    ) {
        let s = self.scale;
        let half_line = self.min_line(line) * s / 2.0;
        let (cx, cy) = ((x + w / 2.0) * s, (y + h / 2.0) * s);
        let (hw, hh) = (w * s / 2.0, h * s / 2.0);
        let r = (radius * s).min(hw).min(hh);

        let x0 = ((x * s) - half_line - 1.0).floor() as i64;
        let x1 = (((x + w) * s) + half_line + 1.0).ceil() as i64;
        let y0 = ((y * s) - half_line - 1.0).floor() as i64;
        let y1 = (((y + h) * s) + half_line + 1.0).ceil() as i64;

        for py in y0..y1 {
            for px in x0..x1 {
                let qx = (px as f32 + 0.5 - cx).abs() - (hw - r);
                let qy = (py as f32 + 0.5 - cy).abs() - (hh - r);
                let outside = (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt();
                let sd = outside + qx.max(qy).min(0.0) - r;
                let coverage = half_line + 0.5 - sd.abs();
                if coverage > 0.0 {
                    self.blend(px, py, color, coverage);
                }
            }
        }
    }

    /// Draws `src` into the rect, scaled to cover it and center-cropped.
    pub fn draw_image_cover(&mut self, src: &RgbaImage, x: f32, y: f32, w: f32, h: f32) {
        let (x0, x1) = self.span(x, w, self.image.width());
        let (y0, y1) = self.span(y, h, self.image.height());
        let (dw, dh) = (x1.saturating_sub(x0), y1.saturating_sub(y0));
        if dw == 0 || dh == 0 || src.width() == 0 || src.height() == 0 {
            return;
        }

        let (crop_x, crop_y, crop_w, crop_h) = cover_crop(src.width(), src.height(), dw, dh);
        let cropped = imageops::crop_imm(src, crop_x, crop_y, crop_w, crop_h).to_image();
        let scaled = imageops::resize(&cropped, dw, dh, imageops::FilterType::Triangle);
        for (px, py, pixel) in scaled.enumerate_pixels() {
            self.blend((x0 + px) as i64, (y0 + py) as i64, *pixel, 1.0);
        }
    }

    /// Logical width of `text` at `size` logical units.
    pub fn measure_text(&self, font: Option<&Font>, text: &str, size: f32) -> f32 {
        let Some(font) = font else {
            return 0.0;
        };
        let px = size * self.scale;
        text.chars().map(|ch| font.metrics(ch, px).advance_width).sum::<f32>() / self.scale
    }

    pub fn fill_text(
        &mut self,
        font: Option<&Font>,
        text: &str,
        size: f32,
        x: f32,
        y: f32,
        align: Align,
        baseline: Baseline,
        color: Rgba<u8>,
    ) {
        let Some(font) = font else {
            return;
        };
        let px = size * self.scale;
        let width = self.measure_text(Some(font), text, size) * self.scale;
        let (ascent, descent) = font
            .horizontal_line_metrics(px)
            .map(|m| (m.ascent, m.descent))
            .unwrap_or((px * 0.8, -px * 0.2));

        let mut pen_x = match align {
            Align::Left => x * self.scale,
            Align::Center => x * self.scale - width / 2.0,
            Align::Right => x * self.scale - width,
        };
        let base_y = match baseline {
            Baseline::Top => y * self.scale + ascent,
            Baseline::Middle => y * self.scale + (ascent + descent) / 2.0,
        };

        for ch in text.chars() {
            let (metrics, bitmap) = font.rasterize(ch, px);
            let gx = (pen_x + metrics.xmin as f32).round() as i64;
            let gy = (base_y - (metrics.height as i32 + metrics.ymin) as f32).round() as i64;
            for row in 0..metrics.height {
                for col in 0..metrics.width {
                    let coverage = bitmap[row * metrics.width + col] as f32 / 255.0;
                    if coverage > 0.0 {
                        self.blend(gx + col as i64, gy + row as i64, color, coverage);
                    }
                }
            }
            pen_x += metrics.advance_width;
        }
    }
}

/// Source sub-rectangle with the destination's aspect, centered in the source.
pub fn cover_crop(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> (u32, u32, u32, u32) {
    let src_aspect = src_w as f32 / src_h as f32;
    let dst_aspect = dst_w as f32 / dst_h as f32;
    if src_aspect > dst_aspect {
        let w = ((src_h as f32 * dst_aspect).round() as u32).clamp(1, src_w);
        ((src_w - w) / 2, 0, w, src_h)
    } else {
        let h = ((src_w as f32 / dst_aspect).round() as u32).clamp(1, src_h);
        (0, (src_h - h) / 2, src_w, h)
    }
}

/// Parses `#rgb`, `#rrggbb` or `#rrggbbaa`.
pub fn parse_hex_color(s: &str) -> Option<Rgba<u8>> {
    let hex = s.strip_prefix('#')?;
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        3 => {
            let mut out = [0u8, 0, 0, 255];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                out[i] = v * 17;
            }
            Some(Rgba(out))
        }
        6 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, 255])),
        8 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, byte(6)?])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_rect_scales_logical_units() {
        let mut c = CardCanvas::new(20, 2.0);
        c.fill_rect(1.0, 1.0, 2.0, 2.0, Rgba([255, 0, 0, 255]));
        let img = c.into_image();
        assert_eq!(img.get_pixel(2, 2), &Rgba([255, 0, 0, 255]));
        assert_eq!(img.get_pixel(5, 5), &Rgba([255, 0, 0, 255]));
        assert_eq!(img.get_pixel(6, 6), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn translucent_fill_blends_over_opaque() {
        let mut c = CardCanvas::new(4, 1.0);
        c.fill_rect(0.0, 0.0, 4.0, 4.0, Rgba([0, 0, 0, 255]));
        c.fill_rect(0.0, 0.0, 4.0, 4.0, Rgba([255, 255, 255, 128]));
        let p = c.into_image().get_pixel(1, 1).0;
        assert_eq!(p[3], 255);
        assert!((126..=130).contains(&p[0]), "got {p:?}");
    }

    #[test]
    fn cover_crop_centers_wide_sources() {
        // 320x180 into a square: keep the middle 180 columns.
        assert_eq!(cover_crop(320, 180, 100, 100), (70, 0, 180, 180));
        // Tall source into 16:9: keep the middle band.
        assert_eq!(cover_crop(160, 320, 160, 90), (0, 115, 160, 90));
    }

    #[test]
    fn draw_image_cover_fills_the_whole_rect() {
        let src = RgbaImage::from_pixel(32, 8, Rgba([0, 200, 0, 255]));
        let mut c = CardCanvas::new(16, 1.0);
        c.draw_image_cover(&src, 4.0, 4.0, 8.0, 8.0);
        let img = c.into_image();
        assert_eq!(img.get_pixel(4, 4).0[1], 200);
        assert_eq!(img.get_pixel(11, 11).0[1], 200);
        assert_eq!(img.get_pixel(12, 12).0[3], 0);
    }

    #[test]
    fn round_rect_outline_leaves_interior_empty() {
        let mut c = CardCanvas::new(40, 1.0);
        c.stroke_round_rect(5.0, 10.0, 30.0, 12.0, 6.0, 1.0, Rgba([255, 255, 255, 255]));
        let img = c.into_image();
        assert!(img.get_pixel(20, 10).0[3] > 0, "top edge drawn");
        assert_eq!(img.get_pixel(20, 16).0[3], 0, "interior untouched");
        assert_eq!(img.get_pixel(5, 10).0[3], 0, "corner is rounded off");
    }

    #[test]
    fn text_without_font_is_a_no_op() {
        let mut c = CardCanvas::new(8, 1.0);
        assert_eq!(c.measure_text(None, "HELLO", 6.0), 0.0);
        c.fill_text(None, "HELLO", 6.0, 0.0, 0.0, Align::Left, Baseline::Top, Rgba([255; 4]));
        assert!(c.into_image().pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn hex_colors_parse() {
        assert_eq!(parse_hex_color("#111"), Some(Rgba([17, 17, 17, 255])));
        assert_eq!(parse_hex_color("#0A0A0A"), Some(Rgba([10, 10, 10, 255])));
        assert_eq!(parse_hex_color("#ff000080"), Some(Rgba([255, 0, 0, 128])));
        assert_eq!(parse_hex_color("0A0A0A"), None);
        assert_eq!(parse_hex_color("#zzzzzz"), None);
    }
}
