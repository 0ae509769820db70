//! Text overlay rendering.
//!
//! Renders text to RGBA images that can be composited onto stored images.
//!
//! # Features
//!
//! - Hex color parsing (#RGB and #RRGGBB formats)
//! - Configurable font size, opacity and background fill
//! - Text rotation
//! - Embedded default font (DejaVu Sans Mono)

use ab_glyph::{Font, FontRef, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use std::sync::OnceLock;

use crate::constants::{DEFAULT_FONT_SIZE, MAX_FONT_SIZE};
use crate::transform::ImageError;

static DEFAULT_FONT: OnceLock<Option<FontRef<'static>>> = OnceLock::new();

/// DejaVu Sans Mono; monospace keeps width calculations predictable.
const EMBEDDED_FONT_DATA: &[u8] = include_bytes!("fonts/DejaVuSansMono.ttf");

fn default_font() -> Result<&'static FontRef<'static>, ImageError> {
    DEFAULT_FONT
        .get_or_init(|| FontRef::try_from_slice(EMBEDDED_FONT_DATA).ok())
        .as_ref()
        .ok_or_else(|| ImageError::render_failed("Failed to load embedded font"))
}

/// Parsed RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255)
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0)
    }
}

/// Options for text rendering.
#[derive(Debug, Clone)]
pub struct TextRenderOptions {
    /// The text to render.
    pub text: String,
    /// Font size in pixels.
    pub font_size: f32,
    /// Text color (RGB).
    pub color: Color,
    /// Opacity (0.0 to 1.0).
    pub opacity: f32,
    /// Rotation in degrees (clockwise). None means no rotation.
    pub rotation_degrees: Option<f32>,
    /// Opaque fill behind the text. None keeps the canvas transparent.
    pub background: Option<Color>,
}

impl Default for TextRenderOptions {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: DEFAULT_FONT_SIZE,
            color: Color::black(),
            opacity: 1.0,
            rotation_degrees: None,
            background: None,
        }
    }
}

fn hex_digit_error(_: std::num::ParseIntError) -> ImageError {
    ImageError::invalid_param("color", "Invalid hex digit")
}

/// Parse a hex color string (#RGB or #RRGGBB).
pub fn parse_hex_color(hex: &str) -> Result<Color, ImageError> {
    let hex = hex
        .strip_prefix('#')
        .ok_or_else(|| ImageError::invalid_param("color", "Color must start with '#'"))?;

    if !hex.is_ascii() {
        return Err(ImageError::invalid_param("color", "Invalid hex digit"));
    }

    match hex.len() {
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).map_err(hex_digit_error)?;
            let g = u8::from_str_radix(&hex[1..2], 16).map_err(hex_digit_error)?;
            let b = u8::from_str_radix(&hex[2..3], 16).map_err(hex_digit_error)?;
            // 0xF -> 0xFF, 0xA -> 0xAA
            Ok(Color::new(r * 17, g * 17, b * 17))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).map_err(hex_digit_error)?;
            let g = u8::from_str_radix(&hex[2..4], 16).map_err(hex_digit_error)?;
            let b = u8::from_str_radix(&hex[4..6], 16).map_err(hex_digit_error)?;
            Ok(Color::new(r, g, b))
        }
        n => Err(ImageError::invalid_param(
            "color",
            format!("Color must be #RGB or #RRGGBB format, got {} characters", n),
        )),
    }
}

/// Calculate the dimensions of rendered text.
///
/// Returns (width, height) in pixels.
pub fn measure_text(text: &str, font_size: f32) -> Result<(u32, u32), ImageError> {
    let font = default_font()?;
    let scaled_font = font.as_scaled(PxScale::from(font_size));

    let mut width = 0.0f32;
    let mut prev_glyph: Option<ab_glyph::GlyphId> = None;

    for c in text.chars() {
        let glyph_id = scaled_font.glyph_id(c);
        if let Some(prev) = prev_glyph {
            width += scaled_font.kern(prev, glyph_id);
        }
        width += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    let padding = 2;
    Ok((
        width.ceil() as u32 + padding,
        scaled_font.height().ceil() as u32 + padding,
    ))
}

/// Render text to an RGBA image.
pub fn render_text(options: &TextRenderOptions) -> Result<RgbaImage, ImageError> {
    if options.text.is_empty() {
        return Err(ImageError::render_failed("Cannot render empty text"));
    }
    if !(options.font_size > 0.0 && options.font_size <= MAX_FONT_SIZE) {
        return Err(ImageError::invalid_param(
            "font_size",
            format!("must be in (0, {}], got {}", MAX_FONT_SIZE, options.font_size),
        ));
    }
    if !options.opacity.is_finite() || !(0.0..=1.0).contains(&options.opacity) {
        return Err(ImageError::invalid_param(
            "opacity",
            format!("must be between 0.0 and 1.0, got {}", options.opacity),
        ));
    }

    let font = default_font()?;
    let scale = PxScale::from(options.font_size);
    let scaled_font = font.as_scaled(scale);

    let (width, height) = measure_text(&options.text, options.font_size)?;
    let (canvas_width, canvas_height) = (width.max(1), height.max(1));

    let mut image = match options.background {
        Some(bg) => RgbaImage::from_pixel(canvas_width, canvas_height, Rgba([bg.r, bg.g, bg.b, 255])),
        None => RgbaImage::new(canvas_width, canvas_height),
    };

    let alpha = (options.opacity * 255.0) as u8;
    let baseline_y = scaled_font.ascent();

    let mut cursor_x = 0.0f32;
    let mut prev_glyph: Option<ab_glyph::GlyphId> = None;

    for c in options.text.chars() {
        let glyph_id = scaled_font.glyph_id(c);

        if let Some(prev) = prev_glyph {
            cursor_x += scaled_font.kern(prev, glyph_id);
        }

        let glyph = glyph_id.with_scale_and_position(scale, ab_glyph::point(cursor_x, baseline_y));

        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();

            outlined.draw(|px, py, coverage| {
                let x = px as i32 + bounds.min.x as i32;
                let y = py as i32 + bounds.min.y as i32;

                if x >= 0 && y >= 0 && x < canvas_width as i32 && y < canvas_height as i32 {
                    let pixel = Rgba([
                        options.color.r,
                        options.color.g,
                        options.color.b,
                        (coverage * alpha as f32) as u8,
                    ]);
                    let existing = image.get_pixel(x as u32, y as u32);
                    let blended = blend_pixels(*existing, pixel);
                    image.put_pixel(x as u32, y as u32, blended);
                }
            });
        }

        cursor_x += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    if let Some(degrees) = options.rotation_degrees {
        image = rotate_image(&image, degrees);
    }

    Ok(image)
}

/// Porter-Duff "over" of two RGBA pixels.
fn blend_pixels(bottom: Rgba<u8>, top: Rgba<u8>) -> Rgba<u8> {
    let top_alpha = top[3] as f32 / 255.0;
    let bottom_alpha = bottom[3] as f32 / 255.0;

    let out_alpha = top_alpha + bottom_alpha * (1.0 - top_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend = |t: u8, b: u8| -> u8 {
        let t = t as f32 / 255.0;
        let b = b as f32 / 255.0;
        let result = (t * top_alpha + b * bottom_alpha * (1.0 - top_alpha)) / out_alpha;
        (result * 255.0) as u8
    };

    Rgba([
        blend(top[0], bottom[0]),
        blend(top[1], bottom[1]),
        blend(top[2], bottom[2]),
        (out_alpha * 255.0) as u8,
    ])
}

/// Rotate an image by the specified degrees (clockwise), growing the canvas
/// to fit the rotated bounding box.
fn rotate_image(image: &RgbaImage, degrees: f32) -> RgbaImage {
    let radians = -degrees.to_radians();
    let cos = radians.cos();
    let sin = radians.sin();

    let src_w = image.width() as f32;
    let src_h = image.height() as f32;
    let cx = src_w / 2.0;
    let cy = src_h / 2.0;

    let corners = [
        (-cx, -cy),
        (src_w - cx, -cy),
        (-cx, src_h - cy),
        (src_w - cx, src_h - cy),
    ];

    let (mut min_x, mut max_x) = (f32::INFINITY, f32::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f32::INFINITY, f32::NEG_INFINITY);
    for (x, y) in corners {
        let rx = x * cos - y * sin;
        let ry = x * sin + y * cos;
        min_x = min_x.min(rx);
        max_x = max_x.max(rx);
        min_y = min_y.min(ry);
        max_y = max_y.max(ry);
    }

    let dst_w = ((max_x - min_x).ceil() as u32).max(1);
    let dst_h = ((max_y - min_y).ceil() as u32).max(1);

    let mut rotated = RgbaImage::new(dst_w, dst_h);

    let dst_cx = dst_w as f32 / 2.0;
    let dst_cy = dst_h as f32 / 2.0;

    // Inverse rotation for sampling
    let inv_cos = (-radians).cos();
    let inv_sin = (-radians).sin();

    for dy in 0..dst_h {
        for dx in 0..dst_w {
            let rx = dx as f32 - dst_cx;
            let ry = dy as f32 - dst_cy;

            let sx = rx * inv_cos - ry * inv_sin + cx;
            let sy = rx * inv_sin + ry * inv_cos + cy;

            // Bilinear interpolation
            if sx >= 0.0 && sx < src_w - 1.0 && sy >= 0.0 && sy < src_h - 1.0 {
                let x0 = sx.floor() as u32;
                let y0 = sy.floor() as u32;
                let fx = sx - x0 as f32;
                let fy = sy - y0 as f32;

                let p00 = image.get_pixel(x0, y0);
                let p10 = image.get_pixel(x0 + 1, y0);
                let p01 = image.get_pixel(x0, y0 + 1);
                let p11 = image.get_pixel(x0 + 1, y0 + 1);

                let interpolate = |c: usize| -> u8 {
                    let v = p00[c] as f32 * (1.0 - fx) * (1.0 - fy)
                        + p10[c] as f32 * fx * (1.0 - fy)
                        + p01[c] as f32 * (1.0 - fx) * fy
                        + p11[c] as f32 * fx * fy;
                    v.clamp(0.0, 255.0) as u8
                };

                rotated.put_pixel(
                    dx,
                    dy,
                    Rgba([
                        interpolate(0),
                        interpolate(1),
                        interpolate(2),
                        interpolate(3),
                    ]),
                );
            }
        }
    }

    rotated
}
