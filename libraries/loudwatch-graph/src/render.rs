//! Painting the graph onto a pixel surface
//!
//! Rendering is split in a static background (painted once per geometry) and
//! a dynamic foreground painted on a copy of it for every video frame.

use crate::color::ArgbColor;
use crate::font::{draw_text, font_height, text_width};
use crate::layout::{Layout, Region};
use crate::settings::{GraphSettings, ScaleMode};
use loudwatch_core::HistoryIter;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Rect, Transform};

/// Latest values taken from the meter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphReadings {
    /// LUFS
    pub momentary: f64,
    /// LUFS
    pub short_term: f64,
    /// LUFS
    pub global: f64,
    /// LU
    pub range: f64,
    /// Per-channel true peak in dBTP; empty without the peak gauge
    pub true_peak_db: Vec<f64>,
}

/// Paints background and foreground layers
///
/// Implementations must be pure functions of their inputs.
pub trait GraphRenderer {
    /// Static layer: fill, scale labels, color bands, borders
    fn paint_background(&self, surface: &mut Pixmap, layout: &Layout, settings: &GraphSettings);

    /// Dynamic layer: header, history curve, scale lines, gauges
    ///
    /// `history` yields the stored measurements oldest first.
    fn paint_foreground(
        &self,
        surface: &mut Pixmap,
        layout: &Layout,
        settings: &GraphSettings,
        readings: &GraphReadings,
        history: HistoryIter<'_>,
    );
}

/// Raster renderer on top of `tiny-skia`
#[derive(Debug, Clone, Copy, Default)]
pub struct SkiaRenderer;

impl GraphRenderer for SkiaRenderer {
    fn paint_background(&self, surface: &mut Pixmap, layout: &Layout, settings: &GraphSettings) {
        surface.fill(settings.color_background.to_skia());

        scale_texts(surface, layout, settings);

        color_bands(surface, layout, settings, layout.graph);
        border(surface, settings, layout.graph);

        for gauge in layout.loudness_gauges() {
            color_bands(surface, layout, settings, gauge);
            border(surface, settings, gauge);
        }
        if let Some(gauge) = layout.peak_gauge {
            peak_color_bands(surface, settings, gauge);
            border(surface, settings, gauge);
        }
    }

    fn paint_foreground(
        &self,
        surface: &mut Pixmap,
        layout: &Layout,
        settings: &GraphSettings,
        readings: &GraphReadings,
        history: HistoryIter<'_>,
    ) {
        header(surface, layout, settings, readings);
        history_curve(surface, layout, settings, history);
        scale_lines(surface, layout, settings, layout.graph);

        if let Some(gauge) = layout.short_term_gauge {
            loudness_gauge(
                surface,
                layout,
                settings,
                gauge,
                readings.short_term,
                settings.color_gauge_short_term,
            );
            scale_lines(surface, layout, settings, gauge);
            gauge_label(surface, settings, gauge, "S");
        }
        if let Some(gauge) = layout.momentary_gauge {
            loudness_gauge(
                surface,
                layout,
                settings,
                gauge,
                readings.momentary,
                settings.color_gauge_momentary,
            );
            scale_lines(surface, layout, settings, gauge);
            gauge_label(surface, settings, gauge, "M");
        }
        if let Some(gauge) = layout.peak_gauge {
            peak_gauge(surface, settings, gauge, &readings.true_peak_db);
            gauge_label(surface, settings, gauge, "TP");
        }
    }
}

/// Maps dBTP to a gauge fraction: -60 dB is 0, 0 dB is 1
pub fn linearize_db(db: f64) -> f64 {
    1.0 - (-0.15 * db + 1.0).log10()
}

/// `+5`, `-12`, `0`
fn with_sign(value: i32) -> String {
    if value == 0 {
        "0".to_string()
    } else {
        format!("{:+}", value)
    }
}

fn paint(color: ArgbColor) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = false;
    paint
}

/// Fill a rectangle that may be given with a negative height
fn fill_rect(surface: &mut Pixmap, x: f64, y: f64, w: f64, h: f64, color: ArgbColor) {
    let (y, h) = if h < 0.0 { (y + h, -h) } else { (y, h) };
    if let Some(rect) = Rect::from_xywh(x as f32, y as f32, w as f32, h as f32) {
        surface.fill_rect(rect, &paint(color), Transform::identity(), None);
    }
}

/// Distance above the zero line for a loudness value
fn loudness_height(layout: &Layout, settings: &GraphSettings, loudness: f64) -> i32 {
    let relative = (loudness - f64::from(settings.scale_target)).max(f64::from(settings.scale_to));
    ((relative - f64::from(settings.scale_to)) * layout.scale_spacing + layout.scale_spacing - 2.0)
        as i32
}

fn scale_texts(surface: &mut Pixmap, layout: &Layout, settings: &GraphSettings) {
    let paint = paint(settings.color_scale);
    let text_h = f64::from(font_height(settings.font_size_scale));
    let step = usize::try_from(layout.scale_show_every).unwrap_or(1).max(1);

    for index in (0..layout.num_scales).step_by(step) {
        let mut value = settings.scale_from - index;
        if settings.scale_mode == ScaleMode::Absolute {
            value += settings.scale_target;
        }
        let text = with_sign(value);

        let x = f64::from(layout.scale.right()) - f64::from(text_width(&text, settings.font_size_scale));
        let line_y = f64::from(layout.scale.y + layout.scale_line_offset(index));
        let top = line_y + (text_h / 2.0 - 1.0) - text_h;
        draw_text(surface, &text, x as f32, top as f32, settings.font_size_scale, &paint);
    }
}

fn color_bands(surface: &mut Pixmap, layout: &Layout, settings: &GraphSettings, region: Region) {
    let band = |count: i32| (layout.scale_spacing * f64::from(count.abs())).ceil() - 1.0;
    let too_loud = band(settings.scale_from);
    let loudness_ok = band(2);
    let not_loud_enough = band(settings.scale_to);

    let x = f64::from(region.x + 1);
    let y = f64::from(region.y + 1);
    let w = f64::from(region.w - 2);
    fill_rect(surface, x, y, w, too_loud, settings.color_too_loud);
    fill_rect(surface, x, y + too_loud, w, loudness_ok, settings.color_loudness_ok);
    fill_rect(
        surface,
        x,
        y + too_loud + loudness_ok,
        w,
        not_loud_enough,
        settings.color_not_loud_enough,
    );
}

fn peak_color_bands(surface: &mut Pixmap, settings: &GraphSettings, region: Region) {
    let h = f64::from(region.h);
    let not_loud_enough = h * linearize_db(settings.gauge_peak_not_loud_enough_db);
    let loudness_ok = h * linearize_db(settings.gauge_peak_too_loud_db);

    let x = f64::from(region.x + 1);
    let y = f64::from(region.y);
    let w = f64::from(region.w - 2);
    fill_rect(surface, x, y + 1.0, w, h - loudness_ok, settings.color_too_loud);
    fill_rect(
        surface,
        x,
        y + 1.0 + h - not_loud_enough,
        w,
        not_loud_enough - loudness_ok,
        settings.color_loudness_ok,
    );
    fill_rect(surface, x, y + h - 1.0, w, -not_loud_enough, settings.color_not_loud_enough);
}

/// 1 px outline along the inside of `region`
fn border(surface: &mut Pixmap, settings: &GraphSettings, region: Region) {
    let color = settings.color_border;
    let (x, y, w, h) = (
        f64::from(region.x),
        f64::from(region.y),
        f64::from(region.w),
        f64::from(region.h),
    );
    fill_rect(surface, x, y, w, 1.0, color);
    fill_rect(surface, x, y + h - 1.0, w, 1.0, color);
    fill_rect(surface, x, y + 1.0, 1.0, h - 2.0, color);
    fill_rect(surface, x + w - 1.0, y + 1.0, 1.0, h - 2.0, color);
}

fn header(surface: &mut Pixmap, layout: &Layout, settings: &GraphSettings, readings: &GraphReadings) {
    let (unit, correction) = match settings.scale_mode {
        ScaleMode::Absolute => ("LUFS", 0.0),
        ScaleMode::Relative => ("LU", f64::from(settings.scale_target)),
    };
    let text = format!(
        "TARGET: {:+} LUFS | M: {:+7.2} {} | S: {:+7.2} {} | I: {:+7.2} {} | LRA: {:+7.2} LU",
        settings.scale_target,
        readings.momentary - correction,
        unit,
        readings.short_term - correction,
        unit,
        readings.global - correction,
        unit,
        readings.range,
    );

    draw_text(
        surface,
        &text,
        layout.header.x as f32,
        layout.header.y as f32,
        settings.font_size_header,
        &paint(settings.color_header),
    );
}

fn history_curve(surface: &mut Pixmap, layout: &Layout, settings: &GraphSettings, history: HistoryIter<'_>) {
    let zero_y = (layout.graph.bottom() - 1) as f32;
    let mut x = (layout.graph.x + 1) as f32;

    let mut path = PathBuilder::new();
    path.move_to(x, zero_y);
    for value in history {
        path.line_to(x, zero_y - loudness_height(layout, settings, value) as f32);
        x += 1.0;
    }
    x += 1.0;
    path.line_to(x, zero_y);
    path.close();

    if let Some(path) = path.finish() {
        let mut paint = paint(settings.color_graph);
        paint.anti_alias = true;
        surface.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }
}

fn scale_lines(surface: &mut Pixmap, layout: &Layout, settings: &GraphSettings, region: Region) {
    for index in 0..layout.num_scales {
        let y = region.y + layout.scale_line_offset(index);
        fill_rect(
            surface,
            f64::from(region.x + 1),
            f64::from(y),
            f64::from(region.w - 2),
            1.0,
            settings.color_scale_lines,
        );
    }
}

fn loudness_gauge(
    surface: &mut Pixmap,
    layout: &Layout,
    settings: &GraphSettings,
    region: Region,
    loudness: f64,
    color: ArgbColor,
) {
    let height = loudness_height(layout, settings, loudness).min(region.h - 2);
    fill_rect(
        surface,
        f64::from(region.x + 1),
        f64::from(region.bottom() - 1),
        f64::from(region.w - 2),
        -f64::from(height),
        color,
    );
}

fn peak_gauge(surface: &mut Pixmap, settings: &GraphSettings, region: Region, true_peak_db: &[f64]) {
    let Ok(channels) = i32::try_from(true_peak_db.len()) else {
        return;
    };
    if channels == 0 {
        return;
    }

    let bar_width = f64::from((region.w - 2) / channels);
    let max_height = f64::from(region.h - 2);
    let mut x = f64::from(region.x);
    for db in true_peak_db {
        let height = f64::from(region.h) * linearize_db(*db);
        let height = if height.is_nan() {
            0.0
        } else {
            height.min(max_height).max(0.0)
        };
        fill_rect(
            surface,
            x + 1.0,
            f64::from(region.bottom() - 1),
            bar_width,
            -height,
            settings.color_gauge_peak,
        );
        x += bar_width;
    }
}

fn gauge_label(surface: &mut Pixmap, settings: &GraphSettings, region: Region, label: &str) {
    let size = settings.font_size_header;
    let x = f64::from(region.x) + (f64::from(region.w) - f64::from(text_width(label, size))) / 2.0;
    let baseline = f64::from(region.bottom() - 5);
    let top = baseline - f64::from(font_height(size));
    draw_text(surface, label, x.floor() as f32, top as f32, size, &paint(settings.color_header));
}

#[cfg(test)]
mod tests {
    use super::*;
    use loudwatch_core::HistoryRing;

    fn rgba(surface: &Pixmap, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let pixel = surface.pixel(x, y).unwrap().demultiply();
        (pixel.red(), pixel.green(), pixel.blue(), pixel.alpha())
    }

    fn background(settings: &GraphSettings) -> (Pixmap, Layout) {
        let layout = Layout::compute(settings, 640, 480).unwrap();
        let mut surface = Pixmap::new(640, 480).unwrap();
        SkiaRenderer.paint_background(&mut surface, &layout, settings);
        (surface, layout)
    }

    #[test]
    fn test_linearize_db() {
        assert!((linearize_db(0.0) - 1.0).abs() < 1e-12);
        assert!((linearize_db(-60.0) - 0.0).abs() < 1e-12);
        assert!((linearize_db(-15.0) - (1.0 - 3.25f64.log10())).abs() < 1e-12);
        assert!(linearize_db(-20.0) < linearize_db(-2.5));
    }

    #[test]
    fn test_with_sign() {
        assert_eq!(with_sign(18), "+18");
        assert_eq!(with_sign(-36), "-36");
        assert_eq!(with_sign(0), "0");
    }

    #[test]
    fn test_background_regions() {
        let settings = GraphSettings::default();
        let (surface, layout) = background(&settings);

        // Outer fill
        assert_eq!(rgba(&surface, 0, 0), (0, 0, 0, 255));
        // Graph border corner
        assert_eq!(rgba(&surface, layout.graph.x as u32, layout.graph.y as u32), (0, 0xCC, 0, 255));
        // Top band inside the graph is too-loud
        assert_eq!(
            rgba(&surface, (layout.graph.x + 10) as u32, (layout.graph.y + 2) as u32),
            (0xDB, 0x66, 0x66, 255)
        );
        // Bottom band is not-loud-enough
        assert_eq!(
            rgba(&surface, (layout.graph.x + 10) as u32, (layout.graph.bottom() - 20) as u32),
            (0x66, 0x66, 0xDB, 255)
        );
        // Momentary gauge gets the same bands
        let gauge = layout.momentary_gauge.unwrap();
        assert_eq!(
            rgba(&surface, (gauge.x + 5) as u32, (gauge.y + 2) as u32),
            (0xDB, 0x66, 0x66, 255)
        );
    }

    #[test]
    fn test_foreground_fills_history_and_gauge() {
        let settings = GraphSettings {
            color_graph: ArgbColor::new(0xFFFF_FFFF),
            color_gauge_momentary: ArgbColor::new(0xFF00_00FF),
            ..GraphSettings::default()
        };
        let (mut surface, layout) = background(&settings);

        let mut ring = HistoryRing::new(layout.history_capacity()).unwrap();
        for _ in 0..layout.history_capacity() {
            ring.write(-23.0);
        }
        let readings = GraphReadings {
            momentary: -23.0,
            ..GraphReadings::default()
        };
        SkiaRenderer.paint_foreground(
            &mut surface,
            &layout,
            &settings,
            &readings,
            ring.read_chronological(),
        );

        // -23 LUFS at target -23 sits 36 spacings above the zero line
        let zero_y = layout.graph.bottom() - 1;
        let height = loudness_height(&layout, &settings, -23.0);
        assert!(height > 0);
        let inside = (zero_y - height / 2) as u32;
        assert_eq!(rgba(&surface, (layout.graph.x + 100) as u32, inside), (255, 255, 255, 255));

        let gauge = layout.momentary_gauge.unwrap();
        assert_eq!(
            rgba(&surface, (gauge.x + 3) as u32, (gauge.bottom() - 4) as u32),
            (0, 0, 255, 255)
        );
    }

    #[test]
    fn test_silence_draws_flat_curve() {
        let settings = GraphSettings::default();
        let layout = Layout::compute(&settings, 640, 480).unwrap();
        assert_eq!(
            loudness_height(&layout, &settings, f64::NEG_INFINITY),
            (layout.scale_spacing - 2.0) as i32
        );
    }
}
