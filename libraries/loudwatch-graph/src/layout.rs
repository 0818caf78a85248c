//! Region geometry
//!
//! ```text
//!  gutter
//!  ┌──────┬───────┬──────────────── header ───────────────┬───────┬───────┐
//!  │ peak │ scale │                graph                  │ short │ mom.  │
//!  │ gauge│ labels│                                       │ term  │ gauge │
//!  └──────┴───────┴───────────────────────────────────────┴───────┴───────┘
//! ```
//!
//! Every enabled gauge reserves its width plus one gutter. The peak gauge sits
//! left of the scale, the loudness gauges right of the graph.

use crate::error::{GraphError, Result};
use crate::font::font_height;
use crate::settings::GraphSettings;

/// An axis-aligned rectangle in whole pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Region {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }
}

fn in_range(value: Option<i32>, what: &str) -> Result<i32> {
    value.ok_or_else(|| GraphError::Geometry(format!("{} overflows the pixel range", what)))
}

/// All regions for one output size and settings
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub header: Region,
    pub scale: Region,
    pub graph: Region,
    pub peak_gauge: Option<Region>,
    pub short_term_gauge: Option<Region>,
    pub momentary_gauge: Option<Region>,
    /// Scale lines from `scale_from` down to `scale_to`, inclusive
    pub num_scales: i32,
    /// Vertical distance between two scale lines
    pub scale_spacing: f64,
    /// Label every n-th scale line so labels do not overlap
    pub scale_show_every: i32,
}

impl Layout {
    /// Compute the geometry for a `width` x `height` frame
    ///
    /// # Errors
    /// Returns error if the frame is empty, a size or position does not fit
    /// in `i32`, or the graph would be narrower than 3 px or the scale
    /// shorter than 1 px.
    pub fn compute(settings: &GraphSettings, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GraphError::Geometry(format!(
                "video size {}x{} is empty",
                width, height
            )));
        }
        if settings.scale_from <= settings.scale_to {
            return Err(GraphError::InvalidSettings(format!(
                "scale-from ({}) must be above scale-to ({})",
                settings.scale_from, settings.scale_to
            )));
        }

        let to_px = |value: u32| {
            i32::try_from(value)
                .map_err(|_| GraphError::Geometry(format!("size {} px is out of range", value)))
        };
        let width_px = to_px(width)?;
        let height_px = to_px(height)?;
        let gutter = to_px(settings.gutter)?;
        let scale_w = to_px(settings.scale_w)?;
        let gauge_w = to_px(settings.gauge_w)?;

        let gauge_slot = in_range(gauge_w.checked_add(gutter), "gauge width")?;
        let left_reserved = in_range(
            gauge_slot.checked_mul(to_px(settings.gauges_left())?),
            "left gauges",
        )?;
        let right_reserved = in_range(
            gauge_slot.checked_mul(to_px(settings.gauges_right())?),
            "right gauges",
        )?;

        let header_h = font_height(settings.font_size_header);
        let scale_x = in_range(gutter.checked_add(left_reserved), "scale position")?;
        let graph_x = in_range(
            scale_x
                .checked_add(scale_w)
                .and_then(|x| x.checked_add(gutter)),
            "graph position",
        )?;
        let header_w = in_range(
            width_px
                .checked_sub(graph_x)
                .and_then(|w| w.checked_sub(gutter)),
            "header width",
        )?;
        let header = Region::new(graph_x, gutter, header_w, header_h);

        let scale_y = in_range(
            gutter
                .checked_add(header_h)
                .and_then(|y| y.checked_add(gutter)),
            "scale position",
        )?;
        let scale_h = in_range(
            gutter
                .checked_mul(3)
                .and_then(|gutters| height_px.checked_sub(header_h)?.checked_sub(gutters)),
            "scale height",
        )?;
        let scale = Region::new(scale_x, scale_y, scale_w, scale_h);

        let graph_w = in_range(
            width_px
                .checked_sub(graph_x)
                .and_then(|w| w.checked_sub(gutter))
                .and_then(|w| w.checked_sub(right_reserved)),
            "graph width",
        )?;
        let graph = Region::new(graph_x, scale.y, graph_w, scale.h);

        if graph.w < 3 {
            return Err(GraphError::Geometry(format!(
                "graph would be {} px wide in a {}x{} frame",
                graph.w, width, height
            )));
        }
        if scale.h < 1 {
            return Err(GraphError::Geometry(format!(
                "graph would be {} px high in a {}x{} frame",
                scale.h, width, height
            )));
        }

        let gauge_at = |x: i32| Region::new(x, scale.y, gauge_w, scale.h);
        let peak_gauge = settings.gauge_peak.then(|| gauge_at(gutter));
        let mut next_right = graph.right() + gutter;
        let short_term_gauge = settings.gauge_short_term.then(|| {
            let region = gauge_at(next_right);
            next_right += gauge_slot;
            region
        });
        let momentary_gauge = settings.gauge_momentary.then(|| gauge_at(next_right));

        let num_scales = in_range(
            settings
                .scale_from
                .checked_sub(settings.scale_to)
                .and_then(|n| n.checked_add(1)),
            "scale range",
        )?;
        let scale_spacing = f64::from(scale.h) / (f64::from(num_scales) + 1.0);
        let scale_show_every =
            ((f64::from(font_height(settings.font_size_scale)) / scale_spacing).ceil() as i32).max(1);

        Ok(Self {
            width,
            height,
            header,
            scale,
            graph,
            peak_gauge,
            short_term_gauge,
            momentary_gauge,
            num_scales,
            scale_spacing,
            scale_show_every,
        })
    }

    /// One history slot per graph pixel column inside the border
    pub fn history_capacity(&self) -> usize {
        (self.graph.w - 2).max(1) as usize
    }

    /// Offset of scale line `index` below the top of a region
    pub fn scale_line_offset(&self, index: i32) -> i32 {
        (f64::from(index) * self.scale_spacing + self.scale_spacing).ceil() as i32
    }

    /// Loudness gauges in drawing order
    pub fn loudness_gauges(&self) -> impl Iterator<Item = Region> + '_ {
        self.short_term_gauge.into_iter().chain(self.momentary_gauge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_at_640x480() {
        let layout = Layout::compute(&GraphSettings::default(), 640, 480).unwrap();

        assert_eq!(layout.header, Region::new(30, 5, 605, 9));
        assert_eq!(layout.scale, Region::new(5, 19, 20, 456));
        assert_eq!(layout.graph, Region::new(30, 19, 580, 456));
        assert_eq!(layout.momentary_gauge, Some(Region::new(615, 19, 20, 456)));
        assert_eq!(layout.short_term_gauge, None);
        assert_eq!(layout.peak_gauge, None);

        assert_eq!(layout.num_scales, 55);
        assert!((layout.scale_spacing - 456.0 / 56.0).abs() < 1e-12);
        assert_eq!(layout.scale_show_every, 1);
        assert_eq!(layout.history_capacity(), 578);
    }

    #[test]
    fn test_all_gauges() {
        let settings = GraphSettings {
            gauge_short_term: true,
            gauge_momentary: true,
            gauge_peak: true,
            ..GraphSettings::default()
        };
        let layout = Layout::compute(&settings, 640, 480).unwrap();

        assert_eq!(layout.peak_gauge, Some(Region::new(5, 19, 20, 456)));
        assert_eq!(layout.scale.x, 30);
        assert_eq!(layout.header.x, 55);
        assert_eq!(layout.graph.x, 55);
        assert_eq!(layout.graph.w, 640 - 55 - 5 - 50);
        assert_eq!(layout.short_term_gauge.unwrap().x, layout.graph.right() + 5);
        assert_eq!(layout.momentary_gauge.unwrap().right(), 640 - 5);
        assert_eq!(layout.loudness_gauges().count(), 2);
    }

    #[test]
    fn test_small_frame_shows_fewer_labels() {
        let layout = Layout::compute(&GraphSettings::default(), 320, 120).unwrap();
        // 120 - 9 - 15 = 96 px for 55 lines
        assert_eq!(layout.scale.h, 96);
        assert_eq!(layout.scale_show_every, 4);
    }

    #[test]
    fn test_degenerate_geometry_rejected() {
        let settings = GraphSettings::default();
        assert!(matches!(
            Layout::compute(&settings, 0, 480),
            Err(GraphError::Geometry(_))
        ));
        assert!(matches!(
            Layout::compute(&settings, 60, 480),
            Err(GraphError::Geometry(_))
        ));
        assert!(matches!(
            Layout::compute(&settings, 640, 24),
            Err(GraphError::Geometry(_))
        ));
    }

    fn assert_geometry_error(settings: GraphSettings) {
        assert!(matches!(
            Layout::compute(&settings, 640, 480),
            Err(GraphError::Geometry(_))
        ));
    }

    #[test]
    fn test_huge_gutter_rejected() {
        assert_geometry_error(GraphSettings {
            gutter: 1_000_000_000,
            ..GraphSettings::default()
        });
    }

    #[test]
    fn test_huge_gauge_rejected() {
        assert_geometry_error(GraphSettings {
            gauge_w: i32::MAX as u32,
            gauge_peak: true,
            ..GraphSettings::default()
        });
    }

    #[test]
    fn test_full_i32_scale_range_rejected() {
        assert_geometry_error(GraphSettings {
            scale_from: i32::MAX,
            scale_to: i32::MIN,
            ..GraphSettings::default()
        });
    }

    #[test]
    fn test_huge_header_font_rejected() {
        assert_geometry_error(GraphSettings {
            font_size_header: 1e12,
            ..GraphSettings::default()
        });
    }

    #[test]
    fn test_scale_line_offsets() {
        let layout = Layout::compute(&GraphSettings::default(), 640, 480).unwrap();
        assert_eq!(layout.scale_line_offset(0), 9);
        assert_eq!(layout.scale_line_offset(54), 448);
    }
}
