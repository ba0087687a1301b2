//! Scene assembly: section views to a flat list of shaded quads.

use bytemuck::{Pod, Zeroable};

use crate::params::{Color, RenderConfig};
use crate::section::SectionView;

const SHAPE_BOX: f32 = 0.0;
const SHAPE_ELLIPSE: f32 = 1.0;

/// Inner margin between panel edge and equalizer bars (logical pixels)
const BAR_MARGIN: f32 = 10.0;
/// Gap between the bar baseline and the panel bottom
const BAR_BASELINE: f32 = 14.0;
/// Height of a bar at zero level
const BAR_MIN_HEIGHT: f32 = 4.0;
const BAR_GAP: f32 = 2.0;
const BAR_CORNER_RADIUS: f32 = 4.0;
const BAR_COLOR: [u8; 3] = [255, 240, 180];

const GLOW_WIDTH: f32 = 3.0;
const GLOW_COLOR: [u8; 4] = [255, 220, 120, 160];

/// One quad instance as laid out in the vertex buffer
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct QuadInstance {
    /// x, y, width, height (logical pixels, top-left origin)
    pub rect: [f32; 4],
    /// Straight (non-premultiplied) RGBA in [0, 1]
    pub color: [f32; 4],
    /// corner radius, stroke width (0 = filled), shape kind, unused
    pub shape: [f32; 4],
}

impl QuadInstance {
    fn filled(rect: [f32; 4], color: [f32; 4], corner_radius: f32) -> Self {
        Self {
            rect,
            color,
            shape: [corner_radius, 0.0, SHAPE_BOX, 0.0],
        }
    }

    fn outline(rect: [f32; 4], color: [f32; 4], corner_radius: f32, width: f32) -> Self {
        Self {
            rect,
            color,
            shape: [corner_radius, width, SHAPE_BOX, 0.0],
        }
    }

    fn ellipse(center: [f32; 2], size: [f32; 2], color: [f32; 4]) -> Self {
        Self {
            rect: [
                center[0] - size[0] * 0.5,
                center[1] - size[1] * 0.5,
                size[0],
                size[1],
            ],
            color,
            shape: [0.0, 0.0, SHAPE_ELLIPSE, 0.0],
        }
    }
}

fn rgba8(r: f32, g: f32, b: f32, a: f32) -> [f32; 4] {
    [
        r.clamp(0.0, 255.0) / 255.0,
        g.clamp(0.0, 255.0) / 255.0,
        b.clamp(0.0, 255.0) / 255.0,
        a.clamp(0.0, 255.0) / 255.0,
    ]
}

/// Linear remap of `value` from [in_lo, in_hi] to [out_lo, out_hi]
fn map_range(value: f32, in_lo: f32, in_hi: f32, out_lo: f32, out_hi: f32) -> f32 {
    out_lo + (value - in_lo) * (out_hi - out_lo) / (in_hi - in_lo)
}

/// Slowly breathing lights along the bottom of the window
pub fn ambient_lights(frame: u64, config: &RenderConfig) -> Vec<QuadInstance> {
    let count = config.ambient_lights;
    let width = config.window_width as f32;
    let height = config.window_height as f32;

    (0..count)
        .map(|i| {
            let x = (i as f32 + 0.5) * (width / count as f32);
            let y = height * 0.85;
            let breathe = (frame as f32 * 0.01 + i as f32).sin() * 20.0;
            QuadInstance::ellipse(
                [x, y],
                [180.0 + breathe, 60.0],
                rgba8(40.0 + i as f32 * 5.0, 40.0, 60.0, 30.0),
            )
        })
        .collect()
}

/// Panel, equalizer bars and (when active) glow outline of one section
pub fn section_quads(view: &SectionView<'_>, config: &RenderConfig, out: &mut Vec<QuadInstance>) {
    let origin = view.geometry.position;
    let size = view.geometry.size;

    let Color { r, g, b } = if view.is_active {
        view.active_color
    } else {
        view.base_color
    };
    let boost = view.pulse * config.pulse_brightness_boost;
    out.push(QuadInstance::filled(
        [origin.x, origin.y, size.x, size.y],
        rgba8(r as f32, g as f32, b as f32 + boost, 255.0),
        config.panel_corner_radius,
    ));

    let bands = view.equalizer.len() as f32;
    let bar_width = (size.x - 2.0 * BAR_MARGIN) / bands;
    let bar_color = rgba8(
        BAR_COLOR[0] as f32,
        BAR_COLOR[1] as f32,
        BAR_COLOR[2] as f32,
        255.0,
    );
    for (i, &level) in view.equalizer.iter().enumerate() {
        let height = map_range(level, 0.0, 1.0, BAR_MIN_HEIGHT, size.y * 0.5);
        let x = origin.x + BAR_MARGIN + i as f32 * bar_width;
        let y = origin.y + size.y - BAR_BASELINE - height;
        out.push(QuadInstance::filled(
            [x, y, bar_width - BAR_GAP, height],
            bar_color,
            BAR_CORNER_RADIUS,
        ));
    }

    if view.is_active {
        // Stroke straddles the panel edge
        let half = GLOW_WIDTH * 0.5;
        out.push(QuadInstance::outline(
            [
                origin.x - half,
                origin.y - half,
                size.x + GLOW_WIDTH,
                size.y + GLOW_WIDTH,
            ],
            rgba8(
                GLOW_COLOR[0] as f32,
                GLOW_COLOR[1] as f32,
                GLOW_COLOR[2] as f32,
                GLOW_COLOR[3] as f32,
            ),
            config.panel_corner_radius + half,
            GLOW_WIDTH,
        ));
    }
}

/// Full frame, back to front: ambient lights then sections in order
pub fn build_scene<'a>(
    views: impl IntoIterator<Item = SectionView<'a>>,
    frame: u64,
    config: &RenderConfig,
) -> Vec<QuadInstance> {
    let mut quads = ambient_lights(frame, config);
    for view in views {
        section_quads(&view, config, &mut quads);
    }
    quads
}
