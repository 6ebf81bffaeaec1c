/// Linear RGBA in `0.0..=1.0`.
pub type Color = [f32; 4];

pub const fn rgb8(r: u8, g: u8, b: u8) -> Color {
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0]
}

/// Number of discrete colour bins used by choropleth fills.
pub const PALETTE_BINS: usize = 9;

/// Sequential light-to-dark red ramp, lowest bin first.
pub const SEQUENTIAL_REDS: [Color; PALETTE_BINS] = [
    rgb8(0xff, 0xf5, 0xf0),
    rgb8(0xfe, 0xe0, 0xd2),
    rgb8(0xfc, 0xbb, 0xa1),
    rgb8(0xfc, 0x92, 0x72),
    rgb8(0xfb, 0x6a, 0x4a),
    rgb8(0xef, 0x3b, 0x2c),
    rgb8(0xcb, 0x18, 0x1d),
    rgb8(0xa5, 0x0f, 0x15),
    rgb8(0x67, 0x00, 0x0d),
];

pub const BAR_FILL: Color = rgb8(0x46, 0x82, 0xb4);
pub const LINE_STROKE: Color = rgb8(0x46, 0x82, 0xb4);
pub const REGION_STROKE: Color = rgb8(0x33, 0x33, 0x33);

/// `#rrggbb`, alpha dropped.
pub fn to_hex(color: Color) -> String {
    let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("#{:02x}{:02x}{:02x}", c(color[0]), c(color[1]), c(color[2]))
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MarkStyle {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f32,
}

impl MarkStyle {
    pub const fn filled(fill: Color) -> Self {
        Self {
            fill: Some(fill),
            stroke: None,
            stroke_width: 0.0,
        }
    }

    pub const fn region(fill: Color) -> Self {
        Self {
            fill: Some(fill),
            stroke: Some(REGION_STROKE),
            stroke_width: 0.5,
        }
    }

    pub const fn line(stroke: Color, stroke_width: f32) -> Self {
        Self {
            fill: None,
            stroke: Some(stroke),
            stroke_width,
        }
    }
}
