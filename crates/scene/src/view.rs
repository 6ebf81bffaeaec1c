use compute::TimeResolution;
use foundation::bounds::Interval;
use foundation::geometry::Geometry;
use foundation::time::Timestamp;
use layers::symbology::{Color, MarkStyle};

use crate::state::{Interaction, SceneId};

/// Space reserved around the plot area for axes and labels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// Canvas geometry and encoding knobs shared by every scene.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewConfig {
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
    /// Fraction of each band left empty in the breakdown chart.
    pub band_padding: f64,
    pub trend_resolution: TimeResolution,
    pub count_ticks: usize,
    pub time_ticks: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 600.0,
            margin: Margin {
                top: 40.0,
                right: 30.0,
                bottom: 80.0,
                left: 60.0,
            },
            band_padding: 0.1,
            trend_resolution: TimeResolution::Exact,
            count_ticks: 10,
            time_ticks: 6,
        }
    }
}

impl ViewConfig {
    pub fn x_range(&self) -> Interval {
        Interval::new(self.margin.left, self.width - self.margin.right)
    }

    /// Bottom-up: count 0 sits on the x axis.
    pub fn y_range(&self) -> Interval {
        Interval::new(self.height - self.margin.bottom, self.margin.top)
    }
}

/// Everything a renderer needs to draw one scene from a blank surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneView<'a> {
    pub scene: SceneId,
    pub title: String,
    pub width: f64,
    pub height: f64,
    pub marks: Vec<Mark<'a>>,
    pub axes: Vec<Axis>,
    pub legend: Option<Legend>,
    /// Whether the back control should be shown/enabled.
    pub back_enabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mark<'a> {
    Region(RegionMark<'a>),
    Bar(BarMark),
    Line(LineMark),
}

impl Mark<'_> {
    /// Interaction to raise when the mark is activated, if any.
    pub fn on_select(&self) -> Option<&Interaction> {
        match self {
            Mark::Region(m) => Some(&m.on_select),
            Mark::Bar(m) => Some(&m.on_select),
            Mark::Line(_) => None,
        }
    }
}

/// A boundary region filled by its quantized count.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMark<'a> {
    pub name: String,
    pub geometry: &'a Geometry,
    pub count: u64,
    pub bin: usize,
    pub style: MarkStyle,
    pub on_select: Interaction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarMark {
    pub key: String,
    pub count: u64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub style: MarkStyle,
    pub on_select: Interaction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinePoint {
    pub time: Timestamp,
    pub count: u64,
    pub x: f64,
    pub y: f64,
}

/// A single connected polyline, points in chronological order.
#[derive(Debug, Clone, PartialEq)]
pub struct LineMark {
    pub points: Vec<LinePoint>,
    pub style: MarkStyle,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AxisOrient {
    Bottom,
    Left,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AxisKind {
    Band,
    Linear,
    Time,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub position: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub orient: AxisOrient,
    pub kind: AxisKind,
    /// y of a bottom axis, x of a left axis.
    pub offset: f64,
    pub range: Interval,
    pub ticks: Vec<Tick>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub lower: f64,
    pub upper: f64,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    pub title: String,
    pub entries: Vec<LegendEntry>,
}

/// Drawing surface. Each call replaces whatever the previous call drew.
pub trait Renderer {
    type Error;

    fn render(&mut self, view: &SceneView<'_>) -> Result<(), Self::Error>;
}
