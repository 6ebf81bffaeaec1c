//! SVG renderer: one standalone document per rendered view.
//!
//! Marks carry their select binding as a `data-select` attribute so a host
//! page can wire clicks back into the controller.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::PathBuf;

use foundation::bounds::Aabb2;
use foundation::geometry::Geometry;
use layers::symbology::{MarkStyle, to_hex};
use scene::{Axis, AxisOrient, Interaction, Legend, Mark, Renderer, SceneView};
use tracing::info;

pub struct SvgRenderer {
    out_dir: PathBuf,
    rendered: usize,
    bindings: Vec<String>,
    back_enabled: bool,
    last_path: Option<PathBuf>,
}

impl SvgRenderer {
    pub fn new(out_dir: impl Into<PathBuf>) -> io::Result<Self> {
        let out_dir = out_dir.into();
        fs::create_dir_all(&out_dir)?;
        Ok(Self {
            out_dir,
            rendered: 0,
            bindings: Vec::new(),
            back_enabled: false,
            last_path: None,
        })
    }

    /// Select keys bound to the marks of the last rendered view.
    pub fn bindings(&self) -> &[String] {
        &self.bindings
    }

    pub fn back_enabled(&self) -> bool {
        self.back_enabled
    }

    pub fn last_path(&self) -> Option<&PathBuf> {
        self.last_path.as_ref()
    }
}

impl Renderer for SvgRenderer {
    type Error = io::Error;

    fn render(&mut self, view: &SceneView<'_>) -> Result<(), Self::Error> {
        let path = self
            .out_dir
            .join(format!("{:03}-{}.svg", self.rendered, view.scene));
        fs::write(&path, to_svg(view))?;
        self.rendered += 1;
        self.bindings = view
            .marks
            .iter()
            .filter_map(|m| match m.on_select() {
                Some(Interaction::Select(key)) => Some(key.clone()),
                _ => None,
            })
            .collect();
        self.back_enabled = view.back_enabled;
        info!(
            path = %path.display(),
            scene = %view.scene,
            marks = view.marks.len(),
            "view rendered"
        );
        self.last_path = Some(path);
        Ok(())
    }
}

pub fn to_svg(view: &SceneView<'_>) -> String {
    let mut s = String::new();
    let _ = writeln!(
        s,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif" font-size="11">"#,
        w = view.width,
        h = view.height,
    );
    let _ = writeln!(
        s,
        r#"<rect width="{}" height="{}" fill="white" stroke="black"/>"#,
        view.width, view.height
    );
    let _ = writeln!(
        s,
        r#"<text x="{}" y="24" text-anchor="middle" font-size="16">{}</text>"#,
        view.width / 2.0,
        escape(&view.title)
    );
    if view.back_enabled {
        let _ = writeln!(
            s,
            r##"<g data-action="back"><rect x="8" y="8" width="56" height="22" rx="3" fill="#eeeeee" stroke="#999999"/><text x="36" y="23" text-anchor="middle">Back</text></g>"##
        );
    }

    let projection = RegionProjection::fit(view);
    for mark in &view.marks {
        match mark {
            Mark::Region(r) => {
                let d = projection
                    .as_ref()
                    .map(|p| p.path(r.geometry))
                    .unwrap_or_default();
                let _ = writeln!(
                    s,
                    r#"<path d="{d}" {style} data-select="{key}"><title>{key}: {count}</title></path>"#,
                    style = style_attrs(&r.style),
                    key = escape(&r.name),
                    count = r.count,
                );
            }
            Mark::Bar(b) => {
                let _ = writeln!(
                    s,
                    r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" {} data-select="{key}"><title>{key}: {}</title></rect>"#,
                    b.x,
                    b.y,
                    b.width,
                    b.height.max(0.0),
                    style_attrs(&b.style),
                    b.count,
                    key = escape(&b.key),
                );
            }
            Mark::Line(l) => {
                let points: Vec<String> = l
                    .points
                    .iter()
                    .map(|p| format!("{:.2},{:.2}", p.x, p.y))
                    .collect();
                let _ = writeln!(
                    s,
                    r#"<polyline points="{}" {}/>"#,
                    points.join(" "),
                    style_attrs(&l.style)
                );
            }
        }
    }

    for axis in &view.axes {
        write_axis(&mut s, axis);
    }
    if let Some(legend) = &view.legend {
        write_legend(&mut s, legend, view.height);
    }
    s.push_str("</svg>\n");
    s
}

fn style_attrs(style: &MarkStyle) -> String {
    let fill = style.fill.map(to_hex).unwrap_or_else(|| "none".to_string());
    let stroke = style.stroke.map(to_hex).unwrap_or_else(|| "none".to_string());
    format!(
        r#"fill="{fill}" stroke="{stroke}" stroke-width="{}""#,
        style.stroke_width
    )
}

fn write_axis(s: &mut String, axis: &Axis) {
    match axis.orient {
        AxisOrient::Bottom => {
            let _ = writeln!(
                s,
                r#"<line x1="{:.2}" y1="{o:.2}" x2="{:.2}" y2="{o:.2}" stroke="black"/>"#,
                axis.range.start,
                axis.range.end,
                o = axis.offset
            );
            for t in &axis.ticks {
                let _ = writeln!(
                    s,
                    r#"<text x="{x:.2}" y="{y:.2}" text-anchor="end" transform="rotate(-40 {x:.2} {y:.2})">{}</text>"#,
                    escape(&t.label),
                    x = t.position,
                    y = axis.offset + 14.0,
                );
            }
        }
        AxisOrient::Left => {
            let _ = writeln!(
                s,
                r#"<line x1="{o:.2}" y1="{:.2}" x2="{o:.2}" y2="{:.2}" stroke="black"/>"#,
                axis.range.start,
                axis.range.end,
                o = axis.offset
            );
            for t in &axis.ticks {
                let _ = writeln!(
                    s,
                    r#"<text x="{:.2}" y="{:.2}" text-anchor="end">{}</text>"#,
                    axis.offset - 6.0,
                    t.position + 4.0,
                    escape(&t.label)
                );
            }
        }
    }
}

fn write_legend(s: &mut String, legend: &Legend, height: f64) {
    let x0 = 20.0;
    let y0 = height - 40.0;
    let _ = writeln!(
        s,
        r#"<g class="legend"><text x="{x0}" y="{}">{}</text>"#,
        y0 - 6.0,
        escape(&legend.title)
    );
    for (i, e) in legend.entries.iter().enumerate() {
        let x = x0 + i as f64 * 40.0;
        let _ = writeln!(
            s,
            r#"<rect x="{x}" y="{y0}" width="40" height="10" fill="{}"/><text x="{x}" y="{}">{}</text>"#,
            to_hex(e.color),
            y0 + 24.0,
            e.lower.round()
        );
    }
    s.push_str("</g>\n");
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Equirectangular fit of every region into the canvas, with longitude
/// compressed by the cosine of the mid latitude.
struct RegionProjection {
    bounds: Aabb2,
    k: f64,
    x_scale: f64,
    offset: [f64; 2],
}

impl RegionProjection {
    fn fit(view: &SceneView<'_>) -> Option<Self> {
        let bounds = view
            .marks
            .iter()
            .filter_map(|m| match m {
                Mark::Region(r) => Some(r.geometry.bounds()),
                _ => None,
            })
            .filter(|b| !b.is_empty())
            .reduce(|a, b| a.union(&b))?;

        let pad = 40.0;
        let w = (view.width - 2.0 * pad).max(1.0);
        let h = (view.height - 2.0 * pad - 40.0).max(1.0);
        let mid_lat = (bounds.min[1] + bounds.max[1]) * 0.5;
        let x_scale = mid_lat.to_radians().cos().abs().max(1e-6);
        let dx = (bounds.width() * x_scale).max(1e-12);
        let dy = bounds.height().max(1e-12);
        let k = (w / dx).min(h / dy);
        let offset = [pad + (w - dx * k) * 0.5, pad + (h - dy * k) * 0.5];
        Some(Self {
            bounds,
            k,
            x_scale,
            offset,
        })
    }

    fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        (
            self.offset[0] + (lon - self.bounds.min[0]) * self.x_scale * self.k,
            self.offset[1] + (self.bounds.max[1] - lat) * self.k,
        )
    }

    fn path(&self, geometry: &Geometry) -> String {
        let mut d = String::new();
        for ring in geometry.rings() {
            for (i, p) in ring.iter().enumerate() {
                let (x, y) = self.project(p.lon_deg, p.lat_deg);
                let _ = write!(d, "{}{x:.2},{y:.2}", if i == 0 { "M" } else { "L" });
            }
            if !ring.is_empty() {
                d.push('Z');
            }
        }
        d
    }
}
