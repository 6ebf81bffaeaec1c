//! Planar geometry passed through the explorer untouched.
//!
//! Coordinates are longitude/latitude degrees as delivered by the boundary
//! source. Only loaders and renderers look inside; the scene core treats
//! values of this type as opaque.

use crate::bounds::Aabb2;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoPoint {
    pub lon_deg: f64,
    pub lat_deg: f64,
}

impl GeoPoint {
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self { lon_deg, lat_deg }
    }
}

pub type Ring = Vec<GeoPoint>;

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Outer ring first, holes after.
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Geometry {
    /// Iterates every ring of every polygon part.
    pub fn rings(&self) -> Box<dyn Iterator<Item = &Ring> + '_> {
        match self {
            Geometry::Polygon(rings) => Box::new(rings.iter()),
            Geometry::MultiPolygon(polys) => Box::new(polys.iter().flatten()),
        }
    }

    pub fn bounds(&self) -> Aabb2 {
        let mut b = Aabb2::empty();
        for ring in self.rings() {
            for p in ring {
                b.extend(p.lon_deg, p.lat_deg);
            }
        }
        b
    }
}
