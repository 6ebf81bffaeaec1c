//! Named boundary regions from TopoJSON or GeoJSON.
//!
//! TopoJSON topologies are decoded the way `topojson.feature` does it: arcs are
//! delta-decoded through the optional quantization transform, rings are stitched
//! from arc indices (`~i` walks arc `i` backwards), and shared endpoints between
//! consecutive arcs are emitted once.

use foundation::geometry::{GeoPoint, Geometry, Ring};
use scene::BoundaryFeature;
use serde_json::{Map, Value};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundarySchema {
    /// Topology object holding the regions. `None` takes the first object in
    /// document order. Ignored for GeoJSON input.
    pub object: Option<String>,
    /// Feature property joined against record categories.
    pub name_property: String,
}

impl Default for BoundarySchema {
    fn default() -> Self {
        Self {
            object: None,
            name_property: "name".to_string(),
        }
    }
}

#[derive(Debug)]
pub enum BoundaryError {
    Json(serde_json::Error),
    NotBoundaryCollection,
    MissingObject { name: String },
    InvalidTopology { reason: String },
}

impl std::fmt::Display for BoundaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundaryError::Json(e) => write!(f, "JSON parse error: {e}"),
            BoundaryError::NotBoundaryCollection => {
                write!(f, "expected a TopoJSON Topology or GeoJSON FeatureCollection")
            }
            BoundaryError::MissingObject { name } => {
                write!(f, "topology does not contain an object named {name:?}")
            }
            BoundaryError::InvalidTopology { reason } => write!(f, "invalid topology: {reason}"),
        }
    }
}

impl std::error::Error for BoundaryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BoundaryError::Json(e) => Some(e),
            _ => None,
        }
    }
}

pub fn parse_boundaries(
    payload: &str,
    schema: &BoundarySchema,
) -> Result<Vec<BoundaryFeature>, BoundaryError> {
    let value: Value = serde_json::from_str(payload).map_err(BoundaryError::Json)?;
    boundaries_from_value(&value, schema)
}

pub fn boundaries_from_value(
    value: &Value,
    schema: &BoundarySchema,
) -> Result<Vec<BoundaryFeature>, BoundaryError> {
    let obj = value
        .as_object()
        .ok_or(BoundaryError::NotBoundaryCollection)?;
    match obj.get("type").and_then(|v| v.as_str()) {
        Some("Topology") => from_topology(obj, schema),
        Some("FeatureCollection") => from_feature_collection(obj, schema),
        _ => Err(BoundaryError::NotBoundaryCollection),
    }
}

fn from_topology(
    topology: &Map<String, Value>,
    schema: &BoundarySchema,
) -> Result<Vec<BoundaryFeature>, BoundaryError> {
    let objects = topology
        .get("objects")
        .and_then(|v| v.as_object())
        .ok_or_else(|| BoundaryError::MissingObject {
            name: schema.object.clone().unwrap_or_else(|| "<any>".to_string()),
        })?;

    let object = match &schema.object {
        Some(name) => objects
            .get(name)
            .ok_or_else(|| BoundaryError::MissingObject { name: name.clone() })?,
        None => objects
            .values()
            .next()
            .ok_or_else(|| BoundaryError::MissingObject {
                name: "<any>".to_string(),
            })?,
    };

    let arcs = decode_arcs(topology)?;

    let geometries: Vec<&Value> = match object.get("type").and_then(|v| v.as_str()) {
        Some("GeometryCollection") => object
            .get("geometries")
            .and_then(|v| v.as_array())
            .map(|g| g.iter().collect())
            .unwrap_or_default(),
        _ => vec![object],
    };

    let mut out = Vec::with_capacity(geometries.len());
    for (index, geom) in geometries.into_iter().enumerate() {
        let Some(name) = feature_name(geom, &schema.name_property) else {
            warn!(
                index,
                property = %schema.name_property,
                "topology geometry without a name skipped"
            );
            continue;
        };
        let geometry = match topology_geometry(geom, &arcs) {
            Ok(Some(g)) => g,
            Ok(None) => {
                debug!(index, %name, "non-areal topology geometry skipped");
                continue;
            }
            Err(reason) => {
                warn!(index, %name, %reason, "malformed topology geometry skipped");
                continue;
            }
        };
        out.push(BoundaryFeature { name, geometry });
    }
    Ok(out)
}

/// Absolute arc coordinates, transform applied.
fn decode_arcs(topology: &Map<String, Value>) -> Result<Vec<Vec<GeoPoint>>, BoundaryError> {
    let invalid = |reason: &str| BoundaryError::InvalidTopology {
        reason: reason.to_string(),
    };

    let transform = match topology.get("transform") {
        Some(t) => {
            let pair = |key: &str| -> Option<[f64; 2]> {
                let a = t.get(key)?.as_array()?;
                Some([a.first()?.as_f64()?, a.get(1)?.as_f64()?])
            };
            Some((
                pair("scale").ok_or_else(|| invalid("transform.scale must be [x, y]"))?,
                pair("translate").ok_or_else(|| invalid("transform.translate must be [x, y]"))?,
            ))
        }
        None => None,
    };

    let raw_arcs = topology
        .get("arcs")
        .and_then(|v| v.as_array())
        .ok_or_else(|| invalid("missing arcs"))?;

    let mut arcs = Vec::with_capacity(raw_arcs.len());
    for arc in raw_arcs {
        let positions = arc
            .as_array()
            .ok_or_else(|| invalid("arc must be an array of positions"))?;
        let mut points = Vec::with_capacity(positions.len());
        let (mut x, mut y) = (0.0, 0.0);
        for p in positions {
            let p = p.as_array().ok_or_else(|| invalid("position must be an array"))?;
            let (Some(px), Some(py)) = (
                p.first().and_then(|v| v.as_f64()),
                p.get(1).and_then(|v| v.as_f64()),
            ) else {
                return Err(invalid("position must hold two numbers"));
            };
            let point = match transform {
                Some((scale, translate)) => {
                    x += px;
                    y += py;
                    GeoPoint::new(x * scale[0] + translate[0], y * scale[1] + translate[1])
                }
                None => GeoPoint::new(px, py),
            };
            points.push(point);
        }
        arcs.push(points);
    }
    Ok(arcs)
}

fn topology_geometry(geom: &Value, arcs: &[Vec<GeoPoint>]) -> Result<Option<Geometry>, String> {
    let refs = geom.get("arcs");
    match geom.get("type").and_then(|v| v.as_str()) {
        Some("Polygon") => {
            let rings = refs
                .and_then(|v| v.as_array())
                .ok_or("Polygon arcs must be an array of rings")?;
            Ok(Some(Geometry::Polygon(stitch_polygon(rings, arcs)?)))
        }
        Some("MultiPolygon") => {
            let polys = refs
                .and_then(|v| v.as_array())
                .ok_or("MultiPolygon arcs must be an array of polygons")?;
            let mut out = Vec::with_capacity(polys.len());
            for poly in polys {
                let rings = poly
                    .as_array()
                    .ok_or("MultiPolygon polygon must be an array of rings")?;
                out.push(stitch_polygon(rings, arcs)?);
            }
            Ok(Some(Geometry::MultiPolygon(out)))
        }
        _ => Ok(None),
    }
}

fn stitch_polygon(rings: &[Value], arcs: &[Vec<GeoPoint>]) -> Result<Vec<Ring>, String> {
    let mut out = Vec::with_capacity(rings.len());
    for ring in rings {
        let refs = ring.as_array().ok_or("ring must be an array of arc indices")?;
        let mut points: Ring = Vec::new();
        for r in refs {
            let i = r.as_i64().ok_or("arc index must be an integer")?;
            // Negative indices are one's complement: ~i reverses arc i.
            let (index, reversed) = if i < 0 { (!i, true) } else { (i, false) };
            let arc = usize::try_from(index)
                .ok()
                .and_then(|idx| arcs.get(idx))
                .ok_or_else(|| format!("arc index {i} out of range"))?;
            // Consecutive arcs share an endpoint.
            if !points.is_empty() {
                points.pop();
            }
            if reversed {
                points.extend(arc.iter().rev().copied());
            } else {
                points.extend(arc.iter().copied());
            }
        }
        out.push(points);
    }
    Ok(out)
}

fn from_feature_collection(
    collection: &Map<String, Value>,
    schema: &BoundarySchema,
) -> Result<Vec<BoundaryFeature>, BoundaryError> {
    let features = collection
        .get("features")
        .and_then(|v| v.as_array())
        .ok_or(BoundaryError::NotBoundaryCollection)?;

    let mut out = Vec::with_capacity(features.len());
    for (index, feature) in features.iter().enumerate() {
        let Some(name) = feature_name(feature, &schema.name_property) else {
            warn!(index, property = %schema.name_property, "feature without a name skipped");
            continue;
        };
        let Some(geometry) = feature.get("geometry") else {
            warn!(index, %name, "feature without geometry skipped");
            continue;
        };
        match geojson_geometry(geometry) {
            Ok(Some(g)) => out.push(BoundaryFeature { name, geometry: g }),
            Ok(None) => debug!(index, %name, "non-areal feature skipped"),
            Err(reason) => warn!(index, %name, %reason, "malformed feature skipped"),
        }
    }
    Ok(out)
}

fn geojson_geometry(geometry: &Value) -> Result<Option<Geometry>, String> {
    let coords = geometry.get("coordinates");
    match geometry.get("type").and_then(|v| v.as_str()) {
        Some("Polygon") => {
            let coords = coords.ok_or("geometry missing coordinates")?;
            Ok(Some(Geometry::Polygon(parse_polygon(coords)?)))
        }
        Some("MultiPolygon") => {
            let polys = coords
                .and_then(|v| v.as_array())
                .ok_or("MultiPolygon coordinates must be an array of polygons")?;
            let mut out = Vec::with_capacity(polys.len());
            for poly in polys {
                out.push(parse_polygon(poly)?);
            }
            Ok(Some(Geometry::MultiPolygon(out)))
        }
        _ => Ok(None),
    }
}

fn parse_polygon(coords: &Value) -> Result<Vec<Ring>, String> {
    let rings = coords
        .as_array()
        .ok_or("Polygon coordinates must be an array of rings")?;
    let mut out = Vec::with_capacity(rings.len());
    for ring in rings {
        let positions = ring.as_array().ok_or("ring must be an array of positions")?;
        let mut points = Vec::with_capacity(positions.len());
        for p in positions {
            let lon = p.get(0).and_then(|v| v.as_f64());
            let lat = p.get(1).and_then(|v| v.as_f64());
            match (lon, lat) {
                (Some(lon), Some(lat)) => points.push(GeoPoint::new(lon, lat)),
                _ => return Err("position must be [lon, lat]".to_string()),
            }
        }
        out.push(points);
    }
    Ok(out)
}

/// Name property as text; numeric names (area codes) are stringified. Falls
/// back to the feature `id`.
fn feature_name(feature: &Value, property: &str) -> Option<String> {
    let from = |v: &Value| match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };
    feature
        .get("properties")
        .and_then(|p| p.get(property))
        .and_then(from)
        .or_else(|| feature.get("id").and_then(from))
}

#[cfg(test)]
mod tests {
    use super::{BoundaryError, BoundarySchema, parse_boundaries};
    use foundation::geometry::{GeoPoint, Geometry};

    // Two unit squares sharing the edge x = 1, quantized with scale 1.
    const TOPOLOGY: &str = r#"{
        "type": "Topology",
        "transform": { "scale": [1, 1], "translate": [10, 20] },
        "objects": {
            "chicago": {
                "type": "GeometryCollection",
                "geometries": [
                    { "type": "Polygon", "arcs": [[0, 1]], "properties": { "community": "LOOP" } },
                    { "type": "Polygon", "arcs": [[2, -1]], "properties": { "community": "AUSTIN" } },
                    { "type": "Polygon", "arcs": [[0, 1]], "properties": {} },
                    { "type": "LineString", "arcs": [0], "properties": { "community": "RIVER" } }
                ]
            }
        },
        "arcs": [
            [[1, 0], [0, 1]],
            [[1, 1], [-1, 0], [0, -1], [1, 0]],
            [[1, 0], [1, 0], [0, 1], [-1, 0]]
        ]
    }"#;

    fn schema(object: &str) -> BoundarySchema {
        BoundarySchema {
            object: Some(object.to_string()),
            name_property: "community".to_string(),
        }
    }

    #[test]
    fn decodes_quantized_topology() {
        let features = parse_boundaries(TOPOLOGY, &schema("chicago")).unwrap();
        let names: Vec<&str> = features.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["LOOP", "AUSTIN"]);

        let Geometry::Polygon(rings) = &features[0].geometry else {
            panic!("expected polygon");
        };
        // arc 0: (11,20) -> (11,21); arc 1: (11,21) -> (10,21) -> (10,20) -> (11,20)
        assert_eq!(
            rings[0],
            vec![
                GeoPoint::new(11.0, 20.0),
                GeoPoint::new(11.0, 21.0),
                GeoPoint::new(10.0, 21.0),
                GeoPoint::new(10.0, 20.0),
                GeoPoint::new(11.0, 20.0),
            ]
        );

        let Geometry::Polygon(rings) = &features[1].geometry else {
            panic!("expected polygon");
        };
        // arc 2 runs (11,20) -> (12,20) -> (12,21) -> (11,21); ~0 closes the ring.
        assert_eq!(
            rings[0],
            vec![
                GeoPoint::new(11.0, 20.0),
                GeoPoint::new(12.0, 20.0),
                GeoPoint::new(12.0, 21.0),
                GeoPoint::new(11.0, 21.0),
                GeoPoint::new(11.0, 20.0),
            ]
        );
    }

    #[test]
    fn missing_object_is_a_schema_mismatch() {
        let err = parse_boundaries(TOPOLOGY, &schema("neighborhoods")).unwrap_err();
        assert!(matches!(
            err,
            BoundaryError::MissingObject { ref name } if name == "neighborhoods"
        ));
    }

    #[test]
    fn topology_without_objects_is_a_schema_mismatch() {
        let err = parse_boundaries(r#"{"type":"Topology","arcs":[]}"#, &BoundarySchema::default())
            .unwrap_err();
        assert!(matches!(err, BoundaryError::MissingObject { ref name } if name == "<any>"));

        let err = parse_boundaries(
            r#"{"type":"Topology","objects":[],"arcs":[]}"#,
            &schema("chicago"),
        )
        .unwrap_err();
        assert!(matches!(err, BoundaryError::MissingObject { ref name } if name == "chicago"));
    }

    #[test]
    fn default_object_is_first() {
        let s = BoundarySchema {
            object: None,
            name_property: "community".to_string(),
        };
        assert_eq!(parse_boundaries(TOPOLOGY, &s).unwrap().len(), 2);
    }

    #[test]
    fn default_object_follows_document_order() {
        let payload = r#"{
            "type": "Topology",
            "objects": {
                "zeta": { "type": "GeometryCollection", "geometries": [
                    { "type": "Polygon", "arcs": [[0]], "properties": { "name": "Z" } } ] },
                "alpha": { "type": "GeometryCollection", "geometries": [
                    { "type": "Polygon", "arcs": [[0]], "properties": { "name": "A" } } ] }
            },
            "arcs": [[[0, 0], [1, 0], [1, 1], [0, 0]]]
        }"#;
        let features = parse_boundaries(payload, &BoundarySchema::default()).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].name, "Z");
    }

    #[test]
    fn reads_geojson_feature_collections() {
        let payload = r#"{
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "id": 7, "properties": {},
                  "geometry": { "type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]] } },
                { "type": "Feature", "properties": { "name": "Hyde Park" },
                  "geometry": { "type": "MultiPolygon", "coordinates": [[[[0,0],[1,0],[1,1],[0,0]]]] } },
                { "type": "Feature", "properties": { "name": "Pier" },
                  "geometry": { "type": "Point", "coordinates": [0, 0] } }
            ]
        }"#;
        let features = parse_boundaries(payload, &BoundarySchema::default()).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].name, "7");
        assert_eq!(features[1].name, "Hyde Park");
        assert!(matches!(features[1].geometry, Geometry::MultiPolygon(_)));
    }

    #[test]
    fn rejects_other_documents() {
        let err = parse_boundaries(r#"{"type":"Feature"}"#, &BoundarySchema::default()).unwrap_err();
        assert!(matches!(err, BoundaryError::NotBoundaryCollection));
        assert!(matches!(
            parse_boundaries("not json", &BoundarySchema::default()),
            Err(BoundaryError::Json(_))
        ));
    }
}
