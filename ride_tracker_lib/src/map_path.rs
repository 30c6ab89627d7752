//! Map payload for a recorded or planned path: one polyline plus start and end
//! markers, as GeoJSON that a tile-map frontend can draw directly.

use geo::BoundingRect;
use geo_types::{LineString, Rect};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;

use crate::geo_sample::GeoSample;

pub const PATH_COLOR: &str = "#eab308";
pub const END_COLOR: &str = "#ef4444";
pub const PATH_WEIGHT: u32 = 4;
pub const MARKER_RADIUS: u32 = 5;

/// Where the map sits before anything has been recorded.
pub const DEFAULT_CENTER: (f64, f64) = (-23.5505, -46.6333);
pub const DEFAULT_ZOOM: u8 = 13;

/// Fraction of the path extent added on each side when fitting bounds.
const BOUNDS_PADDING: f64 = 0.05;
const MIN_PADDING_DEG: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Zoom, drag and scroll enabled.
    Interactive,
    DisplayOnly,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Viewport {
    Center { latitude: f64, longitude: f64, zoom: u8 },
    Fit(Rect),
}

pub fn viewport(samples: &[GeoSample]) -> Viewport {
    match padded_bounds(samples) {
        Some(rect) => Viewport::Fit(rect),
        None => Viewport::Center {
            latitude: DEFAULT_CENTER.0,
            longitude: DEFAULT_CENTER.1,
            zoom: DEFAULT_ZOOM,
        },
    }
}

/// Bounds of the path grown by a margin, so markers are not drawn on the edge.
pub fn padded_bounds(samples: &[GeoSample]) -> Option<Rect> {
    let line: LineString = samples.iter().map(|s| s.point()).collect();
    let rect = line.bounding_rect()?;

    let pad_x = (rect.width() * BOUNDS_PADDING).max(MIN_PADDING_DEG);
    let pad_y = (rect.height() * BOUNDS_PADDING).max(MIN_PADDING_DEG);

    Some(Rect::new(
        (rect.min().x - pad_x, rect.min().y - pad_y),
        (rect.max().x + pad_x, rect.max().y + pad_y),
    ))
}

/// Nothing is drawn for an empty path.
pub fn render(samples: &[GeoSample], mode: RenderMode) -> Option<FeatureCollection> {
    let first = samples.first()?;
    let Viewport::Fit(bounds) = viewport(samples) else {
        return None;
    };

    let path = samples.iter().map(position).collect::<Vec<_>>();

    let mut features = vec![
        feature(Value::LineString(path), json!({ "kind": "path", "color": PATH_COLOR, "weight": PATH_WEIGHT })),
        feature(Value::Point(position(first)), json!({ "kind": "start", "color": PATH_COLOR, "radius": MARKER_RADIUS })),
    ];

    if samples.len() > 1 {
        if let Some(last) = samples.last() {
            features.push(feature(Value::Point(position(last)), json!({ "kind": "end", "color": END_COLOR, "radius": MARKER_RADIUS })));
        }
    }

    let mut foreign_members = JsonObject::new();
    foreign_members.insert("interactive".into(), json!(mode == RenderMode::Interactive));

    Some(FeatureCollection {
        bbox: Some(vec![bounds.min().x, bounds.min().y, bounds.max().x, bounds.max().y]),
        features,
        foreign_members: Some(foreign_members),
    })
}

fn position(sample: &GeoSample) -> Vec<f64> {
    vec![sample.longitude(), sample.latitude()]
}

fn feature(value: Value, properties: serde_json::Value) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: properties.as_object().cloned(),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(n: usize) -> Vec<GeoSample> {
        (0..n)
            .map(|i| GeoSample::from_millis(-16.76 - i as f64 * 0.01, -49.28 - i as f64 * 0.01, i as i64 * 1000).unwrap())
            .collect()
    }

    fn kinds(collection: &FeatureCollection) -> Vec<String> {
        collection.features.iter()
            .map(|f| f.properties.as_ref().unwrap()["kind"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn empty_path_renders_nothing() {
        assert!(render(&[], RenderMode::Interactive).is_none());
        assert_eq!(viewport(&[]), Viewport::Center { latitude: -23.5505, longitude: -46.6333, zoom: 13 });
    }

    #[test]
    fn single_sample_has_no_end_marker() {
        let collection = render(&path(1), RenderMode::DisplayOnly).unwrap();

        assert_eq!(kinds(&collection), vec!["path", "start"]);
        assert_eq!(collection.foreign_members.unwrap()["interactive"], false);

        let bbox = collection.bbox.unwrap();
        assert!(bbox[0] < -49.28 && bbox[2] > -49.28);
        assert!(bbox[1] < -16.76 && bbox[3] > -16.76);
    }

    #[test]
    fn path_with_start_and_end_markers() {
        let samples = path(3);
        let collection = render(&samples, RenderMode::Interactive).unwrap();

        assert_eq!(kinds(&collection), vec!["path", "start", "end"]);
        assert_eq!(collection.foreign_members.as_ref().unwrap()["interactive"], true);

        let Some(Geometry { value: Value::LineString(line), .. }) = &collection.features[0].geometry else {
            panic!("first feature should be the path");
        };
        assert_eq!(line.len(), 3);
        assert_eq!(line[0], vec![-49.28, -16.76]);

        let Some(Geometry { value: Value::Point(end), .. }) = &collection.features[2].geometry else {
            panic!("third feature should be the end marker");
        };
        assert_eq!(end, &vec![samples[2].longitude(), samples[2].latitude()]);
        assert_eq!(collection.features[2].properties.as_ref().unwrap()["color"], END_COLOR);
    }

    #[test]
    fn bounds_cover_whole_path() {
        let Viewport::Fit(rect) = viewport(&path(5)) else {
            panic!("expected fitted bounds");
        };

        assert!(rect.min().y < -16.76 - 0.04);
        assert!(rect.max().y > -16.76);
        assert!(rect.min().x < -49.28 - 0.04);
        assert!(rect.max().x > -49.28);
    }
}
