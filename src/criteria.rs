use serde::Serialize;

/// Half-width of the search rectangle around the requested point, in degrees.
pub const SEARCH_MARGIN_DEG: f64 = 0.5;

/// Number of scenes requested from the catalog per search.
pub const MAX_RESULTS: u32 = 1;

/// Latitude/longitude in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Axis-aligned rectangle, serialized the way M2M expects an `mbr` filter corner pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub lower_left: GeoPoint,
    pub upper_right: GeoPoint,
}

impl BoundingBox {
    /// Square box of `margin` degrees on every side of `center`.
    pub fn around(center: GeoPoint, margin: f64) -> Self {
        Self {
            lower_left: GeoPoint::new(center.latitude - margin, center.longitude - margin),
            upper_right: GeoPoint::new(center.latitude + margin, center.longitude + margin),
        }
    }
}

/// What to look for in one scene search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCriteria {
    pub dataset: String,
    pub point: GeoPoint,
    pub max_results: u32,
}

impl SearchCriteria {
    pub fn new(dataset: impl Into<String>, point: GeoPoint) -> Self {
        Self {
            dataset: dataset.into(),
            point,
            max_results: MAX_RESULTS,
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::around(self.point, SEARCH_MARGIN_DEG)
    }

    pub(crate) fn to_request(&self) -> SceneSearchRequest<'_> {
        let bbox = self.bounding_box();
        SceneSearchRequest {
            dataset_name: &self.dataset,
            spatial_filter: SpatialFilter {
                filter_type: "mbr",
                lower_left: bbox.lower_left,
                upper_right: bbox.upper_right,
            },
            max_results: self.max_results,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SceneSearchRequest<'a> {
    dataset_name: &'a str,
    spatial_filter: SpatialFilter,
    max_results: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpatialFilter {
    filter_type: &'static str,
    lower_left: GeoPoint,
    upper_right: GeoPoint,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DownloadRequest<'a> {
    pub(crate) dataset_name: &'a str,
    pub(crate) entity_id: &'a str,
}
