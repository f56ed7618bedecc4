//! Assembly of the final route description.

use serde::Serialize;

use crate::facility::SelectionTag;
use crate::geo::Location;

const NAVIGATION_BASE_URL: &str = "https://www.google.com/maps/dir/?api=1";

/// Two points closer than this in both axes are treated as the same place.
pub const DEFAULT_COINCIDENCE_TOLERANCE_DEG: f64 = 0.0001;

/// The evacuation route handed to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvacuationDecision {
    pub origin_location: Location,
    pub destination_location: Location,
    pub waypoint_location: Option<Location>,
    pub selection_tag: SelectionTag,
    pub rationale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facility_name: Option<String>,
}

impl EvacuationDecision {
    /// Driving directions URL with the waypoint (if any) ahead of the destination.
    pub fn navigation_url(&self) -> String {
        let mut url = format!(
            "{NAVIGATION_BASE_URL}&origin={}&destination={}&travelmode=driving",
            self.origin_location, self.destination_location
        );
        if let Some(waypoint) = &self.waypoint_location {
            url.push_str(&format!("&waypoints={waypoint}"));
        }
        url
    }

    pub fn with_facility_name(mut self, name: Option<String>) -> Self {
        self.facility_name = name;
        self
    }
}

/// Build the decision, dropping a waypoint that coincides with the destination.
pub fn compose(
    origin: Location,
    destination: Location,
    waypoint: Option<Location>,
    tag: SelectionTag,
    rationale: impl Into<String>,
    coincidence_tolerance_deg: f64,
) -> EvacuationDecision {
    let waypoint_location =
        waypoint.filter(|w| !w.approx_eq(&destination, coincidence_tolerance_deg));

    EvacuationDecision {
        origin_location: origin,
        destination_location: destination,
        waypoint_location,
        selection_tag: tag,
        rationale: rationale.into(),
        facility_name: None,
    }
}
