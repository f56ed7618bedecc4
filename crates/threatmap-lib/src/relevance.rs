//! Selection of the single threat that matters most to a user.

use serde::Serialize;
use tracing::{debug, warn};

use crate::geo::Location;
use crate::threat::Threat;

/// The relevant threat for a user position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedThreat {
    pub threat: Threat,
    pub distance_meters: f64,
    pub danger_radius_meters: f64,
    pub is_inside: bool,
}

impl ResolvedThreat {
    pub fn center(&self) -> Location {
        self.threat.location
    }
}

/// Pick the most relevant threat for `user`.
///
/// Threats whose danger zone contains the user win over every threat that
/// does not, even closer ones; among them the nearest center is chosen. When
/// the user is outside every zone the globally nearest threat is returned.
/// Ties keep the earlier threat. Threats with an unusable radius are skipped.
pub fn resolve(user: &Location, threats: &[Threat]) -> Option<ResolvedThreat> {
    let mut nearest_inside: Option<(&Threat, f64, f64)> = None;
    let mut nearest_any: Option<(&Threat, f64, f64)> = None;

    for threat in threats {
        let radius = threat.danger_radius();
        if !radius.is_finite() || radius < 0.0 {
            warn!(
                id = %threat.id,
                name = %threat.name,
                yield_kg = threat.yield_kg,
                "skipping threat with invalid danger radius"
            );
            continue;
        }

        let distance = user.distance_to(&threat.location);

        if distance <= radius && nearest_inside.map_or(true, |(_, best, _)| distance < best) {
            nearest_inside = Some((threat, distance, radius));
        }
        if nearest_any.map_or(true, |(_, best, _)| distance < best) {
            nearest_any = Some((threat, distance, radius));
        }
    }

    let (threat, distance, radius, is_inside) = match (nearest_inside, nearest_any) {
        (Some((t, d, r)), _) => (t, d, r, true),
        (None, Some((t, d, r))) => (t, d, r, false),
        (None, None) => return None,
    };

    debug!(
        id = %threat.id,
        distance_m = distance,
        danger_radius_m = radius,
        is_inside,
        "selected relevant threat"
    );

    Some(ResolvedThreat {
        threat: threat.clone(),
        distance_meters: distance,
        danger_radius_meters: radius,
        is_inside,
    })
}
