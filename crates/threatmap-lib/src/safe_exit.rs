//! Safe exit point computation.

use crate::evacuation::EvacuationConfig;
use crate::geo::{self, Location};
use crate::relevance::ResolvedThreat;

/// Compute a point outside the danger zone of `resolved`, on the side of the
/// threat where the user already is.
///
/// Inside the zone the target is the danger radius plus the configured exit
/// margin; outside it the user is pushed a further fixed distance away.
/// Below the heading floor the bearing is meaningless, so due north is used.
pub fn compute_safe_exit(
    user: &Location,
    resolved: &ResolvedThreat,
    config: &EvacuationConfig,
) -> Location {
    let center = resolved.center();

    let heading = if resolved.distance_meters < config.heading_floor_meters {
        0.0
    } else {
        geo::bearing_degrees(&center, user)
    };

    let target_distance = if resolved.is_inside {
        resolved.danger_radius_meters * config.exit_margin
    } else {
        resolved.distance_meters + config.outside_push_meters
    };

    geo::offset(&center, target_distance, heading)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relevance::resolve;
    use crate::threat::Threat;

    fn resolved_for(user: &Location, threat_at: Location, yield_kg: f64) -> ResolvedThreat {
        resolve(user, &[Threat::new("t", "t", threat_at, yield_kg)]).unwrap()
    }

    #[test]
    fn inside_user_exits_past_radius_with_margin() {
        let config = EvacuationConfig::default();
        let center = Location::new(0.0, 0.0);
        let user = Location::new(0.0, 0.0005);
        let resolved = resolved_for(&user, center, 1_000.0);
        assert!(resolved.is_inside);
        assert!((resolved.distance_meters - 55.66).abs() < 0.1);

        let exit = compute_safe_exit(&user, &resolved, &config);

        assert!((geo::distance_meters(&center, &exit) - 2_200.0).abs() < 1e-6);
        assert!((geo::bearing_degrees(&center, &exit) - 90.0).abs() < 1e-6);
    }

    #[test]
    fn outside_user_is_pushed_further_away() {
        let config = EvacuationConfig::default();
        let center = Location::new(12.9, 77.6);
        let user = Location::new(12.95, 77.6);
        let resolved = resolved_for(&user, center, 10.0);
        assert!(!resolved.is_inside);

        let exit = compute_safe_exit(&user, &resolved, &config);
        let expected = resolved.distance_meters + 2_000.0;

        assert!((geo::distance_meters(&center, &exit) - expected).abs() < 1e-6);
        assert!(exit.lat > user.lat);
    }

    #[test]
    fn user_on_top_of_threat_heads_north() {
        let config = EvacuationConfig::default();
        let center = Location::new(10.0, 10.0);
        let resolved = resolved_for(&center, center, 8.0);

        let exit = compute_safe_exit(&center, &resolved, &config);

        assert!(exit.lat > center.lat);
        assert!((exit.lng - center.lng).abs() < 1e-9);
        assert!((geo::distance_meters(&center, &exit) - 400.0 * 1.1).abs() < 1e-6);
    }
}
