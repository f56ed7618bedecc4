//! Blast/hazard zone radius model.
//!
//! Radii follow the cube-root scaling law `R = R_ref * (W / W_ref)^(1/3)` with a
//! 1 kg reference yield, so for a yield of exactly 1 kg every band reports its
//! base radius.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity bands, ordered from innermost (most severe) to outermost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardBand {
    Lethal,
    Severe,
    Moderate,
    Minor,
}

impl HazardBand {
    /// All bands in severity order.
    pub const ALL: [HazardBand; 4] = [
        HazardBand::Lethal,
        HazardBand::Severe,
        HazardBand::Moderate,
        HazardBand::Minor,
    ];

    /// Radius of this band for a 1 kg reference yield, in meters.
    pub const fn base_radius_meters(self) -> f64 {
        match self {
            HazardBand::Lethal => 25.0,
            HazardBand::Severe => 50.0,
            HazardBand::Moderate => 100.0,
            HazardBand::Minor => 200.0,
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            HazardBand::Lethal => "Lethal Zone",
            HazardBand::Severe => "Severe Damage",
            HazardBand::Moderate => "Moderate Damage",
            HazardBand::Minor => "Minor Damage",
        }
    }

    pub const fn color_hint(self) -> &'static str {
        match self {
            HazardBand::Lethal => "#ff3838",
            HazardBand::Severe => "#ff8c38",
            HazardBand::Moderate => "#fdd835",
            HazardBand::Minor => "#38b6ff",
        }
    }

    pub const fn opacity(self) -> f64 {
        match self {
            HazardBand::Lethal => 0.4,
            HazardBand::Severe => 0.3,
            HazardBand::Moderate => 0.2,
            HazardBand::Minor => 0.1,
        }
    }
}

impl fmt::Display for HazardBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One concentric ring of a hazard's footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardZone {
    pub band: HazardBand,
    pub name: String,
    pub radius_meters: f64,
    pub color_hint: String,
    pub opacity: f64,
}

/// Cube-root scale factor applied to every base radius.
///
/// Non-positive yields collapse to zero; non-finite yields propagate so that
/// callers can detect and skip them.
pub fn scale_factor(yield_kg: f64) -> f64 {
    if yield_kg <= 0.0 {
        0.0
    } else {
        yield_kg.cbrt()
    }
}

/// Compute the four hazard zones for a yield, innermost first.
pub fn compute_zones(yield_kg: f64) -> [HazardZone; 4] {
    let scale = scale_factor(yield_kg);
    HazardBand::ALL.map(|band| HazardZone {
        band,
        name: band.display_name().to_string(),
        radius_meters: band.base_radius_meters() * scale,
        color_hint: band.color_hint().to_string(),
        opacity: band.opacity(),
    })
}

/// Radius of the outermost (minor) band, which defines the danger zone.
pub fn danger_radius(yield_kg: f64) -> f64 {
    HazardBand::Minor.base_radius_meters() * scale_factor(yield_kg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_yield_returns_base_radii() {
        let zones = compute_zones(1.0);
        for (zone, band) in zones.iter().zip(HazardBand::ALL) {
            assert_eq!(zone.band, band);
            assert_eq!(zone.radius_meters, band.base_radius_meters());
        }
    }

    #[test]
    fn radii_strictly_increase_outward() {
        for yield_kg in [0.001, 1.0, 15.0, 7_700.0, 1.0e9] {
            let zones = compute_zones(yield_kg);
            for pair in zones.windows(2) {
                assert!(
                    pair[0].radius_meters < pair[1].radius_meters,
                    "yield {yield_kg}: {:?} !< {:?}",
                    pair[0],
                    pair[1]
                );
            }
        }
    }

    #[test]
    fn scaling_yield_scales_radii_by_cube_root() {
        let base = compute_zones(20.0);
        let scaled = compute_zones(20.0 * 27.0);
        for (a, b) in base.iter().zip(scaled.iter()) {
            assert!((b.radius_meters / a.radius_meters - 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn non_positive_yield_collapses_to_zero() {
        for yield_kg in [0.0, -5.0] {
            assert!(compute_zones(yield_kg)
                .iter()
                .all(|zone| zone.radius_meters == 0.0));
            assert_eq!(danger_radius(yield_kg), 0.0);
        }
    }

    #[test]
    fn danger_radius_matches_minor_band() {
        let zones = compute_zones(1_000.0);
        assert!((danger_radius(1_000.0) - 2_000.0).abs() < 1e-9);
        assert_eq!(zones[3].radius_meters, danger_radius(1_000.0));
        assert_eq!(zones[3].band, HazardBand::Minor);
    }

    #[test]
    fn zone_serializes_with_camel_case_fields() {
        let json = serde_json::to_string(&compute_zones(1.0)[0]).unwrap();
        assert!(json.contains("\"radiusMeters\":25.0"));
        assert!(json.contains("\"colorHint\":\"#ff3838\""));
        assert!(json.contains("\"band\":\"lethal\""));
    }
}
