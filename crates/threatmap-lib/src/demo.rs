//! Fixed demonstration scenario around Bengaluru.

use chrono::{DateTime, Utc};

use crate::geo::Location;
use crate::threat::{Threat, ThreatSource};

struct DemoScenario {
    slug: &'static str,
    name: &'static str,
    location_name: &'static str,
    lat: f64,
    lng: f64,
    details: &'static str,
    yield_kg: f64,
    incident_type: &'static str,
    hazard_category: &'static str,
}

const SCENARIOS: [DemoScenario; 3] = [
    DemoScenario {
        slug: "mandur",
        name: "Waste Processing Plant Fire (Demo)",
        location_name: "Mandur, Bengaluru",
        lat: 13.0716,
        lng: 77.6946,
        details: "Demo scenario: waste processing plant fire releasing thick smoke.",
        yield_kg: 15.0,
        incident_type: "fire",
        hazard_category: "thermal",
    },
    DemoScenario {
        slug: "whitefield",
        name: "Structural Collapse (Demo)",
        location_name: "Whitefield, Bengaluru",
        lat: 12.9739,
        lng: 77.7499,
        details: "Demo scenario: construction site structural collapse.",
        yield_kg: 25.0,
        incident_type: "structural_collapse",
        hazard_category: "structural",
    },
    DemoScenario {
        slug: "ecity",
        name: "Chemical Spill (Demo)",
        location_name: "Electronic City, Bengaluru",
        lat: 12.8452,
        lng: 77.6602,
        details: "Demo scenario: chemical tanker spill on highway.",
        yield_kg: 10.0,
        incident_type: "chemical_leak",
        hazard_category: "chemical",
    },
];

/// The three demo threats, stamped with `now`. They never expire but are
/// ephemeral, so a demo clear or restart removes them.
pub fn demo_threats(now: DateTime<Utc>) -> Vec<Threat> {
    let millis = now.timestamp_millis();
    SCENARIOS
        .iter()
        .map(|s| {
            let mut threat = Threat::new(
                format!("demo_{}_{millis}", s.slug),
                s.name,
                Location::new(s.lat, s.lng),
                s.yield_kg,
            )
            .with_source(ThreatSource::Demo);
            threat.location_name = s.location_name.to_string();
            threat.details = s.details.to_string();
            threat.incident_type = Some(s.incident_type.to_string());
            threat.hazard_category = Some(s.hazard_category.to_string());
            threat.timestamp = Some(now);
            threat
        })
        .collect()
}
