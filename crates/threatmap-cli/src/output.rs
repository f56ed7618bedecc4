//! Text and JSON rendering for CLI results.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;

use threatmap_lib::{EvacuationOutcome, HazardZone, Threat, TimeRemaining};

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Pretty JSON for any serializable result.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

pub fn format_zones_text(yield_kg: f64, zones: &[HazardZone]) -> String {
    let mut out = format!("Hazard zones for {yield_kg} kg:\n");
    for zone in zones {
        let _ = writeln!(
            out,
            "  {:<16} {:>10.1} m  {}  opacity {:.1}",
            zone.name, zone.radius_meters, zone.color_hint, zone.opacity
        );
    }
    out
}

fn format_expiry(threat: &Threat, now: DateTime<Utc>) -> String {
    match threat.time_remaining(now) {
        TimeRemaining::Unbounded => "never".to_string(),
        TimeRemaining::Expired => "expired".to_string(),
        TimeRemaining::Remaining { minutes, seconds } => format!("{minutes}m {seconds:02}s"),
    }
}

pub fn format_threats_text(threats: &[Threat], now: DateTime<Utc>) -> String {
    if threats.is_empty() {
        return "No threats.\n".to_string();
    }

    let mut out = format!("Threats ({}):\n", threats.len());
    let _ = writeln!(
        out,
        "{:<40} {:<32} {:<16} {:>9} {:>10}",
        "ID", "NAME", "SOURCE", "YIELD KG", "EXPIRES"
    );
    for threat in threats {
        let source = threat
            .source
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<40} {:<32} {:<16} {:>9.1} {:>10}",
            threat.id,
            truncate(&threat.name, 32),
            source,
            threat.yield_kg,
            format_expiry(threat, now)
        );
    }
    out
}

pub fn format_threat_text(threat: &Threat) -> String {
    format!(
        "Added threat {} ({}) at {} [{}]\n",
        threat.id,
        threat.name,
        threat.location,
        threat.source.map(|s| s.to_string()).unwrap_or_default()
    )
}

pub fn format_evacuation_text(outcome: &EvacuationOutcome) -> String {
    let EvacuationOutcome::Route {
        resolved,
        safe_exit,
        decision,
    } = outcome
    else {
        return "No active threat; no evacuation needed.\n".to_string();
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Threat:      {} ({:.0} m away, danger radius {:.0} m, {})",
        resolved.threat.name,
        resolved.distance_meters,
        resolved.danger_radius_meters,
        if resolved.is_inside { "INSIDE" } else { "outside" }
    );
    let _ = writeln!(out, "Safe exit:   {safe_exit}");
    let _ = writeln!(
        out,
        "Destination: {}{}",
        decision.destination_location,
        decision
            .facility_name
            .as_ref()
            .map(|n| format!(" ({n})"))
            .unwrap_or_default()
    );
    if let Some(waypoint) = &decision.waypoint_location {
        let _ = writeln!(out, "Via:         {waypoint}");
    }
    let _ = writeln!(out, "Selection:   {}", decision.selection_tag);
    let _ = writeln!(out, "Rationale:   {}", decision.rationale);
    let _ = writeln!(out, "Navigate:    {}", decision.navigation_url());
    out
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let mut cut: String = value.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
