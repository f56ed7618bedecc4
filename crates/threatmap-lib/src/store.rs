//! Authoritative, file-backed collection of threat records.
//!
//! The in-memory vector behind the lock is the source of truth for readers.
//! Every mutation holds the write guard across "copy, mutate, persist, swap",
//! so two writers can never interleave a read-then-write, and readers only
//! ever observe a state that has already been written to disk.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::threat::{Threat, ThreatSource};

/// Default filename for the persisted threat list.
const STORE_FILENAME: &str = "threats.json";

/// Outcome of [`ThreatStore::reconcile_on_startup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub total_before: usize,
    pub removed_expired: usize,
    pub removed_ephemeral: usize,
    pub seeded: bool,
    pub total_after: usize,
}

impl ReconcileReport {
    pub fn changed(&self) -> bool {
        self.removed_expired > 0 || self.removed_ephemeral > 0 || self.seeded
    }
}

/// Outcome of [`ThreatStore::clear_ephemeral`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClearReport {
    pub removed: usize,
    pub remaining: usize,
}

/// Outcome of [`ThreatStore::seed_demo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub added: usize,
    pub total: usize,
}

/// Resolve the default store location using platform-specific project directories.
pub fn default_store_path() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("org", "threatmap", "threatmap").ok_or(Error::ProjectDirsUnavailable)?;
    Ok(dirs.data_dir().join(STORE_FILENAME))
}

/// Owned threat store. Share it behind an `Arc`; all methods take `&self`.
#[derive(Debug)]
pub struct ThreatStore {
    path: Option<PathBuf>,
    threats: RwLock<Vec<Threat>>,
}

impl ThreatStore {
    /// Open (or create) the store backed by the JSON file at `path`.
    ///
    /// A missing file is a first run: the store starts with only the sentinel
    /// record and writes it out. A file that exists but does not parse is an
    /// error; it is never silently replaced.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let initial = vec![Threat::sentinel(Utc::now())];
            write_threats(&path, &initial)?;
            info!(path = %path.display(), "created threat store with sentinel record");
            return Ok(Self {
                path: Some(path),
                threats: RwLock::new(initial),
            });
        }

        let raw = fs::read_to_string(&path)?;
        let threats: Vec<Threat> =
            serde_json::from_str(&raw).map_err(|e| Error::CorruptStore {
                path: path.clone(),
                message: e.to_string(),
            })?;

        debug!(path = %path.display(), count = threats.len(), "loaded threat store");

        Ok(Self {
            path: Some(path),
            threats: RwLock::new(threats),
        })
    }

    /// Store without a backing file, seeded with the sentinel record.
    pub fn in_memory() -> Self {
        Self::from_threats(vec![Threat::sentinel(Utc::now())])
    }

    /// Store without a backing file holding exactly `threats`.
    ///
    /// No sentinel is seeded and nothing is validated; fixtures only.
    #[doc(hidden)]
    pub fn from_threats(threats: Vec<Threat>) -> Self {
        Self {
            path: None,
            threats: RwLock::new(threats),
        }
    }

    /// Path of the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Snapshot of the stored threats, optionally hiding expired ones.
    pub fn list(&self, include_expired: bool) -> Vec<Threat> {
        self.list_at(include_expired, Utc::now())
    }

    pub fn list_at(&self, include_expired: bool, now: DateTime<Utc>) -> Vec<Threat> {
        let threats = self.read();
        if include_expired {
            threats.clone()
        } else {
            threats
                .iter()
                .filter(|t| !t.is_expired(now))
                .cloned()
                .collect()
        }
    }

    pub fn get(&self, id: &str) -> Option<Threat> {
        self.read().iter().find(|t| t.id == id).cloned()
    }

    pub fn exists(&self, id: &str) -> bool {
        self.read().iter().any(|t| t.id == id)
    }

    /// Insert a threat, filling in a generated id, timestamp and `admin`
    /// source when absent.
    pub fn add(&self, threat: Threat) -> Result<Threat> {
        self.add_at(threat, Utc::now())
    }

    pub fn add_at(&self, threat: Threat, now: DateTime<Utc>) -> Result<Threat> {
        let threat = normalize(threat, now)?;

        let added = self.mutate(|threats| {
            if threats.iter().any(|t| t.id == threat.id) {
                return Err(Error::InvalidThreat {
                    message: format!("a threat with id '{}' already exists", threat.id),
                });
            }
            threats.push(threat.clone());
            Ok((threat, true))
        })?;

        match added.expires_at {
            Some(expires_at) => info!(
                id = %added.id,
                name = %added.name,
                expires_at = %expires_at.to_rfc3339(),
                "added threat"
            ),
            None => info!(id = %added.id, name = %added.name, "added permanent threat"),
        }

        Ok(added)
    }

    /// Remove a threat by id. Returns `false` when nothing matched.
    ///
    /// The sentinel record is never removed.
    pub fn remove(&self, id: &str) -> Result<bool> {
        if id == crate::threat::SENTINEL_THREAT_ID {
            warn!(id, "refusing to remove the sentinel threat");
            return Ok(false);
        }

        let removed = self.mutate(|threats| {
            let before = threats.len();
            threats.retain(|t| t.id != id);
            let removed = threats.len() < before;
            Ok((removed, removed))
        })?;

        if removed {
            info!(id, "deleted threat");
        }
        Ok(removed)
    }

    /// Startup cleanup: drop expired and ephemeral records, then make sure
    /// the sentinel exists. Writes only when something changed.
    pub fn reconcile_on_startup(&self) -> Result<ReconcileReport> {
        self.reconcile_on_startup_at(Utc::now())
    }

    pub fn reconcile_on_startup_at(&self, now: DateTime<Utc>) -> Result<ReconcileReport> {
        let report = self.mutate(|threats| {
            let total_before = threats.len();
            let mut removed_expired = 0;
            let mut removed_ephemeral = 0;

            threats.retain(|t| {
                if t.is_expired(now) {
                    removed_expired += 1;
                    false
                } else if !t.is_persistent() {
                    removed_ephemeral += 1;
                    false
                } else {
                    true
                }
            });

            let seeded = ensure_sentinel(threats, now);
            let report = ReconcileReport {
                total_before,
                removed_expired,
                removed_ephemeral,
                seeded,
                total_after: threats.len(),
            };
            Ok((report, report.changed()))
        })?;

        if report.changed() {
            info!(
                total_before = report.total_before,
                removed_expired = report.removed_expired,
                removed_ephemeral = report.removed_ephemeral,
                seeded = report.seeded,
                total_after = report.total_after,
                "startup threat cleanup complete"
            );
        } else {
            debug!("loaded existing threats, no cleanup needed");
        }

        Ok(report)
    }

    /// Remove every non-persistent threat (demo reset).
    pub fn clear_ephemeral(&self) -> Result<ClearReport> {
        self.clear_ephemeral_at(Utc::now())
    }

    pub fn clear_ephemeral_at(&self, now: DateTime<Utc>) -> Result<ClearReport> {
        let report = self.mutate(|threats| {
            let before = threats.len();
            threats.retain(Threat::is_persistent);
            let removed = before - threats.len();
            let seeded = ensure_sentinel(threats, now);
            let report = ClearReport {
                removed,
                remaining: threats.len(),
            };
            Ok((report, removed > 0 || seeded))
        })?;

        info!(
            removed = report.removed,
            remaining = report.remaining,
            "cleared ephemeral threats"
        );
        Ok(report)
    }

    /// Drop records whose expiry has passed. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize> {
        self.purge_expired_at(Utc::now())
    }

    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> Result<usize> {
        let removed = self.mutate(|threats| {
            let before = threats.len();
            threats.retain(|t| !t.is_expired(now));
            let removed = before - threats.len();
            let seeded = ensure_sentinel(threats, now);
            Ok((removed, removed > 0 || seeded))
        })?;

        if removed > 0 {
            info!(removed, "purged expired threats");
        }
        Ok(removed)
    }

    /// Replace all ephemeral records with `demo` while keeping persistent ones.
    pub fn seed_demo(&self, demo: Vec<Threat>) -> Result<SeedReport> {
        self.seed_demo_at(demo, Utc::now())
    }

    pub fn seed_demo_at(&self, demo: Vec<Threat>, now: DateTime<Utc>) -> Result<SeedReport> {
        let demo = demo
            .into_iter()
            .map(|t| normalize(t, now))
            .collect::<Result<Vec<_>>>()?;

        let report = self.mutate(|threats| {
            threats.retain(Threat::is_persistent);
            let kept = threats.len();
            ensure_sentinel(threats, now);
            let added = demo.len();
            threats.extend(demo);
            let report = SeedReport {
                added,
                total: threats.len(),
            };
            debug!(kept, "persistent threats kept while seeding demo");
            Ok((report, true))
        })?;

        info!(
            added = report.added,
            total = report.total,
            "seeded demo threats"
        );
        Ok(report)
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Threat>> {
        self.threats.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Threat>> {
        self.threats.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` on a copy of the current records; when it reports a change,
    /// persist the copy and only then publish it to readers.
    fn mutate<T>(&self, f: impl FnOnce(&mut Vec<Threat>) -> Result<(T, bool)>) -> Result<T> {
        let mut guard = self.write();
        let mut next = guard.clone();
        let (out, changed) = f(&mut next)?;

        if changed {
            if let Some(path) = &self.path {
                write_threats(path, &next)?;
            }
            *guard = next;
        }

        Ok(out)
    }
}

/// Fill in defaults and derive the persistence flag.
fn normalize(mut threat: Threat, now: DateTime<Utc>) -> Result<Threat> {
    if threat.name.trim().is_empty() {
        return Err(Error::InvalidThreat {
            message: "name is required".to_string(),
        });
    }
    if !threat.location.is_valid() {
        return Err(Error::InvalidThreat {
            message: format!("location {} is out of range", threat.location),
        });
    }

    if !threat.yield_kg.is_finite() || threat.yield_kg < 0.0 {
        return Err(Error::InvalidThreat {
            message: format!("yield must be a finite number >= 0, got {}", threat.yield_kg),
        });
    }

    if threat.id.trim().is_empty() {
        threat.id = Uuid::now_v7().to_string();
    }
    if threat.timestamp.is_none() {
        threat.timestamp = Some(now);
    }
    if threat.source.is_none() {
        threat.source = Some(ThreatSource::Admin);
    }
    threat.persistent = threat.is_persistent();

    Ok(threat)
}

fn ensure_sentinel(threats: &mut Vec<Threat>, now: DateTime<Utc>) -> bool {
    if threats.iter().any(Threat::is_sentinel) {
        return false;
    }
    info!("seeding missing sentinel threat");
    threats.push(Threat::sentinel(now));
    true
}

/// Atomically replace `path` with the pretty-printed JSON for `threats`.
fn write_threats(path: &Path, threats: &[Threat]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer_pretty(&mut writer, threats)?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;

    debug!(path = %path.display(), count = threats.len(), "persisted threats");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Location;
    use crate::threat::SENTINEL_THREAT_ID;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn threat(id: &str, source: ThreatSource) -> Threat {
        Threat::new(id, id, Location::new(12.97, 77.59), 10.0).with_source(source)
    }

    #[test]
    fn list_hides_expired_unless_requested() {
        let store = ThreatStore::from_threats(vec![
            threat("old", ThreatSource::Demo).with_expiry(Some(at(50))),
            threat("new", ThreatSource::Demo).with_expiry(Some(at(500))),
        ]);

        let active: Vec<_> = store.list_at(false, at(100)).into_iter().map(|t| t.id).collect();
        assert_eq!(active, vec!["new"]);
        assert_eq!(store.list_at(true, at(100)).len(), 2);
    }

    #[test]
    fn add_fills_defaults_and_derives_persistence() {
        let store = ThreatStore::from_threats(Vec::new());
        let mut partial = Threat::new("", "Admin entry", Location::new(1.0, 2.0), 5.0);
        partial.timestamp = None;

        let added = store.add_at(partial, at(42)).unwrap();
        assert!(!added.id.is_empty());
        assert_eq!(added.timestamp, Some(at(42)));
        assert_eq!(added.source, Some(ThreatSource::Admin));
        assert!(added.persistent);
        assert!(store.exists(&added.id));
    }

    #[test]
    fn add_rejects_duplicates_and_invalid_records() {
        let store = ThreatStore::in_memory();
        let dup = threat(SENTINEL_THREAT_ID, ThreatSource::Admin);
        assert!(matches!(store.add(dup), Err(Error::InvalidThreat { .. })));

        let nameless = Threat::new("x", "  ", Location::new(0.0, 0.0), 1.0);
        assert!(matches!(store.add(nameless), Err(Error::InvalidThreat { .. })));

        let off_map = Threat::new("y", "bad", Location::new(123.0, 0.0), 1.0);
        assert!(matches!(store.add(off_map), Err(Error::InvalidThreat { .. })));

        for bad_yield in [f64::NAN, f64::INFINITY, -5.0] {
            let threat = Threat::new("z", "bad yield", Location::new(0.0, 0.0), bad_yield);
            assert!(matches!(store.add(threat), Err(Error::InvalidThreat { .. })));
        }
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_reports_whether_anything_matched() {
        let store = ThreatStore::from_threats(vec![threat("a", ThreatSource::Demo)]);
        assert!(store.remove("a").unwrap());
        assert!(!store.remove("a").unwrap());
        assert!(!store.exists("a"));
    }

    #[test]
    fn sentinel_cannot_be_removed() {
        let store = ThreatStore::in_memory();
        assert!(!store.remove(SENTINEL_THREAT_ID).unwrap());
        assert!(store.exists(SENTINEL_THREAT_ID));
    }

    #[test]
    fn reconcile_keeps_only_active_persistent_and_sentinel() {
        let mut flagged = threat("expired-persistent", ThreatSource::Simulator);
        flagged.persistent = true;
        let store = ThreatStore::from_threats(vec![
            flagged.with_expiry(Some(at(10))),
            threat("active-ephemeral", ThreatSource::Demo).with_expiry(Some(at(1_000))),
            threat("active-persistent", ThreatSource::Admin),
        ]);

        let report = store.reconcile_on_startup_at(at(100)).unwrap();

        let ids: Vec<_> = store.list_at(true, at(100)).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["active-persistent", SENTINEL_THREAT_ID]);
        assert_eq!(report.removed_expired, 1);
        assert_eq!(report.removed_ephemeral, 1);
        assert!(report.seeded);
        assert_eq!(report.total_after, 2);
    }

    #[test]
    fn reconcile_without_changes_reports_unchanged() {
        let store = ThreatStore::in_memory();
        let report = store.reconcile_on_startup().unwrap();
        assert!(!report.changed());
        assert_eq!(report.total_after, 1);
    }

    #[test]
    fn clear_ephemeral_is_idempotent() {
        let store = ThreatStore::from_threats(vec![
            threat("demo-1", ThreatSource::Demo),
            threat("news-1", ThreatSource::SimulationNews),
            threat("admin-1", ThreatSource::Admin),
        ]);

        let first = store.clear_ephemeral().unwrap();
        assert_eq!(first.removed, 2);
        assert_eq!(first.remaining, 2);
        let after_first = store.list(true);

        let second = store.clear_ephemeral().unwrap();
        assert_eq!(second.removed, 0);
        assert_eq!(second.remaining, 2);
        assert_eq!(store.list(true), after_first);
        assert!(store.exists(SENTINEL_THREAT_ID));
    }

    #[test]
    fn purge_expired_drops_only_expired_records() {
        let store = ThreatStore::from_threats(vec![
            Threat::sentinel(at(0)),
            threat("gone", ThreatSource::SimulationNews).with_expiry(Some(at(5))),
            threat("kept", ThreatSource::SimulationNews).with_expiry(Some(at(500))),
        ]);

        assert_eq!(store.purge_expired_at(at(10)).unwrap(), 1);
        assert_eq!(store.purge_expired_at(at(10)).unwrap(), 0);
        assert!(store.exists("kept"));
    }

    #[test]
    fn seed_demo_replaces_ephemeral_threats() {
        let store = ThreatStore::from_threats(vec![
            Threat::sentinel(at(0)),
            threat("stale-demo", ThreatSource::Demo),
            threat("admin", ThreatSource::Admin),
        ]);

        let report = store
            .seed_demo_at(
                vec![
                    threat("demo-a", ThreatSource::Demo),
                    threat("demo-b", ThreatSource::Demo),
                ],
                at(0),
            )
            .unwrap();

        assert_eq!(report.added, 2);
        assert_eq!(report.total, 4);
        assert!(!store.exists("stale-demo"));
        assert!(store.exists("demo-a"));
    }
}
