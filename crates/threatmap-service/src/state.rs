//! Application state shared by every handler.

use std::sync::Arc;

use tracing::{info, warn};

use threatmap_lib::{
    Error as LibError, EvacuationPlanner, FacilityCatalog, HttpAdvisor, HttpExtractor,
    HttpGeocoder, IngestionPipeline, NoAdvisor, RankingAdvisor, ThreatStore,
};

use crate::config::ServiceConfig;

/// Error during application state initialization.
#[derive(Debug)]
pub enum AppStateError {
    /// The threat store could not be located, read or reconciled.
    Store(LibError),

    /// The facility catalog file could not be loaded.
    Facilities(LibError),

    /// An HTTP collaborator client could not be constructed.
    Collaborator(LibError),
}

impl std::fmt::Display for AppStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(e) => write!(f, "failed to load threat store: {}", e),
            Self::Facilities(e) => write!(f, "failed to load facility catalog: {}", e),
            Self::Collaborator(e) => write!(f, "failed to build collaborator client: {}", e),
        }
    }
}

impl std::error::Error for AppStateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) | Self::Facilities(e) | Self::Collaborator(e) => Some(e),
        }
    }
}

/// Shared state for all axum handlers.
///
/// Cheap to clone (an `Arc` internally); hand it to the router via
/// [`crate::router`].
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<ThreatStore>,
    planner: EvacuationPlanner,
    ingestion: Option<Arc<IngestionPipeline>>,
}

impl AppState {
    /// Open and reconcile the store, then wire up the planner and (when
    /// configured) the ingestion pipeline.
    pub fn load(config: &ServiceConfig) -> Result<Self, AppStateError> {
        let path = config.store_path().map_err(AppStateError::Store)?;
        info!(path = %path.display(), "opening threat store");
        let store = Arc::new(ThreatStore::open(&path).map_err(AppStateError::Store)?);

        let report = store.reconcile_on_startup().map_err(AppStateError::Store)?;
        info!(
            total_before = report.total_before,
            removed_expired = report.removed_expired,
            removed_ephemeral = report.removed_ephemeral,
            seeded = report.seeded,
            total_after = report.total_after,
            "threat store reconciled"
        );

        let planner = build_planner(config)?;

        let ingestion = if config.ingestion_enabled() {
            config
                .ai_url
                .as_deref()
                .map(|ai_url| build_pipeline(ai_url, &store, config))
                .transpose()?
        } else {
            info!("news ingestion disabled; set THREATMAP_NEWS_URL and THREATMAP_AI_URL to enable");
            None
        };

        Ok(Self::from_components(store, planner, ingestion))
    }

    /// Assemble state from pre-built parts; used by tests and embedders.
    pub fn from_components(
        store: Arc<ThreatStore>,
        planner: EvacuationPlanner,
        ingestion: Option<Arc<IngestionPipeline>>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                planner,
                ingestion,
            }),
        }
    }

    pub fn store(&self) -> &ThreatStore {
        &self.inner.store
    }

    pub fn store_arc(&self) -> Arc<ThreatStore> {
        Arc::clone(&self.inner.store)
    }

    pub fn planner(&self) -> &EvacuationPlanner {
        &self.inner.planner
    }

    pub fn ingestion(&self) -> Option<&IngestionPipeline> {
        self.inner.ingestion.as_deref()
    }

    pub fn ingestion_arc(&self) -> Option<Arc<IngestionPipeline>> {
        self.inner.ingestion.clone()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("threat_count", &self.inner.store.len())
            .field("ingestion_enabled", &self.inner.ingestion.is_some())
            .finish()
    }
}

fn build_planner(config: &ServiceConfig) -> Result<EvacuationPlanner, AppStateError> {
    let catalog = match &config.facilities_path {
        Some(path) => {
            let catalog = FacilityCatalog::from_path(path).map_err(AppStateError::Facilities)?;
            info!(path = %path.display(), facilities = catalog.len(), "facility catalog loaded");
            catalog
        }
        None => {
            warn!("no facility catalog configured; evacuations will target the safe exit only");
            FacilityCatalog::new(Vec::new())
        }
    };

    let timeout = config.evacuation.collaborator_timeout;
    let advisor: Arc<dyn RankingAdvisor> = match &config.advisor_url {
        Some(url) => {
            info!(url = %url, "using HTTP facility advisor");
            Arc::new(HttpAdvisor::new(url, timeout).map_err(AppStateError::Collaborator)?)
        }
        None => Arc::new(NoAdvisor),
    };

    Ok(EvacuationPlanner::new(
        Arc::new(catalog),
        advisor,
        config.evacuation.clone(),
    ))
}

fn build_pipeline(
    ai_url: &str,
    store: &Arc<ThreatStore>,
    config: &ServiceConfig,
) -> Result<Arc<IngestionPipeline>, AppStateError> {
    let timeout = config.evacuation.collaborator_timeout;
    let extractor = HttpExtractor::new(ai_url, timeout).map_err(AppStateError::Collaborator)?;
    let geocoder = HttpGeocoder::new(ai_url, timeout).map_err(AppStateError::Collaborator)?;
    Ok(Arc::new(IngestionPipeline::new(
        Arc::clone(store),
        Arc::new(extractor),
        Arc::new(geocoder),
        timeout,
    )))
}
