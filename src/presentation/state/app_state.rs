use std::sync::Arc;

use crate::application::services::{IngestionService, SummaryService};
use crate::infrastructure::emr::EmrProxy;
use crate::presentation::config::Settings;

#[derive(Clone)]
pub struct AppState {
    pub ingestion_service: Arc<IngestionService>,
    pub summary_service: Arc<SummaryService>,
    /// `None` when no EMR backend is configured.
    pub emr_proxy: Option<Arc<EmrProxy>>,
    pub settings: Arc<Settings>,
}
