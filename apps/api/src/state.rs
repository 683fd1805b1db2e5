use std::sync::Arc;

use crate::config::Config;
use crate::cv_client::CvExtractor;
use crate::registration::Registrar;
use crate::wizard::session::WizardSessions;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub sessions: WizardSessions,
    /// CV extraction backend. Default: HttpCvExtractor.
    pub extractor: Arc<dyn CvExtractor>,
    /// Account registration backend. Default: HttpRegistrar.
    pub registrar: Arc<dyn Registrar>,
    pub config: Config,
}
