//! Process-wide service registry.
//!
//! Built once from a [`ServiceConfig`] and then handed to commands by
//! reference. [`ServiceRegistry::init`] installs it behind a [`OnceLock`] for
//! front-ends that want a global accessor.

use std::sync::OnceLock;

use statviz_analysis::{
    AnalysisBackend, AnalysisRequest, DesignClient, HttpBackend, MixedModelClient, MockBackend,
    NonParametricClient, ProbitClient, RequestTracker, SpatialClient, SurvivalClient,
    TransformClient, dispatch,
};
use statviz_assist::{
    AssistError, Assistant, AssistantSettings, DEFAULT_FILES, GeminiGenerator, KnowledgeBase,
};
use statviz_model::AnalysisResult;

use crate::config::{BackendMode, ServiceConfig};
use crate::error::{CoreError, Result};

static REGISTRY: OnceLock<ServiceRegistry> = OnceLock::new();

/// Backend shared across threads.
pub type SharedBackend = Box<dyn AnalysisBackend + Send + Sync>;

pub struct ServiceRegistry {
    config: ServiceConfig,
    backend: SharedBackend,
    spatial: SpatialClient,
    design: DesignClient,
    transform: TransformClient,
    nonparametric: NonParametricClient,
    mixed: MixedModelClient,
    survival: SurvivalClient,
    probit: ProbitClient,
    assistant: Option<Assistant>,
    tracker: RequestTracker,
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("backend", &self.backend.name())
            .field("assistant", &self.assistant.is_some())
            .finish_non_exhaustive()
    }
}

impl ServiceRegistry {
    /// Build every client described by `config`.
    ///
    /// The assistant is only built when an API key is configured; flows that
    /// need it report [`AssistError::MissingApiKey`] otherwise.
    pub fn from_config(config: ServiceConfig) -> Result<Self> {
        let timeout = config.timeout();
        let backend: SharedBackend = match config.backend.mode {
            BackendMode::Mock => Box::new(MockBackend),
            BackendMode::Remote => Box::new(HttpBackend::new(config.backend.url.clone(), timeout)?),
        };
        let spatial = SpatialClient::new(config.services.spatial_url.as_deref(), timeout)?;
        let design = DesignClient::new(
            config.services.rbd_url.as_deref(),
            config.services.frbd_url.as_deref(),
            timeout,
        )?;
        let transform = TransformClient::new(
            config.services.transform_analyze_url.as_deref(),
            config.services.transform_apply_url.as_deref(),
            timeout,
        )?;
        let urls = &config.services;
        let nonparametric = NonParametricClient::new(urls.nonparametric_url.as_deref(), timeout)?;
        let mixed =
            MixedModelClient::new(urls.lmm_url.as_deref(), urls.blup_url.as_deref(), timeout)?;
        let survival = SurvivalClient::new(urls.survival_url.as_deref(), timeout)?;
        let probit = ProbitClient::new(urls.probit_url.as_deref(), timeout)?;

        let assistant = match config.api_key() {
            Some(key) => {
                let generator = GeminiGenerator::new(key, timeout)?;
                Some(Assistant::new(Box::new(generator)))
            }
            None => None,
        }
        .map(|assistant| {
            assistant
                .with_settings(assistant_settings(&config))
                .with_knowledge(knowledge_base(&config))
        });

        tracing::debug!(
            backend = backend.name(),
            assistant = assistant.is_some(),
            "service registry built"
        );

        Ok(Self {
            config,
            backend,
            spatial,
            design,
            transform,
            nonparametric,
            mixed,
            survival,
            probit,
            assistant,
            tracker: RequestTracker::new(),
        })
    }

    /// Replace the analysis backend.
    #[must_use]
    pub fn with_backend(mut self, backend: SharedBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Replace the assistant, keeping the configured model settings.
    #[must_use]
    pub fn with_assistant(mut self, assistant: Assistant) -> Self {
        self.assistant = Some(assistant.with_settings(assistant_settings(&self.config)));
        self
    }

    /// Build from `config` and install as the global registry.
    pub fn init(config: ServiceConfig) -> Result<&'static Self> {
        Self::install(Self::from_config(config)?)
    }

    /// Install a prepared registry as the global one. Fails if one is
    /// already installed.
    pub fn install(registry: Self) -> Result<&'static Self> {
        REGISTRY
            .set(registry)
            .map_err(|_| CoreError::AlreadyInitialized)?;
        REGISTRY.get().ok_or(CoreError::AlreadyInitialized)
    }

    /// The global registry, if [`init`](Self::init) has run.
    pub fn global() -> Option<&'static Self> {
        REGISTRY.get()
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn backend(&self) -> &dyn AnalysisBackend {
        self.backend.as_ref()
    }

    pub fn spatial(&self) -> &SpatialClient {
        &self.spatial
    }

    pub fn design(&self) -> &DesignClient {
        &self.design
    }

    pub fn transform(&self) -> &TransformClient {
        &self.transform
    }

    pub fn nonparametric(&self) -> &NonParametricClient {
        &self.nonparametric
    }

    /// LMM and BLUP services.
    pub fn mixed(&self) -> &MixedModelClient {
        &self.mixed
    }

    pub fn survival(&self) -> &SurvivalClient {
        &self.survival
    }

    pub fn probit(&self) -> &ProbitClient {
        &self.probit
    }

    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }

    pub fn assistant(&self) -> Result<&Assistant> {
        self.assistant
            .as_ref()
            .ok_or(CoreError::Assist(AssistError::MissingApiKey))
    }

    /// Run one analysis, discarding the result if a newer one started
    /// meanwhile.
    pub fn analyze(&self, request: &AnalysisRequest) -> Option<AnalysisResult> {
        let ticket = self.tracker.begin();
        let result = dispatch(self.backend(), request);
        self.tracker.accept(ticket, result)
    }
}

fn assistant_settings(config: &ServiceConfig) -> AssistantSettings {
    AssistantSettings {
        model: config.llm.model.clone(),
        temperature: config.llm.temperature as f32,
    }
}

fn knowledge_base(config: &ServiceConfig) -> KnowledgeBase {
    match &config.llm.knowledge_dir {
        Some(dir) => KnowledgeBase::from_dir(dir, &DEFAULT_FILES),
        None => KnowledgeBase::default(),
    }
}

#[cfg(test)]
mod tests {
    use statviz_model::{AnalysisType, VariableMapping};

    use super::*;

    fn mock_config() -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.backend.mode = BackendMode::Mock;
        config
    }

    #[test]
    fn mock_mode_uses_mock_backend() {
        let registry = ServiceRegistry::from_config(mock_config()).expect("registry");
        assert_eq!(registry.backend().name(), "mock");
        let request =
            AnalysisRequest::new(Vec::new(), VariableMapping::default(), AnalysisType::Anova);
        let result = registry.analyze(&request).expect("current request");
        assert_eq!(result.title(), "One-Way ANOVA Results");
    }

    #[test]
    fn missing_api_key_disables_assistant() {
        let registry = ServiceRegistry::from_config(mock_config()).expect("registry");
        let err = registry.assistant().expect_err("no key");
        assert!(matches!(err, CoreError::Assist(AssistError::MissingApiKey)));
    }

    #[test]
    fn api_key_enables_assistant_with_configured_model() {
        let mut config = mock_config();
        config.llm.api_key = Some("test-key".to_string());
        config.llm.model = "gemini-custom".to_string();
        let registry = ServiceRegistry::from_config(config).expect("registry");
        let assistant = registry.assistant().expect("assistant");
        assert_eq!(assistant.settings().model, "gemini-custom");
    }

    #[test]
    fn unconfigured_services_have_no_url() {
        let registry = ServiceRegistry::from_config(mock_config()).expect("registry");
        assert!(registry.spatial().url().is_none());
    }
}
