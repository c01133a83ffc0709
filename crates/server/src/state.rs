//! Shared application state: configuration, capabilities, registries.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use lernwerk_core::Config;
use lernwerk_ingest::{CoursePageAdapter, PaperAdapter, SourceAdapter, YoutubeAdapter};
use lernwerk_llm::{create_provider, CurriculumDecomposer, LlmProvider, NoteSynthesizer};
use lernwerk_store::ContentStore;

use crate::jobs::JobRegistry;
use crate::logs::LogBroadcaster;

pub struct AppState {
    pub config: Config,
    pub store: ContentStore,
    pub logs: LogBroadcaster,
    pub jobs: JobRegistry,
    /// Source adapters, one per descriptor kind, selected by a single
    /// match at the orchestrator boundary.
    pub youtube: Box<dyn SourceAdapter>,
    pub course: Box<dyn SourceAdapter>,
    pub paper: Box<dyn SourceAdapter>,
    pub synthesizer: NoteSynthesizer,
    pub decomposer: CurriculumDecomposer,
    /// Provider for the stateless agent chat, outside the pipeline.
    pub chat: Box<dyn LlmProvider>,
}

impl AppState {
    /// Wire up real capabilities from config. Used by the binary; tests
    /// construct the struct directly with mock capabilities.
    pub fn from_config(config: Config) -> anyhow::Result<Arc<Self>> {
        let store = ContentStore::new(&config.storage.data_dir)
            .context("failed to initialize content store")?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("lernwerk/0.1")
            .build()
            .context("failed to build HTTP client")?;

        let synth_provider = create_provider(&config.llm, &config.llm.model)
            .context("failed to create synthesis LLM provider")?;
        let fast_provider = create_provider(&config.llm, &config.llm.fast_model)
            .context("failed to create curriculum LLM provider")?;
        let chat_provider = create_provider(&config.llm, &config.llm.model)
            .context("failed to create chat LLM provider")?;
        info!(provider = %config.llm.provider, model = %config.llm.model, "LLM providers ready");

        let synthesizer = NoteSynthesizer::new(
            synth_provider,
            config.llm.temperature,
            config.llm.max_tokens,
            config.limits.min_input_chars,
        );
        let decomposer = CurriculumDecomposer::new(fast_provider, config.llm.max_tokens);

        Ok(Arc::new(Self {
            logs: LogBroadcaster::new(Duration::from_secs(config.limits.log_grace_secs)),
            jobs: JobRegistry::new(),
            youtube: Box::new(YoutubeAdapter::new(client.clone())),
            course: Box::new(CoursePageAdapter::new(client.clone())),
            paper: Box::new(PaperAdapter::new(client)),
            synthesizer,
            decomposer,
            chat: chat_provider,
            store,
            config,
        }))
    }
}
