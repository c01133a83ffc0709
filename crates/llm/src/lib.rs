pub mod curriculum;
pub mod prompts;
pub mod provider;
pub mod providers;
pub mod synthesizer;

pub use curriculum::CurriculumDecomposer;
pub use provider::{LlmError, LlmProvider, Message, Role};
pub use providers::create_provider;
pub use synthesizer::NoteSynthesizer;
