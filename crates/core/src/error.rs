use thiserror::Error;
use uuid::Uuid;

/// Everything a pipeline stage can fail with.
///
/// Each variant carries a human-readable reason; the server maps variants
/// to HTTP status codes and the orchestrator writes the rendered message
/// into the job record and the final log line.
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    /// Malformed source reference. Not retried.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Source fetch failed after the internal retry.
    #[error("Source unavailable: {0}")]
    UnavailableSource(String),

    /// Content fetched but not in a usable shape. Not retried.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Upload exceeds the configured limit. Checked before a job exists.
    #[error("Payload too large: {size} bytes (limit {limit})")]
    PayloadTooLarge { size: usize, limit: usize },

    /// Downstream synthesis failed after the internal retry.
    #[error("Generation failed: {0}")]
    Generation(String),

    /// A module-generation job for this key is already running.
    #[error("Module {module_number} of curriculum {content_id} is already being generated")]
    AlreadyInProgress {
        content_id: Uuid,
        module_number: u32,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl PipelineError {
    /// HTTP status for this failure class.
    pub fn status_code(&self) -> u16 {
        match self {
            PipelineError::InvalidInput(_) => 400,
            PipelineError::UnavailableSource(_) => 502,
            PipelineError::UnsupportedFormat(_) => 415,
            PipelineError::PayloadTooLarge { .. } => 413,
            PipelineError::Generation(_) => 502,
            PipelineError::AlreadyInProgress { .. } => 409,
            PipelineError::NotFound(_) => 404,
            PipelineError::Store(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(PipelineError::InvalidInput("x".into()).status_code(), 400);
        assert_eq!(
            PipelineError::PayloadTooLarge { size: 11, limit: 10 }.status_code(),
            413
        );
        assert_eq!(
            PipelineError::AlreadyInProgress {
                content_id: Uuid::nil(),
                module_number: 2
            }
            .status_code(),
            409
        );
    }

    #[test]
    fn messages_are_human_readable() {
        let err = PipelineError::Generation("model returned empty output".into());
        assert_eq!(err.to_string(), "Generation failed: model returned empty output");
    }
}
