use std::future::Future;

use async_trait::async_trait;
use tracing::warn;

use lernwerk_core::{ExtractedContent, PipelineError, SourceDescriptor};

/// Capability that turns a raw source reference into normalized extracted
/// content. One implementation per `SourceDescriptor` variant, selected by
/// a single match at the orchestrator boundary.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn extract(&self, source: &SourceDescriptor)
        -> Result<ExtractedContent, PipelineError>;
}

/// Connection resets and timeouts get exactly one retry before surfacing
/// `UnavailableSource`.
fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

/// Run `op`; when the first failure is transient, run it exactly once
/// more and surface whatever the second attempt produces.
async fn with_one_retry<T, E, F, Fut>(mut op: F, transient: impl Fn(&E) -> bool) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    match op().await {
        Ok(v) => Ok(v),
        Err(first) if transient(&first) => {
            warn!(error = %first, "transient fetch failure, retrying once");
            op().await
        }
        Err(e) => Err(e),
    }
}

/// GET a URL, retrying once on a transient network failure.
pub(crate) async fn get_with_retry(
    client: &reqwest::Client,
    url: &str,
) -> Result<reqwest::Response, PipelineError> {
    with_one_retry(|| client.get(url).send(), is_transient)
        .await
        .map_err(|e| PipelineError::UnavailableSource(e.to_string()))
}

/// GET a URL and require a 2xx response.
pub(crate) async fn get_ok(
    client: &reqwest::Client,
    url: &str,
) -> Result<reqwest::Response, PipelineError> {
    let resp = get_with_retry(client, url).await?;
    if !resp.status().is_success() {
        return Err(PipelineError::UnavailableSource(format!(
            "{} returned HTTP {}",
            url,
            resp.status().as_u16()
        )));
    }
    Ok(resp)
}
