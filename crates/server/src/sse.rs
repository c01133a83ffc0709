//! GET /logs/stream — live progress lines over Server-Sent Events.
//!
//! With `?job_id=` the stream carries one job's lines; without it the
//! merged feed of every job. Each event's data is the raw LogEvent text,
//! which is all the client displays. Disconnecting only detaches the
//! subscriber; it never cancels the job.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, KeepAliveStream, Sse};
use futures::stream::{self, BoxStream, StreamExt};
use serde::Deserialize;
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;
use uuid::Uuid;

use crate::api::ApiError;
use crate::logs::{LogEvent, Subscription};
use crate::state::AppState;
use lernwerk_core::PipelineError;

#[derive(Deserialize)]
pub struct StreamQuery {
    pub job_id: Option<Uuid>,
}

type EventStream = BoxStream<'static, Result<Event, Infallible>>;

fn live_stream(rx: tokio::sync::broadcast::Receiver<LogEvent>) -> EventStream {
    BroadcastStream::new(rx)
        .filter_map(|result| async move {
            match result {
                Ok(event) => Some(Ok(Event::default().data(event.text))),
                // Lagged receiver: drop the gap and keep streaming.
                Err(e) => {
                    debug!(error = ?e, "SSE subscriber lagged");
                    None
                }
            }
        })
        .boxed()
}

pub async fn log_stream(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StreamQuery>,
) -> Result<Sse<KeepAliveStream<EventStream>>, ApiError> {
    let stream: EventStream = match query.job_id {
        None => {
            debug!("SSE subscriber connected to global feed");
            live_stream(state.logs.subscribe_global())
        }
        Some(job_id) => match state.logs.subscribe(job_id) {
            Subscription::Live(rx) => {
                debug!(job_id = %job_id, "SSE subscriber connected");
                live_stream(rx)
            }
            // Job already finished: replay the final line, then close.
            Subscription::Finished(line) => {
                stream::once(async move { Ok(Event::default().data(line.text)) }).boxed()
            }
            Subscription::Unknown => {
                return Err(ApiError(PipelineError::NotFound(format!("job {job_id}"))))
            }
        },
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}
