//! Log Broadcaster — per-job progress fan-out to any number of SSE
//! subscribers, plus a process-wide merged feed.
//!
//! Each job gets a small bounded broadcast channel created at submission.
//! Publishing never blocks: slow subscribers lag and lose the oldest
//! lines (broadcast semantics), and publishing with zero subscribers is
//! fine. After a job terminates its channel stays registered for a grace
//! period so a late subscriber still receives the final line.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

/// One human-readable progress line. Ephemeral — never persisted.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub job_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub text: String,
}

/// Per-job buffer size. Log volume is one line per stage, so this only
/// needs to absorb a briefly stalled reader.
const CHANNEL_CAPACITY: usize = 64;

struct JobChannel {
    tx: broadcast::Sender<LogEvent>,
    /// Set when the job reaches a terminal state; replayed to late
    /// subscribers until the channel is collected.
    final_line: Option<LogEvent>,
}

/// What a subscriber gets back for a job id.
pub enum Subscription {
    /// Job still running: live receiver.
    Live(broadcast::Receiver<LogEvent>),
    /// Job already finished: the final line, then close.
    Finished(LogEvent),
    /// Unknown or already collected job.
    Unknown,
}

pub struct LogBroadcaster {
    channels: Arc<Mutex<HashMap<Uuid, JobChannel>>>,
    global: broadcast::Sender<LogEvent>,
    grace: Duration,
}

impl LogBroadcaster {
    pub fn new(grace: Duration) -> Self {
        let (global, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            global,
            grace,
        }
    }

    /// Create the channel for a newly submitted job.
    pub fn register(&self, job_id: Uuid) {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        self.channels.lock().unwrap().insert(
            job_id,
            JobChannel {
                tx,
                final_line: None,
            },
        );
    }

    /// Publish one progress line. Fire-and-forget: the job makes progress
    /// even with zero subscribers listening.
    pub fn publish(&self, job_id: Uuid, text: impl Into<String>) {
        let event = LogEvent {
            job_id,
            timestamp: Utc::now(),
            text: text.into(),
        };
        debug!(job_id = %job_id, line = %event.text, "progress");
        if let Some(channel) = self.channels.lock().unwrap().get(&job_id) {
            let _ = channel.tx.send(event.clone());
        }
        let _ = self.global.send(event);
    }

    /// Publish the terminal line, mark the channel finished, and schedule
    /// it for collection after the grace period. Subscribers connected now
    /// still receive the line before the channel goes away.
    pub fn finish(&self, job_id: Uuid, text: impl Into<String>) {
        let event = LogEvent {
            job_id,
            timestamp: Utc::now(),
            text: text.into(),
        };
        {
            let mut channels = self.channels.lock().unwrap();
            if let Some(channel) = channels.get_mut(&job_id) {
                let _ = channel.tx.send(event.clone());
                channel.final_line = Some(event.clone());
            }
        }
        let _ = self.global.send(event);

        let channels = Arc::clone(&self.channels);
        let grace = self.grace;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            channels.lock().unwrap().remove(&job_id);
            debug!(job_id = %job_id, "log channel collected");
        });
    }

    /// Subscribe to one job's progress stream.
    pub fn subscribe(&self, job_id: Uuid) -> Subscription {
        let channels = self.channels.lock().unwrap();
        match channels.get(&job_id) {
            Some(channel) => match &channel.final_line {
                Some(line) => Subscription::Finished(line.clone()),
                None => Subscription::Live(channel.tx.subscribe()),
            },
            None => Subscription::Unknown,
        }
    }

    /// Subscribe to the merged feed of all jobs.
    pub fn subscribe_global(&self) -> broadcast::Receiver<LogEvent> {
        self.global.subscribe()
    }
}
