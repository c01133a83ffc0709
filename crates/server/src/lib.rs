pub mod agents;
pub mod api;
pub mod jobs;
pub mod logs;
pub mod router;
pub mod sse;
pub mod state;
