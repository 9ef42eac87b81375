use crate::clients::auth::AuthProvider;
use crate::clients::storage::ObjectStore;
use crate::db::Database;
use crate::job_controller::state::JobsState;
use common::model::message::RealtimeMessage;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of the realtime fan-out; slow subscribers skip what they missed.
pub const REALTIME_BUFFER: usize = 256;

/// Everything a handler may need, injected once as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub store: Arc<dyn ObjectStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub jobs: JobsState,
    /// Every inserted chat message is published here for the event stream.
    pub realtime: broadcast::Sender<RealtimeMessage>,
    pub import_bucket: String,
}
