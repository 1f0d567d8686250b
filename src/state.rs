use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tokio::sync::broadcast;

use crate::config::AppConfig;
use crate::models::SubmissionEvent;
use crate::services::content::ContentStore;
use crate::services::notify::Notifier;
use crate::services::submission::SubmissionStore;
use crate::services::uploads::UploadStore;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub submissions: Box<dyn SubmissionStore>,
    pub content: Box<dyn ContentStore>,
    pub uploads: Box<dyn UploadStore>,
    pub notifier: Box<dyn Notifier>,
    pub events_tx: broadcast::Sender<SubmissionEvent>,
}
