use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::Connection;

use crate::db::queries;
use crate::models::{Appointment, AppointmentStatus, NewAppointment};

/// The persistence boundary of the booking flow: accept a completed record
/// and durably store it, or fail as a whole. No partial-success states.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn submit(&self, record: &NewAppointment) -> anyhow::Result<Appointment>;
}

pub struct SqliteSubmissionStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteSubmissionStore {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SubmissionStore for SqliteSubmissionStore {
    async fn submit(&self, record: &NewAppointment) -> anyhow::Result<Appointment> {
        let now = Utc::now().naive_utc();
        let appointment = Appointment {
            id: uuid::Uuid::new_v4().to_string(),
            name: record.name.clone(),
            email: record.email.clone(),
            date: record.date,
            time: record.time,
            message: record.message.clone(),
            status: AppointmentStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let db = self.db.lock().unwrap();
        queries::create_appointment(&db, &appointment)?;
        Ok(appointment)
    }
}
