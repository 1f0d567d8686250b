use chrono::NaiveDateTime;
use serde::Serialize;

use super::Appointment;

/// Broadcast to the admin event stream whenever a visitor submission lands.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionEvent {
    pub kind: SubmissionKind,
    pub summary: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    Appointment,
    ContactMessage,
}

impl SubmissionEvent {
    pub fn appointment(appointment: &Appointment) -> Self {
        SubmissionEvent {
            kind: SubmissionKind::Appointment,
            summary: format!(
                "{} booked {} at {}",
                appointment.name,
                appointment.date,
                appointment.time.label()
            ),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    pub fn contact_message(name: &str) -> Self {
        SubmissionEvent {
            kind: SubmissionKind::ContactMessage,
            summary: format!("New message from {name}"),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}
