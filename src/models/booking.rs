use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::TimeSlot;

/// The active step of the booking widget. Exactly one step is active at a
/// time and the flow is linear: date, then time, then contact details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStep {
    SelectingDate,
    SelectingTime,
    ConfirmingDetails,
}

impl BookingStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStep::SelectingDate => "selecting_date",
            BookingStep::SelectingTime => "selecting_time",
            BookingStep::ConfirmingDetails => "confirming_details",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "selecting_time" => BookingStep::SelectingTime,
            "confirming_details" => BookingStep::ConfirmingDetails,
            _ => BookingStep::SelectingDate,
        }
    }
}

/// The in-progress state of one booking attempt. A draft belongs to exactly
/// one session and is discarded wholesale on successful submission.
///
/// Invariant: `selected_time` is `Some` only while `selected_date` is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingDraft {
    pub selected_date: Option<chrono::NaiveDate>,
    pub selected_time: Option<TimeSlot>,
    #[serde(default)]
    pub contact_name: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub message: String,
}

/// One persisted widget instance: its flow state plus a sliding expiry.
#[derive(Debug, Clone)]
pub struct BookingSession {
    pub id: String,
    pub flow: crate::services::booking::BookingFlow,
    pub last_activity: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}
