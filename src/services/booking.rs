use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{
    Appointment, BookingDraft, BookingSession, BookingStep, NewAppointment, SubmissionEvent,
    TimeSlot,
};
use crate::services::notify::{Notice, Notifier, Severity};
use crate::services::submission::SubmissionStore;
use crate::state::AppState;

/// Booking sessions slide forward on every event and drop off after this.
const SESSION_TTL_MINUTES: i64 = 30;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FlowError {
    #[error("that date has already passed")]
    PastDate,
    #[error("that action is not available at this step")]
    WrongStep,
    #[error("please enter your name")]
    MissingName,
    #[error("please enter your email address")]
    MissingEmail,
    #[error("that email address does not look valid")]
    InvalidEmail,
    #[error("no date selected")]
    MissingDate,
    #[error("no time selected")]
    MissingTime,
    #[error("a submission is already in progress")]
    SubmissionInFlight,
}

/// The booking widget's state machine. The flow is strictly linear with
/// three back edges; every mutation goes through these methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingFlow {
    pub step: BookingStep,
    pub draft: BookingDraft,
    #[serde(default)]
    pub in_flight: bool,
}

impl Default for BookingFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingFlow {
    pub fn new() -> Self {
        BookingFlow {
            step: BookingStep::SelectingDate,
            draft: BookingDraft::default(),
            in_flight: false,
        }
    }

    /// Pick a day from the calendar. Past days never fire a transition;
    /// re-picking while a date is already chosen just replaces it.
    pub fn select_date(&mut self, date: NaiveDate, today: NaiveDate) -> Result<(), FlowError> {
        if self.step == BookingStep::ConfirmingDetails {
            return Err(FlowError::WrongStep);
        }
        if date < today {
            return Err(FlowError::PastDate);
        }

        self.draft.selected_date = Some(date);
        self.draft.selected_time = None;
        self.step = BookingStep::SelectingTime;
        Ok(())
    }

    pub fn select_time(&mut self, slot: TimeSlot) -> Result<(), FlowError> {
        if self.step != BookingStep::SelectingTime {
            return Err(FlowError::WrongStep);
        }

        self.draft.selected_time = Some(slot);
        self.step = BookingStep::ConfirmingDetails;
        Ok(())
    }

    /// Step backwards. From the time step the date is cleared; from the
    /// details step only the time is, so the date survives. At the first
    /// step there is nothing to go back to.
    pub fn back(&mut self) {
        match self.step {
            BookingStep::SelectingDate => {}
            BookingStep::SelectingTime => {
                self.draft.selected_date = None;
                self.step = BookingStep::SelectingDate;
            }
            BookingStep::ConfirmingDetails => {
                self.draft.selected_time = None;
                self.step = BookingStep::SelectingTime;
            }
        }
    }

    /// Validation gate ahead of the submission store. On success the
    /// contact details are recorded on the draft, the in-flight flag is
    /// raised and the completed record is returned; rejected input leaves
    /// the step unchanged.
    pub fn begin_submit(
        &mut self,
        name: &str,
        email: &str,
        message: Option<&str>,
    ) -> Result<NewAppointment, FlowError> {
        if self.step != BookingStep::ConfirmingDetails {
            return Err(FlowError::WrongStep);
        }
        if self.in_flight {
            return Err(FlowError::SubmissionInFlight);
        }

        self.draft.contact_name = name.trim().to_string();
        self.draft.contact_email = email.trim().to_string();
        self.draft.message = message.unwrap_or("").trim().to_string();

        let date = self.draft.selected_date.ok_or(FlowError::MissingDate)?;
        let time = self.draft.selected_time.ok_or(FlowError::MissingTime)?;
        if self.draft.contact_name.is_empty() {
            return Err(FlowError::MissingName);
        }
        if self.draft.contact_email.is_empty() {
            return Err(FlowError::MissingEmail);
        }
        if !looks_like_email(&self.draft.contact_email) {
            return Err(FlowError::InvalidEmail);
        }

        let message = if self.draft.message.is_empty() {
            format!("Appointment request for {} at {}", date, time.label())
        } else {
            self.draft.message.clone()
        };

        self.in_flight = true;
        Ok(NewAppointment {
            name: self.draft.contact_name.clone(),
            email: self.draft.contact_email.clone(),
            date,
            time,
            message,
        })
    }

    /// Record the submission outcome. Success discards the draft and
    /// returns the machine to the date step; failure keeps everything so
    /// the visitor can simply resubmit.
    pub fn finish_submit(&mut self, stored: bool) {
        self.in_flight = false;
        if stored {
            *self = BookingFlow::new();
        }
    }

    /// Run the full submit edge against the given collaborators. Every
    /// outcome raises exactly one notification.
    pub async fn submit(
        &mut self,
        name: &str,
        email: &str,
        message: Option<&str>,
        store: &dyn SubmissionStore,
        notifier: &dyn Notifier,
    ) -> SubmitOutcome {
        let record = match self.begin_submit(name, email, message) {
            Ok(record) => record,
            Err(e) => {
                send_notice(notifier, rejection_notice(&e)).await;
                return SubmitOutcome::Rejected(e);
            }
        };

        match store.submit(&record).await {
            Ok(appointment) => {
                self.finish_submit(true);
                send_notice(notifier, success_notice(&record)).await;
                SubmitOutcome::Stored(appointment)
            }
            Err(e) => {
                self.finish_submit(false);
                tracing::error!(error = %e, "appointment submission failed");
                send_notice(notifier, failure_notice()).await;
                SubmitOutcome::Failed
            }
        }
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Stored(Appointment),
    Rejected(FlowError),
    Failed,
}

fn looks_like_email(s: &str) -> bool {
    // Presence plus a plausible shape; real verification happens over email.
    match s.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    }
}

fn rejection_notice(err: &FlowError) -> Notice {
    Notice {
        title: "Could not book appointment".to_string(),
        description: err.to_string(),
        severity: Severity::Destructive,
    }
}

fn success_notice(record: &NewAppointment) -> Notice {
    Notice {
        title: "Appointment requested".to_string(),
        description: format!(
            "{} at {} is reserved. A confirmation will be sent to {}.",
            record.date,
            record.time.label(),
            record.email
        ),
        severity: Severity::Default,
    }
}

fn failure_notice() -> Notice {
    Notice {
        title: "Submission failed".to_string(),
        description: "We could not save your appointment. Please try again.".to_string(),
        severity: Severity::Destructive,
    }
}

async fn send_notice(notifier: &dyn Notifier, notice: Notice) {
    if let Err(e) = notifier.notify(&notice).await {
        tracing::warn!(error = %e, "failed to deliver notification");
    }
}

// ── Session-driven events (the HTTP surface of the widget) ──

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BookingEvent {
    SelectDate { date: NaiveDate },
    SelectTime { slot: TimeSlot },
    Back,
    Submit {
        name: String,
        email: String,
        message: Option<String>,
    },
}

impl BookingEvent {
    fn name(&self) -> &'static str {
        match self {
            BookingEvent::SelectDate { .. } => "select_date",
            BookingEvent::SelectTime { .. } => "select_time",
            BookingEvent::Back => "back",
            BookingEvent::Submit { .. } => "submit",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventReply {
    pub accepted: bool,
    pub error: Option<String>,
    pub step: BookingStep,
    pub draft: BookingDraft,
}

impl EventReply {
    fn ok(flow: &BookingFlow) -> Self {
        EventReply {
            accepted: true,
            error: None,
            step: flow.step,
            draft: flow.draft.clone(),
        }
    }

    fn rejected(flow: &BookingFlow, error: String) -> Self {
        EventReply {
            accepted: false,
            error: Some(error),
            step: flow.step,
            draft: flow.draft.clone(),
        }
    }
}

pub fn new_session() -> BookingSession {
    let now = Utc::now().naive_utc();
    BookingSession {
        id: uuid::Uuid::new_v4().to_string(),
        flow: BookingFlow::new(),
        last_activity: now,
        expires_at: now + Duration::minutes(SESSION_TTL_MINUTES),
    }
}

/// Load the session, apply one widget event, persist the result. This is
/// the only writer of session rows.
pub async fn process_event(
    state: &Arc<AppState>,
    session_id: &str,
    event: BookingEvent,
) -> Result<EventReply, AppError> {
    let mut session = {
        let db = state.db.lock().unwrap();
        queries::get_booking_session(&db, session_id)?
    }
    .ok_or_else(|| AppError::NotFound(format!("booking session {session_id}")))?;

    let today = Utc::now().date_naive();
    tracing::info!(
        session = session_id,
        step = session.flow.step.as_str(),
        event = event.name(),
        "applying booking event"
    );

    let reply = match event {
        BookingEvent::SelectDate { date } => {
            match session.flow.select_date(date, today) {
                Ok(()) => EventReply::ok(&session.flow),
                Err(e) => EventReply::rejected(&session.flow, e.to_string()),
            }
        }
        BookingEvent::SelectTime { slot } => match session.flow.select_time(slot) {
            Ok(()) => EventReply::ok(&session.flow),
            Err(e) => EventReply::rejected(&session.flow, e.to_string()),
        },
        BookingEvent::Back => {
            session.flow.back();
            EventReply::ok(&session.flow)
        }
        BookingEvent::Submit {
            name,
            email,
            message,
        } => {
            // Re-load, check and mark in-flight under one lock acquisition,
            // so two submits racing on the same session cannot both pass
            // the guard. A submit arriving while the store call is pending
            // then sees the persisted marker.
            let begun = {
                let db = state.db.lock().unwrap();
                session = queries::get_booking_session(&db, session_id)?
                    .ok_or_else(|| AppError::NotFound(format!("booking session {session_id}")))?;
                let begun = session.flow.begin_submit(&name, &email, message.as_deref());
                if begun.is_ok() {
                    touch(&mut session);
                    queries::save_booking_session(&db, &session)?;
                }
                begun
            };

            match begun {
                Err(e) => {
                    send_notice(state.notifier.as_ref(), rejection_notice(&e)).await;
                    EventReply::rejected(&session.flow, e.to_string())
                }
                Ok(record) => match state.submissions.submit(&record).await {
                    Ok(appointment) => {
                        session.flow.finish_submit(true);
                        send_notice(state.notifier.as_ref(), success_notice(&record)).await;
                        let _ = state.events_tx.send(SubmissionEvent::appointment(&appointment));
                        EventReply::ok(&session.flow)
                    }
                    Err(e) => {
                        session.flow.finish_submit(false);
                        tracing::error!(error = %e, "appointment submission failed");
                        send_notice(state.notifier.as_ref(), failure_notice()).await;
                        EventReply::rejected(&session.flow, "submission failed".to_string())
                    }
                },
            }
        }
    };

    touch_and_save(state, &mut session)?;
    Ok(reply)
}

fn touch(session: &mut BookingSession) {
    let now = Utc::now().naive_utc();
    session.last_activity = now;
    session.expires_at = now + Duration::minutes(SESSION_TTL_MINUTES);
}

fn touch_and_save(state: &Arc<AppState>, session: &mut BookingSession) -> Result<(), AppError> {
    touch(session);
    let db = state.db.lock().unwrap();
    queries::save_booking_session(&db, session)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    struct RecordingNotifier {
        notices: Mutex<Vec<Notice>>,
    }

    impl RecordingNotifier {
        fn new() -> Self {
            Self {
                notices: Mutex::new(vec![]),
            }
        }

        fn count(&self) -> usize {
            self.notices.lock().unwrap().len()
        }

        fn last_severity(&self) -> Severity {
            self.notices.lock().unwrap().last().unwrap().severity
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, notice: &Notice) -> anyhow::Result<()> {
            self.notices.lock().unwrap().push(notice.clone());
            Ok(())
        }
    }

    struct RecordingStore {
        submitted: Mutex<Vec<NewAppointment>>,
        fail: bool,
    }

    impl RecordingStore {
        fn new(fail: bool) -> Self {
            Self {
                submitted: Mutex::new(vec![]),
                fail,
            }
        }

        fn count(&self) -> usize {
            self.submitted.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SubmissionStore for RecordingStore {
        async fn submit(&self, record: &NewAppointment) -> anyhow::Result<Appointment> {
            if self.fail {
                anyhow::bail!("backend unavailable");
            }
            self.submitted.lock().unwrap().push(record.clone());
            let now = Utc::now().naive_utc();
            Ok(Appointment {
                id: "appt-1".to_string(),
                name: record.name.clone(),
                email: record.email.clone(),
                date: record.date,
                time: record.time,
                message: record.message.clone(),
                status: crate::models::AppointmentStatus::Pending,
                created_at: now,
                updated_at: now,
            })
        }
    }

    fn flow_at_details(day: &str, slot: TimeSlot) -> BookingFlow {
        let mut flow = BookingFlow::new();
        flow.select_date(date(day), date("2024-06-15")).unwrap();
        flow.select_time(slot).unwrap();
        flow
    }

    #[test]
    fn test_time_is_only_set_with_a_date() {
        let mut flow = BookingFlow::new();

        // time selection is impossible before a date exists
        assert_eq!(flow.select_time(TimeSlot::TenAm), Err(FlowError::WrongStep));
        assert!(flow.draft.selected_time.is_none());

        flow.select_date(date("2024-07-01"), date("2024-06-15")).unwrap();
        flow.select_time(TimeSlot::TenAm).unwrap();
        assert!(flow.draft.selected_date.is_some());
        assert!(flow.draft.selected_time.is_some());

        // backing out of the time step clears the date, and the invariant
        // holds again
        flow.back();
        flow.back();
        assert!(flow.draft.selected_date.is_none());
        assert!(flow.draft.selected_time.is_none());
    }

    #[test]
    fn test_past_date_is_rejected() {
        let mut flow = BookingFlow::new();
        let result = flow.select_date(date("2024-06-14"), date("2024-06-15"));
        assert_eq!(result, Err(FlowError::PastDate));
        assert_eq!(flow.step, BookingStep::SelectingDate);
        assert!(flow.draft.selected_date.is_none());
    }

    #[test]
    fn test_today_is_selectable() {
        let mut flow = BookingFlow::new();
        flow.select_date(date("2024-06-15"), date("2024-06-15")).unwrap();
        assert_eq!(flow.step, BookingStep::SelectingTime);
    }

    #[test]
    fn test_reselecting_same_date_is_idempotent() {
        let mut flow = BookingFlow::new();
        let today = date("2024-06-15");
        flow.select_date(date("2024-07-01"), today).unwrap();
        flow.select_date(date("2024-07-01"), today).unwrap();

        assert_eq!(flow.step, BookingStep::SelectingTime);
        assert_eq!(flow.draft.selected_date, Some(date("2024-07-01")));
        assert!(flow.draft.selected_time.is_none());
    }

    #[test]
    fn test_back_then_reselect_restores_details_step() {
        let mut flow = flow_at_details("2024-07-01", TimeSlot::TenAm);
        let before = flow.draft.clone();

        flow.back();
        assert_eq!(flow.step, BookingStep::SelectingTime);
        assert_eq!(flow.draft.selected_date, Some(date("2024-07-01")));
        assert!(flow.draft.selected_time.is_none());

        flow.select_time(TimeSlot::TenAm).unwrap();
        assert_eq!(flow.step, BookingStep::ConfirmingDetails);
        assert_eq!(flow.draft, before);
    }

    #[test]
    fn test_back_from_details_keeps_date() {
        let mut flow = flow_at_details("2024-07-01", TimeSlot::FourPm);
        flow.back();
        assert_eq!(flow.draft.selected_date, Some(date("2024-07-01")));
        assert!(flow.draft.selected_time.is_none());
    }

    #[tokio::test]
    async fn test_submit_with_empty_name_never_reaches_store() {
        let mut flow = flow_at_details("2024-07-01", TimeSlot::TenAm);
        let store = RecordingStore::new(false);
        let notifier = RecordingNotifier::new();

        let outcome = flow.submit("", "ana@x.com", None, &store, &notifier).await;

        assert!(matches!(outcome, SubmitOutcome::Rejected(FlowError::MissingName)));
        assert_eq!(store.count(), 0);
        assert_eq!(notifier.count(), 1);
        assert_eq!(notifier.last_severity(), Severity::Destructive);
        assert_eq!(flow.step, BookingStep::ConfirmingDetails);
    }

    #[tokio::test]
    async fn test_submit_with_implausible_email_is_rejected() {
        let mut flow = flow_at_details("2024-07-01", TimeSlot::TenAm);
        let store = RecordingStore::new(false);
        let notifier = RecordingNotifier::new();

        let outcome = flow.submit("Ana", "not-an-email", None, &store, &notifier).await;

        assert!(matches!(outcome, SubmitOutcome::Rejected(FlowError::InvalidEmail)));
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn test_successful_submit_resets_flow() {
        let mut flow = flow_at_details("2024-07-01", TimeSlot::TenAm);
        let store = RecordingStore::new(false);
        let notifier = RecordingNotifier::new();

        let outcome = flow.submit("Ana", "ana@x.com", None, &store, &notifier).await;

        assert!(matches!(outcome, SubmitOutcome::Stored(_)));
        assert_eq!(store.count(), 1);
        assert_eq!(notifier.count(), 1);
        assert_eq!(notifier.last_severity(), Severity::Default);

        // fresh machine, empty draft
        assert_eq!(flow.step, BookingStep::SelectingDate);
        assert_eq!(flow.draft, BookingDraft::default());
        assert!(!flow.in_flight);
    }

    #[tokio::test]
    async fn test_failed_submit_preserves_draft() {
        let mut flow = flow_at_details("2024-07-01", TimeSlot::TenAm);
        let store = RecordingStore::new(true);
        let notifier = RecordingNotifier::new();

        let outcome = flow.submit("Ana", "ana@x.com", None, &store, &notifier).await;

        assert!(matches!(outcome, SubmitOutcome::Failed));
        assert_eq!(notifier.count(), 1);
        assert_eq!(notifier.last_severity(), Severity::Destructive);

        assert_eq!(flow.step, BookingStep::ConfirmingDetails);
        assert_eq!(flow.draft.selected_date, Some(date("2024-07-01")));
        assert_eq!(flow.draft.selected_time, Some(TimeSlot::TenAm));
        assert_eq!(flow.draft.contact_name, "Ana");
        assert_eq!(flow.draft.contact_email, "ana@x.com");
        assert!(!flow.in_flight);
    }

    #[test]
    fn test_overlapping_submit_is_rejected() {
        let mut flow = flow_at_details("2024-07-01", TimeSlot::TenAm);
        flow.begin_submit("Ana", "ana@x.com", None).unwrap();
        assert!(flow.in_flight);

        let second = flow.begin_submit("Ana", "ana@x.com", None);
        assert_eq!(second, Err(FlowError::SubmissionInFlight));
    }

    #[test]
    fn test_submit_default_message_names_date_and_time() {
        let mut flow = flow_at_details("2024-07-01", TimeSlot::TenAm);
        let record = flow.begin_submit("Ana", "ana@x.com", None).unwrap();
        assert_eq!(record.message, "Appointment request for 2024-07-01 at 10:00 AM");
    }

    #[test]
    fn test_submit_outside_details_step_is_wrong_step() {
        let mut flow = BookingFlow::new();
        let result = flow.begin_submit("Ana", "ana@x.com", None);
        assert_eq!(result, Err(FlowError::WrongStep));
    }
}
