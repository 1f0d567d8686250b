use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Collection, SubmissionEvent, TimeSlot};
use crate::services::booking::{self, BookingEvent, EventReply};
use crate::services::calendar::{DayCell, MonthView};
use crate::services::notify::{Notice, Severity};
use crate::state::AppState;

// POST /api/booking/sessions
#[derive(Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub step: String,
    pub expires_at: String,
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = booking::new_session();
    {
        let db = state.db.lock().unwrap();
        // housekeeping while we are here; abandoned widgets expire quietly
        let _ = queries::delete_expired_sessions(&db);
        queries::save_booking_session(&db, &session).map_err(AppError::Internal)?;
    }

    tracing::info!(session = %session.id, "created booking session");
    Ok(Json(SessionResponse {
        id: session.id.clone(),
        step: session.flow.step.as_str().to_string(),
        expires_at: session.expires_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    }))
}

// GET /api/booking/sessions/:id
#[derive(Serialize)]
pub struct SessionStateResponse {
    pub id: String,
    pub step: crate::models::BookingStep,
    pub draft: crate::models::BookingDraft,
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionStateResponse>, AppError> {
    let session = {
        let db = state.db.lock().unwrap();
        queries::get_booking_session(&db, &id).map_err(AppError::Internal)?
    }
    .ok_or_else(|| AppError::NotFound(format!("booking session {id}")))?;

    Ok(Json(SessionStateResponse {
        id: session.id,
        step: session.flow.step,
        draft: session.flow.draft,
    }))
}

// POST /api/booking/sessions/:id/events
pub async fn session_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(event): Json<BookingEvent>,
) -> Result<Json<EventReply>, AppError> {
    let reply = booking::process_event(&state, &id, event).await?;
    Ok(Json(reply))
}

// GET /api/calendar — the month containing today
#[derive(Deserialize)]
pub struct CalendarQuery {
    pub selected: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct CalendarResponse {
    pub year: i32,
    pub month: u32,
    pub cells: Vec<DayCell>,
}

pub async fn current_month_grid(Query(query): Query<CalendarQuery>) -> Json<CalendarResponse> {
    let today = Utc::now().date_naive();
    let view = MonthView::containing(today);
    Json(CalendarResponse {
        year: view.year,
        month: view.month,
        cells: view.grid(query.selected, today),
    })
}

// GET /api/calendar/:year/:month

pub async fn month_grid(
    Path((year, month)): Path<(i32, u32)>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<CalendarResponse>, AppError> {
    let view = MonthView::new(year, month)
        .ok_or_else(|| AppError::Validation(format!("invalid month: {year}-{month}")))?;

    let today = Utc::now().date_naive();
    Ok(Json(CalendarResponse {
        year: view.year,
        month: view.month,
        cells: view.grid(query.selected, today),
    }))
}

// GET /api/slots
#[derive(Serialize)]
pub struct SlotResponse {
    pub value: &'static str,
    pub label: &'static str,
}

pub async fn list_slots() -> Json<Vec<SlotResponse>> {
    Json(
        TimeSlot::ALL
            .iter()
            .map(|slot| SlotResponse {
                value: slot.as_str(),
                label: slot.label(),
            })
            .collect(),
    )
}

// POST /api/contact
#[derive(Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

pub async fn submit_contact(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ContactRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let name = body.name.trim();
    let email = body.email.trim();
    let message = body.message.trim();

    if name.is_empty() || email.is_empty() || message.is_empty() {
        return Err(AppError::Validation(
            "name, email and message are required".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(AppError::Validation(
            "email address does not look valid".to_string(),
        ));
    }

    let record = state
        .content
        .insert(
            Collection::ContactMessages,
            serde_json::json!({
                "name": name,
                "email": email,
                "message": message,
            }),
            false,
        )
        .await
        .map_err(AppError::Internal)?;

    let notice = Notice {
        title: "New contact message".to_string(),
        description: format!("{name} <{email}> wrote in"),
        severity: Severity::Default,
    };
    if let Err(e) = state.notifier.notify(&notice).await {
        tracing::warn!(error = %e, "failed to deliver notification");
    }
    let _ = state.events_tx.send(SubmissionEvent::contact_message(name));

    Ok(Json(serde_json::json!({ "ok": true, "id": record.id })))
}
