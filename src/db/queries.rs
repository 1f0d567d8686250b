use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{Appointment, AppointmentStatus, BookingSession, Collection, ContentRecord, TimeSlot};
use crate::services::booking::BookingFlow;

// ── Booking sessions ──

pub fn get_booking_session(conn: &Connection, id: &str) -> anyhow::Result<Option<BookingSession>> {
    let now = Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string();
    let mut stmt = conn.prepare(
        "SELECT id, flow, last_activity, expires_at FROM booking_sessions WHERE id = ?1 AND expires_at > ?2",
    )?;

    let result = stmt.query_row(params![id, now], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    });

    match result {
        Ok((id, flow_json, last_activity_str, expires_at_str)) => {
            let flow: BookingFlow = serde_json::from_str(&flow_json).unwrap_or_default();
            let last_activity =
                NaiveDateTime::parse_from_str(&last_activity_str, "%Y-%m-%d %H:%M:%S")
                    .unwrap_or_else(|_| Utc::now().naive_utc());
            let expires_at = NaiveDateTime::parse_from_str(&expires_at_str, "%Y-%m-%d %H:%M:%S")
                .unwrap_or_else(|_| Utc::now().naive_utc());

            Ok(Some(BookingSession {
                id,
                flow,
                last_activity,
                expires_at,
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn save_booking_session(conn: &Connection, session: &BookingSession) -> anyhow::Result<()> {
    let flow_json = serde_json::to_string(&session.flow)?;
    let step = session.flow.step.as_str();
    let last_activity = session.last_activity.format("%Y-%m-%d %H:%M:%S").to_string();
    let expires_at = session.expires_at.format("%Y-%m-%d %H:%M:%S").to_string();

    conn.execute(
        "INSERT INTO booking_sessions (id, step, flow, last_activity, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
           step = excluded.step,
           flow = excluded.flow,
           last_activity = excluded.last_activity,
           expires_at = excluded.expires_at",
        params![session.id, step, flow_json, last_activity, expires_at],
    )?;
    Ok(())
}

pub fn delete_expired_sessions(conn: &Connection) -> anyhow::Result<usize> {
    let now = Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string();
    let count = conn.execute(
        "DELETE FROM booking_sessions WHERE expires_at <= ?1",
        params![now],
    )?;
    Ok(count)
}

// ── Appointments ──

pub fn create_appointment(conn: &Connection, appointment: &Appointment) -> anyhow::Result<()> {
    let date = appointment.date.format("%Y-%m-%d").to_string();
    let created_at = appointment.created_at.format("%Y-%m-%d %H:%M:%S").to_string();
    let updated_at = appointment.updated_at.format("%Y-%m-%d %H:%M:%S").to_string();

    conn.execute(
        "INSERT INTO appointments (id, name, email, date, time, message, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            appointment.id,
            appointment.name,
            appointment.email,
            date,
            appointment.time.as_str(),
            appointment.message,
            appointment.status.as_str(),
            created_at,
            updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_appointments(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Appointment>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            "SELECT id, name, email, date, time, message, status, created_at, updated_at \
             FROM appointments WHERE status = ?1 ORDER BY date DESC, time DESC LIMIT ?2"
                .to_string(),
            vec![
                Box::new(status.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            "SELECT id, name, email, date, time, message, status, created_at, updated_at \
             FROM appointments ORDER BY date DESC, time DESC LIMIT ?1"
                .to_string(),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_appointment_row(row)))?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

pub fn update_appointment_status(
    conn: &Connection,
    id: &str,
    status: &AppointmentStatus,
) -> anyhow::Result<bool> {
    let now = Utc::now()
        .naive_utc()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();
    let count = conn.execute(
        "UPDATE appointments SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

fn parse_appointment_row(row: &rusqlite::Row) -> anyhow::Result<Appointment> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    let email: String = row.get(2)?;
    let date_str: String = row.get(3)?;
    let time_str: String = row.get(4)?;
    let message: String = row.get(5)?;
    let status_str: String = row.get(6)?;
    let created_at_str: String = row.get(7)?;
    let updated_at_str: String = row.get(8)?;

    let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
        .unwrap_or_else(|_| Utc::now().date_naive());
    let time = TimeSlot::parse(&time_str)
        .ok_or_else(|| anyhow::anyhow!("invalid time slot in row: {time_str}"))?;
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| Utc::now().naive_utc());
    let updated_at = NaiveDateTime::parse_from_str(&updated_at_str, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(Appointment {
        id,
        name,
        email,
        date,
        time,
        message,
        status: AppointmentStatus::parse(&status_str),
        created_at,
        updated_at,
    })
}

// ── Content records ──

pub fn insert_content(
    conn: &Connection,
    collection: Collection,
    data: &serde_json::Value,
    published: bool,
) -> anyhow::Result<ContentRecord> {
    let now = Utc::now().naive_utc();
    let record = ContentRecord {
        id: uuid::Uuid::new_v4().to_string(),
        collection,
        data: data.clone(),
        published,
        created_at: now,
        updated_at: now,
    };

    let timestamp = now.format("%Y-%m-%d %H:%M:%S").to_string();
    conn.execute(
        "INSERT INTO content_records (id, collection, data, published, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            record.id,
            collection.as_str(),
            serde_json::to_string(data)?,
            published as i32,
            timestamp,
            timestamp,
        ],
    )?;
    Ok(record)
}

pub fn update_content(
    conn: &Connection,
    collection: Collection,
    id: &str,
    data: Option<&serde_json::Value>,
    published: Option<bool>,
) -> anyhow::Result<bool> {
    let data_json = match data {
        Some(value) => Some(serde_json::to_string(value)?),
        None => None,
    };
    let now = Utc::now()
        .naive_utc()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();

    let count = conn.execute(
        "UPDATE content_records
         SET data = COALESCE(?1, data),
             published = COALESCE(?2, published),
             updated_at = ?3
         WHERE id = ?4 AND collection = ?5",
        params![data_json, published.map(|p| p as i32), now, id, collection.as_str()],
    )?;
    Ok(count > 0)
}

pub fn delete_content(conn: &Connection, collection: Collection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "DELETE FROM content_records WHERE id = ?1 AND collection = ?2",
        params![id, collection.as_str()],
    )?;
    Ok(count > 0)
}

pub fn list_content(
    conn: &Connection,
    collection: Collection,
    published_only: bool,
) -> anyhow::Result<Vec<ContentRecord>> {
    let sql = if published_only {
        "SELECT id, collection, data, published, created_at, updated_at
         FROM content_records WHERE collection = ?1 AND published = 1 ORDER BY created_at DESC"
    } else {
        "SELECT id, collection, data, published, created_at, updated_at
         FROM content_records WHERE collection = ?1 ORDER BY created_at DESC"
    };

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![collection.as_str()], |row| {
        Ok(parse_content_row(row))
    })?;

    let mut records = vec![];
    for row in rows {
        records.push(row??);
    }
    Ok(records)
}

pub fn get_content(
    conn: &Connection,
    collection: Collection,
    id: &str,
) -> anyhow::Result<Option<ContentRecord>> {
    let result = conn.query_row(
        "SELECT id, collection, data, published, created_at, updated_at
         FROM content_records WHERE id = ?1 AND collection = ?2",
        params![id, collection.as_str()],
        |row| Ok(parse_content_row(row)),
    );

    match result {
        Ok(record) => Ok(Some(record?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn parse_content_row(row: &rusqlite::Row) -> anyhow::Result<ContentRecord> {
    let id: String = row.get(0)?;
    let collection_str: String = row.get(1)?;
    let data_json: String = row.get(2)?;
    let published: bool = row.get::<_, i32>(3)? != 0;
    let created_at_str: String = row.get(4)?;
    let updated_at_str: String = row.get(5)?;

    let collection = Collection::parse(&collection_str)
        .ok_or_else(|| anyhow::anyhow!("unknown collection in row: {collection_str}"))?;
    let data = serde_json::from_str(&data_json).unwrap_or(serde_json::Value::Null);
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| Utc::now().naive_utc());
    let updated_at = NaiveDateTime::parse_from_str(&updated_at_str, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(ContentRecord {
        id,
        collection,
        data,
        published,
        created_at,
        updated_at,
    })
}

// ── Dashboard ──

pub struct DashboardStats {
    pub pending_appointments: i64,
    pub published_content: i64,
    pub contact_messages: i64,
}

pub fn get_dashboard_stats(conn: &Connection) -> anyhow::Result<DashboardStats> {
    let pending_appointments: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM appointments WHERE status = 'pending'",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    let published_content: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM content_records WHERE published = 1",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    let contact_messages: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM content_records WHERE collection = 'contact_messages'",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    Ok(DashboardStats {
        pending_appointments,
        published_content,
        contact_messages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use chrono::Duration;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn make_session(id: &str, expires_in: Duration) -> BookingSession {
        let now = Utc::now().naive_utc();
        BookingSession {
            id: id.to_string(),
            flow: BookingFlow::new(),
            last_activity: now,
            expires_at: now + expires_in,
        }
    }

    #[test]
    fn test_session_roundtrip() {
        let conn = setup_db();
        let mut session = make_session("s-1", Duration::minutes(30));
        session
            .flow
            .select_date(
                NaiveDate::from_ymd_opt(2031, 7, 1).unwrap(),
                NaiveDate::from_ymd_opt(2031, 6, 15).unwrap(),
            )
            .unwrap();
        save_booking_session(&conn, &session).unwrap();

        let loaded = get_booking_session(&conn, "s-1").unwrap().unwrap();
        assert_eq!(loaded.flow.step, session.flow.step);
        assert_eq!(loaded.flow.draft, session.flow.draft);
    }

    #[test]
    fn test_expired_session_is_not_returned() {
        let conn = setup_db();
        let session = make_session("s-expired", Duration::minutes(-5));
        save_booking_session(&conn, &session).unwrap();

        assert!(get_booking_session(&conn, "s-expired").unwrap().is_none());
        assert_eq!(delete_expired_sessions(&conn).unwrap(), 1);
    }

    #[test]
    fn test_content_crud() {
        let conn = setup_db();
        let record = insert_content(
            &conn,
            Collection::Posts,
            &serde_json::json!({"title": "Hello"}),
            false,
        )
        .unwrap();

        // not published yet, so a published-only listing is empty
        assert!(list_content(&conn, Collection::Posts, true).unwrap().is_empty());

        let updated = update_content(&conn, Collection::Posts, &record.id, None, Some(true)).unwrap();
        assert!(updated);
        let published = list_content(&conn, Collection::Posts, true).unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].data["title"], "Hello");

        assert!(delete_content(&conn, Collection::Posts, &record.id).unwrap());
        assert!(get_content(&conn, Collection::Posts, &record.id).unwrap().is_none());
    }

    #[test]
    fn test_update_content_wrong_collection_is_a_miss() {
        let conn = setup_db();
        let record = insert_content(
            &conn,
            Collection::Posts,
            &serde_json::json!({"title": "Hello"}),
            true,
        )
        .unwrap();

        let updated =
            update_content(&conn, Collection::Testimonials, &record.id, None, Some(false)).unwrap();
        assert!(!updated);
    }
}
