pub mod appointment;
pub mod booking;
pub mod content;
pub mod event;

pub use appointment::{Appointment, AppointmentStatus, NewAppointment, TimeSlot};
pub use booking::{BookingDraft, BookingSession, BookingStep};
pub use content::{Collection, ContentRecord};
pub use event::{SubmissionEvent, SubmissionKind};
