pub mod booking;
pub mod calendar;
pub mod content;
pub mod notify;
pub mod submission;
pub mod uploads;
