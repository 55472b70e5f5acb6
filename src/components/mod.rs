//! UI Components

mod error_alert;

pub use error_alert::ErrorAlert;
