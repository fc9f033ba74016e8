pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{AppointmentError, BookAppointmentRequest, BookingRules, UpcomingFilter};
pub use services::AppointmentBookingService;
