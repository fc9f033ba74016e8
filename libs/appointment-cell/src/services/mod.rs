pub mod availability;
pub mod booking;
pub mod validation;

pub use availability::AvailabilityService;
pub use booking::AppointmentBookingService;
