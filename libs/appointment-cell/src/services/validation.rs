// libs/appointment-cell/src/services/validation.rs
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use shared_models::Specialty;

use crate::models::{AppointmentError, BookAppointmentRequest, BookingRules, RequestedSlot};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];

pub fn parse_date(raw: &str) -> Result<NaiveDate, AppointmentError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| AppointmentError::ValidationError(format!("Invalid date '{}', expected YYYY-MM-DD", raw)))
}

pub fn parse_time(raw: &str) -> Result<NaiveTime, AppointmentError> {
    let raw_trimmed = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(raw_trimmed, format).ok())
        .ok_or_else(|| AppointmentError::ValidationError(format!("Invalid time '{}', expected HH:MM", raw)))
}

pub fn parse_request(request: &BookAppointmentRequest) -> Result<RequestedSlot, AppointmentError> {
    let specialty = request
        .specialty
        .parse::<Specialty>()
        .map_err(|e| AppointmentError::ValidationError(e.to_string()))?;

    Ok(RequestedSlot {
        specialty,
        date: parse_date(&request.date)?,
        time: parse_time(&request.time)?,
    })
}

/// Past slots are refused. By default only the date is compared, so any time
/// later today is still bookable.
pub fn ensure_not_past(
    slot: &RequestedSlot,
    now: NaiveDateTime,
    rules: &BookingRules,
) -> Result<(), AppointmentError> {
    let in_past = if rules.reject_past_slot_times {
        slot.date.and_time(slot.time) < now
    } else {
        slot.date < now.date()
    };

    if in_past {
        return Err(AppointmentError::InvalidTime("Selected date must be valid.".to_string()));
    }
    Ok(())
}
