use crate::{
    error::AdmissionError,
    slots,
    types::{Booking, BookingRequest, ServiceTypeConfig},
};
use chrono::{NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

fn required(value: &str, field: &'static str) -> Result<(), AdmissionError> {
    if value.trim().is_empty() {
        return Err(AdmissionError::MissingField(field));
    }
    Ok(())
}

/// Checks that every required field of the request is present and returns the
/// requested slot. Blank strings count as missing.
pub fn check_required_fields(
    request: &BookingRequest,
) -> Result<(NaiveDate, NaiveTime), AdmissionError> {
    required(&request.patient_name, "patient_name")?;
    required(&request.patient_email, "patient_email")?;
    required(&request.patient_phone, "patient_phone")?;
    required(&request.service_type_id, "service_type_id")?;
    let date = request.date.ok_or(AdmissionError::MissingField("date"))?;
    let time = request.time.ok_or(AdmissionError::MissingField("time"))?;
    Ok((date, time))
}

/// Emails are compared trimmed and case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Validates `request` against `config` and the bookings already present, and builds
/// the booking to persist.
///
/// `existing` must contain at least every booking of the requested service type and
/// date plus every booking of the patient for the service type. Checks run in order
/// and the first failure is returned: missing fields, slot membership, capacity,
/// then the duplicate policy (one upcoming booking per email and service type,
/// upcoming meaning on or after `today`).
pub fn admit(
    request: &BookingRequest,
    config: &ServiceTypeConfig,
    existing: &[Booking],
    today: NaiveDate,
) -> Result<Booking, AdmissionError> {
    let (date, time) = check_required_fields(request)?;

    if request.service_type_id.trim() != config.id || !slots::is_bookable_slot(config, date, time)
    {
        return Err(AdmissionError::InvalidSlot);
    }

    if slots::occupied(config, date, time, existing) >= config.capacity {
        return Err(AdmissionError::SlotFull);
    }

    let patient_email = normalize_email(&request.patient_email);
    let duplicate = existing.iter().any(|booking| {
        booking.service_type_id == config.id
            && booking.date >= today
            && normalize_email(&booking.patient_email) == patient_email
    });
    if duplicate {
        return Err(AdmissionError::DuplicateBooking);
    }

    let notes = request
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|notes| !notes.is_empty())
        .map(String::from);

    Ok(Booking {
        id: Uuid::new_v4(),
        service_type_id: config.id.clone(),
        date,
        time,
        patient_name: request.patient_name.trim().into(),
        patient_email,
        patient_phone: request.patient_phone.trim().into(),
        notes,
        created_at: Utc::now(),
    })
}
