use crate::{
    time,
    types::{Booking, ServiceTypeConfig, SlotAvailability},
};
use chrono::{Datelike, NaiveDate, NaiveTime};

/// Candidate slot start times for a service type on a date, in ascending order.
///
/// Returns an empty list when the date is outside the configured range, is a holiday,
/// falls on a closed weekday or has no opening hours. Only start times are considered:
/// the last slot may run past closing time.
pub fn generate_slots(config: &ServiceTypeConfig, date: NaiveDate) -> Vec<NaiveTime> {
    if !config.date_range.contains(date) || config.is_closed_on(date) {
        return Vec::new();
    }
    let Some(hours) = config.weekly_hours.on(date.weekday()) else {
        return Vec::new();
    };
    if config.interval_minutes == 0 {
        return Vec::new();
    }

    // Slots are minute aligned, so hours with seconds are rounded to the next minute.
    let open = time::minutes_of_day_ceil(hours.open);
    let close = time::minutes_of_day_ceil(hours.close);
    (open..close)
        .step_by(config.interval_minutes as usize)
        .filter_map(time::from_minutes)
        .collect()
}

pub fn is_bookable_slot(config: &ServiceTypeConfig, date: NaiveDate, time: NaiveTime) -> bool {
    generate_slots(config, date).contains(&time)
}

/// Bookings in `bookings` that occupy the given slot of this service type.
pub fn occupied(
    config: &ServiceTypeConfig,
    date: NaiveDate,
    time: NaiveTime,
    bookings: &[Booking],
) -> u32 {
    bookings
        .iter()
        .filter(|booking| {
            booking.service_type_id == config.id && booking.date == date && booking.time == time
        })
        .count() as u32
}

/// Annotates every slot of the day with its occupancy. Pure read over `bookings`,
/// which may contain bookings of other dates and service types.
pub fn compute_availability(
    config: &ServiceTypeConfig,
    date: NaiveDate,
    bookings: &[Booking],
) -> Vec<SlotAvailability> {
    generate_slots(config, date)
        .into_iter()
        .map(|time| {
            let occupied = occupied(config, date, time, bookings);
            SlotAvailability {
                time,
                occupied,
                capacity: config.capacity,
                is_full: occupied >= config.capacity,
            }
        })
        .collect()
}
