use crate::time;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::{borrow::Cow, cmp::Ordering, collections::BTreeSet};
use uuid::Uuid;
use validator::{Validate, ValidationError};

lazy_static::lazy_static! {
    static ref SERVICE_TYPE_ID: Regex = Regex::new(r"^[a-z0-9_]+$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningHours {
    #[serde(with = "time::hh_mm")]
    pub open: NaiveTime,
    #[serde(with = "time::hh_mm")]
    pub close: NaiveTime,
}

impl OpeningHours {
    pub fn new(open: NaiveTime, close: NaiveTime) -> Self {
        Self { open, close }
    }
}

/// Operating hours per weekday. `None` means closed that day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklyHours {
    pub sunday: Option<OpeningHours>,
    pub monday: Option<OpeningHours>,
    pub tuesday: Option<OpeningHours>,
    pub wednesday: Option<OpeningHours>,
    pub thursday: Option<OpeningHours>,
    pub friday: Option<OpeningHours>,
    pub saturday: Option<OpeningHours>,
}

impl WeeklyHours {
    pub fn every_day(hours: OpeningHours) -> Self {
        Self {
            sunday: Some(hours),
            monday: Some(hours),
            tuesday: Some(hours),
            wednesday: Some(hours),
            thursday: Some(hours),
            friday: Some(hours),
            saturday: Some(hours),
        }
    }

    pub fn on(&self, weekday: Weekday) -> Option<&OpeningHours> {
        self.slot(weekday).as_ref()
    }

    pub fn set(&mut self, weekday: Weekday, hours: Option<OpeningHours>) {
        *self.slot_mut(weekday) = hours;
    }

    fn slot(&self, weekday: Weekday) -> &Option<OpeningHours> {
        match weekday {
            Weekday::Sun => &self.sunday,
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
        }
    }

    fn slot_mut(&mut self, weekday: Weekday) -> &mut Option<OpeningHours> {
        match weekday {
            Weekday::Sun => &mut self.sunday,
            Weekday::Mon => &mut self.monday,
            Weekday::Tue => &mut self.tuesday,
            Weekday::Wed => &mut self.wednesday,
            Weekday::Thu => &mut self.thursday,
            Weekday::Fri => &mut self.friday,
            Weekday::Sat => &mut self.saturday,
        }
    }

    fn iter(&self) -> impl Iterator<Item = &OpeningHours> {
        [
            &self.sunday,
            &self.monday,
            &self.tuesday,
            &self.wednesday,
            &self.thursday,
            &self.friday,
            &self.saturday,
        ]
        .into_iter()
        .flatten()
    }
}

/// Inclusive range of bookable dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_schedule"))]
pub struct ServiceTypeConfig {
    pub id: String,
    pub name: String,
    #[validate(range(min = 1))]
    pub interval_minutes: u32,
    #[validate(range(min = 1))]
    pub capacity: u32,
    pub date_range: DateRange,
    #[serde(default)]
    pub weekly_hours: WeeklyHours,
    #[serde(default)]
    pub holiday_dates: BTreeSet<NaiveDate>,
    /// Weekdays closed regardless of `weekly_hours`.
    #[serde(default)]
    pub closed_weekdays: Vec<Weekday>,
}

impl ServiceTypeConfig {
    /// Holidays and closed weekdays override the weekly hours.
    pub fn is_closed_on(&self, date: NaiveDate) -> bool {
        self.holiday_dates.contains(&date) || self.closed_weekdays.contains(&date.weekday())
    }
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

fn validate_schedule(config: &ServiceTypeConfig) -> Result<(), ValidationError> {
    if !SERVICE_TYPE_ID.is_match(&config.id) {
        return Err(invalid(
            "id",
            "Id must consist of lowercase letters, digits and underscores",
        ));
    }
    if config.name.trim().is_empty() {
        return Err(invalid("name", "Name must not be empty"));
    }
    if config.date_range.start > config.date_range.end {
        return Err(invalid("date_range", "Start date must not be after end date"));
    }
    if config
        .weekly_hours
        .iter()
        .any(|hours| hours.open >= hours.close)
    {
        return Err(invalid(
            "weekly_hours",
            "Opening time must be before closing time",
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub service_type_id: String,
    pub date: NaiveDate,
    #[serde(with = "time::hh_mm")]
    pub time: NaiveTime,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Booking request as submitted by a patient. Every field may be absent on the wire,
/// presence is checked during admission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub service_type_id: String,
    #[serde(with = "time::date_opt")]
    pub date: Option<NaiveDate>,
    #[serde(with = "time::hh_mm_opt")]
    pub time: Option<NaiveTime>,
    #[serde(deserialize_with = "null_as_empty")]
    pub patient_name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub patient_email: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub patient_phone: String,
    pub notes: Option<String>,
}

/// Reads `null` as an empty string so admission reports it as a missing field.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Contact fields an administrator may change on an existing booking. Date, time and
/// service type stay fixed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactUpdate {
    pub patient_name: Option<String>,
    pub patient_email: Option<String>,
    pub patient_phone: Option<String>,
    pub notes: Option<String>,
}

impl ContactUpdate {
    pub fn apply(&self, booking: &mut Booking) {
        if let Some(name) = &self.patient_name {
            booking.patient_name = name.clone();
        }
        if let Some(email) = &self.patient_email {
            booking.patient_email = email.clone();
        }
        if let Some(phone) = &self.patient_phone {
            booking.patient_phone = phone.clone();
        }
        if let Some(notes) = &self.notes {
            booking.notes = (!notes.is_empty()).then(|| notes.clone());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAvailability {
    #[serde(with = "time::hh_mm")]
    pub time: NaiveTime,
    pub occupied: u32,
    pub capacity: u32,
    pub is_full: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum AdmissionWarning {
    NotificationFailed(String),
}

/// A committed booking. A warning never means the booking was undone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionOutcome {
    pub booking: Booking,
    pub warning: Option<AdmissionWarning>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Date,
    Time,
    ServiceType,
    Name,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingFilter {
    /// Substring of the patient name.
    pub patient_name: Option<String>,
    pub service_type_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub sort: SortKey,
    pub order: SortOrder,
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        let name_matches = self
            .patient_name
            .as_deref()
            .map_or(true, |name| booking.patient_name.contains(name.trim()));
        let type_matches = self
            .service_type_id
            .as_deref()
            .map_or(true, |id| booking.service_type_id == id);
        let date_matches = self.date.map_or(true, |date| booking.date == date);
        name_matches && type_matches && date_matches
    }

    pub fn sort(&self, bookings: &mut [Booking]) {
        bookings.sort_by(|a, b| {
            let ordering = self.compare(a, b);
            match self.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
    }

    fn compare(&self, a: &Booking, b: &Booking) -> Ordering {
        match self.sort {
            SortKey::Date => (a.date, a.time).cmp(&(b.date, b.time)),
            SortKey::Time => a.time.cmp(&b.time),
            SortKey::ServiceType => a.service_type_id.cmp(&b.service_type_id),
            SortKey::Name => a.patient_name.cmp(&b.patient_name),
        }
    }
}
