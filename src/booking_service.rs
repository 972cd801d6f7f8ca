use crate::{
    admission,
    backend::Store,
    error::{AdminError, AdmissionError, ConfigError, StoreError},
    notification::NotificationSender,
    slots, time,
    types::{
        AdmissionOutcome, AdmissionWarning, Booking, BookingFilter, BookingRequest,
        ContactUpdate, DateRange, OpeningHours, ServiceTypeConfig, SlotAvailability, WeeklyHours,
    },
};
use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    sync::{Arc, Mutex, PoisonError},
};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// Entry point for patients and administrators. Admission is serialized through
/// `admission_lock`, which keeps `occupied <= capacity` for every slot as long as this
/// is the only writer; stores re-check capacity on insert for everything else.
#[derive(Clone)]
pub struct BookingService<S: Store> {
    store: S,
    notifier: Arc<dyn NotificationSender>,
    admission_lock: Arc<Mutex<()>>,
}

impl<S: Store> BookingService<S> {
    pub fn new(store: S, notifier: Arc<dyn NotificationSender>) -> Self {
        Self {
            store,
            notifier,
            admission_lock: Arc::default(),
        }
    }

    pub fn service_types(&self) -> Result<Vec<ServiceTypeConfig>, StoreError> {
        self.store.service_types()
    }

    pub fn service_type(&self, id: &str) -> Result<ServiceTypeConfig, StoreError> {
        self.store.service_type(id)
    }

    pub fn availability(
        &self,
        service_type_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<SlotAvailability>, StoreError> {
        let service_type = self.store.service_type(service_type_id)?;
        let bookings = self.store.bookings_for_date(&service_type.id, date)?;
        Ok(slots::compute_availability(&service_type, date, &bookings))
    }

    pub fn book(&self, request: BookingRequest) -> Result<AdmissionOutcome, AdmissionError> {
        self.book_as_of(request, time::today())
    }

    /// Admits `request` and, once the booking is stored, sends the confirmation.
    pub fn book_as_of(
        &self,
        request: BookingRequest,
        today: NaiveDate,
    ) -> Result<AdmissionOutcome, AdmissionError> {
        let (booking, service_type) = match self.admit_and_insert(&request, today) {
            Ok(admitted) => admitted,
            Err(err) => {
                warn!(kind = err.kind(), %err, "Booking rejected");
                return Err(err);
            }
        };
        info!(booking_id = %booking.id, service_type = %booking.service_type_id, date = %booking.date, time = %booking.time, "Booking admitted");

        let warning = match self.notifier.send(&booking, &service_type) {
            Ok(()) => None,
            Err(err) => {
                warn!(?err, booking_id = %booking.id, "Confirmation could not be sent, booking is kept");
                Some(AdmissionWarning::NotificationFailed(err.to_string()))
            }
        };
        Ok(AdmissionOutcome { booking, warning })
    }

    fn admit_and_insert(
        &self,
        request: &BookingRequest,
        today: NaiveDate,
    ) -> Result<(Booking, ServiceTypeConfig), AdmissionError> {
        let (date, _) = admission::check_required_fields(request)?;

        let _admission = self
            .admission_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let service_type = self.store.service_type(request.service_type_id.trim())?;
        let existing = self.existing_bookings(&service_type.id, date, &request.patient_email)?;
        let booking = admission::admit(request, &service_type, &existing, today)?;
        self.store.insert_booking(booking.clone())?;
        Ok((booking, service_type))
    }

    /// Bookings of the slot's day merged with the patient's bookings of the service type.
    fn existing_bookings(
        &self,
        service_type_id: &str,
        date: NaiveDate,
        patient_email: &str,
    ) -> Result<Vec<Booking>, StoreError> {
        let mut existing = self.store.bookings_for_date(service_type_id, date)?;
        let known: HashSet<Uuid> = existing.iter().map(|booking| booking.id).collect();
        let patient_bookings = self
            .store
            .bookings_for_patient(&admission::normalize_email(patient_email), service_type_id)?;
        existing.extend(
            patient_bookings
                .into_iter()
                .filter(|booking| !known.contains(&booking.id)),
        );
        Ok(existing)
    }

    pub fn bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>, StoreError> {
        let mut bookings = self.store.bookings(filter)?;
        filter.sort(&mut bookings);
        Ok(bookings)
    }

    pub fn update_booking_contact(
        &self,
        id: Uuid,
        update: ContactUpdate,
    ) -> Result<Booking, AdminError> {
        fn required(
            value: Option<String>,
            field: &'static str,
        ) -> Result<Option<String>, AdminError> {
            match value.map(|value| value.trim().to_string()) {
                Some(value) if value.is_empty() => Err(AdminError::MissingField(field)),
                value => Ok(value),
            }
        }

        let update = ContactUpdate {
            patient_name: required(update.patient_name, "patient_name")?,
            patient_email: required(update.patient_email, "patient_email")?
                .map(|email| admission::normalize_email(&email)),
            patient_phone: required(update.patient_phone, "patient_phone")?,
            notes: update.notes.map(|notes| notes.trim().to_string()),
        };
        let booking = self.store.update_booking_contact(id, &update)?;
        info!(booking_id = %id, "Booking contact updated");
        Ok(booking)
    }

    pub fn remove_booking(&self, id: Uuid) -> Result<(), StoreError> {
        self.store.remove_booking(id)?;
        info!(booking_id = %id, "Booking removed");
        Ok(())
    }

    pub fn remove_all_bookings(&self) -> Result<(), StoreError> {
        self.store.remove_all_bookings()?;
        info!("All bookings removed");
        Ok(())
    }

    /// Number of bookings per day of the given month, days without bookings omitted.
    pub fn daily_counts(
        &self,
        year: i32,
        month: u32,
    ) -> Result<BTreeMap<NaiveDate, usize>, AdminError> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(AdminError::InvalidInput(format!(
                "{year}-{month} is not a valid month"
            )));
        }
        let mut counts = BTreeMap::new();
        for booking in self.store.bookings(&BookingFilter::default())? {
            if booking.date.year() == year && booking.date.month() == month {
                *counts.entry(booking.date).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    pub fn upsert_service_type(&self, service_type: ServiceTypeConfig) -> Result<(), AdminError> {
        service_type.validate().map_err(ConfigError::from)?;
        let id = service_type.id.clone();
        self.store.upsert_service_type(service_type)?;
        info!(%id, "Service type saved");
        Ok(())
    }

    /// Removes the service type together with its bookings.
    pub fn remove_service_type(&self, id: &str) -> Result<(), StoreError> {
        self.store.remove_service_type(id)?;
        info!(id, "Service type and its bookings removed");
        Ok(())
    }

    /// Adds the clinic's standard service types for `year` unless a service type with
    /// the same id is already present.
    pub fn insert_default_service_types(&self, year: i32) -> Result<(), AdminError> {
        for service_type in default_service_types(year)? {
            match self.store.service_type(&service_type.id) {
                Ok(_) => continue,
                Err(StoreError::NotFound(_)) => self.upsert_service_type(service_type)?,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }
}

pub fn default_service_types(year: i32) -> Result<Vec<ServiceTypeConfig>, AdminError> {
    let invalid_year = || AdminError::InvalidInput(format!("{year} is not a valid year"));
    let date_range = DateRange {
        start: NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid_year)?,
        end: NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(invalid_year)?,
    };
    let at = |hour| {
        NaiveTime::from_hms_opt(hour, 0, 0)
            .ok_or_else(|| AdminError::InvalidInput(format!("{hour}:00 is not a valid time")))
    };
    let weekday_hours = OpeningHours::new(at(9)?, at(17)?);

    let mut weekly_hours = WeeklyHours::every_day(weekday_hours);
    weekly_hours.set(Weekday::Sat, Some(OpeningHours::new(at(9)?, at(12)?)));
    weekly_hours.set(Weekday::Sun, None);

    Ok(vec![
        ServiceTypeConfig {
            id: "health_check".into(),
            name: "Health checkup".into(),
            interval_minutes: 15,
            capacity: 10,
            date_range,
            weekly_hours: weekly_hours.clone(),
            holiday_dates: BTreeSet::new(),
            closed_weekdays: vec![Weekday::Sun],
        },
        ServiceTypeConfig {
            id: "vaccination".into(),
            name: "Vaccination".into(),
            interval_minutes: 15,
            capacity: 8,
            date_range,
            weekly_hours,
            holiday_dates: BTreeSet::new(),
            closed_weekdays: vec![Weekday::Sat, Weekday::Sun],
        },
    ])
}
