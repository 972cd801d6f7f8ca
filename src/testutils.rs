use crate::{
    backend::{BookingStore, ServiceTypeStore},
    configuration::Configuration,
    error::StoreError,
    notification::DEFAULT_CONFIRMATION_TEMPLATE,
    time,
    types::{
        Booking, BookingFilter, BookingRequest, ContactUpdate, DateRange, OpeningHours,
        ServiceTypeConfig, WeeklyHours,
    },
};
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use std::{
    collections::{BTreeSet, HashMap},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
};
use uuid::Uuid;

pub const ADMIN_PASSWORD: &str = "123";

pub fn hm(raw: &str) -> NaiveTime {
    time::parse_hh_mm(raw).unwrap()
}

/// Interval 15, capacity 2, open 09:00 to 09:30 every day of 2025.
pub fn example_service_type() -> ServiceTypeConfig {
    ServiceTypeConfig {
        id: "health_check".into(),
        name: "Health checkup".into(),
        interval_minutes: 15,
        capacity: 2,
        date_range: DateRange {
            start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
        },
        weekly_hours: WeeklyHours::every_day(OpeningHours::new(hm("09:00"), hm("09:30"))),
        holiday_dates: BTreeSet::new(),
        closed_weekdays: Vec::new(),
    }
}

/// Same as [`example_service_type`] but bookable from a month ago until a year ahead.
pub fn open_service_type() -> ServiceTypeConfig {
    let today = time::today();
    ServiceTypeConfig {
        date_range: DateRange {
            start: today - Duration::days(30),
            end: today + Duration::days(365),
        },
        ..example_service_type()
    }
}

/// Booking of "health_check" on Monday 2025-08-11.
pub fn example_booking(time: &str) -> Booking {
    Booking {
        id: Uuid::new_v4(),
        service_type_id: "health_check".into(),
        date: NaiveDate::from_ymd_opt(2025, 8, 11).unwrap(),
        time: hm(time),
        patient_name: "Tanaka Taro".into(),
        patient_email: "tanaka@example.com".into(),
        patient_phone: "090-1234-5678".into(),
        notes: None,
        created_at: Utc::now(),
    }
}

pub fn example_request(date: NaiveDate, time: &str) -> BookingRequest {
    BookingRequest {
        service_type_id: "health_check".into(),
        date: Some(date),
        time: Some(hm(time)),
        patient_name: "Tanaka Taro".into(),
        patient_email: "tanaka@example.com".into(),
        patient_phone: "090-1234-5678".into(),
        notes: Some("First visit".into()),
    }
}

#[derive(Clone)]
pub struct TestConfiguration;

impl Configuration for TestConfiguration {
    fn port(&self) -> String {
        "0".into()
    }

    fn database_url(&self) -> Option<String> {
        None
    }

    fn admin_password(&self) -> String {
        ADMIN_PASSWORD.into()
    }

    fn clinic_message(&self) -> String {
        "Please arrive 15 minutes early.".into()
    }

    fn confirmation_template(&self) -> String {
        DEFAULT_CONFIRMATION_TEMPLATE.into()
    }

    fn seed_defaults(&self) -> bool {
        false
    }
}

pub struct MockStoreInner {
    pub success: AtomicBool,
    pub conflict_on_insert: AtomicBool,
    pub calls_to_service_types: AtomicU64,
    pub calls_to_service_type: AtomicU64,
    pub calls_to_upsert_service_type: AtomicU64,
    pub calls_to_remove_service_type: AtomicU64,
    pub calls_to_bookings_for_date: AtomicU64,
    pub calls_to_bookings_for_patient: AtomicU64,
    pub calls_to_bookings: AtomicU64,
    pub calls_to_insert_booking: AtomicU64,
    pub calls_to_update_booking_contact: AtomicU64,
    pub calls_to_remove_booking: AtomicU64,
    pub calls_to_remove_all_bookings: AtomicU64,
    pub service_types: Mutex<HashMap<String, ServiceTypeConfig>>,
    pub bookings: Mutex<Vec<Booking>>,
}

/// Store double counting its calls. With `success` cleared every call fails with
/// `Unavailable`; with `conflict_on_insert` set inserts fail as if a race was lost.
#[derive(Clone)]
pub struct MockStore(pub Arc<MockStoreInner>);

impl MockStoreInner {
    fn new() -> Self {
        Self {
            success: AtomicBool::new(true),
            conflict_on_insert: AtomicBool::new(false),
            calls_to_service_types: AtomicU64::default(),
            calls_to_service_type: AtomicU64::default(),
            calls_to_upsert_service_type: AtomicU64::default(),
            calls_to_remove_service_type: AtomicU64::default(),
            calls_to_bookings_for_date: AtomicU64::default(),
            calls_to_bookings_for_patient: AtomicU64::default(),
            calls_to_bookings: AtomicU64::default(),
            calls_to_insert_booking: AtomicU64::default(),
            calls_to_update_booking_contact: AtomicU64::default(),
            calls_to_remove_booking: AtomicU64::default(),
            calls_to_remove_all_bookings: AtomicU64::default(),
            service_types: Mutex::default(),
            bookings: Mutex::default(),
        }
    }
}

impl MockStore {
    pub fn new() -> Self {
        Self(Arc::new(MockStoreInner::new()))
    }

    fn result(&self, calls: &AtomicU64) -> Result<(), StoreError> {
        calls.fetch_add(1, Ordering::SeqCst);
        match self.0.success.load(Ordering::SeqCst) {
            true => Ok(()),
            false => Err(StoreError::Unavailable("Supposed to fail".into())),
        }
    }
}

impl ServiceTypeStore for MockStore {
    fn service_types(&self) -> Result<Vec<ServiceTypeConfig>, StoreError> {
        self.result(&self.0.calls_to_service_types)?;
        Ok(self.0.service_types.lock().unwrap().values().cloned().collect())
    }

    fn service_type(&self, id: &str) -> Result<ServiceTypeConfig, StoreError> {
        self.result(&self.0.calls_to_service_type)?;
        self.0
            .service_types
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.into()))
    }

    fn upsert_service_type(&self, _service_type: ServiceTypeConfig) -> Result<(), StoreError> {
        self.result(&self.0.calls_to_upsert_service_type)
    }

    fn remove_service_type(&self, _id: &str) -> Result<(), StoreError> {
        self.result(&self.0.calls_to_remove_service_type)
    }
}

impl BookingStore for MockStore {
    fn bookings_for_date(
        &self,
        _service_type_id: &str,
        _date: NaiveDate,
    ) -> Result<Vec<Booking>, StoreError> {
        self.result(&self.0.calls_to_bookings_for_date)?;
        Ok(Vec::new())
    }

    fn bookings_for_patient(
        &self,
        _patient_email: &str,
        _service_type_id: &str,
    ) -> Result<Vec<Booking>, StoreError> {
        self.result(&self.0.calls_to_bookings_for_patient)?;
        Ok(Vec::new())
    }

    fn bookings(&self, _filter: &BookingFilter) -> Result<Vec<Booking>, StoreError> {
        self.result(&self.0.calls_to_bookings)?;
        Ok(self.0.bookings.lock().unwrap().clone())
    }

    fn insert_booking(&self, _booking: Booking) -> Result<(), StoreError> {
        self.result(&self.0.calls_to_insert_booking)?;
        match self.0.conflict_on_insert.load(Ordering::SeqCst) {
            true => Err(StoreError::Conflict("Supposed to conflict".into())),
            false => Ok(()),
        }
    }

    fn update_booking_contact(
        &self,
        id: Uuid,
        _update: &ContactUpdate,
    ) -> Result<Booking, StoreError> {
        self.result(&self.0.calls_to_update_booking_contact)?;
        Err(StoreError::NotFound(id.to_string()))
    }

    fn remove_booking(&self, _id: Uuid) -> Result<(), StoreError> {
        self.result(&self.0.calls_to_remove_booking)
    }

    fn remove_all_bookings(&self) -> Result<(), StoreError> {
        self.result(&self.0.calls_to_remove_all_bookings)
    }
}
