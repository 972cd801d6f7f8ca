use crate::{
    error::StoreError,
    types::{Booking, BookingFilter, ContactUpdate, ServiceTypeConfig},
};
use chrono::NaiveDate;
use uuid::Uuid;

pub trait ServiceTypeStore: Clone + Send + Sync + 'static {
    fn service_types(&self) -> Result<Vec<ServiceTypeConfig>, StoreError>;
    fn service_type(&self, id: &str) -> Result<ServiceTypeConfig, StoreError>;
    fn upsert_service_type(&self, service_type: ServiceTypeConfig) -> Result<(), StoreError>;
    /// Also removes every booking made against the service type.
    fn remove_service_type(&self, id: &str) -> Result<(), StoreError>;
}

pub trait BookingStore: Clone + Send + Sync + 'static {
    fn bookings_for_date(
        &self,
        service_type_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, StoreError>;
    /// `patient_email` is expected in normalized (trimmed, lowercase) form.
    fn bookings_for_patient(
        &self,
        patient_email: &str,
        service_type_id: &str,
    ) -> Result<Vec<Booking>, StoreError>;
    /// Unsorted; ordering is applied by the caller.
    fn bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>, StoreError>;
    /// Fails with `Conflict` if the id is taken or the slot has reached the capacity of
    /// its service type by the time the write happens.
    fn insert_booking(&self, booking: Booking) -> Result<(), StoreError>;
    fn update_booking_contact(
        &self,
        id: Uuid,
        update: &ContactUpdate,
    ) -> Result<Booking, StoreError>;
    fn remove_booking(&self, id: Uuid) -> Result<(), StoreError>;
    fn remove_all_bookings(&self) -> Result<(), StoreError>;
}

pub trait Store: ServiceTypeStore + BookingStore {}

impl<T: ServiceTypeStore + BookingStore> Store for T {}
