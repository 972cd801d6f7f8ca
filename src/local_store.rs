use crate::{
    backend::{BookingStore, ServiceTypeStore},
    error::StoreError,
    types::{Booking, BookingFilter, ContactUpdate, ServiceTypeConfig},
};
use chrono::NaiveDate;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing::error;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Records {
    service_types: HashMap<String, ServiceTypeConfig>,
    bookings: HashMap<Uuid, Booking>,
}

/// In-memory store. Service types and bookings share one lock so capacity can be
/// re-checked atomically on insert.
#[derive(Debug, Clone, Default)]
pub struct LocalStore {
    records: Arc<Mutex<Records>>,
}

impl LocalStore {
    fn records(&self) -> MutexGuard<'_, Records> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn collect(&self, predicate: impl Fn(&Booking) -> bool) -> Vec<Booking> {
        self.records()
            .bookings
            .values()
            .filter(|booking| predicate(booking))
            .cloned()
            .collect()
    }
}

impl ServiceTypeStore for LocalStore {
    fn service_types(&self) -> Result<Vec<ServiceTypeConfig>, StoreError> {
        let mut service_types: Vec<ServiceTypeConfig> =
            self.records().service_types.values().cloned().collect();
        service_types.sort_unstable_by(|a, b| a.id.cmp(&b.id));
        Ok(service_types)
    }

    fn service_type(&self, id: &str) -> Result<ServiceTypeConfig, StoreError> {
        self.records()
            .service_types
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.into()))
    }

    fn upsert_service_type(&self, service_type: ServiceTypeConfig) -> Result<(), StoreError> {
        self.records()
            .service_types
            .insert(service_type.id.clone(), service_type);
        Ok(())
    }

    fn remove_service_type(&self, id: &str) -> Result<(), StoreError> {
        let mut records = self.records();
        if records.service_types.remove(id).is_none() {
            let err = "Service type does not exist and can't be removed";
            error!(id, err);
            return Err(StoreError::NotFound(id.into()));
        }
        records
            .bookings
            .retain(|_, booking| booking.service_type_id != id);
        Ok(())
    }
}

impl BookingStore for LocalStore {
    fn bookings_for_date(
        &self,
        service_type_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, StoreError> {
        Ok(self.collect(|booking| {
            booking.service_type_id == service_type_id && booking.date == date
        }))
    }

    fn bookings_for_patient(
        &self,
        patient_email: &str,
        service_type_id: &str,
    ) -> Result<Vec<Booking>, StoreError> {
        Ok(self.collect(|booking| {
            booking.service_type_id == service_type_id && booking.patient_email == patient_email
        }))
    }

    fn bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>, StoreError> {
        Ok(self.collect(|booking| filter.matches(booking)))
    }

    fn insert_booking(&self, booking: Booking) -> Result<(), StoreError> {
        let mut records = self.records();
        if records.bookings.contains_key(&booking.id) {
            return Err(StoreError::Conflict(format!(
                "Booking {} already exists",
                booking.id
            )));
        }
        let capacity = records
            .service_types
            .get(&booking.service_type_id)
            .map(|service_type| service_type.capacity)
            .ok_or_else(|| StoreError::NotFound(booking.service_type_id.clone()))?;
        let occupied = records
            .bookings
            .values()
            .filter(|other| {
                other.service_type_id == booking.service_type_id
                    && other.date == booking.date
                    && other.time == booking.time
            })
            .count() as u32;
        if occupied >= capacity {
            let err = "Slot was already fully booked";
            error!(date = %booking.date, time = %booking.time, err);
            return Err(StoreError::Conflict(err.into()));
        }
        records.bookings.insert(booking.id, booking);
        Ok(())
    }

    fn update_booking_contact(
        &self,
        id: Uuid,
        update: &ContactUpdate,
    ) -> Result<Booking, StoreError> {
        let mut records = self.records();
        let Some(booking) = records.bookings.get_mut(&id) else {
            return Err(StoreError::NotFound(id.to_string()));
        };
        update.apply(booking);
        Ok(booking.clone())
    }

    fn remove_booking(&self, id: Uuid) -> Result<(), StoreError> {
        if self.records().bookings.remove(&id).is_none() {
            let err = "Booking does not exist and can't be removed";
            error!(%id, err);
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn remove_all_bookings(&self) -> Result<(), StoreError> {
        self.records().bookings.clear();
        Ok(())
    }
}
