use crate::{
    backend::{BookingStore, ServiceTypeStore},
    error::StoreError,
    schema::{bookings, service_types},
    types::{Booking, BookingFilter, ContactUpdate, DateRange, ServiceTypeConfig},
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use diesel::{
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
    ConnectionError,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::error;
use uuid::Uuid;

#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = service_types)]
struct ServiceTypeRow {
    id: String,
    name: String,
    interval_minutes: i32,
    capacity: i32,
    start_date: NaiveDate,
    end_date: NaiveDate,
    weekly_hours: serde_json::Value,
    holiday_dates: Vec<NaiveDate>,
    closed_weekdays: Vec<String>,
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = bookings)]
struct BookingRow {
    id: Uuid,
    service_type_id: String,
    date: NaiveDate,
    time: NaiveTime,
    patient_name: String,
    patient_email: String,
    patient_phone: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

fn malformed(err: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(format!("Malformed service type record: {err}"))
}

impl TryFrom<&ServiceTypeConfig> for ServiceTypeRow {
    type Error = StoreError;

    fn try_from(config: &ServiceTypeConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            id: config.id.clone(),
            name: config.name.clone(),
            interval_minutes: i32::try_from(config.interval_minutes).map_err(malformed)?,
            capacity: i32::try_from(config.capacity).map_err(malformed)?,
            start_date: config.date_range.start,
            end_date: config.date_range.end,
            weekly_hours: serde_json::to_value(&config.weekly_hours).map_err(malformed)?,
            holiday_dates: config.holiday_dates.iter().copied().collect(),
            closed_weekdays: config
                .closed_weekdays
                .iter()
                .map(ToString::to_string)
                .collect(),
        })
    }
}

impl TryFrom<ServiceTypeRow> for ServiceTypeConfig {
    type Error = StoreError;

    fn try_from(row: ServiceTypeRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            interval_minutes: u32::try_from(row.interval_minutes).map_err(malformed)?,
            capacity: u32::try_from(row.capacity).map_err(malformed)?,
            date_range: DateRange {
                start: row.start_date,
                end: row.end_date,
            },
            weekly_hours: serde_json::from_value(row.weekly_hours).map_err(malformed)?,
            holiday_dates: row.holiday_dates.into_iter().collect(),
            closed_weekdays: row
                .closed_weekdays
                .iter()
                .map(|weekday| weekday.parse::<Weekday>().map_err(malformed))
                .collect::<Result<_, _>>()?,
        })
    }
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Self {
            id: row.id,
            service_type_id: row.service_type_id,
            date: row.date,
            time: row.time,
            patient_name: row.patient_name,
            patient_email: row.patient_email,
            patient_phone: row.patient_phone,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

impl From<Booking> for BookingRow {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id,
            service_type_id: booking.service_type_id,
            date: booking.date,
            time: booking.time,
            patient_name: booking.patient_name,
            patient_email: booking.patient_email,
            patient_phone: booking.patient_phone,
            notes: booking.notes,
            created_at: booking.created_at,
        }
    }
}

impl From<DieselError> for StoreError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => StoreError::NotFound("Record not found".into()),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                StoreError::Conflict(info.message().into())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                StoreError::NotFound(info.message().into())
            }
            err => {
                error!(%err, "Database request failed");
                StoreError::Unavailable(err.to_string())
            }
        }
    }
}

/// `LIKE` pattern matching `needle` literally anywhere in the value.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::from("%");
    for c in needle.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[derive(Clone)]
pub struct DatabaseInterface {
    connection: Arc<Mutex<PgConnection>>,
}

impl DatabaseInterface {
    pub fn new(database_url: &str) -> Result<Self, ConnectionError> {
        let connection = Self::establish_connection(database_url)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    fn establish_connection(database_url: &str) -> Result<PgConnection, ConnectionError> {
        PgConnection::establish(database_url)
    }

    fn connection(&self) -> MutexGuard<'_, PgConnection> {
        self.connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn load_bookings(
        &self,
        query: bookings::BoxedQuery<'_, diesel::pg::Pg>,
    ) -> Result<Vec<Booking>, StoreError> {
        let rows = query
            .select(BookingRow::as_select())
            .load(&mut *self.connection())?;
        Ok(rows.into_iter().map(Booking::from).collect())
    }
}

impl ServiceTypeStore for DatabaseInterface {
    fn service_types(&self) -> Result<Vec<ServiceTypeConfig>, StoreError> {
        let rows = service_types::table
            .select(ServiceTypeRow::as_select())
            .order(service_types::id)
            .load(&mut *self.connection())?;
        rows.into_iter().map(ServiceTypeConfig::try_from).collect()
    }

    fn service_type(&self, id: &str) -> Result<ServiceTypeConfig, StoreError> {
        let row = service_types::table
            .find(id)
            .select(ServiceTypeRow::as_select())
            .first(&mut *self.connection())
            .optional()?
            .ok_or_else(|| StoreError::NotFound(id.into()))?;
        ServiceTypeConfig::try_from(row)
    }

    fn upsert_service_type(&self, service_type: ServiceTypeConfig) -> Result<(), StoreError> {
        let row = ServiceTypeRow::try_from(&service_type)?;
        diesel::insert_into(service_types::table)
            .values(&row)
            .on_conflict(service_types::id)
            .do_update()
            .set(&row)
            .execute(&mut *self.connection())?;
        Ok(())
    }

    fn remove_service_type(&self, id: &str) -> Result<(), StoreError> {
        let removed =
            diesel::delete(service_types::table.find(id)).execute(&mut *self.connection())?;
        if removed == 0 {
            error!(id, "Deletion failed. 0 database lines were changed");
            return Err(StoreError::NotFound(id.into()));
        }
        Ok(())
    }
}

impl BookingStore for DatabaseInterface {
    fn bookings_for_date(
        &self,
        service_type_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, StoreError> {
        self.load_bookings(
            bookings::table
                .filter(bookings::service_type_id.eq(service_type_id.to_string()))
                .filter(bookings::date.eq(date))
                .into_boxed(),
        )
    }

    fn bookings_for_patient(
        &self,
        patient_email: &str,
        service_type_id: &str,
    ) -> Result<Vec<Booking>, StoreError> {
        self.load_bookings(
            bookings::table
                .filter(bookings::patient_email.eq(patient_email.to_string()))
                .filter(bookings::service_type_id.eq(service_type_id.to_string()))
                .into_boxed(),
        )
    }

    fn bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>, StoreError> {
        let mut query = bookings::table.into_boxed();
        if let Some(name) = &filter.patient_name {
            query = query.filter(bookings::patient_name.like(contains_pattern(name)));
        }
        if let Some(service_type_id) = &filter.service_type_id {
            query = query.filter(bookings::service_type_id.eq(service_type_id.clone()));
        }
        if let Some(date) = filter.date {
            query = query.filter(bookings::date.eq(date));
        }
        self.load_bookings(query)
    }

    fn insert_booking(&self, booking: Booking) -> Result<(), StoreError> {
        let mut connection = self.connection();
        connection.transaction::<_, StoreError, _>(|connection| {
            // Locking the service type row serializes inserts into its slots.
            let capacity: i32 = service_types::table
                .find(booking.service_type_id.as_str())
                .select(service_types::capacity)
                .for_update()
                .first(connection)
                .optional()?
                .ok_or_else(|| StoreError::NotFound(booking.service_type_id.clone()))?;

            let occupied: i64 = bookings::table
                .filter(bookings::service_type_id.eq(booking.service_type_id.as_str()))
                .filter(bookings::date.eq(booking.date))
                .filter(bookings::time.eq(booking.time))
                .count()
                .get_result(connection)?;
            if occupied >= i64::from(capacity) {
                let err = "Slot was already fully booked";
                error!(date = %booking.date, time = %booking.time, err);
                return Err(StoreError::Conflict(err.into()));
            }

            diesel::insert_into(bookings::table)
                .values(BookingRow::from(booking))
                .execute(connection)?;
            Ok(())
        })
    }

    fn update_booking_contact(
        &self,
        id: Uuid,
        update: &ContactUpdate,
    ) -> Result<Booking, StoreError> {
        let mut connection = self.connection();
        connection.transaction::<_, StoreError, _>(|connection| {
            let row = bookings::table
                .find(id)
                .select(BookingRow::as_select())
                .first(connection)
                .optional()?
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            let mut booking = Booking::from(row);
            update.apply(&mut booking);

            diesel::update(bookings::table.find(id))
                .set((
                    bookings::patient_name.eq(&booking.patient_name),
                    bookings::patient_email.eq(&booking.patient_email),
                    bookings::patient_phone.eq(&booking.patient_phone),
                    bookings::notes.eq(&booking.notes),
                ))
                .execute(connection)?;
            Ok(booking)
        })
    }

    fn remove_booking(&self, id: Uuid) -> Result<(), StoreError> {
        let removed = diesel::delete(bookings::table.find(id)).execute(&mut *self.connection())?;
        if removed == 0 {
            error!(%id, "Deletion failed. 0 database lines were changed");
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn remove_all_bookings(&self) -> Result<(), StoreError> {
        diesel::delete(bookings::table).execute(&mut *self.connection())?;
        Ok(())
    }
}
