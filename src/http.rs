use crate::{
    backend::Store,
    booking_service::BookingService,
    configuration::Configuration,
    error::{AdminError, AdmissionError, StoreError},
    settings::SharedSettings,
    types::{BookingFilter, BookingRequest, ContactUpdate, ServiceTypeConfig},
};
use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState<S: Store, C: Configuration> {
    booking_service: BookingService<S>,
    configuration: C,
    settings: SharedSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServiceTypesResponse {
    clinic_message: String,
    service_types: Vec<ServiceTypeConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MessageUpdate {
    message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TemplateUpdate {
    template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SlotsQuery {
    date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CalendarQuery {
    year: i32,
    month: u32,
}

fn error_response(status: StatusCode, kind: &str, message: String) -> Response {
    if status.is_server_error() {
        error!(%status, kind, %message, "Request failed");
    }
    (status, Json(json!({ "error": kind, "message": message }))).into_response()
}

impl IntoResponse for AdmissionError {
    fn into_response(self) -> Response {
        let status = match &self {
            AdmissionError::MissingField(_) => StatusCode::BAD_REQUEST,
            AdmissionError::InvalidSlot => StatusCode::UNPROCESSABLE_ENTITY,
            AdmissionError::SlotFull | AdmissionError::DuplicateBooking => StatusCode::CONFLICT,
            AdmissionError::ServiceTypeNotFound(_) => StatusCode::NOT_FOUND,
            AdmissionError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        error_response(status, self.kind(), self.to_string())
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = match &self {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Conflict(_) => StatusCode::CONFLICT,
            StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        error_response(status, self.kind(), self.to_string())
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        match self {
            AdminError::Store(err) => err.into_response(),
            err => error_response(StatusCode::BAD_REQUEST, err.kind(), err.to_string()),
        }
    }
}

pub fn create_app<S: Store, C: Configuration>(
    booking_service: BookingService<S>,
    configuration: C,
    settings: SharedSettings,
) -> Router {
    let state = AppState {
        booking_service,
        configuration,
        settings,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public = Router::new()
        .route("/service_types", get(get_service_types::<S, C>))
        .route("/service_types/:id", get(get_service_type::<S, C>))
        .route("/service_types/:id/slots", get(get_slots::<S, C>))
        .route("/book", post(book::<S, C>));

    let admin = Router::new()
        .route(
            "/admin/bookings",
            get(get_bookings::<S, C>).delete(remove_all_bookings::<S, C>),
        )
        .route(
            "/admin/bookings/:id",
            put(update_booking::<S, C>).delete(remove_booking::<S, C>),
        )
        .route("/admin/calendar", get(get_calendar::<S, C>))
        .route("/admin/service_types", put(upsert_service_type::<S, C>))
        .route(
            "/admin/service_types/:id",
            delete(remove_service_type::<S, C>),
        )
        .route("/admin/settings", get(get_settings::<S, C>))
        .route("/admin/settings/message", put(update_message::<S, C>))
        .route(
            "/admin/settings/confirmation_template",
            put(update_confirmation_template::<S, C>),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth::<S, C>,
        ));

    Router::new()
        .merge(public)
        .merge(admin)
        .with_state(state)
        .layer(cors)
}

async fn admin_auth<S: Store, C: Configuration>(
    State(state): State<AppState<S, C>>,
    request: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    match request.headers().get("x-admin-password") {
        Some(auth_header) => {
            if auth_header.to_str().unwrap_or("") != state.configuration.admin_password() {
                return Err((StatusCode::UNAUTHORIZED, "Unauthorized".to_string()));
            }
        }
        None => return Err((StatusCode::UNAUTHORIZED, "Missing credentials".to_string())),
    }
    Ok(next.run(request).await)
}

async fn get_service_types<S: Store, C: Configuration>(
    State(state): State<AppState<S, C>>,
) -> Result<impl IntoResponse, StoreError> {
    let service_types = state.booking_service.service_types()?;
    Ok(Json(ServiceTypesResponse {
        clinic_message: state.settings.clinic_message(),
        service_types,
    }))
}

async fn get_service_type<S: Store, C: Configuration>(
    State(state): State<AppState<S, C>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, StoreError> {
    let service_type = state.booking_service.service_type(&id)?;
    Ok(Json(service_type))
}

async fn get_slots<S: Store, C: Configuration>(
    State(state): State<AppState<S, C>>,
    Path(id): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<impl IntoResponse, StoreError> {
    let slots = state.booking_service.availability(&id, query.date)?;
    Ok(Json(slots))
}

async fn book<S: Store, C: Configuration>(
    State(state): State<AppState<S, C>>,
    Json(request): Json<BookingRequest>,
) -> Result<impl IntoResponse, AdmissionError> {
    let outcome = state.booking_service.book(request)?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn get_bookings<S: Store, C: Configuration>(
    State(state): State<AppState<S, C>>,
    Query(filter): Query<BookingFilter>,
) -> Result<impl IntoResponse, StoreError> {
    let bookings = state.booking_service.bookings(&filter)?;
    Ok(Json(bookings))
}

async fn update_booking<S: Store, C: Configuration>(
    State(state): State<AppState<S, C>>,
    Path(id): Path<Uuid>,
    Json(update): Json<ContactUpdate>,
) -> Result<impl IntoResponse, AdminError> {
    let booking = state.booking_service.update_booking_contact(id, update)?;
    Ok(Json(booking))
}

async fn remove_booking<S: Store, C: Configuration>(
    State(state): State<AppState<S, C>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, StoreError> {
    state.booking_service.remove_booking(id)?;
    Ok((StatusCode::OK, "Booking removed successfully".to_string()))
}

async fn remove_all_bookings<S: Store, C: Configuration>(
    State(state): State<AppState<S, C>>,
) -> Result<impl IntoResponse, StoreError> {
    state.booking_service.remove_all_bookings()?;
    Ok((StatusCode::OK, "All bookings removed successfully".to_string()))
}

async fn get_calendar<S: Store, C: Configuration>(
    State(state): State<AppState<S, C>>,
    Query(query): Query<CalendarQuery>,
) -> Result<impl IntoResponse, AdminError> {
    let counts = state
        .booking_service
        .daily_counts(query.year, query.month)?;
    Ok(Json(counts))
}

async fn upsert_service_type<S: Store, C: Configuration>(
    State(state): State<AppState<S, C>>,
    Json(service_type): Json<ServiceTypeConfig>,
) -> Result<impl IntoResponse, AdminError> {
    state.booking_service.upsert_service_type(service_type)?;
    Ok((StatusCode::OK, "Service type saved successfully".to_string()))
}

async fn remove_service_type<S: Store, C: Configuration>(
    State(state): State<AppState<S, C>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, StoreError> {
    state.booking_service.remove_service_type(&id)?;
    Ok((
        StatusCode::OK,
        "Service type removed successfully".to_string(),
    ))
}

async fn get_settings<S: Store, C: Configuration>(
    State(state): State<AppState<S, C>>,
) -> impl IntoResponse {
    Json(state.settings.snapshot())
}

async fn update_message<S: Store, C: Configuration>(
    State(state): State<AppState<S, C>>,
    Json(update): Json<MessageUpdate>,
) -> impl IntoResponse {
    Json(state.settings.set_clinic_message(&update.message))
}

async fn update_confirmation_template<S: Store, C: Configuration>(
    State(state): State<AppState<S, C>>,
    Json(update): Json<TemplateUpdate>,
) -> Result<impl IntoResponse, AdminError> {
    let settings = state
        .settings
        .set_confirmation_template(&update.template)?;
    Ok(Json(settings))
}
