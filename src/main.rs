use crate::{
    backend::Store, booking_service::BookingService, configuration::Configuration,
    configuration_handler::ConfigurationHandler, http::create_app, local_store::LocalStore,
    notification::LogNotifier, settings::SharedSettings,
};
use chrono::{Datelike, Local};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod admission;
mod backend;
mod booking_service;
mod configuration;
mod configuration_handler;
#[cfg(feature = "postgres")]
mod database_interface;
mod error;
mod http;
mod local_store;
mod notification;
#[cfg(feature = "postgres")]
mod schema;
mod settings;
mod slots;
#[cfg(test)]
mod testutils;
mod time;
mod types;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("##################");
    println!("# Clinic Booking #");
    println!("##################");

    let configuration = ConfigurationHandler::parse_arguments();

    let address = format!("0.0.0.0:{}", configuration.port());
    let listener = match TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(?err, %address, "Failed to bind listener");
            return;
        }
    };
    println!("Accessible at:\n{address}");

    run(listener, configuration).await;
}

#[cfg(feature = "postgres")]
async fn run(listener: TcpListener, configuration: ConfigurationHandler) {
    use crate::database_interface::DatabaseInterface;
    use std::time::Duration;
    use tokio::time::sleep;

    match configuration.database_url() {
        Some(database_url) => {
            let store = loop {
                match DatabaseInterface::new(&database_url) {
                    Ok(store) => {
                        info!("Successfully connected to database");
                        break store;
                    }
                    Err(err) => {
                        error!(?err, "Failed to establish database connection: {database_url}. Retry in 1 sec. You may want to restart it with database disabled (bookings kept in memory).");
                        sleep(Duration::from_secs(1)).await;
                    }
                }
            };
            serve(listener, store, configuration).await;
        }
        None => serve(listener, LocalStore::default(), configuration).await,
    }
}

#[cfg(not(feature = "postgres"))]
async fn run(listener: TcpListener, configuration: ConfigurationHandler) {
    if configuration.database_url().is_some() {
        warn!("DATABASE_URL is set but the postgres feature is disabled, bookings are kept in memory");
    }
    serve(listener, LocalStore::default(), configuration).await;
}

async fn serve<S: Store, C: Configuration>(listener: TcpListener, store: S, configuration: C) {
    let settings = SharedSettings::from_configuration(&configuration);
    let notifier = Arc::new(LogNotifier::new(settings.clone()));
    let booking_service = BookingService::new(store, notifier);

    if configuration.seed_defaults() {
        let year = Local::now().year();
        match booking_service.insert_default_service_types(year) {
            Ok(()) => info!(year, "Default service types available"),
            Err(err) => warn!(%err, "Default service types could not be added"),
        }
    }

    let app = create_app(booking_service, configuration, settings);
    if let Err(err) = axum::serve(listener, app).await {
        error!(?err, "Server stopped");
    }
}
