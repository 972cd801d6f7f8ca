use crate::{configuration::Configuration, notification::DEFAULT_CONFIRMATION_TEMPLATE};
use clap::{ArgAction, Parser};

const DEFAULT_CLINIC_MESSAGE: &str =
    "Thank you for booking with us. Please arrive 15 minutes before your appointment.";

#[derive(Debug, Clone, Parser)]
#[command(version, about = "Appointment booking for a single-location clinic")]
pub struct ConfigurationHandler {
    /// Port the HTTP server listens on
    #[arg(long, env = "PORT", default_value = "3000")]
    port: String,

    /// PostgreSQL connection URL; bookings are kept in memory when absent
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Password expected in the `x-admin-password` header of admin requests
    #[arg(long, env = "ADMIN_PASSWORD", default_value = "admin123")]
    admin_password: String,

    #[arg(long, env = "CLINIC_MESSAGE", default_value = DEFAULT_CLINIC_MESSAGE)]
    clinic_message: String,

    /// Confirmation text with {name}, {service_type}, {date}, {time} and {notes} placeholders
    #[arg(long, env = "CONFIRMATION_TEMPLATE", default_value = DEFAULT_CONFIRMATION_TEMPLATE)]
    confirmation_template: String,

    /// Add the standard service types for the current year on startup
    #[arg(long, env = "SEED_DEFAULTS", default_value_t = true, action = ArgAction::Set)]
    seed_defaults: bool,
}

impl ConfigurationHandler {
    pub fn parse_arguments() -> Self {
        Self::parse()
    }
}

impl Configuration for ConfigurationHandler {
    fn port(&self) -> String {
        self.port.clone()
    }

    fn database_url(&self) -> Option<String> {
        self.database_url.clone()
    }

    fn admin_password(&self) -> String {
        self.admin_password.clone()
    }

    fn clinic_message(&self) -> String {
        self.clinic_message.clone()
    }

    fn confirmation_template(&self) -> String {
        self.confirmation_template.clone()
    }

    fn seed_defaults(&self) -> bool {
        self.seed_defaults
    }
}
