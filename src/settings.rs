use crate::{configuration::Configuration, error::AdminError};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use tracing::info;

/// Texts an administrator can change while the server is running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub clinic_message: String,
    pub confirmation_template: String,
}

/// Settings shared between the router and the notifier. Starts from the configured
/// values; changes are kept in memory only.
#[derive(Debug, Clone)]
pub struct SharedSettings {
    settings: Arc<RwLock<Settings>>,
}

impl SharedSettings {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(RwLock::new(settings)),
        }
    }

    pub fn from_configuration(configuration: &impl Configuration) -> Self {
        Self::new(Settings {
            clinic_message: configuration.clinic_message(),
            confirmation_template: configuration.confirmation_template(),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, Settings> {
        self.settings.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Settings {
        self.read().clone()
    }

    pub fn clinic_message(&self) -> String {
        self.read().clinic_message.clone()
    }

    pub fn confirmation_template(&self) -> String {
        self.read().confirmation_template.clone()
    }

    /// An empty message is allowed and hides the message.
    pub fn set_clinic_message(&self, message: &str) -> Settings {
        let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        settings.clinic_message = message.trim().to_string();
        info!("Clinic message updated");
        settings.clone()
    }

    pub fn set_confirmation_template(&self, template: &str) -> Result<Settings, AdminError> {
        if template.trim().is_empty() {
            return Err(AdminError::MissingField("confirmation_template"));
        }
        let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        settings.confirmation_template = template.to_string();
        info!("Confirmation template updated");
        Ok(settings.clone())
    }
}
