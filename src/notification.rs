use crate::{
    error::NotifyError,
    settings::SharedSettings,
    time,
    types::{Booking, ServiceTypeConfig},
};
use tracing::info;

pub const DEFAULT_CONFIRMATION_TEMPLATE: &str = "Dear {name},\n\n\
Thank you for choosing our clinic. Your appointment is confirmed.\n\n\
Service: {service_type}\n\
Date and time: {date} {time}\n\
Notes: {notes}\n\n\
If you have any questions, please contact us by phone.";

/// Delivers the booking confirmation. Called once per admitted booking; a failure is
/// reported as a warning and never undoes the booking.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationSender: Send + Sync {
    fn send(&self, booking: &Booking, service_type: &ServiceTypeConfig) -> Result<(), NotifyError>;
}

/// Fills the placeholders `{name}`, `{service_type}`, `{date}`, `{time}` and `{notes}`.
pub fn render_confirmation(
    template: &str,
    booking: &Booking,
    service_type: &ServiceTypeConfig,
) -> String {
    template
        .replace("{name}", &booking.patient_name)
        .replace("{service_type}", &service_type.name)
        .replace("{date}", &booking.date.to_string())
        .replace("{time}", &time::format_hh_mm(booking.time))
        .replace("{notes}", booking.notes.as_deref().unwrap_or("-"))
}

/// Renders the confirmation with the current template and writes it to the log instead
/// of a mail gateway.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    settings: SharedSettings,
}

impl LogNotifier {
    pub fn new(settings: SharedSettings) -> Self {
        Self { settings }
    }

    pub fn render(&self, booking: &Booking, service_type: &ServiceTypeConfig) -> String {
        render_confirmation(&self.settings.confirmation_template(), booking, service_type)
    }
}

impl NotificationSender for LogNotifier {
    fn send(&self, booking: &Booking, service_type: &ServiceTypeConfig) -> Result<(), NotifyError> {
        if booking.patient_email.is_empty() {
            return Err(NotifyError("Booking has no recipient".into()));
        }
        let body = self.render(booking, service_type);
        info!(recipient = %booking.patient_email, booking_id = %booking.id, "Sending booking confirmation");
        info!("{body}");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testutils::{example_booking, example_service_type, TestConfiguration};

    #[test]
    fn test_render_confirmation() {
        let booking = example_booking("09:15");
        let service_type = example_service_type();
        let body = render_confirmation(
            "{name}: {service_type} on {date} at {time} ({notes})",
            &booking,
            &service_type,
        );
        assert_eq!(
            body,
            "Tanaka Taro: Health checkup on 2025-08-11 at 09:15 (-)"
        );
    }

    #[test]
    fn test_default_template_fills_every_placeholder() {
        let mut booking = example_booking("09:00");
        booking.notes = Some("First visit".into());
        let body = render_confirmation(
            DEFAULT_CONFIRMATION_TEMPLATE,
            &booking,
            &example_service_type(),
        );
        assert!(!body.contains('{'));
        assert!(body.contains("First visit"));
        assert!(body.contains("2025-08-11 09:00"));
    }

    #[test]
    fn test_log_notifier() {
        let notifier = LogNotifier::new(SharedSettings::from_configuration(&TestConfiguration));
        let mut booking = example_booking("09:00");
        notifier.send(&booking, &example_service_type()).unwrap();

        booking.patient_email.clear();
        notifier
            .send(&booking, &example_service_type())
            .unwrap_err();
    }

    #[test]
    fn test_log_notifier_follows_template_changes() {
        let settings = SharedSettings::from_configuration(&TestConfiguration);
        let notifier = LogNotifier::new(settings.clone());
        let booking = example_booking("09:15");

        settings
            .set_confirmation_template("{name} at {time}")
            .unwrap();
        assert_eq!(
            notifier.render(&booking, &example_service_type()),
            "Tanaka Taro at 09:15"
        );
    }
}
