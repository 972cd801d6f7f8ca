pub trait Configuration: Clone + Send + Sync + 'static {
    fn port(&self) -> String;
    fn database_url(&self) -> Option<String>;
    fn admin_password(&self) -> String;
    /// Shown to patients next to the list of service types.
    fn clinic_message(&self) -> String;
    fn confirmation_template(&self) -> String;
    fn seed_defaults(&self) -> bool;
}
