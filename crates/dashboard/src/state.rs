use api_shared::{Consultation, Patient};
use chrono::{DateTime, Utc};

/// Where the dashboard is in its fetch cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardStatus {
    /// A foreground fetch is in flight.
    Loading,
    Ready,
    /// The last foreground fetch failed. Previously loaded data is kept.
    Error(String),
}

/// Everything a renderer needs to draw the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub status: DashboardStatus,
    pub patients: Vec<Patient>,
    pub consultations: Vec<Consultation>,
    /// When the last successful snapshot was applied.
    pub last_update: Option<DateTime<Utc>>,
    /// Whether the background task fetches on each tick.
    pub auto_refresh_enabled: bool,
    /// A background fetch is in flight. Never set by foreground refreshes.
    pub refreshing: bool,
}

impl DashboardView {
    pub fn loading() -> Self {
        Self {
            status: DashboardStatus::Loading,
            patients: Vec::new(),
            consultations: Vec::new(),
            last_update: None,
            auto_refresh_enabled: true,
            refreshing: false,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == DashboardStatus::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            DashboardStatus::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Replaces both tables and marks the view ready.
    pub(crate) fn apply(&mut self, patients: Vec<Patient>, consultations: Vec<Consultation>) {
        self.patients = patients;
        self.consultations = consultations;
        self.last_update = Some(Utc::now());
        self.status = DashboardStatus::Ready;
    }
}
