//! The polling dashboard.
//!
//! A [`Dashboard`] owns the current [`DashboardView`] in a `watch` channel and a
//! background task that re-fetches on a fixed interval. Renderers subscribe to the
//! channel and redraw on every change.
//!
//! Foreground refreshes (the initial load and [`Dashboard::refresh`]) go through
//! `Loading` and surface failures as `Error`. Background refreshes never show `Loading`;
//! they only raise the `refreshing` flag while in flight. Their failures are logged and
//! leave the data and status untouched. A background fetch still running when the next
//! tick is due is abandoned. Both kinds may overlap, and whichever resolves last wins.

use crate::error::{DashboardError, DashboardResult};
use crate::source::IntakeSource;
use crate::state::{DashboardStatus, DashboardView};
use api_shared::{Consultation, Patient};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// How often the background task re-fetches.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Shortest accepted refresh interval.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

type Snapshot = (Vec<Patient>, Vec<Consultation>);

/// Fetches both tables. Fails if either request fails.
async fn fetch_snapshot(source: &dyn IntakeSource) -> DashboardResult<Snapshot> {
    tokio::try_join!(source.fetch_patients(), source.fetch_consultations())
}

pub struct Dashboard {
    source: Arc<dyn IntakeSource>,
    state: Arc<watch::Sender<DashboardView>>,
    shutdown: watch::Sender<bool>,
    refresher: Option<JoinHandle<()>>,
}

impl Dashboard {
    /// Performs the initial load and starts the background refresh.
    ///
    /// The refresh timer is started whether or not the initial load succeeded, so a
    /// dashboard opened while the API is down recovers on its own.
    ///
    /// # Arguments
    ///
    /// * `source` - Where records are fetched from.
    /// * `interval` - Time between background refreshes. Clamped to
    ///   [`MIN_REFRESH_INTERVAL`].
    pub async fn open(source: Arc<dyn IntakeSource>, interval: Duration) -> Self {
        let (state, _) = watch::channel(DashboardView::loading());
        let state = Arc::new(state);
        let (shutdown, shutdown_rx) = watch::channel(false);

        let mut dashboard = Self {
            source,
            state,
            shutdown,
            refresher: None,
        };

        if let Err(e) = dashboard.refresh().await {
            tracing::warn!("initial dashboard load failed: {}", e);
        }

        dashboard.refresher = Some(tokio::spawn(run_refresher(
            dashboard.source.clone(),
            dashboard.state.clone(),
            shutdown_rx,
            interval.max(MIN_REFRESH_INTERVAL),
        )));
        dashboard
    }

    /// User-triggered refresh.
    ///
    /// Enters `Loading`, then `Ready` with the new data or `Error` with the failure
    /// message. Data from the last successful load is kept on failure.
    ///
    /// # Errors
    ///
    /// Returns the fetch error after recording it in the view.
    pub async fn refresh(&self) -> DashboardResult<()> {
        self.state
            .send_modify(|view| view.status = DashboardStatus::Loading);

        match fetch_snapshot(self.source.as_ref()).await {
            Ok((patients, consultations)) => {
                self.state
                    .send_modify(|view| view.apply(patients, consultations));
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                self.state
                    .send_modify(|view| view.status = DashboardStatus::Error(message));
                Err(e)
            }
        }
    }

    /// Turns the background refresh on or off. Ticks while off are skipped.
    pub fn set_auto_refresh(&self, enabled: bool) {
        self.state.send_if_modified(|view| {
            let changed = view.auto_refresh_enabled != enabled;
            view.auto_refresh_enabled = enabled;
            changed
        });
    }

    /// Flips the background refresh and returns the new setting.
    pub fn toggle_auto_refresh(&self) -> bool {
        let mut enabled = false;
        self.state.send_modify(|view| {
            view.auto_refresh_enabled = !view.auto_refresh_enabled;
            enabled = view.auto_refresh_enabled;
        });
        enabled
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardView> {
        self.state.subscribe()
    }

    /// A copy of the current view.
    pub fn view(&self) -> DashboardView {
        self.state.borrow().clone()
    }

    /// Stops the background task and waits for it to finish.
    pub async fn close(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(refresher) = self.refresher.take() {
            if let Err(e) = refresher.await {
                tracing::error!("dashboard refresher error: {:?}", e);
            }
        }
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

async fn run_refresher(
    source: Arc<dyn IntakeSource>,
    state: Arc<watch::Sender<DashboardView>>,
    mut shutdown: watch::Receiver<bool>,
    period: Duration,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
        }

        let enabled = state.borrow().auto_refresh_enabled;
        if !enabled {
            continue;
        }

        state.send_modify(|view| view.refreshing = true);
        let fetch = tokio::time::timeout(period, fetch_snapshot(source.as_ref()));
        let result = tokio::select! {
            _ = shutdown.changed() => break,
            result = fetch => result.unwrap_or(Err(DashboardError::TimedOut(period))),
        };

        match result {
            Ok((patients, consultations)) => state.send_modify(|view| {
                view.apply(patients, consultations);
                view.refreshing = false;
            }),
            Err(e) => {
                tracing::warn!("background refresh failed: {}", e);
                state.send_modify(|view| view.refreshing = false);
            }
        }
    }

    tracing::debug!("dashboard refresher stopped");
}
