use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::sync::LiveView;
use crate::backend::Backend;
use crate::map::MapSurface;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PollMode {
    Idle,
    Running {
        since: DateTime<Utc>,
        interval_secs: u64,
    },
}

#[derive(Debug)]
struct WorkerHandle {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

/// Auto-refresh timer. At most one polling task exists at a time.
pub struct Poller {
    interval: Duration,
    mode: PollMode,
    worker: Option<WorkerHandle>,
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            mode: PollMode::Idle,
            worker: None,
        }
    }

    pub fn mode(&self) -> PollMode {
        self.mode.clone()
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Starts or stops polling. Enabling always replaces the current timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn set_enabled<B, M>(&mut self, enabled: bool, view: &LiveView<B, M>)
    where
        B: Backend,
        M: MapSurface + Send + 'static,
    {
        self.cancel();
        if !enabled {
            return;
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let join = tokio::spawn(run_poll_loop(view.clone(), self.interval, stop_rx));

        self.worker = Some(WorkerHandle { stop_tx, join });
        self.mode = PollMode::Running {
            since: Utc::now(),
            interval_secs: self.interval.as_secs(),
        };
        log::info!("Auto-refresh every {:?}", self.interval);
    }

    fn cancel(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            worker.join.abort();
            log::info!("Auto-refresh stopped");
        }
        self.mode = PollMode::Idle;
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_poll_loop<B, M>(
    view: LiveView<B, M>,
    period: Duration,
    mut stop_rx: oneshot::Receiver<()>,
) where
    B: Backend,
    M: MapSurface + Send + 'static,
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut stop_rx => break,
        }

        let report = tokio::select! {
            report = view.refresh_cycle() => report,
            _ = &mut stop_rx => break,
        };
        log::debug!(
            "Poll cycle: latest {:?}, tracks {:?}",
            report.latest,
            report.tracks
        );
    }
}
