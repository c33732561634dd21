use crate::domain::{validate_rate, CurrencyCode, CurrencyRate, ExchangeRateSnapshot, SYSTEM_ACTOR};
use crate::feed::FeedError;
use crate::ports::{CurrencyStore, RateCache, RateFeed};
use chrono::Utc;
use shared::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("rate feed failed: {0}")]
    Feed(#[from] FeedError),
    #[error("refresh pass cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    /// Create rows for codes the store doesn't know yet
    Population,
    /// Overwrite existing rows with fresh rates
    Update,
}

/// Outcome of one pass over a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub phase: RefreshPhase,
    pub fetched: usize,
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RefreshReport {
    fn new(phase: RefreshPhase, fetched: usize) -> Self {
        Self {
            phase,
            fetched,
            written: 0,
            skipped: 0,
            failed: 0,
        }
    }

    fn log(&self) {
        info!(
            phase = ?self.phase,
            fetched = self.fetched,
            written = self.written,
            skipped = self.skipped,
            failed = self.failed,
            "Rate refresh pass complete"
        );
    }
}

/// Keeps the store and cache in line with the rate feed.
///
/// Runs a population pass once, then an update pass on every tick until the
/// cancellation token fires.
pub struct RateRefresher {
    store: Arc<dyn CurrencyStore>,
    cache: Arc<dyn RateCache>,
    feed: Arc<dyn RateFeed>,
    interval: Duration,
    cache_ttl: Duration,
    phase: RefreshPhase,
}

enum RowOutcome {
    Written(CurrencyRate),
    Skipped,
    Failed,
}

impl RateRefresher {
    pub fn new(
        store: Arc<dyn CurrencyStore>,
        cache: Arc<dyn RateCache>,
        feed: Arc<dyn RateFeed>,
        interval: Duration,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            feed,
            interval,
            cache_ttl,
            phase: RefreshPhase::Population,
        }
    }

    pub fn phase(&self) -> RefreshPhase {
        self.phase
    }

    /// Run the pass for the current phase. Only a population pass that ran to
    /// completion moves the refresher to the update phase.
    pub async fn run_pass(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<RefreshReport, RefreshError> {
        let report = self.pass(self.phase, cancel).await?;
        self.phase = RefreshPhase::Update;
        Ok(report)
    }

    /// Populate, then spawn the update loop.
    /// A population failure is returned and no loop is started.
    pub async fn start(mut self, cancel: CancellationToken) -> Result<RefresherHandle, RefreshError> {
        if self.phase == RefreshPhase::Population {
            self.run_pass(&cancel).await?;
        }

        let task = tokio::spawn(self.run_loop(cancel));
        Ok(RefresherHandle { task })
    }

    async fn run_loop(self, cancel: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = self.interval.as_secs(), "Rate refresher started");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.pass(RefreshPhase::Update, &cancel).await {
                Ok(_) => {}
                Err(RefreshError::Cancelled) => break,
                Err(e) => warn!("Rate update failed, retrying on next tick: {}", e),
            }
        }

        info!("Rate refresher stopped");
    }

    async fn pass(
        &self,
        phase: RefreshPhase,
        cancel: &CancellationToken,
    ) -> Result<RefreshReport, RefreshError> {
        let snapshot = match self.feed.fetch_rates(cancel).await {
            Ok(snapshot) => snapshot,
            Err(FeedError::Cancelled) => return Err(RefreshError::Cancelled),
            Err(e) => return Err(e.into()),
        };
        let report = self.apply(phase, &snapshot, cancel).await?;
        report.log();
        Ok(report)
    }

    async fn apply(
        &self,
        phase: RefreshPhase,
        snapshot: &ExchangeRateSnapshot,
        cancel: &CancellationToken,
    ) -> Result<RefreshReport, RefreshError> {
        let mut report = RefreshReport::new(phase, snapshot.rates.len());

        for (raw_code, rate) in snapshot.sorted_rates() {
            if cancel.is_cancelled() {
                info!(
                    phase = ?phase,
                    written = report.written,
                    "Refresh pass interrupted by shutdown"
                );
                return Err(RefreshError::Cancelled);
            }

            let (code, rate) = match (CurrencyCode::parse(raw_code), validate_rate(rate)) {
                (Ok(code), Ok(rate)) => (code, rate),
                _ => {
                    warn!("Skipping invalid pair from feed: {} = {}", raw_code, rate);
                    report.skipped += 1;
                    continue;
                }
            };

            let outcome = match phase {
                RefreshPhase::Population => self.populate_row(code, rate).await,
                RefreshPhase::Update => self.update_row(code, rate).await,
            };

            match outcome {
                RowOutcome::Written(row) => {
                    report.written += 1;
                    if let Err(e) = self.cache.set(&row.code, row.rate, self.cache_ttl).await {
                        warn!("Failed to cache rate for {}: {}", row.code, e);
                    }
                }
                RowOutcome::Skipped => report.skipped += 1,
                RowOutcome::Failed => report.failed += 1,
            }
        }

        Ok(report)
    }

    async fn populate_row(&self, code: CurrencyCode, rate: f64) -> RowOutcome {
        let row = match CurrencyRate::new(code, rate, SYSTEM_ACTOR) {
            Ok(row) => row,
            Err(_) => return RowOutcome::Skipped,
        };

        match self.store.create(row.clone()).await {
            Ok(()) => RowOutcome::Written(row),
            Err(Error::AlreadyExists(_)) => RowOutcome::Skipped,
            Err(e) => {
                error!("Failed to create {}: {}", row.code, e);
                RowOutcome::Failed
            }
        }
    }

    async fn update_row(&self, code: CurrencyCode, rate: f64) -> RowOutcome {
        let existing = match self.store.get_by_code(&code).await {
            Ok(Some(existing)) => existing,
            Ok(None) => {
                debug!("No row for {}, not recreating it", code);
                return RowOutcome::Skipped;
            }
            Err(e) => {
                error!("Failed to read {}: {}", code, e);
                return RowOutcome::Failed;
            }
        };

        let row = match existing.with_rate(rate, SYSTEM_ACTOR, Utc::now()) {
            Ok(row) => row,
            Err(_) => return RowOutcome::Skipped,
        };

        match self.store.update(row.clone()).await {
            Ok(()) => RowOutcome::Written(row),
            // Removed by an admin between the read and the write
            Err(Error::CurrencyNotFound(_)) => RowOutcome::Skipped,
            Err(e) => {
                error!("Failed to update {}: {}", row.code, e);
                RowOutcome::Failed
            }
        }
    }
}

/// Handle to the spawned update loop
pub struct RefresherHandle {
    task: JoinHandle<()>,
}

impl RefresherHandle {
    /// Wait for the loop to observe cancellation and exit
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            error!("Rate refresher task failed: {}", e);
        }
    }
}
