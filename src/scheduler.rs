use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Datelike, Local, Timelike};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::client::HubClient;
use crate::compile::{ScheduleTable, compile};
use crate::config::ConfigStore;
use crate::index::HeatingIndex;
use crate::tree::normalize;
use crate::types::Weekday;
use crate::Result;

/// One tick per minute of wall-clock time.
pub const TICK_INTERVAL: Duration = Duration::from_secs(60);

/// Maximum age of a compiled table before re-discovery is forced even
/// without a configuration change.
pub const STALE_AFTER: Duration = Duration::from_secs(60 * 10);

/// Immutable result of one discovery + compile pass: the lookup table and
/// the configuration marker it was built from. Replaced wholesale, never
/// mutated, so a tick always reads one consistent table.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub table: ScheduleTable,
    pub updated: Option<i64>,
}

/// The polling scheduler: re-discovers zones and devices when the
/// configuration changes or goes stale, and applies the compiled table
/// once per minute.
pub struct Scheduler<S> {
    client: HubClient,
    store: S,
    snapshot: Arc<Snapshot>,
    last_refresh: Option<Instant>,
    stale_after: Duration,
}

impl<S: ConfigStore> Scheduler<S> {
    pub fn new(client: HubClient, store: S) -> Self {
        Self {
            client,
            store,
            snapshot: Arc::new(Snapshot::default()),
            last_refresh: None,
            stale_after: STALE_AFTER,
        }
    }

    /// Override the staleness threshold; mainly for tests.
    pub fn stale_after(mut self, threshold: Duration) -> Self {
        self.stale_after = threshold;
        self
    }

    /// The currently installed snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot)
    }

    /// Run the full discovery + compile pipeline and install the result.
    /// The previous snapshot stays in force until the new one is complete.
    pub async fn refresh(&mut self) -> Result<()> {
        let config = self.store.get()?.unwrap_or_default();
        let root = self.client.get_zones().await?;
        let devices = self.client.get_devices().await?;

        let index = HeatingIndex::build(&root, &devices);
        let tree = normalize(&root, index.heating_zones());
        let table = compile(&tree, &index, &config);

        info!(
            heating_zones = index.heating_zones().len(),
            devices = devices.len(),
            slots = table.len(),
            "discovery complete"
        );

        self.snapshot = Arc::new(Snapshot {
            table,
            updated: config.updated,
        });
        self.last_refresh = Some(Instant::now());
        Ok(())
    }

    /// One scheduler tick: detect configuration change or staleness,
    /// re-discover if needed, then apply the slot for the given moment.
    pub async fn tick(&mut self, now: DateTime<Local>) {
        let live_updated = match self.store.get() {
            Ok(config) => config.and_then(|c| c.updated),
            Err(e) => {
                warn!(error = %e, "configuration fetch failed, keeping compiled table");
                self.snapshot.updated
            }
        };

        if self.needs_refresh(live_updated) {
            info!("refreshing configuration");
            if let Err(e) = self.refresh().await {
                warn!(error = %e, "discovery failed, previous table remains in force");
            }
        }

        self.apply(now).await;
    }

    /// Loop forever: initial discovery, then a fixed one-minute cadence.
    /// Ticks run strictly one at a time; a tick outlasting the interval
    /// defers the next trigger instead of overlapping it.
    pub async fn run(&mut self) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "initial discovery failed, starting with empty table");
        }

        let mut interval = tokio::time::interval(TICK_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            self.tick(Local::now()).await;
        }
    }

    fn needs_refresh(&self, live_updated: Option<i64>) -> bool {
        let Some(at) = self.last_refresh else {
            return true;
        };
        live_updated != self.snapshot.updated || at.elapsed() > self.stale_after
    }

    async fn apply(&mut self, now: DateTime<Local>) {
        let day = Weekday::from_chrono(now.weekday());
        let hour = now.hour() as u8;
        let minute = now.minute() as u8;
        debug!(day = %day, hour, minute, "tick");

        let snapshot = Arc::clone(&self.snapshot);
        for (device, temperature) in snapshot.table.at(day, hour, minute) {
            if temperature <= 0 {
                continue;
            }
            info!(device = %device, temperature, "setting target temperature");
            if let Err(e) = self.client.set_target_temperature(device, temperature).await {
                warn!(device = %device, error = %e, "temperature command failed");
            }
        }
    }
}
