mod api;
mod client;
mod compile;
mod config;
mod error;
mod index;
mod logger;
mod scheduler;
mod tree;
mod types;

pub use client::{HubClient, HubClientBuilder};
pub use compile::{ScheduleTable, compile};
pub use config::{ConfigStore, JsonConfigStore};
pub use error::{Error, Result};
pub use index::HeatingIndex;
pub use logger::CommandLogMode;
pub use scheduler::{STALE_AFTER, Scheduler, Snapshot, TICK_INTERVAL};
pub use tree::{ZoneNode, normalize};
pub use types::*;
