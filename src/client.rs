use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::api;
use crate::logger::{CommandLogMode, CommandLogger};
use crate::types::{Device, DeviceId, RawZone};
use crate::{Error, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HubClientBuilder {
    address: String,
    protocol: String,
    token: Option<String>,
    timeout: Duration,
    log_mode: Option<CommandLogMode>,
    log_path: Option<String>,
}

impl HubClientBuilder {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            protocol: "http".to_string(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
            log_mode: None,
            log_path: None,
        }
    }

    pub fn protocol(mut self, proto: &str) -> Self {
        self.protocol = proto.to_string();
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Upper bound for any single hub request, commands included. A slow
    /// downstream call must not stall the polling loop past the next tick.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn command_log(mut self, mode: CommandLogMode, path: impl Into<String>) -> Self {
        self.log_mode = Some(mode);
        self.log_path = Some(path.into());
        self
    }

    pub fn build(self) -> HubClient {
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .expect("failed to build HTTP client");

        let logger = match (self.log_mode, self.log_path) {
            (Some(mode), Some(path)) => {
                Some(CommandLogger::new(mode, &path).expect("failed to open log file"))
            }
            _ => None,
        };

        HubClient {
            http,
            base_url: format!("{}://{}", self.protocol, self.address),
            token: self.token,
            logger,
        }
    }
}

/// Client for the hub's device-management API. Requests carry the bearer
/// token from the configuration; without a token no request is issued.
pub struct HubClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    logger: Option<CommandLogger>,
}

impl HubClient {
    pub fn builder(address: impl Into<String>) -> HubClientBuilder {
        HubClientBuilder::new(address)
    }

    /// Fetch the recursive zone tree, wrapped under the synthetic root.
    pub async fn get_zones(&mut self) -> Result<RawZone> {
        let result = self.get_json(api::ZONES_PATH).await?;
        let tree: RawZone = serde_json::from_value(result)?;
        Ok(RawZone::rooted(tree))
    }

    /// Fetch the flat device list.
    pub async fn get_devices(&mut self) -> Result<Vec<Device>> {
        let result = self.get_json(api::DEVICES_PATH).await?;
        let devices: BTreeMap<String, Device> = serde_json::from_value(result)?;
        Ok(devices.into_values().collect())
    }

    /// Push a target-temperature command to a single device.
    pub async fn set_target_temperature(
        &mut self,
        device: &DeviceId,
        temperature: i32,
    ) -> Result<()> {
        let token = self.token.clone().ok_or(Error::MissingToken)?;
        let path = api::device_state_path(device);
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, temperature, "updating device state");

        if let Some(ref mut logger) = self.logger {
            logger.log_request("PUT", &path);
        }

        let outcome: Result<()> = async {
            self.http
                .put(&url)
                .bearer_auth(&token)
                .json(&api::state_update_payload(temperature))
                .send()
                .await?
                .error_for_status()?;
            Ok(())
        }
        .await;

        if let Some(ref mut logger) = self.logger {
            logger.log_command(device, temperature, outcome.is_ok());
        }
        outcome
    }

    async fn get_json(&mut self, path: &str) -> Result<Value> {
        let token = self.token.as_ref().ok_or(Error::MissingToken)?;
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "requesting");

        let body = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        if let Some(ref mut logger) = self.logger {
            logger.log_request("GET", path);
        }

        api::parse_result(&body)
    }
}
