// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The base state machine shared by all asset types.

use tracing::{debug, info, warn};

use super::EngineContext;
use crate::state::keys;
use crate::{Asset, Error, GatingSensor};

/// Parses a stored status value.
pub(crate) fn parse_status(state_key: &str, value: Option<String>) -> Result<bool, Error> {
    match value.as_deref() {
        Some("1") => Ok(true),
        Some("0") => Ok(false),
        Some(other) => Err(Error::corrupt_state(format!(
            "Value '{other}' for key {state_key} is not a status."
        ))),
        None => Err(Error::not_found(format!(
            "No state stored for key {state_key}."
        ))),
    }
}

/// Reads and writes the operational state of a single asset.
///
/// Every asset behavior wraps one of these.  Its mutators assume that the
/// caller holds the asset's transition lock.
#[derive(Clone, Debug)]
pub struct StateManager {
    asset: Asset,
    state_key: String,
}

impl StateManager {
    pub(crate) fn new(asset: Asset) -> Self {
        let state_key = asset.state_key();
        Self { asset, state_key }
    }

    /// Returns the managed asset.
    pub fn asset(&self) -> &Asset {
        &self.asset
    }

    /// Returns the key under which the asset's status is stored.
    pub fn state_key(&self) -> &str {
        &self.state_key
    }

    /// Returns true if the asset is on.
    pub async fn status(&self, ctx: &EngineContext) -> Result<bool, Error> {
        parse_status(&self.state_key, ctx.store().get(&self.state_key).await?)
    }

    /// Returns the load last stored for the asset.
    pub async fn load(&self, ctx: &EngineContext) -> Result<f64, Error> {
        let load_key = keys::load_key(&self.state_key);
        let Some(value) = ctx.store().get(&load_key).await? else {
            return Err(Error::not_found(format!(
                "No load stored for key {load_key}."
            )));
        };
        value.parse().map_err(|_| {
            Error::corrupt_state(format!(
                "Value '{value}' for key {load_key} is not a load."
            ))
        })
    }

    /// Returns the Unix timestamp of the asset's last power-up, if it was
    /// ever powered up.
    pub async fn boot_time(&self, ctx: &EngineContext) -> Result<Option<i64>, Error> {
        let start_time_key = keys::start_time_key(self.asset.key);
        ctx.store()
            .get(&start_time_key)
            .await?
            .map(|value| {
                value.parse().map_err(|_| {
                    Error::corrupt_state(format!(
                        "Value '{value}' for key {start_time_key} is not a timestamp."
                    ))
                })
            })
            .transpose()
    }

    /// Returns true unless every parent of the asset is off, or every gating
    /// sensor of the asset reads its switch-off value.
    ///
    /// Assets without parents or gating sensors are always available.
    /// Parents and sensors that have no stored value count as available.
    pub async fn parents_available(&self, ctx: &EngineContext) -> Result<bool, Error> {
        let key = self.asset.key;

        let parents = ctx.topology().parents(key)?;
        let parent_keys: Vec<String> = parents.iter().map(Asset::state_key).collect();
        let assets_up = self
            .any_up(ctx, &parent_keys, "all parents are off", |value, _| {
                value == Some("0")
            })
            .await?;

        let gates = ctx.topology().gating_sensors(key)?;
        let sensor_keys: Vec<String> = gates.iter().map(GatingSensor::value_key).collect();
        let sensors_up = self
            .any_up(ctx, &sensor_keys, "all gating sensors are switched off", |value, i| {
                value.and_then(keys::sensor_reading) == Some(gates[i].switch_off.as_str())
            })
            .await?;

        Ok(assets_up && sensors_up)
    }

    /// Fetches `value_keys` in one round trip and returns false only if every
    /// one of them reads as down.
    async fn any_up(
        &self,
        ctx: &EngineContext,
        value_keys: &[String],
        reason: &str,
        is_down: impl Fn(Option<&str>, usize) -> bool + Send,
    ) -> Result<bool, Error> {
        if value_keys.is_empty() {
            return Ok(true);
        }

        let values = ctx.store().mget(value_keys).await?;
        let down: Vec<&str> = value_keys
            .iter()
            .zip(values.iter())
            .enumerate()
            .filter(|(i, (_, value))| is_down(value.as_deref(), *i))
            .map(|(_, (value_key, _))| value_key.as_str())
            .collect();

        if down.len() == value_keys.len() {
            warn!(
                asset = self.asset.key,
                down = ?down,
                "Asset can't power up: {reason}"
            );
            return Ok(false);
        }
        Ok(true)
    }

    /// Stores the current time as the asset's boot time.
    pub(crate) async fn reset_boot_time(&self, ctx: &EngineContext) -> Result<(), Error> {
        let now = ctx.clock().now().timestamp();
        ctx.store()
            .set(&keys::start_time_key(self.asset.key), &now.to_string())
            .await
    }

    /// Writes the asset's status and publishes the change.
    pub(crate) async fn set_state(&self, ctx: &EngineContext, on: bool) -> Result<(), Error> {
        ctx.store()
            .set(&self.state_key, if on { "1" } else { "0" })
            .await?;
        info!(asset = self.asset.key, on, "Asset state changed");

        let config = ctx.config();
        if config.publish_notifications {
            ctx.store()
                .publish(&config.notification_channel, &self.state_key)
                .await?;
        }
        Ok(())
    }

    /// Switches the asset on after its boot delay, if it is off and its
    /// upstream dependencies allow it.  Returns the resulting status.
    pub(crate) async fn power_up(&self, ctx: &EngineContext) -> Result<bool, Error> {
        if self.status(ctx).await? {
            debug!(asset = self.asset.key, "Asset is already on");
            return Ok(true);
        }
        if !self.parents_available(ctx).await? {
            return Ok(false);
        }

        if let Some(delay) = self.asset.on_delay {
            ctx.clock().delay(delay).await;
        }
        self.reset_boot_time(ctx).await?;
        self.set_state(ctx, true).await?;
        Ok(true)
    }

    /// Switches the asset off immediately.  Returns the resulting status.
    pub(crate) async fn power_off(&self, ctx: &EngineContext) -> Result<bool, Error> {
        if self.status(ctx).await? {
            self.set_state(ctx, false).await?;
        }
        Ok(false)
    }

    /// Switches the asset off after its shutdown delay.  Returns the
    /// resulting status.
    pub(crate) async fn shut_down(&self, ctx: &EngineContext) -> Result<bool, Error> {
        if let Some(delay) = self.asset.off_delay {
            ctx.clock().delay(delay).await;
        }
        self.power_off(ctx).await
    }

    /// Stores a new load for the asset.
    ///
    /// Returns false, without writing anything, if `load` is negative or NaN.
    pub(crate) async fn store_load(&self, ctx: &EngineContext, load: f64) -> Result<bool, Error> {
        if load.is_nan() || load < 0.0 {
            debug!(asset = self.asset.key, load, "Ignoring negative or NaN load");
            return Ok(false);
        }
        ctx.store()
            .set(&keys::load_key(&self.state_key), &load.to_string())
            .await?;
        Ok(true)
    }
}
