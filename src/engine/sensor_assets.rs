// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Behaviors of assets that emulate IPMI sensors: power supplies and the
//! BMC-backed servers they feed.
//!
//! Sensor readings are plain files in a per-chassis state directory:
//! `<state_dir>/<sensor_subdir>/IOUT_<unit>` holds the current of power
//! supply `unit`, and `POUT_<unit>` its wattage.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{
    Engine, EngineContext, LoadAggregatable, PowerTransitionable, SensorEmulating, ServerManager,
    StateManager, VirtualizationControlled,
};
use crate::state::{keys, StateStore};
use crate::virtualization::Domain;
use crate::Error;

/// Reads the first line of a sensor file as a number.
pub(crate) async fn read_value(path: &Path) -> Result<f64, Error> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        Error::sensor_unavailable(format!("Can't read {}: {e}", path.display()))
    })?;
    let line = content.lines().next().unwrap_or_default().trim();
    line.parse().map_err(|_| {
        Error::sensor_unavailable(format!(
            "{} holds '{line}', which is not a number.",
            path.display()
        ))
    })
}

/// Writes the integer part of `value` to a sensor file.
pub(crate) async fn write_value(path: &Path, value: f64) -> Result<(), Error> {
    tokio::fs::write(path, format!("{}\n", value.trunc() as i64))
        .await
        .map_err(|e| Error::sensor_unavailable(format!("Can't write {}: {e}", path.display())))
}

/// The sensor files of a chassis.
#[derive(Clone, Debug)]
pub struct SensorFiles {
    chassis_key: u64,
    sensor_subdir: String,
}

impl SensorFiles {
    pub(crate) fn new(chassis_key: u64, sensor_subdir: impl Into<String>) -> Self {
        Self {
            chassis_key,
            sensor_subdir: sensor_subdir.into(),
        }
    }

    /// Returns the key of the chassis.
    pub fn chassis_key(&self) -> u64 {
        self.chassis_key
    }

    /// Stores the path of the chassis' state directory.
    pub async fn set_state_dir(&self, store: &dyn StateStore, dir: &Path) -> Result<(), Error> {
        store
            .set(
                &keys::state_dir_key(self.chassis_key),
                &dir.to_string_lossy(),
            )
            .await
    }

    /// Returns the path of the chassis' state directory.
    pub async fn state_dir(&self, store: &dyn StateStore) -> Result<PathBuf, Error> {
        let key = keys::state_dir_key(self.chassis_key);
        match store.get(&key).await? {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => Err(Error::sensor_unavailable(format!(
                "No state directory stored for chassis {}.",
                self.chassis_key
            ))),
        }
    }

    /// Returns the path of the current file of power supply `unit`.
    pub async fn current_file(&self, store: &dyn StateStore, unit: u64) -> Result<PathBuf, Error> {
        self.sensor_file(store, &format!("IOUT_{unit}")).await
    }

    /// Returns the path of the wattage file of power supply `unit`.
    pub async fn wattage_file(&self, store: &dyn StateStore, unit: u64) -> Result<PathBuf, Error> {
        self.sensor_file(store, &format!("POUT_{unit}")).await
    }

    async fn sensor_file(&self, store: &dyn StateStore, name: &str) -> Result<PathBuf, Error> {
        Ok(self
            .state_dir(store)
            .await?
            .join(&self.sensor_subdir)
            .join(name))
    }
}

/// A power supply unit of a chassis.
///
/// Its key is `<chassis key><unit>`: the last decimal digit is the unit
/// index and the remaining digits are the key of the chassis.
#[derive(Debug)]
pub struct PsuManager {
    base: StateManager,
    files: SensorFiles,
    unit: u64,
}

impl PsuManager {
    pub(crate) fn new(base: StateManager, sensor_subdir: &str) -> Self {
        let key = base.asset().key;
        Self {
            files: SensorFiles::new(key / 10, sensor_subdir),
            unit: key % 10,
            base,
        }
    }

    /// Returns the unit index of the PSU within its chassis.
    pub fn unit(&self) -> u64 {
        self.unit
    }

    /// Reads the PSU's current file.
    pub async fn current(&self, ctx: &EngineContext) -> Result<f64, Error> {
        self.read_current(ctx, self.unit).await
    }
}

impl PowerTransitionable for PsuManager {
    fn state_manager(&self) -> &StateManager {
        &self.base
    }
}

#[async_trait]
impl LoadAggregatable for PsuManager {
    /// Each supplied asset draws evenly from all of its powered parents.
    async fn calculate_load(&self, engine: &Engine) -> Result<f64, Error> {
        let ctx = engine.context();
        if !self.base.status(ctx).await? {
            return Ok(0.0);
        }

        let mut load = 0.0;
        for child in ctx.topology().children(self.base.asset().key)? {
            let child_load = engine.calculate_load(child.key).await?;
            if child_load == 0.0 {
                continue;
            }
            let parent_keys: Vec<String> = ctx
                .topology()
                .parents(child.key)?
                .iter()
                .map(|parent| parent.state_key())
                .collect();
            let powered = ctx
                .store()
                .mget(&parent_keys)
                .await?
                .iter()
                .filter(|value| value.as_deref() == Some("1"))
                .count();
            load += child_load / powered.max(1) as f64;
        }
        Ok(load)
    }

    async fn update_load(&self, ctx: &EngineContext, load: f64) -> Result<(), Error> {
        if !self.base.store_load(ctx, load).await? {
            return Ok(());
        }

        let store = ctx.store();
        write_value(&self.files.current_file(store, self.unit).await?, load).await?;
        write_value(
            &self.files.wattage_file(store, self.unit).await?,
            load * ctx.config().wattage_voltage,
        )
        .await?;
        debug!(asset = self.base.asset().key, load, "Updated PSU sensor files");
        Ok(())
    }
}

impl SensorEmulating for PsuManager {
    fn sensor_files(&self) -> &SensorFiles {
        &self.files
    }
}

/// A server with a baseboard management controller.
///
/// It behaves like a [`ServerManager`] and owns the sensor state directory
/// of its chassis, which its PSUs write to.
#[derive(Debug)]
pub struct BmcServerManager {
    server: ServerManager,
    files: SensorFiles,
}

impl BmcServerManager {
    pub(crate) fn new(server: ServerManager, sensor_subdir: &str) -> Self {
        let key = server.state_manager().asset().key;
        Self {
            server,
            files: SensorFiles::new(key, sensor_subdir),
        }
    }
}

#[async_trait]
impl PowerTransitionable for BmcServerManager {
    fn state_manager(&self) -> &StateManager {
        self.server.state_manager()
    }

    async fn power_up(&self, ctx: &EngineContext) -> Result<bool, Error> {
        self.server.power_up(ctx).await
    }

    async fn power_off(&self, ctx: &EngineContext) -> Result<bool, Error> {
        self.server.power_off(ctx).await
    }

    async fn shut_down(&self, ctx: &EngineContext) -> Result<bool, Error> {
        self.server.shut_down(ctx).await
    }
}

#[async_trait]
impl LoadAggregatable for BmcServerManager {
    async fn calculate_load(&self, engine: &Engine) -> Result<f64, Error> {
        self.server.calculate_load(engine).await
    }
}

impl SensorEmulating for BmcServerManager {
    fn sensor_files(&self) -> &SensorFiles {
        &self.files
    }
}

impl VirtualizationControlled for BmcServerManager {
    fn domain(&self) -> &Arc<dyn Domain> {
        self.server.domain()
    }
}
