// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The state-transition and load-aggregation engine.
//!
//! An [`Engine`] is built from an [`EngineContext`], which holds every
//! collaborator the engine talks to.  Building it resolves the behavior of
//! each asset in the topology once, through the [`TypeRegistry`].  All
//! operations take the key of the asset they act on.

mod capabilities;
mod devices;
mod distribution;
mod registry;
mod sensor_assets;
mod state_manager;
mod status;
mod telemetry;

#[cfg(test)]
pub(crate) mod test_utils;

pub use capabilities::{
    LoadAggregatable, PowerTransitionable, SensorEmulating, VirtualizationControlled,
};
pub use devices::{ServerManager, StaticDeviceManager};
pub use distribution::{OutletManager, PduManager};
pub use registry::{AssetBehavior, BehaviorBundle, TypeRegistry};
pub use sensor_assets::{BmcServerManager, PsuManager, SensorFiles};
pub use state_manager::StateManager;
pub use status::AssetStatus;
pub use telemetry::{SnmpValue, AMP_ON_PHASE, WATTAGE_DRAW};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::state::{keys, StateStore, Subscription};
use crate::virtualization::Hypervisor;
use crate::{Clock, EngineConfig, Error, SystemClock, TopologyStore};

/// The collaborators of an [`Engine`].
///
/// Nothing is global: every store, clock and hypervisor handle the engine
/// uses is injected here.
#[derive(Clone)]
pub struct EngineContext {
    store: Arc<dyn StateStore>,
    topology: Arc<dyn TopologyStore>,
    clock: Arc<dyn Clock>,
    hypervisor: Option<Arc<dyn Hypervisor>>,
    config: EngineConfig,
}

impl EngineContext {
    /// Creates a context with the wall clock, no hypervisor and the default
    /// configuration.
    pub fn new(store: Arc<dyn StateStore>, topology: Arc<dyn TopologyStore>) -> Self {
        Self {
            store,
            topology,
            clock: Arc::new(SystemClock),
            hypervisor: None,
            config: EngineConfig::default(),
        }
    }

    /// Replaces the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the hypervisor that server assets are mirrored onto.
    pub fn with_hypervisor(mut self, hypervisor: Arc<dyn Hypervisor>) -> Self {
        self.hypervisor = Some(hypervisor);
        self
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &dyn StateStore {
        self.store.as_ref()
    }

    pub fn topology(&self) -> &dyn TopologyStore {
        self.topology.as_ref()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn hypervisor(&self) -> Option<&dyn Hypervisor> {
        self.hypervisor.as_deref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl std::fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineContext")
            .field("hypervisor", &self.hypervisor.as_ref().map(|h| h.uri()))
            .field("config", &self.config)
            .finish()
    }
}

/// Executes power transitions and load queries on the assets of a topology.
///
/// Transitions on the same asset are serialized: each asset's behavior
/// bundle carries a lock that is held from the availability check until the
/// change notification is published.  Transitions on different assets run
/// independently.
#[derive(Debug)]
pub struct Engine {
    ctx: EngineContext,
    registry: TypeRegistry,
}

impl Engine {
    /// Creates a new engine, resolving the behavior of every asset in the
    /// topology.
    ///
    /// Fails with a `DomainLookup` error if a server asset has no matching
    /// virtualization domain.
    pub async fn try_new(ctx: EngineContext) -> Result<Self, Error> {
        let registry = TypeRegistry::resolve(&ctx).await?;
        Ok(Self { ctx, registry })
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Writes an initial status and a zero load for every asset that has no
    /// status in the store yet.
    pub async fn seed_states(&self, on: bool) -> Result<(), Error> {
        for asset in self.ctx.topology().assets() {
            let state_key = asset.state_key();
            if self.ctx.store().get(&state_key).await?.is_some() {
                continue;
            }
            self.ctx
                .store()
                .set(&state_key, if on { "1" } else { "0" })
                .await?;
            self.ctx.store().set(&keys::load_key(&state_key), "0").await?;
            debug!(asset = asset.key, on, "Seeded asset state");
        }
        Ok(())
    }

    /// Subscribes to status change notifications.
    pub async fn subscribe(&self) -> Result<Subscription, Error> {
        self.ctx
            .store()
            .subscribe(&self.ctx.config().notification_channel)
            .await
    }

    /// Returns true if the asset is on.
    pub async fn status(&self, key: u64) -> Result<bool, Error> {
        self.registry
            .bundle(key)?
            .transitions()
            .state_manager()
            .status(&self.ctx)
            .await
    }

    /// Returns the Unix timestamp of the asset's last successful power-up.
    pub async fn boot_time(&self, key: u64) -> Result<Option<i64>, Error> {
        self.registry
            .bundle(key)?
            .transitions()
            .state_manager()
            .boot_time(&self.ctx)
            .await
    }

    /// Returns true if the asset's upstream dependencies allow it to power
    /// up.
    pub async fn parents_available(&self, key: u64) -> Result<bool, Error> {
        self.registry
            .bundle(key)?
            .transitions()
            .state_manager()
            .parents_available(&self.ctx)
            .await
    }

    /// Powers the asset up, if its dependencies allow it.  Returns the
    /// resulting status.
    pub async fn power_up(&self, key: u64) -> Result<bool, Error> {
        let bundle = self.registry.bundle(key)?;
        let _guard = bundle.lock().await;
        bundle.transitions().power_up(&self.ctx).await
    }

    /// Cuts the asset's power.  Returns the resulting status.
    pub async fn power_off(&self, key: u64) -> Result<bool, Error> {
        let bundle = self.registry.bundle(key)?;
        let _guard = bundle.lock().await;
        bundle.transitions().power_off(&self.ctx).await
    }

    /// Shuts the asset down gracefully.  Returns the resulting status.
    pub async fn shut_down(&self, key: u64) -> Result<bool, Error> {
        let bundle = self.registry.bundle(key)?;
        let _guard = bundle.lock().await;
        bundle.transitions().shut_down(&self.ctx).await
    }

    /// Returns the load last stored for the asset, in amps.
    pub async fn load(&self, key: u64) -> Result<f64, Error> {
        self.registry
            .bundle(key)?
            .transitions()
            .state_manager()
            .load(&self.ctx)
            .await
    }

    /// Computes the asset's present load, in amps, by walking the live graph.
    pub async fn calculate_load(&self, key: u64) -> Result<f64, Error> {
        self.registry.bundle(key)?.load().calculate_load(self).await
    }

    /// Computes a PDU's present load, leaving out the child with the key
    /// `exclude`.
    pub async fn calculate_load_excluding(&self, key: u64, exclude: u64) -> Result<f64, Error> {
        match self.registry.bundle(key)?.behavior() {
            AssetBehavior::Pdu(pdu) => pdu.calculate_load_excluding(self, Some(exclude)).await,
            other => Err(Error::invalid_asset(format!(
                "{}:{} is not a PDU.",
                other.asset().asset_type,
                key
            ))),
        }
    }

    /// Stores a new load for the asset and updates its telemetry.  Negative
    /// and NaN values are ignored.
    pub async fn update_load(&self, key: u64, load: f64) -> Result<(), Error> {
        self.registry
            .bundle(key)?
            .load()
            .update_load(&self.ctx, load)
            .await
    }

    /// Recomputes and stores the load of the asset and of every asset
    /// upstream of it, nearest first.  Returns the asset's own load.
    pub async fn propagate_load(&self, key: u64) -> Result<f64, Error> {
        let load = self.refresh_load(key).await?;
        for ancestor in self.ctx.topology().ancestors(key)? {
            self.refresh_load(ancestor.key).await?;
        }
        Ok(load)
    }

    async fn refresh_load(&self, key: u64) -> Result<f64, Error> {
        let bundle = self.registry.bundle(key)?;
        let load = bundle.load().calculate_load(self).await?;
        bundle.load().update_load(&self.ctx, load).await?;
        debug!(asset = key, load, "Refreshed load");
        Ok(load)
    }

    /// Stores the path of the sensor state directory of a sensor-emulating
    /// asset's chassis.
    pub async fn set_state_dir(&self, key: u64, dir: &Path) -> Result<(), Error> {
        self.sensors(key)?
            .sensor_files()
            .set_state_dir(self.ctx.store(), dir)
            .await
    }

    /// Returns the sensor state directory of a sensor-emulating asset's
    /// chassis.
    pub async fn state_dir(&self, key: u64) -> Result<PathBuf, Error> {
        self.sensors(key)?
            .sensor_files()
            .state_dir(self.ctx.store())
            .await
    }

    /// Reads the current sensor file of unit `unit` of a sensor-emulating
    /// asset's chassis.
    pub async fn sensor_current(&self, key: u64, unit: u64) -> Result<f64, Error> {
        self.sensors(key)?.read_current(&self.ctx, unit).await
    }

    /// Reads the current sensor file of a PSU.
    pub async fn current(&self, key: u64) -> Result<f64, Error> {
        match self.registry.bundle(key)?.behavior() {
            AssetBehavior::Psu(psu) => psu.current(&self.ctx).await,
            other => Err(Error::invalid_asset(format!(
                "{}:{} is not a PSU.",
                other.asset().asset_type,
                key
            ))),
        }
    }

    fn sensors(&self, key: u64) -> Result<&dyn SensorEmulating, Error> {
        let bundle = self.registry.bundle(key)?;
        bundle.sensors().ok_or_else(|| {
            Error::invalid_asset(format!(
                "{}:{} doesn't emulate sensors.",
                bundle.asset().asset_type,
                key
            ))
        })
    }
}
