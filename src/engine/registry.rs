// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Resolution of asset types to their behaviors.

use std::collections::HashMap;

use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use super::{
    BmcServerManager, EngineContext, LoadAggregatable, OutletManager, PduManager,
    PowerTransitionable, PsuManager, SensorEmulating, ServerManager, StateManager,
    StaticDeviceManager, VirtualizationControlled,
};
use crate::{Asset, AssetType, Error};

/// The behavior of one asset, selected by its type.
#[derive(Debug)]
pub enum AssetBehavior {
    Pdu(PduManager),
    Outlet(OutletManager),
    StaticDevice(StaticDeviceManager),
    Server(ServerManager),
    BmcServer(BmcServerManager),
    Psu(PsuManager),
}

impl AssetBehavior {
    /// Builds the behavior for `asset`, looking up its virtualization domain
    /// if it has one.
    async fn try_new(asset: &Asset, ctx: &EngineContext) -> Result<Self, Error> {
        let base = StateManager::new(asset.clone());
        let sensor_subdir = &ctx.config().sensor_subdir;
        Ok(match asset.asset_type {
            AssetType::Pdu => Self::Pdu(PduManager::new(base)),
            AssetType::Outlet => Self::Outlet(OutletManager::new(base)),
            AssetType::StaticAsset => Self::StaticDevice(StaticDeviceManager::new(base)),
            AssetType::Server => Self::Server(ServerManager::try_new(base, ctx).await?),
            AssetType::ServerWithBmc => Self::BmcServer(BmcServerManager::new(
                ServerManager::try_new(base, ctx).await?,
                sensor_subdir,
            )),
            AssetType::Psu => Self::Psu(PsuManager::new(base, sensor_subdir)),
        })
    }

    /// Returns the asset the behavior governs.
    pub fn asset(&self) -> &Asset {
        self.transitions().state_manager().asset()
    }

    fn transitions(&self) -> &dyn PowerTransitionable {
        match self {
            Self::Pdu(pdu) => pdu,
            Self::Outlet(outlet) => outlet,
            Self::StaticDevice(device) => device,
            Self::Server(server) => server,
            Self::BmcServer(server) => server,
            Self::Psu(psu) => psu,
        }
    }

    fn load(&self) -> &dyn LoadAggregatable {
        match self {
            Self::Pdu(pdu) => pdu,
            Self::Outlet(outlet) => outlet,
            Self::StaticDevice(device) => device,
            Self::Server(server) => server,
            Self::BmcServer(server) => server,
            Self::Psu(psu) => psu,
        }
    }
}

/// An asset's behavior, together with the lock that serializes its
/// transitions.
#[derive(Debug)]
pub struct BehaviorBundle {
    behavior: AssetBehavior,
    lock: Mutex<()>,
}

impl BehaviorBundle {
    pub fn behavior(&self) -> &AssetBehavior {
        &self.behavior
    }

    pub fn asset(&self) -> &Asset {
        self.behavior.asset()
    }

    pub fn transitions(&self) -> &dyn PowerTransitionable {
        self.behavior.transitions()
    }

    pub fn load(&self) -> &dyn LoadAggregatable {
        self.behavior.load()
    }

    /// Returns the sensor emulation of PSUs and BMC-backed servers.
    pub fn sensors(&self) -> Option<&dyn SensorEmulating> {
        match &self.behavior {
            AssetBehavior::Psu(psu) => Some(psu),
            AssetBehavior::BmcServer(server) => Some(server),
            _ => None,
        }
    }

    /// Returns the virtualization control of servers.
    pub fn virtualization(&self) -> Option<&dyn VirtualizationControlled> {
        match &self.behavior {
            AssetBehavior::Server(server) => Some(server),
            AssetBehavior::BmcServer(server) => Some(server),
            _ => None,
        }
    }

    /// Waits for exclusive access to the asset's state.
    pub(crate) async fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }
}

/// The behavior bundles of all assets in a topology, by asset key.
#[derive(Debug)]
pub struct TypeRegistry {
    bundles: HashMap<u64, BehaviorBundle>,
}

impl TypeRegistry {
    /// Resolves the behavior of every asset in the context's topology.
    pub(crate) async fn resolve(ctx: &EngineContext) -> Result<Self, Error> {
        let mut bundles = HashMap::new();
        for asset in ctx.topology().assets() {
            let behavior = AssetBehavior::try_new(&asset, ctx).await?;
            bundles.insert(
                asset.key,
                BehaviorBundle {
                    behavior,
                    lock: Mutex::new(()),
                },
            );
        }
        debug!(assets = bundles.len(), "Resolved asset behaviors");
        Ok(Self { bundles })
    }

    /// Returns the bundle of the asset with the given key.
    pub fn bundle(&self, key: u64) -> Result<&BehaviorBundle, Error> {
        self.bundles
            .get(&key)
            .ok_or_else(|| Error::not_found(format!("Asset with key {key} not found.")))
    }

    /// Returns the number of registered assets.
    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    /// Returns true if no assets are registered.
    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}
