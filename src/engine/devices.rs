// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Behaviors of end devices: static loads and virtualized servers.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{
    Engine, EngineContext, LoadAggregatable, PowerTransitionable, StateManager,
    VirtualizationControlled,
};
use crate::virtualization::Domain;
use crate::Error;

/// A device with a fixed power draw.
#[derive(Debug)]
pub struct StaticDeviceManager {
    base: StateManager,
}

impl StaticDeviceManager {
    pub(crate) fn new(base: StateManager) -> Self {
        Self { base }
    }
}

impl PowerTransitionable for StaticDeviceManager {
    fn state_manager(&self) -> &StateManager {
        &self.base
    }
}

#[async_trait]
impl LoadAggregatable for StaticDeviceManager {
    async fn calculate_load(&self, engine: &Engine) -> Result<f64, Error> {
        if !self.base.status(engine.context()).await? {
            return Ok(0.0);
        }
        Ok(self.base.asset().amperage().unwrap_or(0.0))
    }
}

/// A static device whose power state is mirrored onto a virtual machine.
pub struct ServerManager {
    device: StaticDeviceManager,
    domain: Arc<dyn Domain>,
}

impl ServerManager {
    /// Looks up the domain named after the asset.
    pub(crate) async fn try_new(base: StateManager, ctx: &EngineContext) -> Result<Self, Error> {
        let asset = base.asset();
        let Some(hypervisor) = ctx.hypervisor() else {
            return Err(Error::domain_lookup(format!(
                "{}:{} needs a hypervisor, but none is configured.",
                asset.asset_type, asset.key
            )));
        };
        let domain = hypervisor.lookup_domain(&asset.name).await?;
        Ok(Self {
            device: StaticDeviceManager::new(base),
            domain,
        })
    }
}

impl std::fmt::Debug for ServerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerManager")
            .field("device", &self.device)
            .field("domain", &self.domain.name())
            .finish()
    }
}

#[async_trait]
impl PowerTransitionable for ServerManager {
    fn state_manager(&self) -> &StateManager {
        &self.device.base
    }

    async fn power_up(&self, ctx: &EngineContext) -> Result<bool, Error> {
        let powered = self.device.base.power_up(ctx).await?;
        if powered && !self.domain.is_active().await? {
            info!(domain = self.domain.name(), "Starting domain");
            self.domain.create().await?;
        }
        Ok(powered)
    }

    async fn power_off(&self, ctx: &EngineContext) -> Result<bool, Error> {
        if self.domain.is_active().await? {
            info!(domain = self.domain.name(), "Destroying domain");
            self.domain.destroy().await?;
        }
        self.device.base.power_off(ctx).await
    }

    async fn shut_down(&self, ctx: &EngineContext) -> Result<bool, Error> {
        if self.domain.is_active().await? {
            info!(domain = self.domain.name(), "Shutting domain down");
            self.domain.shutdown().await?;
        }
        self.device.base.shut_down(ctx).await
    }
}

#[async_trait]
impl LoadAggregatable for ServerManager {
    async fn calculate_load(&self, engine: &Engine) -> Result<f64, Error> {
        self.device.calculate_load(engine).await
    }
}

impl VirtualizationControlled for ServerManager {
    fn domain(&self) -> &Arc<dyn Domain> {
        &self.domain
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::engine::test_utils::harness;
    use crate::topology::test_utils::TopologyBuilder;
    use crate::{
        Engine, EngineContext, Error, ErrorKind, MemoryStore, MockHypervisor, TopologyConfig,
    };

    #[tokio::test]
    async fn test_static_load() -> Result<(), Error> {
        let mut builder = TopologyBuilder::new();
        let lamp = builder.static_device(60.0);
        let h = harness(&builder).await?;

        assert_eq!(h.engine.calculate_load(lamp.key()).await?, 0.0);
        h.engine.power_up(lamp.key()).await?;
        assert_eq!(h.engine.calculate_load(lamp.key()).await?, 0.5);

        Ok(())
    }

    #[tokio::test]
    async fn test_unpowered_static_device() -> Result<(), Error> {
        let topology = crate::PowerTopology::try_new(
            vec![crate::Asset::new(1, crate::AssetType::StaticAsset)],
            vec![],
            TopologyConfig {
                allow_unpowered_static_devices: true,
            },
        )?;
        let store = Arc::new(MemoryStore::new());
        let engine = Engine::try_new(EngineContext::new(store, Arc::new(topology))).await?;
        engine.seed_states(true).await?;

        assert_eq!(engine.calculate_load(1).await?, 0.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_server_domain() -> Result<(), Error> {
        let mut builder = TopologyBuilder::new();
        let outlet = builder.outlet();
        let server = builder.server(480.0);
        builder.connect(outlet, server);
        let h = harness(&builder).await?;
        let domain = h.domain(server)?;

        // Blocked power-ups leave the domain alone.
        assert!(!h.engine.power_up(server.key()).await?);
        assert_eq!(domain.starts(), 0);

        h.engine.power_up(outlet.key()).await?;
        assert!(h.engine.power_up(server.key()).await?);
        assert!(domain.active());
        assert_eq!(domain.starts(), 1);
        assert_eq!(h.engine.calculate_load(outlet.key()).await?, 4.0);

        assert!(!h.engine.shut_down(server.key()).await?);
        assert!(!domain.active());
        assert_eq!(domain.shutdowns(), 1);

        h.engine.power_up(server.key()).await?;
        assert!(!h.engine.power_off(server.key()).await?);
        assert_eq!((domain.starts(), domain.destroys()), (2, 1));

        // Nothing to stop.
        h.engine.power_off(server.key()).await?;
        assert_eq!(domain.destroys(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_domain_already_running() -> Result<(), Error> {
        let mut builder = TopologyBuilder::new();
        let server = builder.server(120.0);
        let h = harness(&builder).await?;
        let domain = h.domain(server)?;
        domain.set_active(true);

        assert!(h.engine.power_up(server.key()).await?);
        assert_eq!(domain.starts(), 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_domain() -> Result<(), Error> {
        let mut builder = TopologyBuilder::new();
        builder.server(120.0);
        let topology = Arc::new(builder.build()?);
        let store = Arc::new(MemoryStore::new());

        let ctx = EngineContext::new(store.clone(), topology.clone());
        assert_eq!(
            Engine::try_new(ctx).await.map_err(|e| e.kind()).err(),
            Some(ErrorKind::DomainLookup)
        );

        let ctx = EngineContext::new(store, topology)
            .with_hypervisor(Arc::new(MockHypervisor::connect("qemu:///system")));
        assert_eq!(
            Engine::try_new(ctx).await.map_err(|e| e.to_string()).err(),
            Some(
                "DomainLookup: Domain not found: no domain with matching name 'vm-1' \
                 on qemu:///system."
                    .to_string()
            )
        );

        Ok(())
    }
}
