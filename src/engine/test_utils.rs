// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module is only compiled when running unit tests and contains helpers
//! for running an `Engine` over a topology built with a `TopologyBuilder`.

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use crate::topology::test_utils::{AssetHandle, TopologyBuilder};
use crate::{
    Engine, EngineConfig, EngineContext, Error, InstantClock, MemoryStore, MockDomain,
    MockHypervisor,
};

/// An engine together with the in-memory collaborators it was built with.
pub(crate) struct TestHarness {
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) clock: Arc<InstantClock>,
    pub(crate) hypervisor: Arc<MockHypervisor>,
    pub(crate) engine: Engine,
}

impl TestHarness {
    /// Returns the domain that mirrors the given server.
    pub(crate) fn domain(&self, server: AssetHandle) -> Result<Arc<MockDomain>, Error> {
        self.hypervisor.domain(&format!("vm-{}", server.key()))
    }
}

/// Builds an engine over the builder's topology, without seeding any state.
///
/// Every server in the topology gets an inactive domain, and the clock is
/// frozen at 1_700_000_000.
pub(crate) async fn engine_with(
    builder: &TopologyBuilder,
    config: EngineConfig,
) -> Result<TestHarness, Error> {
    let topology = Arc::new(builder.build()?);
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(InstantClock::new(
        Utc.timestamp_opt(1_700_000_000, 0)
            .single()
            .ok_or_else(|| Error::internal("Invalid test timestamp."))?,
    ));
    let hypervisor = Arc::new(MockHypervisor::connect("test:///default"));
    for asset in topology.assets() {
        if asset.asset_type.is_virtualized() {
            hypervisor.define_domain(asset.name.clone());
        }
    }

    let ctx = EngineContext::new(store.clone(), topology)
        .with_clock(clock.clone())
        .with_hypervisor(hypervisor.clone())
        .with_config(config);
    Ok(TestHarness {
        engine: Engine::try_new(ctx).await?,
        store,
        clock,
        hypervisor,
    })
}

/// Builds an engine over the builder's topology, with every asset off.
pub(crate) async fn harness(builder: &TopologyBuilder) -> Result<TestHarness, Error> {
    let h = engine_with(builder, EngineConfig::default()).await?;
    h.engine.seed_states(false).await?;
    Ok(h)
}
