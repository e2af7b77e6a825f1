// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Behaviors of power-distribution assets: PDUs and their outlets.

use async_trait::async_trait;
use tracing::debug;

use super::telemetry;
use super::{Engine, EngineContext, LoadAggregatable, PowerTransitionable, StateManager};
use crate::Error;

/// A power distribution unit.
///
/// Its load is the sum of the loads of its outlets, and every load update is
/// mirrored into its current and wattage telemetry.
#[derive(Debug)]
pub struct PduManager {
    base: StateManager,
}

impl PduManager {
    pub(crate) fn new(base: StateManager) -> Self {
        Self { base }
    }

    /// Sums the loads of the PDU's children, leaving out `exclude`.
    pub async fn calculate_load_excluding(
        &self,
        engine: &Engine,
        exclude: Option<u64>,
    ) -> Result<f64, Error> {
        let ctx = engine.context();
        if !self.base.status(ctx).await? {
            return Ok(0.0);
        }

        let mut load = 0.0;
        for child in ctx.topology().children(self.base.asset().key)? {
            if Some(child.key) == exclude {
                continue;
            }
            load += engine.calculate_load(child.key).await?;
        }
        Ok(load)
    }
}

impl PowerTransitionable for PduManager {
    fn state_manager(&self) -> &StateManager {
        &self.base
    }
}

#[async_trait]
impl LoadAggregatable for PduManager {
    async fn calculate_load(&self, engine: &Engine) -> Result<f64, Error> {
        self.calculate_load_excluding(engine, None).await
    }

    async fn update_load(&self, ctx: &EngineContext, load: f64) -> Result<(), Error> {
        if !self.base.store_load(ctx, load).await? {
            return Ok(());
        }
        telemetry::encode_pdu_load(ctx, self.base.asset().key, load).await
    }
}

/// A single outlet.  It draws whatever the one asset it supplies draws.
#[derive(Debug)]
pub struct OutletManager {
    base: StateManager,
}

impl OutletManager {
    pub(crate) fn new(base: StateManager) -> Self {
        Self { base }
    }
}

impl PowerTransitionable for OutletManager {
    fn state_manager(&self) -> &StateManager {
        &self.base
    }
}

#[async_trait]
impl LoadAggregatable for OutletManager {
    async fn calculate_load(&self, engine: &Engine) -> Result<f64, Error> {
        let ctx = engine.context();
        if !self.base.status(ctx).await? {
            return Ok(0.0);
        }

        let key = self.base.asset().key;
        let Some(child) = ctx.topology().children(key)?.into_iter().next() else {
            debug!(asset = key, "Outlet supplies nothing");
            return Ok(0.0);
        };
        engine.calculate_load(child.key).await
    }
}
