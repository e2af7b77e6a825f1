// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The capabilities an asset behavior can provide.
//!
//! Every behavior is [`PowerTransitionable`] and [`LoadAggregatable`].  Servers
//! are also [`VirtualizationControlled`], and assets that write emulated
//! sensor files are [`SensorEmulating`].

use std::sync::Arc;

use async_trait::async_trait;

use super::sensor_assets::{read_value, SensorFiles};
use super::{Engine, EngineContext, StateManager};
use crate::virtualization::Domain;
use crate::Error;

/// Power transitions of an asset.
///
/// The default methods run the base state machine; behaviors override them
/// to add side effects around it.  Callers must hold the asset's transition
/// lock.
#[async_trait]
pub trait PowerTransitionable: Send + Sync {
    /// Returns the base state machine of the asset.
    fn state_manager(&self) -> &StateManager;

    /// Powers the asset up.  Returns the resulting status.
    async fn power_up(&self, ctx: &EngineContext) -> Result<bool, Error> {
        self.state_manager().power_up(ctx).await
    }

    /// Cuts the asset's power.  Returns the resulting status.
    async fn power_off(&self, ctx: &EngineContext) -> Result<bool, Error> {
        self.state_manager().power_off(ctx).await
    }

    /// Shuts the asset down gracefully.  Returns the resulting status.
    async fn shut_down(&self, ctx: &EngineContext) -> Result<bool, Error> {
        self.state_manager().shut_down(ctx).await
    }
}

/// Load computation and storage of an asset.
#[async_trait]
pub trait LoadAggregatable: PowerTransitionable {
    /// Computes the asset's present load, in amps, from the live state of
    /// the assets below it.
    async fn calculate_load(&self, engine: &Engine) -> Result<f64, Error>;

    /// Stores a new load for the asset.  Negative and NaN values are ignored.
    async fn update_load(&self, ctx: &EngineContext, load: f64) -> Result<(), Error> {
        self.state_manager().store_load(ctx, load).await?;
        Ok(())
    }
}

/// Assets that mirror their load into sensor files of their chassis.
#[async_trait]
pub trait SensorEmulating: Send + Sync {
    /// Returns the sensor files of the asset's chassis.
    fn sensor_files(&self) -> &SensorFiles;

    /// Reads the current, in amps, reported by power supply `unit`.
    async fn read_current(&self, ctx: &EngineContext, unit: u64) -> Result<f64, Error> {
        let path = self.sensor_files().current_file(ctx.store(), unit).await?;
        read_value(&path).await
    }
}

/// Assets whose power state is mirrored onto a virtual machine.
pub trait VirtualizationControlled: Send + Sync {
    /// Returns the domain that mirrors the asset.
    fn domain(&self) -> &Arc<dyn Domain>;
}
