// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! A graph representation of the assets of a power-distribution topology, and
//! the supply edges between them.

mod creation;
pub mod iterators;
mod retrieval;
mod traversal;
mod validation;

#[cfg(test)]
pub(crate) mod test_utils;

use std::collections::HashMap;
use std::time::Duration;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::asset_type::TypePredicates;
use crate::{state::keys, AssetType, TopologyConfig};

/// `Asset`s stored in a `DiGraph` instance can be addressed with `NodeIndex`es.
///
/// `NodeIndexMap` stores the corresponding `NodeIndex` for any asset key, so
/// that assets in the `DiGraph` can be retrieved from their keys.
pub(crate) type NodeIndexMap = HashMap<u64, NodeIndex>;

/// An asset in the power-distribution topology.
///
/// Assets are created once, when the topology is built, and never change
/// afterwards.  Their operational state lives in the state store.
#[derive(Clone, Debug, PartialEq)]
pub struct Asset {
    /// Unique key of the asset.
    pub key: u64,
    /// The type of the asset, which selects the behavior that governs it.
    pub asset_type: AssetType,
    /// Human readable name.  For servers, this is the name of the virtual
    /// machine domain that mirrors the asset's power state.
    pub name: String,
    /// Power drawn by the asset when it is on, in watts.
    pub power_consumption: Option<f64>,
    /// Voltage of the asset's power source, in volts.
    pub power_source: Option<f64>,
    /// Simulated boot delay, applied before the asset is switched on.
    pub on_delay: Option<Duration>,
    /// Simulated shutdown delay, applied before a graceful power-off.
    pub off_delay: Option<Duration>,
}

impl Asset {
    /// Creates a new asset with the given key and type, and no attributes.
    pub fn new(key: u64, asset_type: AssetType) -> Self {
        Self {
            key,
            asset_type,
            name: format!("{asset_type}-{key}"),
            power_consumption: None,
            power_source: None,
            on_delay: None,
            off_delay: None,
        }
    }

    /// Sets the name of the asset.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the power consumption (watts) and the power source (volts).
    pub fn with_power(mut self, power_consumption: f64, power_source: f64) -> Self {
        self.power_consumption = Some(power_consumption);
        self.power_source = Some(power_source);
        self
    }

    /// Sets the power-up delay, in milliseconds.
    pub fn with_on_delay_ms(mut self, millis: u64) -> Self {
        self.on_delay = Some(Duration::from_millis(millis));
        self
    }

    /// Sets the graceful shutdown delay, in milliseconds.
    pub fn with_off_delay_ms(mut self, millis: u64) -> Self {
        self.off_delay = Some(Duration::from_millis(millis));
        self
    }

    /// Returns the key under which the asset's status is stored.
    pub fn state_key(&self) -> String {
        keys::state_key(self.key, self.asset_type)
    }

    /// Returns the amperage drawn by the asset when it is on, if it has a
    /// fixed draw.
    pub fn amperage(&self) -> Option<f64> {
        match (self.power_consumption, self.power_source) {
            (Some(consumption), Some(source)) if source > 0.0 => Some(consumption / source),
            _ => None,
        }
    }
}

impl TypePredicates for Asset {
    fn asset_type(&self) -> AssetType {
        self.asset_type
    }
}

/// A directed supply relation: `child` is powered by `parent`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SupplyEdge {
    /// Key of the supplying asset.
    pub parent: u64,
    /// Key of the supplied asset.
    pub child: u64,
}

impl SupplyEdge {
    /// Creates a new supply edge.
    pub fn new(parent: u64, child: u64) -> Self {
        Self { parent, child }
    }
}

/// A telemetry point owned by an asset, for example the `AmpOnPhase` reading
/// of a PDU.
#[derive(Clone, Debug, PartialEq)]
pub struct SensorDefinition {
    /// Key of the asset the sensor belongs to.
    pub asset_key: u64,
    /// Object identifier of the sensor.
    pub id: String,
    /// Name the sensor is looked up with.
    pub name: String,
    /// Encoding of the sensor's value, for example `Gauge32`.
    pub data_type: String,
}

impl SensorDefinition {
    /// Creates a new sensor definition.
    pub fn new(
        asset_key: u64,
        id: impl Into<String>,
        name: impl Into<String>,
        data_type: impl Into<String>,
    ) -> Self {
        Self {
            asset_key,
            id: id.into(),
            name: name.into(),
            data_type: data_type.into(),
        }
    }

    /// Returns the state store key holding the sensor's value.
    pub fn value_key(&self) -> String {
        keys::sensor_value_key(self.asset_key, &self.id)
    }
}

/// An externally observed value that can block an asset from powering up.
///
/// The sensor is owned by `owner_key` and gates `asset_key`: while its value
/// equals `switch_off`, it reads as down.
#[derive(Clone, Debug, PartialEq)]
pub struct GatingSensor {
    /// Key of the gated asset.
    pub asset_key: u64,
    /// Key of the asset that owns the sensor.
    pub owner_key: u64,
    /// Object identifier of the sensor.
    pub id: String,
    /// Encoding of the sensor's value.
    pub data_type: String,
    /// The value at which the sensor blocks the gated asset.
    pub switch_off: String,
}

impl GatingSensor {
    /// Creates a new gating sensor.
    pub fn new(
        asset_key: u64,
        owner_key: u64,
        id: impl Into<String>,
        data_type: impl Into<String>,
        switch_off: impl Into<String>,
    ) -> Self {
        Self {
            asset_key,
            owner_key,
            id: id.into(),
            data_type: data_type.into(),
            switch_off: switch_off.into(),
        }
    }

    /// Returns the state store key holding the sensor's value.
    pub fn value_key(&self) -> String {
        keys::sensor_value_key(self.owner_key, &self.id)
    }
}

/// A graph representation of the assets of a power-distribution topology
/// and the supply edges between them.
///
/// Edges point from the supplying asset to the supplied one, so an asset's
/// predecessors are its parents and its successors are its children.
pub struct PowerTopology {
    graph: DiGraph<Asset, ()>,
    node_indices: NodeIndexMap,
    sensors: HashMap<u64, Vec<SensorDefinition>>,
    gates: HashMap<u64, Vec<GatingSensor>>,
    config: TopologyConfig,
}

impl std::fmt::Debug for PowerTopology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PowerTopology")
            .field("assets", &self.graph.node_count())
            .field("supply_edges", &self.graph.edge_count())
            .field("config", &self.config)
            .finish()
    }
}
