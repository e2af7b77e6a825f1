// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module is only compiled when running unit tests and contains the
//! `TopologyBuilder`, which can declaratively build power topologies for use
//! in tests.

use crate::{
    Asset, AssetType, Error, GatingSensor, PowerTopology, SensorDefinition, SupplyEdge,
    TopologyConfig,
};

/// Represents an asset added to the `TopologyBuilder`.
#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug)]
pub(crate) struct AssetHandle(u64);

impl AssetHandle {
    /// Returns the key of the asset.
    pub(crate) fn key(&self) -> u64 {
        self.0
    }
}

/// A builder for creating power topologies easily, for use in tests.
pub(crate) struct TopologyBuilder {
    assets: Vec<Asset>,
    edges: Vec<SupplyEdge>,
    sensors: Vec<SensorDefinition>,
    gates: Vec<GatingSensor>,
    next_key: u64,
}

impl TopologyBuilder {
    /// Creates a new `TopologyBuilder`.
    pub(crate) fn new() -> Self {
        TopologyBuilder {
            assets: Vec::new(),
            edges: Vec::new(),
            sensors: Vec::new(),
            gates: Vec::new(),
            next_key: 1,
        }
    }

    /// Adds the given asset to the topology and returns its handle.
    pub(crate) fn add_asset(&mut self, asset: Asset) -> AssetHandle {
        let handle = AssetHandle(asset.key);
        self.assets.push(asset);
        handle
    }

    fn next_key(&mut self) -> u64 {
        let key = self.next_key;
        self.next_key += 1;
        key
    }

    /// Adds a PDU to the topology and returns its handle.
    pub(crate) fn pdu(&mut self) -> AssetHandle {
        let key = self.next_key();
        self.add_asset(Asset::new(key, AssetType::Pdu))
    }

    /// Adds an outlet to the topology and returns its handle.
    pub(crate) fn outlet(&mut self) -> AssetHandle {
        let key = self.next_key();
        self.add_asset(Asset::new(key, AssetType::Outlet))
    }

    /// Adds a static device drawing `watts` from a 120V source and returns
    /// its handle.
    pub(crate) fn static_device(&mut self, watts: f64) -> AssetHandle {
        let key = self.next_key();
        self.add_asset(Asset::new(key, AssetType::StaticAsset).with_power(watts, 120.0))
    }

    /// Adds a server named `vm-<key>` drawing `watts` from a 120V source and
    /// returns its handle.
    pub(crate) fn server(&mut self, watts: f64) -> AssetHandle {
        let key = self.next_key();
        self.add_asset(
            Asset::new(key, AssetType::Server)
                .with_name(format!("vm-{key}"))
                .with_power(watts, 120.0),
        )
    }

    /// Adds a BMC-backed server named `vm-<key>` drawing `watts` from a 120V
    /// source and returns its handle.
    pub(crate) fn bmc_server(&mut self, watts: f64) -> AssetHandle {
        let key = self.next_key();
        self.add_asset(
            Asset::new(key, AssetType::ServerWithBmc)
                .with_name(format!("vm-{key}"))
                .with_power(watts, 120.0),
        )
    }

    /// Adds PSU number `unit` of the given chassis and returns its handle.
    pub(crate) fn psu(&mut self, chassis: AssetHandle, unit: u64) -> AssetHandle {
        self.add_asset(Asset::new(chassis.key() * 10 + unit, AssetType::Psu))
    }

    /// Adds a telemetry sensor named `name` to the given asset.
    pub(crate) fn sensor(&mut self, asset: AssetHandle, name: &str, data_type: &str) -> &mut Self {
        self.sensors.push(SensorDefinition::new(
            asset.key(),
            format!("oid-{}-{}", asset.key(), name),
            name,
            data_type,
        ));
        self
    }

    /// Gates `asset` on the sensor `id` owned by `owner`, which blocks it
    /// while reading `switch_off`.
    pub(crate) fn gate(
        &mut self,
        asset: AssetHandle,
        owner: AssetHandle,
        id: &str,
        switch_off: &str,
    ) -> &mut Self {
        self.gates.push(GatingSensor::new(
            asset.key(),
            owner.key(),
            id,
            "Integer32",
            switch_off,
        ));
        self
    }

    /// Connects two assets: `child` becomes powered by `parent`.
    pub(crate) fn connect(&mut self, parent: AssetHandle, child: AssetHandle) -> &mut Self {
        self.edges.push(SupplyEdge::new(parent.0, child.0));
        self
    }

    /// Returns a mutable reference to an asset that was already added.
    pub(crate) fn asset_mut(&mut self, handle: AssetHandle) -> &mut Asset {
        self.assets
            .iter_mut()
            .find(|a| a.key == handle.key())
            .expect("asset was added to the builder")
    }

    /// Builds and returns the topology from the assets, edges and sensors
    /// added to the builder.
    pub(crate) fn build(&self) -> Result<PowerTopology, Error> {
        PowerTopology::try_new(
            self.assets.clone(),
            self.edges.clone(),
            TopologyConfig::default(),
        )?
        .with_sensors(self.sensors.clone())?
        .with_gating_sensors(self.gates.clone())
    }
}
