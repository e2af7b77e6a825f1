// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for creating [`PowerTopology`] instances from given assets, supply
//! edges and sensors.

use std::collections::HashMap;

use petgraph::graph::DiGraph;

use crate::{asset_type::TypePredicates, Error, TopologyConfig};

use super::{Asset, GatingSensor, NodeIndexMap, PowerTopology, SensorDefinition, SupplyEdge};

/// `PowerTopology` instantiation.
impl PowerTopology {
    /// Creates a new [`PowerTopology`] from the given assets and supply edges.
    ///
    /// Returns an error if the topology is invalid.
    pub fn try_new<AssetIterator, EdgeIterator>(
        assets: AssetIterator,
        supply_edges: EdgeIterator,
        config: TopologyConfig,
    ) -> Result<Self, Error>
    where
        AssetIterator: IntoIterator<Item = Asset>,
        EdgeIterator: IntoIterator<Item = SupplyEdge>,
    {
        let (graph, indices) = Self::create_graph(assets, &config)?;

        let mut topology = Self {
            graph,
            node_indices: indices,
            sensors: HashMap::new(),
            gates: HashMap::new(),
            config,
        };
        topology.add_supply_edges(supply_edges)?;

        topology.validate()?;

        Ok(topology)
    }

    /// Attaches the given telemetry sensor definitions to their assets.
    pub fn with_sensors(
        mut self,
        sensors: impl IntoIterator<Item = SensorDefinition>,
    ) -> Result<Self, Error> {
        for sensor in sensors {
            if !self.node_indices.contains_key(&sensor.asset_key) {
                return Err(Error::invalid_asset(format!(
                    "Sensor {} references unknown asset {}.",
                    sensor.id, sensor.asset_key
                )));
            }
            self.sensors
                .entry(sensor.asset_key)
                .or_default()
                .push(sensor);
        }
        Ok(self)
    }

    /// Attaches the given gating sensors to the assets they gate.
    pub fn with_gating_sensors(
        mut self,
        gates: impl IntoIterator<Item = GatingSensor>,
    ) -> Result<Self, Error> {
        for gate in gates {
            for key in [gate.asset_key, gate.owner_key] {
                if !self.node_indices.contains_key(&key) {
                    return Err(Error::invalid_asset(format!(
                        "Gating sensor {} references unknown asset {}.",
                        gate.id, key
                    )));
                }
            }
            self.gates.entry(gate.asset_key).or_default().push(gate);
        }
        Ok(self)
    }

    fn create_graph(
        assets: impl IntoIterator<Item = Asset>,
        config: &TopologyConfig,
    ) -> Result<(DiGraph<Asset, ()>, NodeIndexMap), Error> {
        let mut graph = DiGraph::new();
        let mut indices = NodeIndexMap::new();

        for asset in assets {
            let key = asset.key;

            if asset.has_static_draw()
                && asset.amperage().is_none()
                && !config.allow_unpowered_static_devices
            {
                return Err(Error::invalid_asset(format!(
                    "{}:{} must have a positive power_consumption and power_source.",
                    asset.asset_type, key
                )));
            }
            if asset.is_psu() && key < 10 {
                return Err(Error::invalid_asset(format!(
                    "psu:{key} must be keyed as <chassis key><unit index>."
                )));
            }
            if indices.contains_key(&key) {
                return Err(Error::invalid_graph(format!(
                    "Duplicate asset key found: {key}"
                )));
            }

            let idx = graph.add_node(asset);
            indices.insert(key, idx);
        }

        Ok((graph, indices))
    }

    fn add_supply_edges(&mut self, edges: impl IntoIterator<Item = SupplyEdge>) -> Result<(), Error> {
        for SupplyEdge { parent, child } in edges {
            if parent == child {
                return Err(Error::invalid_connection(format!(
                    "SupplyEdge:({parent}, {child}) Can't connect an asset to itself."
                )));
            }
            for key in [parent, child] {
                if !self.node_indices.contains_key(&key) {
                    return Err(Error::invalid_connection(format!(
                        "SupplyEdge:({parent}, {child}) Can't find an asset with key {key}"
                    )));
                }
            }

            let parent_idx = self.node_indices[&parent];
            let child_idx = self.node_indices[&child];
            self.graph.update_edge(parent_idx, child_idx, ());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AssetType;

    fn assets_and_edges() -> (Vec<Asset>, Vec<SupplyEdge>) {
        let assets = vec![
            Asset::new(1, AssetType::Pdu),
            Asset::new(11, AssetType::Outlet),
            Asset::new(12, AssetType::Outlet),
            Asset::new(3, AssetType::StaticAsset).with_power(120.0, 120.0),
            Asset::new(4, AssetType::Server)
                .with_name("vm-4")
                .with_power(240.0, 120.0),
        ];
        let edges = vec![
            SupplyEdge::new(1, 11),
            SupplyEdge::new(1, 12),
            SupplyEdge::new(11, 3),
            SupplyEdge::new(12, 4),
        ];

        (assets, edges)
    }

    #[test]
    fn test_asset_validation() {
        let config = TopologyConfig::default();
        let (mut assets, edges) = assets_and_edges();

        assert!(PowerTopology::try_new(assets.clone(), edges.clone(), config.clone()).is_ok());

        assets.push(Asset::new(3, AssetType::Pdu));
        assert!(
            PowerTopology::try_new(assets.clone(), edges.clone(), config.clone())
                .is_err_and(|e| e == Error::invalid_graph("Duplicate asset key found: 3"))
        );

        assets.pop();
        assets.push(Asset::new(5, AssetType::StaticAsset));
        assert!(
            PowerTopology::try_new(assets.clone(), edges.clone(), config.clone()).is_err_and(
                |e| e
                    == Error::invalid_asset(
                        "staticasset:5 must have a positive power_consumption and power_source."
                    )
            )
        );
        assert!(PowerTopology::try_new(
            assets.clone(),
            edges.clone(),
            TopologyConfig {
                allow_unpowered_static_devices: true,
            }
        )
        .is_ok());

        assets.pop();
        assets.push(Asset::new(7, AssetType::Psu));
        assert!(
            PowerTopology::try_new(assets.clone(), edges.clone(), config.clone()).is_err_and(
                |e| e == Error::invalid_asset("psu:7 must be keyed as <chassis key><unit index>.")
            )
        );

        assets.pop();
        assets.push(Asset::new(41, AssetType::Psu));
        assert!(PowerTopology::try_new(assets.clone(), edges.clone(), config.clone()).is_ok());
    }

    #[test]
    fn test_supply_edge_validation() {
        let config = TopologyConfig::default();
        let (assets, mut edges) = assets_and_edges();

        edges.push(SupplyEdge::new(11, 11));
        assert!(
            PowerTopology::try_new(assets.clone(), edges.clone(), config.clone()).is_err_and(
                |e| e
                    == Error::invalid_connection(
                        "SupplyEdge:(11, 11) Can't connect an asset to itself."
                    )
            )
        );

        edges.pop();
        edges.push(SupplyEdge::new(1, 9));
        assert!(
            PowerTopology::try_new(assets.clone(), edges.clone(), config.clone()).is_err_and(
                |e| e
                    == Error::invalid_connection("SupplyEdge:(1, 9) Can't find an asset with key 9")
            )
        );

        edges.pop();
        assert!(PowerTopology::try_new(assets.clone(), edges.clone(), config.clone()).is_ok());
    }

    #[test]
    fn test_sensor_validation() -> Result<(), Error> {
        let (assets, edges) = assets_and_edges();
        let topology = PowerTopology::try_new(assets.clone(), edges.clone(), Default::default())?;

        assert!(topology
            .with_sensors([SensorDefinition::new(9, "1.3.6.1", "AmpOnPhase", "Gauge32")])
            .is_err_and(
                |e| e == Error::invalid_asset("Sensor 1.3.6.1 references unknown asset 9.")
            ));

        let topology = PowerTopology::try_new(assets, edges, Default::default())?;
        assert!(topology
            .with_gating_sensors([GatingSensor::new(3, 8, "1.3.6.2", "Integer32", "1")])
            .is_err_and(
                |e| e == Error::invalid_asset("Gating sensor 1.3.6.2 references unknown asset 8.")
            ));

        Ok(())
    }
}
