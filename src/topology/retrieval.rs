// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for retrieving assets, neighbors and sensors from a
//! [`PowerTopology`].

use petgraph::graph::NodeIndex;

use crate::iterators::{Assets, Neighbors};
use crate::{Asset, Error, GatingSensor, PowerTopology, SensorDefinition};

/// `Asset`, neighbor and sensor retrieval.
impl PowerTopology {
    pub(crate) fn index(&self, key: u64) -> Result<NodeIndex, Error> {
        self.node_indices
            .get(&key)
            .copied()
            .ok_or_else(|| Error::not_found(format!("Asset with key {} not found.", key)))
    }

    /// Returns the asset with the given `key`, if it exists.
    pub fn asset(&self, key: u64) -> Result<&Asset, Error> {
        self.index(key).map(|i| &self.graph[i])
    }

    /// Returns an iterator over the assets in the topology.
    pub fn assets(&self) -> Assets {
        Assets {
            iter: self.graph.raw_nodes().iter(),
        }
    }

    /// Returns an iterator over the assets that have no parents.
    pub fn roots(&self) -> impl Iterator<Item = &Asset> {
        self.graph
            .externals(petgraph::Direction::Incoming)
            .map(|i| &self.graph[i])
    }

    /// Returns an iterator over the *parents* of the asset with the given
    /// `key`, i.e. the assets that supply it.
    ///
    /// Returns an error if the given `key` does not exist.
    pub fn parents(&self, key: u64) -> Result<Neighbors, Error> {
        self.index(key).map(|index| Neighbors {
            graph: &self.graph,
            iter: self
                .graph
                .neighbors_directed(index, petgraph::Direction::Incoming),
        })
    }

    /// Returns an iterator over the *children* of the asset with the given
    /// `key`, i.e. the assets it supplies.
    ///
    /// Returns an error if the given `key` does not exist.
    pub fn children(&self, key: u64) -> Result<Neighbors, Error> {
        self.index(key).map(|index| Neighbors {
            graph: &self.graph,
            iter: self
                .graph
                .neighbors_directed(index, petgraph::Direction::Outgoing),
        })
    }

    /// Returns the sensor named `name` that belongs to the asset with the
    /// given `key`, if there is one.
    pub fn sensor(&self, key: u64, name: &str) -> Result<Option<&SensorDefinition>, Error> {
        self.index(key)?;
        Ok(self
            .sensors
            .get(&key)
            .and_then(|sensors| sensors.iter().find(|s| s.name == name)))
    }

    /// Returns the gating sensors of the asset with the given `key`.
    pub fn gating_sensors(&self, key: u64) -> Result<&[GatingSensor], Error> {
        self.index(key)?;
        Ok(self.gates.get(&key).map(Vec::as_slice).unwrap_or_default())
    }
}
