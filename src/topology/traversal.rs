// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains methods that help with graph traversal.

use std::collections::{HashSet, VecDeque};

use crate::{Asset, Error, PowerTopology};

/// Traversal methods.
impl PowerTopology {
    /// Returns every asset upstream of the given asset, nearest first.
    ///
    /// Assets reachable over several supply paths are returned once.
    pub fn ancestors(&self, key: u64) -> Result<Vec<&Asset>, Error> {
        let index = self.index(key)?;
        let mut queue = VecDeque::from([index]);
        let mut visited = HashSet::from([index]);
        let mut found = vec![];

        while let Some(index) = queue.pop_front() {
            for neighbor in self.graph.neighbors_directed(index, petgraph::Direction::Incoming) {
                if visited.insert(neighbor) {
                    found.push(&self.graph[neighbor]);
                    queue.push_back(neighbor);
                }
            }
        }

        Ok(found)
    }
}
