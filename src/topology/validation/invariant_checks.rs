// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Helper methods for checking invariants of a [`PowerTopology`].

use crate::{Asset, Error};

use super::TopologyValidator;

impl TopologyValidator<'_> {
    /// Checks that the given asset doesn't supply any other asset.
    pub(super) fn ensure_leaf(&self, asset: &Asset) -> Result<(), Error> {
        if let Some(child) = self.topology.children(asset.key)?.next() {
            return Err(Error::invalid_graph(format!(
                "{}:{} can't supply other assets. Found {}:{}.",
                asset.asset_type, asset.key, child.asset_type, child.key
            )));
        }
        Ok(())
    }

    /// Checks that the given asset supplies at most one other asset.
    pub(super) fn ensure_at_most_one_child(&self, asset: &Asset) -> Result<(), Error> {
        let mut keys = self
            .topology
            .children(asset.key)?
            .map(|c| c.key)
            .collect::<Vec<_>>();
        if keys.len() > 1 {
            keys.sort();
            return Err(Error::invalid_graph(format!(
                "{}:{} can supply only one asset. Found {:?}.",
                asset.asset_type, asset.key, keys
            )));
        }
        Ok(())
    }
}
