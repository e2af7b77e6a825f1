// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for validating the acyclicity of a [`PowerTopology`].

use std::collections::{BTreeSet, HashSet};

use crate::{Asset, Error};

use super::TopologyValidator;

impl TopologyValidator<'_> {
    /// Validates that there are no cycles in the supply graph.
    ///
    /// Traversal starts from every root.  Assets that can't be reached from
    /// any root are only fed from a cycle, so traversal is repeated from each
    /// of them until the cycle is found.
    pub(super) fn validate_acyclicity(&self) -> Result<(), Error> {
        let mut reachable = BTreeSet::new();
        let mut done = HashSet::new();
        for root in self.topology.roots() {
            self.validate_acyclicity_from(root, &mut vec![], &mut done)?;
            self.mark_reachable(root.key, &mut reachable)?;
        }

        let unreachable = self
            .topology
            .assets()
            .map(|a| a.key)
            .filter(|key| !reachable.contains(key))
            .collect::<BTreeSet<_>>();

        for key in &unreachable {
            self.validate_acyclicity_from(self.topology.asset(*key)?, &mut vec![], &mut done)?;
        }

        if !unreachable.is_empty() {
            return Err(Error::internal(format!(
                "Assets {:?} are not reachable from any root.",
                unreachable
            )));
        }

        Ok(())
    }

    fn mark_reachable(&self, key: u64, reachable: &mut BTreeSet<u64>) -> Result<(), Error> {
        let mut stack = vec![key];
        reachable.insert(key);
        while let Some(key) = stack.pop() {
            for child in self.topology.children(key)? {
                if reachable.insert(child.key) {
                    stack.push(child.key);
                }
            }
        }
        Ok(())
    }

    /// If a cycle is detected, an error is returned, that lists the assets in
    /// the cycle.
    ///
    /// Assets in `done` have no cycle below them and are not visited again.
    fn validate_acyclicity_from(
        &self,
        asset: &Asset,
        path: &mut Vec<u64>,
        done: &mut HashSet<u64>,
    ) -> Result<(), Error> {
        if done.contains(&asset.key) {
            return Ok(());
        }
        path.push(asset.key);
        for child in self.topology.children(asset.key)? {
            if let Some(first_occurance) = path.iter().position(|key| *key == child.key) {
                return Err(Error::invalid_graph(format!(
                    "Cycle detected: {} -> {}",
                    path[first_occurance..]
                        .iter()
                        .map(|x| x.to_string())
                        .collect::<Vec<_>>()
                        .join(" -> "),
                    child.key
                )));
            }
            self.validate_acyclicity_from(child, path, done)?;
        }
        path.pop();
        done.insert(asset.key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Asset, AssetType, Error, ErrorKind, PowerTopology, SupplyEdge, TopologyConfig};

    fn assets_and_edges() -> (Vec<Asset>, Vec<SupplyEdge>) {
        let assets = vec![
            Asset::new(1, AssetType::Pdu),
            Asset::new(2, AssetType::Pdu),
            Asset::new(11, AssetType::Outlet),
            Asset::new(12, AssetType::Outlet),
            Asset::new(21, AssetType::Outlet),
            Asset::new(5, AssetType::StaticAsset).with_power(120.0, 120.0),
        ];
        let edges = vec![
            SupplyEdge::new(1, 11),
            SupplyEdge::new(1, 12),
            SupplyEdge::new(12, 2),
            SupplyEdge::new(2, 21),
            SupplyEdge::new(21, 5),
        ];

        (assets, edges)
    }

    #[test]
    fn test_acyclicity_validation() {
        let config = TopologyConfig::default();
        let (assets, mut edges) = assets_and_edges();

        assert!(PowerTopology::try_new(assets.clone(), edges.clone(), config.clone()).is_ok());

        // add cycles at different levels
        edges.push(SupplyEdge::new(21, 12));
        assert!(
            PowerTopology::try_new(assets.clone(), edges.clone(), config.clone())
                .is_err_and(|e| e == Error::invalid_graph("Cycle detected: 12 -> 2 -> 21 -> 12"))
        );

        edges.pop();
        edges.push(SupplyEdge::new(2, 12));
        assert!(
            PowerTopology::try_new(assets.clone(), edges.clone(), config.clone())
                .is_err_and(|e| e == Error::invalid_graph("Cycle detected: 12 -> 2 -> 12"))
        );

        // a cycle that no root feeds into
        edges.pop();
        edges.push(SupplyEdge::new(11, 1));
        assert!(
            PowerTopology::try_new(assets.clone(), edges.clone(), config.clone())
                .is_err_and(|e| e == Error::invalid_graph("Cycle detected: 1 -> 11 -> 1"))
        );

        edges.pop();
        assert!(PowerTopology::try_new(assets.clone(), edges.clone(), config.clone()).is_ok());
    }

    #[test]
    fn test_acyclicity_with_shared_descendants() {
        // 40 layers of two PDUs, each feeding both PDUs of the next layer,
        // so there are 2^40 paths from the roots to the last layer.
        let layers = 40;
        let assets = (0..2 * layers)
            .map(|i| Asset::new(100 + i, AssetType::Pdu))
            .collect::<Vec<_>>();
        let mut edges = vec![];
        for layer in 1..layers {
            for parent in [2 * layer - 2, 2 * layer - 1] {
                for child in [2 * layer, 2 * layer + 1] {
                    edges.push(SupplyEdge::new(100 + parent, 100 + child));
                }
            }
        }
        let config = TopologyConfig::default();

        assert!(PowerTopology::try_new(assets.clone(), edges.clone(), config.clone()).is_ok());

        edges.push(SupplyEdge::new(100 + 2 * layers - 1, 102));
        assert!(PowerTopology::try_new(assets, edges, config)
            .is_err_and(|e| e.kind() == ErrorKind::InvalidGraph));
    }

    #[test]
    fn test_asset_invariants() {
        let config = TopologyConfig::default();
        let (mut assets, mut edges) = assets_and_edges();

        assets.push(Asset::new(6, AssetType::StaticAsset).with_power(60.0, 120.0));
        edges.push(SupplyEdge::new(21, 6));
        assert!(
            PowerTopology::try_new(assets.clone(), edges.clone(), config.clone()).is_err_and(
                |e| e == Error::invalid_graph("outlet:21 can supply only one asset. Found [5, 6].")
            )
        );

        edges.pop();
        edges.push(SupplyEdge::new(5, 6));
        assert!(
            PowerTopology::try_new(assets.clone(), edges.clone(), config.clone()).is_err_and(
                |e| e
                    == Error::invalid_graph(
                        "staticasset:5 can't supply other assets. Found staticasset:6."
                    )
            )
        );

        edges.pop();
        edges.push(SupplyEdge::new(11, 6));
        assert!(PowerTopology::try_new(assets.clone(), edges.clone(), config.clone()).is_ok());
    }
}
