// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for validating a [`PowerTopology`].

mod invariant_checks;
mod validate_graph;

use crate::{asset_type::TypePredicates, Error, PowerTopology};

pub(crate) struct TopologyValidator<'a> {
    topology: &'a PowerTopology,
}

impl PowerTopology {
    pub(super) fn validate(&self) -> Result<(), Error> {
        let validator = TopologyValidator { topology: self };

        validator.validate_acyclicity()?;
        validator.validate_assets()?;

        Ok(())
    }
}

impl TopologyValidator<'_> {
    /// Validates that:
    ///  - outlets supply at most one asset,
    ///  - assets with a fixed draw don't supply anything.
    fn validate_assets(&self) -> Result<(), Error> {
        for asset in self.topology.assets() {
            if asset.is_outlet() {
                self.ensure_at_most_one_child(asset)?;
            } else if asset.has_static_draw() {
                self.ensure_leaf(asset)?;
            }
        }
        Ok(())
    }
}
