// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the trait that describes the queries the engine runs
//! against the topology.

use crate::{Asset, Error, GatingSensor, PowerTopology, SensorDefinition};

/**
The queries the [`Engine`][crate::Engine] runs against the power topology.

[`PowerTopology`] implements this trait over an in-memory graph.  A
topology kept in a graph database can be plugged in by implementing the
same queries.

<details>
<summary>Example implementation backed by a graph database session:</summary>

```ignore
impl simengine_state::TopologyStore for GraphReference {
    fn parents(&self, key: u64) -> Result<Vec<Asset>, Error> {
        self.run(
            "MATCH (:Asset { key: $key })-[:POWERED_BY]->(parent:Asset) RETURN parent",
            key,
        )
        .map_err(|e| Error::store(e.to_string()))?
        .into_iter()
        .map(asset_from_record)
        .collect()
    }

    // ...
}
```

</details>
*/
pub trait TopologyStore: Send + Sync {
    /// Returns the asset with the given key.
    fn asset(&self, key: u64) -> Result<Asset, Error>;

    /// Returns all assets in the topology, ordered by key.
    fn assets(&self) -> Vec<Asset>;

    /// Returns the assets that supply the given asset.
    fn parents(&self, key: u64) -> Result<Vec<Asset>, Error>;

    /// Returns the gating sensors of the given asset.
    fn gating_sensors(&self, key: u64) -> Result<Vec<GatingSensor>, Error>;

    /// Returns the assets the given asset directly supplies.
    fn children(&self, key: u64) -> Result<Vec<Asset>, Error>;

    /// Returns every asset upstream of the given asset, nearest first.
    fn ancestors(&self, key: u64) -> Result<Vec<Asset>, Error>;

    /// Returns the sensor named `name` that belongs to the given asset.
    fn sensor(&self, key: u64, name: &str) -> Result<Option<SensorDefinition>, Error>;
}

fn sorted(mut assets: Vec<Asset>) -> Vec<Asset> {
    assets.sort_by_key(|a| a.key);
    assets
}

impl TopologyStore for PowerTopology {
    fn asset(&self, key: u64) -> Result<Asset, Error> {
        PowerTopology::asset(self, key).cloned()
    }

    fn assets(&self) -> Vec<Asset> {
        sorted(PowerTopology::assets(self).cloned().collect())
    }

    fn parents(&self, key: u64) -> Result<Vec<Asset>, Error> {
        Ok(sorted(PowerTopology::parents(self, key)?.cloned().collect()))
    }

    fn gating_sensors(&self, key: u64) -> Result<Vec<GatingSensor>, Error> {
        PowerTopology::gating_sensors(self, key).map(<[GatingSensor]>::to_vec)
    }

    fn children(&self, key: u64) -> Result<Vec<Asset>, Error> {
        Ok(sorted(PowerTopology::children(self, key)?.cloned().collect()))
    }

    fn ancestors(&self, key: u64) -> Result<Vec<Asset>, Error> {
        Ok(PowerTopology::ancestors(self, key)?
            .into_iter()
            .cloned()
            .collect())
    }

    fn sensor(&self, key: u64, name: &str) -> Result<Option<SensorDefinition>, Error> {
        PowerTopology::sensor(self, key, name).map(|sensor| sensor.cloned())
    }
}
