// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Bulk status queries over the whole topology.

use std::future::Future;
use std::pin::Pin;

use super::state_manager::parse_status;
use super::Engine;
use crate::{Asset, AssetType, Error};

/// A snapshot of one asset's state.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetStatus {
    pub key: u64,
    pub asset_type: AssetType,
    pub name: String,
    /// True if the asset is on.
    pub status: bool,
    /// The asset's present load, in amps.
    pub load: f64,
    /// The assets this one supplies.  Always empty in flat listings.
    pub children: Vec<AssetStatus>,
}

type StatusFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<AssetStatus>, Error>> + Send + 'a>>;

impl Engine {
    /// Returns the state of every asset.
    ///
    /// With `flatten`, there is one entry per asset, ordered by key.
    /// Otherwise the entries are the root assets, and every asset is nested
    /// under each asset that supplies it.
    pub async fn system_status(&self, flatten: bool) -> Result<Vec<AssetStatus>, Error> {
        let topology = self.context().topology();
        let assets = if flatten {
            topology.assets()
        } else {
            let mut roots = Vec::new();
            for asset in topology.assets() {
                if topology.parents(asset.key)?.is_empty() {
                    roots.push(asset);
                }
            }
            roots
        };
        self.statuses(assets, !flatten).await
    }

    /// Returns the state of one asset.
    pub async fn asset_status(&self, key: u64) -> Result<AssetStatus, Error> {
        let asset = self.context().topology().asset(key)?;
        let mut statuses = self.statuses(vec![asset], false).await?;
        statuses
            .pop()
            .ok_or_else(|| Error::internal(format!("No status collected for asset {key}.")))
    }

    fn statuses(&self, assets: Vec<Asset>, nested: bool) -> StatusFuture<'_> {
        Box::pin(async move {
            let state_keys: Vec<String> = assets.iter().map(Asset::state_key).collect();
            let values = self.context().store().mget(&state_keys).await?;

            let mut statuses = Vec::with_capacity(assets.len());
            for ((asset, state_key), value) in assets.into_iter().zip(state_keys).zip(values) {
                let children = if nested {
                    let children = self.context().topology().children(asset.key)?;
                    self.statuses(children, true).await?
                } else {
                    Vec::new()
                };
                statuses.push(AssetStatus {
                    status: parse_status(&state_key, value)?,
                    load: self.calculate_load(asset.key).await?,
                    key: asset.key,
                    asset_type: asset.asset_type,
                    name: asset.name,
                    children,
                });
            }
            Ok(statuses)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::test_utils::harness;
    use crate::topology::test_utils::TopologyBuilder;
    use crate::{AssetType, Error};

    #[tokio::test]
    async fn test_system_status() -> Result<(), Error> {
        let mut builder = TopologyBuilder::new();
        let pdu = builder.pdu();
        let outlet_a = builder.outlet();
        let outlet_b = builder.outlet();
        let lamp = builder.static_device(120.0);
        let spare = builder.static_device(60.0);
        builder
            .connect(pdu, outlet_a)
            .connect(pdu, outlet_b)
            .connect(outlet_a, lamp);
        let h = harness(&builder).await?;
        for asset in [pdu, outlet_a, lamp, spare] {
            h.engine.power_up(asset.key()).await?;
        }

        let flat = h.engine.system_status(true).await?;
        assert_eq!(
            flat.iter()
                .map(|s| (s.key, s.status, s.load))
                .collect::<Vec<_>>(),
            vec![
                (1, true, 1.0),
                (2, true, 1.0),
                (3, false, 0.0),
                (4, true, 1.0),
                (5, true, 0.5)
            ]
        );
        assert!(flat.iter().all(|s| s.children.is_empty()));

        let nested = h.engine.system_status(false).await?;
        assert_eq!(
            nested.iter().map(|s| s.key).collect::<Vec<_>>(),
            vec![pdu.key(), spare.key()]
        );
        let outlets = &nested[0].children;
        assert_eq!(
            outlets.iter().map(|s| s.key).collect::<Vec<_>>(),
            vec![outlet_a.key(), outlet_b.key()]
        );
        assert_eq!(outlets[0].children.len(), 1);
        assert_eq!(outlets[0].children[0].asset_type, AssetType::StaticAsset);
        assert_eq!(outlets[0].children[0].load, 1.0);
        assert!(outlets[1].children.is_empty());

        let status = h.engine.asset_status(spare.key()).await?;
        assert_eq!(status.name, "staticasset-5");
        assert_eq!((status.status, status.load), (true, 0.5));
        assert!(h.engine.asset_status(42).await.is_err());

        Ok(())
    }
}
