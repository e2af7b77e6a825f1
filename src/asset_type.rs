// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module defines the `AssetType` enum, which represents the type of an
//! asset and selects the behavior that governs it.

use std::fmt::Display;
use std::str::FromStr;

use crate::Error;

/// Represents the type of an asset.
///
/// The lowercase tag returned by [`AssetType::tag`] is the form used in state
/// store keys, so it must stay stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetType {
    Pdu,
    Outlet,
    StaticAsset,
    Server,
    ServerWithBmc,
    Psu,
}

impl AssetType {
    /// All supported asset types.
    pub const ALL: [AssetType; 6] = [
        AssetType::Pdu,
        AssetType::Outlet,
        AssetType::StaticAsset,
        AssetType::Server,
        AssetType::ServerWithBmc,
        AssetType::Psu,
    ];

    /// Returns the tag used for the asset type in state store keys.
    pub fn tag(&self) -> &'static str {
        match self {
            AssetType::Pdu => "pdu",
            AssetType::Outlet => "outlet",
            AssetType::StaticAsset => "staticasset",
            AssetType::Server => "server",
            AssetType::ServerWithBmc => "serverwithbmc",
            AssetType::Psu => "psu",
        }
    }

    /// Returns true if assets of this type draw a fixed amount of power
    /// computed from their `power_consumption` and `power_source`.
    pub fn has_static_draw(&self) -> bool {
        matches!(
            self,
            AssetType::StaticAsset | AssetType::Server | AssetType::ServerWithBmc
        )
    }

    /// Returns true if assets of this type mirror their power state onto a
    /// virtual machine.
    pub fn is_virtualized(&self) -> bool {
        matches!(self, AssetType::Server | AssetType::ServerWithBmc)
    }

    /// Returns true if assets of this type maintain emulated sensor files.
    pub fn is_sensor_emulating(&self) -> bool {
        matches!(self, AssetType::ServerWithBmc | AssetType::Psu)
    }
}

impl Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for AssetType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetType::ALL
            .into_iter()
            .find(|t| t.tag() == s)
            .ok_or_else(|| Error::invalid_asset(format!("Unsupported asset type: {s}")))
    }
}

/// Predicates for checking the type of an asset.
pub(crate) trait TypePredicates {
    fn asset_type(&self) -> AssetType;

    fn is_outlet(&self) -> bool {
        self.asset_type() == AssetType::Outlet
    }

    fn is_psu(&self) -> bool {
        self.asset_type() == AssetType::Psu
    }

    fn has_static_draw(&self) -> bool {
        self.asset_type().has_static_draw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags() -> Result<(), Error> {
        for asset_type in AssetType::ALL {
            assert_eq!(asset_type.tag().parse::<AssetType>()?, asset_type);
        }
        assert_eq!(AssetType::ServerWithBmc.to_string(), "serverwithbmc");
        assert_eq!(
            "ups".parse::<AssetType>(),
            Err(Error::invalid_asset("Unsupported asset type: ups"))
        );
        Ok(())
    }

    #[test]
    fn test_capabilities() {
        assert!(AssetType::Server.is_virtualized());
        assert!(AssetType::ServerWithBmc.is_virtualized());
        assert!(AssetType::ServerWithBmc.is_sensor_emulating());
        assert!(AssetType::Psu.is_sensor_emulating());
        assert!(!AssetType::Pdu.has_static_draw());
        assert!(AssetType::StaticAsset.has_static_draw());
    }
}
