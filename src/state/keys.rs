// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Key layout of the state store.

use crate::AssetType;

/// Key holding the status (`"0"` or `"1"`) of an asset.
pub fn state_key(key: u64, asset_type: AssetType) -> String {
    format!("{key}-{}", asset_type.tag())
}

/// Key holding the load, in amps, of the asset with the given state key.
pub fn load_key(state_key: &str) -> String {
    format!("{state_key}:load")
}

/// Key holding the Unix timestamp of an asset's last power-up.
pub fn start_time_key(key: u64) -> String {
    format!("{key}:start_time")
}

/// Key holding the path of a chassis' sensor state directory.
pub fn state_dir_key(key: u64) -> String {
    format!("{key}:state_dir")
}

/// Key holding the value of the sensor `sensor_id` owned by `owner_key`.
pub fn sensor_value_key(owner_key: u64, sensor_id: &str) -> String {
    format!("{owner_key}-{sensor_id}")
}

/// Encodes a sensor value as `<dataType>|<value>`.
pub fn sensor_value(data_type: &str, value: impl std::fmt::Display) -> String {
    format!("{data_type}|{value}")
}

/// Returns the value part of an encoded sensor value, if it has one.
pub fn sensor_reading(encoded: &str) -> Option<&str> {
    encoded.split_once('|').map(|(_, value)| value)
}
