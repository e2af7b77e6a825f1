// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the configuration options for the `PowerTopology` and
//! the `Engine`.

/// Configuration options for the `PowerTopology`.
#[derive(Clone, Default, Debug)]
pub struct TopologyConfig {
    /// Whether to allow static devices and servers that don't declare a
    /// positive `power_consumption` and `power_source`.  Such devices report
    /// a load of `0.0`.
    pub allow_unpowered_static_devices: bool,
}

/// Configuration options for the `Engine`.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Whether status changes are published on the notification channel.
    pub publish_notifications: bool,

    /// The pub/sub channel that status changes are published on.
    pub notification_channel: String,

    /// Name of the directory, inside a chassis state directory, that holds
    /// the emulated sensor files.
    pub sensor_subdir: String,

    /// Multiplier applied to the load (in amps) when encoding the PDU current
    /// reading.
    pub current_scale: f64,

    /// Voltage used for converting load in amps to wattage.
    pub wattage_voltage: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            publish_notifications: true,
            notification_channel: "state-upd".to_string(),
            sensor_subdir: "sensor_dir".to_string(),
            current_scale: 10.0,
            wattage_voltage: 120.0,
        }
    }
}
