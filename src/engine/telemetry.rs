// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Encoding of asset loads into SNMP-style telemetry values.

use tracing::trace;

use super::EngineContext;
use crate::state::keys;
use crate::{Error, SensorDefinition};

/// Name of the PDU sensor reporting the current on the phase.
pub const AMP_ON_PHASE: &str = "AmpOnPhase";

/// Name of the PDU sensor reporting the drawn wattage.
pub const WATTAGE_DRAW: &str = "WattageDraw";

/// A telemetry value, tagged with its SNMP encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnmpValue {
    Gauge32(u32),
    Integer32(i32),
}

impl SnmpValue {
    /// Truncates `value` to a `Gauge32`, saturating at its bounds.
    pub fn gauge32(value: f64) -> Self {
        Self::Gauge32(value.trunc() as u32)
    }

    /// Truncates `value` to an `Integer32`, saturating at its bounds.
    pub fn integer32(value: f64) -> Self {
        Self::Integer32(value.trunc() as i32)
    }

    /// Returns the name of the encoding.
    pub fn data_type(&self) -> &'static str {
        match self {
            Self::Gauge32(_) => "Gauge32",
            Self::Integer32(_) => "Integer32",
        }
    }
}

impl std::fmt::Display for SnmpValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gauge32(value) => write!(f, "{value}"),
            Self::Integer32(value) => write!(f, "{value}"),
        }
    }
}

async fn write_sensor(
    ctx: &EngineContext,
    sensor: &SensorDefinition,
    value: SnmpValue,
) -> Result<(), Error> {
    let value_key = sensor.value_key();
    trace!(sensor = %value_key, %value, "Writing telemetry");
    ctx.store()
        .set(&value_key, &keys::sensor_value(&sensor.data_type, value))
        .await
}

/// Writes a PDU's current and wattage readings.  Missing sensors are
/// skipped.
pub(crate) async fn encode_pdu_load(
    ctx: &EngineContext,
    key: u64,
    load: f64,
) -> Result<(), Error> {
    let config = ctx.config();
    if let Some(sensor) = ctx.topology().sensor(key, AMP_ON_PHASE)? {
        write_sensor(ctx, &sensor, SnmpValue::gauge32(load * config.current_scale)).await?;
    }
    if let Some(sensor) = ctx.topology().sensor(key, WATTAGE_DRAW)? {
        write_sensor(
            ctx,
            &sensor,
            SnmpValue::integer32(load * config.wattage_voltage),
        )
        .await?;
    }
    Ok(())
}
