// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

/*!
# SimEngine State

This is a library for simulating the power state of the assets of a data
center: PDUs, outlets, static devices, servers and their power supplies.

Assets and the supply relations between them form a directed graph, the
[`PowerTopology`].  The operational state of every asset (whether it is on,
how much current it draws) lives in a shared key-value [`StateStore`], and
every status change is published on a notification channel so that other
processes can react to it.

## The topology

A [`PowerTopology`] is created by passing the assets and the supply edges
between them to [`try_new`][PowerTopology::try_new].  The method checks
that:

- Every asset key is unique, and every edge points to existing assets.
- There are no cycles in the graph.
- Outlets supply at most one asset, and static devices and servers supply
  none.
- Static devices and servers declare their power draw.

The engine only talks to the topology through the [`TopologyStore`] trait,
so a topology kept elsewhere, e.g. in a graph database, can be plugged in.

## The engine

An [`Engine`] executes power transitions on assets:

- [`power_up`][Engine::power_up] switches an asset on, if at least one of
  its parents is on and at least one of its gating sensors doesn't read its
  switch-off value.
- [`power_off`][Engine::power_off] switches it off immediately.
- [`shut_down`][Engine::shut_down] switches it off after its shutdown delay.

Servers mirror these transitions onto a virtual machine through the
[`Hypervisor`] trait.  Transitions on the same asset are serialized, and
dropping an in-flight transition cancels it.

The engine also computes loads, by walking the graph downstream of an asset
([`calculate_load`][Engine::calculate_load]), and stores them with their
derived telemetry ([`update_load`][Engine::update_load],
[`propagate_load`][Engine::propagate_load]).
*/

mod asset_type;
pub use asset_type::AssetType;

mod clock;
pub use clock::{Clock, InstantClock, SystemClock};

mod config;
pub use config::{EngineConfig, TopologyConfig};

mod engine;
pub use engine::{
    AssetBehavior, AssetStatus, BehaviorBundle, BmcServerManager, Engine, EngineContext,
    LoadAggregatable, OutletManager, PduManager, PowerTransitionable, PsuManager,
    SensorEmulating, SensorFiles, ServerManager, SnmpValue, StateManager, StaticDeviceManager,
    TypeRegistry, VirtualizationControlled, AMP_ON_PHASE, WATTAGE_DRAW,
};

mod error;
pub use error::{Error, ErrorKind};

pub mod state;
pub use state::{MemoryStore, StateStore, Subscription};

mod topology;
pub use topology::{iterators, Asset, GatingSensor, PowerTopology, SensorDefinition, SupplyEdge};

mod topology_store;
pub use topology_store::TopologyStore;

pub mod virtualization;
pub use virtualization::{Domain, Hypervisor, MockDomain, MockHypervisor};
