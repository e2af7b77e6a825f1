// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Control over the virtual machines that mirror the power state of server
//! assets.
//!
//! The engine only needs a handful of hypervisor operations: looking up a
//! domain by name, checking whether it is running, and starting, shutting
//! down or destroying it.  [`MockHypervisor`] implements them in memory.

mod mock;

pub use mock::{MockDomain, MockHypervisor};

use std::sync::Arc;

use async_trait::async_trait;

use crate::Error;

/// A connection to a hypervisor endpoint.
#[async_trait]
pub trait Hypervisor: Send + Sync + 'static {
    /// Returns the URI of the endpoint this connection is open to, e.g.
    /// `qemu:///system`.
    fn uri(&self) -> &str;

    /// Looks up a domain by name.
    ///
    /// Fails with a `DomainLookup` error if there is no such domain.
    async fn lookup_domain(&self, name: &str) -> Result<Arc<dyn Domain>, Error>;
}

/// A virtual machine managed by a [`Hypervisor`].
#[async_trait]
pub trait Domain: Send + Sync + 'static {
    /// Returns the name of the domain.
    fn name(&self) -> &str;

    /// Returns true if the domain is running.
    async fn is_active(&self) -> Result<bool, Error>;

    /// Starts the domain.
    async fn create(&self) -> Result<(), Error>;

    /// Asks the domain's guest to shut down gracefully.
    async fn shutdown(&self) -> Result<(), Error>;

    /// Stops the domain immediately.
    async fn destroy(&self) -> Result<(), Error>;
}
