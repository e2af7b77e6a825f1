// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! In-memory implementation of the [`Hypervisor`] and [`Domain`] traits.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use super::{Domain, Hypervisor};
use crate::Error;

/// A hypervisor that keeps its domains in memory.
///
/// Domains must be defined with [`MockHypervisor::define_domain`] before
/// they can be looked up.
#[derive(Debug)]
pub struct MockHypervisor {
    uri: String,
    domains: Mutex<HashMap<String, Arc<MockDomain>>>,
}

impl MockHypervisor {
    /// Opens a connection to the (simulated) endpoint at `uri`.
    pub fn connect(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            domains: Mutex::new(HashMap::new()),
        }
    }

    /// Defines a new, inactive domain and returns it.
    pub fn define_domain(&self, name: impl Into<String>) -> Arc<MockDomain> {
        let domain = Arc::new(MockDomain::new(name));
        self.domains
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(domain.name.clone(), domain.clone());
        domain
    }

    /// Returns the domain named `name`.
    pub fn domain(&self, name: &str) -> Result<Arc<MockDomain>, Error> {
        self.domains
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
            .ok_or_else(|| Error::domain_lookup(format!("No domain named '{name}'.")))
    }
}

#[async_trait]
impl Hypervisor for MockHypervisor {
    fn uri(&self) -> &str {
        &self.uri
    }

    async fn lookup_domain(&self, name: &str) -> Result<Arc<dyn Domain>, Error> {
        let domains = self.domains.lock().unwrap_or_else(|e| e.into_inner());
        match domains.get(name) {
            Some(domain) => Ok(domain.clone() as Arc<dyn Domain>),
            None => Err(Error::domain_lookup(format!(
                "Domain not found: no domain with matching name '{}' on {}.",
                name, self.uri
            ))),
        }
    }
}

/// A domain of a [`MockHypervisor`].
///
/// It counts the operations performed on it, so that tests can check how the
/// engine drove it.
#[derive(Debug)]
pub struct MockDomain {
    name: String,
    active: AtomicBool,
    starts: AtomicU32,
    shutdowns: AtomicU32,
    destroys: AtomicU32,
}

impl MockDomain {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: AtomicBool::new(false),
            starts: AtomicU32::new(0),
            shutdowns: AtomicU32::new(0),
            destroys: AtomicU32::new(0),
        }
    }

    /// Marks the domain running or stopped, without counting an operation.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    /// Returns true if the domain is running.
    pub fn active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Number of times the domain was started.
    pub fn starts(&self) -> u32 {
        self.starts.load(Ordering::SeqCst)
    }

    /// Number of graceful shutdowns requested.
    pub fn shutdowns(&self) -> u32 {
        self.shutdowns.load(Ordering::SeqCst)
    }

    /// Number of times the domain was destroyed.
    pub fn destroys(&self) -> u32 {
        self.destroys.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Domain for MockDomain {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_active(&self) -> Result<bool, Error> {
        Ok(self.active())
    }

    async fn create(&self) -> Result<(), Error> {
        if self.active.swap(true, Ordering::SeqCst) {
            return Err(Error::virtualization(format!(
                "Domain '{}' is already running.",
                self.name
            )));
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        debug!(domain = %self.name, "Started domain");
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), Error> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        self.active.store(false, Ordering::SeqCst);
        debug!(domain = %self.name, "Shut down domain");
        Ok(())
    }

    async fn destroy(&self) -> Result<(), Error> {
        self.destroys.fetch_add(1, Ordering::SeqCst);
        self.active.store(false, Ordering::SeqCst);
        debug!(domain = %self.name, "Destroyed domain");
        Ok(())
    }
}
