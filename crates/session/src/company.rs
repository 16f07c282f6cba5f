//! Post-connect company routing.
//!
//! After the wallet connects the user names their company; a company
//! already known to the app goes straight to the manager dashboard,
//! anything else is sent through registration first.

use std::collections::HashSet;

/// Where the post-connect flow sends the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Known company - manager dashboard.
    Manager,
    /// Unknown company - registration form.
    Register,
}

/// In-memory set of registered company names.
///
/// Seeded with "DemoCo" so the demo flow has a known company out of
/// the box. Names are matched after trimming surrounding whitespace.
#[derive(Debug, Clone)]
pub struct CompanyRegistry {
    names: HashSet<String>,
}

impl CompanyRegistry {
    pub fn new() -> Self {
        let mut names = HashSet::new();
        names.insert("DemoCo".to_string());
        Self { names }
    }

    /// An empty registry, for tests and fresh deployments.
    pub fn empty() -> Self {
        Self {
            names: HashSet::new(),
        }
    }

    /// Registers a company. Re-registering is a no-op; blank names
    /// are ignored.
    pub fn register(&mut self, name: &str) {
        let name = name.trim();
        if !name.is_empty() {
            self.names.insert(name.to_string());
        }
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.names.contains(name.trim())
    }

    /// The post-connect decision for a typed company name.
    pub fn route_for(&self, name: &str) -> Route {
        if self.is_registered(name) {
            Route::Manager
        } else {
            Route::Register
        }
    }
}

impl Default for CompanyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
