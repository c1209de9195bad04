//! The administrative surface as data.
//!
//! An explicit registry of (entity, actions) built once at startup and
//! carried in the application state — administrative handlers consult it
//! before acting, and `GET /admin` renders it. There is no module-level
//! registration; what the process exposes is exactly what was constructed
//! here.

use serde::Serialize;

/// One administrable entity and the actions exposed for it.
#[derive(Debug, Clone, Serialize)]
pub struct AdminResource {
    pub entity: &'static str,
    pub actions: &'static [&'static str],
}

/// Registry of administrative resources.
#[derive(Debug, Clone, Default)]
pub struct AdminRegistry {
    resources: Vec<AdminResource>,
}

impl AdminRegistry {
    /// An empty registry; nothing is administrable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity with its actions. Later registrations of the
    /// same entity replace earlier ones.
    pub fn register(mut self, entity: &'static str, actions: &'static [&'static str]) -> Self {
        self.resources.retain(|r| r.entity != entity);
        self.resources.push(AdminResource { entity, actions });
        self
    }

    /// The registry the storefront builds at startup.
    pub fn storefront() -> Self {
        Self::new()
            .register("orders", &["set_status"])
            .register("products", &["set_availability", "set_price"])
    }

    /// Returns true if the action is registered for the entity.
    pub fn allows(&self, entity: &str, action: &str) -> bool {
        self.resources
            .iter()
            .any(|r| r.entity == entity && r.actions.contains(&action))
    }

    /// All registered resources.
    pub fn resources(&self) -> &[AdminResource] {
        &self.resources
    }
}
