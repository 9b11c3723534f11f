//! Application state shared by every handler.
//!
//! The state is generic over the store so the same router serves PostgreSQL in
//! production and the in-memory store in tests and local runs.

use ospm_core::{Config, PolicyGate};
use ospm_db::Store;
use ospm_services::{OrganizationService, SubscriberGroupService};

pub struct AppState<S: Store> {
    pub store: S,
    pub organizations: OrganizationService<S>,
    pub subscriber_groups: SubscriberGroupService<S>,
    pub policy: PolicyGate,
    pub trusted_proxy_count: usize,
    pub cors_origins: Vec<String>,
}

impl<S: Store + Clone> AppState<S> {
    pub fn new(store: S, config: &Config) -> Self {
        Self {
            organizations: OrganizationService::new(store.clone()),
            subscriber_groups: SubscriberGroupService::new(store.clone()),
            store,
            policy: PolicyGate::new(config.whitelists.clone()),
            trusted_proxy_count: config.trusted_proxy_count,
            cors_origins: config.cors_origins.clone(),
        }
    }
}
