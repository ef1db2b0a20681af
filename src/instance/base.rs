// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use parking_lot::RwLock;
use std::sync::Arc;

use crate::errors::Result;
use crate::instance::{Plan, ValidatedConfig};
use crate::schema::{Configuration, Schema};
use crate::state::{self, State};
use crate::traits::{Resolver, Resource};

/// Name, type back-reference and last-applied configuration of one instance,
/// plus the default Validate/Plan/Read/References behaviour. Concrete
/// instances embed one and add their side effects around it.
pub struct InstanceCore<C: Configuration> {
    name: String,
    resource: Arc<dyn Resource>,
    schema: Schema<C>,
    current: RwLock<Option<Arc<C>>>,
}

impl<C: Configuration> InstanceCore<C> {
    pub fn new(name: &str, resource: Arc<dyn Resource>) -> Self {
        Self {
            name: name.to_string(),
            resource,
            schema: C::schema(),
            current: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resource(&self) -> Arc<dyn Resource> {
        Arc::clone(&self.resource)
    }

    pub fn schema(&self) -> &Schema<C> {
        &self.schema
    }

    /// Last-applied configuration, if any.
    pub fn current(&self) -> Option<Arc<C>> {
        self.current.read().clone()
    }

    pub fn is_applied(&self) -> bool {
        self.current.read().is_some()
    }

    /// Restores `state` into a fresh configuration and checks required
    /// fields and reference types.
    pub fn decode(&self, state: &State, resolver: Option<&dyn Resolver>) -> Result<C> {
        let mut config = C::default();
        state::restore(&self.schema, state, resolver, &mut config)?;
        state::validate_required(&self.schema, &config)?;
        state::validate_references(&self.schema, &config)?;
        Ok(config)
    }

    pub fn seal(&self, config: C) -> ValidatedConfig {
        ValidatedConfig::new(&self.name, config)
    }

    pub fn validate(&self, state: &State, resolver: Option<&dyn Resolver>) -> Result<ValidatedConfig> {
        self.decode(state, resolver).map(|config| self.seal(config))
    }

    pub fn plan(&self, config: &ValidatedConfig) -> Result<Plan> {
        let desired = config.get::<C>(&self.name)?;
        let desired = state::snapshot(&self.schema, desired);
        let current = self.current().map(|c| state::snapshot(&self.schema, &c));
        Ok(Plan::diff(&self.schema.attributes(), current.as_ref(), &desired))
    }

    pub fn unseal(&self, config: ValidatedConfig) -> Result<C> {
        config.into_inner::<C>(&self.name)
    }

    pub fn commit(&self, config: C) {
        *self.current.write() = Some(Arc::new(config));
    }

    /// Forgets the applied configuration, returning it.
    pub fn clear(&self) -> Option<Arc<C>> {
        self.current.write().take()
    }

    /// Snapshot of the applied configuration; empty when never applied.
    pub fn read(&self) -> State {
        self.current()
            .map(|c| state::snapshot(&self.schema, &c))
            .unwrap_or_default()
    }

    pub fn references(&self) -> Vec<String> {
        self.current()
            .map(|c| state::references_of(&self.schema, &c))
            .unwrap_or_default()
    }
}
