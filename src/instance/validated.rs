// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::any::Any;

use crate::errors::{LifecycleError, Result};

/// A configuration that passed Validate, tagged with the instance that
/// validated it. Plan and Apply refuse one produced for a different instance
/// or configuration type.
pub struct ValidatedConfig {
    instance: String,
    config: Box<dyn Any + Send + Sync>,
}

impl ValidatedConfig {
    pub fn new<C: Any + Send + Sync>(instance: &str, config: C) -> Self {
        Self {
            instance: instance.to_string(),
            config: Box::new(config),
        }
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn get<C: Any>(&self, instance: &str) -> Result<&C> {
        if self.instance != instance {
            return Err(self.rejected(instance));
        }
        self.config
            .downcast_ref::<C>()
            .ok_or_else(|| self.rejected(instance))
    }

    pub fn into_inner<C: Any>(self, instance: &str) -> Result<C> {
        if self.instance != instance {
            return Err(self.rejected(instance));
        }
        let rejected = self.rejected(instance);
        self.config
            .downcast::<C>()
            .map(|config| *config)
            .map_err(|_| rejected)
    }

    fn rejected(&self, instance: &str) -> crate::errors::Error {
        LifecycleError::NotValidated {
            name: instance.to_string(),
        }
        .into()
    }
}
