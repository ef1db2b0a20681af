// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::{Error, Result};
use crate::traits::{InstanceRef, Resolver};

/// A registered instance plus the per-name serialization every lifecycle
/// call on it goes through.
pub(crate) struct Entry {
    pub instance: InstanceRef,
    pub lock: tokio::sync::Mutex<()>,
    read_only: AtomicBool,
    retiring: AtomicBool,
}

impl Entry {
    fn new(instance: InstanceRef) -> Self {
        Self {
            instance,
            lock: tokio::sync::Mutex::new(()),
            read_only: AtomicBool::new(false),
            retiring: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        self.instance.name()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only.load(Ordering::SeqCst)
    }

    pub fn set_read_only(&self) {
        self.read_only.store(true, Ordering::SeqCst);
    }

    /// Set while a destroy is in flight; retiring instances resolve to nothing.
    pub fn is_retiring(&self) -> bool {
        self.retiring.load(Ordering::SeqCst)
    }

    pub fn set_retiring(&self, retiring: bool) {
        self.retiring.store(retiring, Ordering::SeqCst);
    }
}

/// Live instances by unique name. Cloning shares the same map.
#[derive(Clone, Default)]
pub(crate) struct InstanceRegistry(Arc<RwLock<BTreeMap<String, Arc<Entry>>>>);

impl InstanceRegistry {
    pub fn insert(&self, instance: InstanceRef) -> Result<Arc<Entry>> {
        let mut entries = self.0.write();
        let name = instance.name().to_string();
        if entries.contains_key(&name) {
            return Err(Error::Conflict(format!("instance \"{}\" already exists", name)));
        }
        let entry = Arc::new(Entry::new(instance));
        entries.insert(name, Arc::clone(&entry));
        Ok(entry)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Entry>> {
        self.0.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.read().contains_key(name)
    }

    pub fn remove(&self, name: &str) -> Option<Arc<Entry>> {
        self.0.write().remove(name)
    }

    pub fn entries(&self) -> Vec<Arc<Entry>> {
        self.0.read().values().cloned().collect()
    }
}

impl Resolver for InstanceRegistry {
    fn resolve(&self, name: &str) -> Option<InstanceRef> {
        self.get(name)
            .filter(|entry| !entry.is_retiring())
            .map(|entry| Arc::clone(&entry.instance))
    }
}
