//! Shared access to the class registry.
//!
//! The evaluator reads the registry on every call and writes it only for
//! `def`/`class`/constant declarations at the top level or in a class body.
//! Generic resolution keeps a read guard alive while it evaluates a block,
//! so writes go through [`SharedRegistry::try_write`] and fail instead of
//! blocking when a read is outstanding.

use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};
use quack_types::ClassRegistry;

/// Reference-counted, lock-protected [`ClassRegistry`].
pub struct SharedRegistry(Arc<parking_lot::RwLock<ClassRegistry>>);

impl SharedRegistry {
    pub fn new(registry: ClassRegistry) -> Self {
        SharedRegistry(Arc::new(parking_lot::RwLock::new(registry)))
    }

    /// Get read access to the registry.
    ///
    /// Reads nest: a read taken while another is held on the same thread
    /// never waits.
    pub fn read(&self) -> RwLockReadGuard<'_, ClassRegistry> {
        self.0.read_recursive()
    }

    /// Get write access to the registry. Blocks while readers exist.
    pub fn write(&self) -> RwLockWriteGuard<'_, ClassRegistry> {
        self.0.write()
    }

    /// Get write access if no guard is outstanding.
    pub fn try_write(&self) -> Option<RwLockWriteGuard<'_, ClassRegistry>> {
        self.0.try_write()
    }
}

impl Clone for SharedRegistry {
    fn clone(&self) -> Self {
        SharedRegistry(Arc::clone(&self.0))
    }
}

impl fmt::Debug for SharedRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedRegistry({} classes)", self.0.read_recursive().class_count())
    }
}
