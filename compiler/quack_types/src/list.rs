//! Interned value lists.
//!
//! Array elements and type arguments are lists of [`Value`]s. Interning them
//! keeps [`Instance`](crate::Instance) a small `Copy` key: it refers to a
//! list by [`ListId`], and equal lists always share one id.
//!
//! The pool sits behind its own lock so that code holding only a shared
//! borrow of the registry (built-in folds, the evaluator under a read guard)
//! can still intern.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::{ListId, Value};

#[derive(Debug, Default)]
struct Lists {
    map: FxHashMap<Arc<[Value]>, ListId>,
    items: Vec<Arc<[Value]>>,
}

/// Deduplicating storage for value lists.
#[derive(Debug, Default)]
pub struct ListPool {
    lists: RwLock<Lists>,
}

impl ListPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `values`, returning the id of an equal list if one exists.
    pub fn intern(&self, values: Vec<Value>) -> ListId {
        let key: Arc<[Value]> = values.into();
        if let Some(id) = self.lists.read().map.get(&key) {
            return *id;
        }
        let mut lists = self.lists.write();
        // Another writer may have won the race between the two locks.
        if let Some(id) = lists.map.get(&key) {
            return *id;
        }
        #[allow(clippy::cast_possible_truncation, reason = "list count fits in u32")]
        let id = ListId::from_raw(lists.items.len() as u32);
        lists.items.push(Arc::clone(&key));
        lists.map.insert(key, id);
        id
    }

    /// The list behind `id`.
    ///
    /// Ids are only minted by [`ListPool::intern`], so a foreign id is a bug
    /// in the caller and yields an empty list.
    pub fn get(&self, id: ListId) -> Arc<[Value]> {
        self.lists
            .read()
            .items
            .get(id.index())
            .cloned()
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    pub fn len(&self) -> usize {
        self.lists.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
