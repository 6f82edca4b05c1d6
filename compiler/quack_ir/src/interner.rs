//! String interner for identifiers.
//!
//! Provides O(1) interning and lookup. The table sits behind a
//! `parking_lot::RwLock` so a single interner can be shared by reference
//! between the parser collaborator, the registry, and the evaluator.

use super::name::WELL_KNOWN;
use super::Name;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Storage for interned strings.
struct InternTable {
    /// Map from string content to index.
    map: FxHashMap<&'static str, u32>,
    /// Storage for string contents.
    strings: Vec<&'static str>,
}

impl InternTable {
    fn new() -> Self {
        Self {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(256),
        }
    }

    fn insert(&mut self, s: &str) -> Name {
        if let Some(&index) = self.map.get(s) {
            return Name::from_raw(index);
        }

        // Leak the string to get 'static lifetime; names live as long as the process.
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let index = u32::try_from(self.strings.len())
            .unwrap_or_else(|_| panic!("string interner exceeded {} entries", u32::MAX));
        self.strings.push(leaked);
        self.map.insert(leaked, index);
        Name::from_raw(index)
    }
}

/// String interner.
///
/// Every interner starts with the well-known identifiers at fixed indices,
/// so `Name::NEW`, `Name::OBJECT` and friends are valid for any instance.
pub struct StringInterner {
    table: RwLock<InternTable>,
}

impl StringInterner {
    /// Create a new interner with the well-known names pre-interned.
    pub fn new() -> Self {
        let mut table = InternTable::new();
        for s in WELL_KNOWN {
            table.insert(s);
        }
        Self {
            table: RwLock::new(table),
        }
    }

    /// Intern a string, returning its Name.
    ///
    /// # Panics
    /// Panics if the interner exceeds `u32::MAX` entries.
    pub fn intern(&self, s: &str) -> Name {
        // Fast path: already interned
        if let Some(&index) = self.table.read().map.get(s) {
            return Name::from_raw(index);
        }
        self.table.write().insert(s)
    }

    /// Look up the string for a Name.
    pub fn lookup(&self, name: Name) -> &str {
        self.lookup_static(name)
    }

    /// Look up the string for a Name, returning a `'static` reference.
    ///
    /// Interned strings are leaked, so the reference outlives the guard.
    pub fn lookup_static(&self, name: Name) -> &'static str {
        let guard = self.table.read();
        guard.strings.get(name.index()).copied().unwrap_or("<unknown>")
    }

    /// Number of interned strings, including the well-known set.
    pub fn len(&self) -> usize {
        self.table.read().strings.len()
    }

    /// True when only the well-known names are interned.
    pub fn is_empty(&self) -> bool {
        self.len() <= WELL_KNOWN.len()
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for looking up interned string names.
///
/// Lets rendering code accept any name source without depending on the
/// concrete interner.
pub trait StringLookup {
    /// Look up the string for an interned name.
    fn lookup(&self, name: Name) -> &str;
}

impl StringLookup for StringInterner {
    fn lookup(&self, name: Name) -> &str {
        StringInterner::lookup(self, name)
    }
}
