//! Interned string identifier.
//!
//! Provides compact 32-bit interned identifiers for method names, local
//! variables, constants, and class names.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Interned string identifier.
///
/// A `Name` is an index into a [`StringInterner`](crate::StringInterner).
/// Equality and hashing are O(1) integer operations.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
#[repr(transparent)]
pub struct Name(u32);

/// Strings pre-interned by every interner, in index order.
///
/// The `Name` constants below are the positions in this table; the
/// interner's constructor interns these first so the two stay aligned.
pub(crate) const WELL_KNOWN: &[&str] = &[
    "",
    "new",
    "initialize",
    "==",
    "!=",
    "!",
    "===",
    "nil?",
    "equal?",
    "BasicObject",
    "Object",
    "Module",
    "Class",
    "NilClass",
    "TrueClass",
    "FalseClass",
    "Numeric",
    "Integer",
    "Float",
    "String",
    "Symbol",
    "Array",
    "main",
    "to_s",
    "to_a",
];

impl Name {
    /// Pre-interned empty string.
    pub const EMPTY: Name = Name(0);

    // Method names the analyzer treats specially.
    pub const NEW: Name = Name(1);
    pub const INITIALIZE: Name = Name(2);
    pub const EQ: Name = Name(3);
    pub const NOT_EQ: Name = Name(4);
    pub const NOT: Name = Name(5);
    pub const CASE_EQ: Name = Name(6);
    pub const IS_NIL: Name = Name(7);
    pub const IS_EQUAL: Name = Name(8);

    // Core class names.
    pub const BASIC_OBJECT: Name = Name(9);
    pub const OBJECT: Name = Name(10);
    pub const MODULE: Name = Name(11);
    pub const CLASS: Name = Name(12);
    pub const NIL_CLASS: Name = Name(13);
    pub const TRUE_CLASS: Name = Name(14);
    pub const FALSE_CLASS: Name = Name(15);
    pub const NUMERIC: Name = Name(16);
    pub const INTEGER: Name = Name(17);
    pub const FLOAT: Name = Name(18);
    pub const STRING: Name = Name(19);
    pub const SYMBOL: Name = Name(20);
    pub const ARRAY: Name = Name(21);

    /// Label of the top-level `self`.
    pub const MAIN: Name = Name(22);
    pub const TO_S: Name = Name(23);
    pub const TO_A: Name = Name(24);

    /// Get raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Create from raw u32 value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Name(raw)
    }

    /// Index into the interner's string table.
    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Hash for Name {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::EMPTY
    }
}
