//! Arena ids for classes, methods, type variables, and interned value lists.

use std::fmt;

/// Index of a class in the [`ClassRegistry`](crate::ClassRegistry).
///
/// The core classes occupy fixed indices, registered in this order by
/// `ClassRegistry::new`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct ClassId(u32);

impl ClassId {
    pub const BASIC_OBJECT: ClassId = ClassId(0);
    pub const OBJECT: ClassId = ClassId(1);
    pub const MODULE: ClassId = ClassId(2);
    pub const CLASS: ClassId = ClassId(3);
    pub const NIL: ClassId = ClassId(4);
    pub const TRUE: ClassId = ClassId(5);
    pub const FALSE: ClassId = ClassId(6);
    pub const NUMERIC: ClassId = ClassId(7);
    pub const INTEGER: ClassId = ClassId(8);
    pub const FLOAT: ClassId = ClassId(9);
    pub const STRING: ClassId = ClassId(10);
    pub const SYMBOL: ClassId = ClassId(11);
    pub const ARRAY: ClassId = ClassId(12);

    /// Number of core classes.
    pub const CORE_COUNT: usize = 13;

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        ClassId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.0)
    }
}

/// Index of a method in the registry's method arena.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct MethodId(u32);

impl MethodId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        MethodId(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A free type variable of one generic signature.
///
/// Variables are minted by the registry and never shared between
/// signatures, so a binding map keyed by `TypeVar` cannot leak between
/// unrelated calls.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct TypeVar(u32);

impl TypeVar {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        TypeVar(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for TypeVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Index of an interned value list in the registry's [`ListPool`].
///
/// Equal lists intern to the same id, so ids compare like their contents.
///
/// [`ListPool`]: crate::ListPool
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct ListId(u32);

impl ListId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        ListId(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}
