//! Shared imports for std and no_std builds
//!
//! Every module pulls collections, `Rc` and the math helpers from here so the
//! `std` feature only has to be checked in one place.

// ═══════════════════════════════════════════════════════════════════════════════
// Core types (always available)
// ═══════════════════════════════════════════════════════════════════════════════

pub use core::{
    cell::{Ref, RefCell, RefMut},
    fmt, mem,
};

// ═══════════════════════════════════════════════════════════════════════════════
// Alloc types (conditional on std vs no_std)
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "std")]
pub use std::{
    boxed::Box,
    format,
    rc::Rc,
    string::{String, ToString},
    vec,
    vec::Vec,
};

#[cfg(not(feature = "std"))]
pub use alloc::{
    boxed::Box,
    format,
    rc::Rc,
    string::{String, ToString},
    vec,
    vec::Vec,
};

// ═══════════════════════════════════════════════════════════════════════════════
// FxHashMap/FxHashSet - use rustc-hash for std, hashbrown-backed for no_std
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "std")]
pub use rustc_hash::{FxHashMap, FxHashSet};

#[cfg(not(feature = "std"))]
pub type FxHashMap<K, V> =
    hashbrown::HashMap<K, V, core::hash::BuildHasherDefault<rustc_hash::FxHasher>>;

#[cfg(not(feature = "std"))]
pub type FxHashSet<T> =
    hashbrown::HashSet<T, core::hash::BuildHasherDefault<rustc_hash::FxHasher>>;

// ═══════════════════════════════════════════════════════════════════════════════
// IndexMap - use FxHasher for both std and no_std
// ═══════════════════════════════════════════════════════════════════════════════

pub type IndexMap<K, V> =
    indexmap::IndexMap<K, V, core::hash::BuildHasherDefault<rustc_hash::FxHasher>>;

/// Create an empty IndexMap
#[inline]
pub fn index_map_new<K, V>() -> IndexMap<K, V>
where
    K: core::hash::Hash + Eq,
{
    indexmap::IndexMap::with_hasher(Default::default())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Math functions - use std in std mode, libm in no_std mode
// ═══════════════════════════════════════════════════════════════════════════════

/// Math operations module providing cross-platform math functions
pub mod math {
    #[cfg(feature = "std")]
    #[inline]
    pub fn floor(x: f64) -> f64 {
        x.floor()
    }

    #[cfg(not(feature = "std"))]
    #[inline]
    pub fn floor(x: f64) -> f64 {
        libm::floor(x)
    }

    #[cfg(feature = "std")]
    #[inline]
    pub fn trunc(x: f64) -> f64 {
        x.trunc()
    }

    #[cfg(not(feature = "std"))]
    #[inline]
    pub fn trunc(x: f64) -> f64 {
        libm::trunc(x)
    }

    #[cfg(feature = "std")]
    #[inline]
    pub fn abs(x: f64) -> f64 {
        x.abs()
    }

    #[cfg(not(feature = "std"))]
    #[inline]
    pub fn abs(x: f64) -> f64 {
        libm::fabs(x)
    }

    #[cfg(feature = "std")]
    #[inline]
    pub fn rem_euclid(x: f64, y: f64) -> f64 {
        x.rem_euclid(y)
    }

    #[cfg(not(feature = "std"))]
    #[inline]
    pub fn rem_euclid(x: f64, y: f64) -> f64 {
        let r = libm::fmod(x, y);
        if r < 0.0 { r + libm::fabs(y) } else { r }
    }
}
