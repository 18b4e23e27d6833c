//! Cache Key Module
//!
//! Canonical key derivation shared by both cache stores.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::fizzbuzz::FizzBuzzParams;

/// Version tag of the key layout, bumped whenever the layout changes.
const KEY_VERSION: &str = "fb1";

// == Cache Key ==
/// Canonical cache key derived from the full set of request parameters.
///
/// Strings are length-prefixed so that no two parameter sets can render to
/// the same key. Equality and hashing only look at the canonical form; the
/// parameters travel along so the refresh worker can recompute the value.
#[derive(Debug, Clone)]
pub struct CacheKey {
    canonical: Arc<str>,
    params: Arc<FizzBuzzParams>,
}

impl CacheKey {
    // == Constructor ==
    /// Derives the key for `params`. Pure, no side effects.
    pub fn from_params(params: &FizzBuzzParams) -> Self {
        let canonical = format!(
            "{}|limit={}|nb_one={}|nb_two={}|str_one={}:{}|str_two={}:{}|format={}",
            KEY_VERSION,
            params.limit,
            params.nb_one,
            params.nb_two,
            params.str_one.len(),
            params.str_one,
            params.str_two.len(),
            params.str_two,
            params.format.as_str(),
        );

        Self {
            canonical: canonical.into(),
            params: Arc::new(params.clone()),
        }
    }

    /// The canonical string form used as the store key.
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// The parameters this key was derived from.
    pub fn params(&self) -> &FizzBuzzParams {
        &self.params
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}
