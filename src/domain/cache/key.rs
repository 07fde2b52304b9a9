//! Cache key derivation for query results

use std::fmt::Debug;

use sha2::{Digest, Sha256};

use crate::domain::query::QueryDescription;

/// Trait for deriving cache keys from a query against an entity
///
/// Implementations must be pure: the same inputs always produce the same key,
/// across processes and restarts.
pub trait KeyDeriver: Send + Sync + Debug {
    /// Derives the key for `query` against `entity_alias` served by `source_name`
    fn derive(&self, source_name: &str, entity_alias: &str, query: &QueryDescription) -> String;
}

/// Key deriver hashing the normalized query with SHA-256
///
/// Keys look like `<source>_<entity>_<sha256 hex>`, with both names passed
/// through [`underscore`]. That readable prefix is lossy: `("default_user",
/// "Profile")` and `("default", "UserProfile")` share it, as do aliases that
/// differ only in case. The raw, length-prefixed names are therefore hashed
/// together with the query, so such pairs still get distinct keys.
#[derive(Debug, Clone, Default)]
pub struct QueryKeyDeriver;

impl QueryKeyDeriver {
    pub fn new() -> Self {
        Self
    }

    /// Hex digest of the raw names and the normalized query
    pub fn scoped_hash(source_name: &str, entity_alias: &str, query: &QueryDescription) -> String {
        let canonical = query.normalized().canonical_json();

        let mut hasher = Sha256::new();
        for part in [source_name, entity_alias] {
            hasher.update((part.len() as u64).to_be_bytes());
            hasher.update(part.as_bytes());
        }
        hasher.update(canonical.as_bytes());

        hex::encode(hasher.finalize())
    }
}

impl KeyDeriver for QueryKeyDeriver {
    fn derive(&self, source_name: &str, entity_alias: &str, query: &QueryDescription) -> String {
        format!(
            "{}_{}_{}",
            underscore(source_name),
            underscore(entity_alias),
            Self::scoped_hash(source_name, entity_alias, query)
        )
    }
}

/// Converts a camel cased word to its lowercase, underscored form
///
/// An underscore is inserted before every uppercase letter that follows a
/// word character, so `CacheData` becomes `cache_data` and `HTTPSource`
/// becomes `h_t_t_p_source`.
pub fn underscore(word: &str) -> String {
    let mut out = String::with_capacity(word.len() + 4);
    let mut prev: Option<char> = None;

    for c in word.chars() {
        if c.is_uppercase() && prev.is_some_and(|p| p.is_alphanumeric() || p == '_') {
            out.push('_');
        }
        out.extend(c.to_lowercase());
        prev = Some(c);
    }

    out
}
