use serde::Serialize;
use std::sync::Arc;

/// Cache key: canonical JSON text of the value it was derived from.
pub type CacheKey = Arc<str>;

#[derive(Debug, Default, Clone, Copy)]
pub struct CacheKeyGenerator;

impl CacheKeyGenerator {
    /// Key for a plain name (table names, slugs). Surrounding whitespace is ignored.
    pub fn generate_text(text: impl AsRef<str>) -> Option<CacheKey> {
        Some(text.as_ref().trim())
            .filter(|t| !t.is_empty())
            .map(Arc::from)
    }

    /// Key for an arbitrary filter or query descriptor.
    ///
    /// Object fields are sorted recursively, so field order never changes the key; array
    /// order does. Returns `None` for `null` or values that cannot be serialized.
    pub fn generate_json(value: &impl Serialize) -> Option<CacheKey> {
        let mut normalized = serde_json::to_value(value).ok()?;
        if normalized.is_null() {
            return None;
        }
        normalized.sort_all_objects();
        serde_json::to_string(&normalized).ok().map(Arc::from)
    }
}
