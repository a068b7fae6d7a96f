//! Cache key normalization.
//!
//! Normalized keys have the form `c:<cache name>,k:<prefix><key>`. The prefix
//! is used verbatim; no separator is inserted between it and the key.

/// Builds the normalized store key for `key`.
#[must_use]
pub fn normalize_key(cache_name: &str, key_prefix: &str, key: &str) -> String {
    format!("c:{},k:{}{}", cache_name, key_prefix, key)
}

/// Key builder bound to one cache name and prefix.
#[derive(Debug, Clone)]
pub struct KeyNormalizer {
    cache_name: String,
    key_prefix: String,
}

impl KeyNormalizer {
    /// Create a new key builder.
    pub fn new(cache_name: impl Into<String>, key_prefix: impl Into<String>) -> Self {
        Self {
            cache_name: cache_name.into(),
            key_prefix: key_prefix.into(),
        }
    }

    /// The cache (type) name of the `c:` segment.
    #[must_use]
    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    /// The deployment prefix of the `k:` segment.
    #[must_use]
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Normalize a single key.
    #[must_use]
    pub fn normalize(&self, key: &str) -> String {
        normalize_key(&self.cache_name, &self.key_prefix, key)
    }

    /// Normalize keys, preserving order.
    pub fn normalize_all<'a, I>(&self, keys: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        keys.into_iter().map(|key| self.normalize(key)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key_is_plain_concatenation() {
        assert_eq!(normalize_key("Item", "env1:", "42"), "c:Item,k:env1:42");
        assert_eq!(normalize_key("Item", "", "42"), "c:Item,k:42");
        assert_eq!(normalize_key("Item", "pre", ""), "c:Item,k:pre");
    }

    #[test]
    fn test_prefix_used_verbatim() {
        let keys = KeyNormalizer::new("RealtimeOnline", "162.HNSC.VOC.II ");
        assert_eq!(
            keys.normalize("E1,D1,P1,S30"),
            "c:RealtimeOnline,k:162.HNSC.VOC.II E1,D1,P1,S30"
        );

        let keys = KeyNormalizer::new("RealtimeOnline", "162.HNSC.VOC.II");
        assert_eq!(
            keys.normalize("E1,D1,P1,S30"),
            "c:RealtimeOnline,k:162.HNSC.VOC.IIE1,D1,P1,S30"
        );
    }

    #[test]
    fn test_type_name_separates_caches() {
        let a = KeyNormalizer::new("A", "p");
        let b = KeyNormalizer::new("B", "p");
        assert_ne!(a.normalize("same"), b.normalize("same"));
    }

    #[test]
    fn test_normalize_all_preserves_order() {
        let keys = KeyNormalizer::new("T", "x:");
        let normalized = keys.normalize_all(["b", "a", "b"]);
        assert_eq!(normalized, vec!["c:T,k:x:b", "c:T,k:x:a", "c:T,k:x:b"]);
    }
}
