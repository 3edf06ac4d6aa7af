//! Configuration access port trait.

/// Typed lookups into a sectioned key/value configuration. Keys are
/// case-insensitive.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;

    /// Looks in `section` first, then among keys written before any section
    /// header.
    fn get_string_or_top_level(&self, section: &str, key: &str) -> Option<String> {
        let non_empty = |v: &String| !v.trim().is_empty();
        self.get_string(section, key)
            .filter(non_empty)
            .or_else(|| self.get_string(TOP_LEVEL_SECTION, key).filter(non_empty))
    }
}

/// Section name under which keys that precede any `[section]` header are
/// stored.
pub const TOP_LEVEL_SECTION: &str = "default";
