use std::time::Duration;

/// Tunables for one typeahead controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeaheadConfig {
    /// Quiet period after the last keystroke before a query is committed.
    pub debounce: Duration,
    pub max_results: usize,
    /// Committed queries shorter than this (in chars) stay idle.
    pub min_chars: usize,
    pub cache_capacity: usize,
}

impl Default for TypeaheadConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(220),
            max_results: 10,
            min_chars: 1,
            cache_capacity: 100,
        }
    }
}

impl TypeaheadConfig {
    /// Defaults overridden by `LEDE_DEBOUNCE_MS`, `LEDE_MAX_RESULTS`,
    /// `LEDE_MIN_CHARS` and `LEDE_CACHE_CAP`.
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let num = |k: &str| get(k).and_then(|s| s.trim().parse::<u64>().ok());
        Self {
            debounce: num("LEDE_DEBOUNCE_MS").map(Duration::from_millis).unwrap_or(d.debounce),
            max_results: num("LEDE_MAX_RESULTS").map(|n| n as usize).unwrap_or(d.max_results),
            min_chars: num("LEDE_MIN_CHARS").map(|n| (n as usize).max(1)).unwrap_or(d.min_chars),
            cache_capacity: num("LEDE_CACHE_CAP").map(|n| n as usize).unwrap_or(d.cache_capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn env_overrides_and_ignores_garbage() {
        let env: HashMap<&str, &str> = [
            ("LEDE_DEBOUNCE_MS", "50"),
            ("LEDE_MAX_RESULTS", "nope"),
            ("LEDE_MIN_CHARS", "0"),
            ("LEDE_CACHE_CAP", " 7 "),
        ]
        .into_iter()
        .collect();
        let cfg = TypeaheadConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.debounce, Duration::from_millis(50));
        assert_eq!(cfg.max_results, 10);
        assert_eq!(cfg.min_chars, 1);
        assert_eq!(cfg.cache_capacity, 7);
    }

    #[test]
    fn empty_env_is_default() {
        assert_eq!(TypeaheadConfig::from_lookup(|_| None), TypeaheadConfig::default());
    }
}
