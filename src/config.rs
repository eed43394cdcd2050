//! Run configuration
//!
//! Connection settings and profiling knobs shared by every phase
//! of a benchmark run.

/// Default connection string for a local server
pub const DEFAULT_URI: &str = "mongodb://localhost:27017";

/// Database holding the demo dataset
pub const DEFAULT_DATABASE: &str = "books";

/// Default slow-query threshold, in milliseconds
pub const DEFAULT_SLOW_MS: i64 = 5;

/// Default number of slow queries to display
pub const DEFAULT_SLOW_LIMIT: usize = 10;

/// Configuration of a benchmark run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    /// Connection string of the document store
    pub uri: String,
    /// Name of the database holding the working collections
    pub database: String,
    /// Profiling threshold: operations slower than this are logged
    pub slow_ms: i64,
    /// Number of slow queries shown per phase
    pub slow_limit: usize,
    /// Whether to wait for the user between phases
    pub pause: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            uri: DEFAULT_URI.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            slow_ms: DEFAULT_SLOW_MS,
            slow_limit: DEFAULT_SLOW_LIMIT,
            pause: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_target_local_books_database() {
        let config = BenchConfig::default();
        assert_eq!(config.uri, "mongodb://localhost:27017");
        assert_eq!(config.database, "books");
        assert_eq!(config.slow_ms, 5);
        assert_eq!(config.slow_limit, 10);
        assert!(config.pause);
    }
}
