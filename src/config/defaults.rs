/// Default configuration constants used across the system.

/// Default HTTP port of the caption endpoint.
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Default bind address of the caption endpoint.
pub const DEFAULT_HTTP_BIND: &str = "0.0.0.0";

/// Default long-polling timeout for Telegram updates.
pub const DEFAULT_POLL_TIMEOUT_SECS: u32 = 2;

/// Default directory holding the index files.
pub const DEFAULT_INDEX_DIR: &str = ".";

/// How long clients may cache an inline answer.
pub const DEFAULT_CACHE_TIME_SECS: u32 = 10;

/// Telegram accepts at most 50 results per inline answer.
pub const MAX_INLINE_RESULTS: usize = 50;

/// Default config file name.
pub const DEFAULT_CONFIG_FILE: &str = "memindex.json";
