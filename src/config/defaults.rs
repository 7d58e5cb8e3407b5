/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Database defaults
pub const DEFAULT_DATABASE_URL: &str = "sqlite://./data/rock.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_CONNECT_TIMEOUT: &str = "5s";

// Migration defaults
pub const DEFAULT_VERIFY_NAMES: bool = true;
pub const DEFAULT_TRANSLATION_BATCH_SIZE: u64 = 500;

// Logging defaults
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Environment overrides, e.g. ROCK_MIGRATE_DATABASE__URL
pub const ENV_PREFIX: &str = "ROCK_MIGRATE_";
pub const ENV_SEPARATOR: &str = "__";
