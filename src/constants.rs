// src/constants.rs

/// Wildcard character matching exactly one candidate character.
pub const WILDCARD_SINGLE: u8 = b'?';

/// Wildcard character matching zero or more candidate characters.
pub const WILDCARD_MULTI: u8 = b'*';

/// Maximum recursion depth for `${name}` template expansion.
pub const MAX_EXPANSION_DEPTH: u32 = 32;

/// Default maximum number of bytes read by the file value resolver.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 8192;

/// Property holding the separator used when a selection property must
/// represent every selected item as one string.
pub const MULTI_SEPARATOR_PROPERTY: &str = "selection.multi.separator";

/// Default multi-value separator when the property is unset.
pub const DEFAULT_MULTI_SEPARATOR: &str = "\n";

/// Prefix under which process environment variables are registered
/// as properties (e.g. `env.PATH`).
pub const ENV_PROPERTY_PREFIX: &str = "env.";

/// Poll interval for the blocking process wait loop.
pub const WAIT_POLL_INTERVAL_MS: u64 = 100;
