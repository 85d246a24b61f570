//! Engine-wide limits and conventions.

/// Retries allowed after the first attempt of a frame before it fails.
pub const MAX_RETRY: usize = 5;

/// Deepest nesting level a recursively required script may run at.
pub const MAX_DEPTH: usize = 30;

/// Directory name that marks the shared platform-modules area.
pub const MODULES_DIR: &str = "lua_modules";

/// Sandbox marker characters stripped from requests before resolution.
pub const REQUEST_MARKERS: &[char] = &['!'];

/// Registry key of the per-VM platform module cache.
pub const PLATFORM_CACHE_KEY: &str = "__relua_platform_modules";
