use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Civicdocs";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable carrying the Gemini API key.
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Gemini REST endpoint and default model for document analysis.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Bound on any single analyzer call. A slow AI endpoint must never
/// stall a human-driven review indefinitely.
pub const AI_TIMEOUT_SECS: u64 = 60;

/// Get the application data directory
/// ~/Civicdocs/ on all platforms (user-visible)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Civicdocs")
}

/// Path of the document database inside the data directory.
pub fn database_path() -> PathBuf {
    app_data_dir().join("documents.db")
}

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "civicdocs=info"
}
