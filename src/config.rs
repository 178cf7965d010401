use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "solarplan";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Staging database filename.
pub const DB_FILE: &str = "ocr_data.db";

/// Seconds between Gemini calls. The free tier allows two requests per
/// minute, so 31 seconds keeps a run just under the limit.
pub const DEFAULT_THROTTLE_SECS: u64 = 31;

/// Cheap, fast model for the relevance router.
pub const ROUTER_MODEL: &str = "gemini-2.5-flash-lite";
/// Model for full structured extraction.
pub const EXTRACTION_MODEL: &str = "gemini-flash-latest";
/// Vision-capable model for OCR of rendered pages.
pub const VISION_MODEL: &str = "gemini-2.5-flash";

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "solarplan=info"
}

/// Get the application data directory (~/solarplan/ on all platforms).
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join(APP_NAME)
}

/// Path to the staging database. Overridable via SOLARPLAN_DB.
pub fn database_path() -> PathBuf {
    match std::env::var_os("SOLARPLAN_DB") {
        Some(path) => PathBuf::from(path),
        None => app_data_dir().join(DB_FILE),
    }
}

/// Gemini API key from the environment, if set.
pub fn gemini_api_key() -> Option<String> {
    std::env::var("GEMINI_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty())
}

/// Gemini API base URL. Overridable via GEMINI_BASE_URL (used by tests
/// and by proxies).
pub fn gemini_base_url() -> String {
    std::env::var("GEMINI_BASE_URL")
        .ok()
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with(APP_NAME));
    }

    #[test]
    fn default_database_path_uses_db_file() {
        // Only meaningful when the override is unset in the test environment
        if std::env::var_os("SOLARPLAN_DB").is_none() {
            assert!(database_path().ends_with(DB_FILE));
        }
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn default_base_url_is_google() {
        if std::env::var_os("GEMINI_BASE_URL").is_none() {
            assert!(gemini_base_url().contains("generativelanguage"));
        }
    }
}
