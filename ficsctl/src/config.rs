//! Runtime settings for ficsctl.
//!
//! Every value has a compile-time default and can be overridden through an
//! environment variable; command-line flags take precedence over both.

use fics_protocol::config::DEFAULT_USERNAME;

/// Default log filter when neither `RUST_LOG` nor `FICSCTL_LOG` is set.
const DEFAULT_LOG_FILTER: &str = "warn";

/// Get the login name the parser answers prompts with.
///
/// Priority:
/// 1. `FICS_USERNAME` env variable if set
/// 2. `guest` as fallback
pub fn get_username() -> String {
    if let Ok(name) = std::env::var("FICS_USERNAME") {
        return name;
    }

    DEFAULT_USERNAME.to_string()
}

/// Get the password for a registered login, if any.
///
/// Reads `FICS_PASSWORD`; unset or empty means none.
pub fn get_password() -> Option<String> {
    std::env::var("FICS_PASSWORD").ok().filter(|p| !p.is_empty())
}

/// Get the tracing filter directive.
///
/// Priority:
/// 1. `RUST_LOG` env variable if set
/// 2. `FICSCTL_LOG` env variable if set
/// 3. `warn` as fallback
pub fn get_log_filter() -> String {
    if let Ok(filter) = std::env::var("RUST_LOG") {
        return filter;
    }
    if let Ok(filter) = std::env::var("FICSCTL_LOG") {
        return filter;
    }

    DEFAULT_LOG_FILTER.to_string()
}
