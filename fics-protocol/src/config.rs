//! Login settings for the message parser.

/// Username used when none is configured; logs in as a guest.
pub const DEFAULT_USERNAME: &str = "guest";

/// Credentials the parser answers login prompts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    pub username: String,
    /// Required for registered names; guests have none.
    pub password: Option<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
            password: None,
        }
    }
}

impl ParserConfig {
    pub fn new(username: impl Into<String>, password: Option<String>) -> Self {
        Self {
            username: username.into(),
            password: password.filter(|p| !p.is_empty()),
        }
    }

    pub fn is_guest(&self) -> bool {
        self.username.eq_ignore_ascii_case(DEFAULT_USERNAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_guest() {
        let config = ParserConfig::default();
        assert!(config.is_guest());
        assert_eq!(config.password, None);
    }

    #[test]
    fn test_empty_password_is_none() {
        let config = ParserConfig::new("someone", Some(String::new()));
        assert_eq!(config.password, None);
        assert!(!config.is_guest());
    }
}
