//! Environment variable expansion for configuration strings.
//!
//! Supports:
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

use std::sync::LazyLock;

use regex::Regex;

use crate::ConfigError;

/// Matches `${VAR}` references without a default value.
static REQUIRED_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Expand environment variable references in a string.
///
/// Returns the original string unchanged if no `${}` patterns are present.
/// Bare `$VAR` syntax is not expanded (only `${VAR}` with braces).
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    if let Some(missing) = REQUIRED_VAR
        .captures_iter(value)
        .map(|caps| caps[1].to_owned())
        .find(|name| std::env::var(name).is_err())
    {
        return Err(ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{missing}}} not set"),
        });
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, std::env::VarError> {
        Ok(std::env::var(var).ok())
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}}: {}", e.var_name, e.cause),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_simple_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("DOCGEN_TEST_SIMPLE", "hello");
        }
        let result = expand_env("${DOCGEN_TEST_SIMPLE}", "test.field").unwrap();
        assert_eq!(result, "hello");
        unsafe {
            std::env::remove_var("DOCGEN_TEST_SIMPLE");
        }
    }

    #[test]
    fn test_expand_with_default_uses_default() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("DOCGEN_TEST_UNSET");
        }
        let result = expand_env("${DOCGEN_TEST_UNSET:-fallback}", "test.field").unwrap();
        assert_eq!(result, "fallback");
    }

    #[test]
    fn test_expand_missing_var_error() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("DOCGEN_TEST_MISSING");
        }
        let err = expand_env("${DOCGEN_TEST_MISSING}", "site.name").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("DOCGEN_TEST_MISSING"));
        assert!(err.to_string().contains("site.name"));
    }

    #[test]
    fn test_expand_literal_unchanged() {
        let result = expand_env("literal string", "test.field").unwrap();
        assert_eq!(result, "literal string");
    }

    #[test]
    fn test_expand_embedded_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("DOCGEN_TEST_SCOPE", "fkui");
        }
        let result = expand_env("@${DOCGEN_TEST_SCOPE}/icon-lib", "examples.icon_lib").unwrap();
        assert_eq!(result, "@fkui/icon-lib");
        unsafe {
            std::env::remove_var("DOCGEN_TEST_SCOPE");
        }
    }
}
