//! `${VAR}` and `${VAR:-default}` expansion for configuration strings.

use crate::ConfigError;

/// Name of the variable that could not be resolved.
struct UnsetVariable(String);

/// Expand environment references in `value`.
///
/// Only the braced forms are recognized; a bare `$name` is left alone so
/// that URL paths containing dollar signs survive unchanged. `field` names
/// the configuration key in the error message.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    let lookup = |name: &str| -> Result<Option<String>, UnsetVariable> {
        std::env::var(name)
            .map(Some)
            .map_err(|_| UnsetVariable(name.to_owned()))
    };

    shellexpand::env_with_context(value, lookup)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.cause.0),
        })
}
