use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Read and parse an environment variable.
///
/// Returns `Ok(None)` when the variable is unset or empty and an error
/// naming the variable when it is set but does not parse.
pub fn parse_env<T>(key: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid {key} environment variable: {e}")),
        Err(_) => Ok(None),
    }
}

/// Read an environment variable, treating an empty value as unset.
pub fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
