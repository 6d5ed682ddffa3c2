//! Environment precondition checks.
//!
//! Runs before anything is provisioned. A missing variable is fatal.

use tracing::info;

use crate::error::{Error, Result};

/// Check that every named variable is set and non-empty in the process
/// environment.
pub fn check_env_vars(names: &[&str]) -> Result<()> {
    check_env_vars_with(names, |name| std::env::var(name).ok())
}

/// Check that `lookup` returns a non-empty value for every name.
///
/// Stops at the first missing variable.
pub fn check_env_vars_with<F>(names: &[&str], lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    for name in names {
        match lookup(name) {
            Some(value) if !value.is_empty() => {
                info!("Using existing value for `{}` from environment", name);
            }
            _ => return Err(Error::MissingEnvVar((*name).to_string())),
        }
    }
    Ok(())
}
