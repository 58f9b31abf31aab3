use std::collections::TryReserveError;
use thiserror::Error;

/// Recoverable creation failures.
///
/// Everything else this crate checks (release by a non-owner, blocking
/// from interrupt context, destroying an object with waiters) is a
/// programming defect and panics instead of returning an error.
#[derive(Debug, Error)]
pub enum CreateError {
    #[error("out of memory: {0}")]
    OutOfMemory(#[from] TryReserveError),
}

/// Fallibly copy a primitive's name. Sub-resources already built when a
/// later step fails are released by their own drops.
pub(crate) fn try_name(name: &str) -> Result<String, CreateError> {
    let mut owned = String::new();
    owned.try_reserve(name.len())?;
    owned.push_str(name);
    Ok(owned)
}
