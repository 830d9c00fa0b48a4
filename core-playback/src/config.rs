//! # Configuration Validation
//!
//! Checks a [`StreamConfig`] before any resource is touched.

use crate::error::{Result, SessionError};
use bridge_traits::StreamConfig;

/// Audio containers the engine can open.
pub const RECOGNIZED_EXTENSIONS: &[&str] = &["wav"];

/// Whether `path` ends with a recognized audio extension (case-insensitive).
pub fn has_recognized_extension(path: &str) -> bool {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let Some((stem, extension)) = file_name.rsplit_once('.') else {
        return false;
    };

    !stem.is_empty()
        && RECOGNIZED_EXTENSIONS
            .iter()
            .any(|known| extension.eq_ignore_ascii_case(known))
}

/// Reject configurations whose source cannot be played.
///
/// # Errors
///
/// [`SessionError::InvalidConfiguration`] if the source path is blank or
/// lacks a recognized extension.
pub fn validate_config(config: &StreamConfig) -> Result<()> {
    let path = config.source_path();

    if path.trim().is_empty() {
        return Err(SessionError::InvalidConfiguration(
            "source path is blank".to_string(),
        ));
    }

    if !has_recognized_extension(path.trim_end()) {
        return Err(SessionError::InvalidConfiguration(format!(
            "source path '{}' has no recognized audio extension (expected one of: {})",
            path,
            RECOGNIZED_EXTENSIONS.join(", ")
        )));
    }

    Ok(())
}
