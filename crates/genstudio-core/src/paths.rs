use crate::error::StoreError;
use std::path::PathBuf;

const GENSTUDIO_DIR: &str = ".genstudio";
const PROFILE_FILE: &str = "profile.json";

/// Environment variable to override the GenStudio directory.
const GENSTUDIO_DIR_ENV: &str = "GENSTUDIO_DIR";

/// Resolve the GenStudio data directory.
/// Priority: GENSTUDIO_DIR env var > ~/.genstudio/
pub fn resolve_genstudio_dir() -> Result<PathBuf, StoreError> {
    if let Ok(dir) = std::env::var(GENSTUDIO_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|h| h.join(GENSTUDIO_DIR))
        .ok_or(StoreError::NoHomeDir)
}

/// Get the user profile path: ~/.genstudio/profile.json
pub fn profile_path() -> Result<PathBuf, StoreError> {
    Ok(resolve_genstudio_dir()?.join(PROFILE_FILE))
}
