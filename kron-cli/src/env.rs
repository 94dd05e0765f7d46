//! `.env` loading
//!
//! Priority order (highest to lowest):
//! 1. Variables already set in the environment
//! 2. Current directory .env
//! 3. ~/.kron/.env

use std::path::PathBuf;

/// Load `.env` files; dotenvy never overwrites variables that are already set.
///
/// Runs before tracing is initialised, so it returns what it loaded instead
/// of logging.
pub fn load_dotenv() -> Vec<PathBuf> {
    let mut loaded = Vec::new();

    if let Ok(path) = dotenvy::dotenv() {
        loaded.push(path);
    }

    if let Some(env_file) = config_dir().map(|dir| dir.join(".env")) {
        if env_file.exists() && dotenvy::from_path(&env_file).is_ok() {
            loaded.push(env_file);
        }
    }

    loaded
}

/// Get the kron config directory path (~/.kron)
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".kron"))
}
