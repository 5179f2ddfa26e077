//! Environment constants and path utilities for the persona engine.
//!
//! This module centralizes the file names, directory names, and
//! environment-variable names used throughout the application, making
//! them easier to maintain and modify.

use std::path::{Path, PathBuf};

/// Main application directory name (hidden directory like .git, .vscode)
pub const ENGINE_DIR_NAME: &str = ".persona-engine";

/// Configuration file name inside the engine directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Plain configuration file name checked in the working directory
pub const LOCAL_CONFIG_FILE_NAME: &str = "persona-engine.toml";

/// Environment variables consulted for provider credentials when the
/// configuration file carries no key.
pub mod api_keys {
    pub const ANTHROPIC: &str = "ANTHROPIC_API_KEY";
    pub const OPENAI: &str = "OPENAI_API_KEY";
    pub const GEMINI: &str = "GEMINI_API_KEY";
}

/// Build the engine directory path from a base directory
pub fn engine_dir_path(base: &Path) -> PathBuf {
    base.join(ENGINE_DIR_NAME)
}

/// Build config file path in the user's home directory
pub fn user_config_file_path(home_dir: &Path) -> PathBuf {
    engine_dir_path(home_dir).join(CONFIG_FILE_NAME)
}

/// Build the hidden config file path in the current directory
pub fn local_config_file_path(current_dir: &Path) -> PathBuf {
    engine_dir_path(current_dir).join(CONFIG_FILE_NAME)
}

/// Build the plain config file path in the current directory
pub fn plain_config_file_path(current_dir: &Path) -> PathBuf {
    current_dir.join(LOCAL_CONFIG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_config_paths() {
        let home_dir = Path::new("/home/user");
        let current_dir = Path::new("/current/project");

        assert_eq!(
            user_config_file_path(home_dir),
            Path::new("/home/user/.persona-engine/config.toml")
        );

        assert_eq!(
            local_config_file_path(current_dir),
            Path::new("/current/project/.persona-engine/config.toml")
        );

        assert_eq!(
            plain_config_file_path(current_dir),
            Path::new("/current/project/persona-engine.toml")
        );
    }
}
