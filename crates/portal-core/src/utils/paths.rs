use std::path::PathBuf;

/// Standardized application directories for the portal client.
///
/// - User-level config: `config.toml` in the OS-specific config dir
/// - User-level data: persisted client state and log files
pub struct AppPaths;

impl AppPaths {
    /// Return the user-level config directory (platform-specific)
    pub fn user_config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "portal").map(|d| d.config_dir().to_path_buf())
    }

    /// Return the user-level data directory (platform-specific)
    pub fn user_data_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "portal").map(|d| d.data_dir().to_path_buf())
    }

    /// Return the user-level config file path
    pub fn user_config_file() -> Option<PathBuf> {
        Self::user_config_dir().map(|d| d.join("config.toml"))
    }

    /// Directory holding one JSON file per persisted state key
    pub fn state_dir() -> Option<PathBuf> {
        Self::user_data_dir().map(|d| d.join("state"))
    }

    pub fn log_dir() -> Option<PathBuf> {
        Self::user_data_dir().map(|d| d.join("logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_and_log_dirs_live_under_data_dir() {
        let Some(data) = AppPaths::user_data_dir() else {
            return;
        };
        assert_eq!(AppPaths::state_dir(), Some(data.join("state")));
        assert_eq!(AppPaths::log_dir(), Some(data.join("logs")));
    }

    #[test]
    fn config_file_is_toml_in_config_dir() {
        if let (Some(dir), Some(file)) = (AppPaths::user_config_dir(), AppPaths::user_config_file()) {
            assert_eq!(file, dir.join("config.toml"));
        }
    }
}
