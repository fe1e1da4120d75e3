use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;
use tracing::debug;

use super::{types::Config, ConfigError};

/// Prefix of environment overrides; `__` separates nesting levels.
pub const ENV_PREFIX: &str = "CHAPTERBAY_";

fn env_overrides() -> Env {
    Env::prefixed(ENV_PREFIX).split("__")
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(env_overrides())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Like [`load_config`], but a missing file means built-in defaults.
pub fn load_config_or_default(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        debug!(path = %path.display(), "No configuration file, using defaults");
    }

    Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(env_overrides())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[library]
root_dir = "/media/one-pace"

[session]
max_concurrent_jobs = 3
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.library.root_dir, Path::new("/media/one-pace"));
        assert_eq!(config.session.max_concurrent_jobs, 3);
    }

    #[test]
    fn test_load_config_from_str_bad_type() {
        let result = load_config_from_str("[session]\nmax_concurrent_jobs = \"many\"\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/chapterbay.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        Jail::expect_with(|_jail| {
            let config = load_config_or_default(Path::new("absent.toml")).unwrap();
            assert_eq!(config.session.max_concurrent_jobs, 5);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "chapterbay.toml",
                r#"
[library]
root_dir = "/from/file"

[session]
max_concurrent_jobs = 3
"#,
            )?;
            jail.set_env("CHAPTERBAY_SESSION__MAX_CONCURRENT_JOBS", "8");
            jail.set_env("CHAPTERBAY_SOURCE__BASE_URL", "http://mirror.local");

            let config = load_config(Path::new("chapterbay.toml")).unwrap();
            assert_eq!(config.library.root_dir, Path::new("/from/file"));
            assert_eq!(config.session.max_concurrent_jobs, 8);
            assert_eq!(config.source.base_url, "http://mirror.local");
            Ok(())
        });
    }
}
