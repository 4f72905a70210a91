//! Engine configuration
//!
//! Resolution priority, highest first:
//! 1. Explicit overrides (command-line flags)
//! 2. `MESHSCRIPT_*` environment variables
//! 3. TOML file (`--config`, else `meshscript.toml` in the working directory)
//! 4. Built-in defaults

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{MeshScriptError, Result};
use crate::script::EngineVersion;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "meshscript.toml";

pub const ENV_ENGINE: &str = "MESHSCRIPT_ENGINE";
pub const ENV_ENGINE_VERSION: &str = "MESHSCRIPT_ENGINE_VERSION";
pub const ENV_TEMP_DIR: &str = "MESHSCRIPT_TEMP_DIR";
pub const ENV_TEMP_PREFIX: &str = "MESHSCRIPT_TEMP_PREFIX";

/// How the engine is found and where its transient files go
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine executable, looked up on `PATH` when not absolute
    pub executable: PathBuf,
    /// Version new scripts are generated for
    pub engine_version: EngineVersion,
    /// Directory for placeholder inputs, script artifacts and engine logs
    pub temp_dir: PathBuf,
    /// Name prefix of every transient file; abort-and-delete sweeps it
    pub temp_prefix: String,
    /// Pass engine output through to the terminal when no log file is set
    pub print_output: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("meshlabserver"),
            engine_version: EngineVersion::default(),
            temp_dir: PathBuf::from("."),
            temp_prefix: "TEMP3D_".to_string(),
            print_output: true,
        }
    }
}

/// Values given explicitly, e.g. on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub executable: Option<PathBuf>,
    pub engine_version: Option<EngineVersion>,
    pub temp_dir: Option<PathBuf>,
    pub temp_prefix: Option<String>,
    pub print_output: Option<bool>,
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => MeshScriptError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => MeshScriptError::Io(e),
        })?;
        debug!("Loaded engine config from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Resolve the full priority chain against the process environment
    pub fn resolve(config_file: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        Self::resolve_with(config_file, overrides, |key| std::env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup
    pub fn resolve_with<F>(
        config_file: Option<&Path>,
        overrides: &ConfigOverrides,
        env: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.is_file() {
                    Self::from_file(local)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(env)?;
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    fn apply_env<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(engine) = env(ENV_ENGINE) {
            self.executable = PathBuf::from(engine);
        }
        if let Some(version) = env(ENV_ENGINE_VERSION) {
            self.engine_version = version.parse()?;
        }
        if let Some(dir) = env(ENV_TEMP_DIR) {
            self.temp_dir = PathBuf::from(dir);
        }
        if let Some(prefix) = env(ENV_TEMP_PREFIX) {
            self.temp_prefix = prefix;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(executable) = &overrides.executable {
            self.executable = executable.clone();
        }
        if let Some(version) = overrides.engine_version {
            self.engine_version = version;
        }
        if let Some(dir) = &overrides.temp_dir {
            self.temp_dir = dir.clone();
        }
        if let Some(prefix) = &overrides.temp_prefix {
            self.temp_prefix = prefix.clone();
        }
        if let Some(print) = overrides.print_output {
            self.print_output = print;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.executable.as_os_str().is_empty() {
            return Err(MeshScriptError::Config("engine executable is empty".to_string()));
        }
        if self.temp_prefix.is_empty() {
            // An empty prefix would let abort-and-delete sweep the whole directory.
            return Err(MeshScriptError::Config("temp_prefix must not be empty".to_string()));
        }
        if self.temp_prefix.contains(['/', '\\']) {
            return Err(MeshScriptError::Config(format!(
                "temp_prefix '{}' must not contain path separators",
                self.temp_prefix
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.executable, PathBuf::from("meshlabserver"));
        assert_eq!(config.engine_version, EngineVersion::V2016_12);
        assert_eq!(config.temp_prefix, "TEMP3D_");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            executable = "/opt/meshlab/meshlabserver"
            engine_version = "1.3.4BETA"
            "#,
        )
        .unwrap();
        assert_eq!(config.executable, PathBuf::from("/opt/meshlab/meshlabserver"));
        assert_eq!(config.engine_version, EngineVersion::V1_3_4Beta);
        assert_eq!(config.temp_prefix, "TEMP3D_");
    }

    #[test]
    fn test_bad_toml_is_config_file_error() {
        let err = EngineConfig::from_toml_str("executable = [").unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_FILE_ERROR");
    }

    #[test]
    fn test_priority_chain() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("engine.toml");
        fs::write(
            &file,
            "executable = \"from-file\"\ntemp_prefix = \"FILE_\"\ntemp_dir = \"/tmp/file\"\n",
        )
        .unwrap();

        let env: HashMap<&str, &str> =
            [(ENV_ENGINE, "from-env"), (ENV_TEMP_PREFIX, "ENV_")].into_iter().collect();
        let overrides = ConfigOverrides {
            executable: Some(PathBuf::from("from-cli")),
            ..ConfigOverrides::default()
        };

        let config = EngineConfig::resolve_with(Some(&file), &overrides, |key| {
            env.get(key).map(|v| v.to_string())
        })
        .unwrap();

        assert_eq!(config.executable, PathBuf::from("from-cli"));
        assert_eq!(config.temp_prefix, "ENV_");
        assert_eq!(config.temp_dir, PathBuf::from("/tmp/file"));
    }

    #[test]
    fn test_resolve_errors() {
        let result = EngineConfig::resolve_with(
            Some(Path::new("/nonexistent/meshscript.toml")),
            &ConfigOverrides::default(),
            no_env,
        );
        assert!(matches!(result, Err(MeshScriptError::FileNotFound { .. })));

        let mut config = EngineConfig::default();
        let err = config
            .apply_env(|key| (key == ENV_ENGINE_VERSION).then(|| "9.9".to_string()))
            .unwrap_err();
        assert!(matches!(err, MeshScriptError::Config(_)));
    }

    #[test]
    fn test_empty_prefix_rejected() {
        let config = EngineConfig {
            temp_prefix: String::new(),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
