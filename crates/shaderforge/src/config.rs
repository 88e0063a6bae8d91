use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::DEFAULT_CACHE_DIR;
use crate::types::{LinkStrategy, ShaderCompiler};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read pipeline config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse pipeline config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize pipeline config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to write pipeline config at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Knobs for the compile/link pipeline.
///
/// ```toml
/// cache-dir = "assets/cache/shader/opengl"
/// compiler = "naga"
/// optimize = true
/// link-strategy = "auto"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PipelineConfig {
    pub cache_dir: PathBuf,
    pub compiler: ShaderCompiler,
    /// Optimize the intermediate SPIR-V. The OpenGL pass never optimizes.
    pub optimize: bool,
    pub link_strategy: LinkStrategy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            compiler: ShaderCompiler::default(),
            optimize: true,
            link_strategy: LinkStrategy::default(),
        }
    }
}

impl PipelineConfig {
    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn persist(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(write_error)?;
        }
        let serialized = toml::to_string_pretty(self)?;
        fs::write(path, serialized).map_err(write_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let config = PipelineConfig::load_or_default(&temp.path().join("absent.toml")).unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.cache_dir, PathBuf::from("assets/cache/shader/opengl"));
        assert!(config.optimize);
        assert_eq!(config.link_strategy, LinkStrategy::Auto);
    }

    #[test]
    fn partial_files_keep_remaining_defaults() {
        let config = PipelineConfig::from_toml_str(
            "compiler = \"naga\"\nlink-strategy = \"program-binary\"\n",
        )
        .unwrap();
        assert_eq!(config.compiler, ShaderCompiler::NagaGlsl);
        assert_eq!(config.link_strategy, LinkStrategy::ProgramBinary);
        assert!(config.optimize);
        assert_eq!(config.cache_dir, PipelineConfig::default().cache_dir);
    }

    #[test]
    fn rejects_unknown_compilers() {
        let err = PipelineConfig::from_toml_str("compiler = \"fxc\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn persisted_config_loads_back() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("nested/forge.toml");
        let config = PipelineConfig {
            cache_dir: temp.path().join("cache"),
            compiler: ShaderCompiler::NagaGlsl,
            optimize: false,
            link_strategy: LinkStrategy::Spirv,
        };
        config.persist(&path).unwrap();
        assert_eq!(PipelineConfig::load_or_default(&path).unwrap(), config);
    }
}
