use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A single programmable pipeline stage.
///
/// Ordering is vertex first so maps keyed by stage iterate in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Vertex,
    Fragment,
}

/// Raw GLSL per stage, as produced by [`crate::split_stages`].
pub type StageSourceMap = BTreeMap<Stage, String>;

/// SPIR-V words per stage.
pub type StageBinaryMap = BTreeMap<Stage, Vec<u32>>;

impl Stage {
    /// Maps a `#type` declaration name onto a stage. `pixel` is accepted as an
    /// alias for the fragment stage.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "vertex" => Some(Self::Vertex),
            "fragment" | "pixel" => Some(Self::Fragment),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        }
    }

    pub(crate) fn naga(self) -> naga::ShaderStage {
        match self {
            Self::Vertex => naga::ShaderStage::Vertex,
            Self::Fragment => naga::ShaderStage::Fragment,
        }
    }

    /// Suffix shared by the per-stage cache extensions.
    pub(crate) fn cache_suffix(self) -> &'static str {
        match self {
            Self::Vertex => "vert",
            Self::Fragment => "frag",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shader compilation backend used for GLSL to SPIR-V.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShaderCompiler {
    /// Compile GLSL through shaderc (glslang + spirv-opt).
    #[serde(rename = "shaderc")]
    Shaderc,
    /// Hand GLSL to naga's built-in frontend and emit SPIR-V with its backend.
    #[serde(rename = "naga")]
    NagaGlsl,
}

impl ShaderCompiler {
    pub fn is_available(self) -> bool {
        match self {
            ShaderCompiler::Shaderc => cfg!(feature = "shaderc"),
            ShaderCompiler::NagaGlsl => true,
        }
    }
}

impl Default for ShaderCompiler {
    fn default() -> Self {
        if cfg!(feature = "shaderc") {
            ShaderCompiler::Shaderc
        } else {
            ShaderCompiler::NagaGlsl
        }
    }
}

impl fmt::Display for ShaderCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderCompiler::Shaderc => f.write_str("shaderc"),
            ShaderCompiler::NagaGlsl => f.write_str("naga"),
        }
    }
}

impl FromStr for ShaderCompiler {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "shaderc" => Ok(ShaderCompiler::Shaderc),
            "naga" | "naga-glsl" => Ok(ShaderCompiler::NagaGlsl),
            other => Err(format!(
                "unknown shader compiler '{other}' (expected 'shaderc' or 'naga')"
            )),
        }
    }
}

/// How compiled stages are turned into a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkStrategy {
    /// Pick per driver: program-binary caching for vendors with unreliable
    /// SPIR-V upload, SPIR-V upload everywhere else.
    #[default]
    Auto,
    /// Always upload OpenGL-flavoured SPIR-V per stage.
    Spirv,
    /// Always compile translated GLSL and cache the linked program binary.
    ProgramBinary,
}

impl fmt::Display for LinkStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkStrategy::Auto => f.write_str("auto"),
            LinkStrategy::Spirv => f.write_str("spirv"),
            LinkStrategy::ProgramBinary => f.write_str("program-binary"),
        }
    }
}

impl FromStr for LinkStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(LinkStrategy::Auto),
            "spirv" => Ok(LinkStrategy::Spirv),
            "program-binary" | "binary" => Ok(LinkStrategy::ProgramBinary),
            other => Err(format!(
                "unknown link strategy '{other}' (expected 'auto', 'spirv', or 'program-binary')"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_is_a_fragment_alias() {
        assert_eq!(Stage::from_name("pixel"), Some(Stage::Fragment));
        assert_eq!(Stage::from_name("fragment"), Some(Stage::Fragment));
        assert_eq!(Stage::from_name("vertex"), Some(Stage::Vertex));
        assert_eq!(Stage::from_name("geometry"), None);
        assert_eq!(Stage::from_name("Vertex"), None);
    }

    #[test]
    fn stages_iterate_in_pipeline_order() {
        let mut map = StageSourceMap::new();
        map.insert(Stage::Fragment, "f".into());
        map.insert(Stage::Vertex, "v".into());
        let order: Vec<_> = map.keys().copied().collect();
        assert_eq!(order, vec![Stage::Vertex, Stage::Fragment]);
    }

    #[test]
    fn parses_compiler_names() {
        assert_eq!("naga".parse::<ShaderCompiler>(), Ok(ShaderCompiler::NagaGlsl));
        assert_eq!("Shaderc".parse::<ShaderCompiler>(), Ok(ShaderCompiler::Shaderc));
        assert!("glslang".parse::<ShaderCompiler>().is_err());
        assert!(ShaderCompiler::NagaGlsl.is_available());
    }

    #[test]
    fn parses_link_strategies() {
        assert_eq!("auto".parse::<LinkStrategy>(), Ok(LinkStrategy::Auto));
        assert_eq!(
            "program-binary".parse::<LinkStrategy>(),
            Ok(LinkStrategy::ProgramBinary)
        );
        assert!("vendor".parse::<LinkStrategy>().is_err());
    }
}
