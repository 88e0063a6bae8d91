//! Shader program pipeline for OpenGL renderers.
//!
//! A combined GLSL file with `#type vertex` / `#type fragment` sections is
//! turned into a linked, bindable program. Every compiled form is cached on
//! disk so later runs skip straight to linking:
//!
//! ```text
//!   file.glsl ──▶ split_stages ──▶ StageCompiler::intermediate ──▶ reflect
//!                                        │ Vulkan SPIR-V
//!                    ┌───────────────────┴────────────────────┐
//!                    ▼ LinkStrategy::Spirv                    ▼ LinkStrategy::ProgramBinary
//!      StageCompiler::target (GLSL 4.50 → GL SPIR-V)   spirv_to_glsl → driver compile
//!                    │                                        │
//!                    ▼                                        ▼
//!      ProgramLinker::link_spirv               ProgramLinker::link_program_binary
//!                    └──────────────▶ ShaderProgram ◀─────────┘
//! ```
//!
//! GL calls go through the [`GlDriver`] trait; enable the `gl` feature for
//! `GlContext`, an implementation on the `gl` crate. GLSL is compiled with
//! naga by default or with shaderc when the `shaderc` feature is on.

mod cache;
mod compile;
mod config;
mod driver;
mod error;
mod link;
mod program;
mod reflect;
mod source;
mod translate;
mod types;
mod uniform;

#[cfg(test)]
mod testing;

pub use cache::{CacheKind, ShaderCache, DEFAULT_CACHE_DIR};
pub use compile::{verify_spirv, StageCompiler, TargetEnv, TargetOutput};
pub use config::{ConfigError, PipelineConfig};
#[cfg(feature = "gl")]
pub use driver::GlContext;
pub use driver::{DriverCaps, GlDriver, ProgramBinary, PROGRAM_BINARY_VENDOR};
pub use error::{Result, ShaderError};
pub use link::ProgramLinker;
pub use program::{PipelineContext, ShaderProgram};
pub use reflect::{reflect, StageReflection, UniformBufferInfo};
pub use source::{program_name, read_source, split_stages, STAGE_MARKER};
pub use translate::{spirv_to_glsl, TARGET_GLSL_VERSION};
pub use types::{LinkStrategy, ShaderCompiler, Stage, StageBinaryMap, StageSourceMap};
pub use uniform::UniformValue;
