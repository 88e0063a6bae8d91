//! The seam between the pipeline and a live OpenGL context.
//!
//! [`GlDriver`] lists the handful of GL entry points the linker and the uniform
//! uploader need. The `gl` feature implements it as `GlContext` on top of the
//! `gl` crate; tests use a recording fake. Every call must happen on the thread
//! that owns the context.
//!
//! [`DriverCaps`] is queried once per context and handed to the pipeline
//! explicitly, so nothing downstream needs to touch driver-global state.
use std::fmt;

use tracing::debug;

use crate::types::{LinkStrategy, Stage};
use crate::uniform::UniformValue;

#[cfg(feature = "gl")]
mod gl_context;
#[cfg(test)]
pub(crate) mod mock;

#[cfg(feature = "gl")]
pub use gl_context::GlContext;

/// Vendor string fragment of drivers whose SPIR-V upload path is unreliable.
pub const PROGRAM_BINARY_VENDOR: &str = "ATI";

/// Linked program blob as returned by `glGetProgramBinary`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramBinary {
    pub format: u32,
    pub bytes: Vec<u8>,
}

/// GL entry points used by the pipeline.
pub trait GlDriver {
    type Program: Copy + fmt::Debug;
    type Shader: Copy + fmt::Debug;
    type UniformLocation;

    /// `GL_VENDOR`.
    fn vendor(&self) -> String;

    fn create_program(&self) -> Result<Self::Program, String>;
    fn delete_program(&self, program: Self::Program);
    fn create_shader(&self, stage: Stage) -> Result<Self::Shader, String>;
    fn delete_shader(&self, shader: Self::Shader);

    /// Uploads a SPIR-V module (`GL_SHADER_BINARY_FORMAT_SPIR_V`).
    fn shader_binary(&self, shader: Self::Shader, spirv: &[u32]);
    /// Selects the entry point of a SPIR-V shader, with no specialization
    /// constants.
    fn specialize_shader(&self, shader: Self::Shader, entry_point: &str);
    fn shader_source(&self, shader: Self::Shader, source: &str);
    fn compile_shader(&self, shader: Self::Shader);
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn link_program(&self, program: Self::Program);
    fn program_link_status(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;

    /// `GL_NUM_PROGRAM_BINARY_FORMATS`.
    fn program_binary_format_count(&self) -> i32;
    /// Sets `GL_PROGRAM_BINARY_RETRIEVABLE_HINT` ahead of linking. Drivers
    /// may hand back an empty blob without it.
    fn request_retrievable_binary(&self, _program: Self::Program) {}
    fn program_binary(&self, program: Self::Program) -> Option<ProgramBinary>;
    fn load_program_binary(&self, program: Self::Program, binary: &ProgramBinary);

    fn use_program(&self, program: Option<Self::Program>);
    fn uniform_location(&self, program: Self::Program, name: &str)
        -> Option<Self::UniformLocation>;
    fn upload_uniform(&self, location: &Self::UniformLocation, value: UniformValue<'_>);
}

/// Driver facts the pipeline branches on, captured once per context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverCaps {
    pub vendor: String,
    /// True when SPIR-V upload should be avoided in favour of compiling
    /// translated GLSL and caching the linked program binary.
    pub prefers_program_binary: bool,
}

impl DriverCaps {
    pub fn detect<D: GlDriver>(driver: &D) -> Self {
        let caps = Self::from_vendor(driver.vendor());
        debug!(
            vendor = %caps.vendor,
            program_binary = caps.prefers_program_binary,
            "queried driver capabilities"
        );
        caps
    }

    pub fn from_vendor(vendor: impl Into<String>) -> Self {
        let vendor = vendor.into();
        let prefers_program_binary = vendor.contains(PROGRAM_BINARY_VENDOR);
        Self {
            vendor,
            prefers_program_binary,
        }
    }

    /// Resolves a configured strategy against this driver.
    pub fn resolve(&self, strategy: LinkStrategy) -> LinkStrategy {
        match strategy {
            LinkStrategy::Auto if self.prefers_program_binary => LinkStrategy::ProgramBinary,
            LinkStrategy::Auto => LinkStrategy::Spirv,
            explicit => explicit,
        }
    }
}
