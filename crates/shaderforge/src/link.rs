use tracing::{debug, error};

use crate::cache::ShaderCache;
use crate::compile::StageCompiler;
use crate::driver::GlDriver;
use crate::error::{Result, ShaderError};
use crate::types::{Stage, StageBinaryMap};

/// Entry point every stage is specialized to.
const ENTRY_POINT: &str = "main";

/// Turns compiled stages into a linked GL program.
pub struct ProgramLinker<'a, D: GlDriver> {
    driver: &'a D,
    cache: &'a ShaderCache,
    identity: &'a str,
}

impl<'a, D: GlDriver> ProgramLinker<'a, D> {
    pub fn new(driver: &'a D, cache: &'a ShaderCache, identity: &'a str) -> Self {
        Self {
            driver,
            cache,
            identity,
        }
    }

    /// Uploads OpenGL-targeted SPIR-V per stage and links it.
    ///
    /// On failure every object created here is deleted and no program is
    /// returned.
    pub fn link_spirv(&self, binaries: &StageBinaryMap) -> Result<D::Program> {
        let program = self.driver.create_program().map_err(ShaderError::Driver)?;
        let mut shaders = Vec::with_capacity(binaries.len());
        for (&stage, spirv) in binaries {
            let shader = match self.driver.create_shader(stage) {
                Ok(shader) => shader,
                Err(err) => {
                    self.discard(program, &shaders);
                    return Err(ShaderError::Driver(err));
                }
            };
            shaders.push(shader);
            self.driver.shader_binary(shader, spirv);
            self.driver.specialize_shader(shader, ENTRY_POINT);
            self.driver.attach_shader(program, shader);
        }

        self.driver.link_program(program);
        if !self.driver.program_link_status(program) {
            let log = self.driver.program_info_log(program);
            error!(shader = self.identity, "Shader linking failed:\n{log}");
            self.discard(program, &shaders);
            return Err(ShaderError::Link {
                identity: self.identity.to_string(),
                log,
            });
        }

        for &shader in &shaders {
            self.driver.detach_shader(program, shader);
            self.driver.delete_shader(shader);
        }
        debug!(shader = self.identity, ?program, "linked SPIR-V program");
        Ok(program)
    }

    /// Links through the driver's own GLSL compiler and caches the linked
    /// program binary, or restores a previously cached binary.
    ///
    /// This path consumes the intermediate SPIR-V directly; the OpenGL-targeted
    /// SPIR-V pass is not needed.
    pub fn link_program_binary(
        &self,
        compiler: &StageCompiler<'_>,
        intermediate: &StageBinaryMap,
    ) -> Result<D::Program> {
        let cached_path = self.cache.program_path(self.identity);
        let program = self.driver.create_program().map_err(ShaderError::Driver)?;

        if let Some(binary) = self.cache.load_program(&cached_path) {
            self.driver.load_program_binary(program, &binary);
            self.verify_link(program)?;
            debug!(shader = self.identity, format = binary.format, "restored cached program binary");
            return Ok(program);
        }

        let mut shaders = Vec::with_capacity(intermediate.len());
        for (&stage, spirv) in intermediate {
            match self.compile_from_glsl(compiler, program, stage, spirv) {
                Ok(shader) => shaders.push(shader),
                Err(err) => {
                    self.discard(program, &shaders);
                    return Err(err);
                }
            }
        }

        self.driver.request_retrievable_binary(program);
        self.driver.link_program(program);
        let linked = self.verify_link(program);
        for &shader in &shaders {
            if linked.is_ok() {
                self.driver.detach_shader(program, shader);
            }
            self.driver.delete_shader(shader);
        }
        linked?;

        if self.driver.program_binary_format_count() <= 0 {
            self.driver.delete_program(program);
            return Err(ShaderError::NoBinaryFormats);
        }
        match self.driver.program_binary(program) {
            Some(binary) => self.cache.store_program(&cached_path, &binary),
            None => debug!(shader = self.identity, "driver returned no program binary"),
        }
        debug!(shader = self.identity, ?program, "linked program from translated GLSL");
        Ok(program)
    }

    fn compile_from_glsl(
        &self,
        compiler: &StageCompiler<'_>,
        program: D::Program,
        stage: Stage,
        spirv: &[u32],
    ) -> Result<D::Shader> {
        let glsl = compiler.translate(stage, spirv)?;
        let shader = self.driver.create_shader(stage).map_err(ShaderError::Driver)?;
        self.driver.shader_source(shader, &glsl);
        self.driver.compile_shader(shader);
        if !self.driver.shader_compile_status(shader) {
            let log = self.driver.shader_info_log(shader);
            self.driver.delete_shader(shader);
            error!(shader = self.identity, %stage, "Shader compilation failure:\n{log}");
            return Err(ShaderError::StageCompile {
                identity: self.identity.to_string(),
                stage,
                log,
            });
        }
        self.driver.attach_shader(program, shader);
        Ok(shader)
    }

    /// Checks link status; a failed program is deleted before returning.
    fn verify_link(&self, program: D::Program) -> Result<()> {
        if self.driver.program_link_status(program) {
            return Ok(());
        }
        let log = self.driver.program_info_log(program);
        self.driver.delete_program(program);
        error!(shader = self.identity, "Shader link failure:\n{log}");
        Err(ShaderError::Link {
            identity: self.identity.to_string(),
            log,
        })
    }

    fn discard(&self, program: D::Program, shaders: &[D::Shader]) {
        self.driver.delete_program(program);
        for &shader in shaders {
            self.driver.delete_shader(shader);
        }
    }
}
