use std::path::Path;
use std::rc::Rc;
use std::time::Instant;

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use tracing::{debug, info, trace, warn};

use crate::cache::ShaderCache;
use crate::compile::StageCompiler;
use crate::config::PipelineConfig;
use crate::driver::{DriverCaps, GlDriver};
use crate::error::Result;
use crate::link::ProgramLinker;
use crate::source::{program_name, read_source, split_stages};
use crate::types::{LinkStrategy, Stage, StageSourceMap};
use crate::uniform::UniformValue;

/// Everything program construction needs from the outside: the GL context,
/// its capabilities, and the pipeline configuration.
///
/// Capabilities are queried once here instead of on every program build.
pub struct PipelineContext<D: GlDriver> {
    driver: Rc<D>,
    caps: DriverCaps,
    config: PipelineConfig,
    cache: ShaderCache,
}

impl<D: GlDriver> PipelineContext<D> {
    pub fn new(driver: Rc<D>, config: PipelineConfig) -> Self {
        let caps = DriverCaps::detect(driver.as_ref());
        Self::with_caps(driver, caps, config)
    }

    pub fn with_caps(driver: Rc<D>, caps: DriverCaps, config: PipelineConfig) -> Self {
        let cache = ShaderCache::new(config.cache_dir.clone());
        Self {
            driver,
            caps,
            config,
            cache,
        }
    }

    pub fn driver(&self) -> &Rc<D> {
        &self.driver
    }

    pub fn caps(&self) -> &DriverCaps {
        &self.caps
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn cache(&self) -> &ShaderCache {
        &self.cache
    }

    /// Strategy actually used for this driver.
    pub fn link_strategy(&self) -> LinkStrategy {
        self.caps.resolve(self.config.link_strategy)
    }
}

/// A linked GL program built from GLSL stages.
///
/// The program is deleted when this value is dropped.
pub struct ShaderProgram<D: GlDriver> {
    driver: Rc<D>,
    handle: D::Program,
    name: String,
}

impl<D: GlDriver> ShaderProgram<D> {
    /// Builds a program from a combined `#type`-sectioned shader file.
    ///
    /// The program is named after the file stem; the cache is keyed by the
    /// full file name.
    pub fn from_file(context: &PipelineContext<D>, path: &Path) -> Result<Self> {
        let started = Instant::now();
        let source = read_source(path)?;
        let sources = split_stages(&source)?;
        let identity = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let program = Self::build(context, program_name(path), &identity, &sources)?;
        info!(
            shader = %program.name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "shader creation finished"
        );
        Ok(program)
    }

    /// Builds a program from separate vertex and fragment sources. `name`
    /// doubles as the cache identity.
    pub fn from_sources(
        context: &PipelineContext<D>,
        name: &str,
        vertex: &str,
        fragment: &str,
    ) -> Result<Self> {
        let mut sources = StageSourceMap::new();
        sources.insert(Stage::Vertex, vertex.to_string());
        sources.insert(Stage::Fragment, fragment.to_string());
        Self::build(context, name.to_string(), name, &sources)
    }

    fn build(
        context: &PipelineContext<D>,
        name: String,
        identity: &str,
        sources: &StageSourceMap,
    ) -> Result<Self> {
        if let Err(err) = context.cache.ensure_dir() {
            warn!(
                path = %context.cache.root().display(),
                error = %err,
                "could not create shader cache directory; caching disabled for this build"
            );
        }

        let config = &context.config;
        let compiler = StageCompiler::new(&context.cache, identity, config.compiler, config.optimize);
        let intermediate = compiler.intermediate(sources)?;

        let linker = ProgramLinker::new(context.driver.as_ref(), &context.cache, identity);
        let strategy = context.link_strategy();
        debug!(shader = identity, %strategy, "linking program");
        let handle = match strategy {
            LinkStrategy::ProgramBinary => linker.link_program_binary(&compiler, &intermediate)?,
            LinkStrategy::Auto | LinkStrategy::Spirv => {
                let target = compiler.target(&intermediate)?;
                linker.link_spirv(&target.binaries)?
            }
        };

        Ok(Self {
            driver: Rc::clone(&context.driver),
            handle,
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> D::Program {
        self.handle
    }

    pub fn bind(&self) {
        self.driver.use_program(Some(self.handle));
    }

    pub fn unbind(&self) {
        self.driver.use_program(None);
    }

    /// Uploads a value to the named uniform of this program, which must be
    /// bound. Names the program does not expose are ignored.
    pub fn set_uniform<'v>(&self, name: &str, value: impl Into<UniformValue<'v>>) {
        let value = value.into();
        match self.driver.uniform_location(self.handle, name) {
            Some(location) => self.driver.upload_uniform(&location, value),
            None => trace!(
                shader = %self.name,
                uniform = name,
                kind = value.type_name(),
                "uniform not found; skipping upload"
            ),
        }
    }

    pub fn set_int(&self, name: &str, value: i32) {
        self.set_uniform(name, value);
    }

    pub fn set_int_array(&self, name: &str, values: &[i32]) {
        self.set_uniform(name, values);
    }

    pub fn set_float(&self, name: &str, value: f32) {
        self.set_uniform(name, value);
    }

    pub fn set_float2(&self, name: &str, value: Vec2) {
        self.set_uniform(name, value);
    }

    pub fn set_float3(&self, name: &str, value: Vec3) {
        self.set_uniform(name, value);
    }

    pub fn set_float4(&self, name: &str, value: Vec4) {
        self.set_uniform(name, value);
    }

    pub fn set_mat3(&self, name: &str, value: Mat3) {
        self.set_uniform(name, value);
    }

    pub fn set_mat4(&self, name: &str, value: Mat4) {
        self.set_uniform(name, value);
    }
}

impl<D: GlDriver> Drop for ShaderProgram<D> {
    fn drop(&mut self) {
        self.driver.delete_program(self.handle);
    }
}
