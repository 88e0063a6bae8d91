use std::collections::BTreeMap;

use tracing::{debug, error, trace};

use crate::cache::{CacheKind, ShaderCache};
use crate::error::{Result, ShaderError};
use crate::reflect::{reflect, StageReflection};
use crate::translate::{parse_spirv, spirv_to_glsl, validate};
use crate::types::{ShaderCompiler, Stage, StageBinaryMap, StageSourceMap};

/// Target environment the GLSL compiler emits SPIR-V for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetEnv {
    /// Vulkan 1.2 semantics; the portable intermediate.
    Vulkan,
    /// `GL_ARB_gl_spirv` semantics for OpenGL 4.5.
    OpenGl,
}

/// Output of the target pass.
#[derive(Debug, Default)]
pub struct TargetOutput {
    pub binaries: StageBinaryMap,
    /// Translated GLSL for every stage that missed the cache.
    pub glsl: BTreeMap<Stage, String>,
}

/// Cache-aware GLSL → SPIR-V compilation for one shader identity.
pub struct StageCompiler<'a> {
    cache: &'a ShaderCache,
    identity: &'a str,
    compiler: ShaderCompiler,
    optimize: bool,
}

impl<'a> StageCompiler<'a> {
    pub fn new(
        cache: &'a ShaderCache,
        identity: &'a str,
        compiler: ShaderCompiler,
        optimize: bool,
    ) -> Self {
        Self {
            cache,
            identity,
            compiler,
            optimize,
        }
    }

    /// Resolves the intermediate SPIR-V for every stage, from cache or by
    /// compiling, then reflects each stage.
    pub fn intermediate(&self, sources: &StageSourceMap) -> Result<StageBinaryMap> {
        self.intermediate_with_reflection(sources)
            .map(|(binaries, _)| binaries)
    }

    /// Same as [`StageCompiler::intermediate`] but also hands back the
    /// reflection reports.
    pub fn intermediate_with_reflection(
        &self,
        sources: &StageSourceMap,
    ) -> Result<(StageBinaryMap, Vec<StageReflection>)> {
        let mut binaries = StageBinaryMap::new();
        for (&stage, source) in sources {
            let cached_path = self
                .cache
                .stage_path(self.identity, stage, CacheKind::Intermediate);
            let words = match self.cache.load_words(&cached_path) {
                Some(words) => words,
                None => {
                    let words = self.compile(source, stage, TargetEnv::Vulkan, self.optimize)?;
                    self.cache.store_words(&cached_path, &words);
                    words
                }
            };
            binaries.insert(stage, words);
        }

        let reports = binaries
            .iter()
            .map(|(&stage, words)| reflect(stage, words, self.identity))
            .collect();
        Ok((binaries, reports))
    }

    /// Translates intermediate SPIR-V into GLSL and recompiles it for the
    /// OpenGL target, going through the cache per stage.
    pub fn target(&self, intermediate: &StageBinaryMap) -> Result<TargetOutput> {
        let mut output = TargetOutput::default();
        for (&stage, spirv) in intermediate {
            let cached_path = self.cache.stage_path(self.identity, stage, CacheKind::Native);
            if let Some(words) = self.cache.load_words(&cached_path) {
                output.binaries.insert(stage, words);
                continue;
            }

            let glsl = self.translate(stage, spirv)?;
            let words = self.retarget(&glsl, stage, spirv)?;
            self.cache.store_words(&cached_path, &words);
            output.binaries.insert(stage, words);
            output.glsl.insert(stage, glsl);
        }
        Ok(output)
    }

    /// Cross-compiles one stage's intermediate SPIR-V to GLSL.
    pub fn translate(&self, stage: Stage, spirv: &[u32]) -> Result<String> {
        let glsl = spirv_to_glsl(stage, spirv).map_err(|message| {
            error!(shader = self.identity, %stage, %message, "SPIR-V to GLSL translation failed");
            ShaderError::Translate {
                identity: self.identity.to_string(),
                stage,
                message,
            }
        })?;
        trace!(shader = self.identity, %stage, glsl = %glsl, "translated stage to GLSL");
        Ok(glsl)
    }

    /// Produces OpenGL-targeted SPIR-V for one translated stage.
    ///
    /// shaderc recompiles the translated GLSL for the OpenGL environment.
    /// naga's GLSL front end cannot read the combined `sampler2D` uniforms its
    /// own GLSL writer emits, so the naga backend rewrites the decoded
    /// intermediate module instead and the GLSL text is kept for diagnostics.
    fn retarget(&self, glsl: &str, stage: Stage, spirv: &[u32]) -> Result<Vec<u32>> {
        match self.compiler {
            ShaderCompiler::Shaderc => self.compile(glsl, stage, TargetEnv::OpenGl, false),
            ShaderCompiler::NagaGlsl => {
                debug!(shader = self.identity, %stage, "rewriting intermediate module for OpenGL");
                retarget_with_naga(spirv, stage)
                    .map_err(|message| self.compile_error(stage, message))
            }
        }
    }

    fn compile_error(&self, stage: Stage, message: String) -> ShaderError {
        error!(shader = self.identity, %stage, "{message}");
        ShaderError::Compile {
            identity: self.identity.to_string(),
            stage,
            message,
        }
    }

    fn compile(
        &self,
        source: &str,
        stage: Stage,
        env: TargetEnv,
        optimize: bool,
    ) -> Result<Vec<u32>> {
        debug!(
            shader = self.identity,
            %stage,
            ?env,
            optimize,
            compiler = %self.compiler,
            "compiling stage"
        );
        let result = match self.compiler {
            #[cfg(feature = "shaderc")]
            ShaderCompiler::Shaderc => compile_with_shaderc(source, stage, self.identity, env, optimize),
            #[cfg(not(feature = "shaderc"))]
            ShaderCompiler::Shaderc => {
                return Err(ShaderError::CompilerUnavailable(ShaderCompiler::Shaderc))
            }
            ShaderCompiler::NagaGlsl => compile_with_naga(source, stage),
        };
        result.map_err(|message| self.compile_error(stage, message))
    }
}

#[cfg(feature = "shaderc")]
fn compile_with_shaderc(
    source: &str,
    stage: Stage,
    identity: &str,
    env: TargetEnv,
    optimize: bool,
) -> Result<Vec<u32>, String> {
    let compiler = shaderc::Compiler::new().map_err(|err| err.to_string())?;
    let mut options = shaderc::CompileOptions::new().map_err(|err| err.to_string())?;
    match env {
        TargetEnv::Vulkan => options.set_target_env(
            shaderc::TargetEnv::Vulkan,
            shaderc::EnvVersion::Vulkan1_2 as u32,
        ),
        TargetEnv::OpenGl => options.set_target_env(
            shaderc::TargetEnv::OpenGL,
            shaderc::EnvVersion::OpenGL4_5 as u32,
        ),
    }
    if optimize {
        options.set_optimization_level(shaderc::OptimizationLevel::Performance);
    }

    let kind = match stage {
        Stage::Vertex => shaderc::ShaderKind::Vertex,
        Stage::Fragment => shaderc::ShaderKind::Fragment,
    };
    let artifact = compiler
        .compile_into_spirv(source, kind, identity, "main", Some(&options))
        .map_err(|err| err.to_string())?;
    if artifact.get_num_warnings() > 0 {
        debug!(shader = identity, %stage, warnings = %artifact.get_warning_messages(), "shaderc warnings");
    }
    Ok(artifact.as_binary().to_vec())
}

/// naga has no optimizer and only one SPIR-V flavour, so the target
/// environment and optimization level do not change its output.
fn compile_with_naga(source: &str, stage: Stage) -> Result<Vec<u32>, String> {
    let mut frontend = naga::front::glsl::Frontend::default();
    let module = frontend
        .parse(&naga::front::glsl::Options::from(stage.naga()), source)
        .map_err(|errors| errors.emit_to_string(source))?;
    let info = validate(&module)?;
    write_spirv(&module, &info, stage)
}

/// Re-emits an intermediate module through naga's SPIR-V writer (SPIR-V 1.0,
/// coordinate space untouched) without going back through GLSL text.
fn retarget_with_naga(spirv: &[u32], stage: Stage) -> Result<Vec<u32>, String> {
    let module = parse_spirv(spirv)?;
    let info = validate(&module)?;
    write_spirv(&module, &info, stage)
}

fn write_spirv(
    module: &naga::Module,
    info: &naga::valid::ModuleInfo,
    stage: Stage,
) -> Result<Vec<u32>, String> {
    let mut options = naga::back::spv::Options::default();
    options
        .flags
        .remove(naga::back::spv::WriterFlags::ADJUST_COORDINATE_SPACE);
    options.flags.insert(naga::back::spv::WriterFlags::DEBUG);
    let pipeline_options = naga::back::spv::PipelineOptions {
        shader_stage: stage.naga(),
        entry_point: "main".to_string(),
    };
    naga::back::spv::write_vec(module, info, &options, Some(&pipeline_options))
        .map_err(|err| err.to_string())
}

/// Checks that a SPIR-V module decodes and validates.
pub fn verify_spirv(words: &[u32]) -> Result<(), String> {
    let module = parse_spirv(words)?;
    validate(&module).map(|_| ())
}
