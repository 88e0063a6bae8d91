use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use shaderforge::{PipelineConfig, ShaderCompiler};

#[derive(Parser, Debug)]
#[command(
    name = "forgec",
    author,
    version,
    about = "Split, pre-compile, and inspect shaderforge shaders without a GL context"
)]
pub struct Cli {
    /// Pipeline configuration file (TOML). Missing files fall back to defaults.
    #[arg(long, global = true, value_name = "FILE", env = "FORGEC_CONFIG")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the stages found in a combined shader file.
    Split {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Compile shaders and warm the intermediate and OpenGL caches.
    Compile {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Print uniform blocks and sampled images declared by each stage.
    Reflect {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Emit the reports as JSON.
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Inspect or empty the shader cache directory.
    Cache(CacheCommand),
}

#[derive(Args, Debug, Default)]
pub struct PipelineArgs {
    /// Cache directory (defaults to `assets/cache/shader/opengl`).
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Shader compiler backend: `shaderc` or `naga`.
    #[arg(long, value_name = "COMPILER", value_parser = parse_shader_compiler)]
    pub compiler: Option<ShaderCompiler>,

    /// Skip optimization of the intermediate SPIR-V.
    #[arg(long)]
    pub no_optimize: bool,
}

impl PipelineArgs {
    /// Layers command-line overrides on top of the loaded configuration.
    pub fn apply(&self, base: &PipelineConfig) -> PipelineConfig {
        let mut config = base.clone();
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = dir.clone();
        }
        if let Some(compiler) = self.compiler {
            config.compiler = compiler;
        }
        if self.no_optimize {
            config.optimize = false;
        }
        config
    }
}

#[derive(Args, Debug)]
pub struct CacheCommand {
    #[command(subcommand)]
    pub action: CacheAction,
    /// Cache directory (defaults to the configured one).
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cache entries with their sizes.
    List,
    /// Delete every cache entry.
    Clear,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_shader_compiler(value: &str) -> Result<ShaderCompiler, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("shader compiler must not be empty".to_string());
    }
    let compiler: ShaderCompiler = trimmed.parse()?;
    if !compiler.is_available() {
        return Err(format!("{compiler} support is not enabled in this build"));
    }
    Ok(compiler)
}
