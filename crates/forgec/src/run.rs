use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use shaderforge::{
    read_source, split_stages, PipelineConfig, ShaderCache, StageCompiler, StageReflection,
};
use tracing_subscriber::EnvFilter;

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "forge.toml";

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    let config = PipelineConfig::load_or_default(path)
        .with_context(|| format!("failed to load pipeline config from {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        cache = %config.cache_dir.display(),
        compiler = %config.compiler,
        optimize = config.optimize,
        link_strategy = %config.link_strategy,
        "resolved pipeline config"
    );
    Ok(config)
}

pub fn split(file: &Path) -> Result<()> {
    let source = read_source(file)?;
    let stages = split_stages(&source)
        .with_context(|| format!("failed to split shader {}", file.display()))?;
    if stages.is_empty() {
        println!("{}: no `#type` sections found", file.display());
        return Ok(());
    }
    println!("{}:", file.display());
    for (stage, body) in &stages {
        println!("  {:<8} {:>6} bytes {:>4} lines", stage, body.len(), body.lines().count());
    }
    Ok(())
}

pub fn compile(files: &[PathBuf], config: &PipelineConfig) -> Result<()> {
    let cache = prepare_cache(config)?;
    for file in files {
        let started = Instant::now();
        let identity = identity(file);
        let source = read_source(file)?;
        let stages = split_stages(&source)
            .with_context(|| format!("failed to split shader {}", file.display()))?;
        let compiler = StageCompiler::new(&cache, &identity, config.compiler, config.optimize);
        let intermediate = compiler
            .intermediate(&stages)
            .with_context(|| format!("failed to compile {}", file.display()))?;
        let target = compiler
            .target(&intermediate)
            .with_context(|| format!("failed to translate {}", file.display()))?;

        tracing::info!(
            shader = %identity,
            stages = intermediate.len(),
            translated = target.glsl.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "warmed shader cache"
        );
        for (stage, words) in &target.binaries {
            println!("{identity} {stage:<8} {:>6} words", words.len());
        }
    }
    Ok(())
}

pub fn reflect(file: &Path, config: &PipelineConfig, json: bool) -> Result<()> {
    let cache = prepare_cache(config)?;
    let identity = identity(file);
    let source = read_source(file)?;
    let stages = split_stages(&source)
        .with_context(|| format!("failed to split shader {}", file.display()))?;
    let (_, reports) = StageCompiler::new(&cache, &identity, config.compiler, config.optimize)
        .intermediate_with_reflection(&stages)
        .with_context(|| format!("failed to compile {}", file.display()))?;

    if json {
        let rendered =
            serde_json::to_string_pretty(&reports).context("failed to serialize reflection")?;
        println!("{rendered}");
    } else {
        for report in &reports {
            print_reflection(report);
        }
    }
    Ok(())
}

fn print_reflection(report: &StageReflection) {
    println!("{} stage:", report.stage);
    println!("  {} uniform buffers", report.uniform_buffers.len());
    println!("  {} sampled images", report.sampled_images);
    for buffer in &report.uniform_buffers {
        let binding = buffer
            .binding
            .map_or_else(|| "-".to_string(), |binding| binding.to_string());
        println!(
            "  {:<24} size={:<5} binding={:<3} members={}",
            buffer.name, buffer.size, binding, buffer.members
        );
    }
}

pub fn cache_list(root: &Path) -> Result<()> {
    let cache = ShaderCache::new(root);
    let entries = cache
        .entries()
        .with_context(|| format!("failed to list shader cache at {}", root.display()))?;
    if entries.is_empty() {
        println!("Shader cache at {} is empty.", root.display());
        return Ok(());
    }
    println!("Shader cache at {}:", root.display());
    for path in entries {
        let size = fs::metadata(&path)
            .with_context(|| format!("failed to stat {}", path.display()))?
            .len();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("  {name:<48} {size:>8} bytes");
    }
    Ok(())
}

pub fn cache_clear(root: &Path) -> Result<()> {
    let removed = ShaderCache::new(root)
        .clear()
        .with_context(|| format!("failed to clear shader cache at {}", root.display()))?;
    println!("Removed {removed} cache entries from {}", root.display());
    Ok(())
}

fn prepare_cache(config: &PipelineConfig) -> Result<ShaderCache> {
    let cache = ShaderCache::new(config.cache_dir.clone());
    cache.ensure_dir().with_context(|| {
        format!(
            "failed to prepare shader cache directory at {}",
            config.cache_dir.display()
        )
    })?;
    Ok(cache)
}

/// Cache identity of a shader file: its file name, like the runtime uses.
fn identity(file: &Path) -> String {
    file.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
