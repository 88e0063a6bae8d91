//! Disk cache for compiled shader artefacts.
//!
//! Entries are keyed purely by file name: `<identity><extension>` inside the
//! cache directory. There is no staleness check against the source text, so an
//! edited shader keeps its old binaries until the directory is cleared (see
//! [`ShaderCache::clear`] or `forgec cache clear`).
//!
//! Layout:
//!
//! - `.cached_vulkan.{vert,frag}` hold intermediate SPIR-V words.
//! - `.cached_opengl.{vert,frag}` hold OpenGL-targeted SPIR-V words.
//! - `.cached_opengl.pgr` holds a linked program binary: a little-endian `u32`
//!   format tag followed by the driver blob.
//!
//! Word files are raw little-endian dumps. Reads never fail loudly; a missing
//! or unreadable entry is a cache miss. Writes are best-effort.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::driver::ProgramBinary;
use crate::types::Stage;

/// Default cache location relative to the working directory.
pub const DEFAULT_CACHE_DIR: &str = "assets/cache/shader/opengl";

const PROGRAM_EXTENSION: &str = ".cached_opengl.pgr";

/// Which compiled form of a stage an entry stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    /// Vulkan-flavoured SPIR-V straight out of the GLSL compiler.
    Intermediate,
    /// SPIR-V recompiled for the OpenGL target environment.
    Native,
}

impl CacheKind {
    fn prefix(self) -> &'static str {
        match self {
            CacheKind::Intermediate => ".cached_vulkan.",
            CacheKind::Native => ".cached_opengl.",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShaderCache {
    root: PathBuf,
}

impl ShaderCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the cache directory when it does not exist yet.
    pub fn ensure_dir(&self) -> io::Result<()> {
        if !self.root.exists() {
            debug!(dir = %self.root.display(), "creating shader cache directory");
            fs::create_dir_all(&self.root)?;
        }
        Ok(())
    }

    pub fn stage_path(&self, identity: &str, stage: Stage, kind: CacheKind) -> PathBuf {
        self.root.join(format!(
            "{identity}{}{}",
            kind.prefix(),
            stage.cache_suffix()
        ))
    }

    pub fn program_path(&self, identity: &str) -> PathBuf {
        self.root.join(format!("{identity}{PROGRAM_EXTENSION}"))
    }

    /// Loads a word dump, or `None` on a cache miss.
    pub fn load_words(&self, path: &Path) -> Option<Vec<u32>> {
        let bytes = fs::read(path).ok()?;
        trace!(path = %path.display(), bytes = bytes.len(), "shader cache hit");
        Some(words_from_bytes(&bytes))
    }

    /// Persists a word dump. Failures only cost a recompile on the next run.
    pub fn store_words(&self, path: &Path, words: &[u32]) {
        if let Err(err) = fs::write(path, words_to_bytes(words)) {
            debug!(path = %path.display(), error = %err, "failed to write shader cache entry");
        }
    }

    pub fn load_program(&self, path: &Path) -> Option<ProgramBinary> {
        let bytes = fs::read(path).ok()?;
        let (tag, blob) = bytes.split_first_chunk::<4>()?;
        trace!(path = %path.display(), bytes = bytes.len(), "program binary cache hit");
        Some(ProgramBinary {
            format: u32::from_le_bytes(*tag),
            bytes: blob.to_vec(),
        })
    }

    pub fn store_program(&self, path: &Path, binary: &ProgramBinary) {
        let mut bytes = Vec::with_capacity(4 + binary.bytes.len());
        bytes.extend_from_slice(&binary.format.to_le_bytes());
        bytes.extend_from_slice(&binary.bytes);
        if let Err(err) = fs::write(path, bytes) {
            debug!(path = %path.display(), error = %err, "failed to write program binary cache entry");
        }
    }

    /// Lists every cache entry the pipeline could have written, sorted by path.
    pub fn entries(&self) -> io::Result<Vec<PathBuf>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.is_file() && is_cache_file(&path) {
                entries.push(path);
            }
        }
        entries.sort();
        Ok(entries)
    }

    /// Removes every cache entry and returns how many were deleted. Unrelated
    /// files in the directory are left alone.
    pub fn clear(&self) -> io::Result<usize> {
        let entries = self.entries()?;
        for path in &entries {
            fs::remove_file(path)?;
        }
        debug!(dir = %self.root.display(), removed = entries.len(), "cleared shader cache");
        Ok(entries.len())
    }
}

impl Default for ShaderCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_DIR)
    }
}

fn is_cache_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    name.ends_with(PROGRAM_EXTENSION)
        || [CacheKind::Intermediate, CacheKind::Native]
            .iter()
            .flat_map(|kind| {
                [Stage::Vertex, Stage::Fragment]
                    .map(|stage| format!("{}{}", kind.prefix(), stage.cache_suffix()))
            })
            .any(|extension| name.ends_with(&extension))
}

/// Reinterprets a byte dump as little-endian words. A trailing partial word is
/// dropped.
pub(crate) fn words_from_bytes(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

pub(crate) fn words_to_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|word| word.to_le_bytes()).collect()
}
