use std::path::PathBuf;

use thiserror::Error;

use crate::types::{ShaderCompiler, Stage};

/// Failures surfaced while building a shader program.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("could not read shader source '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("syntax error at byte {offset}: {reason}")]
    Syntax { offset: usize, reason: &'static str },

    #[error("invalid shader type '{0}' specified")]
    UnknownStage(String),

    #[error("shader compiler '{0}' is not available in this build")]
    CompilerUnavailable(ShaderCompiler),

    #[error("failed to compile {stage} shader '{identity}':\n{message}")]
    Compile {
        identity: String,
        stage: Stage,
        message: String,
    },

    #[error("failed to translate {stage} shader '{identity}' to GLSL: {message}")]
    Translate {
        identity: String,
        stage: Stage,
        message: String,
    },

    #[error("driver failed to compile {stage} shader '{identity}':\n{log}")]
    StageCompile {
        identity: String,
        stage: Stage,
        log: String,
    },

    #[error("shader linking failed ({identity}):\n{log}")]
    Link { identity: String, log: String },

    #[error("driver does not support binary format")]
    NoBinaryFormats,

    #[error("graphics driver error: {0}")]
    Driver(String),
}

pub type Result<T, E = ShaderError> = std::result::Result<T, E>;
