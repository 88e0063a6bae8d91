use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, ShaderError};
use crate::types::{Stage, StageSourceMap};

/// Token that opens a stage block inside a combined shader file.
pub const STAGE_MARKER: &str = "#type";

const LINE_BREAKS: &[char] = &['\r', '\n'];

/// Reads a shader file from disk.
pub fn read_source(path: &Path) -> Result<String> {
    let source = fs::read_to_string(path).map_err(|source| ShaderError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = source.len(), "loaded shader source");
    Ok(source)
}

/// Splits a combined shader file into per-stage sources.
///
/// Every `#type <stage>` line starts a new block; the block body runs from the
/// first non-empty character after the declaration line up to the next marker
/// or the end of the text. Anything before the first marker is ignored and a
/// repeated stage replaces the earlier block.
pub fn split_stages(source: &str) -> Result<StageSourceMap> {
    let mut stages = StageSourceMap::new();

    let mut cursor = source.find(STAGE_MARKER);
    while let Some(pos) = cursor {
        let name_start = pos + STAGE_MARKER.len();
        let eol = source[name_start..]
            .find(LINE_BREAKS)
            .map(|offset| name_start + offset)
            .ok_or(ShaderError::Syntax {
                offset: pos,
                reason: "stage declaration is not terminated by a line break",
            })?;

        let name = source[name_start..eol].trim();
        let stage =
            Stage::from_name(name).ok_or_else(|| ShaderError::UnknownStage(name.to_string()))?;

        let body_start = source[eol..]
            .find(|c: char| !LINE_BREAKS.contains(&c))
            .map_or(source.len(), |offset| eol + offset);
        cursor = source[body_start..]
            .find(STAGE_MARKER)
            .map(|offset| body_start + offset);
        let body_end = cursor.unwrap_or(source.len());

        stages.insert(stage, source[body_start..body_end].to_string());
    }

    Ok(stages)
}

/// Display name for a shader file: the file name without directories and
/// without its last extension.
pub fn program_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_vertex_and_fragment_blocks() {
        let stages = split_stages("#type vertex\nVOID_VERT\n#type fragment\nVOID_FRAG\n").unwrap();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[&Stage::Vertex], "VOID_VERT\n");
        assert_eq!(stages[&Stage::Fragment], "VOID_FRAG\n");
    }

    #[test]
    fn rejoined_bodies_reproduce_stage_text() {
        let vertex = "#version 450\nvoid main() {\n    gl_Position = vec4(0.0);\n}\n";
        let fragment = "#version 450\nlayout(location = 0) out vec4 color;\nvoid main() { color = vec4(1.0); }\n";
        let combined = format!("#type vertex\n{vertex}#type pixel\r\n{fragment}");

        let stages = split_stages(&combined).unwrap();
        let rejoined: String = stages.values().map(String::as_str).collect();
        assert_eq!(rejoined, format!("{vertex}{fragment}"));
        assert!(!rejoined.contains(STAGE_MARKER));
    }

    #[test]
    fn handles_crlf_and_padded_names() {
        let stages = split_stages("#type  vertex \r\n\r\nA\r\n#type fragment\r\nB").unwrap();
        assert_eq!(stages[&Stage::Vertex], "A\r\n");
        assert_eq!(stages[&Stage::Fragment], "B");
    }

    #[test]
    fn empty_bodies_are_legal() {
        let stages = split_stages("#type vertex\n#type fragment\n").unwrap();
        assert_eq!(stages[&Stage::Vertex], "");
        assert_eq!(stages[&Stage::Fragment], "");
    }

    #[test]
    fn text_without_markers_yields_no_stages() {
        assert!(split_stages("void main() {}\n").unwrap().is_empty());
    }

    #[test]
    fn rejects_unknown_stage_names() {
        let err = split_stages("#type geometry\nvoid main() {}\n").unwrap_err();
        assert!(matches!(err, ShaderError::UnknownStage(name) if name == "geometry"));
    }

    #[test]
    fn rejects_unterminated_declaration() {
        let err = split_stages("#type vertex\nA\n#type fragment").unwrap_err();
        assert!(matches!(err, ShaderError::Syntax { offset: 15, .. }));
    }

    #[test]
    fn later_blocks_replace_earlier_ones() {
        let stages = split_stages("#type fragment\nA\n#type pixel\nB\n").unwrap();
        assert_eq!(stages.len(), 1);
        assert_eq!(stages[&Stage::Fragment], "B\n");
    }

    #[test]
    fn derives_program_names() {
        assert_eq!(program_name(Path::new("assets/shaders/Texture.glsl")), "Texture");
        assert_eq!(program_name(Path::new("Flat")), "Flat");
        assert_eq!(program_name(Path::new("dir.v2/Grid.shader.glsl")), "Grid.shader");
    }

    #[test]
    fn read_source_reports_missing_files() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("missing.glsl");
        let err = read_source(&missing).unwrap_err();
        assert!(matches!(err, ShaderError::Read { path, .. } if path == missing));
    }
}
