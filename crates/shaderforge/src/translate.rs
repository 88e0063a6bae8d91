use naga::back::glsl;
use naga::valid::{Capabilities, ModuleInfo, ValidationFlags, Validator};
use tracing::debug;

use crate::types::Stage;

/// GLSL dialect emitted for the OpenGL target.
pub const TARGET_GLSL_VERSION: u16 = 450;

/// Decodes a SPIR-V module into naga IR.
///
/// Coordinate space is left untouched: the GLSL we emit again must behave
/// exactly like the source the author wrote.
pub(crate) fn parse_spirv(words: &[u32]) -> Result<naga::Module, String> {
    let options = naga::front::spv::Options {
        adjust_coordinate_space: false,
        ..Default::default()
    };
    naga::front::spv::parse_u8_slice(bytemuck::cast_slice(words), &options)
        .map_err(|err| err.to_string())
}

pub(crate) fn validate(module: &naga::Module) -> Result<ModuleInfo, String> {
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(module)
        .map_err(|err| err.as_inner().to_string())
}

/// Cross-compiles SPIR-V into desktop GLSL 4.50 for the given stage.
///
/// Resource binding decorations are carried over as explicit
/// `layout(binding = N)` qualifiers so the OpenGL program sees the same slots
/// as the Vulkan-flavoured intermediate.
pub fn spirv_to_glsl(stage: Stage, words: &[u32]) -> Result<String, String> {
    let module = parse_spirv(words)?;
    let info = validate(&module)?;

    let options = glsl::Options {
        version: glsl::Version::Desktop(TARGET_GLSL_VERSION),
        writer_flags: glsl::WriterFlags::empty(),
        binding_map: binding_map(&module),
        ..Default::default()
    };
    let pipeline_options = glsl::PipelineOptions {
        shader_stage: stage.naga(),
        entry_point: "main".to_string(),
        multiview: None,
    };

    let mut output = String::new();
    {
        let mut writer = glsl::Writer::new(
            &mut output,
            &module,
            &info,
            &options,
            &pipeline_options,
            naga::proc::BoundsCheckPolicies::default(),
        )
        .map_err(|err| err.to_string())?;
        writer.write().map_err(|err| err.to_string())?;
    }
    Ok(output)
}

/// Maps every bound global to its own slot. naga's GLSL writer stores slots
/// as `u8`; larger bindings are left to the writer's default numbering.
fn binding_map(module: &naga::Module) -> glsl::BindingMap {
    let mut map = glsl::BindingMap::default();
    for (_, global) in module.global_variables.iter() {
        let Some(binding) = &global.binding else {
            continue;
        };
        match u8::try_from(binding.binding) {
            Ok(slot) => {
                map.insert(binding.clone(), slot);
            }
            Err(_) => debug!(
                group = binding.group,
                binding = binding.binding,
                name = global.name.as_deref().unwrap_or(""),
                "binding does not fit a GLSL slot; left unmapped"
            ),
        }
    }
    map
}
