use naga::{AddressSpace, ImageClass, TypeInner};
use serde::Serialize;
use tracing::{debug, trace};

use crate::translate::parse_spirv;
use crate::types::Stage;

/// One uniform block declared by a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniformBufferInfo {
    pub name: String,
    /// Declared struct size in bytes.
    pub size: u32,
    pub binding: Option<u32>,
    pub members: usize,
}

/// Resources a stage's bytecode declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReflection {
    pub stage: Stage,
    pub uniform_buffers: Vec<UniformBufferInfo>,
    pub sampled_images: usize,
}

impl StageReflection {
    fn empty(stage: Stage) -> Self {
        Self {
            stage,
            uniform_buffers: Vec::new(),
            sampled_images: 0,
        }
    }
}

/// Inspects SPIR-V and logs its uniform blocks at trace level.
///
/// Purely diagnostic: bytecode that cannot be decoded produces an empty report
/// rather than an error.
pub fn reflect(stage: Stage, words: &[u32], identity: &str) -> StageReflection {
    let module = match parse_spirv(words) {
        Ok(module) => module,
        Err(err) => {
            debug!(shader = identity, %stage, error = %err, "skipping reflection of undecodable SPIR-V");
            return StageReflection::empty(stage);
        }
    };

    let mut report = StageReflection::empty(stage);
    for (_, global) in module.global_variables.iter() {
        let ty = &module.types[global.ty];
        match global.space {
            AddressSpace::Uniform => {
                let (size, members) = block_layout(&module, ty);
                let name = global
                    .name
                    .clone()
                    .or_else(|| ty.name.clone())
                    .unwrap_or_default();
                report.uniform_buffers.push(UniformBufferInfo {
                    name,
                    size,
                    binding: global.binding.as_ref().map(|binding| binding.binding),
                    members,
                });
            }
            AddressSpace::Handle => {
                if matches!(
                    ty.inner,
                    TypeInner::Image {
                        class: ImageClass::Sampled { .. } | ImageClass::Depth { .. },
                        ..
                    }
                ) {
                    report.sampled_images += 1;
                }
            }
            _ => {}
        }
    }

    trace!(shader = identity, %stage, "reflecting stage");
    trace!("    {} uniform buffers", report.uniform_buffers.len());
    trace!("    {} resources", report.sampled_images);
    trace!("Uniform buffers:");
    for buffer in &report.uniform_buffers {
        trace!("  {}", buffer.name);
        trace!("    Size = {}", buffer.size);
        trace!("    Binding = {:?}", buffer.binding);
        trace!("    Members = {}", buffer.members);
    }

    report
}

/// Size and member count of a uniform block type.
///
/// Some SPIR-V writers (naga among them) put the user's struct inside an
/// anonymous single-member `Block` struct; such wrappers are looked through.
fn block_layout(module: &naga::Module, ty: &naga::Type) -> (u32, usize) {
    match &ty.inner {
        TypeInner::Struct { members, span } => {
            if let [only] = members.as_slice() {
                let inner = &module.types[only.ty];
                let anonymous = ty.name.is_none() && only.name.is_none() && only.offset == 0;
                if anonymous && matches!(inner.inner, TypeInner::Struct { .. }) {
                    return block_layout(module, inner);
                }
            }
            (*span, members.len())
        }
        other => (other.size(module.to_ctx()), 0),
    }
}
