use crate::*;
use gfxsl_ast::*;
use std::collections::BTreeSet;

/// Generated source of one stage
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct GeneratedStage {
    pub stage: ShaderStage,
    pub source: String,

    /// Uniform buffer registry ids with their binding slots
    pub uniform_buffers: Vec<(usize, u32)>,
}

/// Generated sources of every stage of a shader file
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct GeneratedShader {
    pub name: String,
    pub stages: Vec<GeneratedStage>,
    pub vertex_format: Option<usize>,
    pub instance_format: Option<usize>,
}

/// Generate every stage of a module and register its shared declarations
///
/// Only declarations reachable from an entry point are registered, and only once every stage has
/// generated. A registration conflict can still leave earlier declarations of the module registered,
/// callers which need the registries untouched on failure generate into a copy.
pub fn generate_shader(
    module: &Module,
    backend: &dyn Backend,
    registries: &mut Registries,
) -> GenerateResult<GeneratedShader> {
    backend.check_supported()?;

    let mut sources = Vec::new();
    let mut reachable = BTreeSet::new();
    for stage in module.stages() {
        sources.push((stage, generate_stage(module, backend, stage)?));
        if let Some(entry) = module.entry_point(stage) {
            reachable.extend(Reachability::compute(module, entry.id).types);
        }
    }

    let structs = module.structs.iter().filter(|sd| reachable.contains(&sd.type_id));
    register_structs(module, backend, registries, structs)?;

    let mut shader = GeneratedShader {
        name: module.name.clone(),
        stages: Vec::new(),
        vertex_format: None,
        instance_format: None,
    };

    for (stage, source) in sources {
        let mut uniform_buffers = Vec::new();
        if let Some(entry) = module.entry_point(stage) {
            for param in module.params(entry.id) {
                let ty = module.get_type(param.type_id);
                match ty.as_struct() {
                    Some(StructKind::UniformBuffer) => {
                        let slot = module
                            .struct_for_type(param.type_id)
                            .and_then(|sd| sd.slot)
                            .unwrap_or(0);
                        if let Some(id) = registries.uniform_buffers.find(&ty.name) {
                            uniform_buffers.push((id, slot));
                        }
                    }
                    Some(StructKind::VertexInput) => {
                        shader.vertex_format = registries.vertex_formats.find(&ty.name)
                    }
                    Some(StructKind::InstanceInput) => {
                        shader.instance_format = registries.instance_formats.find(&ty.name)
                    }
                    _ => {}
                }
            }
        }

        shader.stages.push(GeneratedStage {
            stage,
            source,
            uniform_buffers,
        });
    }

    log::info!(
        "generated {} stage(s) of `{}` for {}",
        shader.stages.len(),
        shader.name,
        backend.name()
    );
    Ok(shader)
}

/// Add structs with a host mirror to the registries
///
/// Structs must come in declaration order so a shared struct is always registered before the
/// buffers which contain it.
pub fn register_structs<'m>(
    module: &'m Module,
    backend: &dyn Backend,
    registries: &mut Registries,
    structs: impl IntoIterator<Item = &'m Struct>,
) -> GenerateResult<()> {
    for sd in structs {
        if !sd.kind.has_host_mirror() {
            continue;
        }
        if let Some(registry) = registries.for_kind(sd.kind) {
            let name = module.type_name(sd.type_id);
            let layout = layout_checksum(module, sd.type_id);
            registry.register(name, layout, || generate_struct_fragments(module, sd.type_id, backend))?;
        }
    }
    Ok(())
}
