use crate::*;
use gfxsl_ast::*;
use std::collections::HashMap;

/// Checksum used to key and compare registry entries
pub fn checksum(text: &str) -> u32 {
    crc32fast::hash(text.as_bytes())
}

/// Checksum of the member sequence of a struct type
///
/// Each member contributes its type name, array dimensions and input format.
pub fn layout_checksum(module: &Module, type_id: TypeId) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    for member in module.members(type_id) {
        hasher.update(module.type_name(member.type_id).as_bytes());
        hasher.update(member.array.suffix().as_bytes());
        if let Some(format) = member.format {
            hasher.update(format.name().as_bytes());
        }
        hasher.update(b";");
    }
    hasher.finalize()
}

/// Generated text owned by a registry entry
///
/// Fragments of every entry are concatenated into the final generated files.
#[derive(PartialEq, Eq, Debug, Default, Clone)]
pub struct Fragments {
    pub header: String,
    pub source: String,
    pub api_header: String,
    pub api_source: String,
}

/// A named declaration shared between every shader in a session
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct RegistryEntry {
    pub name: String,

    /// Checksum of the member sequence
    pub layout: u32,

    pub fragments: Fragments,
}

/// Set of declarations deduplicated by name and layout
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Registry {
    kind: &'static str,
    entries: Vec<RegistryEntry>,
    by_name: HashMap<u32, usize>,
}

impl Registry {
    pub fn new(kind: &'static str) -> Self {
        Registry {
            kind,
            entries: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Register a declaration
    ///
    /// Returns the entry id and whether the entry was newly inserted. Registering the same name with
    /// the same layout again returns the existing entry without calling `generate`.
    pub fn register(
        &mut self,
        name: &str,
        layout: u32,
        generate: impl FnOnce() -> GenerateResult<Fragments>,
    ) -> GenerateResult<(usize, bool)> {
        let key = checksum(name);
        if let Some(&id) = self.by_name.get(&key) {
            let existing = &self.entries[id];
            if existing.name != name {
                return Err(RegistryError::ChecksumCollision {
                    kind: self.kind,
                    name: name.to_string(),
                    existing: existing.name.clone(),
                }
                .into());
            }
            if existing.layout != layout {
                return Err(RegistryError::LayoutMismatch {
                    kind: self.kind,
                    name: name.to_string(),
                }
                .into());
            }
            return Ok((id, false));
        }

        let id = self.entries.len();
        let fragments = generate()?;
        log::debug!("registered {} `{}` as {}", self.kind, name, id);
        self.entries.push(RegistryEntry {
            name: name.to_string(),
            layout,
            fragments,
        });
        self.by_name.insert(key, id);
        Ok((id, true))
    }

    /// Find the id of a registered name
    pub fn find(&self, name: &str) -> Option<usize> {
        self.by_name
            .get(&checksum(name))
            .copied()
            .filter(|id| self.entries[*id].name == name)
    }

    /// Register every entry of another registry
    ///
    /// Returns the id each entry of `other` has in this registry.
    pub fn merge(&mut self, other: &Registry) -> GenerateResult<Vec<usize>> {
        other
            .entries
            .iter()
            .map(|entry| {
                let fragments = entry.fragments.clone();
                self.register(&entry.name, entry.layout, || Ok(fragments))
                    .map(|(id, _)| id)
            })
            .collect()
    }

    pub fn get(&self, id: usize) -> &RegistryEntry {
        &self.entries[id]
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Location of one compiled stage inside the shared binary
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct StageEntry {
    pub stage: ShaderStage,
    pub offset: u32,
    pub size: u32,

    /// Uniform buffer registry ids with their binding slots
    pub uniform_buffers: Vec<(usize, u32)>,
}

/// A compiled shader
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct ShaderEntry {
    pub name: String,
    pub stages: Vec<StageEntry>,
    pub vertex_format: Option<usize>,
    pub instance_format: Option<usize>,
}

impl ShaderEntry {
    /// Bit mask of [ShaderStage::bit] for every stage
    pub fn stage_mask(&self) -> u32 {
        self.stages.iter().fold(0, |mask, stage| mask | stage.stage.bit())
    }

    pub fn stage(&self, stage: ShaderStage) -> Option<&StageEntry> {
        self.stages.iter().find(|entry| entry.stage == stage)
    }
}

/// Every registry shared by the shaders of one build
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Registries {
    pub shared_structs: Registry,
    pub uniform_buffers: Registry,
    pub vertex_formats: Registry,
    pub instance_formats: Registry,
    pub shaders: Vec<ShaderEntry>,
}

impl Default for Registries {
    fn default() -> Self {
        Registries {
            shared_structs: Registry::new("shared_struct"),
            uniform_buffers: Registry::new("uniform_buffer"),
            vertex_formats: Registry::new("vertex_format"),
            instance_formats: Registry::new("instance_format"),
            shaders: Vec::new(),
        }
    }
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the registry which holds a struct kind
    pub fn for_kind(&mut self, kind: StructKind) -> Option<&mut Registry> {
        match kind {
            StructKind::SharedStruct => Some(&mut self.shared_structs),
            StructKind::UniformBuffer => Some(&mut self.uniform_buffers),
            StructKind::VertexInput => Some(&mut self.vertex_formats),
            StructKind::InstanceInput => Some(&mut self.instance_formats),
            _ => None,
        }
    }

    /// Add a compiled shader
    pub fn register_shader(&mut self, shader: ShaderEntry) -> GenerateResult<usize> {
        if self.shaders.iter().any(|s| s.name == shader.name) {
            return Err(RegistryError::DuplicateShader(shader.name).into());
        }
        log::debug!("registered shader `{}`", shader.name);
        self.shaders.push(shader);
        Ok(self.shaders.len() - 1)
    }

    /// Add the declarations and shaders of another build
    ///
    /// Declarations merge under the same name and layout rule as registration. Stage offsets of the
    /// other build move by `binary_offset`, the position its binary is appended at. On error nothing
    /// is merged.
    pub fn merge(&mut self, other: &Registries, binary_offset: u32) -> GenerateResult<()> {
        if let Some(shader) = other
            .shaders
            .iter()
            .find(|shader| self.shaders.iter().any(|s| s.name == shader.name))
        {
            return Err(RegistryError::DuplicateShader(shader.name.clone()).into());
        }

        let mut merged = self.clone();
        merged.merge_declarations(other, binary_offset)?;
        *self = merged;
        Ok(())
    }

    fn merge_declarations(&mut self, other: &Registries, binary_offset: u32) -> GenerateResult<()> {
        self.shared_structs.merge(&other.shared_structs)?;
        let uniform_buffers = self.uniform_buffers.merge(&other.uniform_buffers)?;
        let vertex_formats = self.vertex_formats.merge(&other.vertex_formats)?;
        let instance_formats = self.instance_formats.merge(&other.instance_formats)?;

        for shader in &other.shaders {
            let stages = shader
                .stages
                .iter()
                .map(|stage| StageEntry {
                    stage: stage.stage,
                    offset: stage.offset + binary_offset,
                    size: stage.size,
                    uniform_buffers: stage
                        .uniform_buffers
                        .iter()
                        .map(|(buffer, slot)| (uniform_buffers[*buffer], *slot))
                        .collect(),
                })
                .collect();
            self.register_shader(ShaderEntry {
                name: shader.name.clone(),
                stages,
                vertex_format: shader.vertex_format.map(|id| vertex_formats[id]),
                instance_format: shader.instance_format.map(|id| instance_formats[id]),
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
fn fragments(header: &str) -> GenerateResult<Fragments> {
    Ok(Fragments {
        header: header.to_string(),
        ..Default::default()
    })
}

#[test]
fn test_register_dedup() {
    let mut registry = Registry::new("uniform_buffer");
    assert_eq!(registry.register("Transform", 1, || fragments("a")), Ok((0, true)));
    assert_eq!(registry.register("Camera", 2, || fragments("b")), Ok((1, true)));

    // Identical declarations merge without regenerating
    let again = registry.register("Transform", 1, || panic!("generated twice"));
    assert_eq!(again, Ok((0, false)));
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.find("Camera"), Some(1));
    assert_eq!(registry.find("Light"), None);
    assert_eq!(registry.get(0).fragments.header, "a");
}

#[test]
fn test_register_layout_mismatch() {
    let mut registry = Registry::new("shared_struct");
    registry.register("Light", 1, || fragments("")).unwrap();
    let err = registry.register("Light", 7, || fragments("")).unwrap_err();
    assert_eq!(
        err,
        GenerateError::Registry(RegistryError::LayoutMismatch {
            kind: "shared_struct",
            name: "Light".to_string()
        })
    );
    assert_eq!(
        err.to_string(),
        "shared_struct `Light` already declared with a different layout"
    );
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_register_failure_leaves_registry_unchanged() {
    let mut registry = Registry::new("vertex_format");
    let err = registry.register("Vertex", 1, || Err(GenerateError::UnsupportedBackend("test")));
    assert!(err.is_err());
    assert!(registry.is_empty());
    assert_eq!(registry.find("Vertex"), None);
}

#[test]
fn test_duplicate_shader() {
    let mut registries = Registries::new();
    let shader = ShaderEntry {
        name: "basic".to_string(),
        stages: Vec::new(),
        vertex_format: None,
        instance_format: None,
    };
    assert_eq!(registries.register_shader(shader.clone()), Ok(0));
    assert_eq!(
        registries.register_shader(shader),
        Err(GenerateError::Registry(RegistryError::DuplicateShader("basic".to_string())))
    );
}

#[test]
fn test_merge_remaps_ids() {
    let mut first = Registries::new();
    first.uniform_buffers.register("Camera", 1, || fragments("camera")).unwrap();

    let mut second = Registries::new();
    second.uniform_buffers.register("Transform", 2, || fragments("transform")).unwrap();
    second.uniform_buffers.register("Camera", 1, || fragments("camera")).unwrap();
    second
        .register_shader(ShaderEntry {
            name: "mesh".to_string(),
            stages: vec![StageEntry {
                stage: ShaderStage::Vertex,
                offset: 8,
                size: 4,
                uniform_buffers: vec![(0, 0), (1, 1)],
            }],
            vertex_format: None,
            instance_format: None,
        })
        .unwrap();

    first.merge(&second, 100).unwrap();
    assert_eq!(first.uniform_buffers.len(), 2);
    assert_eq!(first.uniform_buffers.find("Transform"), Some(1));
    let stage = &first.shaders[0].stages[0];
    assert_eq!(stage.offset, 108);
    assert_eq!(stage.uniform_buffers, [(1, 0), (0, 1)]);

    // Merging the same shaders twice is rejected before anything changes
    assert_eq!(
        first.merge(&second, 200),
        Err(GenerateError::Registry(RegistryError::DuplicateShader("mesh".to_string())))
    );
    assert_eq!(first.shaders.len(), 1);
}

#[test]
fn test_merge_conflict_keeps_registries() {
    let mut first = Registries::new();
    first.vertex_formats.register("Vertex", 1, || fragments("vertex")).unwrap();
    let before = first.clone();

    // Uniform buffers merge cleanly before the vertex format conflicts
    let mut second = Registries::new();
    second.uniform_buffers.register("Transform", 2, || fragments("transform")).unwrap();
    second.vertex_formats.register("Vertex", 3, || fragments("other vertex")).unwrap();

    assert_eq!(
        first.merge(&second, 0),
        Err(GenerateError::Registry(RegistryError::LayoutMismatch {
            kind: "vertex_format",
            name: "Vertex".to_string()
        }))
    );
    assert_eq!(first, before);
    assert!(first.uniform_buffers.is_empty());
}

#[test]
fn test_checksum() {
    // Standard CRC-32 check value
    assert_eq!(checksum("123456789"), 0xCBF43926);
    assert_ne!(checksum("Transform"), checksum("Transforms"));
}
