use crate::*;
use gfxsl_ast::*;

/// Backend for an API which is not implemented yet
///
/// Every operation fails with [GenerateError::UnsupportedBackend].
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct StubBackend {
    name: &'static str,
}

impl StubBackend {
    pub const D3D12: StubBackend = StubBackend { name: "D3D12" };
    pub const VULKAN: StubBackend = StubBackend { name: "Vulkan" };

    fn fail<T>(&self) -> GenerateResult<T> {
        Err(GenerateError::UnsupportedBackend(self.name))
    }
}

impl Backend for StubBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn check_supported(&self) -> GenerateResult<()> {
        self.fail()
    }

    fn layout_rules(&self) -> LayoutRules {
        LayoutRules::Std140
    }

    fn primitive_name(&self, _: PrimitiveType) -> GenerateResult<String> {
        self.fail()
    }

    fn texture_type_name(&self, _: TextureKind) -> GenerateResult<String> {
        self.fail()
    }

    fn generate_header(&self, _: &mut Generator) -> GenerateResult<()> {
        self.fail()
    }

    fn generate_structure(&self, _: &mut Generator, _: &Struct) -> GenerateResult<()> {
        self.fail()
    }

    fn generate_texture(&self, _: &mut Generator, _: &Texture) -> GenerateResult<()> {
        self.fail()
    }

    fn generate_entry_point(&self, _: &mut Generator, _: &Function) -> GenerateResult<()> {
        self.fail()
    }

    fn generate_input_glue(&self, _: &InputLayout) -> GenerateResult<Fragments> {
        self.fail()
    }
}

#[test]
fn test_stub_backends_fail() {
    let module = Module::new("empty");
    let mut registries = Registries::new();
    for backend in [StubBackend::D3D12, StubBackend::VULKAN] {
        assert_eq!(
            generate_shader(&module, &backend, &mut registries),
            Err(GenerateError::UnsupportedBackend(backend.name()))
        );
    }
    assert!(registries.shaders.is_empty());
}
