use super::*;

/// Preprocess and parse a source string
#[track_caller]
fn parse_from_str(source: &str) -> (Result<Module, ParseError>, SourceManager) {
    let mut source_manager = SourceManager::new();
    let modified_string = source.to_string() + "\n";
    let tokens = match gfxsl_preprocess::preprocess_fragment(
        &modified_string,
        FileName("parser_test.gfx".to_string()),
        &mut source_manager,
    ) {
        Ok(tokens) => tokens,
        Err(err) => panic!("{}", err.display(&source_manager)),
    };
    let tokens = gfxsl_preprocess::prepare_tokens(&tokens);
    (parse(&tokens, "parser_test"), source_manager)
}

/// Check that a source string parses
#[track_caller]
fn check(source: &str) -> Module {
    match parse_from_str(source) {
        (Ok(module), _) => module,
        (Err(err), source_manager) => panic!("{}", err.display(&source_manager)),
    }
}

/// Check that a source string fails to parse and return the reason
#[track_caller]
fn expect_fail(source: &str) -> ParseErrorReason {
    match parse_from_str(source) {
        (Ok(module), _) => panic!("parse succeeded with {} nodes", module.nodes.len()),
        (Err(err), _) => err.reason,
    }
}

const TRANSFORM_SHADER: &str = "
vertex_input Vertex { float3 position : POSITION(FLOAT32); float2 uv : TEXCOORD(UNORM16); };
uniform_buffer Transform { float4x4 mvp; };
vertex_output Interp { float4 position : POSITION; float2 uv : TEXCOORD; };
fragment_output Target { float4 color : COLOR; };
texture2D albedo;

float4 expand(float3 v) { return float4(v, 1.0); }

void main_vertex(Vertex vertex, Transform transform, out Interp output) {
    output.position = mul(transform.mvp, expand(vertex.position));
    output.uv = vertex.uv;
}

void main_fragment(Interp input, out Target target) {
    target.color = texture_sample(albedo, input.uv);
}
";

#[test]
fn test_full_shader() {
    let module = check(TRANSFORM_SHADER);
    assert_eq!(module.structs.len(), 4);
    assert_eq!(module.textures.len(), 1);
    assert_eq!(module.functions.len(), 3);
    assert_eq!(module.stages(), vec![ShaderStage::Vertex, ShaderStage::Fragment]);

    let transform = module.find_type("Transform").unwrap();
    let sd = module.struct_for_type(transform).unwrap();
    assert_eq!(sd.kind, StructKind::UniformBuffer);
    assert_eq!(sd.slot, Some(0));
    assert_eq!(module.get_type(transform).size_padded, 64);

    let vertex = module.find_type("Vertex").unwrap();
    let members = module.members(vertex);
    assert_eq!(members.len(), 2);
    assert_eq!(members[0].semantic, Some(Semantic::Position));
    assert_eq!(members[0].format, Some(InputFormat::Float32));
    assert_eq!(members[1].format, Some(InputFormat::Unorm16));

    let interp = module.find_type("Interp").unwrap();
    assert!(module.get_type(interp).pipeline_intermediate);
}

#[test]
fn test_buffer_slots() {
    let module = check(
        "
uniform_buffer A { float a; };
constant_buffer B (slot = 5) { float b; };
mutable_buffer C { float c; };
",
    );
    let slot = |name: &str| {
        let ty = module.find_type(name).unwrap();
        module.struct_for_type(ty).unwrap().slot
    };
    assert_eq!(slot("A"), Some(0));
    assert_eq!(slot("B"), Some(5));
    assert_eq!(slot("C"), Some(1));
}

#[test]
fn test_default_slot_skips_explicit_slots() {
    let module = check(
        "
uniform_buffer Camera (slot = 0) { float4x4 view; };
uniform_buffer Transform { float4x4 mvp; };
uniform_buffer Lights { float4 color; };
",
    );
    let slot = |name: &str| {
        let ty = module.find_type(name).unwrap();
        module.struct_for_type(ty).unwrap().slot
    };
    assert_eq!(slot("Camera"), Some(0));
    assert_eq!(slot("Transform"), Some(1));
    assert_eq!(slot("Lights"), Some(2));

    assert_eq!(
        expect_fail(
            "uniform_buffer A { float a; };
constant_buffer B (slot = 0) { float b; };"
        ),
        ParseErrorReason::DuplicateSlot("B".to_string(), 0)
    );
}

#[test]
fn test_struct_rules() {
    assert_eq!(
        expect_fail("vertex_input V { float3 p : POSITION; };"),
        ParseErrorReason::MemberRequiresFormat("p".to_string())
    );
    assert_eq!(
        expect_fail("vertex_output V { float3 p : POSITION(FLOAT32); };"),
        ParseErrorReason::MemberDoesNotAllowFormat("p".to_string())
    );
    assert_eq!(
        expect_fail("struct S { float3 p : POSITION; };"),
        ParseErrorReason::MemberDoesNotAllowSemantic("p".to_string())
    );
    assert_eq!(
        expect_fail("fragment_output F { float4 c; };"),
        ParseErrorReason::MemberRequiresSemantic("c".to_string())
    );
    assert_eq!(
        expect_fail("fragment_input F { float4 c : VERTEX; };"),
        ParseErrorReason::SystemValueSemanticOnMember("VERTEX".to_string())
    );
    assert_eq!(
        expect_fail("struct S { float a; int a; };"),
        ParseErrorReason::Redefinition("a".to_string())
    );
    assert_eq!(
        expect_fail("struct S { };"),
        ParseErrorReason::EmptyStruct("S".to_string())
    );
    assert_eq!(
        expect_fail("struct S (slot = 1) { float a; };"),
        ParseErrorReason::UnknownAttribute("slot".to_string())
    );
    assert_eq!(
        expect_fail("struct A { float a; }; uniform_buffer B { A a; };"),
        ParseErrorReason::InvalidMemberType("A".to_string(), "uniform_buffer".to_string())
    );
    assert_eq!(
        expect_fail("struct S { float a[0]; };"),
        ParseErrorReason::ArrayDimensionMustBeNonZero
    );
    check("shared_struct A { float3 a; }; uniform_buffer B { A a[2]; float b; };");
}

#[test]
fn test_entry_point_rules() {
    let outputs = "vertex_output O { float4 p : POSITION; }; fragment_output F { float4 c : COLOR; };";
    assert!(matches!(
        expect_fail(&format!("{outputs} void main_vertex(O o) {{ }}")),
        ParseErrorReason::InvalidEntryPoint(_, _)
    ));
    assert!(matches!(
        expect_fail(&format!("{outputs} int main_fragment(out F f) {{ return 0; }}")),
        ParseErrorReason::InvalidEntryPoint(_, _)
    ));
    assert!(matches!(
        expect_fail(&format!("{outputs} void helper(O o) {{ }}")),
        ParseErrorReason::StageStructNotAllowed(_)
    ));
    assert!(matches!(
        expect_fail(&format!("{outputs} [threads(8, 8, 1)] void main_fragment(out F f) {{ }}")),
        ParseErrorReason::ThreadsAttributeOnNonCompute(_)
    ));
    check(&format!("{outputs} void main_vertex(out O o) {{ o.p = float4(0.0, 0.0, 0.0, 1.0); }}"));

    let module = check("mutable_buffer Data { uint values[64]; }; [threads(64, 1, 1)] void main_compute(Data data) { data.values[dispatch_thread_id.x] = 1u; }");
    let entry = module.entry_point(ShaderStage::Compute).unwrap();
    assert_eq!(entry.threads, [64, 1, 1]);
}

#[test]
fn test_statements() {
    let module = check(
        "
int count(int n) {
    int total = 0;
    for (int i = 0; i < n; i++) {
        if (i % 2 == 0) { continue; }
        total += i;
    }
    while (total > 100) { total -= 10; }
    do { total++; } while (false);
    switch (total) {
        case 0: return 1;
        case 1u:
        default: break;
    }
    return total;
}
",
    );
    let function = module.find_function("count").unwrap();
    let body = module.get_function(function).body.unwrap();
    match module.nodes.get(body) {
        Node::Block(statements) => assert_eq!(statements.len(), 6),
        node => panic!("{node:?}"),
    }
}

#[test]
fn test_statement_errors() {
    assert_eq!(
        expect_fail("void f() { break; }"),
        ParseErrorReason::BreakOutsideLoop
    );
    assert_eq!(
        expect_fail("void f() { continue; }"),
        ParseErrorReason::ContinueOutsideLoop
    );
    assert_eq!(
        expect_fail("int f() { return; }"),
        ParseErrorReason::MissingReturnValue
    );
    assert_eq!(
        expect_fail("void f() { return 1; }"),
        ParseErrorReason::UnexpectedReturnValue
    );
    assert_eq!(
        expect_fail("void f() { if (1) { } }"),
        ParseErrorReason::ConditionMustBeBool("int".to_string())
    );
    assert_eq!(
        expect_fail("void f() { float x = 1.0; switch (x) { } }"),
        ParseErrorReason::IndexMustBeInteger("float".to_string())
    );
    assert_eq!(
        expect_fail("void f() { int x; int x; }"),
        ParseErrorReason::Redefinition("x".to_string())
    );
    assert_eq!(
        expect_fail("void f() { y = 1; }"),
        ParseErrorReason::UnknownIdentifier("y".to_string())
    );
    check("void f() { int x; { float x = 1.0; } }");
}

#[test]
fn test_expression_types() {
    let module = check(
        "
float f(float3 v, float4x4 m, int i, uint u) {
    float3 a = v * 2;
    float4 b = mul(m, float4(v, 1.0));
    float c = dot(a, b.xyz) + i;
    uint d = u << 2u | 1u;
    bool e = c > 0.0 && !(d == 0u);
    float2 g = e ? v.xy : float2(0.0, 1.0);
    return g.y + b[2] + m[1].x + length(v);
}
",
    );
    let function = module.find_function("f").unwrap();
    assert_eq!(
        module.type_name(module.get_function(function).return_type),
        "float"
    );
}

#[test]
fn test_expression_errors() {
    assert!(matches!(
        expect_fail("int f(float x) { return x; }"),
        ParseErrorReason::TypeMismatch(_, _)
    ));
    assert!(matches!(
        expect_fail("void f(float4x4 m, float4 v) { float4 r = m * v; }"),
        ParseErrorReason::BinaryOperationWrongTypes(BinaryOp::Multiply, _, _)
    ));
    assert!(matches!(
        expect_fail("void f(float a) { float b = a % 2.0; }"),
        ParseErrorReason::BinaryOperationWrongTypes(BinaryOp::Remainder, _, _)
    ));
    assert!(matches!(
        expect_fail("void f(float2 a) { float b = a.z; }"),
        ParseErrorReason::InvalidSwizzle(_, _)
    ));
    assert!(matches!(
        expect_fail("void f(float3 a) { a.xx = float2(1.0, 1.0); }"),
        ParseErrorReason::LvalueRequired
    ));
    assert!(matches!(
        expect_fail("void f() { float3 a = float3(1.0, 2.0); }"),
        ParseErrorReason::InvalidConstructor(_)
    ));
    assert!(matches!(
        expect_fail("void f() { float a = clamp(1.0, 2.0); }"),
        ParseErrorReason::WrongArgumentCount(_, 3, 2)
    ));
    assert!(matches!(
        expect_fail("void f() { 1 = 2; }"),
        ParseErrorReason::LvalueRequired
    ));
    assert!(matches!(
        expect_fail("const float K = 1.0; void f() { K = 2.0; }"),
        ParseErrorReason::AssignmentToReadOnly(_)
    ));
    assert!(matches!(
        expect_fail("uniform_buffer U { float a; }; void f(U u) { u.a = 1.0; }"),
        ParseErrorReason::AssignmentToReadOnly(_)
    ));
    assert!(matches!(
        expect_fail("void f() { vertex_id = 1u; }"),
        ParseErrorReason::AssignmentToReadOnly(_)
    ));
}

#[test]
fn test_texture_intrinsics() {
    check(
        "
texture2D t2;
texture2DArray ta;
textureCube tc;
float4 f(float2 uv) {
    uint2 size = texture_size(t2);
    return texture_sample(t2, uv)
        + texture_sample_level(tc, float3(uv, 1.0), 0.0)
        + texture_sample_array(ta, uv, 1.0)
        + texture_load(t2, int2(0, 0), 0);
}
",
    );
    assert!(matches!(
        expect_fail("texture2DArray ta; float4 f(float2 uv) { return texture_sample(ta, uv); }"),
        ParseErrorReason::WrongTextureKind(_, "texture2DArray")
    ));
    assert!(matches!(
        expect_fail("float4 f(float2 uv) { return texture_sample(uv, uv); }"),
        ParseErrorReason::ExpectedTexture(_)
    ));
    assert!(matches!(
        expect_fail("texture2D float2;"),
        ParseErrorReason::Redefinition(_)
    ));
}

#[test]
fn test_calls() {
    check(
        "
void scale(inout float3 v, float s) { v = v * s; }
float3 g(float3 v) { scale(v, 2.0); return v; }
",
    );
    assert!(matches!(
        expect_fail("void scale(out float v) { v = 1.0; } void g() { scale(2.0); }"),
        ParseErrorReason::LvalueRequired
    ));
    assert!(matches!(
        expect_fail("void a(float v) { } void g() { a(); }"),
        ParseErrorReason::WrongArgumentCount(_, 1, 0)
    ));
    // Functions must be declared before use so recursion is rejected
    assert_eq!(
        expect_fail("int r(int n) { return r(n - 1); }"),
        ParseErrorReason::UnknownIdentifier("r".to_string())
    );
}

#[test]
fn test_system_values() {
    let module = check(
        "
fragment_output F { float4 c : COLOR; };
void main_fragment(out F f) {
    f.c = front_facing ? float4(1.0, 1.0, 1.0, 1.0) : float4(0.0, 0.0, 0.0, 1.0);
    f.c.x = f.c.x + primitive_id + primitive_id;
}
",
    );
    let id = module.find_system_value(Semantic::Primitive).unwrap();
    assert_eq!(module.type_name(module.get_variable(id).type_id), "uint");
    assert_eq!(
        module
            .variables
            .iter()
            .filter(|v| v.kind == VariableKind::SystemValue)
            .count(),
        2
    );
}

#[test]
fn test_reachability() {
    let module = check(
        "
shared_struct Light { float3 direction; float intensity; };
uniform_buffer Lights { Light sun; };
uniform_buffer Unused { float4 tint; };
vertex_output O { float4 p : POSITION; };
texture2D used;
texture2D unused;
const float SCALE = 0.5;
float helper(float x) { return x * SCALE; }
float dead(float x) { return x; }
void main_vertex(Lights lights, out O o) {
    o.p = float4(lights.sun.direction * helper(lights.sun.intensity), 1.0) + texture_sample_level(used, float2(0.0, 0.0), 0.0);
}
",
    );
    let entry = module.entry_point(ShaderStage::Vertex).unwrap().id;
    let reachable = Reachability::compute(&module, entry);

    let names = reachable
        .functions(&module)
        .iter()
        .map(|f| f.name.clone())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["helper".to_string(), "main_vertex".to_string()]);

    let structs = reachable
        .structs(&module)
        .iter()
        .map(|sd| module.type_name(sd.type_id).to_string())
        .collect::<Vec<_>>();
    assert_eq!(structs, vec!["Light", "Lights", "O"]);

    let textures = reachable
        .textures(&module)
        .iter()
        .map(|t| t.name.clone())
        .collect::<Vec<_>>();
    assert_eq!(textures, vec!["used".to_string()]);
    assert_eq!(reachable.globals.len(), 1);
}
