use crate::*;
use gfxsl_text::*;

fn preprocess_single_test(input: &str) -> Result<String, PreprocessError> {
    let mut source_manager = SourceManager::new();
    let tokens = preprocess_fragment(input, FileName("test.gfx".to_string()), &mut source_manager)?;
    Ok(unlex(&tokens, &source_manager))
}

fn preprocess_files_test<const N: usize>(
    entry: &str,
    pipeline_macros: &[&str],
    mut files: [(&str, &str); N],
) -> Result<String, PreprocessError> {
    let mut source_manager = SourceManager::new();
    let mut include_cache = IncludeCache::new();
    let pipeline_macros = pipeline_macros.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    let tokens = preprocess_shader(
        entry,
        &pipeline_macros,
        &mut source_manager,
        &mut include_cache,
        &mut files,
    )?;
    Ok(unlex(&tokens, &source_manager))
}

macro_rules! assert_text {
    ($left:expr, $right:expr $(,)?) => {
        match $left {
            Ok(text) => assert_eq!(text, $right),
            Err(err) => panic!("{:?}", err),
        }
    };
}

macro_rules! assert_err {
    ($left:expr, $right:pat $(,)?) => {
        let result: Result<String, PreprocessError> = $left;
        assert!(matches!(result, Err($right)), "{:?}", result);
    };
}

#[test]
fn test_empty() {
    let pp = preprocess_single_test;
    assert_text!(pp(""), "");
    assert_text!(pp("test"), "test\n");
    assert_text!(pp("t1\nt2"), "t1\nt2\n");
    assert_text!(pp("t1\r\nt2\n"), "t1\r\nt2\n");
}

#[test]
fn test_define() {
    let pp = preprocess_single_test;
    assert_text!(pp("#define X 0\nX"), "0\n");
    assert_text!(pp("#define X 0\nX X"), "0 0\n");
    assert_text!(pp("#define X 1\r\nX"), "1\n");
    assert_text!(pp("#define X 2\n#define Y X\nY"), "2\n");
    assert_text!(pp("#define X 2\\\n + 3\nX"), "2\n + 3\n");
    assert_text!(pp("#define X"), "");
    assert_text!(pp("#define X 0\n#define XY 1\nXY X"), "1 0\n");
    assert_text!(pp("#define X 0\n#undef X\nX"), "X\n");
    assert_text!(pp("#define X X + 1\nX"), "X + 1\n");
    assert_text!(pp("#define X 0\n#define X 0\nX"), "0\n");
    assert_text!(pp("#define F(a) a + 1\n#define F(a)  a+1\nF(2)"), "2 + 1\n");
    assert_err!(
        pp("#define X 0\n#define X 1\n"),
        PreprocessError::MacroAlreadyDefined(_, _)
    );
    assert_err!(
        pp("#define F(a) a\n#define F(a, b) a\n"),
        PreprocessError::MacroAlreadyDefined(_, _)
    );
    assert_err!(pp("#define 0"), PreprocessError::InvalidDefine(_));
    assert_err!(pp("#define X # 0"), PreprocessError::DirectiveInMacroBody(_));
    assert_err!(pp("#undef"), PreprocessError::InvalidUndef(_));
}

#[test]
fn test_define_function() {
    let pp = preprocess_single_test;
    assert_text!(pp("#define X(a) a\nX(2)"), "2\n");
    assert_text!(pp("#define ADD(a,b) a+b\nADD(1,2)"), "1+2\n");
    assert_text!(pp("#define ADD(a,b) a+b\nADD((1+2),3)"), "(1+2)+3\n");
    assert_text!(pp("#define ADD(a,b) a+b\nADD(f(1, 2), 3)"), "f(1, 2)+3\n");
    assert_text!(pp("#define X(a) a\n#define Y 1\nX(Y)"), "1\n");
    assert_text!(pp("#define X() 5\nX()"), "5\n");
    assert_text!(pp("#define X(a) a\nX + 1"), "X + 1\n");

    // Test multiple arguments with overlapping name substrings
    assert_text!(
        pp("#define X(a,ab,ba,b) a ab a ba b ab a\nX(0,1,2,3)"),
        "0 1 0 2 3 1 0\n"
    );

    // Test calling a macro in another macro
    assert_text!(
        pp("#define Macro0(Arg0, Arg1) {Arg0,Arg1}\n#define Macro1(Arg2, Arg3) Macro0(Arg2, Arg3)\nMacro1(X, Y)"),
        "{X,Y}\n"
    );

    // Test invoking a macro with another macro invocation inside it
    assert_text!(
        pp("#define Macro0(Arg0) {0:Arg0}\n#define Macro1(Arg1) {1:Arg1}\nMacro0(Macro1(X))"),
        "{0:{1:X}}\n"
    );

    // Line endings inside arguments are kept
    assert_text!(pp("#define ADD(a,b) a+b\nADD(1,\n2)"), "1+\n2\n");

    assert_err!(
        pp("#define ADD(a,b) a+b\nADD(1)"),
        PreprocessError::MacroExpectsDifferentNumberOfArguments(_, _, 2, 1)
    );
    assert_err!(
        pp("#define ADD(a,b) a+b\nADD(1,"),
        PreprocessError::MacroArgumentsNeverEnd(_, _)
    );
}

#[test]
fn test_condition() {
    let pp = preprocess_single_test;
    assert_err!(pp("#if 0\nX"), PreprocessError::ConditionChainNotFinished);
    assert_text!(pp("#if 0\nX\n#endif"), "");
    assert_text!(pp("#if 1\nX\n#endif"), "X\n");
    assert_text!(pp("#if 0\nX\n#else\nY\n#endif"), "Y\n");
    assert_text!(pp("#if 1\nX\n#else\nY\n#endif"), "X\n");
    assert_text!(pp("#if 0\n#if 1\nX\n#else\nY\n#endif\n#endif"), "");
    assert_text!(pp("#if 1\n#if 0\nX\n#else\nY\n#endif\n#endif"), "Y\n");
    assert_text!(pp("#if 0\nX\n#elif 1\nY\n#else\nZ\n#endif"), "Y\n");
    assert_text!(pp("#if 1\nX\n#elif 1\nY\n#else\nZ\n#endif"), "X\n");
    assert_text!(pp("#if 0\nX\n#elif 0\nY\n#else\nZ\n#endif"), "Z\n");
    assert_text!(pp("#if 2 > 1 && !defined(UNDEF)\nX\n#endif"), "X\n");
    assert_text!(pp("#define A\n#if A\nX\n#endif"), "X\n");
    assert_text!(pp("#define A 0\n#if A\nX\n#endif"), "");
    assert_text!(pp("#define A\n#if defined A && !undefined(A)\nX\n#endif"), "X\n");
    assert_text!(pp("#define A 3\n#if A * 2 == 6\nX\n#endif"), "X\n");
    assert_text!(pp("#ifdef A\nX\n#endif"), "");
    assert_text!(pp("#ifndef A\nX\n#endif"), "X\n");
    assert_text!(pp("#define A\n#ifdef A\nX\n#else\nY\n#endif"), "X\n");

    // Conditions in disabled blocks are not evaluated
    assert_text!(pp("#if 0\n#if 1 / 0\n#endif\n#endif"), "");
    assert_text!(pp("#if 1\nX\n#elif 1 / 0\nY\n#endif"), "X\n");

    // Operands skipped by && and || are not evaluated
    assert_text!(pp("#if defined(N) && 10 / N > 1\nX\n#endif"), "");
    assert_text!(pp("#define N 5\n#if defined(N) && 10 / N > 1\nX\n#endif"), "X\n");
    assert_text!(pp("#if !defined(N) || 10 % N\nX\n#endif"), "X\n");

    // Defines in disabled blocks are not applied
    assert_text!(pp("#if 0\n#define X 1\n#endif\nX"), "X\n");

    assert_err!(pp("#if 1 / 0\n#endif"), PreprocessError::ConditionDivisionByZero(_));
    assert_err!(pp("#if 1 % 0\n#endif"), PreprocessError::ConditionDivisionByZero(_));
    assert_err!(pp("#if 1.5 | 1\n#endif"), PreprocessError::ConditionBitwiseOnFloat(_));
    assert_err!(pp("#if 1 ? 1\n#endif"), PreprocessError::FailedToParseIfCondition(_));
    assert_err!(pp("#endif"), PreprocessError::EndIfNotMatched(_));
    assert_err!(pp("#else"), PreprocessError::ElseNotMatched(_));
    assert_err!(pp("#if 1\n#else\n#else\n#endif"), PreprocessError::ElseAfterElse(_));
    assert_err!(pp("#if 1\n#else\n#elif 1\n#endif"), PreprocessError::ElseAfterElse(_));
    assert_err!(pp("#ifdef\n#endif"), PreprocessError::InvalidIfdef(_));
    assert_err!(pp("#else 1"), PreprocessError::InvalidElse(_));
    assert_err!(pp("#unknown"), PreprocessError::UnknownCommand(_));
}

#[test]
fn test_include() {
    let files = [
        ("main.gfx", "#include \"a.gfx\"\nmain\n"),
        ("a.gfx", "#include \"b.gfx\"\na\n"),
        ("b.gfx", "#define B 7\nb\n"),
    ];
    assert_text!(preprocess_files_test("main.gfx", &[], files), "b\na\nmain\n");

    let files = [("main.gfx", "#include <lib.gfx>\nB\n"), ("lib.gfx", "#define B 7\n")];
    assert_text!(preprocess_files_test("main.gfx", &[], files), "7\n");

    let files = [("main.gfx", "#include \"missing.gfx\"\n")];
    assert_err!(
        preprocess_files_test("main.gfx", &[], files),
        PreprocessError::FailedToFindFile(_, _, IncludeError::FileNotFound)
    );

    let files = [("main.gfx", "#include \"unterminated.gfx\n")];
    assert_err!(
        preprocess_files_test("main.gfx", &[], files),
        PreprocessError::LexerError(_)
    );

    let files = [("main.gfx", "#include\n")];
    assert_err!(
        preprocess_files_test("main.gfx", &[], files),
        PreprocessError::InvalidInclude(_)
    );
}

#[test]
fn test_pragma_once() {
    let files = [
        ("main.gfx", "#include \"a.gfx\"\n#include \"b.gfx\"\n"),
        ("a.gfx", "#include \"common.gfx\"\na\n"),
        ("b.gfx", "#include \"common.gfx\"\nb\n"),
        ("common.gfx", "#pragma once\ncommon\n"),
    ];
    assert_text!(
        preprocess_files_test("main.gfx", &[], files),
        "common\na\nb\n"
    );

    // Unknown pragmas are ignored
    let files = [("main.gfx", "#pragma unknown\nx\n")];
    assert_text!(preprocess_files_test("main.gfx", &[], files), "x\n");
}

#[test]
fn test_include_cycle() {
    let files = [
        ("main.gfx", "#include \"a.gfx\"\n"),
        ("a.gfx", "#include \"b.gfx\"\n"),
        ("b.gfx", "#include \"a.gfx\"\n"),
    ];
    assert_err!(
        preprocess_files_test("main.gfx", &[], files),
        PreprocessError::IncludeCycle(_, _)
    );

    // Guarded cycles are fine
    let files = [
        ("main.gfx", "#include \"a.gfx\"\n"),
        ("a.gfx", "#pragma once\n#include \"b.gfx\"\na\n"),
        ("b.gfx", "#include \"a.gfx\"\nb\n"),
    ];
    assert_text!(preprocess_files_test("main.gfx", &[], files), "b\na\n");
}

#[test]
fn test_pipeline_macros() {
    let files = [(
        "main.gfx",
        "#ifdef GRAPHICS_OPENGL\ngl QUALITY\n#else\nother\n#endif\n",
    )];
    assert_text!(
        preprocess_files_test("main.gfx", &["GRAPHICS_OPENGL", "QUALITY=2"], files),
        "gl 2\n"
    );
    assert_text!(
        preprocess_files_test("main.gfx", &["GRAPHICS_METAL"], files),
        "other\n"
    );
}

#[test]
fn test_pipeline_file_reused() {
    let run = |count: usize| {
        let mut source_manager = SourceManager::new();
        let mut include_cache = IncludeCache::new();
        let mut files = [("main.gfx", "QUALITY\n")];
        let pipeline_macros = vec!["QUALITY=2".to_string()];
        for _ in 0..count {
            let tokens = preprocess_shader(
                "main.gfx",
                &pipeline_macros,
                &mut source_manager,
                &mut include_cache,
                &mut files,
            )
            .unwrap();
            assert_eq!(unlex(&tokens, &source_manager), "2\n");
        }
        source_manager.add_fragment("")
    };

    // The same macro set does not add another file
    assert_eq!(run(3), run(1));
}

#[test]
fn test_include_cache_persists() {
    let mut source_manager = SourceManager::new();
    let mut include_cache = IncludeCache::new();
    let mut files = [
        ("a.gfx", "#include \"common.gfx\"\n#define LOCAL 1\n"),
        ("b.gfx", "#include \"common.gfx\"\nLOCAL\n"),
        ("common.gfx", "#pragma once\ncommon\n"),
    ];

    let a = preprocess_shader("a.gfx", &[], &mut source_manager, &mut include_cache, &mut files)
        .unwrap();
    assert_eq!(unlex(&a, &source_manager), "common\n");
    assert_eq!(include_cache.len(), 2);

    // Macros and pragma once marks do not leak between shaders but loaded files are reused
    let b = preprocess_shader("b.gfx", &[], &mut source_manager, &mut include_cache, &mut files)
        .unwrap();
    assert_eq!(unlex(&b, &source_manager), "common\nLOCAL\n");
    assert_eq!(include_cache.len(), 3);
}

#[test]
fn test_file_system_includes() {
    let dir = tempfile::tempdir().unwrap();
    let shaders = dir.path().join("shaders");
    let library = dir.path().join("library");
    std::fs::create_dir_all(shaders.join("nested")).unwrap();
    std::fs::create_dir_all(&library).unwrap();

    std::fs::write(
        shaders.join("main.gfx"),
        "#include \"nested/local.gfx\"\n#include \"lib.gfx\"\n",
    )
    .unwrap();
    std::fs::write(shaders.join("nested").join("local.gfx"), "#include \"sibling.gfx\"\nlocal\n").unwrap();
    std::fs::write(shaders.join("nested").join("sibling.gfx"), "sibling\n").unwrap();
    std::fs::write(library.join("lib.gfx"), "library\n").unwrap();
    std::fs::write(shaders.join("lib.gfx"), "shadowed\n").unwrap();

    let mut handler = FileSystemIncludeHandler::new().with_library(&library, &["lib.gfx"]);
    let mut source_manager = SourceManager::new();
    let mut include_cache = IncludeCache::new();
    let entry = shaders.join("main.gfx");
    let tokens = preprocess_shader(
        &entry.to_string_lossy(),
        &[],
        &mut source_manager,
        &mut include_cache,
        &mut handler,
    )
    .unwrap();
    assert_eq!(unlex(&tokens, &source_manager), "sibling\nlocal\nlibrary\n");
}

#[test]
fn test_prepare_tokens() {
    use gfxsl_text::tokens::*;
    let mut source_manager = SourceManager::new();
    let tokens = preprocess_fragment(
        "#define N 4\nfloat x = N; // comment\n",
        FileName("test.gfx".to_string()),
        &mut source_manager,
    )
    .unwrap();
    let lex_tokens = prepare_tokens(&tokens)
        .into_iter()
        .map(|t| t.0)
        .collect::<Vec<_>>();
    assert_eq!(
        lex_tokens,
        vec![
            Token::Id(Identifier("float".to_string())),
            Token::Id(Identifier("x".to_string())),
            Token::Equals,
            Token::LiteralInt(4),
            Token::Semicolon,
            Token::Eof,
        ]
    );
}
