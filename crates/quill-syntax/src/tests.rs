use pretty_assertions::assert_eq;

use crate::ast::{
    Block, BodyRef, Expr, FieldInit, MemberDecl, Stmt, TypeDecl, TypeKind,
};
use crate::lexer::{lex, lex_with_errors};
use crate::literals::{
    parse_int_literal, unescape_string_literal, unescape_string_prefix, unescape_text_block,
};
use crate::printer;
use crate::token::TokenKind;
use crate::{
    parse, parse_diet, parse_expression, parse_full, JavaLanguageLevel, Parse, ParseOptions,
};

fn dump_non_trivia(input: &str) -> Vec<(TokenKind, String)> {
    lex(input)
        .into_iter()
        .filter(|t| !t.kind.is_trivia())
        .map(|t| (t.kind, t.text(input).to_string()))
        .collect()
}

fn kinds(input: &str) -> Vec<TokenKind> {
    dump_non_trivia(input).into_iter().map(|(k, _)| k).collect()
}

fn member_names(decl: &TypeDecl) -> Vec<String> {
    decl.members
        .iter()
        .map(|m| match m {
            MemberDecl::Field(f) => f.name.clone(),
            MemberDecl::Method(m) => m.name.clone(),
            MemberDecl::Constructor(c) => c.name.clone(),
            MemberDecl::Initializer(_) => "<init>".to_string(),
            MemberDecl::Type(t) => t.name.clone(),
        })
        .collect()
}

fn first_method_block(parse: &Parse) -> &Block {
    for member in &parse.unit.types[0].members {
        if let MemberDecl::Method(method) = member {
            if let BodyRef::Parsed(block) = &method.body {
                return block;
            }
        }
    }
    panic!("no parsed method body in {:?}", parse.unit);
}

fn expr(source: &str) -> Expr {
    parse_expression(source, &ParseOptions::default())
        .expect("lexable")
        .expr
}

// --- Lexer ---

#[test]
fn lexes_declarations_into_expected_kinds() {
    assert_eq!(
        kinds("int x = 42;"),
        vec![
            TokenKind::IntKw,
            TokenKind::Identifier,
            TokenKind::Eq,
            TokenKind::IntLiteral,
            TokenKind::Semicolon,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn contextual_keywords_get_dedicated_kinds() {
    assert_eq!(
        kinds("var record sealed permits yield"),
        vec![
            TokenKind::VarKw,
            TokenKind::RecordKw,
            TokenKind::SealedKw,
            TokenKind::PermitsKw,
            TokenKind::YieldKw,
            TokenKind::Eof,
        ]
    );
    // `non-sealed` is a single token despite the hyphen.
    assert_eq!(
        kinds("non-sealed class"),
        vec![TokenKind::NonSealedKw, TokenKind::ClassKw, TokenKind::Eof]
    );
}

#[test]
fn operators_lex_with_maximal_munch() {
    assert_eq!(
        kinds("a >>>= b >> c >= d"),
        vec![
            TokenKind::Identifier,
            TokenKind::UnsignedRightShiftEq,
            TokenKind::Identifier,
            TokenKind::RightShift,
            TokenKind::Identifier,
            TokenKind::GreaterEq,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn numeric_literal_suffixes_pick_the_kind() {
    assert_eq!(
        kinds("1 1L 0x1F 1_000 1.5f 1e3 0b101"),
        vec![
            TokenKind::IntLiteral,
            TokenKind::LongLiteral,
            TokenKind::IntLiteral,
            TokenKind::IntLiteral,
            TokenKind::FloatLiteral,
            TokenKind::DoubleLiteral,
            TokenKind::IntLiteral,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn unterminated_string_is_an_error_token_not_fatal() {
    let (tokens, errors) = lex_with_errors("\"abc");
    assert_eq!(tokens[0].kind, TokenKind::Error);
    assert_eq!(errors.len(), 1);
    assert!(!errors[0].fatal);
}

#[test]
fn unterminated_block_comment_aborts_the_parse() {
    let (_, errors) = lex_with_errors("class C {} /* trailing");
    assert!(errors.iter().any(|e| e.fatal));
    assert!(parse_diet("class C {} /* trailing", &ParseOptions::default()).is_err());
}

// --- Literal decoding ---

#[test]
fn int_literals_decode_in_every_radix() {
    assert_eq!(parse_int_literal("42"), Ok(42));
    assert_eq!(parse_int_literal("0x1F"), Ok(31));
    assert_eq!(parse_int_literal("0b101"), Ok(5));
    assert_eq!(parse_int_literal("017"), Ok(15));
    assert_eq!(parse_int_literal("1_000_000"), Ok(1_000_000));
    assert_eq!(parse_int_literal("9223372036854775807L"), Ok(i64::MAX));
    assert!(parse_int_literal("18446744073709551616").is_err());
    assert!(parse_int_literal("0x").is_err());
}

#[test]
fn string_escapes_decode() {
    assert_eq!(
        unescape_string_literal("\"a\\tb\\u0041\\101\""),
        Ok("a\tbAA".to_string())
    );
    assert!(unescape_string_literal("\"\\q\"").is_err());
}

#[test]
fn string_prefix_decoding_drops_a_partial_escape() {
    assert_eq!(unescape_string_prefix("\"ab\\u00"), "ab");
    assert_eq!(unescape_string_prefix("\"ZZZ"), "ZZZ");
}

#[test]
fn text_blocks_strip_incidental_indentation() {
    let raw = "\"\"\"\n    hello\n      world\n    \"\"\"";
    assert_eq!(unescape_text_block(raw), Ok("hello\n  world\n".to_string()));
}

// --- Diet pass ---

#[test]
fn diet_parse_skips_bodies_and_records_spans() {
    let source = "class Foo { void run() { int x = 1; } Foo() { } }";
    let diet = parse_diet(source, &ParseOptions::default()).unwrap();
    assert_eq!(member_names(&diet.unit.types[0]), vec!["run", "Foo"]);
    assert_eq!(diet.skipped.len(), 2);
    for span in &diet.skipped {
        assert!(span.terminated);
        assert!(span.span.text(source).starts_with('{'));
        assert!(span.span.text(source).ends_with('}'));
    }
    for member in &diet.unit.types[0].members {
        match member {
            MemberDecl::Method(m) => assert!(matches!(m.body, BodyRef::Skipped(_))),
            MemberDecl::Constructor(c) => assert!(matches!(c.body, BodyRef::Skipped(_))),
            other => panic!("unexpected member {other:?}"),
        }
    }
}

#[test]
fn diet_parse_splits_multi_declarator_fields() {
    let source = "class C { int x = 1, y[], z; }";
    let diet = parse_diet(source, &ParseOptions::default()).unwrap();
    let decl = &diet.unit.types[0];
    assert_eq!(member_names(decl), vec!["x", "y", "z"]);
    match (&decl.members[0], &decl.members[1]) {
        (MemberDecl::Field(x), MemberDecl::Field(y)) => {
            match &x.init {
                FieldInit::Skipped { span, .. } => assert_eq!(span.text(source), "1"),
                other => panic!("expected skipped initializer, got {other:?}"),
            }
            assert_eq!(y.ty.text, "int[]");
            assert!(matches!(y.init, FieldInit::None));
        }
        _ => panic!("expected fields"),
    }
}

#[test]
fn diet_skeleton_matches_full_parse_skeleton() {
    let source = "package a.b;\nimport java.util.List;\npublic class Foo extends Base implements I, J { int x = 1; public void run(String[] args) { x = 2; } }";
    let options = ParseOptions::default();
    let diet = parse_diet(source, &options).unwrap();
    let full = parse_full(source, &options).unwrap();
    assert_eq!(
        printer::skeleton_to_string(&diet.unit),
        printer::skeleton_to_string(&full.unit)
    );
    assert!(printer::unit_to_string(&full.unit).contains("x = 2"));
    assert!(printer::unit_to_string(&full.unit).contains("int x = 1;"));
}

#[test]
fn parse_body_leaves_the_diet_tree_untouched() {
    let source = "class C { void m() { f(); g(); } }";
    let options = ParseOptions::default();
    let diet = parse_diet(source, &options).unwrap();
    let before = printer::skeleton_to_string(&diet.unit);
    let body = diet.parse_body(0, &options).expect("body 0 exists");
    assert_eq!(body.block.statements.len(), 2);
    assert_eq!(printer::skeleton_to_string(&diet.unit), before);
    assert!(diet.parse_body(99, &options).is_none());
}

#[test]
fn diet_only_mode_keeps_bodies_skipped() {
    let options = ParseOptions {
        diet_only: true,
        ..ParseOptions::default()
    };
    let parse = parse("class C { void m() { f(); } }", &options).unwrap();
    match &parse.unit.types[0].members[0] {
        MemberDecl::Method(m) => assert!(matches!(m.body, BodyRef::Skipped(_))),
        other => panic!("unexpected member {other:?}"),
    }
}

#[test]
fn enum_constants_and_trailing_members() {
    let source = "enum E { A, B(1), C { void x() { } }; int f; }";
    let diet = parse_diet(source, &ParseOptions::default()).unwrap();
    let decl = &diet.unit.types[0];
    assert_eq!(decl.kind, TypeKind::Enum);
    let constants: Vec<&str> = decl.constants.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(constants, vec!["A", "B", "C"]);
    assert_eq!(member_names(decl), vec!["f"]);
}

#[test]
fn generic_members_parse_as_methods_and_constructors() {
    let source = "class C { <T> T id(T x) { return x; } <T> C(T x) { } }";
    let diet = parse_diet(source, &ParseOptions::default()).unwrap();
    assert_eq!(member_names(&diet.unit.types[0]), vec!["id", "C"]);
    assert!(diet.diagnostics.is_empty(), "{:?}", diet.diagnostics);
    match &diet.unit.types[0].members[0] {
        MemberDecl::Method(m) => assert_eq!(m.return_ty.text, "T"),
        other => panic!("expected method, got {other:?}"),
    }
    let full = parse_full(source, &ParseOptions::default()).unwrap();
    assert_eq!(
        printer::stmt_to_string(&first_method_block(&full).statements[0]),
        "return x;"
    );
}

#[test]
fn sealed_type_keeps_its_permits_clause() {
    let diet = parse_diet(
        "sealed interface Shape permits Circle, Square { }",
        &ParseOptions::default(),
    )
    .unwrap();
    let decl = &diet.unit.types[0];
    let permitted: Vec<&str> = decl.permits.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(permitted, vec!["Circle", "Square"]);
    assert!(printer::skeleton_to_string(&diet.unit).contains("permits Circle, Square"));
}

#[test]
fn record_header_components() {
    let diet = parse_diet("record P(int x, String y) { }", &ParseOptions::default()).unwrap();
    let decl = &diet.unit.types[0];
    assert_eq!(decl.kind, TypeKind::Record);
    let components: Vec<&str> = decl.components.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(components, vec!["x", "y"]);
}

#[test]
fn empty_source_parses_everywhere() {
    let options = ParseOptions::default();
    let diet = parse_diet("", &options).unwrap();
    assert!(diet.unit.types.is_empty());
    assert!(diet.skipped.is_empty());
    let full = parse_full("", &options).unwrap();
    assert!(full.unit.types.is_empty());
}

// --- Recovery ---

#[test]
fn malformed_members_recover_without_fabricated_declarations() {
    // Missing method body brace, a stray statement at member level, and two
    // unterminated bodies.
    let source = "public class X { void foo() System.out.println(); public int h; void bar(){ void truc(){ }";
    let diet = parse_diet(source, &ParseOptions::default()).unwrap();
    assert_eq!(diet.unit.types.len(), 1);
    assert_eq!(
        member_names(&diet.unit.types[0]),
        vec!["foo", "h", "bar", "truc"]
    );
    // `truc` keeps a re-parseable (empty) body.
    let truc_body = diet
        .skipped
        .iter()
        .position(|s| s.terminated)
        .expect("truc has a terminated body");
    let parsed = diet
        .parse_body(truc_body, &ParseOptions::default())
        .unwrap();
    assert!(parsed.block.statements.is_empty());
    assert!(!diet.diagnostics.is_empty());
}

#[test]
fn missing_type_body_brace_is_inferred() {
    let diet = parse_diet("class A void m() { } }", &ParseOptions::default()).unwrap();
    assert_eq!(member_names(&diet.unit.types[0]), vec!["m"]);
    assert!(diet.diagnostics.iter().any(|d| d.code == "SYN_TYPE_BODY"));
}

#[test]
fn bare_call_is_never_promoted_to_a_constructor() {
    let diet = parse_diet("class X { foo(); }", &ParseOptions::default()).unwrap();
    assert!(diet.unit.types[0].members.is_empty());
    assert!(diet.diagnostics.iter().any(|d| d.code == "SYN_MEMBER_NAME"));
}

#[test]
fn nameless_type_is_dropped_not_fabricated() {
    let diet = parse_diet("class { int x; }", &ParseOptions::default()).unwrap();
    assert!(diet.unit.types.is_empty());
    assert!(diet.diagnostics.iter().any(|d| d.code == "SYN_TYPE_NAME"));
}

#[test]
fn body_recovery_keeps_the_parsed_prefix() {
    let source = "class C { void m() { int x = 1; int y = ; f(x); } }";
    let full = parse_full(source, &ParseOptions::default()).unwrap();
    let block = first_method_block(&full);
    let printed: Vec<String> = block.statements.iter().map(printer::stmt_to_string).collect();
    assert_eq!(printed, vec!["int x = 1;", "int y = ;", "f(x);"]);
}

#[test]
fn body_without_recovery_collapses_to_empty() {
    let options = ParseOptions {
        methods_full_recovery: false,
        ..ParseOptions::default()
    };
    let source = "class C { void m() { int x = 1; int y = ; f(x); } }";
    let full = parse_full(source, &options).unwrap();
    assert!(first_method_block(&full).statements.is_empty());
}

#[test]
fn dangling_assignment_gets_a_missing_rhs() {
    let source = "class C { void m() { x = } }";
    let full = parse_full(source, &ParseOptions::default()).unwrap();
    let block = first_method_block(&full);
    match &block.statements[0] {
        Stmt::Expr(es) => match &es.expr {
            Expr::Assign(assign) => assert!(matches!(*assign.rhs, Expr::Missing(_))),
            other => panic!("expected assignment, got {other:?}"),
        },
        other => panic!("expected expression statement, got {other:?}"),
    }
}

#[test]
fn local_types_only_survive_under_statement_recovery() {
    let source = "class C { void m() { class L { } int t; } }";
    let with = parse_full(source, &ParseOptions::default()).unwrap();
    let block = with.unit.types[0].members[0].clone();
    let MemberDecl::Method(method) = block else {
        panic!()
    };
    let BodyRef::Parsed(block) = method.body else {
        panic!()
    };
    assert!(matches!(block.statements[0], Stmt::LocalType(_)));
    assert!(matches!(block.statements[1], Stmt::LocalVar(_)));

    let options = ParseOptions {
        statements_recovery: false,
        ..ParseOptions::default()
    };
    let without = parse_full(source, &options).unwrap();
    let block = first_method_block(&without);
    assert_eq!(block.statements.len(), 1);
    assert!(matches!(block.statements[0], Stmt::LocalVar(_)));
}

#[test]
fn recovery_tiers_never_lose_statements() {
    // Each tier keeps at least what the tier below it kept.
    let source = "class C { void m() { int x = 1; class L { } int y = ; f(x); } }";
    let tiers = [(false, false), (true, false), (true, true)];
    let mut counts = Vec::new();
    for (methods, statements) in tiers {
        let options = ParseOptions {
            methods_full_recovery: methods,
            statements_recovery: statements,
            ..ParseOptions::default()
        };
        let full = parse_full(source, &options).unwrap();
        counts.push(first_method_block(&full).statements.len());
    }
    assert_eq!(counts, vec![0, 3, 4]);
    assert!(counts.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn dangling_catch_is_discarded() {
    let source = "class C { void m() { catch (E e) { } f(); } }";
    let full = parse_full(source, &ParseOptions::default()).unwrap();
    let block = first_method_block(&full);
    let printed: Vec<String> = block.statements.iter().map(printer::stmt_to_string).collect();
    assert_eq!(printed, vec![";", "f();"]);
    assert!(full.diagnostics.iter().any(|d| d.code == "SYN_DANGLING_CLAUSE"));
}

// --- Statements and expressions ---

#[test]
fn statement_forms_print_canonically() {
    let source = r#"class C {
  void m(int n) {
    int acc = 0;
    for (int i = 0; i < n; i++) { acc += i; }
    while (acc > 10) acc--;
    if (acc == 3) return; else acc = f(acc);
    switch (acc) { case 1: g(); break; default: h(); }
  }
}"#;
    let full = parse_full(source, &ParseOptions::default()).unwrap();
    let block = first_method_block(&full);
    let printed: Vec<String> = block.statements.iter().map(printer::stmt_to_string).collect();
    assert_eq!(
        printed,
        vec![
            "int acc = 0;".to_string(),
            "for (int i = 0; i < n; i++) {\n  acc += i;\n}".to_string(),
            "while (acc > 10) acc--;".to_string(),
            "if (acc == 3) return; else acc = f(acc);".to_string(),
            "switch (acc) {\n  case 1 :\n    g();\n    break;\n  default :\n    h();\n}"
                .to_string(),
        ]
    );
}

#[test]
fn try_with_resources_and_multi_catch() {
    let source =
        "class C { void m() { try (var r = open()) { use(r); } catch (A | B e) { } finally { done(); } } }";
    let full = parse_full(source, &ParseOptions::default()).unwrap();
    let block = first_method_block(&full);
    assert_eq!(
        printer::stmt_to_string(&block.statements[0]),
        "try (var r = open()) {\n  use(r);\n} catch (A | B e) {\n} finally {\n  done();\n}"
    );
}

#[test]
fn enhanced_for_and_labels() {
    let source = "class C { void m() { outer: for (String s : items) { continue outer; } } }";
    let full = parse_full(source, &ParseOptions::default()).unwrap();
    let block = first_method_block(&full);
    assert_eq!(
        printer::stmt_to_string(&block.statements[0]),
        "outer: for (String s : items) {\n  continue outer;\n}"
    );
}

#[test]
fn binary_precedence_nests_correctly() {
    match expr("a + b * c == d") {
        Expr::Binary(eq) => {
            assert_eq!(eq.op.as_str(), "==");
            match *eq.lhs {
                Expr::Binary(add) => {
                    assert_eq!(add.op.as_str(), "+");
                    assert!(matches!(*add.rhs, Expr::Binary(_)));
                }
                other => panic!("expected addition on the left, got {other:?}"),
            }
        }
        other => panic!("expected comparison at the root, got {other:?}"),
    }
}

#[test]
fn cast_requires_an_operand_after_the_parenthesis() {
    assert!(matches!(expr("(Foo) bar"), Expr::Cast(_)));
    assert!(matches!(expr("(int) x"), Expr::Cast(_)));
    match expr("(foo) + bar") {
        Expr::Binary(b) => assert!(matches!(*b.lhs, Expr::Paren(_))),
        other => panic!("expected binary, got {other:?}"),
    }
}

#[test]
fn allocations_and_class_literals() {
    assert_eq!(
        printer::expr_to_string(&expr("new z.y.X(1, 2, i)")),
        "new z.y.X(1, 2, i)"
    );
    assert_eq!(
        printer::expr_to_string(&expr("outer.new Inner(a)")),
        "outer.new Inner(a)"
    );
    assert_eq!(printer::expr_to_string(&expr("String[].class")), "String[].class");
    assert_eq!(printer::expr_to_string(&expr("int.class")), "int.class");
    assert_eq!(
        printer::expr_to_string(&expr("new int[2][] { }")),
        "new int[2][] {}"
    );
}

#[test]
fn string_concatenation_folds_under_the_option() {
    match expr("\"a\" + \"b\"") {
        Expr::Literal(lit) => assert_eq!(lit.text, "\"ab\""),
        other => panic!("expected folded literal, got {other:?}"),
    }
    let options = ParseOptions {
        optimize_string_literals: false,
        ..ParseOptions::default()
    };
    let unfolded = parse_expression("\"a\" + \"b\"", &options).unwrap().expr;
    assert!(matches!(unfolded, Expr::Binary(_)));
}

#[test]
fn instanceof_with_pattern_binding() {
    match expr("o instanceof String s") {
        Expr::InstanceOf(e) => {
            assert_eq!(e.ty.text, "String");
            assert_eq!(e.binding.as_deref(), Some("s"));
        }
        other => panic!("expected instanceof, got {other:?}"),
    }
}

// --- Language-level gating ---

fn level_options(level: JavaLanguageLevel) -> ParseOptions {
    ParseOptions {
        language_level: level,
        ..ParseOptions::default()
    }
}

#[test]
fn feature_gates_diagnose_without_changing_the_tree() {
    let source = "class C { void m() { for (String s : items) { } } }";
    let old = parse_full(source, &level_options(JavaLanguageLevel::JAVA_1_4)).unwrap();
    assert!(old.diagnostics.iter().any(|d| d.code == "FEATURE_ENHANCED_FOR"));
    assert!(matches!(
        first_method_block(&old).statements[0],
        Stmt::ForEach(_)
    ));
    let new = parse_full(source, &level_options(JavaLanguageLevel::JAVA_21)).unwrap();
    assert!(new.diagnostics.iter().all(|d| d.code != "FEATURE_ENHANCED_FOR"));
}

#[test]
fn var_and_pattern_instanceof_gate_below_their_releases() {
    let source = "class C { void m() { var v = o instanceof String s; } }";
    let old = parse_full(source, &level_options(JavaLanguageLevel::JAVA_8)).unwrap();
    let codes: Vec<&str> = old.diagnostics.iter().map(|d| d.code).collect();
    assert!(codes.contains(&"FEATURE_VAR_LOCAL_INFERENCE"));
    assert!(codes.contains(&"FEATURE_PATTERN_INSTANCEOF"));
}

#[test]
fn records_and_sealed_gate_below_their_releases() {
    let old = parse_diet(
        "sealed class S permits A { } record P(int x) { }",
        &level_options(JavaLanguageLevel::JAVA_8),
    )
    .unwrap();
    let codes: Vec<&str> = old.diagnostics.iter().map(|d| d.code).collect();
    assert!(codes.contains(&"FEATURE_SEALED_CLASSES"));
    assert!(codes.contains(&"FEATURE_RECORDS"));
    assert_eq!(old.unit.types.len(), 2);
}

// --- Determinism ---

#[test]
fn parsing_is_deterministic() {
    let source = "class C { int x = 1; void m() { if (x > 0) m(); } }";
    let options = ParseOptions::default();
    let a = parse_full(source, &options).unwrap();
    let b = parse_full(source, &options).unwrap();
    assert_eq!(printer::unit_to_string(&a.unit), printer::unit_to_string(&b.unit));
    assert_eq!(a.diagnostics, b.diagnostics);
}
