use pretty_assertions::assert_eq;

use quill_syntax::printer::skeleton_to_string;
use quill_syntax::ParseOptions;

use crate::{completion_parse, CompletionMode, CompletionParse, NONE};

/// Cursor on the last character of `pat` (the cursor offset is inclusive).
fn behind(source: &str, pat: &str) -> usize {
    source.find(pat).unwrap() + pat.len() - 1
}

fn diet(source: &str, cursor: usize) -> CompletionParse {
    completion_parse(source, cursor, CompletionMode::Diet, &ParseOptions::default())
}

fn method(source: &str, cursor: usize) -> CompletionParse {
    completion_parse(source, cursor, CompletionMode::Method, &ParseOptions::default())
}

fn assert_all_none(result: &CompletionParse) {
    assert_eq!(result.node, NONE);
    assert_eq!(result.parent, NONE);
    assert_eq!(result.identifier, NONE);
    assert_eq!(result.replaced, NONE);
    assert!(result.capture.is_none());
}

#[test]
fn allocation_completion_swallows_replaced_argument() {
    let source = "class Bar{ void foo(){ if(true){ new z.y.X(1,2,i); } } }";
    let result = method(source, behind(source, "X("));
    assert_eq!(
        result.node,
        "<CompleteOnAllocationExpression:new z.y.X(<CompleteOnName:>, 2, i)>"
    );
    assert_eq!(result.parent, "new z.y.X(<CompleteOnName:>, 2, i);");
    assert_eq!(result.identifier, "");
    assert_eq!(result.replaced, "new z.y.X(1, 2, i)");
}

#[test]
fn name_completion_inside_method_body() {
    let source = "class Bar{ void foo(){ Object o = zzz; } }";
    let result = method(source, behind(source, "zzz"));
    assert_eq!(result.node, "<CompleteOnName:zzz>");
    assert_eq!(result.parent, "Object o = <CompleteOnName:zzz>;");
    assert_eq!(result.identifier, "zzz");
    assert_eq!(result.replaced, "zzz");
}

#[test]
fn diet_mode_ignores_cursor_inside_body() {
    let source = "class Bar{ void foo(){ Object o = zzz; } }";
    let result = diet(source, behind(source, "zzz"));
    assert_all_none(&result);
    // The structural parse is still delivered.
    assert_eq!(
        skeleton_to_string(&result.unit),
        "class Bar {\n  void foo();\n}"
    );
}

#[test]
fn empty_source_completes_without_panicking() {
    for mode in [CompletionMode::Diet, CompletionMode::Method] {
        let result = completion_parse("", 0, mode, &ParseOptions::default());
        assert_eq!(result.node, "<CompleteOnKeyword:>");
        assert_eq!(result.parent, NONE);
        assert_eq!(result.identifier, "");
        assert_eq!(result.replaced, "");
        assert!(result.unit.types.is_empty());
    }
}

#[test]
fn string_literal_completion_replaces_whole_literal() {
    let source = "class Bar{ void foo(){ String s = \"ZZZZZ\"; } }";
    let result = method(source, behind(source, "\"ZZZ"));
    assert_eq!(result.node, "<CompleteOnStringLiteral:ZZZ>");
    assert_eq!(result.parent, "String s = \"ZZZZZ\";");
    assert_eq!(result.identifier, "ZZZ");
    assert_eq!(result.replaced, "\"ZZZZZ\"");
}

#[test]
fn string_literal_cursor_is_opaque_in_diet_mode() {
    let source = "class Bar{ void foo(){ String s = \"ZZZZZ\"; } }";
    let result = diet(source, behind(source, "\"ZZZ"));
    assert_all_none(&result);
}

#[test]
fn qualified_name_replaces_the_whole_chain() {
    let source = "class T{ void f(){ return a.b.c.Xxx; } }";
    let result = method(source, behind(source, "Xxx"));
    assert_eq!(result.node, "<CompleteOnName:a.b.c.Xxx>");
    assert_eq!(result.parent, "return <CompleteOnName:a.b.c.Xxx>;");
    assert_eq!(result.identifier, "Xxx");
    assert_eq!(result.replaced, "a.b.c.Xxx");
}

#[test]
fn cursor_on_the_qualifier_head_shrinks_to_it() {
    // Cursor on `a` alone: the rest of the chain is not part of the
    // completed token.
    let source = "class T{ void f(){ return a.b.c.Xxx; } }";
    let result = method(source, behind(source, "return a"));
    assert_eq!(result.node, "<CompleteOnName:a>");
    assert_eq!(result.parent, "return <CompleteOnName:a>;");
    assert_eq!(result.identifier, "a");
    assert_eq!(result.replaced, "a");
}

#[test]
fn trailing_dot_completes_with_empty_prefix() {
    let source = "class T{ void f(){ return a.; } }";
    let result = method(source, behind(source, "a."));
    assert_eq!(result.node, "<CompleteOnName:a.>");
    assert_eq!(result.parent, "return <CompleteOnName:a.>;");
    assert_eq!(result.identifier, "");
    assert_eq!(result.replaced, "a.");
}

#[test]
fn cursor_inside_identifier_keeps_the_whole_token() {
    let source = "class T{ void f(){ return foobar; } }";
    let cursor = source.find("foobar").unwrap() + 1;
    let result = method(source, cursor);
    assert_eq!(result.node, "<CompleteOnName:fo>");
    assert_eq!(result.parent, "return <CompleteOnName:fo>;");
    assert_eq!(result.identifier, "fo");
    assert_eq!(result.replaced, "foobar");
}

#[test]
fn method_name_completion_in_header() {
    let source = "class T{ void foo(){} }";
    let result = diet(source, behind(source, "foo"));
    assert_eq!(result.node, "<CompleteOnMethodName:foo>");
    assert_eq!(result.parent, "void <CompleteOnMethodName:foo>();");
    assert_eq!(result.identifier, "foo");
    assert_eq!(result.replaced, "foo");
}

#[test]
fn type_name_completion() {
    let source = "class Ba";
    let result = diet(source, behind(source, "Ba"));
    assert_eq!(result.node, "<CompleteOnType:Ba>");
    assert_eq!(result.parent, NONE);
    assert_eq!(result.identifier, "Ba");
    assert_eq!(result.replaced, "Ba");
    assert_eq!(result.unit.types[0].name, "<CompleteOnType:Ba>");
}

#[test]
fn label_completion_after_break() {
    let source = "class T{ void f(){ out: while(true) { break out; } } }";
    let result = method(source, behind(source, "break out"));
    assert_eq!(result.node, "<CompleteOnLabel:out>");
    assert_eq!(result.parent, "break <CompleteOnLabel:out>;");
    assert_eq!(result.identifier, "out");
    assert_eq!(result.replaced, "out");
}

#[test]
fn partial_keyword_in_operator_position() {
    let source = "class T{ void f(){ if (a inst) {} } }";
    let result = method(source, behind(source, "inst"));
    assert_eq!(result.node, "<CompleteOnKeyword:inst>");
    assert_eq!(result.parent, "if (<CompleteOnKeyword:inst>) {\n}");
    assert_eq!(result.identifier, "inst");
    assert_eq!(result.replaced, "inst");
}

#[test]
fn field_initializer_completes_in_diet_mode() {
    let source = "class T{ int x = foo; }";
    let result = diet(source, behind(source, "foo"));
    assert_eq!(result.node, "<CompleteOnName:foo>");
    assert_eq!(result.parent, "int x = <CompleteOnName:foo>;");
    assert_eq!(result.identifier, "foo");
    assert_eq!(result.replaced, "foo");
}

#[test]
fn import_completion() {
    let source = "import java.ut;\nclass T {\n}";
    let result = diet(source, behind(source, "ut"));
    assert_eq!(result.node, "<CompleteOnName:java.ut>");
    assert_eq!(result.parent, "import <CompleteOnName:java.ut>;");
    assert_eq!(result.identifier, "ut");
    assert_eq!(result.replaced, "java.ut");
}

#[test]
fn cursor_in_comment_yields_none() {
    let source = "class T{ // help\n}";
    let result = method(source, behind(source, "hel"));
    assert_all_none(&result);
    assert_eq!(result.unit.types[0].name, "T");
}

#[test]
fn cursor_inside_number_yields_none() {
    let source = "class T{ void f(){ int x = 123456; } }";
    let result = method(source, behind(source, "1234"));
    assert_all_none(&result);
}

#[test]
fn completion_is_deterministic() {
    let source = "class Bar{ void foo(){ if(true){ new z.y.X(1,2,i); } } }";
    let cursor = behind(source, "X(");
    let first = method(source, cursor);
    let second = method(source, cursor);
    assert_eq!(first.node, second.node);
    assert_eq!(first.parent, second.parent);
    assert_eq!(first.replaced, second.replaced);
    assert_eq!(first.unit, second.unit);
}
