#[cfg(test)]
use super::*;
use std::path::Path;

use crate::ast::TargetFormat;
use crate::diagnostics::ErrorCollection;
use crate::parser::parse_module;
use crate::resolver::resolve;
use pretty_assertions::assert_eq;

fn expand(name: &str, input: &str) -> Vec<ExpandedPair> {
    let mut unit = CompileUnit::new();
    let mut errors = ErrorCollection::default();
    let format = TargetFormat::from_path(Path::new(name)).unwrap_or_default();
    parse_module(&mut unit, name, input, format, &mut errors).expect("Failed to parse module");
    let unit = resolve(unit, &mut errors).expect("Failed to resolve unit");
    Expander::new(&unit).expand_unit()
}

fn names(pair: &ExpandedPair) -> Vec<&str> {
    pair.children.iter().map(|c| c.name.as_str()).collect()
}

fn value<'a>(pair: &'a ExpandedPair, name: &str) -> Option<&'a str> {
    pair.child(name).and_then(|c| c.value.as_deref())
}

#[test]
fn test_block_alias_is_replaced_by_its_body() {
    let input = "!$header:\n    title = Report\n    version = 2\n!d:\n    $header\n    body = text\n";
    let docs = expand("b.pjson", input);

    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].kind, ExpandedKind::Document);
    assert_eq!(names(&docs[0]), vec!["title", "version", "body"]);
    assert_eq!(value(&docs[0], "version"), Some("2"));
    assert_eq!(docs[0].child("version").map(|c| c.value_kind), Some(ValueKind::Number));
}

#[test]
fn test_value_alias_supplies_value() {
    let input = "!$greeting = hello\n!d:\n    msg = $greeting\n";
    let docs = expand("v.pjson", input);
    assert_eq!(value(&docs[0], "msg"), Some("hello"));
}

#[test]
fn test_arguments_replace_parameters() {
    let input = "!$point:\n    x = %x\n    y = %y\n!d:\n    p:\n        $point(%x = 1, %y = 2)\n";
    let docs = expand("p.pjson", input);
    let p = docs[0].child("p").expect("Expected p");

    assert_eq!(names(p), vec!["x", "y"]);
    assert_eq!(value(p, "x"), Some("1"));
    assert_eq!(value(p, "y"), Some("2"));
}

#[test]
fn test_bare_arguments_in_group() {
    let input = "!$point:\n    x = %x\n    y = %y\n!d:\n    p:\n        $point(x=1, y = 2)\n";
    let docs = expand("p.pjson", input);
    let p = docs[0].child("p").expect("Expected p");

    assert_eq!(value(p, "x"), Some("1"));
    assert_eq!(value(p, "y"), Some("2"));
}

#[test]
fn test_missing_argument_falls_back_to_default() {
    let input = "!$box:\n    %size = 10\n    size = %size\n!d:\n    a:\n        $box\n    b:\n        $box(%size = 3)\n";
    let docs = expand("d.pjson", input);

    assert_eq!(value(docs[0].child("a").expect("a"), "size"), Some("10"));
    assert_eq!(value(docs[0].child("b").expect("b"), "size"), Some("3"));
}

#[test]
fn test_block_arguments_and_default_block() {
    let input = "!$wrap:\n    outer:\n        %\n!$slot:\n    frame:\n        %content\n!d:\n    $wrap:\n        inner = 1\n    $slot(%content: item = 2)\n";
    let docs = expand("w.pjson", input);
    let doc = &docs[0];

    assert_eq!(names(doc), vec!["outer", "frame"]);
    let outer = doc.child("outer").expect("outer");
    assert_eq!(names(outer), vec!["inner"]);
    let frame = doc.child("frame").expect("frame");
    assert_eq!(value(frame, "item"), Some("2"));
}

#[test]
fn test_arguments_see_the_callers_parameters() {
    let input = "!$inner:\n    v = %v\n!$outer:\n    $inner(%v = %w)\n!d:\n    $outer(%w = deep)\n";
    let docs = expand("c.pjson", input);
    assert_eq!(value(&docs[0], "v"), Some("deep"));
}

#[test]
fn test_interpolation_is_concatenated() {
    let input = "!$who = world\n!d:\n    msg = \"hello $who!\"\n";
    let docs = expand("i.pjson", input);
    let msg = docs[0].child("msg").expect("msg");

    assert_eq!(msg.value.as_deref(), Some("hello world!"));
    assert_eq!(msg.value_kind, ValueKind::Concatenation);
}

#[test]
fn test_concatenation_block_is_joined() {
    let input = "!$name = Ada\n!d:\n    full:=\n        first = \"Dr. \"\n        $name\n";
    let docs = expand("j.pjson", input);
    assert_eq!(value(&docs[0], "full"), Some("Dr. Ada"));
}

#[test]
fn test_circular_and_unresolved_aliases_expand_to_nothing() {
    let input = "!$a:\n    $b\n!$b:\n    $a\n!d:\n    $a\n    $missing\n    kept = 1\n";
    let docs = expand("x.pjson", input);
    assert_eq!(names(&docs[0]), vec!["kept"]);
}

#[test]
fn test_scopes_are_flattened() {
    let input = "!#ns = urn:ns\n!d:\n    #ns.root:\n        child = 1\n";
    let docs = expand("s.pxml", input);
    let doc = &docs[0];

    assert_eq!(names(doc), vec!["root"]);
    let root = doc.child("root").expect("root");
    assert_eq!(root.prefix.as_deref(), Some("ns"));
    assert_eq!(root.namespace.as_deref(), Some("urn:ns"));
    assert_eq!(root.child("child").and_then(|c| c.namespace.as_deref()), Some("urn:ns"));
}

#[test]
fn test_depth_cap_stops_expansion() {
    let input = "!$a:\n    $b\n!$b:\n    $c\n!$c:\n    leaf = 1\n!d:\n    root:\n        $a\n";

    let mut unit = CompileUnit::new();
    let mut errors = ErrorCollection::default();
    parse_module(&mut unit, "cap.pjson", input, TargetFormat::Json, &mut errors).expect("Failed to parse module");
    let unit = resolve(unit, &mut errors).expect("Failed to resolve unit");

    let full = Expander::new(&unit).expand_unit();
    assert_eq!(names(full[0].child("root").expect("root")), vec!["leaf"]);

    let capped = Expander::new(&unit).with_max_depth(2).expand_unit();
    assert!(capped[0].child("root").expect("root").children.is_empty());
}

#[test]
fn test_choice_branches_are_marked() {
    let input = "!d:\n    pick::\n        a = 1\n        b = 2\n";
    let docs = expand("ch.pjson", input);
    let pick = docs[0].child("pick").expect("pick");

    assert!(!pick.is_choice);
    assert!(pick.children.iter().all(|c| c.is_choice));
}
