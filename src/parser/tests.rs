#[cfg(test)]
use super::*;
use crate::diagnostics::ErrorCollection;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn parse(file_name: &str, input: &str) -> (CompileUnit, NodeId, ErrorCollection) {
    let format = TargetFormat::from_path(Path::new(file_name)).unwrap_or_default();
    let mut unit = CompileUnit::new();
    let mut errors = ErrorCollection::default();
    let module = parse_module(&mut unit, file_name, input, format, &mut errors)
        .expect("Failed to parse module");
    (unit, module, errors)
}

fn names(tree: &PairTree, id: NodeId) -> Vec<String> {
    tree.content_children(id)
        .map(|c| tree[c].qualified_name())
        .collect()
}

fn child(tree: &PairTree, parent: NodeId, name: &str) -> NodeId {
    tree.content_children(parent)
        .find(|c| tree[*c].qualified_name() == name)
        .unwrap_or_else(|| panic!("Expected child '{}'", name))
}

fn codes(errors: &ErrorCollection) -> Vec<ErrorCode> {
    errors.iter().map(|d| d.code).collect()
}

#[test]
fn test_parser_basic_document() {
    let input = "!config:\n    name = demo\n    server:\n        port = 8080\n";
    let (unit, module, errors) = parse("c.pxml", input);
    let tree = &unit.tree;

    assert!(errors.is_empty(), "{:?}", codes(&errors));
    let docs = unit.documents(module);
    assert_eq!(docs.len(), 1);
    let config = docs[0];
    assert!(matches!(tree[config].kind, PairKind::Document { implicit: false, .. }));
    assert_eq!(names(tree, config), vec!["name", "server"]);

    let name = child(tree, config, "name");
    assert_eq!(tree[name].value.as_deref(), Some("demo"));
    assert_eq!(tree[name].value_kind, ValueKind::OpenString);

    let server = child(tree, config, "server");
    assert_eq!(tree[server].value_kind, ValueKind::Object);
    let port = child(tree, server, "port");
    assert_eq!(tree[port].value.as_deref(), Some("8080"));
    assert_eq!(tree[port].span.start.line, 4);
}

#[test]
fn test_chained_block_pairs_and_commas() {
    let (unit, module, errors) = parse("t.pxml", "a: b: c = 1, d = 2\n");
    let tree = &unit.tree;
    assert!(errors.is_empty());

    let doc = unit.documents(module)[0];
    assert_eq!(tree[doc].name_str(), "t");
    let a = child(tree, doc, "a");
    let b = child(tree, a, "b");
    assert_eq!(names(tree, b), vec!["c", "d"]);
}

#[test]
fn test_parenthesized_group_returns_to_outer_level() {
    let (unit, module, errors) = parse("t.pxml", "a: (b = 1, c = 2), d = 3\n");
    let tree = &unit.tree;
    assert!(errors.is_empty(), "{:?}", codes(&errors));

    let doc = unit.documents(module)[0];
    assert_eq!(names(tree, doc), vec!["a", "d"]);
    let a = child(tree, doc, "a");
    assert_eq!(names(tree, a), vec!["b", "c"]);
}

#[test]
fn test_group_owner_takes_next_block_and_closes_the_line() {
    let input = "!d:\n    x: (a = 1)\n        y = 2\n    z: (b = 1) c = 2\n";
    let (unit, module, errors) = parse("t.pxml", input);
    let tree = &unit.tree;

    assert_eq!(codes(&errors), vec![ErrorCode::UnexpectedCharacter]);
    assert_eq!(errors.iter().next().map(|d| d.line()), Some(4));

    let doc = unit.documents(module)[0];
    assert_eq!(names(tree, doc), vec!["x", "z"]);
    assert_eq!(names(tree, child(tree, doc, "x")), vec!["a", "y"]);
    assert_eq!(names(tree, child(tree, doc, "z")), vec!["b"]);
}

#[test]
fn test_alias_usage_with_inline_arguments() {
    let input = "!$point:\n    x = %x\n    y = %y\n!doc:\n    $point(%x = 1)\n";
    let (unit, module, errors) = parse("p.pxml", input);
    let tree = &unit.tree;
    assert!(errors.is_empty(), "{:?}", codes(&errors));

    let def = tree.children(module)[0];
    assert!(tree[def].kind.is_alias_definition());
    let x = child(tree, def, "x");
    assert_eq!(tree[x].value_kind, ValueKind::PairValue);
    let param = tree.children(x)[0];
    assert!(matches!(
        tree[param].kind,
        PairKind::Parameter {
            position: ParameterPosition::Value,
            ..
        }
    ));
    assert_eq!(tree[param].name_str(), "x");

    let doc = unit.documents(module)[0];
    let usage = child(tree, doc, "point");
    assert!(matches!(tree[usage].kind, PairKind::Alias { .. }));
    let args = tree.children(usage);
    assert_eq!(args.len(), 1);
    assert_eq!(tree[args[0]].kind, PairKind::Argument);
    assert_eq!(tree[args[0]].value.as_deref(), Some("1"));
}

#[test]
fn test_bare_pairs_in_alias_group_are_arguments() {
    let input = "!doc:\n    $point(x=1, y: z = 2)\n    (w = 3)\n";
    let (unit, module, errors) = parse("p.pxml", input);
    let tree = &unit.tree;
    assert!(errors.is_empty(), "{:?}", codes(&errors));

    let doc = unit.documents(module)[0];
    let usage = child(tree, doc, "point");
    let args = tree.children(usage);
    assert_eq!(args.len(), 2);
    assert_eq!(tree[args[0]].kind, PairKind::Argument);
    assert_eq!(tree[args[0]].value.as_deref(), Some("1"));
    assert_eq!(tree[args[1]].kind, PairKind::Argument);
    assert_eq!(tree[args[1]].name_str(), "y");

    let z = tree.children(args[1])[0];
    assert_eq!(tree[z].kind, PairKind::Element);
    let w = child(tree, doc, "w");
    assert_eq!(tree[w].kind, PairKind::Element);
}

#[test]
fn test_mixed_indentation_is_reported() {
    let (_, _, errors) = parse("m.pxml", "!d:\n \ta = 1\n");
    assert_eq!(codes(&errors), vec![ErrorCode::MixedIndentation]);

    let (_, _, errors) = parse("m.pxml", "!d:\n  a:\n\t\tb = 1\n");
    assert_eq!(codes(&errors), vec![ErrorCode::MixedIndentation]);
    assert_eq!(errors.iter().next().map(|d| d.line()), Some(3));
}

#[test]
fn test_mixed_indentation_on_continuation_lines() {
    let cases = [
        ("!d:\n    a = x\n     \t y\n", "x y"),
        ("!d:\n    a =\n     \t y\n", "y"),
        ("!d:\n    a == x\n     \t y\n", "x\ny"),
        ("!d:\n    a = \"x\n     \t y\"\n", "x\ny"),
    ];
    for (input, expected) in cases {
        let (unit, module, errors) = parse("m.pxml", input);
        assert_eq!(codes(&errors), vec![ErrorCode::MixedIndentation], "input: {:?}", input);
        assert_eq!(errors.iter().next().map(|d| d.line()), Some(3));

        let a = child(&unit.tree, unit.documents(module)[0], "a");
        assert_eq!(unit.tree[a].value.as_deref(), Some(expected), "input: {:?}", input);
    }
}

#[test]
fn test_continuation_in_foreign_indent_character() {
    let (_, _, errors) = parse("m.pxml", "!d:\n    a = x\n\t\t\t\t\ty\n");
    assert_eq!(codes(&errors), vec![ErrorCode::MixedIndentation]);

    let (_, _, errors) = parse("m.pxml", "!d:\n    a = x\n        y\n");
    assert!(errors.is_empty(), "{:?}", codes(&errors));
}

#[test]
fn test_indent_multiplicity_skips_line() {
    let (unit, module, errors) = parse("m.pxml", "!d:\n    a:\n      b = 1\n");
    let tree = &unit.tree;

    assert_eq!(codes(&errors), vec![ErrorCode::InvalidIndentMultiplicity]);
    assert_eq!(
        errors.iter().next().map(|d| d.message.clone()),
        Some("Indentation of 6 is not a multiple of the indent unit 4".to_string())
    );
    let doc = unit.documents(module)[0];
    let a = child(tree, doc, "a");
    assert!(tree.children(a).is_empty());
}

#[test]
fn test_indentation_deeper_than_open_blocks() {
    let (_, _, errors) = parse("m.pxml", "!d:\n  a:\n      b = 2\n");
    assert_eq!(codes(&errors), vec![ErrorCode::InvalidIndentation]);

    let (_, _, errors) = parse("m.pxml", "  a = 1\n");
    assert_eq!(codes(&errors), vec![ErrorCode::InvalidIndentation]);
}

#[test]
fn test_block_under_value_pair_is_not_expected() {
    let input = "!d:\n  a = $x\n    b = 1\n  c = 2\n";
    let (unit, module, errors) = parse("b.pxml", input);
    let tree = &unit.tree;

    assert_eq!(codes(&errors), vec![ErrorCode::BlockIsNotExpected]);
    assert_eq!(
        errors.iter().next().map(|d| d.message.clone()),
        Some("Block is not expected after element 'a'".to_string())
    );
    let doc = unit.documents(module)[0];
    assert_eq!(names(tree, doc), vec!["a", "c"]);
}

#[test]
fn test_multiline_quoted_string_strips_to_quote_column() {
    let input = "!d:\n    text = \"first\n             second\n        third\"\n";
    let (unit, module, errors) = parse("q.pxml", input);
    let tree = &unit.tree;
    assert!(errors.is_empty(), "{:?}", codes(&errors));

    let doc = unit.documents(module)[0];
    let text = child(tree, doc, "text");
    assert_eq!(tree[text].value.as_deref(), Some("first\n second\nthird"));
    assert_eq!(tree[text].value_kind, ValueKind::DoubleQuoted);
}

#[test]
fn test_unterminated_string_stops_at_dedent() {
    let input = "!d:\n    text = \"open\n    next = 1\n";
    let (unit, module, errors) = parse("q.pxml", input);
    let tree = &unit.tree;

    assert_eq!(codes(&errors), vec![ErrorCode::MissingClosingQuote]);
    let doc = unit.documents(module)[0];
    assert_eq!(names(tree, doc), vec!["text", "next"]);
}

#[test]
fn test_double_quoted_escapes() {
    let input = r#"a = "tab\there \u00e9 \ud83d\ude00 \q""#;
    let (unit, module, errors) = parse("e.pxml", input);
    let tree = &unit.tree;

    assert_eq!(codes(&errors), vec![ErrorCode::InvalidEscapeSequence]);
    let doc = unit.documents(module)[0];
    let a = child(tree, doc, "a");
    assert_eq!(tree[a].value.as_deref(), Some("tab\there \u{e9} \u{1F600} \\q"));
}

#[test]
fn test_single_quotes_take_text_verbatim() {
    let (unit, module, errors) = parse("e.pxml", r"a = 'C:\temp\$x'");
    let tree = &unit.tree;
    assert!(errors.is_empty());

    let a = child(tree, unit.documents(module)[0], "a");
    assert_eq!(tree[a].value.as_deref(), Some(r"C:\temp\$x"));
    assert_eq!(tree[a].value_kind, ValueKind::SingleQuoted);
}

#[test]
fn test_interpolated_string_becomes_concatenation() {
    let input = "!$greet:\n    text = \"Hello $name and %who!\"\n";
    let (unit, module, errors) = parse("i.pxml", input);
    let tree = &unit.tree;
    assert!(errors.is_empty(), "{:?}", codes(&errors));

    let def = tree.children(module)[0];
    let text = child(tree, def, "text");
    assert_eq!(tree[text].value_kind, ValueKind::Concatenation);

    let items = tree[text].interpolation_items.clone().expect("Expected items");
    let summary: Vec<(&str, &str, &str)> = items
        .iter()
        .map(|i| {
            let pair = &tree[*i];
            (pair.kind.name(), pair.name_str(), pair.value.as_deref().unwrap_or(""))
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("element", "", "Hello "),
            ("alias", "name", ""),
            ("element", "", " and "),
            ("parameter", "who", ""),
            ("element", "", "!"),
        ]
    );
    assert!(items.iter().all(|i| tree.parent(*i) == Some(text)));
}

#[test]
fn test_comments_attach_without_affecting_indentation() {
    let input = "''' header\n!d:\n    a = 1 ''' trailing\n    \"\"\" block\n    comment \"\"\"\n    b = 2\n";
    let (unit, module, errors) = parse("k.pxml", input);
    let tree = &unit.tree;
    assert!(errors.is_empty(), "{:?}", codes(&errors));

    let top = tree.children(module);
    assert_eq!(top.len(), 2);
    assert!(tree[top[0]].kind.is_comment());
    assert_eq!(tree[top[0]].value.as_deref(), Some("header"));

    let doc = top[1];
    assert_eq!(names(tree, doc), vec!["a", "b"]);
    assert_eq!(tree.children(doc).len(), 4);
    let a = child(tree, doc, "a");
    assert_eq!(tree[a].value.as_deref(), Some("1"));
}

#[test]
fn test_open_string_folds_deeper_lines() {
    let input = "!d:\n    note = this is\n        folded text\n    next = 1\n";
    let (unit, module, errors) = parse("f.pxml", input);
    let tree = &unit.tree;
    assert!(errors.is_empty());

    let doc = unit.documents(module)[0];
    let note = child(tree, doc, "note");
    assert_eq!(tree[note].value.as_deref(), Some("this is folded text"));
    assert_eq!(tree[note].value_kind, ValueKind::FoldedOpenString);
    assert_eq!(names(tree, doc), vec!["note", "next"]);
}

#[test]
fn test_free_string_keeps_text_verbatim() {
    let input = "!d:\n  raw == keep 'quotes', $refs: and = signs\n    second line\n  next = 1\n";
    let (unit, module, errors) = parse("f.pxml", input);
    let tree = &unit.tree;
    assert!(errors.is_empty());

    let doc = unit.documents(module)[0];
    let raw = child(tree, doc, "raw");
    assert_eq!(
        tree[raw].value.as_deref(),
        Some("keep 'quotes', $refs: and = signs\nsecond line")
    );
    assert_eq!(tree[raw].value_kind, ValueKind::OpenString);
    assert_eq!(names(tree, doc), vec!["raw", "next"]);
}

#[test]
fn test_json_infers_open_value_kinds() {
    let input = "n = 42\nf = -1.5e3\nt = true\nz = null\ns = hello\nq = \"42\"\n";
    let (unit, module, errors) = parse("v.pjson", input);
    let tree = &unit.tree;
    assert!(errors.is_empty());

    let doc = unit.documents(module)[0];
    let kinds: Vec<ValueKind> = tree.content_children(doc).map(|c| tree[c].value_kind).collect();
    assert_eq!(
        kinds,
        vec![
            ValueKind::Number,
            ValueKind::Number,
            ValueKind::Boolean,
            ValueKind::Null,
            ValueKind::OpenString,
            ValueKind::DoubleQuoted,
        ]
    );

    let (unit, module, _) = parse("v.pxml", "n = 42\n");
    let n = child(&unit.tree, unit.documents(module)[0], "n");
    assert_eq!(unit.tree[n].value_kind, ValueKind::OpenString);
}

#[test]
fn test_json_keeps_xml_sigils_in_names() {
    let (unit, module, errors) = parse("j.pjson", "@id = 1\n#tag:\n  x = 1\n");
    let tree = &unit.tree;
    assert!(errors.is_empty());

    let doc = unit.documents(module)[0];
    assert_eq!(names(tree, doc), vec!["@id", "#tag"]);
    assert!(tree.content_children(doc).all(|c| tree[c].kind == PairKind::Element));
}

#[test]
fn test_xml_prefixes_and_scopes() {
    let input = "!#p = urn:p\n!d:\n    p.item = 1\n    'q.quoted' = 2\n    @p.lang = en\n    #p.wrap:\n        inner = 1\n    #p:\n        other = 2\n";
    let (unit, module, errors) = parse("x.pxml", input);
    let tree = &unit.tree;
    assert!(errors.is_empty(), "{:?}", codes(&errors));

    let ns = tree.children(module)[0];
    assert_eq!(tree[ns].kind, PairKind::NamespaceDefinition);
    assert_eq!(tree[ns].value.as_deref(), Some("urn:p"));

    let doc = unit.documents(module)[0];
    let kids: Vec<NodeId> = tree.content_children(doc).collect();
    let item = &tree[kids[0]];
    assert_eq!((item.ns_prefix.as_deref(), item.name_str()), (Some("p"), "item"));
    let quoted = &tree[kids[1]];
    assert_eq!((quoted.ns_prefix.as_deref(), quoted.name_str()), (None, "q.quoted"));
    let attr = &tree[kids[2]];
    assert_eq!(attr.kind, PairKind::Attribute);
    assert_eq!(attr.ns_prefix.as_deref(), Some("p"));

    let wrap = &tree[kids[3]];
    assert_eq!(wrap.kind, PairKind::Scope);
    assert_eq!((wrap.ns_prefix.as_deref(), wrap.name.as_deref()), (Some("p"), Some("wrap")));
    let bare = &tree[kids[4]];
    assert_eq!((bare.ns_prefix.as_deref(), bare.name.as_deref()), (Some("p"), None));
}

#[test]
fn test_implicit_document_is_reused() {
    let (unit, module, errors) = parse("page.pxml", "a = 1\n!$x = 2\nb = 3\n");
    let tree = &unit.tree;
    assert!(errors.is_empty());

    let top = tree.children(module);
    assert_eq!(top.len(), 2);
    assert!(matches!(tree[top[0]].kind, PairKind::Document { implicit: true, .. }));
    assert_eq!(tree[top[0]].name_str(), "page");
    assert!(tree[top[1]].kind.is_alias_definition());
    assert_eq!(names(tree, top[0]), vec!["a", "b"]);
}

#[test]
fn test_late_namespace_definition_is_fatal() {
    let mut unit = CompileUnit::new();
    let mut errors = ErrorCollection::default();
    let input = "!d:\n    a = 1\n    !#p = urn:p\n";
    let result = parse_module(&mut unit, "n.pxml", input, TargetFormat::Xml, &mut errors);

    match result {
        Err(PaircError::Structural(StructuralFault::NamespaceDefinitionOutOfOrder { prefix, line, .. })) => {
            assert_eq!(prefix, "p");
            assert_eq!(line, 3);
        }
        other => panic!("Expected a structural error, got {:?}", other),
    }
}

#[test]
fn test_choice_pairs_are_registered_per_document() {
    let input = "!d:\n    pick::\n        a = 1\n        inner::\n            b = 2\n";
    let (unit, module, errors) = parse("c.pjson", input);
    let tree = &unit.tree;
    assert!(errors.is_empty());

    let doc = unit.documents(module)[0];
    let pick = child(tree, doc, "pick");
    let inner = child(tree, pick, "inner");
    assert!(tree[inner].is_choice);

    let PairKind::Document { choice_info, .. } = &tree[doc].kind else {
        panic!("Expected a document");
    };
    assert_eq!(choice_info.count(), 2);
    let pick_info = choice_info.find(pick).expect("Choice registered");
    assert_eq!(pick_info.children.len(), 1);
    assert_eq!(pick_info.children[0].choice, Some(inner));
}

#[test]
fn test_concatenation_children_become_items() {
    let input = "!$greet:\n    msg :=\n        = \"Hello \"\n        %name\n";
    let (unit, module, errors) = parse("g.pxml", input);
    let tree = &unit.tree;
    assert!(errors.is_empty(), "{:?}", codes(&errors));

    let def = tree.children(module)[0];
    let msg = child(tree, def, "msg");
    assert!(tree.children(msg).is_empty());
    assert_eq!(tree[msg].value_kind, ValueKind::Concatenation);

    let items = tree[msg].interpolation_items.clone().expect("Expected items");
    assert_eq!(items.len(), 2);
    assert_eq!(tree[items[0]].value.as_deref(), Some("Hello "));
    assert!(matches!(
        tree[items[1]].kind,
        PairKind::Parameter {
            position: ParameterPosition::Value,
            ..
        }
    ));
}

#[test]
fn test_bare_percent_is_default_value_parameter() {
    let (unit, module, errors) = parse("w.pxml", "!$wrap:\n    v = %\n");
    let tree = &unit.tree;
    assert!(errors.is_empty());

    let def = tree.children(module)[0];
    let v = child(tree, def, "v");
    let param = tree.children(v)[0];
    assert!(matches!(tree[param].kind, PairKind::Parameter { .. }));
    assert_eq!(tree[param].name, None);
}

#[test]
fn test_garbage_after_value_skips_rest_of_line() {
    let (unit, module, errors) = parse("u.pxml", "!d:\n    a = \"x\" b = 2\n");
    let tree = &unit.tree;

    assert_eq!(codes(&errors), vec![ErrorCode::UnexpectedCharacter]);
    let doc = unit.documents(module)[0];
    assert_eq!(names(tree, doc), vec!["a"]);
}

#[test]
fn test_unclosed_parenthesis() {
    let (_, _, errors) = parse("u.pxml", "!d:\n    $f(%x = 1\n");
    assert_eq!(codes(&errors), vec![ErrorCode::MissingClosingParenthesis]);
}

#[test]
fn test_spans_are_well_formed() {
    let input = "!d:\n    a = 1, b: c = \"two\"\n    d == free\n";
    let (unit, module, _) = parse("s.pxml", input);
    for id in unit.tree.descendants(module) {
        assert!(unit.tree[id].span.is_well_formed(), "bad span on {:?}", unit.tree[id].name);
    }
}

fn depth_sequence() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0usize..4, 1..20).prop_map(|raw| {
        let mut depths = Vec::with_capacity(raw.len());
        let mut prev = 0;
        for (i, d) in raw.into_iter().enumerate() {
            let depth = if i == 0 { 0 } else { d.min(prev + 1) };
            depths.push(depth);
            prev = depth;
        }
        depths
    })
}

proptest! {
    #[test]
    fn test_indentation_builds_matching_tree(
        depths in depth_sequence(),
        width in 1usize..=4,
        tabs in any::<bool>(),
    ) {
        let unit_text = if tabs { "\t".repeat(width) } else { " ".repeat(width) };
        let source: String = depths
            .iter()
            .enumerate()
            .map(|(i, d)| format!("{}n{}:\n", unit_text.repeat(*d), i))
            .collect();

        let (unit, module, errors) = parse("p.pxml", &source);
        prop_assert!(errors.is_empty(), "diagnostics for {:?}", source);

        let tree = &unit.tree;
        let doc = unit.documents(module)[0];
        let nodes: Vec<NodeId> = tree.descendants(doc).into_iter().skip(1).collect();
        prop_assert_eq!(nodes.len(), depths.len());

        for (i, node) in nodes.iter().enumerate() {
            let name = format!("n{}", i);
            prop_assert_eq!(tree[*node].name_str(), name.as_str());
            let expected = (0..i)
                .rev()
                .find(|j| depths[*j] + 1 == depths[i])
                .map(|j| nodes[j])
                .unwrap_or(doc);
            prop_assert_eq!(tree.parent(*node), Some(expected));
        }
    }
}
