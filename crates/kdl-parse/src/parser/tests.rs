use super::*;
use crate::{Radix, Value};
use facet_testhelpers::test;
use kdl_testhelpers::{ActualError, assert_annotated_errors, source_without_annotations};
use tracing::trace;

fn parse(source: &str) -> Vec<Event<'_>> {
    tracing::debug!(source, "parsing");
    let events = Parser::new(source).parse_to_vec().unwrap();
    tracing::debug!(?events, "parsed");
    events
}

fn name(value: &str, start: u32, end: u32) -> Name<'_> {
    Name {
        value: Cow::Borrowed(value),
        span: Span::new(start, end),
    }
}

fn node_names<'a>(events: &'a [Event<'a>]) -> Vec<&'a str> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::NodeStart { name, .. } => Some(name.value.as_ref()),
            _ => None,
        })
        .collect()
}

/// Entries in order, as (property name, value).
fn entries<'a>(events: &'a [Event<'a>]) -> Vec<(Option<&'a str>, &'a Value<'a>)> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Entry { name, value, .. } => {
                Some((name.as_ref().map(|n| n.value.as_ref()), value))
            }
            _ => None,
        })
        .collect()
}

fn error_kind_name(kind: &ParseErrorKind) -> &'static str {
    match kind {
        ParseErrorKind::InvalidUtf8 => "InvalidUtf8",
        ParseErrorKind::InputTooLarge => "InputTooLarge",
        ParseErrorKind::UnterminatedString => "UnterminatedString",
        ParseErrorKind::UnterminatedRawString => "UnterminatedRawString",
        ParseErrorKind::UnterminatedComment => "UnterminatedComment",
        ParseErrorKind::UnexpectedChar => "UnexpectedChar",
        ParseErrorKind::InvalidLineContinuation => "InvalidLineContinuation",
        ParseErrorKind::InvalidEscape(_) => "InvalidEscape",
        ParseErrorKind::InvalidUnicodeEscape => "InvalidUnicodeEscape",
        ParseErrorKind::InvalidNumber => "InvalidNumber",
        ParseErrorKind::InvalidDigit => "InvalidDigit",
        ParseErrorKind::MisplacedUnderscore => "MisplacedUnderscore",
        ParseErrorKind::MissingDigits => "MissingDigits",
        ParseErrorKind::MultilineMissingNewline => "MultilineMissingNewline",
        ParseErrorKind::MultilineClosingLine => "MultilineClosingLine",
        ParseErrorKind::InconsistentIndent => "InconsistentIndent",
        ParseErrorKind::UnexpectedToken => "UnexpectedToken",
        ParseErrorKind::ExpectedNodeName => "ExpectedNodeName",
        ParseErrorKind::ExpectedValue => "ExpectedValue",
        ParseErrorKind::ExpectedTypeName => "ExpectedTypeName",
        ParseErrorKind::UnclosedTypeAnnotation => "UnclosedTypeAnnotation",
        ParseErrorKind::MisplacedTypeAnnotation => "MisplacedTypeAnnotation",
        ParseErrorKind::MissingWhitespace => "MissingWhitespace",
        ParseErrorKind::BareIdentifierValue => "BareIdentifierValue",
        ParseErrorKind::InvalidPropertyName => "InvalidPropertyName",
        ParseErrorKind::UnclosedChildren => "UnclosedChildren",
        ParseErrorKind::UnexpectedCloseBrace => "UnexpectedCloseBrace",
        ParseErrorKind::EntryAfterChildren => "EntryAfterChildren",
        ParseErrorKind::DuplicateChildren => "DuplicateChildren",
        ParseErrorKind::IntegerOverflow => "IntegerOverflow",
        ParseErrorKind::NestingTooDeep => "NestingTooDeep",
    }
}

fn assert_parse_error_with(annotated_source: &str, options: ParseOptions) {
    let source = source_without_annotations(annotated_source);
    let err = Parser::with_options(&source, options)
        .parse_to_vec()
        .expect_err("source should fail to parse");
    trace!(?err, "parse error");
    assert_annotated_errors(
        annotated_source,
        vec![ActualError {
            span: err.span.into(),
            kind: error_kind_name(&err.kind).to_string(),
        }],
    );
}

fn assert_parse_error(annotated_source: &str) {
    assert_parse_error_with(annotated_source, ParseOptions::default());
}

#[test]
fn test_empty_document() {
    assert_eq!(parse(""), vec![]);
    assert_eq!(parse("\n\n  // only a comment\n/* and a block */"), vec![]);
}

#[test]
fn test_single_node() {
    let events = parse("node");
    assert_eq!(
        events,
        vec![
            Event::NodeStart {
                span: Span::new(0, 4),
                ty: None,
                name: name("node", 0, 4),
            },
            Event::NodeEnd {
                span: Span::new(0, 4),
            },
        ]
    );
}

#[test]
fn test_property_argument_tie_break() {
    let events = parse(r#"foo bar=true "baz" quux=false 1 2 3"#);
    assert_eq!(node_names(&events), vec!["foo"]);
    assert_eq!(
        entries(&events),
        vec![
            (Some("bar"), &Value::Bool(true)),
            (None, &Value::String("baz".into())),
            (Some("quux"), &Value::Bool(false)),
            (None, &Value::Integer(1, Radix::Decimal)),
            (None, &Value::Integer(2, Radix::Decimal)),
            (None, &Value::Integer(3, Radix::Decimal)),
        ]
    );
}

#[test]
fn test_quoted_property_name() {
    let events = parse(r#"node "key with space"=1"#);
    assert_eq!(entries(&events), vec![(Some("key with space"), &Value::Integer(1, Radix::Decimal))]);
}

#[test]
fn test_entry_spans() {
    let events = parse("n key=(u8)30 (t)\"x\"");
    let spans: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            Event::Entry { span, .. } => Some(*span),
            _ => None,
        })
        .collect();
    assert_eq!(spans, vec![Span::new(2, 12), Span::new(13, 19)]);
    assert_eq!(
        events.last(),
        Some(&Event::NodeEnd {
            span: Span::new(0, 19)
        })
    );
}

#[test]
fn test_type_annotations() {
    let events = parse(r#"(author)person age=(u8)30 (name)"x""#);
    assert_eq!(
        events[0],
        Event::NodeStart {
            span: Span::new(0, 14),
            ty: Some(name("author", 1, 7)),
            name: name("person", 8, 14),
        }
    );
    assert_eq!(
        events[1],
        Event::Entry {
            span: Span::new(15, 25),
            ty: Some(name("u8", 20, 22)),
            name: Some(name("age", 15, 18)),
            value: Value::Integer(30, Radix::Decimal),
        }
    );
    assert!(matches!(
        &events[2],
        Event::Entry { ty: Some(ty), name: None, .. } if ty.value == "name"
    ));
}

#[test]
fn test_quoted_type_and_node_name() {
    let events = parse(r#"("my type")"my node""#);
    assert!(matches!(
        &events[0],
        Event::NodeStart { ty: Some(ty), name, .. } if ty.value == "my type" && name.value == "my node"
    ));
}

#[test]
fn test_value_kinds() {
    let events = parse(r#"n null true 1.5 0x10 r"raw" "esc\n""#);
    let kinds: Vec<_> = entries(&events).iter().map(|(_, v)| v.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            crate::ValueKind::Null,
            crate::ValueKind::Bool,
            crate::ValueKind::Base10Float,
            crate::ValueKind::Base16,
            crate::ValueKind::RawString,
            crate::ValueKind::String,
        ]
    );
}

#[test]
fn test_nested_children() {
    let events = parse("a { b { c } }");
    assert_eq!(
        events,
        vec![
            Event::NodeStart {
                span: Span::new(0, 1),
                ty: None,
                name: name("a", 0, 1),
            },
            Event::ChildrenStart {
                span: Span::new(2, 3),
            },
            Event::NodeStart {
                span: Span::new(4, 5),
                ty: None,
                name: name("b", 4, 5),
            },
            Event::ChildrenStart {
                span: Span::new(6, 7),
            },
            Event::NodeStart {
                span: Span::new(8, 9),
                ty: None,
                name: name("c", 8, 9),
            },
            Event::NodeEnd {
                span: Span::new(8, 9),
            },
            Event::ChildrenEnd {
                span: Span::new(10, 11),
            },
            Event::NodeEnd {
                span: Span::new(4, 11),
            },
            Event::ChildrenEnd {
                span: Span::new(12, 13),
            },
            Event::NodeEnd {
                span: Span::new(0, 13),
            },
        ]
    );
}

#[test]
fn test_empty_children_is_distinct_from_none() {
    let with_block = parse("a {}");
    assert!(with_block.iter().any(|e| matches!(e, Event::ChildrenStart { .. })));

    let without = parse("a");
    assert!(!without.iter().any(|e| matches!(e, Event::ChildrenStart { .. })));
}

#[test]
fn test_children_without_space() {
    let events = parse("a{b}");
    assert_eq!(node_names(&events), vec!["a", "b"]);
}

#[test]
fn test_terminators() {
    assert_eq!(node_names(&parse("a; b; c")), vec!["a", "b", "c"]);
    assert_eq!(node_names(&parse("a;b\nc\r\nd")), vec!["a", "b", "c", "d"]);
    assert_eq!(node_names(&parse("p { a; b }")), vec!["p", "a", "b"]);
    assert_eq!(node_names(&parse("a // trailing\nb")), vec!["a", "b"]);
}

#[test]
fn test_comments_between_entries() {
    let events = parse("a 1 /* two */ 3 /* nested /* deep */ */ 4\n/* multi\nline */ b");
    assert_eq!(node_names(&events), vec!["a", "b"]);
    assert_eq!(entries(&events).len(), 3);
}

#[test]
fn test_line_continuation() {
    let events = parse("node 1 \\\n  2 \\ // why not\n  3\nnext");
    assert_eq!(node_names(&events), vec!["node", "next"]);
    assert_eq!(entries(&events).len(), 3);
}

#[test]
fn test_byte_order_mark() {
    assert_eq!(node_names(&parse("\u{FEFF}node 1")), vec!["node"]);
}

#[test]
fn test_slashdash_node() {
    let events = parse("/-foo 1\nbar 2");
    assert_eq!(node_names(&events), vec!["bar"]);
    assert_eq!(
        entries(&events),
        vec![(None, &Value::Integer(2, Radix::Decimal))]
    );
}

#[test]
fn test_slashdash_child_node_leaves_no_trace() {
    let events = parse("parent {\n  /-foo 1\n}");
    let expected = parse("parent {\n}");
    assert_eq!(node_names(&events), vec!["parent"]);
    assert_eq!(entries(&events).len(), 0);
    assert_eq!(events.len(), expected.len());
}

#[test]
fn test_slashdash_node_with_children() {
    let events = parse("/-a { b; /-c { d } }\ne");
    assert_eq!(node_names(&events), vec!["e"]);
}

#[test]
fn test_slashdash_is_reentrant() {
    let events = parse("a {\n  /-b\n  c { /-d; e /-1 2 }\n}");
    assert_eq!(node_names(&events), vec!["a", "c", "e"]);
    assert_eq!(
        entries(&events),
        vec![(None, &Value::Integer(2, Radix::Decimal))]
    );
}

#[test]
fn test_slashdash_entries() {
    let events = parse("node 1 /-2 3 /-key=4 other=5 /- (t)6");
    assert_eq!(
        entries(&events),
        vec![
            (None, &Value::Integer(1, Radix::Decimal)),
            (None, &Value::Integer(3, Radix::Decimal)),
            (Some("other"), &Value::Integer(5, Radix::Decimal)),
        ]
    );
}

#[test]
fn test_slashdash_children() {
    assert_eq!(node_names(&parse("node /-{ a } { b }")), vec!["node", "b"]);
    assert_eq!(node_names(&parse("node { a } /-{ b }")), vec!["node", "a"]);
    assert_eq!(node_names(&parse("node /-{ a } /-{ b }")), vec!["node"]);
}

#[test]
fn test_multiline_string_value() {
    let events = parse("text \"\"\"\n    hello\n      world\n    \"\"\" after=1");
    assert_eq!(
        entries(&events),
        vec![
            (None, &Value::String("hello\n  world".into())),
            (Some("after"), &Value::Integer(1, Radix::Decimal)),
        ]
    );
}

#[test]
fn test_string_with_literal_newline() {
    let events = parse("a \"line one\nline two\" 2");
    assert_eq!(
        entries(&events)[0],
        (None, &Value::String("line one\nline two".into()))
    );
}

#[test]
fn test_parse_is_deterministic() {
    let source = "a 1 \"two\" three=3.0 { b (t)0b11; /-c }";
    assert_eq!(parse(source), parse(source));
}

#[test]
fn test_events_before_error_are_delivered() {
    let mut events = Vec::new();
    let result = Parser::new("good 1\nbad \"\\q\"").parse(&mut events);
    assert!(result.is_err());
    assert_eq!(node_names(&events), vec!["good", "bad"]);
}

#[test]
fn test_unterminated_string_spans_to_end() {
    let err = Parser::new("node \"unterminated").parse_to_vec().unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnterminatedString);
    assert_eq!(err.span, Span::new(5, 18));
    assert_eq!(err.kind.label(), "unterminated string");
}

#[test]
fn test_unterminated_block_comment() {
    let err = Parser::new("a /* open").parse_to_vec().unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnterminatedComment);
    assert_eq!(err.span, Span::new(2, 9));
}

#[test]
fn test_unclosed_children() {
    assert_parse_error(
        r#"
parent {
       ^ UnclosedChildren
  child
"#,
    );
}

#[test]
fn test_unexpected_close_brace() {
    assert_parse_error(
        r#"
a 1 }
    ^ UnexpectedCloseBrace
"#,
    );
}

#[test]
fn test_duplicate_children() {
    assert_parse_error(
        r#"
a { b } { c }
        ^ DuplicateChildren
"#,
    );
}

#[test]
fn test_entry_after_children() {
    assert_parse_error(
        r#"
a { b } 1
        ^ EntryAfterChildren
"#,
    );
    assert_parse_error(
        r#"
a /-{ b } 1
          ^ EntryAfterChildren
"#,
    );
}

#[test]
fn test_missing_whitespace() {
    assert_parse_error(
        r#"
node"arg"
    ^^^^^ MissingWhitespace
"#,
    );
    assert_parse_error(
        r#"
node 1"arg"
      ^^^^^ MissingWhitespace
"#,
    );
}

#[test]
fn test_bare_identifier_value() {
    assert_parse_error(
        r#"
node value
     ^^^^^ BareIdentifierValue
"#,
    );
    assert_parse_error(
        r#"
node key=value
         ^^^^^ BareIdentifierValue
"#,
    );
}

#[test]
fn test_expected_value() {
    assert_parse_error(
        r#"
node key= 1
         ^ ExpectedValue
"#,
    );
}

#[test]
fn test_unexpected_token() {
    assert_parse_error(
        r#"
node =1
     ^ UnexpectedToken
"#,
    );
}

#[test]
fn test_invalid_property_name() {
    assert_parse_error(
        r#"
node 1=2
     ^ InvalidPropertyName
"#,
    );
    assert_parse_error(
        r#"
node true=2
     ^^^^ InvalidPropertyName
"#,
    );
}

#[test]
fn test_expected_node_name() {
    assert_parse_error(
        r#"
123 a
^^^ ExpectedNodeName
"#,
    );
    assert_parse_error(
        r#"
null
^^^^ ExpectedNodeName
"#,
    );
    assert_parse_error(
        r#"
a
;
^ ExpectedNodeName
"#,
    );
}

#[test]
fn test_type_annotation_errors() {
    assert_parse_error(
        r#"
(t) node
^^^ MisplacedTypeAnnotation
"#,
    );
    assert_parse_error(
        r#"
node (t)key=1
     ^^^ MisplacedTypeAnnotation
"#,
    );
    assert_parse_error(
        r#"
node (t 1
     ^^ UnclosedTypeAnnotation
"#,
    );
    assert_parse_error(
        r#"
node (1)2
      ^ ExpectedTypeName
"#,
    );
    assert_parse_error(
        r#"
node ()2
      ^ ExpectedTypeName
"#,
    );
}

#[test]
fn test_lexical_errors() {
    assert_parse_error(
        r#"
node [1]
     ^ UnexpectedChar
"#,
    );
    assert_parse_error(
        r#"
node \ 1
     ^^ InvalidLineContinuation
"#,
    );
    assert_parse_error(
        r#"
node "bad \q escape"
          ^^ InvalidEscape
"#,
    );
}

#[test]
fn test_numeric_errors() {
    assert_parse_error(
        r#"
node 0b102
         ^ InvalidDigit
"#,
    );
    assert_parse_error(
        r#"
node 0x8000_0000_0000_0000
     ^^^^^^^^^^^^^^^^^^^^^ IntegerOverflow
"#,
    );
}

#[test]
fn test_slashdashed_content_is_still_checked() {
    assert_parse_error(
        r#"
/-node "\q"
        ^^ InvalidEscape
"#,
    );
    assert_parse_error(
        r#"
node /-{ 1 }
         ^ ExpectedNodeName
"#,
    );
}

#[test]
fn test_nesting_limit() {
    assert_parse_error_with(
        r#"
a { b { c { d } } }
          ^ NestingTooDeep
"#,
        ParseOptions::default().with_max_depth(2),
    );

    let deep = format!("{}{}", "n {".repeat(200), "}".repeat(200));
    let err = Parser::new(&deep).parse_to_vec().unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::NestingTooDeep);
}

#[test]
fn test_nesting_within_limit() {
    let source = format!("{}{}", "n {".repeat(10), "}".repeat(10));
    let events = Parser::with_options(&source, ParseOptions::default().with_max_depth(10))
        .parse_to_vec()
        .unwrap();
    assert_eq!(node_names(&events).len(), 10);
}
