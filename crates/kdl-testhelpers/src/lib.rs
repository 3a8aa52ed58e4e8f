//! Assert parse errors against source annotated with caret markers.
//!
//! An annotation line contains only spaces, a run of `^` and an error kind
//! name. The carets mark bytes of the closest preceding source line:
//!
//! ```text
//! node "bad \q escape"
//!           ^^ InvalidEscape
//! ```
//!
//! Annotation lines are removed (with their newline) to get the source that
//! is actually parsed.

use std::ops::Range;

use similar::{ChangeTag, TextDiff};

/// An error reported by the code under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActualError {
    /// Byte range in the source without annotations.
    pub span: Range<usize>,
    /// Name of the error kind, compared against the annotation text.
    pub kind: String,
}

/// Strip annotation lines, returning the source to parse.
pub fn source_without_annotations(annotated: &str) -> String {
    split_annotations(annotated).0
}

/// Assert that `actual` is exactly the set of errors annotated in `annotated`.
///
/// Order does not matter. On mismatch, prints both lists and a diff, then panics.
pub fn assert_annotated_errors(annotated: &str, mut actual: Vec<ActualError>) {
    let (source, mut expected) = split_annotations(annotated);
    sort(&mut expected);
    sort(&mut actual);

    if expected == actual {
        return;
    }

    let expected = render(&source, &expected);
    let actual = render(&source, &actual);

    eprintln!("\n╭─ Errors mismatch! ─────────────────────────────────────────╮\n");
    eprintln!("Source:\n{}\n", indent(&source, "    "));
    eprintln!("Expected:\n{}\n", indent(&expected, "    "));
    eprintln!("Actual:\n{}\n", indent(&actual, "    "));

    eprintln!("Diff:");
    let diff = TextDiff::from_lines(&expected, &actual);
    for change in diff.iter_all_changes() {
        let (sign, color) = match change.tag() {
            ChangeTag::Delete => ("-", "\x1b[31m"),
            ChangeTag::Insert => ("+", "\x1b[32m"),
            ChangeTag::Equal => (" ", ""),
        };
        let reset = if color.is_empty() { "" } else { "\x1b[0m" };
        eprint!("  {}{}{}{}", color, sign, change, reset);
    }
    eprintln!("\n╰────────────────────────────────────────────────────────────╯\n");

    panic!("Errors do not match annotations");
}

fn split_annotations(annotated: &str) -> (String, Vec<ActualError>) {
    let mut source = String::new();
    let mut expected = Vec::new();
    let mut previous: Option<(usize, &str)> = None;

    for (i, line) in annotated.split('\n').enumerate() {
        if let Some((column, carets, kind)) = parse_annotation(line) {
            let (line_start, text) =
                previous.expect("an annotation line must follow a source line");
            expected.push(ActualError {
                span: line_start + char_offset(text, column)
                    ..line_start + char_offset(text, column + carets),
                kind: kind.to_string(),
            });
            continue;
        }
        if i > 0 {
            source.push('\n');
        }
        previous = Some((source.len(), line));
        source.push_str(line);
    }

    (source, expected)
}

/// Recognize `   ^^^^ Kind`, returning the caret column, caret count and kind.
fn parse_annotation(line: &str) -> Option<(usize, usize, &str)> {
    let trimmed = line.trim_start_matches(' ');
    let column = line.len() - trimmed.len();
    let carets = trimmed.bytes().take_while(|&b| b == b'^').count();
    if carets == 0 {
        return None;
    }
    let kind = trimmed[carets..].strip_prefix(' ')?.trim_end();
    if kind.is_empty() || !kind.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some((column, carets, kind))
}

/// Byte offset of the `column`th character of `line`, clamped to its end.
fn char_offset(line: &str, column: usize) -> usize {
    line.char_indices()
        .nth(column)
        .map_or(line.len(), |(offset, _)| offset)
}

fn sort(errors: &mut [ActualError]) {
    errors.sort_by(|a, b| {
        (a.span.start, a.span.end, &a.kind).cmp(&(b.span.start, b.span.end, &b.kind))
    });
}

fn render(source: &str, errors: &[ActualError]) -> String {
    let mut out = String::new();
    for error in errors {
        let snippet = source.get(error.span.clone()).unwrap_or("<out of bounds>");
        out.push_str(&format!(
            "{}..{} {} {:?}\n",
            error.span.start, error.span.end, error.kind, snippet
        ));
    }
    out
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_annotation_lines() {
        let annotated = "\nnode 1\n     ^ Oops\nother\n";
        assert_eq!(source_without_annotations(annotated), "\nnode 1\nother\n");
    }

    #[test]
    fn annotation_spans_are_byte_offsets() {
        let annotated = "\nnœud \"x\"\n     ^^^ Bad\n";
        assert_annotated_errors(
            annotated,
            vec![ActualError {
                span: 7..10,
                kind: "Bad".to_string(),
            }],
        );
    }

    #[test]
    #[should_panic(expected = "Errors do not match annotations")]
    fn mismatch_panics() {
        assert_annotated_errors(
            "\nnode\n^^^^ Expected\n",
            vec![ActualError {
                span: 1..3,
                kind: "Expected".to_string(),
            }],
        );
    }
}
