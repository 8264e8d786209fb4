//! Inline markup for message content.
//!
//! Supports the small subset bots commonly emit: `**strong**`, `*emphasis*`,
//! `` `code` `` and line breaks. Delimiters never span lines; an unmatched or
//! empty delimiter is kept as literal text.

use serde::{Deserialize, Serialize};

/// A styled run of text (view model consumed by renderers)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Segment {
    Text(String),
    Strong(String),
    Emphasis(String),
    Code(String),
    LineBreak,
}

const DELIMITERS: [(&str, fn(String) -> Segment); 3] = [
    ("**", Segment::Strong),
    ("`", Segment::Code),
    ("*", Segment::Emphasis),
];

/// Split message content into styled segments
pub fn parse(content: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    for (index, line) in content.split('\n').enumerate() {
        if index > 0 {
            segments.push(Segment::LineBreak);
        }
        parse_line(line, &mut segments);
    }
    segments
}

/// Content with markup delimiters removed, as a reader would see it
pub fn plain_text(content: &str) -> String {
    parse(content)
        .into_iter()
        .map(|segment| match segment {
            Segment::Text(s) | Segment::Strong(s) | Segment::Emphasis(s) | Segment::Code(s) => s,
            Segment::LineBreak => "\n".to_string(),
        })
        .collect()
}

fn parse_line(line: &str, out: &mut Vec<Segment>) {
    let mut plain = String::new();
    let mut rest = line;

    while let Some(ch) = rest.chars().next() {
        if let Some((segment, consumed)) = delimited(rest) {
            if !plain.is_empty() {
                out.push(Segment::Text(std::mem::take(&mut plain)));
            }
            out.push(segment);
            rest = &rest[consumed..];
            continue;
        }
        plain.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    if !plain.is_empty() {
        out.push(Segment::Text(plain));
    }
}

/// Match a delimited run at the start of `input`, returning the segment and
/// the number of bytes it spans.
fn delimited(input: &str) -> Option<(Segment, usize)> {
    for (delim, make) in DELIMITERS {
        if let Some(body) = input.strip_prefix(delim) {
            if let Some(end) = body.find(delim) {
                if end > 0 {
                    let segment = make(body[..end].to_string());
                    return Some((segment, end + delim.len() * 2));
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Segment {
        Segment::Text(s.to_string())
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(parse("hello world"), vec![text("hello world")]);
    }

    #[test]
    fn test_inline_styles() {
        assert_eq!(
            parse("a **b** *c* `d` e"),
            vec![
                text("a "),
                Segment::Strong("b".to_string()),
                text(" "),
                Segment::Emphasis("c".to_string()),
                text(" "),
                Segment::Code("d".to_string()),
                text(" e"),
            ]
        );
    }

    #[test]
    fn test_plain_text_strips_delimiters() {
        assert_eq!(plain_text("**Zoning** is `R-1`\n*today*"), "Zoning is R-1\ntoday");
        assert_eq!(plain_text("unmatched **star"), "unmatched **star");
    }

    #[test]
    fn test_line_breaks() {
        assert_eq!(
            parse("one\ntwo"),
            vec![text("one"), Segment::LineBreak, text("two")]
        );
    }

    #[test]
    fn test_delimiters_do_not_span_lines() {
        assert_eq!(
            parse("**open\nclose**"),
            vec![text("**open"), Segment::LineBreak, text("close**")]
        );
    }

    #[test]
    fn test_unmatched_and_empty_delimiters_are_literal() {
        assert_eq!(parse("2 * 3 = 6"), vec![text("2 * 3 = 6")]);
        assert_eq!(parse("****"), vec![text("****")]);
    }

    #[test]
    fn test_multibyte_content() {
        assert_eq!(
            parse("**título** ñ"),
            vec![Segment::Strong("título".to_string()), text(" ñ")]
        );
    }
}
