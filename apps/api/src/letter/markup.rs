//! The `**bold**` inline markup used by generated cover letters.

use serde::Serialize;

const DELIMITER: &str = "**";

/// A run of text that is either entirely bold or entirely plain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub text: String,
    pub bold: bool,
}

/// Splits a line into bold and plain segments. A `**` without a closing
/// partner is kept as literal text.
pub fn segments(line: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut rest = line;
    while let Some(open) = rest.find(DELIMITER) {
        let after = &rest[open + DELIMITER.len()..];
        let Some(close) = after.find(DELIMITER) else {
            break;
        };
        if open > 0 {
            out.push(Segment {
                text: rest[..open].to_string(),
                bold: false,
            });
        }
        if close > 0 {
            out.push(Segment {
                text: after[..close].to_string(),
                bold: true,
            });
        }
        rest = &after[close + DELIMITER.len()..];
    }
    if !rest.is_empty() {
        out.push(Segment {
            text: rest.to_string(),
            bold: false,
        });
    }
    out
}

/// Space-separated words, each tagged with the weight of its segment.
pub fn tagged_words(line: &str) -> Vec<Segment> {
    segments(line)
        .into_iter()
        .flat_map(|segment| {
            let bold = segment.bold;
            segment
                .text
                .split(' ')
                .filter(|w| !w.is_empty())
                .map(|w| Segment {
                    text: w.to_string(),
                    bold,
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub fn strip_markup(text: &str) -> String {
    text.replace(DELIMITER, "")
}

/// Screen rendering of one letter line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "segments", rename_all = "snake_case")]
pub enum RichLine {
    Paragraph(Vec<Segment>),
    ListItem(Vec<Segment>),
    Break,
}

pub fn rich_lines(content: &str) -> Vec<RichLine> {
    content
        .split('\n')
        .map(|line| {
            if line.trim().starts_with('-') {
                let item = line.strip_prefix("- ").unwrap_or(line);
                RichLine::ListItem(segments(item))
            } else if line.trim().is_empty() {
                RichLine::Break
            } else {
                RichLine::Paragraph(segments(line))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(text: &str, bold: bool) -> Segment {
        Segment {
            text: text.into(),
            bold,
        }
    }

    #[test]
    fn test_segments_alternate_weights() {
        assert_eq!(
            segments("Fortalezas destacadas: **rápido**, **preciso**"),
            vec![
                seg("Fortalezas destacadas: ", false),
                seg("rápido", true),
                seg(", ", false),
                seg("preciso", true),
            ]
        );
    }

    #[test]
    fn test_unclosed_delimiter_stays_literal() {
        assert_eq!(segments("a **b"), vec![seg("a **b", false)]);
        assert_eq!(
            segments("**a** y **b"),
            vec![seg("a", true), seg(" y **b", false)]
        );
    }

    #[test]
    fn test_tagged_words_flag_only_marked_words() {
        let words = tagged_words("Fortalezas destacadas: **rápido**, **preciso**");
        let bold: Vec<&str> = words
            .iter()
            .filter(|w| w.bold)
            .map(|w| w.text.as_str())
            .collect();
        assert_eq!(bold, vec!["rápido", "preciso"]);
        assert_eq!(words.len(), 5);
        assert_eq!(words[3], seg(",", false));
    }

    #[test]
    fn test_bold_phrase_splits_into_bold_words() {
        let words = tagged_words("usa **trabajo en equipo** siempre");
        assert_eq!(
            words,
            vec![
                seg("usa", false),
                seg("trabajo", true),
                seg("en", true),
                seg("equipo", true),
                seg("siempre", false),
            ]
        );
    }

    #[test]
    fn test_rich_lines_shapes() {
        let lines = rich_lines("Hola **Ana**\n\n- punto uno\n  -sin espacio");
        assert_eq!(
            lines[0],
            RichLine::Paragraph(vec![seg("Hola ", false), seg("Ana", true)])
        );
        assert_eq!(lines[1], RichLine::Break);
        assert_eq!(lines[2], RichLine::ListItem(vec![seg("punto uno", false)]));
        assert_eq!(lines[3], RichLine::ListItem(vec![seg("  -sin espacio", false)]));
    }

    #[test]
    fn test_strip_markup_for_copy() {
        assert_eq!(strip_markup("**Ana** escribe"), "Ana escribe");
    }
}
