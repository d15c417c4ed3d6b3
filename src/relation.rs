//! Line-oriented relation input: `left > right` or `left < right`.

use std::io::BufRead;

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub greater: String,
    pub lesser: String,
}

impl Relation {
    pub fn new(greater: impl Into<String>, lesser: impl Into<String>) -> Self {
        Self { greater: greater.into(), lesser: lesser.into() }
    }

    /// Parses one line. Blank lines yield `Ok(None)`.
    ///
    /// `a < b` is read as its mirror image, `b > a`.
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let mut fields = line.split_whitespace();
        let Some(left) = fields.next() else {
            return Ok(None);
        };
        let op = fields.next().ok_or(ParseError::MissingField("comparison"))?;
        let right = fields.next().ok_or(ParseError::MissingField("right-hand key"))?;
        if let Some(extra) = fields.next() {
            return Err(ParseError::TrailingInput(extra.to_owned()));
        }

        match op {
            ">" => Ok(Some(Relation::new(left, right))),
            "<" => Ok(Some(Relation::new(right, left))),
            other => Err(ParseError::InvalidOperator(other.to_owned())),
        }
    }
}

/// Relations from `reader` with their 1-based line numbers.
///
/// Malformed lines, including ones that are not UTF-8, are logged and
/// skipped; I/O errors end the iteration with an `Err`.
pub fn read_relations<R: BufRead>(
    reader: R,
) -> impl Iterator<Item = std::io::Result<(usize, Relation)>> {
    reader.split(b'\n').enumerate().filter_map(|(i, bytes)| {
        let line_no = i + 1;
        let bytes = match bytes {
            Ok(bytes) => bytes,
            Err(e) => return Some(Err(e)),
        };
        let line = match String::from_utf8(bytes) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(line_no, "skipping line that is not UTF-8: {e}");
                return None;
            }
        };
        match Relation::parse(&line) {
            Ok(relation) => relation.map(|r| Ok((line_no, r))),
            Err(e) => {
                tracing::warn!(line_no, "skipping {line:?}: {e}");
                None
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greater_and_mirrored_lesser() {
        assert_eq!(Relation::parse("one > two").unwrap(), Some(Relation::new("one", "two")));
        assert_eq!(Relation::parse("one < two").unwrap(), Some(Relation::new("two", "one")));
        assert_eq!(Relation::parse("  a\t>   b \n").unwrap(), Some(Relation::new("a", "b")));
    }

    #[test]
    fn blank_lines_are_empty() {
        assert_eq!(Relation::parse("").unwrap(), None);
        assert_eq!(Relation::parse("   ").unwrap(), None);
    }

    #[test]
    fn malformed_lines() {
        assert_eq!(Relation::parse("a ="), Err(ParseError::MissingField("right-hand key")));
        assert_eq!(Relation::parse("a"), Err(ParseError::MissingField("comparison")));
        assert_eq!(Relation::parse("a = b"), Err(ParseError::InvalidOperator("=".into())));
        assert_eq!(Relation::parse("a >= b"), Err(ParseError::InvalidOperator(">=".into())));
        assert_eq!(Relation::parse("a > b c"), Err(ParseError::TrailingInput("c".into())));
    }

    #[test]
    fn reader_skips_bad_lines_and_keeps_numbers() {
        let input = "a > b\n\nnonsense\nc < b\n";
        let relations: Vec<_> = read_relations(input.as_bytes()).map(Result::unwrap).collect();
        assert_eq!(relations, vec![(1, Relation::new("a", "b")), (4, Relation::new("b", "c"))]);
    }

    #[test]
    fn reader_skips_lines_that_are_not_utf8() {
        let input: &[u8] = b"a > b\n\xff\xfe > c\nb > d\n";
        let relations: Vec<_> = read_relations(input).map(Result::unwrap).collect();
        assert_eq!(relations, vec![(1, Relation::new("a", "b")), (3, Relation::new("b", "d"))]);
    }

    #[test]
    fn reader_handles_crlf_and_missing_final_newline() {
        let input = "a > b\r\nc < b";
        let relations: Vec<_> = read_relations(input.as_bytes()).map(Result::unwrap).collect();
        assert_eq!(relations, vec![(1, Relation::new("a", "b")), (2, Relation::new("b", "c"))]);
    }
}
