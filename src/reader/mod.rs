//! Row reconstruction for the mapping table.
//!
//! A mapping table is comma-separated text with [`TOTAL_COLUMNS`] columns per row, of
//! which only the first [`LEADING_FIELDS`] are used. The value column may hold commas,
//! doubled quotes and line breaks, so rows are put back together in three steps:
//!
//! 1. [`RowReader`] joins physical lines until the text ends with `,` (the last column
//!    is always empty).
//! 2. [`strip_trailing_fields`] scans the row backward to cut off the unused columns.
//! 3. [`split_fields`] splits what is left into the five leading fields.

use std::borrow::Cow;
use std::io::{self, BufRead};

use crate::errors::{PseudomapError, PseudomapResult};
use crate::lexer::Lexer;
use crate::parser::ast::MappingRow;
use crate::parser::Parser;

/// Columns in one row of the mapping table
pub const TOTAL_COLUMNS: usize = 13;

/// Columns carried into translation: file, type, namespace, path, value
pub const LEADING_FIELDS: usize = 5;

/// Columns dropped from the end of each row
pub const TRAILING_FIELDS: usize = TOTAL_COLUMNS - LEADING_FIELDS;

/// True when every naive comma-split field of `line` is quoted and non-trivial
pub fn is_header(line: &str) -> bool {
    line.trim().split(',').all(|field| {
        field.len() >= 3 && field.starts_with('"') && field.ends_with('"')
    })
}

/// Iterator over the logical rows of a mapping table.
///
/// Leading header lines are skipped. A row still open when the input ends is yielded
/// as [`PseudomapError::IncompleteRow`]; a read failure is yielded once and ends the
/// iteration. Bytes that are not UTF-8 become U+FFFD and are left for the lexer.
pub struct RowReader<R> {
    input: R,
    pending: String,
    at_start: bool,
    finished: bool,
}

impl<R: BufRead> RowReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            pending: String::new(),
            at_start: true,
            finished: false,
        }
    }

    /// Read one physical line, without its terminator
    fn next_line(&mut self) -> Option<io::Result<String>> {
        let mut buf = Vec::new();
        match self.input.read_until(b'\n', &mut buf) {
            Ok(0) => None,
            Ok(_) => {
                let line = match String::from_utf8_lossy(&buf) {
                    Cow::Borrowed(line) => line.to_string(),
                    Cow::Owned(line) => {
                        log::warn!("invalid UTF-8 replaced in line: {}", line.trim_end());
                        line
                    }
                };
                Some(Ok(line))
            }
            Err(err) => Some(Err(err)),
        }
    }
}

impl<R: BufRead> Iterator for RowReader<R> {
    type Item = PseudomapResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            match self.next_line() {
                Some(Ok(line)) => {
                    let line = line.trim();
                    if self.at_start && !line.is_empty() {
                        if is_header(line) {
                            log::debug!("skipping header: {}", line);
                            continue;
                        }
                        self.at_start = false;
                    }

                    self.pending.push_str(line);
                    if self.pending.ends_with(',') {
                        return Some(Ok(std::mem::take(&mut self.pending)));
                    }
                }
                Some(Err(err)) => {
                    self.finished = true;
                    return Some(Err(err.into()));
                }
                None => {
                    self.finished = true;
                    if self.pending.is_empty() {
                        return None;
                    }
                    let row = std::mem::take(&mut self.pending);
                    log::warn!("last row is incomplete: {}", row);
                    return Some(Err(PseudomapError::incomplete_row(row)));
                }
            }
        }
    }
}

/// Cut the [`TRAILING_FIELDS`] unused columns off a logical row.
///
/// Scans from the last character toward the second, tracking quoted spans; a `""`
/// inside a quoted span is one literal quote. The payload ends just before the
/// eighth unquoted comma seen.
pub fn strip_trailing_fields(row: &str) -> PseudomapResult<&str> {
    let bytes = row.as_bytes();
    let mut in_quote = false;
    let mut skip = false;
    let mut commas = 0;

    for i in (1..bytes.len()).rev() {
        if skip {
            skip = false;
        } else if in_quote && bytes[i] == b'"' && bytes[i - 1] == b'"' {
            skip = true;
        } else if bytes[i] == b'"' {
            in_quote = !in_quote;
        } else if !in_quote && bytes[i] == b',' {
            commas += 1;
            if commas == TRAILING_FIELDS {
                return Ok(&row[..i]);
            }
        }
    }

    log::warn!("could not match fields 6-13: {}", row);
    Err(PseudomapError::malformed_row(row))
}

/// The five leading columns of a row, with CSV quoting removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadingFields<'a> {
    /// The first four columns exactly as written, quotes included
    pub columns: &'a str,
    pub file: &'a str,
    pub kind: &'a str,
    pub namespace: &'a str,
    pub path: &'a str,
    /// Interior `""` pairs are left for the lexer
    pub value: &'a str,
}

/// Split a payload on its first four unquoted commas
pub fn split_fields(payload: &str) -> PseudomapResult<LeadingFields<'_>> {
    let mut bounds = Vec::with_capacity(LEADING_FIELDS);
    let mut in_quote = false;
    let mut start = 0;

    for (i, ch) in payload.char_indices() {
        match ch {
            '"' => in_quote = !in_quote,
            ',' if !in_quote => {
                bounds.push(&payload[start..i]);
                start = i + 1;
                if bounds.len() == LEADING_FIELDS - 1 {
                    break;
                }
            }
            _ => {}
        }
    }

    if bounds.len() < LEADING_FIELDS - 1 {
        log::warn!("could not match fields 1-5: {}", payload);
        return Err(PseudomapError::malformed_row(payload));
    }
    let columns = &payload[..start.saturating_sub(1)];
    bounds.push(&payload[start..]);

    Ok(LeadingFields {
        columns,
        file: unquote(bounds[0]),
        kind: unquote(bounds[1]),
        namespace: unquote(bounds[2]),
        path: unquote(bounds[3]),
        value: unquote(bounds[4]),
    })
}

/// Remove one enclosing pair of `"` from a field
fn unquote(field: &str) -> &str {
    if field.len() >= 2 && field.starts_with('"') && field.ends_with('"') {
        &field[1..field.len() - 1]
    } else {
        field
    }
}

/// Reconstruct a [`MappingRow`] from a complete logical row
pub fn parse_mapping_row(sequence_number: usize, row: &str) -> PseudomapResult<MappingRow> {
    let payload = strip_trailing_fields(row)?;
    let fields = split_fields(payload)?;

    Ok(MappingRow {
        sequence_number,
        file: parse_field(fields.file, Parser::parse_identifier_field)?,
        kind: parse_field(fields.kind, Parser::parse_identifier_field)?,
        namespace: parse_field(fields.namespace, Parser::parse_path_element_field)?,
        path: parse_field(fields.path, Parser::parse_path_field)?,
        columns: fields.columns.to_string(),
        raw_value: fields.value.to_string(),
    })
}

/// Run one leading-field production over `text`
fn parse_field<T>(
    text: &str,
    production: impl FnOnce(&mut Parser) -> PseudomapResult<T>,
) -> PseudomapResult<T> {
    let tokens = Lexer::new(text).tokenize();
    let mut parser = Parser::new(tokens, text);
    production(&mut parser)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::IndexKind;

    fn rows(input: &str) -> Vec<PseudomapResult<String>> {
        RowReader::new(input.as_bytes()).collect()
    }

    #[test]
    fn test_header_detection() {
        assert!(is_header("\"File\",\"Type\",\"Namespace\",\"Path\",\"Value\""));
        assert!(!is_header("\"File\",Type,\"Namespace\""));
        assert!(!is_header("\"F\",\"\",\"N\""));
        assert!(!is_header("\"File\",\"Type\","));
    }

    #[test]
    fn test_reader_skips_headers() {
        let input = "\"A\",\"B\"\n\"C\",\"D\"\nF,T,N,p,v,,,,,,,,\n";
        let out = rows(input);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref().unwrap(), "F,T,N,p,v,,,,,,,,");
    }

    #[test]
    fn test_header_only_at_start() {
        let input = "F,T,N,p,v,,,,,,,,\n\"A\",\"B\",\n";
        let out = rows(input);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].as_ref().unwrap(), "\"A\",\"B\",");
    }

    #[test]
    fn test_multi_line_row_is_joined() {
        let input = "FOO,Bar,ns,path.x,\"cond ?\n  val1 : val2\",,,,,,,,\n";
        let out = rows(input);
        assert_eq!(out.len(), 1);
        assert_eq!(
            out[0].as_ref().unwrap(),
            "FOO,Bar,ns,path.x,\"cond ?val1 : val2\",,,,,,,,"
        );
    }

    #[test]
    fn test_incomplete_last_row() {
        let input = "F,T,N,p,v,,,,,,,,\nF,T,N,p,\"a ?\n";
        let out = rows(input);
        assert_eq!(out.len(), 2);
        assert!(matches!(
            &out[1],
            Err(PseudomapError::IncompleteRow { row }) if row == "F,T,N,p,\"a ?"
        ));
    }

    #[test]
    fn test_invalid_utf8_does_not_end_reading() {
        let input: &[u8] = b"F,T,N,p,a,,,,,,,,\nF,T,N,p,\"x \xff\",,,,,,,,\nF,T,N,p,b,,,,,,,,\n";
        let out: Vec<_> = RowReader::new(input).collect();
        assert_eq!(out.len(), 3);
        assert_eq!(
            out[1].as_ref().unwrap(),
            "F,T,N,p,\"x \u{FFFD}\",,,,,,,,"
        );
        assert_eq!(out[2].as_ref().unwrap(), "F,T,N,p,b,,,,,,,,");
    }

    #[test]
    fn test_blank_lines_contribute_nothing() {
        let out = rows("\n\n  \nF,T,N,p,v,,,,,,,,\n\n");
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_strip_trailing_fields() {
        let row = "file,type,namespace,path,\"(a && b)\",,,,,,,,";
        assert_eq!(
            strip_trailing_fields(row).unwrap(),
            "file,type,namespace,path,\"(a && b)\""
        );
    }

    #[test]
    fn test_strip_ignores_quoted_commas() {
        let row = "F,T,N,p,v,\"x,y\",,\"a \"\"b\"\", c\",,,,,";
        assert_eq!(strip_trailing_fields(row).unwrap(), "F,T,N,p,v");
    }

    #[test]
    fn test_strip_reports_short_rows() {
        let err = strip_trailing_fields("F,T,N,p,v,,,").unwrap_err();
        assert!(matches!(err, PseudomapError::MalformedRow { .. }));
    }

    #[test]
    fn test_split_fields() {
        let fields = split_fields("file,type,namespace,path,\"(a && b)\"").unwrap();
        assert_eq!(
            [fields.file, fields.kind, fields.namespace, fields.path, fields.value],
            ["file", "type", "namespace", "path", "(a && b)"]
        );
    }

    #[test]
    fn test_split_fields_keeps_value_commas_and_quotes() {
        let fields = split_fields("\"F\",T,N,p,\"f(a, \"\"x\"\")\"").unwrap();
        assert_eq!(fields.file, "F");
        assert_eq!(fields.columns, "\"F\",T,N,p");
        assert_eq!(fields.value, "f(a, \"\"x\"\")");

        let fields = split_fields("F,T,N,p,a,b").unwrap();
        assert_eq!(fields.value, "a,b");
    }

    #[test]
    fn test_split_fields_too_few() {
        assert!(split_fields("F,T,N,p").is_err());
    }

    #[test]
    fn test_parse_mapping_row() {
        let row = parse_mapping_row(
            7,
            "Enc,Visit,dx[2],code.coding[system@url:loinc].value,\"a ? b : c\",,,,,,,,",
        )
        .unwrap();
        assert_eq!(row.sequence_number, 7);
        assert_eq!(row.file, "Enc");
        assert_eq!(row.kind, "Visit");
        assert_eq!(row.namespace.index, Some(IndexKind::Position("2".into())));
        assert_eq!(row.path.to_string(), "code.coding[system@url:loinc].value");
        assert_eq!(row.raw_value, "a ? b : c");
        assert_eq!(row.columns, "Enc,Visit,dx[2],code.coding[system@url:loinc].value");
    }

    #[test]
    fn test_parse_mapping_row_rejects_bad_leading_fields() {
        let err = parse_mapping_row(1, "a.b,T,N,p,v,,,,,,,,").unwrap_err();
        assert!(err.is_parse_failure());
        assert!(parse_mapping_row(1, "F,T,N,p..q,v,,,,,,,,").is_err());
    }
}
