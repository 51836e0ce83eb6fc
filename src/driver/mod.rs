//! Row-level orchestration.
//!
//! [`Driver`] owns the run's counters and output channels. Each logical row is
//! numbered, reconstructed, translated, and reported as either a success line on the
//! output writer or a `!!!` failure line on the error writer. No row failure stops
//! the run; only I/O errors do.

use std::fmt;
use std::io::{BufRead, Write};

use crate::errors::{PseudomapError, PseudomapResult};
use crate::lexer::Lexer;
use crate::parser::ast::{Fragment, MappingRow};
use crate::parser::Parser;
use crate::reader::{parse_mapping_row, RowReader};
use crate::translator::RenderOptions;

/// Final row counts of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub succeeded: usize,
    pub failed: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed, {} succeeded", self.failed, self.succeeded)
    }
}

/// A translated value and any illegal characters skipped on the way
#[derive(Debug)]
pub struct Translation {
    pub fragment: Fragment,
    pub diagnostics: Vec<PseudomapError>,
}

/// Lex and parse one value field
pub fn translate_value(source: &str, options: &RenderOptions) -> PseudomapResult<Translation> {
    let mut lexer = Lexer::new(source);
    let tokens = lexer.tokenize();
    let diagnostics = lexer.take_diagnostics();

    let mut parser = Parser::new(tokens, source).with_options(*options);
    let fragment = parser.parse_value()?;

    Ok(Translation {
        fragment,
        diagnostics,
    })
}

/// Translate a complete logical row into its success line
pub fn translate_row(
    sequence_number: usize,
    row: &str,
    options: &RenderOptions,
) -> PseudomapResult<String> {
    let mapping = parse_mapping_row(sequence_number, row)?;
    let translation = translate_value(&mapping.raw_value, options)?;
    Ok(format_success(&mapping, &translation.fragment.text))
}

/// Leading columns are echoed as written, CSV quotes included
fn format_success(row: &MappingRow, rendered: &str) -> String {
    format!("{},{},{}", row.sequence_number, row.columns, rendered)
}

/// Per-run translation context
pub struct Driver<O: Write, E: Write> {
    options: RenderOptions,
    out: O,
    err: E,
    /// Number of the last attempted row
    sequence: usize,
    succeeded: usize,
    failed: usize,
}

impl<O: Write, E: Write> Driver<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self {
            options: RenderOptions::default(),
            out,
            err,
            sequence: 0,
            succeeded: 0,
            failed: 0,
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Translate every row of a mapping table
    pub fn run<R: BufRead>(&mut self, input: R) -> PseudomapResult<Summary> {
        for row in RowReader::new(input) {
            match row {
                Ok(row) => self.process_row(&row)?,
                Err(PseudomapError::IncompleteRow { row }) => {
                    self.sequence += 1;
                    self.report_failure(&row)?;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(self.summary())
    }

    /// Translate one complete logical row and report the outcome
    pub fn process_row(&mut self, row: &str) -> PseudomapResult<()> {
        self.sequence += 1;
        match translate_row(self.sequence, row, &self.options) {
            Ok(line) => {
                log::debug!("row {} translated", self.sequence);
                writeln!(self.out, "{}", line)?;
                self.succeeded += 1;
                Ok(())
            }
            Err(err) => {
                log::debug!("row {}: {}", self.sequence, err.message());
                self.report_failure(row)
            }
        }
    }

    /// Translate one bare expression, bypassing row reconstruction.
    ///
    /// The rendering goes to the output writer. Returns the diagnostics worth showing:
    /// skipped characters, then the parse error if there was one.
    pub fn process_expression(&mut self, source: &str) -> PseudomapResult<Vec<PseudomapError>> {
        match translate_value(source, &self.options) {
            Ok(translation) => {
                writeln!(self.out, "{}", translation.fragment.text)?;
                self.succeeded += 1;
                Ok(translation.diagnostics)
            }
            Err(err) => {
                self.failed += 1;
                let mut lexer = Lexer::new(source);
                lexer.tokenize();
                let mut diagnostics = lexer.take_diagnostics();
                diagnostics.push(err);
                Ok(diagnostics)
            }
        }
    }

    fn report_failure(&mut self, row: &str) -> PseudomapResult<()> {
        writeln!(self.err, "!!! {},{}", self.sequence, row)?;
        self.failed += 1;
        Ok(())
    }

    pub fn summary(&self) -> Summary {
        Summary {
            succeeded: self.succeeded,
            failed: self.failed,
        }
    }

    /// Write the summary line to the error writer and flush both writers
    pub fn finish(&mut self) -> PseudomapResult<Summary> {
        let summary = self.summary();
        writeln!(self.err, "{}", summary)?;
        self.out.flush()?;
        self.err.flush()?;
        Ok(summary)
    }
}
