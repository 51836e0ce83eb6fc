// Rust 1.93+ triggers false positives on thiserror/miette derive macro fields
#![allow(unused_assignments)]

//! Pseudomap
//!
//! Translates the value expressions of a mapping table into readable
//! `if / display / otherwise` pseudocode.
//!
//! # Example
//!
//! ```text
//! Encounter,Visit,enc,class.code,"type == ""I"" ? ""IMP"" : ""AMB""",,,,,,,,
//! ```
//!
//! becomes
//!
//! ```text
//! 1,Encounter,Visit,enc,class.code,"if type==""I"" display ""IMP""
//! otherwise display ""AMB"""
//! ```

pub mod driver;
pub mod errors;
pub mod lexer;
pub mod parser;
pub mod reader;
pub mod translator;

pub use driver::{translate_row, translate_value, Driver, Summary, Translation};
pub use errors::{PseudomapError, PseudomapResult};
pub use lexer::token::{SourceLocation, Token, TokenKind};
pub use lexer::Lexer;
pub use parser::ast;
pub use parser::Parser;
pub use reader::{parse_mapping_row, split_fields, strip_trailing_fields, RowReader};
pub use translator::RenderOptions;
