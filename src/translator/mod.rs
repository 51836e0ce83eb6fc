//! Pseudocode rendering.
//!
//! The parser calls into this module as it reduces, so a conditional is turned into
//! `if / display / otherwise` prose the moment its branches are known. Non-conditional
//! nodes render as a normalized reconstruction of their source text.

use crate::parser::ast::{ComparisonOp, Connector, Fragment, TernaryShape};

/// Rendering of an omitted sub-expression
pub const BLANK: &str = "<BLANK>";

/// Rendering configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Indent a nested otherwise-branch the way a nested then-branch is indented.
    /// Off by default: a nested otherwise-branch continues on the `otherwise` line.
    pub indent_else_branches: bool,
}

/// Prefix every line of `text` with one tab
pub fn indent(text: &str) -> String {
    format!("\t{}", text.replace('\n', "\n\t"))
}

/// Render a conditional from its already-rendered parts
pub fn ternary(
    condition: &str,
    then_branch: &str,
    else_branch: &str,
    shape: TernaryShape,
    options: &RenderOptions,
) -> String {
    match shape {
        TernaryShape::Flat => format!(
            "if {} display {}\notherwise display {}",
            condition, then_branch, else_branch
        ),
        TernaryShape::ThenNested => format!(
            "if {}\n{}\notherwise display {}",
            condition,
            indent(then_branch),
            else_branch
        ),
        TernaryShape::ElseNested if options.indent_else_branches => format!(
            "if {} display {}\notherwise\n{}",
            condition,
            then_branch,
            indent(else_branch)
        ),
        TernaryShape::ElseNested => format!(
            "if {} display {}\notherwise {}",
            condition, then_branch, else_branch
        ),
    }
}

/// Join boolean atoms with their connector words, left to right
pub fn bool_chain(terms: &[Fragment], connectors: &[Connector]) -> String {
    let mut out = String::new();
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            if let Some(connector) = connectors.get(i - 1) {
                out.push(' ');
                out.push_str(connector.as_word());
                out.push(' ');
            }
        }
        out.push_str(&term.text);
    }
    out
}

pub fn comparison(left: &str, op: ComparisonOp, right: &str) -> String {
    format!("{}{}{}", left, op.as_str(), right)
}

/// Render one `.`, `?.` or `+` link of a chained term.
///
/// A plain `.` after the `_` placeholder drops both, leaving the right-hand side.
pub fn chain_link(left: &str, link: &str, right: &str) -> String {
    if is_placeholder_link(left, link) {
        right.to_string()
    } else {
        format!("{}{}{}", left, link, right)
    }
}

pub fn is_placeholder_link(left: &str, link: &str) -> bool {
    left == "_" && link == "."
}

pub fn call(name: &str, args: &[Fragment]) -> String {
    let args: Vec<&str> = args.iter().map(|a| a.text.as_str()).collect();
    format!("{}({})", name, args.join(","))
}

pub fn construct(call: &str) -> String {
    format!("new {}", call)
}

pub fn index(base: &str, key: &str) -> String {
    format!("{}[{}]", base, key)
}

pub fn group(inner: &str) -> String {
    format!("({})", inner)
}

/// Wrap a finished value rendering in one pair of literal quotes
pub fn value(text: &str) -> String {
    format!("\"{}\"", text)
}
