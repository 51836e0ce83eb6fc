#![allow(unused_assignments)]

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use pseudomap::{Driver, Lexer, PseudomapError, PseudomapResult, RenderOptions};

/// Mapping table to pseudocode translator
///
/// Reads a 13-column mapping table and prints each row with its value
/// expression rendered as `if / display / otherwise` pseudocode.
#[derive(Parser)]
#[command(name = "pseudomap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Mapping table to translate (reads stdin when omitted)
    file: Option<PathBuf>,

    /// Translate a single expression instead of a table
    #[arg(short = 'X', long = "expr", conflicts_with = "file")]
    expr: Option<String>,

    /// Indent a nested otherwise-branch like a nested then-branch
    #[arg(long)]
    indent_else: bool,

    /// Log per-row progress and failures
    #[arg(short, long)]
    verbose: bool,

    /// With --expr, print the token stream instead of translating
    #[arg(long, hide = true, requires = "expr")]
    tokens: bool,
}

fn main() -> ExitCode {
    // Set up miette for nice error output
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))
    .ok();

    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let options = RenderOptions {
        indent_else_branches: cli.indent_else,
    };

    let result = match (&cli.expr, &cli.file) {
        (Some(expr), _) if cli.tokens => cmd_tokens(expr),
        (Some(expr), _) => cmd_expr(expr, options),
        (None, Some(file)) => cmd_file(file, options),
        (None, None) => cmd_stdin(options),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let exit_code = match &e {
                PseudomapError::IoError { .. } => ExitCode::from(3),
                _ => ExitCode::from(1),
            };
            eprintln!("{:?}", miette::Report::new(e));
            exit_code
        }
    }
}

fn cmd_file(file: &Path, options: RenderOptions) -> PseudomapResult<()> {
    let input = File::open(file).map_err(|e| {
        PseudomapError::io_error(format!("failed to open {}: {}", file.display(), e))
    })?;
    translate_table(BufReader::new(input), options)
}

fn cmd_stdin(options: RenderOptions) -> PseudomapResult<()> {
    translate_table(io::stdin().lock(), options)
}

fn translate_table(input: impl io::BufRead, options: RenderOptions) -> PseudomapResult<()> {
    let mut driver = Driver::new(io::stdout().lock(), io::stderr()).with_options(options);
    driver.run(input)?;
    driver.finish()?;
    Ok(())
}

fn cmd_expr(expr: &str, options: RenderOptions) -> PseudomapResult<()> {
    let mut driver = Driver::new(io::stdout().lock(), io::stderr()).with_options(options);
    let diagnostics = driver.process_expression(expr)?;
    for diagnostic in diagnostics {
        eprintln!("{:?}", miette::Report::new(diagnostic));
    }
    driver.finish()?;
    Ok(())
}

fn cmd_tokens(expr: &str) -> PseudomapResult<()> {
    let mut lexer = Lexer::new(expr);
    for token in lexer.tokenize() {
        println!("{}", token);
    }
    for diagnostic in lexer.take_diagnostics() {
        eprintln!("{:?}", miette::Report::new(diagnostic));
    }
    Ok(())
}
