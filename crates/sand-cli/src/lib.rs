//! Command-line front end for Sand
//!
//! `main.rs` only wires the process up; everything testable lives here.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use clap_complete::Shell;
use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::{self, termcolor};
use sand_ast::{Document, ParseError};
use sand_grammar::{GrammarSource, LOAD_FAILURE};
use sand_parser::{Parser, parse_selector};
use sand_render::{Format, render};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "SAND_LOG";

#[must_use]
pub fn build_cli() -> Command {
    Command::new("sand")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Write one document in several languages at once")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log debug output to stderr")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("parse")
                .about("Parse and validate a document, then print its tree")
                .arg(
                    Arg::new("input")
                        .value_name("FILE")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .value_parser(["debug", "json"])
                        .default_value("debug"),
                ),
        )
        .subcommand(
            Command::new("out")
                .about("Print the text a selector points to, once per name")
                .arg(Arg::new("selector").value_name("SELECTOR").required(true))
                .arg(
                    Arg::new("input")
                        .long("input")
                        .short('i')
                        .value_name("FILE")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("markdown")
                        .long("markdown")
                        .short('m')
                        .help("Render sections as Markdown headings")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("lsp").about("Run the language server on stdio"))
        .subcommand(
            Command::new("completions")
                .about("Print shell completions")
                .arg(
                    Arg::new("shell")
                        .value_name("SHELL")
                        .required(true)
                        .value_parser(value_parser!(Shell)),
                ),
        )
        .subcommand(
            Command::new("grammar")
                .about("Check that the compiled tree-sitter grammar loads")
                .arg(
                    Arg::new("library")
                        .long("library")
                        .short('l')
                        .value_name("PATH")
                        .help("Grammar library; defaults to $SAND_GRAMMAR, then the search paths")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("symbol")
                        .long("symbol")
                        .value_name("NAME")
                        .help("Exported language function [default: tree_sitter_sand]"),
                ),
        )
}

/// Install the stderr logger. `SAND_LOG` sets the filter; `verbose` forces
/// debug.
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Diagnostic for any document error
#[must_use]
pub fn convert_parse_error(file_id: usize, error: &ParseError) -> Diagnostic<usize> {
    match error {
        ParseError::Syntax { .. } => convert_syntax_error(file_id, error),
        _ => {
            let diagnostic = Diagnostic::error().with_message(error.to_string());
            match error.span() {
                Some(span) => diagnostic.with_labels(vec![Label::primary(file_id, span)]),
                None => diagnostic,
            }
        }
    }
}

/// Diagnostic headed "syntax error" with the detail on the label
#[must_use]
pub fn convert_syntax_error(file_id: usize, error: &ParseError) -> Diagnostic<usize> {
    let diagnostic = Diagnostic::error().with_message("syntax error");
    match error.span() {
        Some(span) => diagnostic
            .with_labels(vec![Label::primary(file_id, span).with_message(error.to_string())]),
        None => diagnostic.with_notes(vec![error.to_string()]),
    }
}

pub fn write_completions(shell: Shell, out: &mut dyn Write) {
    let mut cmd = build_cli();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, out);
}

pub fn print_completions(shell: Shell) {
    write_completions(shell, &mut std::io::stdout());
}

/// Dispatch a parsed command line; returns the process exit code
///
/// # Errors
///
/// I/O failures and anything that is not a document error
pub fn run(matches: &ArgMatches) -> anyhow::Result<i32> {
    match matches.subcommand() {
        Some(("parse", args)) => {
            let input = required::<PathBuf>(args, "input")?;
            let json = args.get_one::<String>("format").is_some_and(|f| f == "json");
            cmd_parse(input, json)
        }
        Some(("out", args)) => {
            let selector = required::<String>(args, "selector")?;
            let input = required::<PathBuf>(args, "input")?;
            let format = if args.get_flag("markdown") {
                Format::Markdown
            } else {
                Format::Plain
            };
            cmd_out(selector, input, format)
        }
        Some(("lsp", _)) => cmd_lsp(),
        Some(("completions", args)) => {
            print_completions(*required::<Shell>(args, "shell")?);
            Ok(0)
        }
        Some(("grammar", args)) => cmd_grammar(
            args.get_one::<PathBuf>("library"),
            args.get_one::<String>("symbol"),
        ),
        _ => anyhow::bail!("no command given"),
    }
}

fn required<'a, T: Clone + Send + Sync + 'static>(
    args: &'a ArgMatches,
    id: &str,
) -> anyhow::Result<&'a T> {
    args.get_one::<T>(id)
        .with_context(|| format!("missing argument `{id}`"))
}

fn cmd_parse(input: &Path, json: bool) -> anyhow::Result<i32> {
    let Some(doc) = read_document(input)? else {
        return Ok(1);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        println!("{doc:#?}");
    }
    Ok(0)
}

fn cmd_out(selector: &str, input: &Path, format: Format) -> anyhow::Result<i32> {
    let Some(doc) = read_document(input)? else {
        return Ok(1);
    };

    let selector = parse_selector(selector)?;
    let outputs = render(&doc, &selector, format)?;
    let text = outputs
        .into_iter()
        .map(|rendering| rendering.text)
        .collect::<Vec<_>>()
        .join("\n\n");
    println!("{text}");
    Ok(0)
}

fn cmd_lsp() -> anyhow::Result<i32> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    runtime.block_on(sand_lsp::serve_stdio());
    Ok(0)
}

fn cmd_grammar(library: Option<&PathBuf>, symbol: Option<&String>) -> anyhow::Result<i32> {
    let source = match library {
        Some(path) => Ok(GrammarSource::library(path.clone())),
        None => GrammarSource::discover(),
    };
    let source = source.map(|source| match (source, symbol) {
        (GrammarSource::Library { path, .. }, Some(symbol)) => GrammarSource::Library {
            path,
            symbol: symbol.clone(),
        },
        (source, _) => source,
    });

    match source.and_then(sand_grammar::load) {
        Ok(grammar) => {
            println!(
                "grammar loaded: ABI version {}, {} node kinds",
                grammar.abi_version(),
                grammar.node_kind_count()
            );
            Ok(0)
        }
        Err(err) => {
            eprintln!("{LOAD_FAILURE}: {err}");
            Ok(1)
        }
    }
}

/// Parse a file, printing diagnostics to stderr; `None` if it had errors
///
/// # Errors
///
/// Fails when the file cannot be read or diagnostics cannot be written
pub fn read_document(path: &Path) -> anyhow::Result<Option<Document>> {
    let input = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let filename = path.display().to_string();
    let parser = Parser::new_with_filename(&input, &filename);

    match parser.parse() {
        Ok(doc) => Ok(Some(doc)),
        Err(errors) => {
            emit_errors(&filename, &input, &errors)?;
            Ok(None)
        }
    }
}

fn emit_errors(filename: &str, input: &str, errors: &[ParseError]) -> anyhow::Result<()> {
    let mut files = SimpleFiles::new();
    let file_id = files.add(filename.to_string(), input.to_string());

    let writer = termcolor::StandardStream::stderr(termcolor::ColorChoice::Auto);
    let config = term::Config::default();
    let mut writer = writer.lock();
    for error in errors {
        term::emit(&mut writer, &config, &files, &convert_parse_error(file_id, error))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use codespan_reporting::diagnostic::Severity;
    use sand_ast::Span;
    use std::fs;
    use tempfile::NamedTempFile;

    #[test]
    fn test_convert_parse_error_with_span() {
        let cases = vec![
            (
                ParseError::MultipleNameDefine(Span::new(10, 20)),
                "names are defined more than once",
            ),
            (
                ParseError::DuplicateNames("test_name".to_string(), Span::new(10, 20)),
                "duplicate name: `test_name`",
            ),
            (
                ParseError::DuplicateAlias("test_alias".to_string(), Span::new(10, 20)),
                "duplicate alias: `test_alias`",
            ),
            (
                ParseError::AliasConflictWithNames("en".to_string(), Span::new(10, 20)),
                "alias `en` conflicts with a name",
            ),
        ];

        for (error, message) in cases {
            let diagnostic = convert_parse_error(3, &error);
            assert_eq!(diagnostic.severity, Severity::Error);
            assert_eq!(diagnostic.message, message);
            assert_eq!(diagnostic.labels.len(), 1);
            assert_eq!(diagnostic.labels[0].file_id, 3);
            assert_eq!(diagnostic.labels[0].range, 10..20);
        }
    }

    #[test]
    fn test_convert_parse_error_missing_names() {
        let diagnostic = convert_parse_error(5, &ParseError::MissingNames);
        assert_eq!(diagnostic.message, "names are not defined");
        assert!(diagnostic.labels.is_empty());
    }

    #[test]
    fn test_convert_parse_error_selector() {
        let error = ParseError::Selector("invalid.selector".to_string(), Span::new(40, 50));
        let diagnostic = convert_parse_error(4, &error);
        assert_eq!(
            diagnostic.message,
            "selector syntax is incorrect: invalid.selector"
        );
        assert_eq!(diagnostic.labels.len(), 1);
        assert_eq!(diagnostic.labels[0].file_id, 4);
        assert_eq!(diagnostic.labels[0].range, 40..50);
    }

    #[test]
    fn test_convert_syntax_error() {
        let error = ParseError::syntax("expected `]`", Span::new(1, 2));
        let diagnostic = convert_parse_error(0, &error);
        assert_eq!(diagnostic.message, "syntax error");
        assert_eq!(diagnostic.labels[0].range, 1..2);
        assert_eq!(diagnostic.labels[0].message, "expected `]`");
    }

    #[test]
    fn test_cli_parses_commands() {
        let matches = build_cli()
            .try_get_matches_from(["sand", "out", ".en", "-i", "doc.sand", "-m"])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "out");
        assert_eq!(args.get_one::<String>("selector").unwrap(), ".en");
        assert!(args.get_flag("markdown"));

        let matches = build_cli()
            .try_get_matches_from(["sand", "-v", "parse", "doc.sand", "--format", "json"])
            .unwrap();
        assert!(matches.get_flag("verbose"));

        assert!(build_cli()
            .try_get_matches_from(["sand", "parse", "doc.sand", "--format", "xml"])
            .is_err());
        assert!(build_cli().try_get_matches_from(["sand", "out", ".en"]).is_err());
        assert!(build_cli().try_get_matches_from(["sand"]).is_err());
    }

    #[test]
    fn test_completions_for_every_shell() {
        for shell in [
            Shell::Bash,
            Shell::Zsh,
            Shell::Fish,
            Shell::PowerShell,
            Shell::Elvish,
        ] {
            let mut out = Vec::new();
            write_completions(shell, &mut out);
            let script = String::from_utf8(out).unwrap();
            assert!(script.contains("sand"), "{shell}");
            assert!(script.contains("completions"), "{shell}");
        }
    }

    #[test]
    fn test_read_document() {
        let file = NamedTempFile::new().unwrap();
        fs::write(&file, "#(en)\n#[hello]\n").unwrap();
        let doc = read_document(file.path()).unwrap().unwrap();
        assert_eq!(doc.names, vec!["en"]);

        fs::write(&file, "no names here").unwrap();
        assert!(read_document(file.path()).unwrap().is_none());

        assert!(read_document(Path::new("does/not/exist.sand")).is_err());
    }
}
