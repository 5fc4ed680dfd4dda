use crate::error::ParseError;
use crate::parser;
use crate::session::{Mode, Session};
use regex::Regex;
use std::io::{self, Write};
use std::sync::LazyLock;

static ASSIGN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.+)$").unwrap());

/// Interactive console loop. Keeps one persistent session so variable
/// bindings and the open transaction survive between commands.
pub fn start(session: &mut Session) {
    println!("objex console ({} mode)", mode_name(session.mode()));
    println!("Type 'help' for functions, 'exit' to quit; end a line with TAB to list completions");
    println!();

    loop {
        print!("{}> ", mode_name(session.mode()));
        io::stdout().flush().unwrap();

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => {
                // EOF (Ctrl-D or piped input ended)
                println!();
                break;
            }
            Ok(_) => {
                // A trailing tab requests completion instead of evaluation
                let trimmed = line.trim_end_matches(['\n', '\r']);
                let complete = trimmed.ends_with('\t');
                let line = trimmed.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    break;
                }
                if line == "help" {
                    print_help(session);
                    continue;
                }
                run_command(line, complete, session);
            }
            Err(error) => {
                eprintln!("Error reading input: {}", error);
                break;
            }
        }
    }
}

fn mode_name(mode: Mode) -> &'static str {
    match mode {
        Mode::KeyValue => "kv",
        Mode::RawStore => "raw",
        Mode::TypedModel => "typed",
    }
}

fn print_help(session: &Session) {
    println!("Functions:");
    for function in session.functions() {
        println!("  {:<16} {}", function.usage(), function.summary());
    }
}

/// Parse and run one console line against the persistent session.
pub fn run_command(source: &str, complete: bool, session: &mut Session) {
    // Variable assignment binds the evaluated Value without forcing it, so a
    // deferred binding keeps tracking the live transaction.
    if let Some(caps) = ASSIGN_RE.captures(source) {
        let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let rhs = caps.get(2).map(|m| m.range().start).unwrap_or(source.len());
        match parser::parse(session, source, rhs, complete) {
            Ok(node) => match node.evaluate(session) {
                Ok(value) => session.set_var(name, value),
                Err(error) => error.report(),
            },
            Err(error) => report_parse_error(&error, source),
        }
        return;
    }

    match parser::parse(session, source, 0, complete) {
        Ok(node) => {
            if complete {
                // Input already parses; nothing to complete.
                return;
            }
            match node.evaluate(session).and_then(|value| value.get(session)) {
                Ok(datum) => println!("{}", datum),
                Err(error) => error.report(),
            }
        }
        Err(error) => report_parse_error(&error, source),
    }
}

fn report_parse_error(error: &ParseError, source: &str) {
    if !error.completions.is_empty() {
        for completion in &error.completions {
            println!("{}", completion);
        }
        return;
    }
    error.report(source);
}
