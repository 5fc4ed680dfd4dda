use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use std::fmt;

/// Failure raised while parsing console input.
///
/// Carries the cursor position where parsing stopped and an ordered list of
/// completion suggestions for the front-end's tab completion. A parse failure
/// is always recoverable: the console reports it and re-prompts.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub position: usize,
    pub message: String,
    pub completions: Vec<String>,
}

impl ParseError {
    pub fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
            completions: Vec::new(),
        }
    }

    pub fn with_completion(mut self, completion: impl Into<String>) -> Self {
        self.completions.push(completion.into());
        self
    }

    pub fn with_completions<I, S>(mut self, completions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.completions.extend(completions.into_iter().map(Into::into));
        self
    }

    pub fn report(&self, source: &str) {
        let filename = "<console>";
        let start = self.position.min(source.len());
        let end = (start + 1).min(source.len()).max(start);

        let mut report_builder = Report::build(ReportKind::Error, filename, start)
            .with_message(format!("{}: {}", "Parse Error".fg(Color::Yellow), self.message))
            .with_label(
                Label::new((filename, start..end))
                    .with_message(&self.message)
                    .with_color(Color::Yellow),
            );

        if !self.completions.is_empty() {
            report_builder = report_builder.with_note(format!(
                "{}: {}",
                "completions".fg(Color::Cyan),
                self.completions.join(", ")
            ));
        }

        report_builder
            .finish()
            .print((filename, Source::from(source)))
            .unwrap();
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Failure raised while evaluating a parsed expression.
///
/// Distinct from [`ParseError`]: evaluation failures have no cursor position
/// and never carry completions. They cover unbound variables, unknown storage
/// identifiers, wrong runtime types, and absent transactions.
#[derive(Debug, Clone)]
pub struct EvalError {
    pub message: String,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn unbound_variable(name: &str) -> Self {
        Self::new(format!("variable `${}' is not set", name))
    }

    pub fn null_value(label: &str) -> Self {
        Self::new(format!("invalid null value for {}", label))
    }

    pub fn no_transaction() -> Self {
        Self::new("no transaction is currently open")
    }

    pub fn report(&self) {
        eprintln!("{}: {}", "Evaluation Error".fg(Color::Magenta), self.message);
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EvalError {}

/// Collect the candidates starting with `prefix`, sorted, for tab completion.
pub fn completions_matching<'a, I>(candidates: I, prefix: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut matches: Vec<String> = candidates
        .into_iter()
        .filter(|name| name.starts_with(prefix))
        .map(|name| name.to_string())
        .collect();
    matches.sort();
    matches
}
