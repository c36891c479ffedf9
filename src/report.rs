use std::fmt;

use log::debug;

use crate::{
    error::RuntimeError,
    token::{Token, TokenKind},
};

/// Receives faults from the parser and the interpreter. Neither of them
/// formats or prints errors on its own.
pub trait Reporter {
    fn error(&mut self, token: &Token, message: &str);
    fn runtime_error(&mut self, error: &RuntimeError);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Parse,
    Runtime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub phase: Phase,
    pub line: u32,
    /// Empty for runtime faults, otherwise `" at end"` or `" at 'lexeme'"`.
    pub location: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.phase {
            Phase::Parse => write!(
                f,
                "[line {}] Error{}: {}",
                self.line, self.location, self.message
            ),
            Phase::Runtime => write!(f, "{}\n[line {}]", self.message, self.line),
        }
    }
}

/// Collects every reported fault in order.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn had_error(&self) -> bool {
        self.entries.iter().any(|d| d.phase == Phase::Parse)
    }

    pub fn had_runtime_error(&self) -> bool {
        self.entries.iter().any(|d| d.phase == Phase::Runtime)
    }

    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Reporter for Diagnostics {
    fn error(&mut self, token: &Token, message: &str) {
        let location = match token.kind {
            TokenKind::Eof => " at end".to_owned(),
            _ => format!(" at '{}'", token.lexeme),
        };
        let diagnostic = Diagnostic {
            phase: Phase::Parse,
            line: token.line,
            location,
            message: message.to_owned(),
        };
        debug!("reported: {}", diagnostic);
        self.entries.push(diagnostic);
    }

    fn runtime_error(&mut self, error: &RuntimeError) {
        let diagnostic = Diagnostic {
            phase: Phase::Runtime,
            line: error.line(),
            location: String::new(),
            message: error.message.clone(),
        };
        debug!("reported: {:?} {}", error.kind, diagnostic);
        self.entries.push(diagnostic);
    }
}
