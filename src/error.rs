use std::fmt;

use crate::token::Token;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    TypeMismatch,
    DivideByZero,
    UndefinedVariable,
    UninitializedVariable,
}

/// A fault raised while evaluating a program. Carries the offending token so
/// the reporter can point at a source line.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub token: Token,
    pub message: String,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, token: &Token, message: impl Into<String>) -> Self {
        RuntimeError {
            kind,
            token: token.clone(),
            message: message.into(),
        }
    }

    pub fn type_mismatch(token: &Token, message: &str) -> Self {
        RuntimeError::new(RuntimeErrorKind::TypeMismatch, token, message)
    }

    pub fn undefined_variable(name: &Token) -> Self {
        RuntimeError::new(
            RuntimeErrorKind::UndefinedVariable,
            name,
            format!("Undefined variable '{}'.", name.lexeme),
        )
    }

    pub fn line(&self) -> u32 {
        self.token.line
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\n[line {}]", self.message, self.token.line)
    }
}

impl std::error::Error for RuntimeError {}
