use std::{
    fmt,
    fs::read_to_string,
    io::{stdin, stdout, BufRead, BufReader, Write},
    path::PathBuf,
};

pub mod env;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod parser;
pub mod report;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

use anyhow::{Context, Result};
use itertools::Itertools;
use log::debug;

use crate::{
    interpreter::Interpreter,
    parser::Parser,
    report::{Diagnostic, Diagnostics, Reporter},
    scanner::Scanner,
    stmt::Stmt,
};

/// Debugging switches set from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Print the scanned tokens before parsing.
    pub dump_tokens: bool,
    /// Print the parsed statements before running them.
    pub dump_ast: bool,
    /// Keep a copy of printed output and return it from `Session::run`.
    pub capture_output: bool,
}

/// Why a program did not run to completion.
#[derive(Debug)]
pub enum LoxError {
    /// One or more syntax errors; nothing was executed.
    Parse(Vec<Diagnostic>),
    /// Execution stopped at a runtime fault. `output` holds what was printed
    /// before it.
    Runtime { diagnostic: Diagnostic, output: String },
}

impl LoxError {
    /// Process exit status for the driver.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoxError::Parse(_) => 65,
            LoxError::Runtime { .. } => 70,
        }
    }
}

impl fmt::Display for LoxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoxError::Parse(diagnostics) => write!(f, "{}", diagnostics.iter().join("\n")),
            LoxError::Runtime { diagnostic, .. } => write!(f, "{}", diagnostic),
        }
    }
}

impl std::error::Error for LoxError {}

/// Keeps one interpreter alive across several sources, so globals defined by
/// one REPL line are visible to the next.
#[derive(Default)]
pub struct Session {
    interpreter: Interpreter,
    diagnostics: Diagnostics,
    options: RunOptions,
}

impl Session {
    pub fn new(options: RunOptions) -> Self {
        let interpreter = if options.capture_output {
            Interpreter::capturing()
        } else {
            Interpreter::default()
        };
        Session {
            interpreter,
            diagnostics: Diagnostics::default(),
            options,
        }
    }

    /// Runs a whole program. Returns everything it printed when capturing
    /// output, otherwise an empty string.
    pub fn run(&mut self, source: &str) -> Result<String> {
        let stmts = self.parse(source)?;
        self.execute(&stmts)
    }

    /// Like `run`, but a line holding a single expression statement has its
    /// value printed instead of discarded.
    pub fn run_line(&mut self, source: &str) -> Result<String> {
        let stmts = self.parse(source)?;
        match stmts.as_slice() {
            [Stmt::Expression(expr)] => match self.interpreter.evaluate_expression(expr) {
                Ok(value) => {
                    println!("{}", value);
                    Ok(format!("{}\n", value))
                }
                Err(err) => {
                    self.diagnostics.runtime_error(&err);
                    Err(self.runtime_failure(String::new()))
                }
            },
            _ => self.execute(&stmts),
        }
    }

    fn parse(&mut self, source: &str) -> Result<Vec<Stmt>> {
        self.diagnostics.clear();

        let tokens = Scanner::new(source).scan_tokens()?;
        debug!("scanned {} tokens", tokens.len());
        if self.options.dump_tokens {
            for token in &tokens {
                println!("{}", token);
            }
        }

        let stmts = Parser::new(tokens, &mut self.diagnostics).parse();
        debug!("parsed {} top-level statements", stmts.len());
        if self.diagnostics.had_error() {
            return Err(LoxError::Parse(self.diagnostics.take()).into());
        }

        if self.options.dump_ast {
            for stmt in &stmts {
                println!("{:#?}", stmt);
            }
        }
        Ok(stmts)
    }

    fn execute(&mut self, stmts: &[Stmt]) -> Result<String> {
        let output = self.interpreter.interpret(stmts, &mut self.diagnostics);
        if self.diagnostics.had_runtime_error() {
            return Err(self.runtime_failure(output));
        }
        Ok(output)
    }

    fn runtime_failure(&mut self, output: String) -> anyhow::Error {
        match self.diagnostics.take().pop() {
            Some(diagnostic) => LoxError::Runtime { diagnostic, output }.into(),
            None => anyhow::anyhow!("runtime fault was not reported"),
        }
    }
}

pub fn run_file(path: PathBuf, options: RunOptions) -> Result<String> {
    let contents =
        read_to_string(&path).with_context(|| format!("could not read file {:?}", &path))?;
    Session::new(options).run(&contents)
}

pub fn run_prompt(options: RunOptions) -> Result<()> {
    let mut session = Session::new(options);
    let mut reader = BufReader::new(stdin());
    loop {
        let mut buffer = String::new();
        print!("> ");
        stdout().flush().with_context(|| "could not flush stdout")?;
        reader.read_line(&mut buffer)?;
        if buffer.is_empty() {
            return Ok(());
        };
        // a bad line is reported and the prompt carries on
        if let Err(err) = session.run_line(&buffer) {
            eprintln!("{:#}", err);
        }
    }
}

/// Runs `source` in a fresh session and returns what it printed.
pub fn run(source: &str) -> Result<String> {
    let options = RunOptions {
        capture_output: true,
        ..Default::default()
    };
    Session::new(options).run(source)
}
