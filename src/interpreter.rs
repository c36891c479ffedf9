use std::cell::RefCell;

use log::{debug, trace};

use crate::{
    env::Environment,
    error::{RuntimeError, RuntimeErrorKind, RuntimeResult},
    expr::Expr,
    report::Reporter,
    stmt::Stmt,
    token::{Token, TokenKind},
    value::Value,
};

#[derive(Default)]
pub struct Interpreter {
    env: RefCell<Environment>,
    /// Copy of printed lines, only kept when `capture` is set.
    stdout: RefCell<String>,
    capture: bool,
}

impl Interpreter {
    /// An interpreter that also keeps a copy of everything it prints, to be
    /// returned from `interpret`.
    pub fn capturing() -> Self {
        Interpreter {
            capture: true,
            ..Default::default()
        }
    }

    /// Runs `statements` in order against the global scope. The first
    /// runtime fault is handed to `reporter` and stops the run; output
    /// printed before it is kept. Returns what was printed when capturing,
    /// otherwise an empty string.
    pub fn interpret(&self, statements: &[Stmt], reporter: &mut dyn Reporter) -> String {
        debug!("interpreting {} statements", statements.len());
        if let Err(err) = statements.iter().try_for_each(|stmt| self.execute(stmt)) {
            debug!("aborting run: {:?} on line {}", err.kind, err.line());
            reporter.runtime_error(&err);
        }
        self.stdout.take()
    }

    /// Evaluates a lone expression, as the prompt does to echo its value.
    pub fn evaluate_expression(&self, expr: &Expr) -> RuntimeResult<Value> {
        self.evaluate(expr)
    }

    fn execute(&self, stmt: &Stmt) -> RuntimeResult<()> {
        trace!("executing {:?}", stmt);
        match stmt {
            Stmt::Block(stmts) => self.execute_block(stmts),
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                println!("{}", value);
                if self.capture {
                    let mut stdout = self.stdout.borrow_mut();
                    stdout.push_str(&value.to_string());
                    stdout.push('\n');
                }
                Ok(())
            }
            Stmt::Var(name, initializer) => {
                let value = match initializer {
                    Some(expr) => Some(self.evaluate(expr)?),
                    None => None,
                };
                self.env.borrow_mut().define(&name.lexeme, value);
                Ok(())
            }
            Stmt::If(condition, then_branch, else_branch) => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }
                Ok(())
            }
            Stmt::While(condition, body) => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }
                Ok(())
            }
        }
    }

    fn execute_block(&self, stmts: &[Stmt]) -> RuntimeResult<()> {
        // create a scope that will encapsulate the current one
        let previous = self.env.borrow_mut().enclose();

        // evaluate each statement within the new scope, stopping at the
        // first fault
        let result = stmts.iter().try_for_each(|stmt| self.execute(stmt));

        // restore the outer scope whether or not the block faulted,
        // discarding all of the variables that were defined within it
        self.env.borrow_mut().restore(previous);

        result
    }

    fn evaluate(&self, expr: &Expr) -> RuntimeResult<Value> {
        match expr {
            Expr::Assign(name, value) => {
                let evaluated = self.evaluate(value)?;
                self.env.borrow_mut().assign(name, evaluated.clone())?;
                Ok(evaluated)
            }
            Expr::Binary(left, operator, right) => {
                let left_val = self.evaluate(left)?;
                let right_val = self.evaluate(right)?;
                binary(operator, left_val, right_val)
            }
            Expr::Grouping(expr) => self.evaluate(expr),
            Expr::Literal(literal) => Ok(Value::from(literal)),
            Expr::Logical(left, operator, right) => {
                let left_val = self.evaluate(left)?;
                let short_circuits = match operator.kind {
                    TokenKind::Or => left_val.is_truthy(),
                    _ => !left_val.is_truthy(),
                };
                if short_circuits {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }
            Expr::Ternary(condition, truthy, falsy) => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(truthy)
                } else {
                    self.evaluate(falsy)
                }
            }
            Expr::Variable(name) => self.env.borrow().get(name),
            Expr::Unary(operator, right) => {
                let value = self.evaluate(right)?;
                match operator.kind {
                    TokenKind::Minus => {
                        let number = value.as_number().ok_or_else(|| {
                            RuntimeError::type_mismatch(operator, "Operand must be a number.")
                        })?;
                        Ok(Value::Number(-number))
                    }
                    TokenKind::Bang => Ok(Value::Bool(!value.is_truthy())),
                    _ => unreachable!("parser built a unary {}", operator.kind),
                }
            }
        }
    }
}

fn binary(operator: &Token, left: Value, right: Value) -> RuntimeResult<Value> {
    match operator.kind {
        TokenKind::Plus => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
            (Value::String(a), b @ Value::Number(_)) => Ok(Value::String(format!("{}{}", a, b))),
            (a @ Value::Number(_), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
            _ => Err(RuntimeError::type_mismatch(
                operator,
                "Operands must be two numbers or contain a string.",
            )),
        },
        TokenKind::Spaceship => left.three_way(&right).map(Value::from).ok_or_else(|| {
            RuntimeError::type_mismatch(operator, "Operands must be two numbers or two strings.")
        }),
        TokenKind::EqualEqual => Ok(Value::Bool(left == right)),
        TokenKind::BangEqual => Ok(Value::Bool(left != right)),
        _ => {
            let (a, b) = number_operands(operator, &left, &right)?;
            match operator.kind {
                TokenKind::Minus => Ok(Value::Number(a - b)),
                TokenKind::Star => Ok(Value::Number(a * b)),
                TokenKind::Slash if b == 0.0 => Err(RuntimeError::new(
                    RuntimeErrorKind::DivideByZero,
                    operator,
                    "Attempt to divide by zero.",
                )),
                TokenKind::Slash => Ok(Value::Number(a / b)),
                TokenKind::Greater => Ok(Value::Bool(a > b)),
                TokenKind::GreaterEqual => Ok(Value::Bool(a >= b)),
                TokenKind::Less => Ok(Value::Bool(a < b)),
                TokenKind::LessEqual => Ok(Value::Bool(a <= b)),
                _ => unreachable!("parser built a binary {}", operator.kind),
            }
        }
    }
}

fn number_operands(operator: &Token, left: &Value, right: &Value) -> RuntimeResult<(f64, f64)> {
    match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(RuntimeError::type_mismatch(operator, "Operands must be numbers.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser::Parser, report::Diagnostics, scanner::Scanner};

    /// Runs `source` and returns the printed output along with whatever
    /// runtime fault stopped it.
    fn run(source: &str) -> (String, Option<RuntimeError>) {
        let tokens = Scanner::new(source).scan_tokens().unwrap();
        let mut diagnostics = Diagnostics::default();
        let stmts = Parser::new(tokens, &mut diagnostics).parse();
        assert!(!diagnostics.had_error(), "{:?}", diagnostics.entries());

        let interpreter = Interpreter::capturing();
        let mut fault = None;
        let mut output = String::new();
        for stmt in &stmts {
            if let Err(err) = interpreter.execute(stmt) {
                fault = Some(err);
                break;
            }
        }
        output.push_str(&interpreter.stdout.take());
        (output, fault)
    }

    fn output(source: &str) -> String {
        let (output, fault) = run(source);
        assert_eq!(fault, None);
        output
    }

    fn fault(source: &str) -> RuntimeError {
        run(source).1.expect("expected a runtime fault")
    }

    #[test]
    fn subtraction_is_left_associative() {
        assert_eq!(output("print 1 - 2 - 3;"), "-4\n");
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(output("print 1 + 2 * 3 - 4 / 2;"), "5\n");
        assert_eq!(output("print (1 + 2) * 3;"), "9\n");
        assert_eq!(output("print -(2 * 3);"), "-6\n");
    }

    #[test]
    fn numbers_display_without_trailing_zero_fraction() {
        assert_eq!(output("print 6.0; print 6.5;"), "6\n6.5\n");
    }

    #[test]
    fn plus_concatenates_strings_and_numbers() {
        assert_eq!(
            output(r#"print "a" + "b"; print "n=" + 2; print 1.5 + "x";"#),
            "ab\nn=2\n1.5x\n"
        );
    }

    #[test]
    fn plus_rejects_other_operands() {
        let err = fault("print true + 1;");
        assert_eq!(err.kind, RuntimeErrorKind::TypeMismatch);
        assert_eq!(err.token.kind, TokenKind::Plus);
    }

    #[test]
    fn comparisons_require_numbers() {
        assert_eq!(
            output("print 1 < 2; print 2 <= 2; print 1 > 2; print 3 >= 4;"),
            "true\ntrue\nfalse\nfalse\n"
        );
        let err = fault(r#"print "a" < "b";"#);
        assert_eq!(err.kind, RuntimeErrorKind::TypeMismatch);
        assert_eq!(err.message, "Operands must be numbers.");
    }

    #[test]
    fn negation_requires_a_number() {
        let err = fault(r#"print -"one";"#);
        assert_eq!(err.kind, RuntimeErrorKind::TypeMismatch);
        assert_eq!(err.message, "Operand must be a number.");
    }

    #[test]
    fn bang_uses_truthiness() {
        assert_eq!(
            output(r#"print !nil; print !0; print !""; print !true;"#),
            "true\nfalse\nfalse\nfalse\n"
        );
    }

    #[test]
    fn equality_never_faults() {
        assert_eq!(
            output(
                r#"print nil == nil; print nil == false; print 1 == "1"; print "a" != "b";
                print 2 == 2.0;"#
            ),
            "true\nfalse\nfalse\ntrue\ntrue\n"
        );
    }

    #[test]
    fn spaceship_orders_numbers_and_strings() {
        assert_eq!(
            output(r#"print 1 <=> 2; print 2 <=> 2; print "b" <=> "a";"#),
            "-1\n0\n1\n"
        );
        let err = fault(r#"print 1 <=> "1";"#);
        assert_eq!(err.kind, RuntimeErrorKind::TypeMismatch);
    }

    #[test]
    fn division_by_zero_is_its_own_fault() {
        let err = fault("print 1 / 0;");
        assert_eq!(err.kind, RuntimeErrorKind::DivideByZero);
        assert_eq!(err.message, "Attempt to divide by zero.");
        assert_eq!(fault("print 1 / -0;").kind, RuntimeErrorKind::DivideByZero);
        assert_eq!(output("print 1 / 0.5;"), "2\n");
    }

    #[test]
    fn logical_operators_short_circuit() {
        assert_eq!(output("print false and (1 / 0);"), "false\n");
        assert_eq!(output("print true or (1 / 0);"), "true\n");
        assert_eq!(output(r#"print nil or "fallback"; print 1 and 2;"#), "fallback\n2\n");
    }

    #[test]
    fn ternary_skips_the_unchosen_branch() {
        assert_eq!(output("print true ? 1 : (2 / 0);"), "1\n");
        assert_eq!(output("print nil ? 1 / 0 : 2;"), "2\n");
        assert_eq!(output("print false ? 1 : true ? 2 : 3;"), "2\n");
    }

    #[test]
    fn uninitialized_and_undefined_variables_fault_differently() {
        let err = fault("var x; print x;");
        assert_eq!(err.kind, RuntimeErrorKind::UninitializedVariable);
        let err = fault("print y;");
        assert_eq!(err.kind, RuntimeErrorKind::UndefinedVariable);
        assert_eq!(err.message, "Undefined variable 'y'.");
    }

    #[test]
    fn assigning_initializes_a_declared_variable() {
        assert_eq!(output("var x; x = 3; print x;"), "3\n");
        assert_eq!(output("var x = nil; print x;"), "nil\n");
    }

    #[test]
    fn assignment_is_an_expression() {
        assert_eq!(output("var a; var b; a = b = 2; print a + b; print a = 5;"), "4\n5\n");
    }

    #[test]
    fn assignment_to_undeclared_variable_faults() {
        assert_eq!(fault("z = 1;").kind, RuntimeErrorKind::UndefinedVariable);
    }

    #[test]
    fn blocks_assign_through_to_enclosing_scope() {
        assert_eq!(output("var x = 1; { x = 2; } print x;"), "2\n");
    }

    #[test]
    fn blocks_shadow_and_discard_their_bindings() {
        assert_eq!(
            output("var x = 1; { var x = 2; print x; } print x;"),
            "2\n1\n"
        );
        assert_eq!(
            fault("{ var inner = 1; } print inner;").kind,
            RuntimeErrorKind::UndefinedVariable
        );
    }

    #[test]
    fn scope_is_restored_after_a_fault_in_a_block() {
        let tokens = Scanner::new("var x = \"outer\"; { var x = \"inner\"; print 1 / 0; }")
            .scan_tokens()
            .unwrap();
        let mut diagnostics = Diagnostics::default();
        let stmts = Parser::new(tokens, &mut diagnostics).parse();

        let interpreter = Interpreter::capturing();
        interpreter.interpret(&stmts, &mut diagnostics);
        assert!(diagnostics.had_runtime_error());
        assert_eq!(interpreter.env.borrow().depth(), 0);

        let name = Token::simple(TokenKind::Identifier("x".into()), 1);
        assert_eq!(
            interpreter.env.borrow().get(&name),
            Ok(Value::String("outer".into()))
        );
    }

    #[test]
    fn if_and_while() {
        assert_eq!(
            output(
                "var i = 0; while (i < 3) { if (i == 1) print \"one\"; else print i; i = i + 1; }"
            ),
            "0\none\n2\n"
        );
        assert_eq!(output("if (nil) print 1;"), "");
    }

    #[test]
    fn printed_output_is_not_retained_unless_capturing() {
        let tokens = Scanner::new("var i = 0; while (i < 1000) { print \"line\"; i = i + 1; }")
            .scan_tokens()
            .unwrap();
        let mut diagnostics = Diagnostics::default();
        let stmts = Parser::new(tokens, &mut diagnostics).parse();

        let interpreter = Interpreter::default();
        assert_eq!(interpreter.interpret(&stmts, &mut diagnostics), "");
        assert!(!diagnostics.had_runtime_error());
        assert_eq!(interpreter.stdout.borrow().capacity(), 0);
    }

    #[test]
    fn interpret_stops_at_first_fault_and_keeps_prior_output() {
        let tokens = Scanner::new("print 1; print nope; print 2;").scan_tokens().unwrap();
        let mut diagnostics = Diagnostics::default();
        let stmts = Parser::new(tokens, &mut diagnostics).parse();

        let stdout = Interpreter::capturing().interpret(&stmts, &mut diagnostics);
        assert_eq!(stdout, "1\n");
        assert_eq!(diagnostics.entries().len(), 1);
        assert_eq!(
            diagnostics.entries()[0].to_string(),
            "Undefined variable 'nope'.\n[line 1]"
        );
    }
}
