use std::vec::IntoIter;

use log::debug;

use crate::{
    expr::{Expr, Literal},
    report::Reporter,
    stmt::Stmt,
    token::{Token, TokenKind},
};

/// Marker for a fault that has already been handed to the reporter. It only
/// unwinds the parser back to the enclosing declaration.
#[derive(Debug)]
struct ParseError;

type Result<T> = std::result::Result<T, ParseError>;

pub struct Parser<'r> {
    tokens: IntoIter<Token>,
    token: Token,
    prev_token: Token,
    reporter: &'r mut dyn Reporter,
}

impl<'r> Parser<'r> {
    pub fn new(tokens: Vec<Token>, reporter: &'r mut dyn Reporter) -> Self {
        let mut tokens = tokens.into_iter();
        let token = tokens
            .next()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, "", 1));
        Parser {
            tokens,
            token,
            prev_token: Token::dummy(),
            reporter,
        }
    }

    /// Parses the whole program. Malformed declarations are reported and
    /// skipped, so the returned statements are only meaningful to run when
    /// the reporter saw no errors.
    pub fn parse(&mut self) -> Vec<Stmt> {
        let mut statements = vec![];
        while !self.is_at_end() {
            if let Some(stmt) = self.parse_declaration() {
                statements.push(stmt);
            }
        }
        statements
    }

    fn parse_declaration(&mut self) -> Option<Stmt> {
        let result = if self.eat(&TokenKind::Var) {
            self.parse_var_declaration()
        } else {
            self.parse_statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(ParseError) => {
                self.synchronize();
                None
            }
        }
    }

    fn parse_statement(&mut self) -> Result<Stmt> {
        if self.eat(&TokenKind::If) {
            self.parse_if_statement()
        } else if self.eat(&TokenKind::While) {
            self.parse_while_statement()
        } else if self.eat(&TokenKind::Print) {
            self.parse_print_statement()
        } else if self.eat(&TokenKind::LeftBrace) {
            Ok(Stmt::Block(self.parse_block()?))
        } else {
            self.parse_expression_statement()
        }
    }

    fn parse_if_statement(&mut self) -> Result<Stmt> {
        self.expect(&TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.parse_expression()?;
        self.expect(&TokenKind::RightParen, "Expect ')' after if condition.")?;

        let then_branch = self.parse_statement()?;
        let else_branch = if self.eat(&TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Stmt::If(condition, then_branch.into(), else_branch))
    }

    fn parse_while_statement(&mut self) -> Result<Stmt> {
        self.expect(&TokenKind::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.parse_expression()?;
        self.expect(&TokenKind::RightParen, "Expect ')' after condition.")?;
        let body = self.parse_statement()?;
        Ok(Stmt::While(condition, body.into()))
    }

    fn parse_print_statement(&mut self) -> Result<Stmt> {
        let value = self.parse_expression()?;
        self.expect(&TokenKind::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print(value))
    }

    fn parse_expression_statement(&mut self) -> Result<Stmt> {
        let expr = self.parse_expression()?;
        self.expect(&TokenKind::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements = vec![];
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.parse_declaration() {
                statements.push(stmt);
            }
        }
        self.expect(&TokenKind::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn parse_var_declaration(&mut self) -> Result<Stmt> {
        let name = self.expect_identifier("Expect variable name.")?;
        let initializer = if self.eat(&TokenKind::Equal) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(
            &TokenKind::Semicolon,
            "Expect ';' after variable declaration.",
        )?;
        Ok(Stmt::Var(name, initializer))
    }

    fn parse_expression(&mut self) -> Result<Expr> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr> {
        let expr = self.parse_or()?;
        if self.eat(&TokenKind::Equal) {
            let equals = self.prev_token.clone();
            let value = self.parse_assignment()?;
            return match expr {
                Expr::Variable(name) => Ok(Expr::Assign(name, Box::new(value))),
                // reported, but the parser is still in a sane state so
                // there is nothing to synchronize
                _ => {
                    self.error(&equals, "Invalid assignment target.");
                    Ok(expr)
                }
            };
        }
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut expr = self.parse_and()?;
        while self.eat(&TokenKind::Or) {
            let operator = self.prev_token.clone();
            let right = self.parse_and()?;
            expr = Expr::Logical(Box::new(expr), operator, Box::new(right))
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut expr = self.parse_ternary()?;
        while self.eat(&TokenKind::And) {
            let operator = self.prev_token.clone();
            let right = self.parse_ternary()?;
            expr = Expr::Logical(Box::new(expr), operator, Box::new(right))
        }
        Ok(expr)
    }

    fn parse_ternary(&mut self) -> Result<Expr> {
        let condition = self.parse_equality()?;
        if !self.eat(&TokenKind::Question) {
            return Ok(condition);
        }
        let truthy = self.parse_expression()?;
        self.expect(
            &TokenKind::Colon,
            "Expect ':' after then branch of conditional expression.",
        )?;
        let falsy = self.parse_expression()?;
        Ok(Expr::Ternary(
            Box::new(condition),
            Box::new(truthy),
            Box::new(falsy),
        ))
    }

    fn parse_equality(&mut self) -> Result<Expr> {
        let mut expr = self.parse_comparison()?;
        while self.token.is_equality() {
            let operator = self.bump();
            let right = self.parse_comparison()?;
            expr = Expr::Binary(Box::new(expr), operator, Box::new(right))
        }
        Ok(expr)
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let mut expr = self.parse_term()?;
        while self.token.is_comparison() {
            let operator = self.bump();
            let right = self.parse_term()?;
            expr = Expr::Binary(Box::new(expr), operator, Box::new(right))
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mut expr = self.parse_factor()?;
        while self.token.is_term() {
            let operator = self.bump();
            let right = self.parse_factor()?;
            expr = Expr::Binary(Box::new(expr), operator, Box::new(right))
        }
        Ok(expr)
    }

    fn parse_factor(&mut self) -> Result<Expr> {
        let mut expr = self.parse_unary()?;
        while self.token.is_factor() {
            let operator = self.bump();
            let right = self.parse_unary()?;
            expr = Expr::Binary(Box::new(expr), operator, Box::new(right))
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if self.token.is_unary() {
            let operator = self.bump();
            let right = self.parse_unary()?;
            Ok(Expr::Unary(operator, Box::new(right)))
        } else {
            self.parse_primary()
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let expr = match &self.token.kind {
            TokenKind::False => Expr::Literal(Literal::Bool(false)),
            TokenKind::True => Expr::Literal(Literal::Bool(true)),
            TokenKind::Nil => Expr::Literal(Literal::Nil),
            TokenKind::Number(value) => Expr::Literal(Literal::Number(*value)),
            TokenKind::String(value) => Expr::Literal(Literal::String(value.clone())),
            TokenKind::Identifier(_) => Expr::Variable(self.token.clone()),
            TokenKind::LeftParen => {
                self.bump();
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RightParen, "Expect ')' after expression.")?;
                return Ok(Expr::Grouping(Box::new(expr)));
            }
            _ => {
                let token = self.token.clone();
                return Err(self.error(&token, "Expect expression."));
            }
        };
        self.bump();
        Ok(expr)
    }

    /// Discards tokens until the start of the next statement: just past a
    /// `;`, or right before a keyword that begins a declaration or statement.
    fn synchronize(&mut self) {
        debug!("synchronizing after parse error on line {}", self.token.line);
        self.bump();
        while !self.is_at_end() {
            if self.prev_token.kind == TokenKind::Semicolon || self.token.starts_statement() {
                return;
            }
            self.bump();
        }
    }

    /// Hands the fault to the reporter and returns the marker that unwinds
    /// to the enclosing declaration.
    fn error(&mut self, token: &Token, message: &str) -> ParseError {
        self.reporter.error(token, message);
        ParseError
    }

    /// Expects and consumes the token `kind`. Signals an error if the next
    /// token is not `kind`.
    fn expect(&mut self, kind: &TokenKind, message: &str) -> Result<Token> {
        if self.check(kind) {
            Ok(self.bump())
        } else {
            let token = self.token.clone();
            Err(self.error(&token, message))
        }
    }

    /// Expects and consumes an identifier token, and signals an error
    /// otherwise.
    fn expect_identifier(&mut self, message: &str) -> Result<Token> {
        if matches!(self.token.kind, TokenKind::Identifier(_)) {
            Ok(self.bump())
        } else {
            let token = self.token.clone();
            Err(self.error(&token, message))
        }
    }

    /// Consumes one token and returns it. The end-of-input token is never
    /// consumed.
    fn bump(&mut self) -> Token {
        if !self.is_at_end() {
            let line = self.token.line;
            let next = self
                .tokens
                .next()
                .unwrap_or_else(|| Token::new(TokenKind::Eof, "", line));
            self.prev_token = std::mem::replace(&mut self.token, next);
        }
        self.prev_token.clone()
    }

    fn is_at_end(&self) -> bool {
        self.token.kind == TokenKind::Eof
    }

    /// Checks if the next token is `kind`, and returns `true` if so.
    fn check(&self, kind: &TokenKind) -> bool {
        self.token.kind == *kind
    }

    /// Consumes the token `kind` if it exists. Returns whether the given token
    /// was present.
    fn eat(&mut self, kind: &TokenKind) -> bool {
        let is_present = self.check(kind);
        if is_present {
            self.bump();
        }
        is_present
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{report::Diagnostics, scanner::Scanner};

    fn parse_source(source: &str) -> (Vec<Stmt>, Diagnostics) {
        let tokens = Scanner::new(source).scan_tokens().unwrap();
        let mut diagnostics = Diagnostics::default();
        let stmts = Parser::new(tokens, &mut diagnostics).parse();
        (stmts, diagnostics)
    }

    fn parse_expr(source: &str) -> Expr {
        let (mut stmts, diagnostics) = parse_source(&format!("{};", source));
        assert!(!diagnostics.had_error(), "{:?}", diagnostics.entries());
        match stmts.remove(0) {
            Stmt::Expression(expr) => expr,
            other => panic!("expected an expression statement, got {:?}", other),
        }
    }

    fn messages(diagnostics: &Diagnostics) -> Vec<String> {
        diagnostics.entries().iter().map(|d| d.to_string()).collect()
    }

    fn number(value: f64) -> Box<Expr> {
        Box::new(Expr::Literal(Literal::Number(value)))
    }

    #[test]
    fn parse_print_stmt() {
        let tokens = vec![
            Token::simple(TokenKind::Print, 1),
            Token::simple(TokenKind::String("one".into()), 1),
            Token::simple(TokenKind::Semicolon, 1),
            Token::simple(TokenKind::Eof, 2),
        ];
        let mut diagnostics = Diagnostics::default();
        let result = Parser::new(tokens, &mut diagnostics).parse();
        let expected = vec![Stmt::Print(Expr::Literal(Literal::String("one".into())))];
        assert_eq!(result, expected);
        assert!(diagnostics.entries().is_empty());
    }

    #[test]
    fn empty_token_stream_parses_to_nothing() {
        let mut diagnostics = Diagnostics::default();
        assert!(Parser::new(vec![], &mut diagnostics).parse().is_empty());
        assert!(!diagnostics.had_error());
    }

    #[test]
    fn statement_count_matches_top_level_declarations() {
        let (stmts, diagnostics) = parse_source(
            "var a = 1; var b; print a; { a = 2; print a; }
             if (a) print 1; else print 2; while (false) a;",
        );
        assert!(!diagnostics.had_error());
        assert_eq!(stmts.len(), 6);
        assert!(matches!(&stmts[3], Stmt::Block(inner) if inner.len() == 2));
        assert!(matches!(&stmts[4], Stmt::If(_, _, Some(_))));
        assert!(matches!(&stmts[5], Stmt::While(_, _)));
    }

    #[test]
    fn binary_operators_are_left_associative() {
        let Expr::Binary(left, operator, right) = parse_expr("1 - 2 - 3") else {
            panic!("expected a binary expression");
        };
        assert_eq!(operator.kind, TokenKind::Minus);
        assert_eq!(right, number(3.0));
        assert!(matches!(*left, Expr::Binary(_, _, ref inner) if *inner == number(2.0)));
    }

    #[test]
    fn factor_binds_tighter_than_term() {
        let Expr::Binary(left, operator, right) = parse_expr("1 + 2 * 3") else {
            panic!("expected a binary expression");
        };
        assert_eq!(operator.kind, TokenKind::Plus);
        assert_eq!(left, number(1.0));
        assert!(matches!(*right, Expr::Binary(_, ref op, _) if op.kind == TokenKind::Star));
    }

    #[test]
    fn assignment_is_right_associative() {
        let Expr::Assign(a, value) = parse_expr("a = b = 3") else {
            panic!("expected an assignment");
        };
        assert_eq!(a.lexeme, "a");
        assert!(matches!(*value, Expr::Assign(ref b, _) if b.lexeme == "b"));
    }

    #[test]
    fn ternary_binds_looser_than_equality_and_tighter_than_and() {
        let Expr::Logical(_, operator, right) = parse_expr("c and a == 1 ? 2 : 3") else {
            panic!("expected a logical expression");
        };
        assert_eq!(operator.kind, TokenKind::And);
        let Expr::Ternary(condition, _, _) = *right else {
            panic!("expected a ternary on the right of 'and'");
        };
        assert!(matches!(
            *condition,
            Expr::Binary(_, ref op, _) if op.kind == TokenKind::EqualEqual
        ));
    }

    #[test]
    fn ternary_branches_nest_without_parentheses() {
        let Expr::Ternary(_, truthy, falsy) = parse_expr("a ? b ? 1 : 2 : c ? 3 : 4") else {
            panic!("expected a ternary");
        };
        assert!(matches!(*truthy, Expr::Ternary(..)));
        assert!(matches!(*falsy, Expr::Ternary(..)));
    }

    #[test]
    fn spaceship_is_a_comparison() {
        let Expr::Binary(_, operator, _) = parse_expr("1 <=> 2") else {
            panic!("expected a binary expression");
        };
        assert_eq!(operator.kind, TokenKind::Spaceship);
    }

    #[test]
    fn invalid_assignment_target_is_reported_but_not_fatal() {
        let (stmts, diagnostics) = parse_source("1 + a = 3; print 4;");
        assert_eq!(
            messages(&diagnostics),
            ["[line 1] Error at '=': Invalid assignment target."]
        );
        assert_eq!(stmts.len(), 2);
        assert!(matches!(&stmts[0], Stmt::Expression(Expr::Binary(..))));
    }

    #[test]
    fn recovers_after_malformed_statements() {
        let (stmts, diagnostics) = parse_source("print ;\nvar = 2;\nprint 3;\nprint (4;");
        assert_eq!(
            messages(&diagnostics),
            [
                "[line 1] Error at ';': Expect expression.",
                "[line 2] Error at '=': Expect variable name.",
                "[line 4] Error at ';': Expect ')' after expression.",
            ]
        );
        assert_eq!(stmts, vec![Stmt::Print(Expr::Literal(Literal::Number(3.0)))]);
    }

    #[test]
    fn synchronizes_before_statement_keywords() {
        let (stmts, diagnostics) = parse_source("print 1 + ) if (true) print 2;");
        assert_eq!(
            messages(&diagnostics),
            ["[line 1] Error at ')': Expect expression."]
        );
        assert_eq!(stmts.len(), 1);
        assert!(matches!(&stmts[0], Stmt::If(..)));
    }

    #[test]
    fn missing_colon_in_ternary() {
        let (_, diagnostics) = parse_source("print true ? 1;");
        assert_eq!(
            messages(&diagnostics),
            ["[line 1] Error at ';': Expect ':' after then branch of conditional expression."]
        );
    }

    #[test]
    fn unterminated_block_reports_at_end() {
        let (_, diagnostics) = parse_source("{ print 1;");
        assert_eq!(
            messages(&diagnostics),
            ["[line 1] Error at end: Expect '}' after block."]
        );
    }
}
