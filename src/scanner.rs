use std::str::CharIndices;

use anyhow::Result;
use anyhow::{anyhow, Context};
use itertools::{Itertools, MultiPeek};

use crate::token::{Token, TokenKind};

type CharIter<'a> = MultiPeek<CharIndices<'a>>;

pub struct Scanner<'a> {
    source: &'a str,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Scanner { source }
    }

    pub fn scan_tokens(&self) -> Result<Vec<Token>> {
        let mut iter = self.source.char_indices().multipeek();
        let mut tokens: Vec<Token> = vec![];
        let mut line: u32 = 1;

        while let Some(token) = self.scan_token(&mut iter, &mut line)? {
            tokens.push(token);
        }

        tokens.push(Token::new(TokenKind::Eof, "", line));

        Ok(tokens)
    }

    fn scan_token(&self, iter: &mut CharIter, line: &mut u32) -> Result<Option<Token>> {
        loop {
            iter.reset_peek(); // reset the "peek" cursor

            let (start, char) = match iter.next() {
                Some(pair) => pair,
                // No more tokens left.
                None => return Ok(None),
            };

            // in most cases we want to break and return, but if we encounter
            // whitespace or a comment, we continue the loop instead
            let kind = match char {
                '(' => TokenKind::LeftParen,
                ')' => TokenKind::RightParen,
                '{' => TokenKind::LeftBrace,
                '}' => TokenKind::RightBrace,
                ',' => TokenKind::Comma,
                '.' => TokenKind::Dot,
                '-' => TokenKind::Minus,
                '+' => TokenKind::Plus,
                ';' => TokenKind::Semicolon,
                '*' => TokenKind::Star,
                '?' => TokenKind::Question,
                ':' => TokenKind::Colon,
                '!' => self.one_or_two(iter, TokenKind::Bang, TokenKind::BangEqual),
                '=' => self.one_or_two(iter, TokenKind::Equal, TokenKind::EqualEqual),
                '>' => self.one_or_two(iter, TokenKind::Greater, TokenKind::GreaterEqual),
                '<' => self.scan_less(iter),
                '/' => {
                    if self.peek_match(iter, |ch| ch == '/') {
                        iter.next();
                        // A comment goes until the end of the line
                        self.read_to_end_of_line(iter);
                        continue;
                    }
                    TokenKind::Slash
                }
                '"' => self.scan_string(iter, line)?,
                ' ' | '\r' | '\t' => continue,
                '\n' => {
                    *line += 1;
                    continue;
                }
                char if char.is_ascii_digit() => self.scan_number(iter, start, *line)?,
                char if char.is_ascii_alphabetic() || char == '_' => {
                    self.scan_identifier(iter, start)
                }
                char => return Err(anyhow!("unexpected character {:?} on line {}", char, line)),
            };

            let end = self.offset(iter);
            return Ok(Some(Token::new(kind, &self.source[start..end], *line)));
        }
    }

    /// Byte offset of the next unconsumed character.
    fn offset(&self, iter: &mut CharIter) -> usize {
        iter.reset_peek();
        let offset = iter.peek().map_or(self.source.len(), |(idx, _)| *idx);
        iter.reset_peek();
        offset
    }

    fn one_or_two(
        &self,
        iter: &mut CharIter,
        single: TokenKind,
        with_equal: TokenKind,
    ) -> TokenKind {
        if self.peek_match(iter, |ch| ch == '=') {
            iter.next();
            with_equal
        } else {
            single
        }
    }

    fn scan_less(&self, iter: &mut CharIter) -> TokenKind {
        iter.reset_peek();
        if !matches!(iter.peek(), Some((_, '='))) {
            return TokenKind::Less;
        }
        if matches!(iter.peek(), Some((_, '>'))) {
            iter.next();
            iter.next();
            TokenKind::Spaceship
        } else {
            iter.next();
            TokenKind::LessEqual
        }
    }

    /// Returns true if there is another character to peek which matches the
    /// predicate, otherwise it returns false.
    fn peek_match<F>(&self, iter: &mut CharIter, pred: F) -> bool
    where
        F: FnOnce(char) -> bool,
    {
        iter.reset_peek();
        let matched = iter.peek().map_or(false, |pair| pred(pair.1));
        iter.reset_peek();
        matched
    }

    fn read_to_end_of_line(&self, iter: &mut CharIter) {
        while self.peek_match(iter, |ch| ch != '\n') {
            iter.next();
        }
    }

    fn scan_string(&self, iter: &mut CharIter, line: &mut u32) -> Result<TokenKind> {
        let opening_line = *line;
        let mut value = String::new();
        while self.peek_match(iter, |ch| ch != '"') {
            if let Some((_, char)) = iter.next() {
                if char == '\n' {
                    *line += 1;
                }
                value.push(char);
            }
        }

        // next character is the closing quote
        match iter.next() {
            Some(_) => Ok(TokenKind::String(value)),
            None => Err(anyhow!(
                "unterminated string literal starting on line {}",
                opening_line
            )),
        }
    }

    fn scan_number(&self, iter: &mut CharIter, start: usize, line: u32) -> Result<TokenKind> {
        while self.peek_match(iter, |ch| ch.is_ascii_digit()) {
            iter.next();
        }

        // Look for a fractional part
        iter.reset_peek();
        if matches!(iter.peek(), Some((_, '.'))) && matches!(iter.peek(), Some((_, '0'..='9'))) {
            // consume the "."
            iter.next();
            while self.peek_match(iter, |ch| ch.is_ascii_digit()) {
                iter.next();
            }
        }

        let end = self.offset(iter);
        let value: f64 = self.source[start..end]
            .parse()
            .with_context(|| format!("unable to parse number on line {}", line))?;
        Ok(TokenKind::Number(value))
    }

    fn scan_identifier(&self, iter: &mut CharIter, start: usize) -> TokenKind {
        while self.peek_match(iter, |ch| ch.is_alphanumeric() || ch == '_') {
            iter.next();
        }

        let end = self.offset(iter);
        match &self.source[start..end] {
            "and" => TokenKind::And,
            "class" => TokenKind::Class,
            "else" => TokenKind::Else,
            "false" => TokenKind::False,
            "for" => TokenKind::For,
            "fun" => TokenKind::Fun,
            "if" => TokenKind::If,
            "nil" => TokenKind::Nil,
            "or" => TokenKind::Or,
            "print" => TokenKind::Print,
            "return" => TokenKind::Return,
            "super" => TokenKind::Super,
            "this" => TokenKind::This,
            "true" => TokenKind::True,
            "var" => TokenKind::Var,
            "while" => TokenKind::While,
            name => TokenKind::Identifier(name.to_owned()),
        }
    }
}
