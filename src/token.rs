use std::fmt::{Display, Formatter, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: u32,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: u32) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            line,
        }
    }

    /// Placeholder used before the parser has pulled its first token.
    pub fn dummy() -> Self {
        Token::new(TokenKind::Eof, "", 0)
    }

    /// Shorthand for tokens whose lexeme is fully determined by their kind.
    #[cfg(test)]
    pub fn simple(kind: TokenKind, line: u32) -> Self {
        let lexeme = match &kind {
            TokenKind::Eof => String::new(),
            TokenKind::Identifier(name) => name.clone(),
            TokenKind::String(value) => format!("\"{}\"", value),
            TokenKind::Number(value) => value.to_string(),
            other => other.to_string(),
        };
        Token::new(kind, lexeme, line)
    }

    pub fn is_equality(&self) -> bool {
        matches!(self.kind, TokenKind::BangEqual | TokenKind::EqualEqual)
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Greater
                | TokenKind::GreaterEqual
                | TokenKind::Less
                | TokenKind::LessEqual
                | TokenKind::Spaceship
        )
    }

    pub fn is_term(&self) -> bool {
        matches!(self.kind, TokenKind::Minus | TokenKind::Plus)
    }

    pub fn is_factor(&self) -> bool {
        matches!(self.kind, TokenKind::Slash | TokenKind::Star)
    }

    pub fn is_unary(&self) -> bool {
        matches!(self.kind, TokenKind::Bang | TokenKind::Minus)
    }

    /// Tokens that can only appear at the start of a declaration or statement.
    pub fn starts_statement(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Single-character tokens
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,
    Question,
    Colon,

    // One, two or three character tokens
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Spaceship,

    // Literals
    Identifier(String),
    String(String),
    Number(f64),

    // Keywords
    And,
    Class,
    Else,
    False,
    Fun,
    For,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,

    Eof,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            // Single-character tokens
            TokenKind::LeftParen => write!(f, "("),
            TokenKind::RightParen => write!(f, ")"),
            TokenKind::LeftBrace => write!(f, "{{"),
            TokenKind::RightBrace => write!(f, "}}"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Question => write!(f, "?"),
            TokenKind::Colon => write!(f, ":"),

            // One, two or three character tokens
            TokenKind::Bang => write!(f, "!"),
            TokenKind::BangEqual => write!(f, "!="),
            TokenKind::Equal => write!(f, "="),
            TokenKind::EqualEqual => write!(f, "=="),
            TokenKind::Greater => write!(f, ">"),
            TokenKind::GreaterEqual => write!(f, ">="),
            TokenKind::Less => write!(f, "<"),
            TokenKind::LessEqual => write!(f, "<="),
            TokenKind::Spaceship => write!(f, "<=>"),

            // Literals
            TokenKind::Identifier(name) => write!(f, "<IDENTIFIER {}>", name),
            TokenKind::String(value) => write!(f, "<STRING \"{}\">", value),
            TokenKind::Number(value) => write!(f, "<NUMBER {}>", value),

            // Keywords
            TokenKind::And => write!(f, "and"),
            TokenKind::Class => write!(f, "class"),
            TokenKind::Else => write!(f, "else"),
            TokenKind::False => write!(f, "false"),
            TokenKind::Fun => write!(f, "fun"),
            TokenKind::For => write!(f, "for"),
            TokenKind::If => write!(f, "if"),
            TokenKind::Nil => write!(f, "nil"),
            TokenKind::Or => write!(f, "or"),
            TokenKind::Print => write!(f, "print"),
            TokenKind::Return => write!(f, "return"),
            TokenKind::Super => write!(f, "super"),
            TokenKind::This => write!(f, "this"),
            TokenKind::True => write!(f, "true"),
            TokenKind::Var => write!(f, "var"),
            TokenKind::While => write!(f, "while"),

            TokenKind::Eof => write!(f, "<EOF>"),
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{:>4} {} '{}'", self.line, self.kind, self.lexeme)
    }
}
