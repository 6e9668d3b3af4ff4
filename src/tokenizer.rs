use std::fmt::Display;

use log::debug;

use crate::span::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenType {
    // Single-character tokens
    LeftParen,
    RightParen,
    Comma,
    Dot,
    Minus,
    Plus,
    Slash,
    Star,
    Equal,
    Cross,

    // Literals
    Identifier(String),
    Constant(String),

    // End of input
    End,
}

impl Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenType::LeftParen => write!(f, "("),
            TokenType::RightParen => write!(f, ")"),
            TokenType::Comma => write!(f, ","),
            TokenType::Dot => write!(f, "."),
            TokenType::Minus => write!(f, "-"),
            TokenType::Plus => write!(f, "+"),
            TokenType::Slash => write!(f, "/"),
            TokenType::Star => write!(f, "*"),
            TokenType::Equal => write!(f, "="),
            TokenType::Cross => write!(f, "X"),
            TokenType::Identifier(name) => write!(f, "{}", name),
            TokenType::Constant(text) => write!(f, "{}", text),
            TokenType::End => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub token_type: TokenType,
    pub span: Span,
}

impl Token {
    pub fn new(token_type: TokenType, span: Span) -> Self {
        Self { token_type, span }
    }

    pub fn token_type(&self) -> &TokenType {
        &self.token_type
    }

    /// Source text of the token, or `end of input` for the end marker.
    pub fn lexeme(&self) -> String {
        self.token_type.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenizeError {
    #[error("Unexpected character '{character}' at column {column}")]
    UnexpectedCharacter { character: char, column: usize },
}

/// Lazily scans one input line. Yields exactly one `End` token and then stops.
///
/// Characters that start no token are skipped and remembered in `errors`.
pub struct Tokenizer<'a> {
    source: &'a str,
    remaining: &'a str,
    errors: Vec<TokenizeError>,
    finished: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            remaining: source,
            errors: Vec::new(),
            finished: false,
        }
    }

    pub fn errors(&self) -> &[TokenizeError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<TokenizeError> {
        self.errors
    }

    fn offset(&self) -> usize {
        self.source.len() - self.remaining.len()
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }

        loop {
            if let Some((_, rest)) = whitespace(self.remaining) {
                self.remaining = rest;
            }

            let start = self.offset();
            if self.remaining.is_empty() {
                self.finished = true;
                return Some(Token::new(TokenType::End, Span::new(start, start)));
            }

            match token(self.remaining) {
                Some((token_type, rest)) => {
                    self.remaining = rest;
                    return Some(Token::new(token_type, Span::new(start, self.offset())));
                }
                None => {
                    let character = self.remaining.chars().next()?;
                    let error = TokenizeError::UnexpectedCharacter {
                        character,
                        column: start + 1,
                    };
                    debug!("Skipping: {}", error);
                    self.errors.push(error);
                    self.remaining = &self.remaining[character.len_utf8()..];
                }
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct Tokenized {
    pub tokens: Vec<Token>,
    pub errors: Vec<TokenizeError>,
}

pub fn tokens(source: &str) -> Tokenized {
    let mut tokenizer = Tokenizer::new(source);
    let tokens = tokenizer.by_ref().collect();
    Tokenized {
        tokens,
        errors: tokenizer.into_errors(),
    }
}

fn token(source: &str) -> Option<(TokenType, &str)> {
    maximal(
        &[
            left_paren,
            right_paren,
            comma,
            dot,
            minus,
            plus,
            slash,
            star,
            equal,
            // must beat a one-letter identifier
            cross,
            identifier,
            constant,
        ],
        source,
    )
}

fn maximal<'a, T: std::fmt::Debug>(
    parsers: &[fn(&str) -> Option<(T, &str)>],
    source: &'a str,
) -> Option<(T, &'a str)> {
    let mut min_left = source.len() + 1;
    let mut max_match = None;

    let matching_parsers = parsers.iter().filter_map(|parser| parser(source));
    for (m, rest) in matching_parsers {
        let left = rest.len();
        if left < min_left {
            min_left = left;
            max_match = Some((m, rest));
        }
    }

    max_match
}

fn whitespace(source: &str) -> Option<((), &str)> {
    let len = source
        .chars()
        .take_while(|c| c.is_whitespace())
        .map(char::len_utf8)
        .sum::<usize>();
    if len > 0 {
        Some(((), &source[len..]))
    } else {
        None
    }
}

macro_rules! match_literal {
    ($name:ident, $word:literal, $token:expr) => {
        fn $name(source: &str) -> Option<(TokenType, &str)> {
            if source.starts_with($word) {
                Some(($token, &source[$word.len()..]))
            } else {
                None
            }
        }
    };
}

match_literal! { left_paren, "(", TokenType::LeftParen }
match_literal! { right_paren, ")", TokenType::RightParen }
match_literal! { comma, ",", TokenType::Comma }
match_literal! { dot, ".", TokenType::Dot }
match_literal! { minus, "-", TokenType::Minus }
match_literal! { plus, "+", TokenType::Plus }
match_literal! { slash, "/", TokenType::Slash }
match_literal! { star, "*", TokenType::Star }
match_literal! { equal, "=", TokenType::Equal }
match_literal! { cross, "X", TokenType::Cross }

fn identifier(source: &str) -> Option<(TokenType, &str)> {
    let mut chars = source.chars();

    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }

    let len = first.len_utf8()
        + chars
            .take_while(|c| c.is_ascii_alphanumeric())
            .map(char::len_utf8)
            .sum::<usize>();

    Some((
        TokenType::Identifier(source[..len].to_string()),
        &source[len..],
    ))
}

// Shape is not validated here: "1.2.3" is one constant.
fn constant(source: &str) -> Option<(TokenType, &str)> {
    let mut chars = source.chars();

    let first = chars.next()?;
    if !first.is_ascii_digit() {
        return None;
    }

    let len = first.len_utf8()
        + chars
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .map(char::len_utf8)
            .sum::<usize>();

    Some((
        TokenType::Constant(source[..len].to_string()),
        &source[len..],
    ))
}
