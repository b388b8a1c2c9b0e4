use std::{
    fmt,
    io::{self, Read},
};

use lazy_static::lazy_static;
use regex::Regex;

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Eof,
    Def,
    Extern,
    Identifier(String),
    Number(f64),
    /// any other single character, returned verbatim
    Char(char),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Eof => write!(f, "end of input"),
            Token::Def => write!(f, "'def'"),
            Token::Extern => write!(f, "'extern'"),
            Token::Identifier(ident) => write!(f, "identifier '{}'", ident),
            Token::Number(num) => write!(f, "number {}", num),
            Token::Char(c) => write!(f, "'{}'", c),
        }
    }
}

lazy_static! {
    // the prefix strtod would accept out of a digits-and-dots run
    static ref NUMBER_PREFIX_RE: Regex = Regex::new(r"^\d+(\.\d*)?").unwrap();
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

fn parse_number(text: &str) -> f64 {
    let prefix = NUMBER_PREFIX_RE
        .find(text)
        .map(|m| m.as_str())
        .unwrap_or("0");
    if prefix.len() != text.len() {
        log::debug!(
            "numeric literal {:?} has trailing {:?}, using {:?}",
            text,
            &text[prefix.len()..],
            prefix
        );
    }
    prefix.parse().unwrap_or(0.0)
}

/// Pulls characters on demand and groups them into tokens.
///
/// Input is read one byte per character. The only state carried between
/// calls is the character that terminated the previous token, which has not
/// been classified yet.
pub struct Lexer<R: Read> {
    bytes: io::Bytes<R>,
    last_char: Option<char>,
}

impl<R: Read> Lexer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            bytes: reader.bytes(),
            last_char: Some(' '),
        }
    }

    /// A read error ends the input.
    fn advance(&mut self) {
        self.last_char = match self.bytes.next() {
            Some(Ok(b)) => Some(char::from(b)),
            Some(Err(err)) => {
                log::warn!("stopped reading input: {}", err);
                None
            }
            None => None,
        };
    }

    pub fn next_token(&mut self) -> Token {
        let token = self.lex_token();
        log::trace!("lexed {}", token);
        token
    }

    fn lex_token(&mut self) -> Token {
        loop {
            while let Some(c) = self.last_char {
                if !is_whitespace(c) {
                    break;
                }
                self.advance();
            }

            if self.last_char != Some('#') {
                break;
            }
            while let Some(c) = self.last_char {
                if c == '\n' || c == '\r' {
                    break;
                }
                self.advance();
            }
        }

        let c = match self.last_char {
            Some(c) => c,
            None => return Token::Eof,
        };

        if c.is_ascii_alphabetic() {
            let mut ident = String::new();
            while let Some(c) = self.last_char.filter(char::is_ascii_alphanumeric) {
                ident.push(c);
                self.advance();
            }
            return match ident.as_str() {
                "def" => Token::Def,
                "extern" => Token::Extern,
                _ => Token::Identifier(ident),
            };
        }

        if c.is_ascii_digit() {
            let mut number = String::new();
            while let Some(c) = self
                .last_char
                .filter(|c| c.is_ascii_digit() || *c == '.')
            {
                number.push(c);
                self.advance();
            }
            return Token::Number(parse_number(&number));
        }

        self.advance();
        Token::Char(c)
    }
}
