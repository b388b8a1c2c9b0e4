use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::lexer::Token;

#[derive(Debug, PartialEq, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid precedence entry {0:?}, expected OP=PRECEDENCE")]
    Malformed(String),
    #[error("{0:?} cannot be used as a binary operator")]
    ReservedOperator(char),
    #[error("precedence for {0:?} must be a positive integer")]
    NonPositive(char),
}

lazy_static! {
    static ref ENTRY_RE: Regex = Regex::new(r"^(?P<op>[[:ascii:]])=(?P<prec>-?\d+)$").unwrap();
}

/// Binary operator precedences, keyed by the operator character.
///
/// Characters missing from the table are not infix operators.
#[derive(Debug, Clone, Default)]
pub struct PrecedenceTable {
    operators: HashMap<char, i32>,
}

impl PrecedenceTable {
    /// The table the interactive driver starts with.
    pub fn standard() -> Self {
        let mut table = Self::default();
        table.insert('<', 10);
        table.insert('>', 10);
        table.insert('+', 20);
        table.insert('-', 20);
        table.insert('*', 40);
        table.insert('/', 40);
        table
    }

    pub fn insert(&mut self, op: char, precedence: i32) -> Option<i32> {
        self.operators.insert(op, precedence)
    }

    /// precedence of `token` as an infix operator, or -1 if it isn't one
    pub fn get(&self, token: &Token) -> i32 {
        match token {
            Token::Char(c) if c.is_ascii() => match self.operators.get(c) {
                Some(&pr) if pr > 0 => pr,
                _ => -1,
            },
            _ => -1,
        }
    }
}

fn is_reserved(op: char) -> bool {
    op.is_ascii_alphanumeric()
        || op.is_ascii_whitespace()
        || op.is_ascii_control()
        || matches!(op, '#' | '(' | ')' | ',' | ';' | '.')
}

/// Parse an `OP=PRECEDENCE` entry such as `^=50`.
pub fn parse_entry(entry: &str) -> Result<(char, i32), ConfigError> {
    let caps = ENTRY_RE
        .captures(entry.trim())
        .ok_or_else(|| ConfigError::Malformed(entry.to_string()))?;

    let op = caps["op"]
        .chars()
        .next()
        .ok_or_else(|| ConfigError::Malformed(entry.to_string()))?;
    if is_reserved(op) {
        return Err(ConfigError::ReservedOperator(op));
    }

    let precedence: i32 = caps["prec"]
        .parse()
        .map_err(|_| ConfigError::Malformed(entry.to_string()))?;
    if precedence <= 0 {
        return Err(ConfigError::NonPositive(op));
    }

    Ok((op, precedence))
}
