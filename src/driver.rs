use std::io::Read;

use crate::ast::{Function, Prototype};
use crate::lexer::Token;
use crate::parser::{ParseError, Parser};

/// One top-level unit of a program.
#[derive(Debug, PartialEq, Clone)]
pub enum Unit {
    Definition(Function),
    Extern(Prototype),
    TopLevel(Function),
}

impl Unit {
    pub fn description(&self) -> &'static str {
        match self {
            Unit::Definition(_) => "a def",
            Unit::Extern(_) => "an extern",
            Unit::TopLevel(_) => "a top-level expr",
        }
    }
}

/// Dispatches on the current token to parse one top-level unit at a time.
///
/// After a failed unit the offending token is skipped, so iteration always
/// makes progress and ends at end of input.
pub struct Driver<R: Read> {
    parser: Parser<R>,
    prompt: Option<Box<dyn FnMut()>>,
}

impl<R: Read> Driver<R> {
    pub fn new(parser: Parser<R>) -> Self {
        Self {
            parser,
            prompt: None,
        }
    }

    /// Called before each unit is read, and before every skipped `;`.
    pub fn with_prompt(mut self, prompt: impl FnMut() + 'static) -> Self {
        self.prompt = Some(Box::new(prompt));
        self
    }

    fn prompt(&mut self) {
        if let Some(prompt) = self.prompt.as_mut() {
            prompt();
        }
    }

    fn parse_unit(&mut self) -> Result<Unit, ParseError> {
        match self.parser.current() {
            Token::Def => self.parser.parse_definition().map(Unit::Definition),
            Token::Extern => self.parser.parse_extern().map(Unit::Extern),
            _ => self.parser.parse_top_level_expr().map(Unit::TopLevel),
        }
    }
}

impl<R: Read> Iterator for Driver<R> {
    type Item = Result<Unit, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.prompt();
            match self.parser.current() {
                Token::Eof => return None,
                Token::Char(';') => {
                    self.parser.next_token();
                }
                _ => break,
            }
        }

        let result = self.parse_unit();
        if result.is_err() {
            let skipped = self.parser.current().clone();
            self.parser.next_token();
            log::debug!("skipped {} to recover", skipped);
        }
        Some(result)
    }
}
