use std::io::Read;

use crate::ast::{Expression, Function, Prototype};
use crate::lexer::{Lexer, Token};
use crate::precedence::PrecedenceTable;

#[derive(Debug, PartialEq, Clone, thiserror::Error)]
#[error("{message}, found {found}")]
pub struct ParseError {
    pub message: &'static str,
    pub found: Token,
}

pub type PartialParseResult = Result<Expression, ParseError>;

/// Recursive descent parser with a single token of lookahead.
///
/// Every `parse_*` method expects the current token to be the first token of
/// its construct. On success the current token is the one following the
/// construct; on failure it is left at the offending token.
pub struct Parser<R: Read> {
    lexer: Lexer<R>,
    current: Token,
    precedence: PrecedenceTable,
}

impl<R: Read> Parser<R> {
    /// Reads the first token so the parser is positioned for `parse_*`.
    pub fn new(mut lexer: Lexer<R>, precedence: PrecedenceTable) -> Self {
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            precedence,
        }
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    pub fn next_token(&mut self) -> &Token {
        self.current = self.lexer.next_token();
        &self.current
    }

    fn error<T>(&self, message: &'static str) -> Result<T, ParseError> {
        log::debug!("parse failure: {} at {}", message, self.current);
        Err(ParseError {
            message,
            found: self.current.clone(),
        })
    }

    fn current_precedence(&self) -> i32 {
        self.precedence.get(&self.current)
    }

    fn parse_number(&mut self, value: f64) -> PartialParseResult {
        self.next_token();
        Ok(Expression::Literal(value))
    }

    fn parse_nested(&mut self) -> PartialParseResult {
        self.next_token();
        let expr = self.parse_expression()?;
        if self.current != Token::Char(')') {
            return self.error("expected ')' in expression");
        }
        self.next_token();
        Ok(expr)
    }

    fn parse_identifier(&mut self, name: String) -> PartialParseResult {
        self.next_token();
        if self.current != Token::Char('(') {
            return Ok(Expression::Variable(name));
        }

        self.next_token();
        let mut args = Vec::new();
        while self.current != Token::Char(')') {
            args.push(self.parse_expression()?);

            match self.current {
                Token::Char(')') => break,
                Token::Char(',') => {
                    self.next_token();
                }
                _ => return self.error("expected ')' or ',' in argument list"),
            }
        }
        self.next_token();

        Ok(Expression::Call(name, args))
    }

    pub fn parse_primary(&mut self) -> PartialParseResult {
        match self.current {
            Token::Identifier(ref name) => {
                let name = name.clone();
                self.parse_identifier(name)
            }
            Token::Number(value) => self.parse_number(value),
            Token::Char('(') => self.parse_nested(),
            _ => self.error("unknown token when expecting an expression"),
        }
    }

    /// Fold `(op primary)*` onto `lhs`, consuming only operators whose
    /// precedence is at least `min_precedence`.
    pub fn parse_binary_rhs(
        &mut self,
        min_precedence: i32,
        lhs: Expression,
    ) -> PartialParseResult {
        let mut result = lhs;

        loop {
            let precedence = self.current_precedence();
            if precedence < min_precedence {
                return Ok(result);
            }

            let operator = match self.current {
                Token::Char(op) => op,
                _ => return Ok(result),
            };
            self.next_token();

            let mut rhs = self.parse_primary()?;

            // equal precedence does not recurse, so chains group to the left
            if precedence < self.current_precedence() {
                rhs = self.parse_binary_rhs(precedence + 1, rhs)?;
            }

            result = Expression::binary(operator, result, rhs);
        }
    }

    pub fn parse_expression(&mut self) -> PartialParseResult {
        let lhs = self.parse_primary()?;
        self.parse_binary_rhs(0, lhs)
    }

    pub fn parse_prototype(&mut self) -> Result<Prototype, ParseError> {
        let name = match self.current {
            Token::Identifier(ref name) => name.clone(),
            _ => return self.error("expected function name in prototype"),
        };
        self.next_token();

        if self.current != Token::Char('(') {
            return self.error("expected '(' in prototype");
        }

        let mut args = Vec::new();
        while let Token::Identifier(arg) = self.next_token() {
            args.push(arg.clone());
        }
        if self.current != Token::Char(')') {
            return self.error("expected ')' in prototype");
        }
        self.next_token();

        Ok(Prototype { name, args })
    }

    /// `def` prototype expression
    pub fn parse_definition(&mut self) -> Result<Function, ParseError> {
        if self.current != Token::Def {
            return self.error("expected 'def'");
        }
        self.next_token();
        let prototype = self.parse_prototype()?;
        let body = self.parse_expression()?;
        Ok(Function { prototype, body })
    }

    /// `extern` prototype
    pub fn parse_extern(&mut self) -> Result<Prototype, ParseError> {
        if self.current != Token::Extern {
            return self.error("expected 'extern'");
        }
        self.next_token();
        self.parse_prototype()
    }

    pub fn parse_top_level_expr(&mut self) -> Result<Function, ParseError> {
        let body = self.parse_expression()?;
        Ok(Function {
            prototype: Prototype::anonymous(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parser(input: &str) -> Parser<&[u8]> {
        with_table(input, PrecedenceTable::standard())
    }

    fn with_table(input: &str, table: PrecedenceTable) -> Parser<&[u8]> {
        Parser::new(Lexer::new(input.as_bytes()), table)
    }

    fn num(value: f64) -> Expression {
        Expression::Literal(value)
    }

    fn var(name: &str) -> Expression {
        Expression::Variable(name.to_string())
    }

    fn parse_expr(input: &str) -> Expression {
        parser(input).parse_expression().unwrap()
    }

    #[test]
    fn parse_expr_works() {
        let target = Expression::binary(
            '+',
            var("x"),
            Expression::binary(
                '*',
                num(1.0),
                Expression::binary('-', num(2.0), num(3.0)),
            ),
        );
        assert_eq!(parse_expr("x + 1 * (2 - 3)"), target);
    }

    #[test]
    fn higher_precedence_binds_tighter() {
        assert_eq!(
            parse_expr("1 + 2 * 3"),
            Expression::binary('+', num(1.0), Expression::binary('*', num(2.0), num(3.0)))
        );
        assert_eq!(
            parse_expr("1 * 2 + 3"),
            Expression::binary('+', Expression::binary('*', num(1.0), num(2.0)), num(3.0))
        );
    }

    #[test]
    fn equal_precedence_is_left_associative() {
        assert_eq!(
            parse_expr("1 - 2 - 3"),
            Expression::binary('-', Expression::binary('-', num(1.0), num(2.0)), num(3.0))
        );
        assert_eq!(
            parse_expr("8 / 4 * 2"),
            Expression::binary('*', Expression::binary('/', num(8.0), num(4.0)), num(2.0))
        );
    }

    #[test]
    fn parentheses_override_precedence() {
        assert_eq!(
            parse_expr("(1 + 2) * 3"),
            Expression::binary('*', Expression::binary('+', num(1.0), num(2.0)), num(3.0))
        );
    }

    #[test]
    fn mixed_precedence_chain() {
        // a < b + c * d - e  =>  a < ((b + (c * d)) - e)
        let target = Expression::binary(
            '<',
            var("a"),
            Expression::binary(
                '-',
                Expression::binary('+', var("b"), Expression::binary('*', var("c"), var("d"))),
                var("e"),
            ),
        );
        assert_eq!(parse_expr("a < b + c * d - e"), target);
    }

    #[test]
    fn low_precedence_after_high_unwinds() {
        // 1 + 2 * 3 < 4  =>  (1 + (2 * 3)) < 4
        let target = Expression::binary(
            '<',
            Expression::binary('+', num(1.0), Expression::binary('*', num(2.0), num(3.0))),
            num(4.0),
        );
        assert_eq!(parse_expr("1 + 2 * 3 < 4"), target);
    }

    #[test]
    fn custom_operator_precedence() {
        let mut table = PrecedenceTable::standard();
        table.insert('^', 60);
        let mut parser = with_table("2 * 3 ^ 4", table);
        assert_eq!(
            parser.parse_expression().unwrap(),
            Expression::binary('*', num(2.0), Expression::binary('^', num(3.0), num(4.0)))
        );
    }

    #[test]
    fn unknown_operator_ends_expression() {
        let mut parser = parser("1 + 2 ^ 3");
        assert_eq!(
            parser.parse_expression().unwrap(),
            Expression::binary('+', num(1.0), num(2.0))
        );
        assert_eq!(parser.current(), &Token::Char('^'));
    }

    #[test]
    fn empty_table_parses_only_primaries() {
        let mut parser = with_table("1 + 2", PrecedenceTable::default());
        assert_eq!(parser.parse_expression().unwrap(), num(1.0));
        assert_eq!(parser.current(), &Token::Char('+'));
    }

    #[test]
    fn call_parsing() {
        assert_eq!(
            parse_expr("foo(1, 2+3)"),
            Expression::Call(
                "foo".to_string(),
                vec![num(1.0), Expression::binary('+', num(2.0), num(3.0))]
            )
        );
        assert_eq!(parse_expr("bar()"), Expression::Call("bar".to_string(), vec![]));
    }

    #[test]
    fn nested_calls() {
        assert_eq!(
            parse_expr("f(g(x), (y))"),
            Expression::Call(
                "f".to_string(),
                vec![Expression::Call("g".to_string(), vec![var("x")]), var("y")]
            )
        );
    }

    #[test]
    fn unterminated_call_fails_at_eof() {
        let mut parser = parser("foo(1,");
        let err = parser.parse_expression().unwrap_err();
        assert_eq!(err.found, Token::Eof);
        assert_eq!(parser.current(), &Token::Eof);
    }

    #[test]
    fn missing_argument_separator() {
        let mut parser = parser("foo(1 2)");
        let err = parser.parse_expression().unwrap_err();
        assert_eq!(err.message, "expected ')' or ',' in argument list");
        assert_eq!(parser.current(), &Token::Number(2.0));
    }

    #[test]
    fn missing_close_paren() {
        let mut parser = parser("(1 + 2;");
        let err = parser.parse_expression().unwrap_err();
        assert_eq!(err.message, "expected ')' in expression");
        assert_eq!(err.found, Token::Char(';'));
        assert_eq!(err.to_string(), "expected ')' in expression, found ';'");
    }

    #[test]
    fn unexpected_token_does_not_advance() {
        let mut parser = parser(") 1");
        assert!(parser.parse_expression().is_err());
        assert_eq!(parser.current(), &Token::Char(')'));
    }

    #[test]
    fn parse_prototype_works() {
        let mut parser = parser("foo(a b c) x");
        assert_eq!(
            parser.parse_prototype().unwrap(),
            Prototype {
                name: "foo".to_string(),
                args: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            }
        );
        assert_eq!(parser.current(), &Token::Identifier("x".to_string()));
    }

    #[test]
    fn prototype_allows_duplicate_params() {
        let prototype = parser("f(x x)").parse_prototype().unwrap();
        assert_eq!(prototype.args, vec!["x".to_string(), "x".to_string()]);
    }

    #[test]
    fn malformed_prototypes() {
        let err = parser("1(x)").parse_prototype().unwrap_err();
        assert_eq!(err.message, "expected function name in prototype");
        let err = parser("foo x").parse_prototype().unwrap_err();
        assert_eq!(err.message, "expected '(' in prototype");
        let err = parser("foo(a, b)").parse_prototype().unwrap_err();
        assert_eq!(err.message, "expected ')' in prototype");
        assert_eq!(err.found, Token::Char(','));
    }

    #[test]
    fn parse_definition_works() {
        let mut parser = parser("def add(x y) x + y");
        assert_eq!(
            parser.parse_definition().unwrap(),
            Function {
                prototype: Prototype {
                    name: "add".to_string(),
                    args: vec!["x".to_string(), "y".to_string()],
                },
                body: Expression::binary('+', var("x"), var("y")),
            }
        );
        assert_eq!(parser.current(), &Token::Eof);
    }

    #[test]
    fn definition_without_body_fails() {
        let err = parser("def f(x);").parse_definition().unwrap_err();
        assert_eq!(err.found, Token::Char(';'));
    }

    #[test]
    fn parse_extern_works() {
        let mut parser = parser("extern sin(x);");
        assert_eq!(
            parser.parse_extern().unwrap(),
            Prototype {
                name: "sin".to_string(),
                args: vec!["x".to_string()],
            }
        );
        assert_eq!(parser.current(), &Token::Char(';'));
    }

    #[test]
    fn top_level_expr_is_anonymous() {
        let function = parser("1 + x").parse_top_level_expr().unwrap();
        assert_eq!(function.prototype, Prototype::anonymous());
        assert_eq!(function.prototype.name, "__anon_expr");
        assert_eq!(function.body, Expression::binary('+', num(1.0), var("x")));
    }

    #[test]
    fn reparsing_is_deterministic() {
        let input = "def f(a b) a * (b + g(a, 2)) - 1";
        let first = parser(input).parse_definition().unwrap();
        let second = parser(input).parse_definition().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn deep_nesting() {
        let depth = 64;
        let input = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(parse_expr(&input), num(1.0));
    }
}
