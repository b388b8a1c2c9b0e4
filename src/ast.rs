/// Name given to the prototype wrapping a bare top-level expression. Lexed
/// identifiers always start with a letter, so no user function can collide.
pub const ANONYMOUS_FUNCTION: &str = "__anon_expr";

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Literal(f64),
    Variable(String),
    Binary(char, Box<Expression>, Box<Expression>),
    Call(String, Vec<Expression>),
}

impl Expression {
    pub fn binary(op: char, left: Expression, right: Expression) -> Self {
        Expression::Binary(op, Box::new(left), Box::new(right))
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Prototype {
    pub name: String,
    pub args: Vec<String>,
}

impl Prototype {
    pub fn anonymous() -> Self {
        Prototype {
            name: ANONYMOUS_FUNCTION.to_string(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Function {
    pub prototype: Prototype,
    pub body: Expression,
}
