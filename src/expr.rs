//! Restricted arithmetic evaluator for reference formulas
//!
//! A reference expression names reporter aliases as operands and combines
//! them with `+ - * /`, unary minus, parentheses, and a small set of
//! functions (`mean`, `sum`, `min`, `max`). Nothing else is evaluated:
//! an unresolved name is an error, not a lookup into arbitrary scope.
use crate::util;
use thiserror::Error;

/// Error raised while parsing or evaluating a reference formula
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExprError {
    #[error("malformed expression: {0}")]
    Parse(String),
    #[error("unknown operand {0}")]
    UnknownOperand(String),
    #[error("unknown function {0}")]
    UnknownFunction(String),
    #[error("function {0} takes at least one argument")]
    EmptyArgs(&'static str),
}

/// Parsed reference formula
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// A reporter alias, bound to a column value at evaluation time
    Operand(String),
    Neg(Box<Expr>),
    Binary(Op, Box<Expr>, Box<Expr>),
    Call(Func, Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Func {
    Mean,
    Sum,
    Min,
    Max,
}

impl Func {
    fn name(self) -> &'static str {
        match self {
            Func::Mean => "mean",
            Func::Sum => "sum",
            Func::Min => "min",
            Func::Max => "max",
        }
    }

    fn apply(self, args: &[f64]) -> f64 {
        match self {
            Func::Mean => util::mean(args),
            Func::Sum => util::sum(args),
            Func::Min => util::min(args),
            Func::Max => util::max(args),
        }
    }
}

impl Expr {
    /// Evaluate the formula with operands supplied by `bind`.
    ///
    /// Division is plain IEEE division; non-finite results are data for
    /// the downstream missing-value policy, not errors.
    pub fn eval<F>(&self, bind: &F) -> Result<f64, ExprError>
    where
        F: Fn(&str) -> Option<f64>,
    {
        match self {
            Expr::Number(n) => Ok(*n),
            Expr::Operand(name) => {
                bind(name).ok_or_else(|| ExprError::UnknownOperand(name.clone()))
            }
            Expr::Neg(inner) => Ok(-inner.eval(bind)?),
            Expr::Binary(op, lhs, rhs) => {
                let (l, r) = (lhs.eval(bind)?, rhs.eval(bind)?);
                Ok(match op {
                    Op::Add => l + r,
                    Op::Sub => l - r,
                    Op::Mul => l * r,
                    Op::Div => l / r,
                })
            }
            Expr::Call(func, args) => {
                if args.is_empty() {
                    return Err(ExprError::EmptyArgs(func.name()));
                }
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(arg.eval(bind)?);
                }
                Ok(func.apply(&values))
            }
        }
    }
}

/// Parse a reference formula into an [`Expr`]
pub fn parse(input: &str) -> Result<Expr, ExprError> {
    let mut parser = Parser { rest: input };
    let expr = parser.expr()?;
    parser.skip_whitespace();
    if parser.rest.is_empty() {
        Ok(expr)
    } else {
        Err(ExprError::Parse(format!(
            "trailing input: {:?}",
            parser.rest
        )))
    }
}

fn take_while<F: Fn(char) -> bool>(input: &str, pred: F) -> (&str, &str) {
    let end = input
        .char_indices()
        .find(|(_, c)| !pred(*c))
        .map(|(i, _)| i)
        .unwrap_or_else(|| input.len());
    input.split_at(end)
}

struct Parser<'s> {
    rest: &'s str,
}

impl<'s> Parser<'s> {
    fn skip_whitespace(&mut self) {
        self.rest = self.rest.trim_start_matches(char::is_whitespace);
    }

    /// Consume `c` if it is the next non-whitespace character
    fn eat(&mut self, c: char) -> bool {
        self.skip_whitespace();
        if self.rest.starts_with(c) {
            self.rest = &self.rest[c.len_utf8()..];
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.term()?;
        loop {
            if self.eat('+') {
                lhs = Expr::Binary(Op::Add, Box::new(lhs), Box::new(self.term()?));
            } else if self.eat('-') {
                lhs = Expr::Binary(Op::Sub, Box::new(lhs), Box::new(self.term()?));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn term(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.factor()?;
        loop {
            if self.eat('*') {
                lhs = Expr::Binary(Op::Mul, Box::new(lhs), Box::new(self.factor()?));
            } else if self.eat('/') {
                lhs = Expr::Binary(Op::Div, Box::new(lhs), Box::new(self.factor()?));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn factor(&mut self) -> Result<Expr, ExprError> {
        if self.eat('-') {
            Ok(Expr::Neg(Box::new(self.factor()?)))
        } else {
            self.primary()
        }
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        self.skip_whitespace();
        let next = match self.rest.chars().next() {
            Some(c) => c,
            None => return Err(ExprError::Parse("unexpected end of expression".into())),
        };

        if next == '(' {
            self.eat('(');
            let inner = self.expr()?;
            if self.eat(')') {
                Ok(inner)
            } else {
                Err(ExprError::Parse("expected closing parenthesis".into()))
            }
        } else if next.is_ascii_digit() || next == '.' {
            let (num, rest) = take_while(self.rest, |c| c.is_ascii_digit() || c == '.');
            self.rest = rest;
            num.parse::<f64>()
                .map(Expr::Number)
                .map_err(|_| ExprError::Parse(format!("invalid number {:?}", num)))
        } else if next.is_ascii_alphabetic() || next == '_' {
            let (name, rest) =
                take_while(self.rest, |c| c.is_ascii_alphanumeric() || c == '_');
            self.rest = rest;
            if self.eat('(') {
                self.call(name)
            } else {
                Ok(Expr::Operand(name.into()))
            }
        } else {
            Err(ExprError::Parse(format!("unexpected character {:?}", next)))
        }
    }

    /// Parse the argument list of `name(...)`; the opening parenthesis
    /// has already been consumed
    fn call(&mut self, name: &str) -> Result<Expr, ExprError> {
        let func = match name {
            "mean" => Func::Mean,
            "sum" => Func::Sum,
            "min" => Func::Min,
            "max" => Func::Max,
            _ => return Err(ExprError::UnknownFunction(name.into())),
        };
        let mut args = Vec::new();
        if self.eat(')') {
            return Ok(Expr::Call(func, args));
        }
        loop {
            args.push(self.expr()?);
            if self.eat(',') {
                continue;
            }
            if self.eat(')') {
                return Ok(Expr::Call(func, args));
            }
            return Err(ExprError::Parse(
                "expected ',' or ')' in argument list".into(),
            ));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;

    fn bindings() -> HashMap<&'static str, f64> {
        let mut map = HashMap::new();
        map.insert("R1", 100.0);
        map.insert("R2", 200.0);
        map.insert("ref", 50.0);
        map
    }

    fn eval(input: &str) -> Result<f64, ExprError> {
        let map = bindings();
        parse(input)?.eval(&|name| map.get(name).copied())
    }

    #[test]
    fn single_alias() {
        assert_eq!(eval("R1"), Ok(100.0));
        assert_eq!(eval("  ref "), Ok(50.0));
    }

    #[test]
    fn precedence_and_parentheses() {
        assert_eq!(eval("R1 + R2 / 2"), Ok(200.0));
        assert_eq!(eval("(R1 + R2) / 2"), Ok(150.0));
        assert_eq!(eval("-R1 + R2"), Ok(100.0));
        assert_eq!(eval("R2 - R1 - ref"), Ok(50.0));
    }

    #[test]
    fn functions() {
        assert_eq!(eval("mean(R1, R2)"), Ok(150.0));
        assert_eq!(eval("sum(R1, R2, ref)"), Ok(350.0));
        assert_eq!(eval("min(R1, R2)"), Ok(100.0));
        assert_eq!(eval("max(R1, R2) / 2"), Ok(100.0));
    }

    #[test]
    fn unknown_operand() {
        assert_eq!(
            eval("R1 + R9"),
            Err(ExprError::UnknownOperand("R9".into()))
        );
    }

    #[test]
    fn unknown_function() {
        assert_eq!(
            eval("median(R1, R2)"),
            Err(ExprError::UnknownFunction("median".into()))
        );
    }

    #[test]
    fn empty_argument_list() {
        assert_eq!(eval("mean()"), Err(ExprError::EmptyArgs("mean")));
    }

    #[test]
    fn malformed() {
        assert!(matches!(eval("R1 +"), Err(ExprError::Parse(_))));
        assert!(matches!(eval("(R1"), Err(ExprError::Parse(_))));
        assert!(matches!(eval("R1 R2"), Err(ExprError::Parse(_))));
        assert!(matches!(eval("1.2.3"), Err(ExprError::Parse(_))));
        assert!(matches!(eval(""), Err(ExprError::Parse(_))));
    }

    #[test]
    fn division_is_ieee() {
        assert_eq!(eval("R1 / 0"), Ok(f64::INFINITY));
    }
}
