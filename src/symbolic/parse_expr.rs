//! a module turns a String expression into a symbolic expression
//!
//! Grammar (usual precedence, `^` right-associative, unary minus binds weaker
//! than `^` so `-x^2` is `-(x^2)`):
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('-' | '+') unary | power
//! power   := primary ('^' unary)?
//! primary := number | symbol | call '(' expr ')' | '(' expr ')'
//! ```
//! `**` is accepted as a synonym of `^`. Calls: exp, ln (log), sin, cos,
//! tg (tan), arcsin (asin), arccos (acos), arctg (atan, arctan), sqrt.
//! `pi` is the constant π.
//!
//!# Example
//! ```
//! use RustedPMP::symbolic::symbolic_engine::Expr;
//! let parsed = Expr::parse_expression("v*cos(theta) + x^2").unwrap();
//! assert_eq!(parsed.to_string(), "v * cos(theta) + x ^ 2");
//! ```

use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_errors::SymbolicError;
use std::f64::consts::PI;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Caret);
                i += 2;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '^' => {
                tokens.push(Token::Caret);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // exponent part: 1e-6, 2.5E3
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        while j < chars.len() && chars[j].is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| format!("invalid number `{}`", text))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => return Err(format!("unexpected character `{}`", other)),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), String> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(format!("expected {:?}, found {:?}", expected, token)),
            None => Err(format!("expected {:?}, found end of input", expected)),
        }
    }

    fn expr(&mut self) -> Result<Expr, String> {
        let mut lhs = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    lhs = lhs + self.term()?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    lhs = lhs - self.term()?;
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn term(&mut self) -> Result<Expr, String> {
        let mut lhs = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    lhs = lhs * self.unary()?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    lhs = lhs / self.unary()?;
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn unary(&mut self) -> Result<Expr, String> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                let operand = self.unary()?;
                Ok(match operand {
                    Expr::Const(val) => Expr::Const(-val),
                    other => -other,
                })
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, String> {
        let base = self.primary()?;
        if let Some(Token::Caret) = self.peek() {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(base.pow(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, String> {
        match self.next() {
            Some(Token::Number(val)) => Ok(Expr::Const(val)),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => {
                if let Some(Token::LParen) = self.peek() {
                    self.pos += 1;
                    let arg = self.expr()?;
                    self.expect(Token::RParen)?;
                    return call(&name, arg);
                }
                if name == "pi" {
                    Ok(Expr::Const(PI))
                } else {
                    Ok(Expr::Var(name))
                }
            }
            Some(token) => Err(format!("unexpected token {:?}", token)),
            None => Err("unexpected end of input".to_string()),
        }
    }
}

fn call(name: &str, arg: Expr) -> Result<Expr, String> {
    let arg = arg.boxed();
    let expr = match name {
        "exp" => Expr::Exp(arg),
        "ln" | "log" => Expr::Ln(arg),
        "sin" => Expr::sin(arg),
        "cos" => Expr::cos(arg),
        "tg" | "tan" => Expr::tg(arg),
        "arcsin" | "asin" => Expr::arcsin(arg),
        "arccos" | "acos" => Expr::arccos(arg),
        "arctg" | "atan" | "arctan" => Expr::arctg(arg),
        "sqrt" => Expr::Pow(arg, Expr::Const(0.5).boxed()),
        other => return Err(format!("unknown function `{}`", other)),
    };
    Ok(expr)
}

/// Parses `input` into an [`Expr`].
pub fn parse_expression_func(input: &str) -> Result<Expr, SymbolicError> {
    let fail = |reason: String| SymbolicError::Parse {
        input: input.to_string(),
        reason,
    };
    let tokens = tokenize(input).map_err(fail)?;
    if tokens.is_empty() {
        return Err(fail("empty expression".to_string()));
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expr().map_err(fail)?;
    if parser.pos < parser.tokens.len() {
        return Err(fail(format!(
            "trailing input starting at {:?}",
            parser.tokens[parser.pos]
        )));
    }
    Ok(expr)
}

impl Expr {
    /// EXPRESSION PARSING FROM STRINGS

    /// Parses a mathematical expression from its string representation.
    pub fn parse_expression(input: &str) -> Result<Expr, SymbolicError> {
        parse_expression_func(input)
    }

    /// Parses every string of `input`, failing on the first invalid one.
    pub fn parse_vector_expression<S: AsRef<str>>(input: &[S]) -> Result<Vec<Expr>, SymbolicError> {
        input
            .iter()
            .map(|s| parse_expression_func(s.as_ref()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_constant() {
        let expr = parse_expression_func("42").unwrap();
        assert_eq!(expr, Expr::Const(42.0));
    }

    #[test]
    fn test_parse_variable_with_underscore() {
        let expr = parse_expression_func("_tf").unwrap();
        assert_eq!(expr, Expr::Var("_tf".to_string()));
    }

    #[test]
    fn test_parse_precedence() {
        let expr = parse_expression_func("x + 2*y^2").unwrap();
        let expected = Expr::var("x")
            + Expr::Const(2.0) * Expr::var("y").pow(Expr::Const(2.0));
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_parse_subtraction_is_left_associative() {
        let expr = parse_expression_func("a - b - c").unwrap();
        assert_eq!(expr, (Expr::var("a") - Expr::var("b")) - Expr::var("c"));
    }

    #[test]
    fn test_parse_power_is_right_associative() {
        let expr = parse_expression_func("a ^ b ^ c").unwrap();
        assert_eq!(expr, Expr::var("a").pow(Expr::var("b").pow(Expr::var("c"))));
    }

    #[test]
    fn test_parse_unary_minus() {
        assert_eq!(parse_expression_func("-3").unwrap(), Expr::Const(-3.0));
        assert_eq!(parse_expression_func("-x").unwrap(), -Expr::var("x"));
        assert_eq!(
            parse_expression_func("-x^2").unwrap(),
            -Expr::var("x").pow(Expr::Const(2.0))
        );
    }

    #[test]
    fn test_parse_functions_and_aliases() {
        let expr = parse_expression_func("log(x) + tan(y) + sqrt(z)").unwrap();
        let expected = Expr::Ln(Expr::var("x").boxed())
            + Expr::tg(Expr::var("y").boxed())
            + Expr::var("z").pow(Expr::Const(0.5));
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_parse_scientific_notation() {
        assert_eq!(parse_expression_func("1e-6").unwrap(), Expr::Const(1e-6));
        assert_eq!(parse_expression_func("2.5E3*x").unwrap(), Expr::Const(2500.0) * Expr::var("x"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_expression_func(""), Err(SymbolicError::Parse { .. })));
        assert!(matches!(parse_expression_func("x +"), Err(SymbolicError::Parse { .. })));
        assert!(matches!(parse_expression_func("(x"), Err(SymbolicError::Parse { .. })));
        assert!(matches!(parse_expression_func("foo(x)"), Err(SymbolicError::Parse { .. })));
        assert!(matches!(parse_expression_func("x $ y"), Err(SymbolicError::Parse { .. })));
        assert!(matches!(parse_expression_func("x y"), Err(SymbolicError::Parse { .. })));
    }

    #[test]
    fn test_serialization_round_trip() {
        let inputs = [
            "v*cos(theta)",
            "-g*sin(theta)",
            "lamx*v*cos(theta) - lamy*v*sin(theta) + lamv*g*(-1)",
            "eps1*(1/cos(pi/2*(2*u - 1 - (-1))/(1 - (-1))) - 1)",
            "x^(y^2)/(a - (b - c))",
            "exp(-x)*arctg(y/x)",
        ];
        for input in inputs {
            let expr = parse_expression_func(input).unwrap();
            let reparsed = parse_expression_func(&expr.to_string()).unwrap();
            assert_eq!(expr, reparsed, "round trip failed for {}", input);
        }
    }
}
