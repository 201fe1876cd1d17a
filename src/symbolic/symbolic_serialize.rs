//! Deterministic string serialization of [`Expr`].
//!
//! This is the interchange format of the problem descriptor: the numeric BVP
//! solver and the control evaluator read these strings back through
//! [`parse_expr`](crate::symbolic::parse_expr), and parsing the output of
//! `to_string()` yields a tree structurally equal to the original.
//!
//! Parentheses are emitted only where the parser would otherwise build a
//! different tree:
//! - a child binding weaker than its parent operator
//! - the right operand of `+ - * /` at the same precedence (the parser is
//!   left-associative)
//! - both operands of `^`
//! - negative constants below the top level
//!
//! Constants use Rust's shortest round-trip float formatting, so values survive
//! the text form bit for bit.

use crate::symbolic::symbolic_engine::Expr;
use std::fmt;

const PREC_TOP: u8 = 0;
const PREC_SUM: u8 = 1;
const PREC_PRODUCT: u8 = 2;
const PREC_POWER: u8 = 3;
const PREC_ATOM: u8 = 4;

impl Expr {
    fn precedence(&self) -> u8 {
        match self {
            Expr::Const(val) if val.is_sign_negative() => PREC_TOP,
            Expr::Add(..) | Expr::Sub(..) => PREC_SUM,
            Expr::Mul(..) | Expr::Div(..) => PREC_PRODUCT,
            Expr::Pow(..) => PREC_POWER,
            _ => PREC_ATOM,
        }
    }

    fn call_name(&self) -> Option<&'static str> {
        let name = match self {
            Expr::Exp(_) => "exp",
            Expr::Ln(_) => "ln",
            Expr::sin(_) => "sin",
            Expr::cos(_) => "cos",
            Expr::tg(_) => "tg",
            Expr::arcsin(_) => "arcsin",
            Expr::arccos(_) => "arccos",
            Expr::arctg(_) => "arctg",
            _ => return None,
        };
        Some(name)
    }

    fn write_child(f: &mut fmt::Formatter, child: &Expr, needs_parens: bool) -> fmt::Result {
        if needs_parens {
            write!(f, "({})", child)
        } else {
            write!(f, "{}", child)
        }
    }

    fn write_binary(
        &self,
        f: &mut fmt::Formatter,
        lhs: &Expr,
        rhs: &Expr,
        op: &str,
        prec: u8,
    ) -> fmt::Result {
        let (left_parens, right_parens) = if prec == PREC_POWER {
            (lhs.precedence() <= prec, rhs.precedence() <= prec)
        } else {
            (lhs.precedence() < prec, rhs.precedence() <= prec)
        };
        Self::write_child(f, lhs, left_parens)?;
        write!(f, " {} ", op)?;
        Self::write_child(f, rhs, right_parens)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Const(val) => write!(f, "{}", val),
            Expr::Add(lhs, rhs) => self.write_binary(f, lhs, rhs, "+", PREC_SUM),
            Expr::Sub(lhs, rhs) => self.write_binary(f, lhs, rhs, "-", PREC_SUM),
            Expr::Mul(lhs, rhs) => self.write_binary(f, lhs, rhs, "*", PREC_PRODUCT),
            Expr::Div(lhs, rhs) => self.write_binary(f, lhs, rhs, "/", PREC_PRODUCT),
            Expr::Pow(base, exp) => self.write_binary(f, base, exp, "^", PREC_POWER),
            call => {
                // every remaining variant is a one-argument call
                let name = call.call_name().unwrap_or("?");
                let arg = call.children()[0];
                write!(f, "{}({})", name, arg)
            }
        }
    }
}
