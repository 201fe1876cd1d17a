//! # Symbolic Expression Simplification Module
//!
//! Bottom-up algebraic simplification. Derivatives produced by
//! [`Expr::diff`] are full of `0*x`, `x*1` and `x^1` terms; the transcription
//! relies on them being folded away so that structural-zero tests (does a
//! control appear in this derivative? is this pivot zero?) are meaningful.
//!
//! Rules applied:
//! - constant folding for every operator and call
//! - additive and multiplicative identities, `x - x = 0`, `x / x = 1`
//! - `x + (-1)*y = x - y`, `x - (-1)*y = x + y`
//! - constants are pulled to the left of products and merged
//! - `x^0 = 1`, `x^1 = x`, `(x^a)^b = x^(a*b)` for constant exponents
//! - `exp(ln(x)) = x`, `ln(exp(x)) = x`
//!
//! The rules are deliberately local; no term collection across sums.

use crate::symbolic::symbolic_engine::Expr;

const MAX_PASSES: usize = 16;

impl Expr {
    //___________________________________SIMPLIFICATION____________________________________

    /// Simplifies until a fixed point is reached (or the pass limit is hit).
    pub fn simplify(&self) -> Expr {
        let mut current = self.simplify_();
        for _ in 0..MAX_PASSES {
            let next = current.simplify_();
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    /// One bottom-up simplification pass.
    pub fn simplify_(&self) -> Expr {
        match self {
            Expr::Var(_) | Expr::Const(_) => self.clone(),
            Expr::Add(lhs, rhs) => simplify_add(lhs.simplify_(), rhs.simplify_()),
            Expr::Sub(lhs, rhs) => simplify_sub(lhs.simplify_(), rhs.simplify_()),
            Expr::Mul(lhs, rhs) => simplify_mul(lhs.simplify_(), rhs.simplify_()),
            Expr::Div(lhs, rhs) => simplify_div(lhs.simplify_(), rhs.simplify_()),
            Expr::Pow(base, exp) => simplify_pow(base.simplify_(), exp.simplify_()),
            Expr::Exp(arg) => match arg.simplify_() {
                Expr::Const(a) if a.exp().is_finite() => Expr::Const(a.exp()),
                Expr::Ln(inner) => *inner,
                arg => Expr::Exp(arg.boxed()),
            },
            Expr::Ln(arg) => match arg.simplify_() {
                Expr::Const(a) if a > 0.0 => Expr::Const(a.ln()),
                Expr::Exp(inner) => *inner,
                arg => Expr::Ln(arg.boxed()),
            },
            Expr::sin(arg) => fold_call(arg.simplify_(), f64::sin, Expr::sin),
            Expr::cos(arg) => fold_call(arg.simplify_(), f64::cos, Expr::cos),
            Expr::tg(arg) => fold_call(arg.simplify_(), f64::tan, Expr::tg),
            Expr::arctg(arg) => fold_call(arg.simplify_(), f64::atan, Expr::arctg),
            Expr::arcsin(arg) => match arg.simplify_() {
                Expr::Const(a) if a.abs() <= 1.0 => Expr::Const(a.asin()),
                arg => Expr::arcsin(arg.boxed()),
            },
            Expr::arccos(arg) => match arg.simplify_() {
                Expr::Const(a) if a.abs() <= 1.0 => Expr::Const(a.acos()),
                arg => Expr::arccos(arg.boxed()),
            },
        }
    }
}

fn fold_call(arg: Expr, f: fn(f64) -> f64, wrap: fn(Box<Expr>) -> Expr) -> Expr {
    match arg {
        Expr::Const(a) if f(a).is_finite() => Expr::Const(f(a)),
        arg => wrap(arg.boxed()),
    }
}

fn negated_operand(expr: &Expr) -> Option<&Expr> {
    match expr {
        Expr::Mul(lhs, rhs) if matches!(lhs.as_ref(), Expr::Const(c) if *c == -1.0) => Some(rhs),
        _ => None,
    }
}

fn simplify_add(lhs: Expr, rhs: Expr) -> Expr {
    match (&lhs, &rhs) {
        (Expr::Const(a), Expr::Const(b)) => Expr::Const(a + b),
        (Expr::Const(a), _) if *a == 0.0 => rhs,
        (_, Expr::Const(b)) if *b == 0.0 => lhs,
        (_, Expr::Const(b)) if *b < 0.0 => Expr::Sub(lhs.boxed(), Expr::Const(-b).boxed()),
        _ if lhs == rhs => simplify_mul(Expr::Const(2.0), lhs),
        _ => {
            if let Some(y) = negated_operand(&rhs) {
                return simplify_sub(lhs.clone(), y.clone());
            }
            if let Some(y) = negated_operand(&lhs) {
                return simplify_sub(rhs.clone(), y.clone());
            }
            Expr::Add(lhs.boxed(), rhs.boxed())
        }
    }
}

fn simplify_sub(lhs: Expr, rhs: Expr) -> Expr {
    match (&lhs, &rhs) {
        (Expr::Const(a), Expr::Const(b)) => Expr::Const(a - b),
        (_, Expr::Const(b)) if *b == 0.0 => lhs,
        (Expr::Const(a), _) if *a == 0.0 => simplify_mul(Expr::Const(-1.0), rhs),
        (_, Expr::Const(b)) if *b < 0.0 => Expr::Add(lhs.boxed(), Expr::Const(-b).boxed()),
        _ if lhs == rhs => Expr::Const(0.0),
        _ => match negated_operand(&rhs) {
            Some(y) => simplify_add(lhs.clone(), y.clone()),
            None => Expr::Sub(lhs.boxed(), rhs.boxed()),
        },
    }
}

fn simplify_mul(lhs: Expr, rhs: Expr) -> Expr {
    match (&lhs, &rhs) {
        (Expr::Const(a), Expr::Const(b)) => Expr::Const(a * b),
        (Expr::Const(a), _) | (_, Expr::Const(a)) if *a == 0.0 => Expr::Const(0.0),
        (Expr::Const(a), _) if *a == 1.0 => rhs,
        (_, Expr::Const(b)) if *b == 1.0 => lhs,
        // constants go to the left
        (_, Expr::Const(_)) => simplify_mul(rhs, lhs),
        (Expr::Const(a), Expr::Mul(inner_l, inner_r)) => match inner_l.as_ref() {
            Expr::Const(b) => simplify_mul(Expr::Const(a * b), inner_r.as_ref().clone()),
            _ => Expr::Mul(lhs.clone().boxed(), rhs.clone().boxed()),
        },
        (Expr::Const(a), Expr::Sub(x, y)) if *a == -1.0 => {
            Expr::Sub(y.clone(), x.clone())
        }
        (Expr::Mul(inner_l, inner_r), _) if matches!(inner_l.as_ref(), Expr::Const(_)) => {
            simplify_mul(
                inner_l.as_ref().clone(),
                simplify_mul(inner_r.as_ref().clone(), rhs),
            )
        }
        (_, Expr::Mul(inner_l, inner_r)) if matches!(inner_l.as_ref(), Expr::Const(_)) => {
            simplify_mul(
                inner_l.as_ref().clone(),
                simplify_mul(lhs, inner_r.as_ref().clone()),
            )
        }
        (Expr::Div(num, den), _) if num.is_one() => Expr::Div(rhs.boxed(), den.clone()),
        (_, Expr::Div(num, den)) if num.is_one() => Expr::Div(lhs.boxed(), den.clone()),
        _ if lhs == rhs => Expr::Pow(lhs.boxed(), Expr::Const(2.0).boxed()),
        _ => Expr::Mul(lhs.boxed(), rhs.boxed()),
    }
}

fn simplify_div(lhs: Expr, rhs: Expr) -> Expr {
    match (&lhs, &rhs) {
        (Expr::Const(a), Expr::Const(b)) if *b != 0.0 => Expr::Const(a / b),
        (Expr::Const(a), _) if *a == 0.0 => Expr::Const(0.0),
        (_, Expr::Const(b)) if *b == 1.0 => lhs,
        (_, Expr::Const(b)) if *b == -1.0 => simplify_mul(Expr::Const(-1.0), lhs),
        _ if lhs == rhs => Expr::Const(1.0),
        (Expr::Mul(a, b), _) if a.as_ref() == &rhs => b.as_ref().clone(),
        (Expr::Mul(a, b), _) if b.as_ref() == &rhs => a.as_ref().clone(),
        (Expr::Mul(a, x), Expr::Const(b)) if *b != 0.0 => match a.as_ref() {
            Expr::Const(a) => simplify_mul(Expr::Const(a / b), x.as_ref().clone()),
            _ => Expr::Div(lhs.clone().boxed(), rhs.clone().boxed()),
        },
        (Expr::Div(a, b), _) if a.as_ref() == &rhs => Expr::Div(Expr::Const(1.0).boxed(), b.clone()),
        (_, Expr::Div(a, b)) => {
            simplify_div(simplify_mul(lhs.clone(), b.as_ref().clone()), a.as_ref().clone())
        }
        _ => Expr::Div(lhs.boxed(), rhs.boxed()),
    }
}

fn simplify_pow(base: Expr, exp: Expr) -> Expr {
    match (&base, &exp) {
        (Expr::Const(a), Expr::Const(b)) => {
            let value = a.powf(*b);
            if value.is_finite() {
                Expr::Const(value)
            } else {
                Expr::Pow(base.boxed(), exp.boxed())
            }
        }
        (_, Expr::Const(b)) if *b == 0.0 => Expr::Const(1.0),
        (_, Expr::Const(b)) if *b == 1.0 => base,
        (Expr::Const(a), _) if *a == 1.0 => Expr::Const(1.0),
        // (x^a)^b = x^(a*b) holds for every real x only when b is an integer
        (Expr::Pow(inner, inner_exp), Expr::Const(b)) if b.fract() == 0.0 => match inner_exp.as_ref() {
            Expr::Const(a) => simplify_pow(inner.as_ref().clone(), Expr::Const(a * b)),
            _ => Expr::Pow(base.clone().boxed(), exp.clone().boxed()),
        },
        _ => Expr::Pow(base.boxed(), exp.boxed()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Expr {
        Expr::var("x")
    }

    #[test]
    fn test_identities() {
        assert_eq!((x() + Expr::Const(0.0)).simplify(), x());
        assert_eq!((Expr::Const(1.0) * x()).simplify(), x());
        assert_eq!((x() * Expr::Const(0.0)).simplify(), Expr::Const(0.0));
        assert_eq!((x() - x()).simplify(), Expr::Const(0.0));
        assert_eq!((x() / x()).simplify(), Expr::Const(1.0));
        assert_eq!(x().pow(Expr::Const(1.0)).simplify(), x());
        assert_eq!(x().pow(Expr::Const(0.0)).simplify(), Expr::Const(1.0));
    }

    #[test]
    fn test_constant_folding() {
        let e = (Expr::Const(2.0) + Expr::Const(3.0)) * Expr::Const(4.0);
        assert_eq!(e.simplify(), Expr::Const(20.0));
        let e = Expr::Exp(Expr::Const(0.0).boxed());
        assert_eq!(e.simplify(), Expr::Const(1.0));
    }

    #[test]
    fn test_constants_move_left_and_merge() {
        let e = (Expr::Const(2.0) * x()) * Expr::Const(3.0);
        assert_eq!(e.simplify(), Expr::Const(6.0) * x());
    }

    #[test]
    fn test_negation_becomes_subtraction() {
        let e = Expr::var("a") + (-Expr::var("b"));
        assert_eq!(e.simplify(), Expr::var("a") - Expr::var("b"));
        let e = Expr::var("a") - (-Expr::var("b"));
        assert_eq!(e.simplify(), Expr::var("a") + Expr::var("b"));
    }

    #[test]
    fn test_nested_powers() {
        let e = x().pow(Expr::Const(3.0)).pow(Expr::Const(2.0));
        assert_eq!(e.simplify(), x().pow(Expr::Const(6.0)));
        // sqrt(x^2) is |x|, not x
        let e = x().pow(Expr::Const(2.0)).pow(Expr::Const(0.5));
        assert_eq!(e.simplify(), e);
        let mut values = std::collections::HashMap::new();
        values.insert("x".to_string(), -3.0);
        assert_eq!(e.simplify().eval_expression(&values).unwrap(), 3.0);
    }

    #[test]
    fn test_overflowing_constants_are_not_folded() {
        let e = Expr::Exp(Expr::Const(1000.0).boxed());
        assert_eq!(e.simplify(), e);
        let e = Expr::tg(Expr::Const(f64::INFINITY).boxed());
        assert_eq!(e.simplify(), e);
        let e = Expr::sin(Expr::Const(0.0).boxed());
        assert_eq!(e.simplify(), Expr::Const(0.0));
    }

    #[test]
    fn test_unit_quotients() {
        // cost / (cost / state) = state
        let cost = Expr::var("nd");
        let state = Expr::var("m");
        let e = cost.clone() / (cost.clone() / state.clone());
        assert_eq!(e.simplify(), state);
    }

    #[test]
    fn test_exp_ln_cancel() {
        assert_eq!(x().ln().exp().simplify(), x());
        assert_eq!(x().exp().ln().simplify(), x());
    }
}
