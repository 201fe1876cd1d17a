//! # Symbolic Engine Derivatives Module
//!
//! Analytical differentiation and numeric evaluation of [`Expr`] trees.
//!
//! ## Key Methods
//!
//! ### Differentiation
//! - `diff(var: &str)` - raw partial derivative (product, quotient and chain rules)
//! - `derivative(var: &str)` - partial derivative followed by simplification
//! - `total_derivative()` - derivative along a vector field, d/dt = Σ ∂/∂xᵢ·ẋᵢ + ∂/∂t
//! - `jacobian()` - matrix of partial derivatives of a function vector
//!
//! ### Evaluation
//! - `eval_expression()` - evaluate with symbol values taken from a map

use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_errors::SymbolicError;
use std::collections::HashMap;

impl Expr {
    /// DIFFERENTIATION

    /// Computes the analytical partial derivative with respect to `var`.
    ///
    /// - Power rule: d/dx(f^g) = g*f^(g-1)*f' + f^g*ln(f)*g'
    /// - Product rule: d/dx(f*g) = f'*g + f*g'
    /// - Quotient rule: d/dx(f/g) = (f'*g - f*g')/g^2
    /// - Chain rule for every call
    ///
    /// The result is not simplified; use [`Expr::derivative`] for that.
    pub fn diff(&self, var: &str) -> Expr {
        let one = || Expr::Const(1.0);
        let two = || Expr::Const(2.0);
        match self {
            Expr::Var(name) => {
                if name == var {
                    Expr::Const(1.0)
                } else {
                    Expr::Const(0.0)
                }
            }
            Expr::Const(_) => Expr::Const(0.0),
            Expr::Add(lhs, rhs) => lhs.diff(var) + rhs.diff(var),
            Expr::Sub(lhs, rhs) => lhs.diff(var) - rhs.diff(var),
            Expr::Mul(lhs, rhs) => {
                lhs.diff(var) * *rhs.clone() + *lhs.clone() * rhs.diff(var)
            }
            Expr::Div(lhs, rhs) => (lhs.diff(var) * *rhs.clone()
                - *lhs.clone() * rhs.diff(var))
                / rhs.as_ref().clone().pow(two()),
            Expr::Pow(base, exp) => {
                let base_part = *exp.clone()
                    * base.as_ref().clone().pow(*exp.clone() - one())
                    * base.diff(var);
                if exp.contains_variable(var) {
                    // f^g * ln(f) * g'
                    base_part + self.clone() * base.as_ref().clone().ln() * exp.diff(var)
                } else {
                    base_part
                }
            }
            Expr::Exp(arg) => self.clone() * arg.diff(var),
            Expr::Ln(arg) => arg.diff(var) / *arg.clone(),
            Expr::sin(arg) => Expr::cos(arg.clone()) * arg.diff(var),
            Expr::cos(arg) => -Expr::sin(arg.clone()) * arg.diff(var),
            Expr::tg(arg) => arg.diff(var) / Expr::cos(arg.clone()).pow(two()),
            Expr::arcsin(arg) => {
                arg.diff(var) / (one() - arg.as_ref().clone().pow(two())).pow(Expr::Const(0.5))
            }
            Expr::arccos(arg) => {
                -arg.diff(var) / (one() - arg.as_ref().clone().pow(two())).pow(Expr::Const(0.5))
            }
            Expr::arctg(arg) => arg.diff(var) / (one() + arg.as_ref().clone().pow(two())),
        }
    } // end of diff

    /// Partial derivative with respect to `var`, simplified.
    pub fn derivative(&self, var: &str) -> Expr {
        self.diff(var).simplify()
    }

    /// Derivative along a vector field: Σ ∂e/∂xᵢ · ẋᵢ, plus the explicit
    /// partial derivative in `independent` when it is given.
    ///
    /// # Arguments
    /// * `states` - names of the state symbols xᵢ
    /// * `rates` - expressions ẋᵢ, positionally aligned with `states`
    /// * `independent` - name of the independent variable, if explicit time
    ///   dependence must be accounted for
    pub fn total_derivative(&self, states: &[String], rates: &[Expr], independent: Option<&str>) -> Expr {
        let mut result = Expr::sum(
            states
                .iter()
                .zip(rates.iter())
                .map(|(state, rate)| self.derivative(state) * rate.clone()),
        );
        if let Some(t) = independent {
            result = result + self.derivative(t);
        }
        result.simplify()
    }

    /// Symbolic jacobian: `result[i][j] = ∂functions[i]/∂variables[j]`, simplified.
    pub fn jacobian(functions: &[Expr], variables: &[String]) -> Vec<Vec<Expr>> {
        functions
            .iter()
            .map(|f| variables.iter().map(|v| f.derivative(v)).collect())
            .collect()
    }

    /// DIRECT EXPRESSION EVALUATION

    /// Evaluates the expression with symbol values taken from `values`.
    ///
    /// # Errors
    /// [`SymbolicError::UnboundSymbol`] if a symbol in the tree has no value.
    pub fn eval_expression(&self, values: &HashMap<String, f64>) -> Result<f64, SymbolicError> {
        let value = match self {
            Expr::Var(name) => *values
                .get(name)
                .ok_or_else(|| SymbolicError::UnboundSymbol(name.clone()))?,
            Expr::Const(val) => *val,
            Expr::Add(lhs, rhs) => lhs.eval_expression(values)? + rhs.eval_expression(values)?,
            Expr::Sub(lhs, rhs) => lhs.eval_expression(values)? - rhs.eval_expression(values)?,
            Expr::Mul(lhs, rhs) => lhs.eval_expression(values)? * rhs.eval_expression(values)?,
            Expr::Div(lhs, rhs) => lhs.eval_expression(values)? / rhs.eval_expression(values)?,
            Expr::Pow(base, exp) => {
                let base = base.eval_expression(values)?;
                let exp = exp.eval_expression(values)?;
                if exp.fract() == 0.0 && exp.abs() < i32::MAX as f64 {
                    base.powi(exp as i32)
                } else {
                    base.powf(exp)
                }
            }
            Expr::Exp(arg) => arg.eval_expression(values)?.exp(),
            Expr::Ln(arg) => arg.eval_expression(values)?.ln(),
            Expr::sin(arg) => arg.eval_expression(values)?.sin(),
            Expr::cos(arg) => arg.eval_expression(values)?.cos(),
            Expr::tg(arg) => arg.eval_expression(values)?.tan(),
            Expr::arcsin(arg) => arg.eval_expression(values)?.asin(),
            Expr::arccos(arg) => arg.eval_expression(values)?.acos(),
            Expr::arctg(arg) => arg.eval_expression(values)?.atan(),
        };
        Ok(value)
    } // end of eval_expression
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn eval_at(expr: &Expr, pairs: &[(&str, f64)]) -> f64 {
        let values: HashMap<String, f64> =
            pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        expr.eval_expression(&values).unwrap()
    }

    #[test]
    fn test_diff_product_and_chain() {
        // d/dx (x * sin(x)) = sin(x) + x*cos(x)
        let x = Expr::var("x");
        let f = x.clone() * Expr::sin(x.clone().boxed());
        let df = f.derivative("x");
        let expected = 0.5_f64.sin() + 0.5 * 0.5_f64.cos();
        assert_relative_eq!(eval_at(&df, &[("x", 0.5)]), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_diff_power_with_variable_exponent() {
        // d/dx x^x = x^x (ln x + 1)
        let x = Expr::var("x");
        let f = x.clone().pow(x.clone());
        let df = f.derivative("x");
        let xv: f64 = 1.7;
        assert_relative_eq!(
            eval_at(&df, &[("x", xv)]),
            xv.powf(xv) * (xv.ln() + 1.0),
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_diff_quotient_and_inverse_trig() {
        let x = Expr::var("x");
        let f = Expr::arctg((x.clone() / Expr::Const(2.0)).boxed());
        let df = f.derivative("x");
        // 1/2 / (1 + x^2/4)
        assert_relative_eq!(eval_at(&df, &[("x", 1.0)]), 0.5 / 1.25, epsilon = 1e-12);
    }

    #[test]
    fn test_diff_of_other_symbol_is_zero() {
        let f = Expr::var("y") * Expr::var("z");
        assert_eq!(f.derivative("x"), Expr::Const(0.0));
    }

    #[test]
    fn test_total_derivative_along_dynamics() {
        // c = x^2, x' = v  =>  dc/dt = 2*x*v
        let c = Expr::var("x").pow(Expr::Const(2.0));
        let dc = c.total_derivative(&["x".to_string()], &[Expr::var("v")], None);
        assert_relative_eq!(eval_at(&dc, &[("x", 3.0), ("v", 2.0)]), 12.0);
    }

    #[test]
    fn test_total_derivative_with_explicit_time() {
        let c = Expr::var("x") + Expr::var("t") * Expr::Const(3.0);
        let dc = c.total_derivative(&["x".to_string()], &[Expr::var("v")], Some("t"));
        assert_relative_eq!(eval_at(&dc, &[("v", 2.0)]), 5.0);
    }

    #[test]
    fn test_jacobian_shape() {
        let f = vec![Expr::var("x") * Expr::var("y"), Expr::var("x")];
        let jac = Expr::jacobian(&f, &["x".to_string(), "y".to_string()]);
        assert_eq!(jac.len(), 2);
        assert_eq!(jac[0][0], Expr::var("y"));
        assert_eq!(jac[0][1], Expr::var("x"));
        assert_eq!(jac[1][0], Expr::Const(1.0));
        assert_eq!(jac[1][1], Expr::Const(0.0));
    }

    #[test]
    fn test_eval_unbound_symbol() {
        let f = Expr::var("x") + Expr::var("q");
        let values = HashMap::from([("x".to_string(), 1.0)]);
        assert_eq!(
            f.eval_expression(&values),
            Err(SymbolicError::UnboundSymbol("q".to_string()))
        );
    }
}
