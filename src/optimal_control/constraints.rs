//! # Constraint handling
//!
//! ## Key Methods
//! - `partition_terminal()` - split terminal constraints by explicit dependence on the independent variable
//! - `utm_path()` - smooth penalty term of a bounded path constraint
//! - `icrm_path()` - relaxation function mapping an unbounded variable into the bounds
//! - `relax_path_constraint()` - differential-algebraic embedding of one path constraint
use crate::optimal_control::errors::{TranscriptionError, TranscriptionResult};
use crate::optimal_control::workspace::{Constraint, Variable, VariableRole};
use crate::symbolic::symbolic_engine::Expr;
use log::{debug, info};
use std::f64::consts::PI;

/// `(time independent, time dependent)`, each in declaration order.
pub fn partition_terminal(
    constraints: Vec<Constraint>,
    independent_variable: &str,
) -> (Vec<Constraint>, Vec<Constraint>) {
    constraints
        .into_iter()
        .partition(|c| c.expr.derivative(independent_variable).is_zero())
}

/// `activator*(1/cos(pi/2*(2*c - upper - lower)/(upper - lower)) - 1)`
///
/// Zero at the middle of the band and unbounded at both bounds.
pub fn utm_path(constraint: &Expr, lower: &Expr, upper: &Expr, activator: &Expr) -> Expr {
    let width = upper.clone() - lower.clone();
    let centered = Expr::Const(2.0) * constraint.clone() - upper.clone() - lower.clone();
    let angle = Expr::Const(PI / 2.0) * centered / width;
    activator.clone() * (Expr::Const(1.0) / Expr::cos(angle.boxed()) - Expr::Const(1.0))
}

/// `upper - (upper - lower)/(1 + exp(4*xi/(upper - lower)))`
///
/// Maps the real line onto `(lower, upper)` with unit slope at `xi = 0`.
pub fn icrm_path(xi: &Expr, lower: &Expr, upper: &Expr) -> Expr {
    let width = upper.clone() - lower.clone();
    let exponent = Expr::Const(4.0) * xi.clone() / width.clone();
    upper.clone() - width / (Expr::Const(1.0) + exponent.exp())
}

/// Result of embedding one path constraint by relaxation.
#[derive(Debug, Clone, PartialEq)]
pub struct RelaxedConstraint {
    /// number of time derivatives needed to expose a control
    pub order: usize,
    /// `xi_<k>_1 .. xi_<k>_<order>`
    pub xi_states: Vec<Variable>,
    pub xi_rates: Vec<Expr>,
    /// `uE_<k>` then `mu_<k>`
    pub controls: Vec<Variable>,
    /// `activator*uE_k^2`, added to the path cost
    pub path_cost_term: Expr,
    /// `c^(order) - psi^(order)`, adjoined to the Hamiltonian with `mu_k`
    pub algebraic_equation: Expr,
}

impl RelaxedConstraint {
    pub fn multiplier(&self) -> Expr {
        self.controls[1].symbol()
    }
}

/// Everything the order search needs to know about the dynamics.
pub struct Dynamics<'a> {
    pub states: &'a [String],
    pub rates: &'a [Expr],
    pub controls: &'a [String],
    pub independent_variable: &'a str,
    pub independent_variable_units: &'a Expr,
    pub cost_per_time_units: &'a Expr,
}

/// Embeds path constraint number `k` (1-based) by differential-algebraic relaxation.
///
/// The constraint is differentiated along the dynamics until a control
/// appears. Each differentiation adds one `xi` state; the last one is driven
/// by the new control `uE_k`. The relaxation function of `xi_k_1`
/// differentiated as many times along the `xi` chain gives the algebraic
/// equation that ties the original control to `uE_k`.
///
/// # Errors
/// [`TranscriptionError::ConstraintOrderExceeded`] if no control appears
/// within `max_order` derivatives.
pub fn relax_path_constraint(
    k: usize,
    constraint: &Constraint,
    dynamics: &Dynamics,
    max_order: usize,
) -> TranscriptionResult<RelaxedConstraint> {
    let (Some(lower), Some(upper), Some(activator)) =
        (&constraint.lower, &constraint.upper, &constraint.activator)
    else {
        return Err(TranscriptionError::Configuration(format!(
            "path constraint `{}` needs lower, upper and activator",
            constraint.expr
        )));
    };

    let mut derivative = constraint.expr.clone();
    let mut order = 0;
    while !derivative.contains_any(dynamics.controls) {
        if order == max_order {
            return Err(TranscriptionError::ConstraintOrderExceeded {
                constraint: constraint.expr.to_string(),
                max_order,
            });
        }
        derivative = derivative.total_derivative(
            dynamics.states,
            dynamics.rates,
            Some(dynamics.independent_variable),
        );
        order += 1;
        debug!("path constraint {}: derivative {} = {}", k, order, derivative);
    }
    info!("path constraint {} `{}` is of order {}", k, constraint.expr, order);

    let t_units = dynamics.independent_variable_units;
    let per_time = |j: usize| -> Expr {
        if j == 0 {
            constraint.unit.clone()
        } else {
            (constraint.unit.clone() / t_units.clone().pow(Expr::Const(j as f64))).simplify()
        }
    };
    let xi_states: Vec<Variable> = (1..=order)
        .map(|j| Variable::new(&format!("xi_{}_{}", k, j), per_time(j - 1), VariableRole::State))
        .collect();
    let u_e = Variable::new(&format!("uE_{}", k), per_time(order), VariableRole::Control);
    let mu = Variable::new(
        &format!("mu_{}", k),
        (dynamics.cost_per_time_units.clone() / per_time(order)).simplify(),
        VariableRole::Control,
    );
    let xi_rates: Vec<Expr> = xi_states
        .iter()
        .skip(1)
        .map(Variable::symbol)
        .chain(std::iter::once(u_e.symbol()))
        .take(order)
        .collect();

    let chain_names: Vec<String> = xi_states.iter().map(|v| v.name.clone()).collect();
    let first = xi_states.first().map(Variable::symbol).unwrap_or_else(|| u_e.symbol());
    let mut psi = icrm_path(&first, lower, upper);
    for _ in 0..order {
        psi = psi.total_derivative(&chain_names, &xi_rates, None);
    }
    let algebraic_equation = (derivative - psi).simplify();
    let path_cost_term = activator.clone() * u_e.symbol().pow(Expr::Const(2.0));

    Ok(RelaxedConstraint {
        order,
        xi_states,
        xi_rates,
        controls: vec![u_e, mu],
        path_cost_term,
        algebraic_equation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimal_control::ocp::ConstraintLocation;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    fn constraint(expr: &str, location: ConstraintLocation) -> Constraint {
        Constraint {
            expr: Expr::parse_expression(expr).unwrap(),
            unit: Expr::var("m"),
            lower: Some(Expr::Const(-1.0)),
            upper: Some(Expr::Const(1.0)),
            activator: Some(Expr::var("eps")),
            location,
        }
    }

    #[test]
    fn test_partition_terminal() {
        let cs = vec![
            constraint("x - x_f", ConstraintLocation::Terminal),
            constraint("t - t_f", ConstraintLocation::Terminal),
            constraint("v", ConstraintLocation::Terminal),
        ];
        let (plain, timed) = partition_terminal(cs, "t");
        assert_eq!(plain.len(), 2);
        assert_eq!(timed.len(), 1);
        assert_eq!(timed[0].expr, Expr::parse_expression("t - t_f").unwrap());
    }

    #[test]
    fn test_utm_penalty_values() {
        let c = Expr::var("c");
        let penalty = utm_path(&c, &Expr::Const(-1.0), &Expr::Const(1.0), &Expr::Const(0.1));
        let at = |x: f64| penalty.eval_expression(&HashMap::from([("c".to_string(), x)])).unwrap();
        assert_relative_eq!(at(0.0), 0.0, epsilon = 1e-14);
        assert!(at(0.9) > at(0.5));
        assert!(at(-0.99) > 1.0);
    }

    #[test]
    fn test_icrm_relaxation_function() {
        let xi = Expr::var("xi");
        let psi = icrm_path(&xi, &Expr::Const(-2.0), &Expr::Const(2.0));
        let at = |x: f64| psi.eval_expression(&HashMap::from([("xi".to_string(), x)])).unwrap();
        assert_relative_eq!(at(0.0), 0.0, epsilon = 1e-14);
        assert!(at(10.0) < 2.0 && at(10.0) > 1.99);
        assert!(at(-10.0) > -2.0 && at(-10.0) < -1.99);
        // unit slope at the middle
        let slope = psi.derivative("xi");
        let s = slope.eval_expression(&HashMap::from([("xi".to_string(), 0.0)])).unwrap();
        assert_relative_eq!(s, 1.0, epsilon = 1e-12);
    }

    fn double_integrator() -> (Vec<String>, Vec<Expr>, Vec<String>) {
        (
            vec!["x".to_string(), "v".to_string()],
            vec![Expr::var("v"), Expr::var("u")],
            vec!["u".to_string()],
        )
    }

    #[test]
    fn test_second_order_constraint() {
        let (states, rates, controls) = double_integrator();
        let units = Expr::var("s");
        let cost_units = Expr::Const(1.0);
        let dynamics = Dynamics {
            states: &states,
            rates: &rates,
            controls: &controls,
            independent_variable: "t",
            independent_variable_units: &units,
            cost_per_time_units: &cost_units,
        };
        let c = constraint("x", ConstraintLocation::Path);
        let relaxed = relax_path_constraint(1, &c, &dynamics, 4).unwrap();
        assert_eq!(relaxed.order, 2);
        assert_eq!(relaxed.xi_states.len(), 2);
        assert_eq!(relaxed.xi_states[0].name, "xi_1_1");
        assert_eq!(relaxed.xi_rates, vec![Expr::var("xi_1_2"), Expr::var("uE_1")]);
        assert!(relaxed.algebraic_equation.contains_variable("u"));
        assert!(relaxed.algebraic_equation.contains_variable("uE_1"));
        assert_eq!(relaxed.controls[0].name, "uE_1");
        assert_eq!(relaxed.multiplier(), Expr::var("mu_1"));
        assert_eq!(
            relaxed.xi_states[1].unit,
            Expr::var("m") / Expr::var("s")
        );
    }

    #[test]
    fn test_order_zero_constraint() {
        let (states, rates, controls) = double_integrator();
        let units = Expr::Const(1.0);
        let dynamics = Dynamics {
            states: &states,
            rates: &rates,
            controls: &controls,
            independent_variable: "t",
            independent_variable_units: &units,
            cost_per_time_units: &units,
        };
        let relaxed =
            relax_path_constraint(2, &constraint("u", ConstraintLocation::Path), &dynamics, 4)
                .unwrap();
        assert_eq!(relaxed.order, 0);
        assert!(relaxed.xi_states.is_empty());
        assert!(relaxed.algebraic_equation.contains_variable("uE_2"));
    }

    #[test]
    fn test_order_search_is_bounded() {
        // y never reaches the control
        let states = vec!["x".to_string(), "y".to_string()];
        let rates = vec![Expr::var("u"), Expr::Const(1.0)];
        let controls = vec!["u".to_string()];
        let units = Expr::Const(1.0);
        let dynamics = Dynamics {
            states: &states,
            rates: &rates,
            controls: &controls,
            independent_variable: "t",
            independent_variable_units: &units,
            cost_per_time_units: &units,
        };
        let result = relax_path_constraint(1, &constraint("y", ConstraintLocation::Path), &dynamics, 3);
        assert_eq!(
            result,
            Err(TranscriptionError::ConstraintOrderExceeded {
                constraint: "y".to_string(),
                max_order: 3
            })
        );
    }
}
