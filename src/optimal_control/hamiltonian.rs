//! # Hamiltonian, costates and boundary conditions
//!
//! ## Key Methods
//! - `make_augmented_cost()` - boundary cost plus one Lagrange multiplier per constraint
//! - `make_hamiltonian()` - `H = L + Σ λ_i·f_i`, with the costate variables
//! - `make_costate_rates()` - `λ̇_i = -∂H/∂x_i`
//! - `make_boundary_conditions()` - constraints followed by transversality conditions
//! - `make_time_bc()` - terminal time condition
use crate::optimal_control::ocp::ConstraintLocation;
use crate::optimal_control::workspace::{Constraint, Variable, VariableRole};
use crate::symbolic::symbolic_engine::Expr;

#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedCost {
    pub expr: Expr,
    pub unit: Expr,
    /// `lagrange_<location>_<k>`, one per constraint
    pub multipliers: Vec<Variable>,
}

/// `Φ = cost + Σ ν_k·c_k` over the constraints of one boundary.
pub fn make_augmented_cost(
    cost: &Expr,
    cost_units: &Expr,
    constraints: &[Constraint],
    location: ConstraintLocation,
) -> AugmentedCost {
    let multipliers: Vec<Variable> = constraints
        .iter()
        .enumerate()
        .map(|(k, c)| {
            Variable::new(
                &format!("lagrange_{}_{}", location, k + 1),
                (cost_units.clone() / c.unit.clone()).simplify(),
                VariableRole::LagrangeMultiplier,
            )
        })
        .collect();
    let expr = cost.clone()
        + Expr::sum(
            multipliers
                .iter()
                .zip(constraints)
                .map(|(nu, c)| nu.symbol() * c.expr.clone()),
        );
    AugmentedCost {
        expr: expr.simplify(),
        unit: cost_units.clone(),
        multipliers,
    }
}

/// `lam` + name of the paired variable.
pub fn make_costate_names(vars: &[Variable]) -> Vec<String> {
    vars.iter().map(|v| format!("lam{}", v.name)).collect()
}

/// Adjoint variables of `vars`, with units `cost_units / unit`.
pub fn make_costates(vars: &[Variable], cost_units: &Expr, role: VariableRole) -> Vec<Variable> {
    make_costate_names(vars)
        .iter()
        .zip(vars)
        .map(|(name, v)| Variable::new(name, (cost_units.clone() / v.unit.clone()).simplify(), role))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hamiltonian {
    pub expr: Expr,
    pub unit: Expr,
    pub costates: Vec<Variable>,
}

/// `H = path_cost + Σ λ_i·rate_i`. The unit of H is cost per unit of the
/// independent variable.
pub fn make_hamiltonian(
    states: &[Variable],
    rates: &[Expr],
    path_cost: &Expr,
    cost_units: &Expr,
    independent_variable_units: &Expr,
) -> Hamiltonian {
    let costates = make_costates(states, cost_units, VariableRole::Costate);
    let expr = path_cost.clone()
        + Expr::sum(
            costates
                .iter()
                .zip(rates)
                .map(|(lam, rate)| lam.symbol() * rate.clone()),
        );
    Hamiltonian {
        expr,
        unit: (cost_units.clone() / independent_variable_units.clone()).simplify(),
        costates,
    }
}

/// `-∂H/∂x_i` for every variable, positionally aligned.
pub fn make_costate_rates(hamiltonian: &Expr, vars: &[Variable]) -> Vec<Expr> {
    vars.iter()
        .map(|v| (-hamiltonian.derivative(&v.name)).simplify())
        .collect()
}

/// Boundary conditions at one location: the constraint expressions, then
/// `sign·∂Φ/∂x_i - λ_i` for every state and `sign·∂Φ/∂p_j - λp_j` for every
/// parameter, with `sign = -1` at the initial and `+1` at the terminal point.
pub fn make_boundary_conditions(
    constraints: &[Constraint],
    states: &[Variable],
    costates: &[Variable],
    parameters: &[Variable],
    coparameters: &[Variable],
    augmented_cost: &Expr,
    location: ConstraintLocation,
) -> Vec<Expr> {
    let sign = match location {
        ConstraintLocation::Initial => Expr::Const(-1.0),
        _ => Expr::Const(1.0),
    };
    let transversality = |vars: &[Variable], adjoints: &[Variable]| -> Vec<Expr> {
        vars.iter()
            .zip(adjoints)
            .map(|(x, lam)| {
                (sign.clone() * augmented_cost.derivative(&x.name) - lam.symbol()).simplify()
            })
            .collect()
    };
    constraints
        .iter()
        .map(|c| c.expr.clone())
        .chain(transversality(states, costates))
        .chain(transversality(parameters, coparameters))
        .collect()
}

/// Time condition `H + Σ ∂c/∂t` summed over every terminal constraint, `None`
/// when there is no terminal constraint.
pub fn make_time_bc(
    terminal_constraints: &[Constraint],
    hamiltonian: &Expr,
    independent_variable: &str,
) -> Option<Expr> {
    if terminal_constraints.is_empty() {
        return None;
    }
    let explicit_time = Expr::sum(
        terminal_constraints
            .iter()
            .map(|c| c.expr.derivative(independent_variable)),
    );
    Some((hamiltonian.clone() + explicit_time).simplify())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    fn var(name: &str, unit: &str, role: VariableRole) -> Variable {
        Variable::new(name, Expr::parse_expression(unit).unwrap(), role)
    }

    fn terminal(expr: &str, unit: &str) -> Constraint {
        Constraint {
            expr: Expr::parse_expression(expr).unwrap(),
            unit: Expr::parse_expression(unit).unwrap(),
            lower: None,
            upper: None,
            activator: None,
            location: ConstraintLocation::Terminal,
        }
    }

    #[test]
    fn test_augmented_cost_multipliers() {
        let cs = vec![terminal("x - x_f", "m"), terminal("v", "m/s")];
        let aug = make_augmented_cost(&Expr::Const(0.0), &Expr::var("s"), &cs, ConstraintLocation::Terminal);
        assert_eq!(aug.multipliers.len(), 2);
        assert_eq!(aug.multipliers[0].name, "lagrange_terminal_1");
        assert_eq!(aug.multipliers[1].name, "lagrange_terminal_2");
        assert_eq!(aug.multipliers[0].unit, Expr::var("s") / Expr::var("m"));
        assert_eq!(
            aug.expr.derivative("x"),
            Expr::var("lagrange_terminal_1")
        );
    }

    #[test]
    fn test_hamiltonian_and_costates() {
        let states = vec![var("x", "m", VariableRole::State), var("v", "m/s", VariableRole::State)];
        let rates = vec![Expr::var("v"), Expr::var("u")];
        let path_cost = Expr::parse_expression("u^2/2").unwrap();
        let h = make_hamiltonian(&states, &rates, &path_cost, &Expr::var("nd"), &Expr::var("s"));
        assert_eq!(h.costates[0].name, "lamx");
        assert_eq!(h.costates[1].name, "lamv");
        assert_eq!(h.costates[0].unit, Expr::var("nd") / Expr::var("m"));
        let expected = path_cost.clone() + (Expr::var("lamx") * Expr::var("v") + Expr::var("lamv") * Expr::var("u"));
        assert_eq!(h.expr, expected);
        let rates = make_costate_rates(&h.expr, &states);
        assert_eq!(rates[0], Expr::Const(0.0));
        assert_eq!(rates[1], -Expr::var("lamx"));
    }

    #[test]
    fn test_boundary_conditions_order_and_sign() {
        let states = vec![var("x", "m", VariableRole::State)];
        let costates = vec![var("lamx", "1/m", VariableRole::Costate)];
        let cs = vec![terminal("x - x_f", "m")];
        let aug = make_augmented_cost(&Expr::Const(0.0), &Expr::Const(1.0), &cs, ConstraintLocation::Initial);
        let bcs = make_boundary_conditions(&cs, &states, &costates, &[], &[], &aug.expr, ConstraintLocation::Initial);
        assert_eq!(bcs.len(), 2);
        assert_eq!(bcs[0], cs[0].expr);
        let values = HashMap::from([
            ("lagrange_initial_1".to_string(), 2.0),
            ("lamx".to_string(), 0.5),
        ]);
        // -nu - lamx
        assert_relative_eq!(bcs[1].eval_expression(&values).unwrap(), -2.5);
        let bcs = make_boundary_conditions(&cs, &states, &costates, &[], &[], &aug.expr, ConstraintLocation::Terminal);
        assert_relative_eq!(bcs[1].eval_expression(&values).unwrap(), 1.5);
    }

    #[test]
    fn test_time_bc_sums_explicit_time_derivatives() {
        let h = Expr::var("H");
        assert_eq!(make_time_bc(&[], &h, "t"), None);
        let free = vec![terminal("x - x_f", "m")];
        assert_eq!(make_time_bc(&free, &h, "t"), Some(h.clone()));
        let mixed = vec![terminal("x - 1", "m"), terminal("t - 2", "s"), terminal("v - 3*t", "m/s")];
        let bc = make_time_bc(&mixed, &h, "t").unwrap();
        let values = HashMap::from([("H".to_string(), 0.5)]);
        // 0.5 + 0 + 1 - 3
        assert_relative_eq!(bc.eval_expression(&values).unwrap(), -1.5);
    }
}
