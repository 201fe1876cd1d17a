//! # Control law resolution
//!
//! Either closed-form branches of `∂H/∂u = 0`, or, under relaxation, control
//! rates `u̇ = -(∂g/∂u)⁻¹·(∂g/∂X·Ẋ + ∂g/∂t)` with `g = ∂H/∂u` and the
//! components of `g` as algebraic boundary conditions.
use crate::optimal_control::errors::{TranscriptionError, TranscriptionResult};
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_errors::SymbolicError;
use crate::symbolic::symbolic_solve::{EquationSolver, SolutionBranch, solve_linear_system};
use log::{info, warn};

/// `∂H/∂u_i` for every control, simplified.
pub fn make_dhdu(hamiltonian: &Expr, controls: &[String]) -> Vec<Expr> {
    controls.iter().map(|u| hamiltonian.derivative(u)).collect()
}

/// Solves `dhdu = 0` for `controls`.
///
/// # Errors
/// [`TranscriptionError::ControlLawResolution`] when the solver finds no branch.
pub fn make_control_law(
    dhdu: &[Expr],
    controls: &[String],
    solver: &dyn EquationSolver,
) -> TranscriptionResult<Vec<SolutionBranch>> {
    if controls.is_empty() {
        return Ok(Vec::new());
    }
    info!("solving stationarity condition for {:?}", controls);
    let branches = solver.solve(dhdu, controls)?;
    if branches.is_empty() {
        let equations: Vec<String> = dhdu.iter().map(|e| e.to_string()).collect();
        return Err(TranscriptionError::ControlLawResolution(format!(
            "no solution of [{}] = 0 for {:?}",
            equations.join(", "),
            controls
        )));
    }
    info!("control found: {} branch(es)", branches.len());
    Ok(branches)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControlDae {
    /// the controls, now integrated as states
    pub states: Vec<String>,
    pub rates: Vec<Expr>,
    /// components of `∂H/∂u`, enforced at the boundary
    pub bc: Vec<Expr>,
}

/// Turns the controls into differential-algebraic states.
///
/// `states`/`rates` are the full differential state (states, costates and any
/// auxiliary states) with their rates.
///
/// # Errors
/// [`TranscriptionError::ControlLawResolution`] if `∂g/∂u` is structurally singular.
pub fn make_control_dae(
    states: &[String],
    rates: &[Expr],
    controls: &[String],
    dhdu: &[Expr],
    independent_variable: &str,
) -> TranscriptionResult<ControlDae> {
    let dgdu = Expr::jacobian(dhdu, controls);
    let rhs: Vec<Expr> = dhdu
        .iter()
        .map(|g| (-g.total_derivative(states, rates, Some(independent_variable))).simplify())
        .collect();
    let control_rates = solve_linear_system(dgdu, rhs).map_err(|e| match e {
        SymbolicError::SingularSystem { column } => {
            warn!("∂g/∂u is singular in the column of {}", controls[column]);
            TranscriptionError::ControlLawResolution(format!(
                "∂H/∂u does not determine the rate of `{}`",
                controls[column]
            ))
        }
        other => TranscriptionError::from(other),
    })?;
    Ok(ControlDae {
        states: controls.to_vec(),
        rates: control_rates,
        bc: dhdu.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::symbolic_solve::NativeSolver;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    #[test]
    fn test_dhdu_and_linear_law() {
        let h = Expr::parse_expression("u^2/2 + lamx*v + lamv*u").unwrap();
        let dhdu = make_dhdu(&h, &["u".to_string()]);
        let law = make_control_law(&dhdu, &["u".to_string()], &NativeSolver::new()).unwrap();
        assert_eq!(law.len(), 1);
        let u = law[0]["u"]
            .eval_expression(&HashMap::from([("lamv".to_string(), 3.0)]))
            .unwrap();
        assert_relative_eq!(u, -3.0);
    }

    #[test]
    fn test_unsolvable_stationarity() {
        // H linear in u: dH/du = lamv, u does not appear
        let h = Expr::parse_expression("1 + lamx*v + lamv*u").unwrap();
        let dhdu = make_dhdu(&h, &["u".to_string()]);
        assert!(matches!(
            make_control_law(&dhdu, &["u".to_string()], &NativeSolver::new()),
            Err(TranscriptionError::ControlLawResolution(_))
        ));
    }

    #[test]
    fn test_control_dae_rate() {
        // g = u + lamv, lamv' = -lamx, lamx' = 0  =>  u' = lamx
        let dhdu = vec![Expr::parse_expression("u + lamv").unwrap()];
        let states = vec!["x".to_string(), "v".to_string(), "lamx".to_string(), "lamv".to_string()];
        let rates = vec![
            Expr::var("v"),
            Expr::var("u"),
            Expr::Const(0.0),
            -Expr::var("lamx"),
        ];
        let dae = make_control_dae(&states, &rates, &["u".to_string()], &dhdu, "t").unwrap();
        assert_eq!(dae.states, vec!["u".to_string()]);
        assert_eq!(dae.rates, vec![Expr::var("lamx")]);
        assert_eq!(dae.bc, dhdu);
    }

    #[test]
    fn test_control_dae_singular() {
        let dhdu = vec![Expr::var("lamv")];
        let result = make_control_dae(&["lamv".to_string()], &[Expr::Const(0.0)], &["u".to_string()], &dhdu, "t");
        assert!(matches!(result, Err(TranscriptionError::ControlLawResolution(_))));
    }
}
