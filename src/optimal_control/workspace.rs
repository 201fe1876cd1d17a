//! # Workspace
//!
//! Flat record of the parsed problem. Every later stage of the transcription
//! reads and extends a [`Workspace`] instead of the raw [`Ocp`].
//!
//! ## Key Methods
//! - `init_workspace()` - parse every expression and unit of an [`Ocp`], check names
//! - `Workspace::constraints_at()` - constraints of one location, in declaration order
//! - `Workspace::state_names()` / `control_names()` / `parameter_names()`
use crate::optimal_control::errors::{TranscriptionError, TranscriptionResult};
use crate::optimal_control::ocp::{ConstraintLocation, CostDef, Ocp};
use crate::symbolic::symbolic_engine::Expr;
use log::debug;
use std::collections::HashSet;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum VariableRole {
    State,
    Control,
    Parameter,
    Constant,
    Costate,
    Coparameter,
    DaeState,
    LagrangeMultiplier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub unit: Expr,
    pub role: VariableRole,
}

impl Variable {
    pub fn new(name: &str, unit: Expr, role: VariableRole) -> Self {
        Variable {
            name: name.to_string(),
            unit,
            role,
        }
    }

    pub fn symbol(&self) -> Expr {
        Expr::var(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub expr: Expr,
    pub unit: Expr,
    pub lower: Option<Expr>,
    pub upper: Option<Expr>,
    pub activator: Option<Expr>,
    pub location: ConstraintLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cost {
    pub expr: Expr,
    pub unit: Expr,
}

impl Cost {
    pub fn is_defined(&self) -> bool {
        !self.expr.simplify().is_zero()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    pub problem_name: String,
    pub independent_variable: String,
    pub independent_variable_units: Expr,
    pub states: Vec<Variable>,
    /// positionally aligned with `states`
    pub states_rates: Vec<Expr>,
    pub controls: Vec<Variable>,
    pub constants: Vec<Variable>,
    pub constants_values: Vec<f64>,
    pub constants_of_motion: Vec<Variable>,
    pub constants_of_motion_values: Vec<Expr>,
    pub parameters: Vec<Variable>,
    pub quantities: Vec<(String, Expr)>,
    pub constraints: Vec<Constraint>,
    pub initial_cost: Cost,
    pub path_cost: Cost,
    pub terminal_cost: Cost,
}

impl Workspace {
    pub fn constraints_at(&self, location: ConstraintLocation) -> Vec<&Constraint> {
        self.constraints
            .iter()
            .filter(|c| c.location == location)
            .collect()
    }

    pub fn state_names(&self) -> Vec<String> {
        names(&self.states)
    }

    pub fn control_names(&self) -> Vec<String> {
        names(&self.controls)
    }

    pub fn parameter_names(&self) -> Vec<String> {
        names(&self.parameters)
    }
}

pub fn names(vars: &[Variable]) -> Vec<String> {
    vars.iter().map(|v| v.name.clone()).collect()
}

/// Parses the problem definition into a [`Workspace`].
///
/// # Errors
/// - [`TranscriptionError::Symbolic`] for any expression or unit that does not parse
/// - [`TranscriptionError::Configuration`] for duplicated symbol names, or a
///   path constraint without bounds or activator
pub fn init_workspace(ocp: &Ocp) -> TranscriptionResult<Workspace> {
    let parse = Expr::parse_expression;
    let mut seen: HashSet<&str> = HashSet::new();
    let declared = std::iter::once(ocp.independent_variable.as_str())
        .chain(ocp.states.iter().map(|s| s.name.as_str()))
        .chain(ocp.controls.iter().map(|s| s.name.as_str()))
        .chain(ocp.constants.iter().map(|s| s.name.as_str()))
        .chain(ocp.parameters.iter().map(|s| s.name.as_str()))
        .chain(ocp.quantities.iter().map(|s| s.name.as_str()));
    for name in declared {
        if !seen.insert(name) {
            return Err(TranscriptionError::Configuration(format!(
                "symbol `{}` is declared more than once",
                name
            )));
        }
    }

    let mut states = Vec::with_capacity(ocp.states.len());
    let mut states_rates = Vec::with_capacity(ocp.states.len());
    for s in &ocp.states {
        states.push(Variable::new(&s.name, parse(&s.units)?, VariableRole::State));
        states_rates.push(parse(&s.rate)?);
    }
    let controls = ocp
        .controls
        .iter()
        .map(|c| -> TranscriptionResult<Variable> {
            Ok(Variable::new(&c.name, parse(&c.units)?, VariableRole::Control))
        })
        .collect::<TranscriptionResult<Vec<_>>>()?;
    let constants = ocp
        .constants
        .iter()
        .map(|c| -> TranscriptionResult<Variable> {
            Ok(Variable::new(&c.name, parse(&c.units)?, VariableRole::Constant))
        })
        .collect::<TranscriptionResult<Vec<_>>>()?;
    let constants_values = ocp.constants.iter().map(|c| c.value).collect();
    let mut constants_of_motion = Vec::new();
    let mut constants_of_motion_values = Vec::new();
    for c in &ocp.constants_of_motion {
        constants_of_motion.push(Variable::new(&c.name, parse(&c.units)?, VariableRole::Constant));
        constants_of_motion_values.push(parse(&c.expr)?);
    }
    let parameters = ocp
        .parameters
        .iter()
        .map(|p| -> TranscriptionResult<Variable> {
            Ok(Variable::new(&p.name, parse(&p.units)?, VariableRole::Parameter))
        })
        .collect::<TranscriptionResult<Vec<_>>>()?;
    let quantities = ocp
        .quantities
        .iter()
        .map(|q| -> TranscriptionResult<(String, Expr)> { Ok((q.name.clone(), parse(&q.expr)?)) })
        .collect::<TranscriptionResult<Vec<_>>>()?;

    let mut constraints = Vec::with_capacity(ocp.constraints.len());
    for c in &ocp.constraints {
        let optional = |s: &Option<String>| s.as_deref().map(parse).transpose();
        let constraint = Constraint {
            expr: parse(&c.expr)?,
            unit: parse(&c.units)?,
            lower: optional(&c.lower)?,
            upper: optional(&c.upper)?,
            activator: optional(&c.activator)?,
            location: c.location,
        };
        if constraint.location == ConstraintLocation::Path
            && (constraint.lower.is_none()
                || constraint.upper.is_none()
                || constraint.activator.is_none())
        {
            return Err(TranscriptionError::Configuration(format!(
                "path constraint `{}` needs lower, upper and activator",
                c.expr
            )));
        }
        constraints.push(constraint);
    }

    let cost = |def: &CostDef| -> TranscriptionResult<Cost> {
        Ok(Cost {
            expr: parse(&def.expr)?,
            unit: parse(&def.units)?,
        })
    };
    let ws = Workspace {
        problem_name: ocp.name.clone(),
        independent_variable: ocp.independent_variable.clone(),
        independent_variable_units: parse(&ocp.independent_variable_units)?,
        states,
        states_rates,
        controls,
        constants,
        constants_values,
        constants_of_motion,
        constants_of_motion_values,
        parameters,
        quantities,
        constraints,
        initial_cost: cost(&ocp.initial_cost)?,
        path_cost: cost(&ocp.path_cost)?,
        terminal_cost: cost(&ocp.terminal_cost)?,
    };
    debug!(
        "workspace of `{}`: {} states, {} controls, {} parameters, {} constraints",
        ws.problem_name,
        ws.states.len(),
        ws.controls.len(),
        ws.parameters.len(),
        ws.constraints.len()
    );
    Ok(ws)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::symbolic_errors::SymbolicError;

    fn ocp() -> Ocp {
        Ocp::new("p")
            .independent("t", "s")
            .state("x", "v", "m")
            .state("v", "u", "m/s")
            .control("u", "m/s^2")
            .constant("x_f", 1.0, "m")
            .initial_constraint("x", "m")
            .terminal_constraint("x - x_f", "m")
            .path_constraint("u", "m/s^2", "-1", "1", "eps")
            .path_cost("u^2/2", "m^2/s^4")
    }

    #[test]
    fn test_init_workspace() {
        let ws = init_workspace(&ocp()).unwrap();
        assert_eq!(ws.state_names(), vec!["x", "v"]);
        assert_eq!(ws.states_rates[1], Expr::var("u"));
        assert_eq!(ws.states[1].unit, Expr::var("m") / Expr::var("s"));
        assert_eq!(ws.constraints_at(ConstraintLocation::Terminal).len(), 1);
        assert_eq!(ws.constraints_at(ConstraintLocation::Path).len(), 1);
        assert!(ws.path_cost.is_defined());
        assert!(!ws.initial_cost.is_defined());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let bad = ocp().control("x", "m");
        assert!(matches!(
            init_workspace(&bad),
            Err(TranscriptionError::Configuration(_))
        ));
    }

    #[test]
    fn test_parse_error_surfaces() {
        let bad = ocp().state("w", "v +", "m");
        assert!(matches!(
            init_workspace(&bad),
            Err(TranscriptionError::Symbolic(SymbolicError::Parse { .. }))
        ));
    }

    #[test]
    fn test_path_constraint_needs_bounds() {
        let mut bad = ocp();
        bad.constraints[2].upper = None;
        assert!(matches!(
            init_workspace(&bad),
            Err(TranscriptionError::Configuration(_))
        ));
    }
}
