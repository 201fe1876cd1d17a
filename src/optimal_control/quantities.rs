//! Quantity resolution: named intermediate expressions are expanded until
//! only primitive symbols remain, then substituted everywhere in the workspace.
use crate::optimal_control::errors::{TranscriptionError, TranscriptionResult};
use crate::optimal_control::workspace::Workspace;
use crate::symbolic::symbolic_engine::Expr;
use log::debug;
use std::collections::HashMap;

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    InProgress,
    Done,
}

/// Expands every quantity in terms of non-quantity symbols.
///
/// # Errors
/// [`TranscriptionError::Configuration`] if quantities reference each other in a cycle.
pub fn resolve_quantities(quantities: &[(String, Expr)]) -> TranscriptionResult<HashMap<String, Expr>> {
    let definitions: HashMap<&str, &Expr> = quantities
        .iter()
        .map(|(name, expr)| (name.as_str(), expr))
        .collect();
    let mut marks: HashMap<String, Mark> = HashMap::new();
    let mut resolved: HashMap<String, Expr> = HashMap::new();
    for (name, _) in quantities {
        visit(name, &definitions, &mut marks, &mut resolved)?;
    }
    Ok(resolved)
}

fn visit(
    name: &str,
    definitions: &HashMap<&str, &Expr>,
    marks: &mut HashMap<String, Mark>,
    resolved: &mut HashMap<String, Expr>,
) -> TranscriptionResult<()> {
    match marks.get(name) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::InProgress) => {
            return Err(TranscriptionError::Configuration(format!(
                "quantity `{}` is defined in terms of itself",
                name
            )));
        }
        None => {}
    }
    marks.insert(name.to_string(), Mark::InProgress);
    let Some(expr) = definitions.get(name) else {
        return Ok(());
    };
    for dependency in expr.free_symbols() {
        if definitions.contains_key(dependency.as_str()) {
            visit(&dependency, definitions, marks, resolved)?;
        }
    }
    let expanded = expr.substitute_map(resolved);
    resolved.insert(name.to_string(), expanded);
    marks.insert(name.to_string(), Mark::Done);
    Ok(())
}

/// Substitutes the resolved quantities into state rates, costs, constraints
/// (expressions and bounds) and constants of motion.
pub fn apply_quantities(ws: &mut Workspace, resolved: &HashMap<String, Expr>) {
    if resolved.is_empty() {
        return;
    }
    debug!("substituting {} quantities", resolved.len());
    for rate in ws.states_rates.iter_mut() {
        *rate = rate.substitute_map(resolved);
    }
    for cost in [&mut ws.initial_cost, &mut ws.path_cost, &mut ws.terminal_cost] {
        cost.expr = cost.expr.substitute_map(resolved);
    }
    for constraint in ws.constraints.iter_mut() {
        constraint.expr = constraint.expr.substitute_map(resolved);
        for bound in [&mut constraint.lower, &mut constraint.upper, &mut constraint.activator] {
            if let Some(b) = bound {
                *b = b.substitute_map(resolved);
            }
        }
    }
    for value in ws.constants_of_motion_values.iter_mut() {
        *value = value.substitute_map(resolved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(name: &str, expr: &str) -> (String, Expr) {
        (name.to_string(), Expr::parse_expression(expr).unwrap())
    }

    #[test]
    fn test_transitive_resolution() {
        // declared out of dependency order on purpose
        let quantities = vec![q("drag", "0.5*rho*v^2"), q("rho", "rho0*exp(-h/H)")];
        let resolved = resolve_quantities(&quantities).unwrap();
        let expected = Expr::parse_expression("0.5*(rho0*exp(-h/H))*v^2").unwrap();
        assert_eq!(resolved["drag"], expected);
        assert!(!resolved["drag"].contains_variable("rho"));
    }

    #[test]
    fn test_cycle_is_configuration_error() {
        let quantities = vec![q("a", "b + 1"), q("b", "2*a")];
        assert!(matches!(
            resolve_quantities(&quantities),
            Err(TranscriptionError::Configuration(_))
        ));
        let quantities = vec![q("a", "a*x")];
        assert!(resolve_quantities(&quantities).is_err());
    }
}
