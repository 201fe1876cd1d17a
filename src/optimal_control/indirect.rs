//! # Indirect transcription
//!
//! Converts an [`Ocp`] into a BVP through Pontryagin's Minimum Principle.
//!
//! Stages, in order: workspace, cost units, quantities, path constraints
//! (penalty or relaxation), terminal constraint partition, augmented costs,
//! Hamiltonian and costates, boundary conditions, control law (closed form or
//! DAE), time normalization, descriptor.
//!
//! The BVP lives on normalized time `τ ∈ [0, 1]`, `t = τ·_tf`: every rate is
//! multiplied by `_tf`, explicit time in the rates becomes `t·_tf`, initial
//! conditions are taken at `t = 0` and terminal conditions at `t = _tf`.
//!
//! # Example
//! ```
//! use RustedPMP::optimal_control::indirect::{ocp_to_bvp, TranscriptionOptions};
//! use RustedPMP::optimal_control::ocp::Ocp;
//! let ocp = Ocp::new("double_integrator")
//!     .independent("t", "s")
//!     .state("x", "v", "m")
//!     .state("v", "u", "m/s")
//!     .control("u", "m/s^2")
//!     .path_cost("u^2/2", "m^2/s^4")
//!     .initial_constraint("x", "m")
//!     .initial_constraint("v", "m/s")
//!     .terminal_constraint("x - 1", "m")
//!     .terminal_constraint("v", "m/s")
//!     .terminal_constraint("t - 1", "s");
//! let bvp = ocp_to_bvp(&ocp, &TranscriptionOptions::default()).unwrap();
//! assert_eq!(bvp.descriptor.num_states, 4);
//! assert_eq!(bvp.descriptor.control_options.len(), 1);
//! ```
use crate::optimal_control::constraints::{
    Dynamics, partition_terminal, relax_path_constraint, utm_path,
};
use crate::optimal_control::control_law::{make_control_dae, make_control_law, make_dhdu};
use crate::optimal_control::descriptor::{ControlOption, ProblemDescriptor};
use crate::optimal_control::errors::{TranscriptionError, TranscriptionResult};
use crate::optimal_control::guess_mapping::{ControlEvaluator, GuessMapper};
use crate::optimal_control::hamiltonian::{
    make_augmented_cost, make_boundary_conditions, make_costate_rates, make_costates,
    make_hamiltonian, make_time_bc,
};
use crate::optimal_control::ocp::{ConstraintLocation, Ocp};
use crate::optimal_control::quantities::{apply_quantities, resolve_quantities};
use crate::optimal_control::workspace::{Constraint, Variable, VariableRole, init_workspace, names};
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_solve::{EquationSolver, NativeSolver, SolutionBranch};
use itertools::Itertools;
use log::{debug, info};
use std::collections::HashMap;
use std::str::FromStr;
use strum_macros::{Display, EnumString};

/// Name of the free final time parameter.
pub const FINAL_TIME: &str = "_tf";
const METHOD: &str = "brysonho";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ControlMethod {
    /// closed-form solution of ∂H/∂u = 0
    #[default]
    Pmp,
    /// controls integrated as differential-algebraic states
    Icrm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PathConstraintMethod {
    /// smooth penalty added to the path cost
    #[default]
    Utm,
    /// differential-algebraic relaxation, needs `ControlMethod::Icrm`
    Icrm,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionOptions {
    pub control_method: ControlMethod,
    pub path_constraint_method: PathConstraintMethod,
    /// bound of the order search of relaxed path constraints
    pub max_constraint_order: usize,
}

impl Default for TranscriptionOptions {
    fn default() -> Self {
        TranscriptionOptions {
            control_method: ControlMethod::Pmp,
            path_constraint_method: PathConstraintMethod::Utm,
            max_constraint_order: 4,
        }
    }
}

impl TranscriptionOptions {
    /// Options from method names, case-insensitive ("pmp", "icrm", "utm").
    pub fn from_names(control_method: &str, path_constraint_method: &str) -> TranscriptionResult<Self> {
        let control_method = ControlMethod::from_str(control_method).map_err(|_| {
            TranscriptionError::UnsupportedCombination(format!(
                "unknown control method \"{}\"",
                control_method
            ))
        })?;
        let path_constraint_method =
            PathConstraintMethod::from_str(path_constraint_method).map_err(|_| {
                TranscriptionError::UnsupportedCombination(format!(
                    "unknown path constraint method \"{}\"",
                    path_constraint_method
                ))
            })?;
        Ok(TranscriptionOptions {
            control_method,
            path_constraint_method,
            ..Default::default()
        })
    }

    pub fn with_max_constraint_order(mut self, max_constraint_order: usize) -> Self {
        self.max_constraint_order = max_constraint_order;
        self
    }
}

/// Output of one transcription.
#[derive(Debug, Clone)]
pub struct Transcription {
    pub descriptor: ProblemDescriptor,
    /// closed-form branches, empty under relaxation
    pub control_law: Vec<SolutionBranch>,
    /// not bound to a control law yet
    pub guess_mapper: GuessMapper,
}

impl Transcription {
    /// The guess mapper bound to the descriptor's own control law.
    pub fn bound_guess_mapper(&self) -> TranscriptionResult<GuessMapper> {
        let evaluator = ControlEvaluator::from_descriptor(&self.descriptor)?;
        Ok(self.guess_mapper.clone().bind(evaluator))
    }
}

/// Transcribes with the built-in [`NativeSolver`].
pub fn ocp_to_bvp(ocp: &Ocp, options: &TranscriptionOptions) -> TranscriptionResult<Transcription> {
    ocp_to_bvp_with_solver(ocp, options, &NativeSolver::new())
}

fn path_bounds(c: &Constraint) -> TranscriptionResult<(&Expr, &Expr, &Expr)> {
    match (&c.lower, &c.upper, &c.activator) {
        (Some(l), Some(u), Some(a)) => Ok((l, u, a)),
        _ => Err(TranscriptionError::Configuration(format!(
            "path constraint `{}` needs lower, upper and activator",
            c.expr
        ))),
    }
}

fn strings<'a, I: IntoIterator<Item = &'a Expr>>(exprs: I) -> Vec<String> {
    exprs.into_iter().map(|e| e.to_string()).collect()
}

fn units<'a, I: IntoIterator<Item = &'a Variable>>(vars: I) -> Vec<String> {
    vars.into_iter().map(|v| v.unit.to_string()).collect()
}

/// Transcribes `ocp` solving the stationarity condition with `solver`.
///
/// # Errors
/// - [`TranscriptionError::Configuration`] if no cost is defined, or the
///   definition is inconsistent
/// - [`TranscriptionError::UnsupportedCombination`] for relaxed path
///   constraints without the relaxation control method
/// - [`TranscriptionError::ConstraintOrderExceeded`] from the order search
/// - [`TranscriptionError::ControlLawResolution`] if no control law is found
pub fn ocp_to_bvp_with_solver(
    ocp: &Ocp,
    options: &TranscriptionOptions,
    solver: &dyn EquationSolver,
) -> TranscriptionResult<Transcription> {
    info!(
        "transcribing `{}`: control method {}, path constraint method {}",
        ocp.name, options.control_method, options.path_constraint_method
    );
    if options.path_constraint_method == PathConstraintMethod::Icrm
        && options.control_method != ControlMethod::Icrm
    {
        return Err(TranscriptionError::UnsupportedCombination(
            "ICRM path constraints must be used with ICRM control method".to_string(),
        ));
    }

    let mut ws = init_workspace(ocp)?;
    let t = ws.independent_variable.clone();
    let t_units = ws.independent_variable_units.clone();

    let cost_units = if ws.initial_cost.is_defined() {
        ws.initial_cost.unit.clone()
    } else if ws.terminal_cost.is_defined() {
        ws.terminal_cost.unit.clone()
    } else if ws.path_cost.is_defined() {
        (ws.path_cost.unit.clone() * t_units.clone()).simplify()
    } else {
        return Err(TranscriptionError::Configuration(
            "initial, path, and terminal cost functions are not defined".to_string(),
        ));
    };
    let cost_per_time = (cost_units.clone() / t_units.clone()).simplify();
    debug!("cost units: {}", cost_units);

    let resolved = resolve_quantities(&ws.quantities)?;
    apply_quantities(&mut ws, &resolved);

    // path constraints
    let mut path_cost = ws.path_cost.expr.clone();
    let mut states = ws.states.clone();
    let mut rates = ws.states_rates.clone();
    let mut controls = ws.controls.clone();
    let mut algebraic_terms = Vec::new();
    let path_constraints: Vec<Constraint> = ws
        .constraints_at(ConstraintLocation::Path)
        .into_iter()
        .cloned()
        .collect();
    match options.path_constraint_method {
        PathConstraintMethod::Utm => {
            for c in &path_constraints {
                let (lower, upper, activator) = path_bounds(c)?;
                path_cost = path_cost + utm_path(&c.expr, lower, upper, activator);
            }
        }
        PathConstraintMethod::Icrm => {
            let state_names = ws.state_names();
            let control_names = ws.control_names();
            let dynamics = Dynamics {
                states: &state_names,
                rates: &ws.states_rates,
                controls: &control_names,
                independent_variable: &t,
                independent_variable_units: &t_units,
                cost_per_time_units: &cost_per_time,
            };
            for (k, c) in path_constraints.iter().enumerate() {
                let relaxed = relax_path_constraint(k + 1, c, &dynamics, options.max_constraint_order)?;
                path_cost = path_cost + relaxed.path_cost_term.clone();
                algebraic_terms.push(relaxed.multiplier() * relaxed.algebraic_equation.clone());
                states.extend(relaxed.xi_states);
                rates.extend(relaxed.xi_rates);
                controls.extend(relaxed.controls);
            }
        }
    }
    if !path_constraints.is_empty() {
        info!(
            "{} path constraint(s) embedded with {}",
            path_constraints.len(),
            options.path_constraint_method
        );
    }

    // boundary constraints
    let initial: Vec<Constraint> = ws
        .constraints_at(ConstraintLocation::Initial)
        .into_iter()
        .cloned()
        .collect();
    let terminal: Vec<Constraint> = ws
        .constraints_at(ConstraintLocation::Terminal)
        .into_iter()
        .cloned()
        .collect();
    let (terminal_to_augment, terminal_time) = partition_terminal(terminal, &t);
    let augmented_initial = make_augmented_cost(
        &ws.initial_cost.expr,
        &cost_units,
        &initial,
        ConstraintLocation::Initial,
    );
    let augmented_terminal = make_augmented_cost(
        &ws.terminal_cost.expr,
        &cost_units,
        &terminal_to_augment,
        ConstraintLocation::Terminal,
    );

    // Hamiltonian
    let built = make_hamiltonian(&states, &rates, &path_cost, &cost_units, &t_units);
    let hamiltonian = if algebraic_terms.is_empty() {
        built.expr
    } else {
        built.expr + Expr::sum(algebraic_terms)
    };
    let costates = built.costates;
    debug!("hamiltonian: {}", hamiltonian);
    let costates_rates = make_costate_rates(&hamiltonian, &states);
    let coparameters = make_costates(&ws.parameters, &cost_units, VariableRole::Coparameter);
    let coparameters_rates = make_costate_rates(&hamiltonian, &ws.parameters);

    let bc_initial = make_boundary_conditions(
        &initial,
        &states,
        &costates,
        &ws.parameters,
        &coparameters,
        &augmented_initial.expr,
        ConstraintLocation::Initial,
    );
    let mut bc_terminal = make_boundary_conditions(
        &terminal_to_augment,
        &states,
        &costates,
        &ws.parameters,
        &coparameters,
        &augmented_terminal.expr,
        ConstraintLocation::Terminal,
    );
    bc_terminal.extend(terminal_time.iter().map(|c| c.expr.clone()));
    let all_terminal: Vec<Constraint> = terminal_to_augment.iter().chain(&terminal_time).cloned().collect();
    if let Some(time_bc) = make_time_bc(&all_terminal, &hamiltonian, &t) {
        debug!("time condition: {}", time_bc);
        bc_terminal.push(time_bc);
    }

    // control law
    let control_names = names(&controls);
    let dhdu = make_dhdu(&hamiltonian, &control_names);
    let (control_law, dae_states, dae_rates, dae_units, dae_bc) = match options.control_method {
        ControlMethod::Pmp => (
            make_control_law(&dhdu, &control_names, solver)?,
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
        ),
        ControlMethod::Icrm => {
            let x_names: Vec<String> = names(&states).into_iter().chain(names(&costates)).collect();
            let x_rates: Vec<Expr> = rates.iter().chain(&costates_rates).cloned().collect();
            let dae = make_control_dae(&x_names, &x_rates, &control_names, &dhdu, &t)?;
            let dae_units: Vec<Variable> = controls
                .iter()
                .map(|u| Variable::new(&u.name, u.unit.clone(), VariableRole::DaeState))
                .collect();
            info!("{} control(s) integrated as DAE states", dae.states.len());
            (Vec::new(), dae.states, dae.rates, dae_units, dae.bc)
        }
    };
    let descriptor_controls = match options.control_method {
        ControlMethod::Pmp => control_names.clone(),
        ControlMethod::Icrm => Vec::new(),
    };

    // time normalization
    let tf = Expr::var(FINAL_TIME);
    let in_normalized_time = HashMap::from([(t.clone(), Expr::var(&t) * tf.clone())]);
    let at_start = HashMap::from([(t.clone(), Expr::Const(0.0))]);
    let at_final = HashMap::from([(t.clone(), tf.clone())]);
    let scale = |rate: &Expr| (tf.clone() * rate.substitute_map(&in_normalized_time)).simplify();
    let at = |bc: &Expr, point: &HashMap<String, Expr>| bc.substitute_map(point).simplify();

    let states_rates: Vec<String> = rates
        .iter()
        .chain(&costates_rates)
        .chain(&dae_rates)
        .map(|r| scale(r).to_string())
        .collect();
    let bc_terminal: Vec<String> = bc_terminal
        .iter()
        .chain(&dae_bc)
        .map(|bc| at(bc, &at_final).to_string())
        .collect();
    let bc_initial: Vec<String> = bc_initial.iter().map(|bc| at(bc, &at_start).to_string()).collect();

    let control_options: Vec<ControlOption> = control_law
        .iter()
        .map(|branch| {
            branch
                .iter()
                .map(|(u, law)| (u.clone(), law.to_string()))
                .collect()
        })
        .collect();

    let nondynamical: Vec<&Variable> = augmented_initial
        .multipliers
        .iter()
        .chain(&augmented_terminal.multipliers)
        .collect();
    let descriptor = ProblemDescriptor {
        method: METHOD.to_string(),
        problem_name: ws.problem_name.clone(),
        independent_variable: t.clone(),
        independent_variable_units: t_units.to_string(),
        states: names(&states)
            .into_iter()
            .chain(names(&costates))
            .chain(dae_states.iter().cloned())
            .collect(),
        states_rates,
        states_units: units(states.iter().chain(&costates).chain(&dae_units)),
        quads: names(&coparameters),
        quads_rates: coparameters_rates.iter().map(|r| scale(r).to_string()).collect(),
        quads_units: units(&coparameters),
        constants: names(&ws.constants),
        constants_units: units(&ws.constants),
        constants_values: ws.constants_values.clone(),
        constants_of_motion: names(&ws.constants_of_motion),
        dynamical_parameters: names(&ws.parameters)
            .into_iter()
            .chain(std::iter::once(FINAL_TIME.to_string()))
            .collect(),
        dynamical_parameters_units: units(&ws.parameters)
            .into_iter()
            .chain(std::iter::once(t_units.to_string()))
            .collect(),
        nondynamical_parameters: nondynamical.iter().map(|v| v.name.clone()).collect(),
        nondynamical_parameters_units: units(nondynamical.iter().copied()),
        control_list: descriptor_controls.clone(),
        controls: descriptor_controls.clone(),
        hamiltonian: hamiltonian.to_string(),
        hamiltonian_units: built.unit.to_string(),
        num_states: states.len() + costates.len(),
        dHdu: strings(&dhdu),
        bc_initial,
        bc_terminal,
        control_options,
        num_controls: descriptor_controls.len(),
    };
    info!(
        "`{}` transcribed: {} states, {} initial and {} terminal conditions, {} control option(s)",
        descriptor.problem_name,
        descriptor.states.len(),
        descriptor.bc_initial.len(),
        descriptor.bc_terminal.len(),
        descriptor.control_options.len()
    );
    debug!("states: {}", descriptor.states.iter().join(", "));

    let guess_mapper = GuessMapper::new(costates.len(), dae_states.len(), nondynamical.len());
    Ok(Transcription {
        descriptor,
        control_law,
        guess_mapper,
    })
}
