//! # Guess mapping
//!
//! Moves a solution between OCP space (physical time, separate costate and
//! control arrays) and BVP space (time on `[0, 1]`, costates appended to the
//! state columns, final time as the last dynamical parameter).
//!
//! ## Key Structures
//! - [`Solution`] - discretized trajectory with its parameters
//! - [`ControlLaw`] - numeric control law bound to the mapper
//! - [`GuessMapper`] - `map` (OCP -> BVP) and `map_inverse` (BVP -> OCP)
//! - [`ControlEvaluator`] - control law built from a problem descriptor; picks
//!   the branch with the smallest Hamiltonian at each node
use crate::optimal_control::descriptor::ProblemDescriptor;
use crate::optimal_control::errors::{TranscriptionError, TranscriptionResult};
use crate::symbolic::symbolic_engine::Expr;
use log::debug;
use nalgebra::{DMatrix, DVector};
use std::collections::HashMap;
use std::rc::Rc;

/// Discretized solution. Rows of the matrices are grid nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub t: DVector<f64>,
    pub y: DMatrix<f64>,
    pub dual: DMatrix<f64>,
    pub u: DMatrix<f64>,
    pub dynamical_parameters: DVector<f64>,
    pub nondynamical_parameters: DVector<f64>,
    pub constants: DVector<f64>,
}

/// Control values at one node from the state row, the dynamical parameters
/// and the constants.
pub trait ControlLaw {
    fn compute_control(
        &self,
        y: &DVector<f64>,
        dynamical_parameters: &DVector<f64>,
        constants: &DVector<f64>,
    ) -> TranscriptionResult<DVector<f64>>;

    /// Control at a node whose physical time `t` is known. Laws that do not
    /// depend on time keep the default.
    fn compute_control_at(
        &self,
        t: f64,
        y: &DVector<f64>,
        dynamical_parameters: &DVector<f64>,
        constants: &DVector<f64>,
    ) -> TranscriptionResult<DVector<f64>> {
        let _ = t;
        self.compute_control(y, dynamical_parameters, constants)
    }
}

impl<F> ControlLaw for F
where
    F: Fn(&DVector<f64>, &DVector<f64>, &DVector<f64>) -> DVector<f64>,
{
    fn compute_control(
        &self,
        y: &DVector<f64>,
        dynamical_parameters: &DVector<f64>,
        constants: &DVector<f64>,
    ) -> TranscriptionResult<DVector<f64>> {
        Ok(self(y, dynamical_parameters, constants))
    }
}

/// Forward and inverse map of one transcription.
#[derive(Clone)]
pub struct GuessMapper {
    num_costates: usize,
    /// controls integrated as DAE states, 0 unless the relaxation control method is used
    num_dae: usize,
    num_nondynamical: usize,
    control_law: Option<Rc<dyn ControlLaw>>,
}

impl std::fmt::Debug for GuessMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuessMapper")
            .field("num_costates", &self.num_costates)
            .field("num_dae", &self.num_dae)
            .field("num_nondynamical", &self.num_nondynamical)
            .field("bound", &self.control_law.is_some())
            .finish()
    }
}

impl GuessMapper {
    pub fn new(num_costates: usize, num_dae: usize, num_nondynamical: usize) -> Self {
        GuessMapper {
            num_costates,
            num_dae,
            num_nondynamical,
            control_law: None,
        }
    }

    pub fn bind<L: ControlLaw + 'static>(mut self, control_law: L) -> Self {
        self.control_law = Some(Rc::new(control_law));
        self
    }

    pub fn is_bound(&self) -> bool {
        self.control_law.is_some()
    }

    fn law(&self) -> TranscriptionResult<&Rc<dyn ControlLaw>> {
        self.control_law
            .as_ref()
            .ok_or(TranscriptionError::GuessMapperNotBound)
    }

    /// OCP space -> BVP space.
    pub fn map(&self, sol: &Solution) -> TranscriptionResult<Solution> {
        self.law()?;
        if sol.dual.ncols() != self.num_costates {
            return Err(TranscriptionError::Configuration(format!(
                "solution has {} costate columns, expected {}",
                sol.dual.ncols(),
                self.num_costates
            )));
        }
        if self.num_dae > 0 && sol.u.ncols() != self.num_dae {
            return Err(TranscriptionError::Configuration(format!(
                "solution has {} control columns, expected {}",
                sol.u.ncols(),
                self.num_dae
            )));
        }
        let nodes = sol.t.len();
        let t_final = final_time(&sol.t)?;
        let mut blocks = vec![&sol.y, &sol.dual];
        if self.num_dae > 0 {
            blocks.push(&sol.u);
        }
        let y = hstack(nodes, &blocks)?;
        let dynamical_parameters = DVector::from_iterator(
            sol.dynamical_parameters.len() + 1,
            sol.dynamical_parameters.iter().copied().chain(std::iter::once(t_final)),
        );
        debug!("guess mapped to BVP space: {} nodes, {} columns", nodes, y.ncols());
        Ok(Solution {
            t: &sol.t / t_final,
            y,
            dual: DMatrix::zeros(nodes, 0),
            u: DMatrix::zeros(nodes, 0),
            dynamical_parameters,
            nondynamical_parameters: DVector::from_element(self.num_nondynamical, 1.0),
            constants: sol.constants.clone(),
        })
    }

    /// BVP space -> OCP space. Controls are recomputed from the bound law at
    /// every node, or read back from the DAE columns under relaxation.
    pub fn map_inverse(&self, sol: &Solution) -> TranscriptionResult<Solution> {
        let law = self.law()?;
        let nodes = sol.t.len();
        let ncols = sol.y.ncols();
        let trailing = self.num_costates + self.num_dae;
        if ncols < trailing {
            return Err(TranscriptionError::Configuration(format!(
                "solution has {} columns, expected at least {}",
                ncols, trailing
            )));
        }
        let n_params = sol.dynamical_parameters.len();
        if n_params == 0 {
            return Err(TranscriptionError::Configuration(
                "solution carries no final time parameter".to_string(),
            ));
        }
        let t_final = sol.dynamical_parameters[n_params - 1];
        let n_states = ncols - trailing;

        let u = if self.num_dae == 0 {
            let mut rows = Vec::with_capacity(nodes);
            for (tau, row) in sol.t.iter().zip(sol.y.row_iter()) {
                let yi = row.transpose();
                rows.push(law.compute_control_at(
                    tau * t_final,
                    &yi,
                    &sol.dynamical_parameters,
                    &sol.constants,
                )?);
            }
            let nu = rows.first().map_or(0, |r| r.len());
            if rows.iter().any(|r| r.len() != nu) {
                return Err(TranscriptionError::Configuration(
                    "control law returned vectors of different lengths".to_string(),
                ));
            }
            DMatrix::from_fn(nodes, nu, |i, j| rows[i][j])
        } else {
            sol.y.columns(ncols - self.num_dae, self.num_dae).into_owned()
        };

        Ok(Solution {
            t: &sol.t * t_final,
            y: sol.y.columns(0, n_states).into_owned(),
            dual: sol.y.columns(n_states, self.num_costates).into_owned(),
            u,
            dynamical_parameters: sol.dynamical_parameters.rows(0, n_params - 1).into_owned(),
            nondynamical_parameters: DVector::zeros(0),
            constants: sol.constants.clone(),
        })
    }
}

fn final_time(t: &DVector<f64>) -> TranscriptionResult<f64> {
    match t.len() {
        0 => Err(TranscriptionError::Configuration(
            "solution has an empty time grid".to_string(),
        )),
        n if t[n - 1] == 0.0 => Err(TranscriptionError::Configuration(
            "final time is zero, cannot normalize the time grid".to_string(),
        )),
        n => Ok(t[n - 1]),
    }
}

fn hstack(nodes: usize, blocks: &[&DMatrix<f64>]) -> TranscriptionResult<DMatrix<f64>> {
    let mut columns = Vec::new();
    for block in blocks {
        if block.ncols() == 0 {
            continue;
        }
        if block.nrows() != nodes {
            return Err(TranscriptionError::Configuration(format!(
                "block has {} rows, time grid has {} nodes",
                block.nrows(),
                nodes
            )));
        }
        columns.extend(block.column_iter().map(|c| c.into_owned()));
    }
    if columns.is_empty() {
        return Ok(DMatrix::zeros(nodes, 0));
    }
    Ok(DMatrix::from_columns(&columns))
}

/// Numeric control law read from a problem descriptor.
///
/// A single branch is returned as is. With several branches every one is
/// evaluated and the one with the smallest finite Hamiltonian wins; when the
/// Hamiltonian cannot be evaluated (explicit time without a node time) the
/// first finite branch is used.
#[derive(Debug, Clone)]
pub struct ControlEvaluator {
    independent_variable: String,
    states: Vec<String>,
    dynamical_parameters: Vec<String>,
    constants: Vec<String>,
    controls: Vec<String>,
    /// per branch, one expression per control
    branches: Vec<Vec<Expr>>,
    hamiltonian: Expr,
}

impl ControlEvaluator {
    pub fn from_descriptor(descriptor: &ProblemDescriptor) -> TranscriptionResult<Self> {
        let controls = descriptor.controls.clone();
        let mut branches = Vec::with_capacity(descriptor.control_options.len());
        for option in &descriptor.control_options {
            let mut branch = Vec::with_capacity(controls.len());
            for u in &controls {
                let law = option.get(u).ok_or_else(|| {
                    TranscriptionError::Configuration(format!("control option has no law for `{}`", u))
                })?;
                branch.push(Expr::parse_expression(law)?);
            }
            branches.push(branch);
        }
        Ok(ControlEvaluator {
            independent_variable: descriptor.independent_variable.clone(),
            states: descriptor.states.clone(),
            dynamical_parameters: descriptor.dynamical_parameters.clone(),
            constants: descriptor.constants.clone(),
            controls,
            branches,
            hamiltonian: Expr::parse_expression(&descriptor.hamiltonian)?,
        })
    }

    fn bind_values(
        &self,
        y: &DVector<f64>,
        dynamical_parameters: &DVector<f64>,
        constants: &DVector<f64>,
    ) -> HashMap<String, f64> {
        self.states
            .iter()
            .zip(y.iter())
            .chain(self.dynamical_parameters.iter().zip(dynamical_parameters.iter()))
            .chain(self.constants.iter().zip(constants.iter()))
            .map(|(name, value)| (name.clone(), *value))
            .collect()
    }

    fn select(&self, mut values: HashMap<String, f64>) -> TranscriptionResult<DVector<f64>> {
        if self.controls.is_empty() {
            return Ok(DVector::zeros(0));
        }
        if let [branch] = self.branches.as_slice() {
            let u = branch
                .iter()
                .map(|law| law.eval_expression(&values))
                .collect::<Result<Vec<f64>, _>>()?;
            if u.iter().any(|v| !v.is_finite()) {
                return Err(TranscriptionError::ControlLawResolution(
                    "control law is not finite at this node".to_string(),
                ));
            }
            return Ok(DVector::from_vec(u));
        }
        let mut best: Option<(f64, DVector<f64>)> = None;
        let mut fallback: Option<DVector<f64>> = None;
        let mut last_error = None;
        for branch in &self.branches {
            let candidate: Result<Vec<f64>, _> =
                branch.iter().map(|law| law.eval_expression(&values)).collect();
            let candidate = match candidate {
                Ok(c) if c.iter().all(|v| v.is_finite()) => c,
                Ok(_) => continue,
                Err(e) => {
                    last_error = Some(e);
                    continue;
                }
            };
            for (u, value) in self.controls.iter().zip(&candidate) {
                values.insert(u.clone(), *value);
            }
            let h = match self.hamiltonian.eval_expression(&values) {
                Ok(h) => h,
                Err(e) => {
                    debug!("branch kept without Hamiltonian comparison: {}", e);
                    fallback.get_or_insert_with(|| DVector::from_vec(candidate));
                    continue;
                }
            };
            if !h.is_finite() {
                continue;
            }
            if best.as_ref().is_none_or(|(best_h, _)| h < *best_h) {
                best = Some((h, DVector::from_vec(candidate)));
            }
        }
        match (best.map(|(_, u)| u).or(fallback), last_error) {
            (Some(u), _) => Ok(u),
            (None, Some(e)) => Err(e.into()),
            (None, None) => Err(TranscriptionError::ControlLawResolution(
                "no control branch gives a finite Hamiltonian".to_string(),
            )),
        }
    }
}

impl ControlLaw for ControlEvaluator {
    fn compute_control(
        &self,
        y: &DVector<f64>,
        dynamical_parameters: &DVector<f64>,
        constants: &DVector<f64>,
    ) -> TranscriptionResult<DVector<f64>> {
        self.select(self.bind_values(y, dynamical_parameters, constants))
    }

    fn compute_control_at(
        &self,
        t: f64,
        y: &DVector<f64>,
        dynamical_parameters: &DVector<f64>,
        constants: &DVector<f64>,
    ) -> TranscriptionResult<DVector<f64>> {
        let mut values = self.bind_values(y, dynamical_parameters, constants);
        values.insert(self.independent_variable.clone(), t);
        self.select(values)
    }
}
