//! # Problem descriptor
//!
//! String-serialized result of the transcription, handed to the numeric BVP
//! solver. Every expression-valued entry is in the format of
//! [`symbolic_serialize`](crate::symbolic::symbolic_serialize) and parses back
//! with [`Expr::parse_expression`](crate::symbolic::symbolic_engine::Expr::parse_expression).
use crate::optimal_control::errors::{TranscriptionError, TranscriptionResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One control-law branch: control name -> expression string.
pub type ControlOption = BTreeMap<String, String>;

/// Fields are declared in the order they are written out; the array of
/// branch tables comes last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDescriptor {
    pub method: String,
    pub problem_name: String,
    pub independent_variable: String,
    pub independent_variable_units: String,
    pub states: Vec<String>,
    pub states_rates: Vec<String>,
    pub states_units: Vec<String>,
    pub quads: Vec<String>,
    pub quads_rates: Vec<String>,
    pub quads_units: Vec<String>,
    pub constants: Vec<String>,
    pub constants_units: Vec<String>,
    pub constants_values: Vec<f64>,
    pub constants_of_motion: Vec<String>,
    pub dynamical_parameters: Vec<String>,
    pub dynamical_parameters_units: Vec<String>,
    pub nondynamical_parameters: Vec<String>,
    pub nondynamical_parameters_units: Vec<String>,
    pub control_list: Vec<String>,
    pub controls: Vec<String>,
    pub hamiltonian: String,
    pub hamiltonian_units: String,
    /// states plus costates, without DAE states
    pub num_states: usize,
    pub dHdu: Vec<String>,
    pub bc_initial: Vec<String>,
    /// terminal conditions followed by the DAE conditions
    pub bc_terminal: Vec<String>,
    pub num_controls: usize,
    pub control_options: Vec<ControlOption>,
}

/// Value of one descriptor entry.
#[derive(Debug, Clone, PartialEq)]
pub enum DescriptorValue {
    Text(String),
    List(Vec<String>),
    Numbers(Vec<f64>),
    Count(usize),
    Branches(Vec<ControlOption>),
}

impl ProblemDescriptor {
    /// Flat key -> value view, keyed like the solver expects.
    pub fn to_map(&self) -> BTreeMap<&'static str, DescriptorValue> {
        use DescriptorValue::*;
        let list = |v: &Vec<String>| List(v.clone());
        BTreeMap::from([
            ("method", Text(self.method.clone())),
            ("problem_name", Text(self.problem_name.clone())),
            ("independent_variable", Text(self.independent_variable.clone())),
            (
                "independent_variable_units",
                Text(self.independent_variable_units.clone()),
            ),
            ("states", list(&self.states)),
            ("states_rates", list(&self.states_rates)),
            ("states_units", list(&self.states_units)),
            ("quads", list(&self.quads)),
            ("quads_rates", list(&self.quads_rates)),
            ("quads_units", list(&self.quads_units)),
            ("constants", list(&self.constants)),
            ("constants_units", list(&self.constants_units)),
            ("constants_values", Numbers(self.constants_values.clone())),
            ("constants_of_motion", list(&self.constants_of_motion)),
            ("dynamical_parameters", list(&self.dynamical_parameters)),
            (
                "dynamical_parameters_units",
                list(&self.dynamical_parameters_units),
            ),
            ("nondynamical_parameters", list(&self.nondynamical_parameters)),
            (
                "nondynamical_parameters_units",
                list(&self.nondynamical_parameters_units),
            ),
            ("control_list", list(&self.control_list)),
            ("controls", list(&self.controls)),
            ("hamiltonian", Text(self.hamiltonian.clone())),
            ("hamiltonian_units", Text(self.hamiltonian_units.clone())),
            ("num_states", Count(self.num_states)),
            ("dHdu", list(&self.dHdu)),
            ("bc_initial", list(&self.bc_initial)),
            ("bc_terminal", list(&self.bc_terminal)),
            ("control_options", Branches(self.control_options.clone())),
            ("num_controls", Count(self.num_controls)),
        ])
    }

    /// The descriptor as a TOML document, one top-level key per entry.
    pub fn to_toml_string(&self) -> TranscriptionResult<String> {
        toml::to_string(self)
            .map_err(|e| TranscriptionError::Configuration(format!("cannot render descriptor: {}", e)))
    }

    pub fn from_toml_str(document: &str) -> TranscriptionResult<ProblemDescriptor> {
        toml::from_str(document)
            .map_err(|e| TranscriptionError::Configuration(format!("invalid descriptor: {}", e)))
    }
}
