//! # Problem files
//!
//! Reads an [`Ocp`] (and optionally the transcription options) from a TOML
//! document:
//!
//! ```toml
//! name = "double_integrator"
//!
//! [independent]
//! name = "t"
//! units = "s"
//!
//! [[states]]
//! name = "x"
//! rate = "v"
//! units = "m"
//!
//! [[controls]]
//! name = "u"
//! units = "m/s^2"
//!
//! [[constraints]]
//! location = "initial"
//! expr = "x"
//! units = "m"
//!
//! [path_cost]
//! expr = "u^2/2"
//! units = "m^2/s^4"
//!
//! [transcription]
//! control_method = "pmp"
//! path_constraint_method = "utm"
//! max_constraint_order = 4
//! ```
//!
//! Array sections: `states`, `controls`, `constants`, `constants_of_motion`,
//! `parameters`, `quantities`, `constraints`. Table sections: `independent`,
//! `initial_cost`, `path_cost`, `terminal_cost`, `transcription`. Omitted
//! sections keep the defaults of [`Ocp::new`] and [`TranscriptionOptions`].
use crate::optimal_control::errors::{TranscriptionError, TranscriptionResult};
use crate::optimal_control::indirect::TranscriptionOptions;
use crate::optimal_control::ocp::{ConstantDef, ConstraintDef, CostDef, NamedExprDef, Ocp, StateDef, SymbolDef};
use log::info;
use serde::Deserialize;
use std::path::Path;

fn config_error(msg: String) -> TranscriptionError {
    TranscriptionError::Configuration(msg)
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct IndependentSection {
    name: String,
    units: String,
}

impl Default for IndependentSection {
    fn default() -> Self {
        IndependentSection {
            name: "t".to_string(),
            units: "1".to_string(),
        }
    }
}

/// `[transcription]`; method names stay strings so that an unknown name is
/// reported as an unsupported combination.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TranscriptionSection {
    control_method: Option<String>,
    path_constraint_method: Option<String>,
    max_constraint_order: Option<usize>,
}

impl TranscriptionSection {
    fn into_options(self) -> TranscriptionResult<TranscriptionOptions> {
        let defaults = TranscriptionOptions::default();
        let control = self
            .control_method
            .unwrap_or_else(|| defaults.control_method.to_string());
        let path = self
            .path_constraint_method
            .unwrap_or_else(|| defaults.path_constraint_method.to_string());
        let options = TranscriptionOptions::from_names(&control, &path)?;
        Ok(match self.max_constraint_order {
            Some(order) => options.with_max_constraint_order(order),
            None => options,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProblemDocument {
    #[serde(default = "default_name")]
    name: String,
    #[serde(default)]
    independent: IndependentSection,
    #[serde(default)]
    states: Vec<StateDef>,
    #[serde(default)]
    controls: Vec<SymbolDef>,
    #[serde(default)]
    parameters: Vec<SymbolDef>,
    #[serde(default)]
    constants: Vec<ConstantDef>,
    #[serde(default)]
    constants_of_motion: Vec<NamedExprDef>,
    #[serde(default)]
    quantities: Vec<NamedExprDef>,
    #[serde(default)]
    constraints: Vec<ConstraintDef>,
    #[serde(default)]
    initial_cost: CostDef,
    #[serde(default)]
    path_cost: CostDef,
    #[serde(default)]
    terminal_cost: CostDef,
    #[serde(default)]
    transcription: TranscriptionSection,
}

fn default_name() -> String {
    "ocp".to_string()
}

impl ProblemDocument {
    fn parse(document: &str) -> TranscriptionResult<ProblemDocument> {
        toml::from_str(document).map_err(|e| config_error(format!("invalid problem document: {}", e)))
    }

    fn into_parts(self) -> (Ocp, TranscriptionSection) {
        let mut ocp = Ocp::new(&self.name).independent(&self.independent.name, &self.independent.units);
        ocp.states = self.states;
        ocp.controls = self.controls;
        ocp.parameters = self.parameters;
        ocp.constants = self.constants;
        ocp.constants_of_motion = self.constants_of_motion;
        ocp.quantities = self.quantities;
        ocp.constraints = self.constraints;
        ocp.initial_cost = self.initial_cost;
        ocp.path_cost = self.path_cost;
        ocp.terminal_cost = self.terminal_cost;
        (ocp, self.transcription)
    }
}

fn read_document(path: &Path) -> TranscriptionResult<String> {
    std::fs::read_to_string(path).map_err(|e| config_error(format!("cannot read {}: {}", path.display(), e)))
}

impl Ocp {
    /// Parses a problem document.
    ///
    /// # Errors
    /// [`TranscriptionError::Configuration`] for invalid TOML, a missing key or
    /// a value of the wrong type.
    pub fn from_toml_str(document: &str) -> TranscriptionResult<Ocp> {
        Ok(ProblemDocument::parse(document)?.into_parts().0)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> TranscriptionResult<Ocp> {
        let path = path.as_ref();
        let ocp = Ocp::from_toml_str(&read_document(path)?)?;
        info!("problem loaded from {}", path.display());
        Ok(ocp)
    }
}

impl TranscriptionOptions {
    /// Reads the `[transcription]` section; defaults when it is absent.
    pub fn from_toml_str(document: &str) -> TranscriptionResult<TranscriptionOptions> {
        #[derive(Deserialize)]
        struct OptionsOnly {
            #[serde(default)]
            transcription: TranscriptionSection,
        }
        let doc: OptionsOnly = toml::from_str(document)
            .map_err(|e| config_error(format!("invalid problem document: {}", e)))?;
        doc.transcription.into_options()
    }
}

/// Problem and options from one file.
pub fn load_problem<P: AsRef<Path>>(path: P) -> TranscriptionResult<(Ocp, TranscriptionOptions)> {
    let path = path.as_ref();
    let (ocp, section) = ProblemDocument::parse(&read_document(path)?)?.into_parts();
    let options = section.into_options()?;
    info!(
        "problem `{}` loaded from {} ({} states, {} controls)",
        ocp.name,
        path.display(),
        ocp.states.len(),
        ocp.controls.len()
    );
    Ok((ocp, options))
}
