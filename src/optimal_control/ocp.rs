//! # Optimal control problem definition
//!
//! A minimal typed OCP: every expression and unit is kept as the string the
//! user wrote and only parsed when the workspace is built, so a typo surfaces
//! as a [`TranscriptionError::Symbolic`](crate::optimal_control::errors::TranscriptionError)
//! from [`init_workspace`](crate::optimal_control::workspace::init_workspace).
//!
//! # Example
//! ```
//! use RustedPMP::optimal_control::ocp::Ocp;
//! let ocp = Ocp::new("brachistochrone")
//!     .independent("t", "s")
//!     .state("x", "v*cos(theta)", "m")
//!     .state("y", "v*sin(theta)", "m")
//!     .state("v", "g*sin(theta)", "m/s")
//!     .control("theta", "rad")
//!     .constant("g", -9.81, "m/s^2")
//!     .path_cost("1", "s/s")
//!     .initial_constraint("x", "m")
//!     .terminal_constraint("x - x_f", "m");
//! assert_eq!(ocp.states.len(), 3);
//! ```
use serde::{Deserialize, Deserializer};
use std::str::FromStr;
use strum_macros::{Display, EnumString};

/// Where a constraint applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(try_from = "String")]
pub enum ConstraintLocation {
    Initial,
    Path,
    Terminal,
}

impl TryFrom<String> for ConstraintLocation {
    type Error = String;

    fn try_from(location: String) -> Result<Self, Self::Error> {
        ConstraintLocation::from_str(&location)
            .map_err(|_| format!("unknown constraint location \"{}\"", location))
    }
}

fn unitless() -> String {
    "1".to_string()
}

/// Accepts `upper = 1` as well as `upper = "1"`.
fn expression_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Integer(i64),
        Float(f64),
    }
    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Integer(i) => i.to_string(),
        Raw::Float(f) => f.to_string(),
    }))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StateDef {
    pub name: String,
    pub rate: String,
    #[serde(default = "unitless")]
    pub units: String,
}

/// Control or parameter: a symbol and its units.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SymbolDef {
    pub name: String,
    #[serde(default = "unitless")]
    pub units: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConstantDef {
    pub name: String,
    pub value: f64,
    #[serde(default = "unitless")]
    pub units: String,
}

/// Named expression: a quantity, or a constant of motion.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NamedExprDef {
    pub name: String,
    pub expr: String,
    #[serde(default = "unitless")]
    pub units: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConstraintDef {
    pub location: ConstraintLocation,
    pub expr: String,
    #[serde(default = "unitless")]
    pub units: String,
    /// bounds and activator of path constraints
    #[serde(default, deserialize_with = "expression_or_number")]
    pub lower: Option<String>,
    #[serde(default, deserialize_with = "expression_or_number")]
    pub upper: Option<String>,
    #[serde(default, deserialize_with = "expression_or_number")]
    pub activator: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CostDef {
    pub expr: String,
    pub units: String,
}

impl Default for CostDef {
    fn default() -> Self {
        CostDef {
            expr: "0".to_string(),
            units: "1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ocp {
    pub name: String,
    pub independent_variable: String,
    pub independent_variable_units: String,
    pub states: Vec<StateDef>,
    pub controls: Vec<SymbolDef>,
    pub constants: Vec<ConstantDef>,
    pub constants_of_motion: Vec<NamedExprDef>,
    pub parameters: Vec<SymbolDef>,
    /// quantities in declaration order; units are not used
    pub quantities: Vec<NamedExprDef>,
    pub constraints: Vec<ConstraintDef>,
    pub initial_cost: CostDef,
    pub path_cost: CostDef,
    pub terminal_cost: CostDef,
}

impl Ocp {
    /// Empty problem with independent variable `t` (dimensionless) and all costs zero.
    pub fn new(name: &str) -> Self {
        Ocp {
            name: name.to_string(),
            independent_variable: "t".to_string(),
            independent_variable_units: "1".to_string(),
            states: Vec::new(),
            controls: Vec::new(),
            constants: Vec::new(),
            constants_of_motion: Vec::new(),
            parameters: Vec::new(),
            quantities: Vec::new(),
            constraints: Vec::new(),
            initial_cost: CostDef::default(),
            path_cost: CostDef::default(),
            terminal_cost: CostDef::default(),
        }
    }

    pub fn independent(mut self, name: &str, units: &str) -> Self {
        self.independent_variable = name.to_string();
        self.independent_variable_units = units.to_string();
        self
    }

    pub fn state(mut self, name: &str, rate: &str, units: &str) -> Self {
        self.states.push(StateDef {
            name: name.to_string(),
            rate: rate.to_string(),
            units: units.to_string(),
        });
        self
    }

    pub fn control(mut self, name: &str, units: &str) -> Self {
        self.controls.push(SymbolDef {
            name: name.to_string(),
            units: units.to_string(),
        });
        self
    }

    pub fn constant(mut self, name: &str, value: f64, units: &str) -> Self {
        self.constants.push(ConstantDef {
            name: name.to_string(),
            value,
            units: units.to_string(),
        });
        self
    }

    pub fn constant_of_motion(mut self, name: &str, expr: &str, units: &str) -> Self {
        self.constants_of_motion.push(NamedExprDef {
            name: name.to_string(),
            expr: expr.to_string(),
            units: units.to_string(),
        });
        self
    }

    pub fn parameter(mut self, name: &str, units: &str) -> Self {
        self.parameters.push(SymbolDef {
            name: name.to_string(),
            units: units.to_string(),
        });
        self
    }

    /// Named intermediate expression, substituted before the derivation starts.
    pub fn quantity(mut self, name: &str, expr: &str) -> Self {
        self.quantities.push(NamedExprDef {
            name: name.to_string(),
            expr: expr.to_string(),
            units: "1".to_string(),
        });
        self
    }

    pub fn initial_constraint(mut self, expr: &str, units: &str) -> Self {
        self.constraints
            .push(boundary_constraint(ConstraintLocation::Initial, expr, units));
        self
    }

    pub fn terminal_constraint(mut self, expr: &str, units: &str) -> Self {
        self.constraints
            .push(boundary_constraint(ConstraintLocation::Terminal, expr, units));
        self
    }

    /// Path constraint `lower <= expr <= upper`; `activator` weights the
    /// penalty (or the regularization under relaxation).
    pub fn path_constraint(
        mut self,
        expr: &str,
        units: &str,
        lower: &str,
        upper: &str,
        activator: &str,
    ) -> Self {
        self.constraints.push(ConstraintDef {
            location: ConstraintLocation::Path,
            expr: expr.to_string(),
            units: units.to_string(),
            lower: Some(lower.to_string()),
            upper: Some(upper.to_string()),
            activator: Some(activator.to_string()),
        });
        self
    }

    pub fn initial_cost(mut self, expr: &str, units: &str) -> Self {
        self.initial_cost = CostDef {
            expr: expr.to_string(),
            units: units.to_string(),
        };
        self
    }

    pub fn path_cost(mut self, expr: &str, units: &str) -> Self {
        self.path_cost = CostDef {
            expr: expr.to_string(),
            units: units.to_string(),
        };
        self
    }

    pub fn terminal_cost(mut self, expr: &str, units: &str) -> Self {
        self.terminal_cost = CostDef {
            expr: expr.to_string(),
            units: units.to_string(),
        };
        self
    }
}

fn boundary_constraint(location: ConstraintLocation, expr: &str, units: &str) -> ConstraintDef {
    ConstraintDef {
        location,
        expr: expr.to_string(),
        units: units.to_string(),
        lower: None,
        upper: None,
        activator: None,
    }
}
