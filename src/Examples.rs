//! examples of usage of RustedPMP
/// optimal control problems transcribed into boundary value problems
pub mod ocp_examples;
/// Symbolic operations examples
pub mod symbolic_examples;
