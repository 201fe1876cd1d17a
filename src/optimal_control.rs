#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// typed definition of an optimal control problem, built with chained calls
pub mod ocp;
/// loading of problems and transcription options from TOML documents
pub mod ocp_config;
/// errors of the transcription
pub mod errors;
/// symbolic working copy of a problem: parsed expressions, units and roles
pub mod workspace;
/// substitution of user-defined quantities
pub mod quantities;
/// terminal constraint partition, smoothing penalty and relaxation of path constraints
pub mod constraints;
/// augmented costs, Hamiltonian, costates and boundary conditions
pub mod hamiltonian;
/// closed-form control law or control rates for the differential-algebraic form
pub mod control_law;
///____________________________________________________________________________________________________________________________
/// # Indirect transcription
/// optimal control problem -> boundary value problem
/// 1) builds the Hamiltonian and the costate equations
/// 2) eliminates the controls through ∂H/∂u = 0
/// 3) normalizes time to [0, 1] with the final time as a parameter
/// 4) returns a string descriptor for the numeric solver and a guess mapper
///# Example#
/// ```
/// use RustedPMP::optimal_control::indirect::{ocp_to_bvp, TranscriptionOptions};
/// use RustedPMP::optimal_control::ocp::Ocp;
/// let ocp = Ocp::new("brachistochrone")
///     .independent("t", "s")
///     .state("x", "v*cos(theta)", "m")
///     .state("y", "v*sin(theta)", "m")
///     .state("v", "g*sin(theta)", "m/s")
///     .control("theta", "rad")
///     .constant("g", -9.81, "m/s^2")
///     .constant("x_f", 1.0, "m")
///     .constant("y_f", -1.0, "m")
///     .path_cost("1", "s/s")
///     .initial_constraint("x", "m")
///     .initial_constraint("y", "m")
///     .initial_constraint("v", "m/s")
///     .terminal_constraint("x - x_f", "m")
///     .terminal_constraint("y - y_f", "m");
/// let bvp = ocp_to_bvp(&ocp, &TranscriptionOptions::default()).unwrap();
/// // x, y, v and their costates
/// assert_eq!(bvp.descriptor.num_states, 6);
/// // free final time: H(t_f) = 0 closes the terminal conditions
/// assert_eq!(bvp.descriptor.bc_terminal.len(), 2 + 3 + 1);
/// println!("{}", bvp.descriptor.to_toml_string().unwrap());
/// ```
/// ________________________________________________________________________________________________________________________________
pub mod indirect;
/// string descriptor of the transcribed problem
pub mod descriptor;
/// OCP space <-> BVP space mapping of trajectories
pub mod guess_mapping;
