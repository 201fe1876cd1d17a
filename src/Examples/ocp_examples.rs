use crate::Utils::logger::LoggerSettings;
use crate::optimal_control::errors::TranscriptionResult;
use crate::optimal_control::guess_mapping::Solution;
use crate::optimal_control::indirect::{Transcription, TranscriptionOptions, ocp_to_bvp};
use crate::optimal_control::ocp::Ocp;
use crate::optimal_control::ocp_config::load_problem;
use log::LevelFilter;
use nalgebra::{DMatrix, DVector};
use std::io::Write;

pub fn double_integrator() -> Ocp {
    Ocp::new("double_integrator")
        .independent("t", "s")
        .state("x", "v", "m")
        .state("v", "u", "m/s")
        .control("u", "m/s^2")
        .path_cost("u^2/2", "m^2/s^4")
        .initial_constraint("x", "m")
        .initial_constraint("v - 1", "m/s")
        .terminal_constraint("x", "m")
        .terminal_constraint("v + 1", "m/s")
        .terminal_constraint("t - 1", "s")
}

pub fn brachistochrone() -> Ocp {
    Ocp::new("brachistochrone")
        .independent("t", "s")
        .state("x", "v*cos(theta)", "m")
        .state("y", "v*sin(theta)", "m")
        .state("v", "g*sin(theta)", "m/s")
        .control("theta", "rad")
        .constant("g", -9.81, "m/s^2")
        .constant("x_f", 1.0, "m")
        .constant("y_f", -1.0, "m")
        .path_cost("1", "s/s")
        .initial_constraint("x", "m")
        .initial_constraint("y", "m")
        .initial_constraint("v", "m/s")
        .terminal_constraint("x - x_f", "m")
        .terminal_constraint("y - y_f", "m")
}

/// Double integrator whose position must stay in `[-lim, lim]`.
pub fn constrained_double_integrator() -> Ocp {
    double_integrator()
        .constant("lim", 1.0 / 9.0, "m")
        .constant("eps", 1e-4, "m^2/s^3")
        .path_constraint("x", "m", "-lim", "lim", "eps")
}

const ZERMELO: &str = r#"
name = "zermelo"

[independent]
name = "t"
units = "s"

[[states]]
name = "x"
rate = "V*cos(theta) + current"
units = "m"

[[states]]
name = "y"
rate = "V*sin(theta)"
units = "m"

[[controls]]
name = "theta"
units = "rad"

[[constants]]
name = "V"
value = 1.0
units = "m/s"

[[constants]]
name = "c"
value = 0.5
units = "1/s"

[[quantities]]
name = "current"
expr = "c*y"

[[constraints]]
location = "initial"
expr = "x"
units = "m"

[[constraints]]
location = "initial"
expr = "y"
units = "m"

[[constraints]]
location = "terminal"
expr = "x - 5"
units = "m"

[[constraints]]
location = "terminal"
expr = "y - 1"
units = "m"

[path_cost]
expr = "1"
units = "1"
"#;

fn report(bvp: &Transcription) -> TranscriptionResult<()> {
    let d = &bvp.descriptor;
    println!("problem: {}", d.problem_name);
    for (state, rate) in d.states.iter().zip(&d.states_rates) {
        println!("  d{}/dt = {}", state, rate);
    }
    println!("  H = {}", d.hamiltonian);
    println!("  initial conditions: {:?}", d.bc_initial);
    println!("  terminal conditions: {:?}", d.bc_terminal);
    for (i, option) in d.control_options.iter().enumerate() {
        println!("  control branch {}: {:?}", i, option);
    }
    println!("{}", d.to_toml_string()?);
    Ok(())
}

/// Straight-line guess with constant costates on `n` nodes over `[0, t_f]`.
fn linear_guess(n_states: usize, n_controls: usize, nodes: usize, t_f: f64) -> Solution {
    let t = DVector::from_fn(nodes, |i, _| t_f * i as f64 / (nodes - 1) as f64);
    Solution {
        y: DMatrix::from_fn(nodes, n_states, |i, j| (j + 1) as f64 * t[i]),
        dual: DMatrix::from_element(nodes, n_states, -0.1),
        u: DMatrix::zeros(nodes, n_controls),
        t,
        dynamical_parameters: DVector::zeros(0),
        nondynamical_parameters: DVector::zeros(0),
        constants: DVector::zeros(0),
    }
}

#[allow(dead_code)]
pub fn ocp_examples(example: usize) {
    let result = match example {
        0 => {
            // fixed final time, closed-form control u = -lamv
            ocp_to_bvp(&double_integrator(), &TranscriptionOptions::default()).and_then(|bvp| report(&bvp))
        }
        1 => {
            // free final time, two control branches; the guess mapper picks
            // the branch with the smallest Hamiltonian at every node
            ocp_to_bvp(&brachistochrone(), &TranscriptionOptions::default()).and_then(|bvp| {
                report(&bvp)?;
                let mapper = bvp.bound_guess_mapper()?;
                let mut guess = linear_guess(3, 1, 5, 0.6);
                guess.constants = DVector::from_vec(vec![-9.81, 1.0, -1.0]);
                let bvp_guess = mapper.map(&guess)?;
                println!("normalized grid {}", bvp_guess.t.transpose());
                println!("final time parameter {}", bvp_guess.dynamical_parameters);
                let back = mapper.map_inverse(&bvp_guess)?;
                println!("controls recomputed from the costates {}", back.u);
                Ok(())
            })
        }
        2 => {
            // path constraint through a smoothing penalty in the path cost
            ocp_to_bvp(&constrained_double_integrator(), &TranscriptionOptions::default())
                .and_then(|bvp| report(&bvp))
        }
        3 => {
            // same constraint by relaxation: two extra states, the controls become DAE states
            TranscriptionOptions::from_names("icrm", "icrm")
                .and_then(|options| ocp_to_bvp(&constrained_double_integrator(), &options))
                .and_then(|bvp| report(&bvp))
        }
        4 => {
            // problem read from a TOML document, log written next to it
            let dir = std::env::temp_dir();
            let path = dir.join("zermelo.toml");
            let written = std::fs::File::create(&path).and_then(|mut f| f.write_all(ZERMELO.as_bytes()));
            if let Err(e) = written {
                println!("cannot write {}: {}", path.display(), e);
                return;
            }
            if let Err(e) = LoggerSettings::default()
                .with_level(LevelFilter::Debug)
                .with_file_in(&dir)
                .init()
            {
                println!("logger not installed: {}", e);
            }
            load_problem(&path)
                .and_then(|(ocp, options)| ocp_to_bvp(&ocp, &options))
                .and_then(|bvp| report(&bvp))
        }
        _ => {
            println!("example {} does not exist", example);
            Ok(())
        }
    };
    if let Err(e) = result {
        println!("transcription failed: {}", e);
    }
}
