#![allow(non_snake_case)]

use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_errors::SymbolicError;
use crate::symbolic::symbolic_solve::{EquationSolver, NativeSolver, solve_linear_system};
use std::collections::HashMap;

#[allow(dead_code)]
pub fn sym_examples(example: usize) {
    let result: Result<(), SymbolicError> = match example {
        0 => {
            // FUNCTION OF MULTIPLE VARIABLES
            //parse expression from string to symbolic expression
            let input = "exp(x)+log(y)";
            // here you've got symbolic expression
            Expr::parse_expression(input).and_then(|parsed_expression| {
                println!(" parsed_expression {}", parsed_expression);
                let variables = parsed_expression.free_symbols();
                println!("variables {:?}", variables);
                // differentiate with respect to x and y
                let df_dx = parsed_expression.derivative("x");
                let df_dy = parsed_expression.derivative("y");
                println!("df_dx = {}, df_dy = {}", df_dx, df_dy);
                let values = HashMap::from([("x".to_string(), 1.0), ("y".to_string(), 2.0)]);
                let f_res = parsed_expression.eval_expression(&values)?;
                println!("f_res = {}", f_res);
                Ok(())
            })
        }
        1 => {
            // derivative along a vector field: d/dt c(x(t), t) = Σ ∂c/∂x_i·f_i + ∂c/∂t
            Expr::parse_vector_expression(&["v", "u - v"]).and_then(|rates| {
                let c = Expr::parse_expression("x*v + t")?;
                let states = vec!["x".to_string(), "v".to_string()];
                let dc = c.total_derivative(&states, &rates, Some("t"));
                println!("dc/dt = {}", dc);
                Ok(())
            })
        }
        2 => {
            // closed-form roots: a quadratic and a trigonometric stationarity condition
            let solver = NativeSolver::new();
            Expr::parse_vector_expression(&["u^2 - 4*a", "lamy*cos(theta) - lamx*sin(theta)"]).map(|eqs| {
                println!("roots of {} : {:?}", eqs[0], solver.solve_single(&eqs[0], "u"));
                println!("roots of {} : {:?}", eqs[1], solver.solve_single(&eqs[1], "theta"));
            })
        }
        3 => {
            // coupled stationarity conditions, solved one unknown after another
            Expr::parse_vector_expression(&["2*u1 + lam1", "u2 - u1 + lam2"]).and_then(|eqs| {
                let branches = NativeSolver::new().solve(&eqs, &["u1".to_string(), "u2".to_string()])?;
                for branch in branches {
                    for (u, law) in branch {
                        println!("{} = {}", u, law);
                    }
                }
                Ok(())
            })
        }
        4 => {
            // symbolic linear system, as used for the control rates of DAE problems
            Expr::parse_vector_expression(&["a", "1", "0", "b"]).and_then(|m| {
                let a = vec![vec![m[0].clone(), m[1].clone()], vec![m[2].clone(), m[3].clone()]];
                let rhs = Expr::parse_vector_expression(&["p", "q"])?;
                let x = solve_linear_system(a, rhs)?;
                println!("x = {:?}", x.iter().map(|e| e.to_string()).collect::<Vec<_>>());
                Ok(())
            })
        }
        _ => {
            println!("example {} does not exist", example);
            Ok(())
        }
    };
    if let Err(e) = result {
        println!("symbolic example failed: {}", e);
    }
}
