#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// a module turns a String expression into a symbolic expression
///
///# Example
/// ```
/// use RustedPMP::symbolic::symbolic_engine::Expr;
/// let input = "x^2.3* log(x+y+y^2.6)";
/// let parsed_expression = Expr::parse_expression(input).unwrap();
/// println!(" parsed_expression {}", parsed_expression);
/// let again = Expr::parse_expression(&parsed_expression.to_string()).unwrap();
/// assert_eq!(parsed_expression, again);
///  ```
/// ________________________________________________________________________________________________________________________________
pub mod parse_expr;
///____________________________________________________________________________________________________________________________
/// # Symbolic engine
/// a module
/// 1) turns a String expression into a symbolic expression
/// 2) differentiates it, partially or along a vector field
/// 3) evaluates it for a map of symbol values
/// 4) turns it back into a string for the problem descriptor
///# Example#
/// ```
/// use RustedPMP::symbolic::symbolic_engine::Expr;
/// use std::collections::HashMap;
/// let input = "exp(x)+log(y)";
/// // here you've got symbolic expression
/// let parsed_expression = Expr::parse_expression(input).unwrap();
/// // differentiate with respect to x and y
/// let df_dx = parsed_expression.derivative("x");
/// let df_dy = parsed_expression.derivative("y");
/// println!("df_dx = {}, df_dy = {}", df_dx, df_dy);
/// // evaluate
/// let values = HashMap::from([("x".to_string(), 0.0), ("y".to_string(), 1.0)]);
/// let f_res = parsed_expression.eval_expression(&values).unwrap();
/// assert_eq!(f_res, 1.0);
/// // set of symbols of the expression
/// let variables = parsed_expression.free_symbols();
/// println!("variables {:?}", variables);
/// ```
/// ________________________________________________________________________________________________________________________________________________
pub mod symbolic_engine;
pub mod symbolic_engine_derivatives;
/// errors of parsing, evaluation and symbolic linear algebra
pub mod symbolic_errors;
/// string form of expressions (the interchange format of the problem descriptor)
pub mod symbolic_serialize;
/// algebraic simplification
pub mod symbolic_simplify;
///______________________________________________________________________________________________________________________________________________
/// closed-form equation solving and symbolic linear systems
/// Example#
/// ```
/// use RustedPMP::symbolic::symbolic_engine::Expr;
/// use RustedPMP::symbolic::symbolic_solve::{EquationSolver, NativeSolver};
/// let eq = Expr::parse_expression("u + lamv").unwrap();
/// let branches = NativeSolver::new().solve(&[eq], &["u".to_string()]).unwrap();
/// assert_eq!(branches[0]["u"].to_string(), "(-1) * lamv");
/// ```
/// _____________________________________________________________________________________________________________________________________________
pub mod symbolic_solve;
