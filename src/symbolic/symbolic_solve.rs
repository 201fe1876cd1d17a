//! # Symbolic equation solving
//!
//! Closed-form solving used to resolve control laws from stationarity
//! conditions, and symbolic Gaussian elimination for the DAE control rates.
//!
//! ## Key Methods
//! - `polynomial_coefficients()` - coefficients of an expression seen as a polynomial in one symbol
//! - [`EquationSolver`] - capability "solve this system for these unknowns, return every branch"
//! - [`NativeSolver`] - built-in solver: degree 1 and 2 polynomials, `A*sin(u) + B*cos(u) = 0`
//! - `solve_linear_system()` - symbolic A·x = b

use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_errors::SymbolicError;
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::f64::consts::PI;

/// One solution branch: unknown name -> closed-form expression.
pub type SolutionBranch = BTreeMap<String, Expr>;

const SIN_PLACEHOLDER: &str = "__sin_of_unknown";
const COS_PLACEHOLDER: &str = "__cos_of_unknown";

impl Expr {
    /// Coefficients `[c0, c1, ..]` such that `self = Σ c_k·var^k`, or `None` if
    /// the expression is not a polynomial in `var` of degree at most `max_degree`.
    /// Trailing zero coefficients are dropped; `[]` means the expression is
    /// identically zero.
    pub fn polynomial_coefficients(&self, var: &str, max_degree: usize) -> Option<Vec<Expr>> {
        let coeffs = poly_coeffs(self, var, max_degree)?;
        let mut coeffs: Vec<Expr> = coeffs.into_iter().map(|c| c.simplify()).collect();
        while coeffs.last().is_some_and(|c| c.is_zero()) {
            coeffs.pop();
        }
        Some(coeffs)
    }
}

fn poly_add(lhs: Vec<Expr>, rhs: Vec<Expr>, subtract: bool) -> Vec<Expr> {
    let len = lhs.len().max(rhs.len());
    (0..len)
        .map(|k| {
            let a = lhs.get(k).cloned().unwrap_or(Expr::Const(0.0));
            let b = rhs.get(k).cloned().unwrap_or(Expr::Const(0.0));
            if subtract { a - b } else { a + b }
        })
        .collect()
}

fn poly_mul(lhs: &[Expr], rhs: &[Expr], max_degree: usize) -> Option<Vec<Expr>> {
    if lhs.len() + rhs.len() - 1 > max_degree + 1 {
        // the product may still cancel, but only if a leading coefficient is zero
        let trimmed_l = trim(lhs);
        let trimmed_r = trim(rhs);
        if trimmed_l.is_empty() || trimmed_r.is_empty() {
            return Some(vec![Expr::Const(0.0)]);
        }
        if trimmed_l.len() + trimmed_r.len() - 1 > max_degree + 1 {
            return None;
        }
        return poly_mul(&trimmed_l, &trimmed_r, max_degree);
    }
    let mut out = vec![Expr::Const(0.0); lhs.len() + rhs.len() - 1];
    for (i, a) in lhs.iter().enumerate() {
        for (j, b) in rhs.iter().enumerate() {
            out[i + j] = out[i + j].clone() + a.clone() * b.clone();
        }
    }
    Some(out)
}

fn trim(coeffs: &[Expr]) -> Vec<Expr> {
    let mut out: Vec<Expr> = coeffs.iter().map(|c| c.simplify()).collect();
    while out.last().is_some_and(|c| c.is_zero()) {
        out.pop();
    }
    out
}

fn poly_coeffs(expr: &Expr, var: &str, max_degree: usize) -> Option<Vec<Expr>> {
    if !expr.contains_variable(var) {
        return Some(vec![expr.clone()]);
    }
    match expr {
        Expr::Var(_) => {
            if max_degree == 0 {
                None
            } else {
                Some(vec![Expr::Const(0.0), Expr::Const(1.0)])
            }
        }
        Expr::Add(lhs, rhs) => Some(poly_add(
            poly_coeffs(lhs, var, max_degree)?,
            poly_coeffs(rhs, var, max_degree)?,
            false,
        )),
        Expr::Sub(lhs, rhs) => Some(poly_add(
            poly_coeffs(lhs, var, max_degree)?,
            poly_coeffs(rhs, var, max_degree)?,
            true,
        )),
        Expr::Mul(lhs, rhs) => poly_mul(
            &poly_coeffs(lhs, var, max_degree)?,
            &poly_coeffs(rhs, var, max_degree)?,
            max_degree,
        ),
        Expr::Div(num, den) if !den.contains_variable(var) => Some(
            poly_coeffs(num, var, max_degree)?
                .into_iter()
                .map(|c| c / den.as_ref().clone())
                .collect(),
        ),
        Expr::Pow(base, exp) if !exp.contains_variable(var) => {
            let Expr::Const(k) = exp.simplify() else {
                return None;
            };
            if k < 0.0 || k.fract() != 0.0 || k as usize > max_degree {
                return None;
            }
            let base_coeffs = poly_coeffs(base, var, max_degree)?;
            let mut acc = vec![Expr::Const(1.0)];
            for _ in 0..(k as usize) {
                acc = poly_mul(&acc, &base_coeffs, max_degree)?;
            }
            Some(acc)
        }
        _ => None,
    }
}

/// Capability to solve a system of equations `equations[i] = 0` for a set of
/// unknowns, returning zero or more closed-form branches.
pub trait EquationSolver {
    fn solve(
        &self,
        equations: &[Expr],
        unknowns: &[String],
    ) -> Result<Vec<SolutionBranch>, SymbolicError>;
}

/// Built-in solver.
///
/// Equations are processed in order. For each branch found so far the
/// equation gets the branch substituted in, then it is solved for the first
/// still-unresolved unknown it contains; every root spawns a new branch and is
/// back-substituted into the values already in that branch. Supported
/// single-unknown forms: polynomials of degree 1 and 2, and
/// `A*sin(u) + B*cos(u) = 0` with `A`, `B` free of `u`.
#[derive(Debug, Clone, Default)]
pub struct NativeSolver;

impl NativeSolver {
    pub fn new() -> Self {
        NativeSolver
    }

    /// Roots of `equation = 0` in `var`. Empty if the form is not supported.
    pub fn solve_single(&self, equation: &Expr, var: &str) -> Vec<Expr> {
        let equation = equation.simplify();
        if let Some(coeffs) = equation.polynomial_coefficients(var, 2) {
            return match coeffs.len() {
                2 => vec![(-coeffs[0].clone() / coeffs[1].clone()).simplify()],
                3 => quadratic_roots(&coeffs[0], &coeffs[1], &coeffs[2]),
                _ => Vec::new(),
            };
        }
        trigonometric_roots(&equation, var).unwrap_or_default()
    }
}

fn quadratic_roots(c0: &Expr, c1: &Expr, c2: &Expr) -> Vec<Expr> {
    let mut roots = if c0.is_zero() {
        // c2*u^2 + c1*u = 0
        vec![Expr::Const(0.0), (-c1.clone() / c2.clone()).simplify()]
    } else {
        let discriminant =
            c1.clone().pow(Expr::Const(2.0)) - Expr::Const(4.0) * c2.clone() * c0.clone();
        let root = discriminant.simplify().pow(Expr::Const(0.5));
        let denominator = Expr::Const(2.0) * c2.clone();
        vec![
            ((-c1.clone() + root.clone()) / denominator.clone()).simplify(),
            ((-c1.clone() - root) / denominator).simplify(),
        ]
    };
    // a double root is one branch
    roots.dedup();
    roots
}

/// `A*sin(u) + B*cos(u) = 0`  =>  `u = arctg(-B/A)`, `u = arctg(-B/A) + pi`
fn trigonometric_roots(equation: &Expr, var: &str) -> Option<Vec<Expr>> {
    let unknown = Expr::var(var).boxed();
    let replaced = equation
        .replace_subexpr(&Expr::sin(unknown.clone()), &Expr::var(SIN_PLACEHOLDER))
        .replace_subexpr(&Expr::cos(unknown), &Expr::var(COS_PLACEHOLDER));
    if replaced.contains_variable(var) {
        return None;
    }
    let in_sin = replaced.polynomial_coefficients(SIN_PLACEHOLDER, 1)?;
    let rest = in_sin.first().cloned().unwrap_or(Expr::Const(0.0));
    let a = in_sin.get(1).cloned().unwrap_or(Expr::Const(0.0));
    if a.contains_variable(COS_PLACEHOLDER) {
        return None;
    }
    let in_cos = rest.polynomial_coefficients(COS_PLACEHOLDER, 1)?;
    if in_cos.first().is_some_and(|c| !c.is_zero()) {
        return None;
    }
    let b = in_cos.get(1).cloned().unwrap_or(Expr::Const(0.0));
    let roots = match (a.is_zero(), b.is_zero()) {
        (true, true) => return None,
        (true, false) => vec![Expr::Const(PI / 2.0), Expr::Const(-PI / 2.0)],
        _ => {
            let base = Expr::arctg((-b / a).simplify().boxed());
            vec![base.clone(), (base + Expr::Const(PI)).simplify()]
        }
    };
    Some(roots)
}

impl EquationSolver for NativeSolver {
    fn solve(
        &self,
        equations: &[Expr],
        unknowns: &[String],
    ) -> Result<Vec<SolutionBranch>, SymbolicError> {
        let mut branches: Vec<SolutionBranch> = vec![SolutionBranch::new()];
        for equation in equations {
            let mut next_branches = Vec::new();
            for branch in &branches {
                let substitutions: HashMap<String, Expr> =
                    branch.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                let reduced = equation.substitute_map(&substitutions).simplify();
                let target = unknowns
                    .iter()
                    .find(|u| !branch.contains_key(*u) && reduced.contains_variable(u));
                let Some(target) = target else {
                    // free of every unresolved unknown: only a nonzero constant rules the branch out
                    if !matches!(reduced, Expr::Const(c) if c != 0.0) {
                        next_branches.push(branch.clone());
                    }
                    continue;
                };
                let roots = self.solve_single(&reduced, target);
                if roots.is_empty() {
                    debug!("no closed-form root of {} = 0 for {}", reduced, target);
                }
                for root in roots {
                    let mut new_branch: SolutionBranch = branch
                        .iter()
                        .map(|(k, v)| (k.clone(), v.substitute_variable(target, &root).simplify()))
                        .collect();
                    new_branch.insert(target.clone(), root);
                    next_branches.push(new_branch);
                }
            }
            branches = next_branches;
        }
        // a branch must resolve every unknown
        branches.retain(|branch| unknowns.iter().all(|u| branch.contains_key(u)));
        Ok(branches)
    }
}

/// Solves `a·x = b` symbolically by Gaussian elimination.
///
/// The pivot of each column is the first row at or below the diagonal whose
/// entry is not structurally zero after simplification.
///
/// # Errors
/// - [`SymbolicError::ShapeMismatch`] if `a` is not square or does not match `b`
/// - [`SymbolicError::SingularSystem`] if a column has no usable pivot
pub fn solve_linear_system(
    mut a: Vec<Vec<Expr>>,
    mut b: Vec<Expr>,
) -> Result<Vec<Expr>, SymbolicError> {
    let n = b.len();
    if a.len() != n || a.iter().any(|row| row.len() != n) {
        return Err(SymbolicError::ShapeMismatch {
            rows: a.len(),
            rhs: n,
        });
    }
    for row in a.iter_mut() {
        for entry in row.iter_mut() {
            *entry = entry.simplify();
        }
    }
    for col in 0..n {
        let pivot_row = (col..n)
            .find(|&r| !a[r][col].is_zero())
            .ok_or(SymbolicError::SingularSystem { column: col })?;
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);
        let pivot = a[col][col].clone();
        for r in (col + 1)..n {
            if a[r][col].is_zero() {
                continue;
            }
            let factor = (a[r][col].clone() / pivot.clone()).simplify();
            for c in col..n {
                a[r][c] = (a[r][c].clone() - factor.clone() * a[col][c].clone()).simplify();
            }
            b[r] = (b[r].clone() - factor * b[col].clone()).simplify();
        }
    }
    let mut x = vec![Expr::Const(0.0); n];
    for row in (0..n).rev() {
        let known = Expr::sum(((row + 1)..n).map(|c| a[row][c].clone() * x[c].clone()));
        x[row] = ((b[row].clone() - known) / a[row][row].clone()).simplify();
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn values(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_polynomial_coefficients() {
        let e = Expr::parse_expression("a*u^2 + b*u + c").unwrap();
        let coeffs = e.polynomial_coefficients("u", 2).unwrap();
        assert_eq!(coeffs.len(), 3);
        assert_eq!(coeffs[2], Expr::var("a"));
        assert_eq!(coeffs[1], Expr::var("b"));
        assert_eq!(coeffs[0], Expr::var("c"));
        assert!(e.polynomial_coefficients("u", 1).is_none());
        let e = Expr::parse_expression("sin(u) + u").unwrap();
        assert!(e.polynomial_coefficients("u", 2).is_none());
    }

    #[test]
    fn test_solve_linear_control() {
        // dH/du = u + lamv  =>  u = -lamv
        let eq = Expr::parse_expression("u + lamv").unwrap();
        let branches = NativeSolver::new()
            .solve(&[eq], &["u".to_string()])
            .unwrap();
        assert_eq!(branches.len(), 1);
        let u = branches[0]["u"].eval_expression(&values(&[("lamv", 2.0)])).unwrap();
        assert_relative_eq!(u, -2.0);
    }

    #[test]
    fn test_solve_quadratic_two_branches() {
        let eq = Expr::parse_expression("u^2 - 4").unwrap();
        let roots = NativeSolver::new().solve_single(&eq, "u");
        let mut vals: Vec<f64> = roots
            .iter()
            .map(|r| r.eval_expression(&HashMap::new()).unwrap())
            .collect();
        vals.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_relative_eq!(vals[0], -2.0);
        assert_relative_eq!(vals[1], 2.0);
    }

    #[test]
    fn test_double_root_is_one_branch() {
        let solver = NativeSolver::new();
        let eq = Expr::parse_expression("u^2").unwrap();
        assert_eq!(solver.solve_single(&eq, "u"), vec![Expr::Const(0.0)]);
        // (u - 2)^2 expanded
        let eq = Expr::parse_expression("u^2 - 4*u + 4").unwrap();
        let roots = solver.solve_single(&eq, "u");
        assert_eq!(roots.len(), 1);
        assert_relative_eq!(roots[0].eval_expression(&HashMap::new()).unwrap(), 2.0);
        let branches = solver.solve(&[eq], &["u".to_string()]).unwrap();
        assert_eq!(branches.len(), 1);
    }

    #[test]
    fn test_solve_trigonometric_form() {
        // -lamx*v*sin(theta) + lamy*v*cos(theta) = 0
        let eq = Expr::parse_expression("-lamx*v*sin(theta) + lamy*v*cos(theta)").unwrap();
        let roots = NativeSolver::new().solve_single(&eq, "theta");
        assert_eq!(roots.len(), 2);
        let vals = values(&[("lamx", 0.3), ("lamy", -0.7), ("v", 2.0)]);
        for root in roots {
            let theta = root.eval_expression(&vals).unwrap();
            let residual = -0.3 * 2.0 * theta.sin() + (-0.7) * 2.0 * theta.cos();
            assert_relative_eq!(residual, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_solve_coupled_system_back_substitutes() {
        // u1 - u2 = 0, u2 - 3 = 0
        let eqs = Expr::parse_vector_expression(&["u1 - u2", "u2 - 3"]).unwrap();
        let branches = NativeSolver::new()
            .solve(&eqs, &["u1".to_string(), "u2".to_string()])
            .unwrap();
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0]["u1"], Expr::Const(3.0));
        assert_eq!(branches[0]["u2"], Expr::Const(3.0));
    }

    #[test]
    fn test_unsupported_form_has_no_branch() {
        let eq = Expr::parse_expression("exp(u) - u").unwrap();
        let branches = NativeSolver::new().solve(&[eq], &["u".to_string()]).unwrap();
        assert!(branches.is_empty());
    }

    #[test]
    fn test_solve_linear_system() {
        // [a 1; 0 2] x = [b; 4]
        let a = vec![
            vec![Expr::var("a"), Expr::Const(1.0)],
            vec![Expr::Const(0.0), Expr::Const(2.0)],
        ];
        let b = vec![Expr::var("b"), Expr::Const(4.0)];
        let x = solve_linear_system(a, b).unwrap();
        let vals = values(&[("a", 2.0), ("b", 6.0)]);
        assert_relative_eq!(x[0].eval_expression(&vals).unwrap(), 2.0);
        assert_relative_eq!(x[1].eval_expression(&vals).unwrap(), 2.0);
    }

    #[test]
    fn test_solve_linear_system_pivots_past_zero() {
        let a = vec![
            vec![Expr::Const(0.0), Expr::Const(1.0)],
            vec![Expr::Const(1.0), Expr::Const(0.0)],
        ];
        let x = solve_linear_system(a, vec![Expr::var("p"), Expr::var("q")]).unwrap();
        assert_eq!(x, vec![Expr::var("q"), Expr::var("p")]);
    }

    #[test]
    fn test_singular_and_shape_errors() {
        let a = vec![vec![Expr::Const(0.0)]];
        assert_eq!(
            solve_linear_system(a, vec![Expr::Const(1.0)]),
            Err(SymbolicError::SingularSystem { column: 0 })
        );
        let a = vec![vec![Expr::Const(1.0), Expr::Const(2.0)]];
        assert!(matches!(
            solve_linear_system(a, vec![Expr::Const(1.0)]),
            Err(SymbolicError::ShapeMismatch { .. })
        ));
    }
}
