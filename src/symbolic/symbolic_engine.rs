//! # Symbolic Engine Module
//!
//! Core expression type of the transcription engine. Every object the
//! transcription derives (dynamics, Hamiltonian, boundary conditions, control
//! law branches, units) is an [`Expr`].
//!
//! ## Main Structures and Methods
//!
//! ### `Expr` Enum
//! - **Symbols**: `Var(String)` - named symbols like "x", "lamx", "_tf"
//! - **Constants**: `Const(f64)` - numerical constants
//! - **Binary operations**: `Add`, `Sub`, `Mul`, `Div`, `Pow`
//! - **Calls**: `Exp`, `Ln`, `sin`, `cos`, `tg`, `arcsin`, `arccos`, `arctg`
//!
//! ### Key Methods
//! - `Symbols(symbols: &str)` - create multiple symbols from a comma-separated string
//! - `substitute_variable()` / `substitute_map()` - structural substitution
//! - `rename_variables()` - rename symbols from a map
//! - `free_symbols()` - ordered set of symbol names in the tree
//! - `replace_subexpr()` - replace every occurrence of a whole subtree
//!
//! Differentiation lives in `symbolic_engine_derivatives`, simplification in
//! `symbolic_simplify`, serialization in `symbolic_serialize` and parsing in
//! `parse_expr`.

#![allow(non_camel_case_types)]

use std::collections::{BTreeSet, HashMap};

/// Symbolic expression tree.
///
/// Trees are immutable values: every transformation returns a new tree.
///
/// # Examples
/// ```rust, ignore
/// use RustedPMP::symbolic::symbolic_engine::Expr;
/// let x = Expr::var("x");
/// let expr = x * Expr::Const(2.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Named symbol
    Var(String),
    /// Numerical constant
    Const(f64),
    /// left + right
    Add(Box<Expr>, Box<Expr>),
    /// left - right
    Sub(Box<Expr>, Box<Expr>),
    /// left * right
    Mul(Box<Expr>, Box<Expr>),
    /// left / right
    Div(Box<Expr>, Box<Expr>),
    /// base ^ exponent
    Pow(Box<Expr>, Box<Expr>),
    /// e^x
    Exp(Box<Expr>),
    /// natural logarithm
    Ln(Box<Expr>),
    sin(Box<Expr>),
    cos(Box<Expr>),
    /// tangent, mathematical notation 'tg'
    tg(Box<Expr>),
    arcsin(Box<Expr>),
    arccos(Box<Expr>),
    /// arctangent, mathematical notation 'arctg'
    arctg(Box<Expr>),
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::Add(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sub(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Mul(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::Div(self.boxed(), rhs.boxed())
    }
}

impl std::ops::AddAssign for Expr {
    fn add_assign(&mut self, rhs: Self) {
        *self = Expr::Add(Box::new(self.clone()), Box::new(rhs));
    }
}

impl std::ops::SubAssign for Expr {
    fn sub_assign(&mut self, rhs: Self) {
        *self = Expr::Sub(Box::new(self.clone()), Box::new(rhs));
    }
}

impl std::ops::MulAssign for Expr {
    fn mul_assign(&mut self, rhs: Self) {
        *self = Expr::Mul(Box::new(self.clone()), Box::new(rhs));
    }
}

impl std::ops::DivAssign for Expr {
    fn div_assign(&mut self, rhs: Self) {
        *self = Expr::Div(Box::new(self.clone()), Box::new(rhs));
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::Mul(Box::new(Expr::Const(-1.0)), Box::new(self))
    }
}

impl Expr {
    /// BASIC FEATURES

    /// Creates a named symbol.
    pub fn var(name: &str) -> Expr {
        Expr::Var(name.to_string())
    }

    /// Creates multiple symbols from a comma-separated string ("x, y, z").
    /// Empty entries are skipped.
    pub fn Symbols(symbols: &str) -> Vec<Expr> {
        symbols
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(Expr::var)
            .collect()
    }

    /// Wraps the expression in a Box for the recursive variants.
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    pub fn exp(self) -> Expr {
        Expr::Exp(self.boxed())
    }

    pub fn ln(self) -> Expr {
        Expr::Ln(self.boxed())
    }

    pub fn pow(self, rhs: Expr) -> Expr {
        Expr::Pow(self.boxed(), rhs.boxed())
    }

    /// Name of the symbol if the expression is a bare symbol.
    pub fn as_var(&self) -> Option<&str> {
        match self {
            Expr::Var(name) => Some(name.as_str()),
            _ => None,
        }
    }

    /// true if expression is exactly Const(0.0)
    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 0.0)
    }

    /// true if expression is exactly Const(1.0)
    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 1.0)
    }

    /// Rebuilds the node with `f` applied to each direct child. Leaves are cloned.
    pub fn map_children<F>(&self, f: &F) -> Expr
    where
        F: Fn(&Expr) -> Expr,
    {
        let b = |e: &Expr| Box::new(f(e));
        match self {
            Expr::Var(_) | Expr::Const(_) => self.clone(),
            Expr::Add(lhs, rhs) => Expr::Add(b(lhs), b(rhs)),
            Expr::Sub(lhs, rhs) => Expr::Sub(b(lhs), b(rhs)),
            Expr::Mul(lhs, rhs) => Expr::Mul(b(lhs), b(rhs)),
            Expr::Div(lhs, rhs) => Expr::Div(b(lhs), b(rhs)),
            Expr::Pow(base, exp) => Expr::Pow(b(base), b(exp)),
            Expr::Exp(arg) => Expr::Exp(b(arg)),
            Expr::Ln(arg) => Expr::Ln(b(arg)),
            Expr::sin(arg) => Expr::sin(b(arg)),
            Expr::cos(arg) => Expr::cos(b(arg)),
            Expr::tg(arg) => Expr::tg(b(arg)),
            Expr::arcsin(arg) => Expr::arcsin(b(arg)),
            Expr::arccos(arg) => Expr::arccos(b(arg)),
            Expr::arctg(arg) => Expr::arctg(b(arg)),
        }
    }

    /// Direct children of the node, left to right.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Var(_) | Expr::Const(_) => Vec::new(),
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => vec![lhs.as_ref(), rhs.as_ref()],
            Expr::Exp(arg)
            | Expr::Ln(arg)
            | Expr::sin(arg)
            | Expr::cos(arg)
            | Expr::tg(arg)
            | Expr::arcsin(arg)
            | Expr::arccos(arg)
            | Expr::arctg(arg) => vec![arg.as_ref()],
        }
    }

    /// Substitutes a symbol with an expression.
    pub fn substitute_variable(&self, var: &str, expr: &Expr) -> Expr {
        match self {
            Expr::Var(name) if name == var => expr.clone(),
            _ => self.map_children(&|child| child.substitute_variable(var, expr)),
        }
    }

    /// Substitutes several symbols at once. The substitution is simultaneous:
    /// symbols inside the inserted expressions are not substituted again.
    pub fn substitute_map(&self, map: &HashMap<String, Expr>) -> Expr {
        match self {
            Expr::Var(name) => map.get(name).cloned().unwrap_or_else(|| self.clone()),
            _ => self.map_children(&|child| child.substitute_map(map)),
        }
    }

    /// Substitutes symbols with numeric values.
    pub fn set_variable_from_map(&self, var_map: &HashMap<String, f64>) -> Expr {
        match self {
            Expr::Var(name) if var_map.contains_key(name) => Expr::Const(var_map[name]),
            _ => self.map_children(&|child| child.set_variable_from_map(var_map)),
        }
    }

    /// rename variables from a map
    pub fn rename_variables(&self, var_map: &HashMap<String, String>) -> Expr {
        match self {
            Expr::Var(name) if var_map.contains_key(name) => Expr::Var(var_map[name].clone()),
            _ => self.map_children(&|child| child.rename_variables(var_map)),
        }
    }

    /// Replaces every occurrence of the whole subtree `target` with `with`.
    pub fn replace_subexpr(&self, target: &Expr, with: &Expr) -> Expr {
        if self == target {
            return with.clone();
        }
        self.map_children(&|child| child.replace_subexpr(target, with))
    }

    /// check if the expression contains a variable
    pub fn contains_variable(&self, var_name: &str) -> bool {
        match self {
            Expr::Var(name) => name == var_name,
            Expr::Const(_) => false,
            _ => self
                .children()
                .into_iter()
                .any(|child| child.contains_variable(var_name)),
        }
    }

    /// true if any of the named symbols occurs in the expression
    pub fn contains_any<S: AsRef<str>>(&self, names: &[S]) -> bool {
        names.iter().any(|name| self.contains_variable(name.as_ref()))
    }

    /// Ordered, deduplicated set of symbol names occurring in the expression.
    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut acc = BTreeSet::new();
        self.collect_symbols(&mut acc);
        acc
    }

    fn collect_symbols(&self, acc: &mut BTreeSet<String>) {
        match self {
            Expr::Var(name) => {
                acc.insert(name.clone());
            }
            Expr::Const(_) => {}
            _ => {
                for child in self.children() {
                    child.collect_symbols(acc);
                }
            }
        }
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .into_iter()
            .map(|child| child.node_count())
            .sum::<usize>()
    }

    /// Sum of a sequence of expressions, `0` for an empty sequence.
    pub fn sum<I: IntoIterator<Item = Expr>>(terms: I) -> Expr {
        let mut iter = terms.into_iter();
        match iter.next() {
            Some(first) => iter.fold(first, |acc, term| acc + term),
            None => Expr::Const(0.0),
        }
    }
}

//___________________________________MACROS____________________________________

/// Macro to create symbolic variables from a comma-separated list
/// Usage: symbols!(x, y, z) -> creates variables x, y, z
#[macro_export]
macro_rules! symbols {
    ($($var:ident),+ $(,)?) => {
        (
            $(
                $crate::symbolic::symbolic_engine::Expr::Var(stringify!($var).to_string())
            ),+
        )
    };
}
