//! Recognition of the reserved wildcard identifier `W` (spec.md §3, §9).
//!
//! Per the design note: "Wildcard recognition is always a direct name check
//! — never a pattern that requires looking ahead or resolving scope."
use rustpython_ast as ast;

pub const WILDCARD: &str = "W";

pub fn is_wildcard_name(id: &str) -> bool {
    id == WILDCARD
}

/// True if `expr` is exactly the bare identifier `W`.
pub fn is_wildcard(expr: &ast::Expr) -> bool {
    matches!(expr, ast::Expr::Name(n) if is_wildcard_name(n.id.as_str()))
}
