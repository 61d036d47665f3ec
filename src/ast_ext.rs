//! Small predicate helpers over `rustpython_ast` node shapes, in the spirit
//! of the teacher's `DeclaratorExt`/`Typed` extension traits
//! (examples/bbqsrc-cpr's `parser/emit/utils.rs`): local, syntactic,
//! read-only.
use rustpython_ast as ast;

/// `[E]` — a list literal with exactly one element.
pub fn as_single_elt_list(expr: &ast::Expr) -> Option<&ast::Expr> {
    match expr {
        ast::Expr::List(l) if l.elts.len() == 1 => Some(&l.elts[0]),
        _ => None,
    }
}

/// `()` — the empty tuple literal.
pub fn is_empty_tuple(expr: &ast::Expr) -> bool {
    matches!(expr, ast::Expr::Tuple(t) if t.elts.is_empty())
}

/// A decorator is either a bare name (`@Typedef`) or a call
/// (`@Typedef(Node)`); both are recognised, the call form carrying
/// arguments.
pub fn decorator_call<'a>(expr: &'a ast::Expr) -> Option<(&'a str, &'a [ast::Expr])> {
    match expr {
        ast::Expr::Name(n) => Some((n.id.as_str(), &[])),
        ast::Expr::Call(c) => match c.func.as_ref() {
            ast::Expr::Name(n) => Some((n.id.as_str(), &c.args[..])),
            _ => None,
        },
        _ => None,
    }
}

pub fn as_name(expr: &ast::Expr) -> Option<&str> {
    match expr {
        ast::Expr::Name(n) => Some(n.id.as_str()),
        _ => None,
    }
}

/// A single-statement body whose only statement is `continue`.
pub fn is_bare_continue(stmt: &ast::Stmt) -> bool {
    matches!(stmt, ast::Stmt::Continue(_))
}

/// `if EXPR: continue` with nothing else in the `if`'s body and no `else`.
pub fn as_if_continue(stmt: &ast::Stmt) -> Option<&ast::Expr> {
    match stmt {
        ast::Stmt::If(i) if i.body.len() == 1 && i.orelse.is_empty() && is_bare_continue(&i.body[0]) => {
            Some(&i.test)
        }
        _ => None,
    }
}

pub fn range_of(expr: &ast::Expr) -> rustpython_parser::text_size::TextRange {
    use rustpython_ast::Ranged;
    expr.range()
}

pub fn range_of_stmt(stmt: &ast::Stmt) -> rustpython_parser::text_size::TextRange {
    use rustpython_ast::Ranged;
    stmt.range()
}
