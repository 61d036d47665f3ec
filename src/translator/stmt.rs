//! The statement emitter (spec.md §4.4): control flow, loops, `switch`,
//! labels and `goto`. Every statement-position node (top-level or nested)
//! flows through `emit_stmt`; declaration-shaped statements are forwarded to
//! `decl.rs`.
use rustpython_ast as ast;

use crate::ast_ext::{as_if_continue, range_of, range_of_stmt};
use crate::ctype::Decl;
use crate::error::{Error, Location, Result};

use super::Translator;

impl<'a> Translator<'a> {
    pub fn emit_stmt(&mut self, stmt: &ast::Stmt) -> Result<()> {
        match stmt {
            ast::Stmt::ClassDef(c) => self.emit_classdef(c),
            ast::Stmt::FunctionDef(f) => self.emit_functiondef(f),
            ast::Stmt::Import(i) => self.emit_import(i),
            ast::Stmt::ImportFrom(i) => self.emit_import_from(i),
            ast::Stmt::AnnAssign(a) => self.emit_annotated_assign(a),
            ast::Stmt::Assign(a) => self.emit_assign(a),
            ast::Stmt::AugAssign(a) => self.emit_aug_assign(a),
            ast::Stmt::If(i) => self.emit_if(i),
            ast::Stmt::While(w) => self.emit_while(w),
            ast::Stmt::For(f) => self.emit_for(f),
            ast::Stmt::Match(m) => self.emit_match(m),
            ast::Stmt::Return(r) => self.emit_return(r),
            ast::Stmt::Break(_) => {
                use std::fmt::Write;
                let _ = writeln!(self.w, "break;");
                Ok(())
            }
            ast::Stmt::Continue(_) => {
                use std::fmt::Write;
                let _ = writeln!(self.w, "continue;");
                Ok(())
            }
            ast::Stmt::Raise(r) => self.emit_raise(r),
            ast::Stmt::Expr(e) => self.emit_expr_stmt(e),
            ast::Stmt::Pass(_) => Ok(()),
            ast::Stmt::TypeAlias(t) => self.emit_type_alias(t),
            other => Err(self.unrecognised_stmt(other, "statement")),
        }
    }

    fn unrecognised_stmt(&self, stmt: &ast::Stmt, expected: &'static str) -> Error {
        Error::UnrecognisedPattern {
            at: Location::from_range(self.source, range_of_stmt(stmt)),
            expected,
            found: format!("{:?}", std::mem::discriminant(stmt)),
        }
    }

    /// A braced block: `{ <body> }`, no trailing newline.
    pub fn emit_block(&mut self, body: &[ast::Stmt]) -> Result<()> {
        use std::fmt::Write;
        self.w.write_str("{\n").ok();
        self.w.indent();
        for s in body {
            self.emit_stmt(s)?;
        }
        self.w.dedent();
        let _ = write!(self.w, "}}");
        Ok(())
    }

    fn emit_if(&mut self, top: &ast::StmtIf) -> Result<()> {
        if crate::ast_ext::as_single_elt_list(&top.test).is_some() {
            self.emit_preprocessor_if(top)
        } else {
            self.emit_runtime_if(top)
        }
    }

    fn emit_runtime_if(&mut self, top: &ast::StmtIf) -> Result<()> {
        use std::fmt::Write;
        self.write_if_header("if", &top.test)?;
        self.emit_block(&top.body)?;
        let mut orelse: &[ast::Stmt] = &top.orelse;
        loop {
            match orelse {
                [ast::Stmt::If(next)] => {
                    self.w.write_str(" else ").ok();
                    self.write_if_header("if", &next.test)?;
                    self.emit_block(&next.body)?;
                    orelse = &next.orelse;
                }
                [] => {
                    let _ = writeln!(self.w);
                    break;
                }
                other => {
                    self.w.write_str(" else ").ok();
                    self.emit_block(other)?;
                    let _ = writeln!(self.w);
                    break;
                }
            }
        }
        Ok(())
    }

    fn write_if_header(&mut self, keyword: &str, test: &ast::Expr) -> Result<()> {
        use std::fmt::Write;
        let cond = self.emit_expr(test)?;
        let _ = write!(self.w, "{} ({}) ", keyword, cond);
        Ok(())
    }

    /// The preprocessor conditional encoding (spec.md §4.4's `if [E]:` table).
    /// The whole `if`/`elif`/`else` chain at this nesting level is treated as
    /// one `#if`/`#elif`/`#else`/`#endif` run — this is decided once, from
    /// the first `if`'s test shape, not re-checked at each `elif`.
    fn emit_preprocessor_if(&mut self, top: &ast::StmtIf) -> Result<()> {
        use std::fmt::Write;
        self.write_directive("if", &top.test)?;
        for s in &top.body {
            self.emit_stmt(s)?;
        }
        let mut orelse: &[ast::Stmt] = &top.orelse;
        loop {
            match orelse {
                [ast::Stmt::If(next)] => {
                    self.write_directive("elif", &next.test)?;
                    for s in &next.body {
                        self.emit_stmt(s)?;
                    }
                    orelse = &next.orelse;
                }
                [] => break,
                other => {
                    let _ = writeln!(self.w, "#else");
                    for s in other {
                        self.emit_stmt(s)?;
                    }
                    break;
                }
            }
        }
        let _ = writeln!(self.w, "#endif");
        Ok(())
    }

    fn write_directive(&mut self, kind: &str, test: &ast::Expr) -> Result<()> {
        use std::fmt::Write;
        let inner = crate::ast_ext::as_single_elt_list(test).ok_or_else(|| {
            Error::AnnotationMismatch {
                at: Location::from_range(self.source, range_of(test)),
                detail: format!("preprocessor `{}` must use the `[E]` bracket form", kind),
            }
        })?;
        match inner {
            ast::Expr::Name(n) => {
                let line = if kind == "if" {
                    format!("#ifdef {}", n.id)
                } else {
                    format!("#elif defined({})", n.id)
                };
                let _ = writeln!(self.w, "{}", line);
            }
            ast::Expr::UnaryOp(u) if matches!(u.op, ast::UnaryOp::Not) => {
                if let ast::Expr::Name(n) = u.operand.as_ref() {
                    let line = if kind == "if" {
                        format!("#ifndef {}", n.id)
                    } else {
                        format!("#elif !defined({})", n.id)
                    };
                    let _ = writeln!(self.w, "{}", line);
                } else {
                    let e = self.emit_expr(inner)?;
                    let directive = if kind == "if" { "#if" } else { "#elif" };
                    let _ = writeln!(self.w, "{} {}", directive, e);
                }
            }
            other => {
                let e = self.emit_expr(other)?;
                let directive = if kind == "if" { "#if" } else { "#elif" };
                let _ = writeln!(self.w, "{} {}", directive, e);
            }
        }
        Ok(())
    }

    fn emit_while(&mut self, w: &ast::StmtWhile) -> Result<()> {
        use std::fmt::Write;
        if !w.orelse.is_empty() {
            return Err(Error::UnrecognisedPattern {
                at: Location::from_range(self.source, range_of_stmt(&ast::Stmt::While(w.clone()))),
                expected: "a `while` with no `else` clause",
                found: "`while`/`else`".into(),
            });
        }
        if crate::ast_ext::is_empty_tuple(&w.test) {
            if let Some(last) = w.body.last() {
                if let Some(cond_expr) = as_if_continue(last) {
                    let cond = self.emit_expr(cond_expr)?;
                    let body = &w.body[..w.body.len() - 1];
                    self.w.write_str("do ").ok();
                    self.emit_block(body)?;
                    let _ = writeln!(self.w, " while ({});", cond);
                    return Ok(());
                }
            }
            self.w.write_str("for (;;) ").ok();
            self.emit_block(&w.body)?;
            let _ = writeln!(self.w);
            return Ok(());
        }
        let cond = self.emit_expr(&w.test)?;
        let _ = write!(self.w, "while ({}) ", cond);
        self.emit_block(&w.body)?;
        let _ = writeln!(self.w);
        Ok(())
    }

    /// `for VARS in TYPES(INIT)(COND)(STEP): body` (spec.md §4.4).
    fn emit_for(&mut self, f: &ast::StmtFor) -> Result<()> {
        use std::fmt::Write;
        if !f.orelse.is_empty() {
            return Err(Error::UnrecognisedPattern {
                at: Location::from_range(self.source, range_of_stmt(&ast::Stmt::For(f.clone()))),
                expected: "a `for` with no `else` clause",
                found: "`for`/`else`".into(),
            });
        }
        let call3 = match f.iter.as_ref() {
            ast::Expr::Call(c) => c,
            other => {
                return Err(Error::UnrecognisedPattern {
                    at: Location::from_range(self.source, range_of(other)),
                    expected: "the `TYPES(INIT)(COND)(STEP)` call chain",
                    found: "non-call iterator".into(),
                })
            }
        };
        let call2 = match call3.func.as_ref() {
            ast::Expr::Call(c) => c,
            other => {
                return Err(Error::UnrecognisedPattern {
                    at: Location::from_range(self.source, range_of(other)),
                    expected: "the `TYPES(INIT)(COND)(STEP)` call chain",
                    found: "incomplete call chain".into(),
                })
            }
        };
        let call1 = match call2.func.as_ref() {
            ast::Expr::Call(c) => c,
            other => {
                return Err(Error::UnrecognisedPattern {
                    at: Location::from_range(self.source, range_of(other)),
                    expected: "the `TYPES(INIT)(COND)(STEP)` call chain",
                    found: "incomplete call chain".into(),
                })
            }
        };
        if call1.args.len() != 1 || call2.args.len() != 1 || call3.args.len() != 1 {
            return Err(Error::AnnotationMismatch {
                at: Location::from_range(self.source, range_of_stmt(&ast::Stmt::For(f.clone()))),
                detail: "each of INIT, COND and STEP must be a single call argument".into(),
            });
        }

        let vars = tuple_or_single_names(&f.target).map_err(|_| Error::AnnotationMismatch {
            at: Location::from_range(self.source, range_of(&f.target)),
            detail: "`for` target must be a name or tuple of names".into(),
        })?;
        let types_list = tuple_or_single_exprs(&call1.func);
        if vars.len() != types_list.len() {
            return Err(Error::AnnotationMismatch {
                at: Location::from_range(self.source, range_of_stmt(&ast::Stmt::For(f.clone()))),
                detail: "VARS and TYPES have mismatched arity".into(),
            });
        }
        let inits = tuple_or_single_exprs(&call1.args[0]);
        if inits.len() != vars.len() {
            return Err(Error::AnnotationMismatch {
                at: Location::from_range(self.source, range_of_stmt(&ast::Stmt::For(f.clone()))),
                detail: "VARS and INIT have mismatched arity".into(),
            });
        }

        let mut ctys = Vec::with_capacity(vars.len());
        let mut init_vals = Vec::with_capacity(vars.len());
        for (i, init_expr) in inits.iter().enumerate() {
            let cty = self.emit_type(types_list[i])?;
            let value_expr = match init_expr {
                ast::Expr::NamedExpr(n) => &n.value,
                other => {
                    return Err(Error::AnnotationMismatch {
                        at: Location::from_range(self.source, range_of(other)),
                        detail: "each INIT element must be a walrus assignment `v := e`".into(),
                    })
                }
            };
            let value = self.emit_expr(value_expr)?;
            ctys.push(cty);
            init_vals.push(value);
        }

        let homogeneous = ctys
            .iter()
            .all(|c| c.decl == Decl::Ident && c.base == ctys[0].base);

        if homogeneous {
            let parts: Vec<String> = vars
                .iter()
                .zip(init_vals.iter())
                .map(|(v, val)| format!("{} = {}", v, val))
                .collect();
            let init_clause = format!("{} {}", ctys[0].base, parts.join(", "));
            let cond = self.emit_comma_expr(&call2.args[0])?;
            let step = self.emit_comma_expr(&call3.args[0])?;
            let _ = write!(self.w, "for ({}; {}; {}) ", init_clause, cond, step);
        } else {
            for (i, v) in vars.iter().enumerate() {
                let _ = writeln!(self.w, "{};", ctys[i].render(v));
            }
            let parts: Vec<String> = vars
                .iter()
                .zip(init_vals.iter())
                .map(|(v, val)| format!("{} = {}", v, val))
                .collect();
            let cond = self.emit_comma_expr(&call2.args[0])?;
            let step = self.emit_comma_expr(&call3.args[0])?;
            let _ = write!(self.w, "for ({}; {}; {}) ", parts.join(", "), cond, step);
        }
        self.emit_block(&f.body)?;
        let _ = writeln!(self.w);
        Ok(())
    }

    fn emit_comma_expr(&mut self, expr: &ast::Expr) -> Result<String> {
        match expr {
            ast::Expr::Tuple(t) => {
                let mut parts = Vec::with_capacity(t.elts.len());
                for e in &t.elts {
                    parts.push(self.emit_expr(e)?);
                }
                Ok(parts.join(", "))
            }
            other => self.emit_expr(other),
        }
    }

    /// `match`/`case` lowering to `switch`. Fallthrough is produced by the
    /// absence of an explicit `break` in the arm body; none is inserted.
    fn emit_match(&mut self, m: &ast::StmtMatch) -> Result<()> {
        use std::fmt::Write;
        let subject = self.emit_expr(&m.subject)?;
        let _ = writeln!(self.w, "switch ({}) {{", subject);
        self.w.indent();
        for case in &m.cases {
            if case.guard.is_some() {
                return Err(Error::UnrecognisedPattern {
                    at: Location::from_range(self.source, range_of(&m.subject)),
                    expected: "a `case` with no guard clause",
                    found: "guarded match arm".into(),
                });
            }
            match &case.pattern {
                ast::Pattern::MatchValue(v) => {
                    let val = self.emit_expr(&v.value)?;
                    let _ = writeln!(self.w, "case {}:", val);
                }
                ast::Pattern::MatchAs(a)
                    if a.pattern.is_none()
                        && a.name.as_ref().map(|n| n.as_str()) == Some(crate::wildcard::WILDCARD) =>
                {
                    let _ = writeln!(self.w, "default:");
                }
                _ => {
                    return Err(Error::UnrecognisedPattern {
                        at: Location::from_range(self.source, range_of(&m.subject)),
                        expected: "a literal `case V:` or the wildcard `case W:` default arm",
                        found: "unsupported match pattern".into(),
                    });
                }
            }
            self.w.indent();
            for s in &case.body {
                self.emit_stmt(s)?;
            }
            self.w.dedent();
        }
        self.w.dedent();
        let _ = writeln!(self.w, "}}");
        Ok(())
    }

    fn emit_return(&mut self, r: &ast::StmtReturn) -> Result<()> {
        use std::fmt::Write;
        match &r.value {
            Some(v) => {
                let text = self.emit_expr(v)?;
                let _ = writeln!(self.w, "return {};", text);
            }
            None => {
                let _ = writeln!(self.w, "return;");
            }
        }
        Ok(())
    }

    /// Bare `raise NAME` -> `goto NAME;`.
    fn emit_raise(&mut self, r: &ast::StmtRaise) -> Result<()> {
        use std::fmt::Write;
        if r.cause.is_some() {
            return Err(Error::UnrecognisedPattern {
                at: Location::from_range(self.source, range_of_stmt(&ast::Stmt::Raise(r.clone()))),
                expected: "a bare `raise NAME` with no `from` clause",
                found: "`raise ... from ...`".into(),
            });
        }
        match &r.exc {
            Some(e) => match e.as_ref() {
                ast::Expr::Name(n) => {
                    let _ = writeln!(self.w, "goto {};", n.id);
                    Ok(())
                }
                other => Err(Error::UnrecognisedPattern {
                    at: Location::from_range(self.source, range_of(other)),
                    expected: "a bare identifier naming a label",
                    found: "non-identifier raise target".into(),
                }),
            },
            None => Err(Error::UnrecognisedPattern {
                at: Location::from_range(self.source, range_of_stmt(&ast::Stmt::Raise(r.clone()))),
                expected: "`raise NAME`",
                found: "bare `raise`".into(),
            }),
        }
    }

    fn emit_assign(&mut self, a: &ast::StmtAssign) -> Result<()> {
        use std::fmt::Write;
        if a.targets.len() != 1 {
            return Err(Error::UnrecognisedPattern {
                at: Location::from_range(self.source, range_of_stmt(&ast::Stmt::Assign(a.clone()))),
                expected: "a single assignment target",
                found: "chained assignment".into(),
            });
        }
        let lhs = self.emit_expr(&a.targets[0])?;
        let rhs = self.emit_expr(&a.value)?;
        let _ = writeln!(self.w, "{} = {};", lhs, rhs);
        Ok(())
    }

    fn emit_aug_assign(&mut self, a: &ast::StmtAugAssign) -> Result<()> {
        use std::fmt::Write;
        let op = match a.op {
            ast::Operator::Add => "+=",
            ast::Operator::Sub => "-=",
            ast::Operator::Mult => "*=",
            ast::Operator::Div => "/=",
            ast::Operator::Mod => "%=",
            ast::Operator::LShift => "<<=",
            ast::Operator::RShift => ">>=",
            ast::Operator::BitOr => "|=",
            ast::Operator::BitXor => "^=",
            ast::Operator::BitAnd => "&=",
            _ => {
                return Err(Error::UnrecognisedPattern {
                    at: Location::from_range(
                        self.source,
                        range_of_stmt(&ast::Stmt::AugAssign(a.clone())),
                    ),
                    expected: "an augmented-assignment operator with a direct C counterpart",
                    found: "unsupported operator".into(),
                })
            }
        };
        let lhs = self.emit_expr(&a.target)?;
        let rhs = self.emit_expr(&a.value)?;
        let _ = writeln!(self.w, "{} {} {};", lhs, op, rhs);
        Ok(())
    }

    /// Bare top-level `_Atomic`/`_Alignas`/`_Thread_local`/`_Alignof`/
    /// `_Static_assert` forms pass through verbatim, arguments lowered.
    fn try_emit_passthrough(&mut self, c: &ast::ExprCall) -> Option<Result<()>> {
        use std::fmt::Write;
        let name = match c.func.as_ref() {
            ast::Expr::Name(n) => n.id.as_str(),
            _ => return None,
        };
        if !matches!(
            name,
            "_Atomic" | "_Alignas" | "_Thread_local" | "_Alignof" | "_Static_assert"
        ) {
            return None;
        }
        Some((|| {
            let mut args = Vec::with_capacity(c.args.len());
            for a in &c.args {
                args.push(self.emit_expr(a)?);
            }
            let _ = writeln!(self.w, "{}({});", name, args.join(", "));
            Ok(())
        })())
    }

    fn emit_expr_stmt(&mut self, e: &ast::StmtExpr) -> Result<()> {
        use std::fmt::Write;
        if let ast::Expr::Call(c) = e.value.as_ref() {
            if let Some(result) = self.try_emit_passthrough(c) {
                return result;
            }
        }
        let text = self.emit_expr(&e.value)?;
        let _ = writeln!(self.w, "{};", text);
        Ok(())
    }
}

fn tuple_or_single_names(expr: &ast::Expr) -> std::result::Result<Vec<String>, ()> {
    match expr {
        ast::Expr::Tuple(t) => t
            .elts
            .iter()
            .map(|e| match e {
                ast::Expr::Name(n) => Ok(n.id.to_string()),
                _ => Err(()),
            })
            .collect(),
        ast::Expr::Name(n) => Ok(vec![n.id.to_string()]),
        _ => Err(()),
    }
}

fn tuple_or_single_exprs(expr: &ast::Expr) -> Vec<&ast::Expr> {
    match expr {
        ast::Expr::Tuple(t) => t.elts.iter().collect(),
        other => vec![other],
    }
}
