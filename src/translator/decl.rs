//! The declaration emitter (spec.md §4.5): composite type definitions,
//! functions vs. function-like macros, imports and top-level variable/macro
//! declarations.
use rustpython_ast as ast;

use crate::ast_ext::{as_name, decorator_call, range_of, range_of_stmt};
use crate::ctype::Decl;
use crate::error::{Error, Location, Result};
use crate::tags::{classify_bases, TagKind};
use crate::wildcard::is_wildcard_name;

use super::writer::Writer;
use super::Translator;

impl<'a> Translator<'a> {
    pub fn emit_classdef(&mut self, cd: &ast::StmtClassDef) -> Result<()> {
        self.emit_composite(cd, true)
    }

    /// Shared by top-level composite definitions and inline nested members —
    /// C allows a `struct`/`union`/`enum` definition to nest directly inside
    /// another, so the same renderer handles both, distinguished only by
    /// whether a trailing blank line separates it from its sibling.
    fn emit_composite(&mut self, cd: &ast::StmtClassDef, top_level: bool) -> Result<()> {
        use std::fmt::Write;
        let kind = classify_bases(&cd.bases);
        let keyword = match kind {
            TagKind::Struct => "struct",
            TagKind::Union => "union",
            TagKind::Enum => "enum",
        };
        let is_anon = is_wildcard_name(cd.name.as_str());
        let is_enum = matches!(kind, TagKind::Enum);

        let mut want_typedef = false;
        let mut typedef_alias: Option<String> = None;
        let mut var_names: Vec<String> = Vec::new();
        for dec in &cd.decorator_list {
            let (name, args) = decorator_call(dec).ok_or_else(|| Error::UnrecognisedPattern {
                at: Location::from_range(self.source, range_of(dec)),
                expected: "a decorator name or call",
                found: "complex expression".into(),
            })?;
            match name {
                "Typedef" => {
                    want_typedef = true;
                    if let Some(arg) = args.first() {
                        typedef_alias = Some(
                            as_name(arg)
                                .ok_or_else(|| Error::UnrecognisedPattern {
                                    at: Location::from_range(self.source, range_of(arg)),
                                    expected: "a bare alias name",
                                    found: "complex expression".into(),
                                })?
                                .to_string(),
                        );
                    }
                }
                "Var" => {
                    if args.is_empty() {
                        return Err(Error::AnnotationMismatch {
                            at: Location::from_range(self.source, range_of(dec)),
                            detail: "`@Var` requires at least one variable name argument".into(),
                        });
                    }
                    for arg in args {
                        var_names.push(
                            as_name(arg)
                                .ok_or_else(|| Error::UnrecognisedPattern {
                                    at: Location::from_range(self.source, range_of(arg)),
                                    expected: "a bare variable name",
                                    found: "complex expression".into(),
                                })?
                                .to_string(),
                        );
                    }
                }
                other => {
                    return Err(Error::UnknownDecorator {
                        at: Location::from_range(self.source, range_of(dec)),
                        name: other.to_string(),
                    })
                }
            }
        }

        let tag_name = if is_anon { None } else { Some(cd.name.as_str()) };
        if is_anon && var_names.is_empty() && !want_typedef {
            return Err(Error::AnnotationMismatch {
                at: Location::from_range(self.source, range_of_stmt(&ast::Stmt::ClassDef(cd.clone()))),
                detail: "an anonymous composite needs `@Var(n1, n2, ...)` or `@Typedef(alias)` to bind it to something".into(),
            });
        }

        let prefix = if want_typedef { "typedef " } else { "" };
        let header = match tag_name {
            Some(n) => format!("{}{} {} {{", prefix, keyword, n),
            None => format!("{}{} {{", prefix, keyword),
        };
        let _ = writeln!(self.w, "{}", header);
        self.w.indent();

        let content_count = cd.body.iter().filter(|s| !matches!(s, ast::Stmt::Pass(_))).count();
        let last_field_idx = cd
            .body
            .iter()
            .rposition(|s| matches!(s, ast::Stmt::AnnAssign(_)));
        let mut emitted = 0usize;
        for (idx, stmt) in cd.body.iter().enumerate() {
            if !is_enum {
                if let ast::Stmt::ClassDef(nested) = stmt {
                    self.emit_composite(nested, false)?;
                    continue;
                }
            }
            let is_last_field = Some(idx) == last_field_idx;
            let text = self.emit_composite_field(stmt, is_enum, is_last_field)?;
            if text.is_empty() {
                continue;
            }
            emitted += 1;
            if is_enum {
                let suffix = if emitted == content_count { "" } else { "," };
                let _ = writeln!(self.w, "{}{}", text, suffix);
            } else {
                let _ = writeln!(self.w, "{}", text);
            }
        }
        self.w.dedent();

        // `Typedef` alone closes the brace with the alias; `Var` alone closes
        // it with the variable list; combined, the typedef closes the brace
        // and the `Var` names become a second declaration using the alias
        // (spec.md §4.5: "`Typedef` then `Var` yields both the typedef and a
        // subsequent declaration using the typedef name").
        let alias = if want_typedef {
            Some(typedef_alias.or_else(|| tag_name.map(String::from)).ok_or_else(|| {
                Error::AnnotationMismatch {
                    at: Location::from_range(self.source, range_of_stmt(&ast::Stmt::ClassDef(cd.clone()))),
                    detail: "`@Typedef` on an anonymous composite requires an explicit alias".into(),
                }
            })?)
        } else {
            None
        };
        match (&alias, var_names.is_empty()) {
            (Some(a), _) => {
                let _ = write!(self.w, "}} {}", a);
            }
            (None, false) => {
                let _ = write!(self.w, "}} {}", var_names.join(", "));
            }
            (None, true) => {
                let _ = write!(self.w, "}}");
            }
        }
        let _ = writeln!(self.w, ";");
        if let Some(a) = &alias {
            if !var_names.is_empty() {
                let _ = writeln!(self.w, "{} {};", a, var_names.join(", "));
            }
        }
        if top_level {
            let _ = writeln!(self.w);
        }
        Ok(())
    }

    fn emit_composite_field(&mut self, stmt: &ast::Stmt, is_enum: bool, is_last_field: bool) -> Result<String> {
        if is_enum {
            match stmt {
                ast::Stmt::Assign(a) if a.targets.len() == 1 => {
                    let name = as_name(&a.targets[0]).ok_or_else(|| Error::UnrecognisedPattern {
                        at: Location::from_range(self.source, range_of(&a.targets[0])),
                        expected: "a bare enumerator name",
                        found: "complex assignment target".into(),
                    })?;
                    let val = self.emit_expr(&a.value)?;
                    Ok(format!("{} = {}", name, val))
                }
                ast::Stmt::Expr(e) => {
                    let name = as_name(&e.value).ok_or_else(|| Error::UnrecognisedPattern {
                        at: Location::from_range(self.source, range_of(&e.value)),
                        expected: "a bare enumerator name",
                        found: "complex expression".into(),
                    })?;
                    Ok(name.to_string())
                }
                ast::Stmt::Pass(_) => Ok(String::new()),
                other => Err(Error::UnrecognisedPattern {
                    at: Location::from_range(self.source, range_of_stmt(other)),
                    expected: "an enumerator (`NAME = value` or bare `NAME`)",
                    found: "unsupported statement in an `enum` body".into(),
                }),
            }
        } else {
            match stmt {
                ast::Stmt::AnnAssign(a) => {
                    let name = as_name(&a.target).ok_or_else(|| Error::UnrecognisedPattern {
                        at: Location::from_range(self.source, range_of(&a.target)),
                        expected: "a bare field name",
                        found: "complex assignment target".into(),
                    })?;
                    let cty = self.emit_type(&a.annotation)?;
                    if cty.is_flexible_array() && !is_last_field {
                        return Err(Error::AnnotationMismatch {
                            at: Location::from_range(self.source, range_of(&a.annotation)),
                            detail: "a flexible array member (`list[T]`) is only valid as the last field of a struct".into(),
                        });
                    }
                    Ok(format!("{};", cty.render(name)))
                }
                ast::Stmt::Pass(_) => Ok(String::new()),
                other => Err(Error::UnrecognisedPattern {
                    at: Location::from_range(self.source, range_of_stmt(other)),
                    expected: "a field declaration `name: T`",
                    found: "unsupported statement in a composite body".into(),
                }),
            }
        }
    }

    /// `def` dispatch: fully-annotated defs become C functions, fully
    /// unannotated defs become function-like `#define` macros, and a mix of
    /// the two is an error rather than a silent guess.
    pub fn emit_functiondef(&mut self, f: &ast::StmtFunctionDef) -> Result<()> {
        if !f.args.posonlyargs.is_empty() || !f.args.kwonlyargs.is_empty() || f.args.kwarg.is_some() {
            return Err(Error::UnrecognisedPattern {
                at: Location::from_range(self.source, range_of_stmt(&ast::Stmt::FunctionDef(f.clone()))),
                expected: "simple positional parameters only",
                found: "keyword-only or `**kwargs` parameters".into(),
            });
        }
        for p in &f.args.args {
            if p.default.is_some() {
                return Err(Error::UnrecognisedPattern {
                    at: Location::from_range(self.source, range_of_stmt(&ast::Stmt::FunctionDef(f.clone()))),
                    expected: "parameters with no default value",
                    found: "a default parameter value".into(),
                });
            }
        }

        let all_annotated = f.args.args.iter().all(|p| p.def.annotation.is_some()) && f.returns.is_some();
        let none_annotated = f.args.args.iter().all(|p| p.def.annotation.is_none()) && f.returns.is_none();

        if none_annotated {
            self.emit_macro_def(f)
        } else if all_annotated {
            self.emit_function_def(f)
        } else {
            Err(Error::AnnotationMismatch {
                at: Location::from_range(self.source, range_of_stmt(&ast::Stmt::FunctionDef(f.clone()))),
                detail: "a `def`'s parameters and return type must be either fully annotated (a function) or fully unannotated (a macro), not a mix".into(),
            })
        }
    }

    fn emit_function_def(&mut self, f: &ast::StmtFunctionDef) -> Result<()> {
        use std::fmt::Write;
        let ret = self.emit_type(f.returns.as_ref().unwrap())?;
        if !matches!(ret.decl, Decl::Ident) {
            return Err(Error::UnrecognisedPattern {
                at: Location::from_range(self.source, range_of(f.returns.as_ref().unwrap())),
                expected: "a simple (non-derived) return type",
                found: "an array or function-pointer return type".into(),
            });
        }
        let mut params = Vec::with_capacity(f.args.args.len());
        for p in &f.args.args {
            let ann = p.def.annotation.as_ref().unwrap();
            let cty = self.emit_type(ann)?;
            if cty.is_bitfield() {
                return Err(Error::AnnotationMismatch {
                    at: Location::from_range(self.source, range_of(ann)),
                    detail: "a bitfield (`bit[T, n]`) is only valid as a struct/union field".into(),
                });
            }
            params.push(cty.render(p.def.arg.as_str()));
        }
        if f.args.vararg.is_some() {
            params.push("...".to_string());
        }
        let signature = ret.function(params).render(f.name.as_str());
        let _ = write!(self.w, "{} ", signature);
        self.emit_block(&f.body)?;
        let _ = writeln!(self.w, "\n");
        Ok(())
    }

    /// An unannotated `def` becomes a function-like macro. A single-statement
    /// body is emitted inline; a multi-statement body is wrapped in the
    /// classic `do { ... } while (0)` idiom with backslash-continued lines,
    /// so the macro still behaves like one statement at the call site.
    fn emit_macro_def(&mut self, f: &ast::StmtFunctionDef) -> Result<()> {
        use std::fmt::Write;
        let mut params: Vec<String> = f.args.args.iter().map(|p| p.def.arg.to_string()).collect();
        if f.args.vararg.is_some() {
            params.push("...".to_string());
        }
        let header = if params.is_empty() {
            format!("#define {}", f.name)
        } else {
            format!("#define {}({})", f.name, params.join(", "))
        };

        let saved = std::mem::replace(&mut self.w, Writer::new());
        let result = (|| -> Result<()> {
            for s in &f.body {
                self.emit_stmt(s)?;
            }
            Ok(())
        })();
        let body_text = std::mem::replace(&mut self.w, saved).finish();
        result?;

        let lines: Vec<&str> = body_text.lines().filter(|l| !l.trim().is_empty()).collect();
        if lines.len() <= 1 {
            let body = lines.first().copied().unwrap_or("");
            let _ = writeln!(self.w, "{} {}\n", header, body);
        } else {
            let _ = writeln!(self.w, "{} do {{ \\", header);
            for (i, line) in lines.iter().enumerate() {
                if i + 1 == lines.len() {
                    let _ = writeln!(self.w, "    {}", line);
                } else {
                    let _ = writeln!(self.w, "    {} \\", line);
                }
            }
            let _ = writeln!(self.w, "}} while (0)\n");
        }
        Ok(())
    }

    /// `type ALIAS = T` (spec.md §4.5 "`type` aliases"): emits a plain
    /// `typedef`, using the type emitter's base/tail split to place `ALIAS`
    /// in the right declarator position for array/function-pointer `T`.
    /// Generic aliases (`type ALIAS[X] = T`) are out of scope — spec.md's
    /// own worked form is a bare alias name with no type parameters.
    pub fn emit_type_alias(&mut self, t: &ast::StmtTypeAlias) -> Result<()> {
        use std::fmt::Write;
        if !t.type_params.is_empty() {
            return Err(Error::UnrecognisedPattern {
                at: Location::from_range(
                    self.source,
                    range_of_stmt(&ast::Stmt::TypeAlias(t.clone())),
                ),
                expected: "a `type ALIAS = T` statement with no type parameters",
                found: "a generic type alias".into(),
            });
        }
        let name = as_name(&t.name).ok_or_else(|| Error::UnrecognisedPattern {
            at: Location::from_range(self.source, range_of(&t.name)),
            expected: "a bare alias name",
            found: "complex alias target".into(),
        })?;
        let cty = self.emit_type(&t.value)?;
        let _ = writeln!(self.w, "typedef {};", cty.render(name));
        Ok(())
    }

    pub fn emit_import(&mut self, i: &ast::StmtImport) -> Result<()> {
        use std::fmt::Write;
        for alias in &i.names {
            let _ = writeln!(self.w, "#include \"{}.h\"", alias.name);
        }
        Ok(())
    }

    pub fn emit_import_from(&mut self, i: &ast::StmtImportFrom) -> Result<()> {
        use std::fmt::Write;
        let module = i.module.as_ref().ok_or_else(|| Error::UnrecognisedPattern {
            at: Location::from_range(self.source, range_of_stmt(&ast::Stmt::ImportFrom(i.clone()))),
            expected: "a module name",
            found: "a relative import with no module".into(),
        })?;
        if i.names.len() != 1 || i.names[0].name.as_str() != "*" {
            return Err(Error::UnrecognisedPattern {
                at: Location::from_range(self.source, range_of_stmt(&ast::Stmt::ImportFrom(i.clone()))),
                expected: "`from N import *`",
                found: "a selective `from ... import ...`".into(),
            });
        }
        let _ = writeln!(self.w, "#include <{}.h>", module);
        Ok(())
    }

    /// `NAME: T = E` / `NAME: T` / `NAME: macro = E` / `NAME: label`
    /// (spec.md §4.5). Shared between top-level declarations and local
    /// declarations inside a function body — both use the same C syntax.
    pub fn emit_annotated_assign(&mut self, a: &ast::StmtAnnAssign) -> Result<()> {
        use std::fmt::Write;
        if let Some(ann_name) = as_name(&a.annotation) {
            if ann_name == "label" && a.value.is_none() {
                let name = as_name(&a.target).ok_or_else(|| Error::UnrecognisedPattern {
                    at: Location::from_range(self.source, range_of(&a.target)),
                    expected: "a bare name as a label target",
                    found: "complex label target".into(),
                })?;
                let _ = writeln!(self.w, "{}:", name);
                return Ok(());
            }
            if ann_name == "macro" {
                let name = as_name(&a.target).ok_or_else(|| Error::UnrecognisedPattern {
                    at: Location::from_range(self.source, range_of(&a.target)),
                    expected: "a bare name as a macro target",
                    found: "complex macro target".into(),
                })?;
                let value = a.value.as_ref().ok_or_else(|| Error::AnnotationMismatch {
                    at: Location::from_range(self.source, range_of(&a.target)),
                    detail: "a `macro` declaration requires a value".into(),
                })?;
                let text = self.emit_expr(value)?;
                let _ = writeln!(self.w, "#define {} {}", name, text);
                return Ok(());
            }
        }

        let name = as_name(&a.target).ok_or_else(|| Error::UnrecognisedPattern {
            at: Location::from_range(self.source, range_of(&a.target)),
            expected: "a bare name as a declaration target",
            found: "complex declaration target".into(),
        })?;
        let cty = self.emit_type(&a.annotation)?;
        if cty.is_bitfield() {
            return Err(Error::AnnotationMismatch {
                at: Location::from_range(self.source, range_of(&a.annotation)),
                detail: "a bitfield (`bit[T, n]`) is only valid as a struct/union field".into(),
            });
        }
        match &a.value {
            Some(v) => {
                self.ctx.push(cty.clone());
                let val = self.emit_expr(v);
                self.ctx.pop();
                let _ = writeln!(self.w, "{} = {};", cty.render(name), val?);
            }
            None => {
                let _ = writeln!(self.w, "{};", cty.render(name));
            }
        }
        Ok(())
    }
}
