//! The type emitter (spec.md §4.2): translates a type-position AST node
//! into a `CType` (base + declarator tail), recognised purely by AST
//! shape — no type environment, no inference.
use once_cell::sync::Lazy;
use std::collections::HashSet;

use rustpython_ast as ast;

use crate::ast_ext::range_of;
use crate::ctype::CType;
use crate::error::{Error, Location, Result};
use crate::tags::TagKind;
use crate::wildcard::is_wildcard_name;

use super::Translator;

static PRIMITIVES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["int", "char", "float", "double", "long", "short", "void"]
        .into_iter()
        .collect()
});

/// Subscript heads that unconditionally wrap their argument as a C
/// qualifier/storage-class or, for `long`/`short`, compose multi-word
/// primitive bases (`unsigned[long[long]]` => `unsigned long long` — see
/// DESIGN.md's resolution of the spec's tie-break note on this point).
static COMPOSING_HEADS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "const", "volatile", "unsigned", "signed", "static", "extern", "long", "short",
    ]
    .into_iter()
    .collect()
});

pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(name)
}

pub fn is_type_subscript_head(name: &str) -> bool {
    COMPOSING_HEADS.contains(name) || matches!(name, "type" | "enum" | "union" | "list" | "bit")
}

impl<'a> Translator<'a> {
    pub fn emit_type(&mut self, expr: &ast::Expr) -> Result<CType> {
        match expr {
            ast::Expr::Name(n) => self.emit_type_name(n.id.as_str(), expr),
            ast::Expr::UnaryOp(u) => self.emit_type_unary(u),
            ast::Expr::Subscript(s) => self.emit_type_subscript(s),
            ast::Expr::Call(c) => self.emit_type_call(c),
            other => Err(self.unrecognised(other, "type expression")),
        }
    }

    fn unrecognised(&self, expr: &ast::Expr, expected: &'static str) -> Error {
        Error::UnrecognisedPattern {
            at: Location::from_range(self.source, range_of(expr)),
            expected,
            found: format!("{:?}", std::mem::discriminant(expr)),
        }
    }

    fn emit_type_name(&mut self, name: &str, node: &ast::Expr) -> Result<CType> {
        if matches!(name, "label" | "macro") || is_wildcard_name(name) {
            return Err(Error::ReservedMisuse {
                at: Location::from_range(self.source, range_of(node)),
                detail: format!(
                    "`{}` is reserved for its sentinel position and cannot be used as an ordinary type name",
                    name
                ),
            });
        }
        if PRIMITIVES.contains(name) {
            return Ok(CType::simple(name));
        }
        if let Some(info) = self.tags.get(name).copied() {
            if info.typedefd {
                return Ok(CType::simple(name));
            }
            return Err(Error::UnrecognisedPattern {
                at: Location::from_range(self.source, range_of(node)),
                expected: "typedef'd name or `type[N]`/`enum[N]`/`union[N]` wrapper",
                found: format!("bare tag name `{}`", name),
            });
        }
        // Not a primitive and not a user tag: assume an externally-defined
        // typedef name (e.g. from an `import`), emitted verbatim.
        Ok(CType::simple(name))
    }

    fn emit_type_unary(&mut self, u: &ast::ExprUnaryOp) -> Result<CType> {
        match u.op {
            ast::UnaryOp::USub => {
                let inner = self.emit_type(&u.operand)?;
                Ok(inner.pointer())
            }
            ast::UnaryOp::UAdd => {
                let inner = self.emit_type(&u.operand)?;
                if !matches!(inner.decl, crate::ctype::Decl::Array(..)) {
                    return Err(Error::UnrecognisedPattern {
                        at: Location::from_range(self.source, range_of(&u.operand)),
                        expected: "array type as operand of pointer-to-array `+`",
                        found: "non-array type".into(),
                    });
                }
                Ok(inner.pointer())
            }
            _ => Err(self.unrecognised(&u.operand, "`-` or `+` over a type expression")),
        }
    }

    fn emit_type_subscript(&mut self, s: &ast::ExprSubscript) -> Result<CType> {
        let head = match s.value.as_ref() {
            ast::Expr::Name(n) => Some(n.id.as_str()),
            _ => None,
        };

        match head {
            Some(h) if COMPOSING_HEADS.contains(h) => {
                let inner = self.emit_type(&s.slice)?;
                Ok(CType {
                    base: format!("{} {}", h, inner.base),
                    decl: inner.decl,
                })
            }
            Some("type") => self.emit_tag_reference(&s.slice, TagKind::Struct, "struct"),
            Some("enum") => self.emit_tag_reference(&s.slice, TagKind::Enum, "enum"),
            Some("union") => self.emit_tag_reference(&s.slice, TagKind::Union, "union"),
            Some("list") => self.emit_type_list_subscript(&s.slice),
            Some("bit") => self.emit_type_bitfield(&s.slice),
            _ => {
                // General case: array of `value` with extent `slice`.
                let inner = self.emit_type(&s.value)?;
                let extent = self.emit_expr(&s.slice)?;
                Ok(inner.array(extent))
            }
        }
    }

    fn emit_tag_reference(
        &mut self,
        slice: &ast::Expr,
        expected_kind: TagKind,
        keyword: &'static str,
    ) -> Result<CType> {
        let name = match slice {
            ast::Expr::Name(n) => n.id.as_str(),
            other => {
                return Err(self.unrecognised(other, "bare tag name"));
            }
        };
        match self.tags.get(name) {
            Some(info) if info.kind == expected_kind => {
                Ok(CType::simple(format!("{} {}", keyword, name)))
            }
            Some(_) => Err(Error::UnrecognisedPattern {
                at: Location::from_range(self.source, range_of(slice)),
                expected: "a tag of the matching composite kind",
                found: format!("`{}` declared as a different kind", name),
            }),
            None => Err(Error::UnrecognisedPattern {
                at: Location::from_range(self.source, range_of(slice)),
                expected: "a tag declared earlier in the translation unit",
                found: format!("undeclared tag `{}`", name),
            }),
        }
    }

    fn emit_type_list_subscript(&mut self, slice: &ast::Expr) -> Result<CType> {
        match slice {
            ast::Expr::Tuple(t) if t.elts.len() == 2 => {
                let inner = self.emit_type(&t.elts[0])?;
                let extent = self.emit_expr(&t.elts[1])?;
                Ok(inner.array(extent))
            }
            other => {
                let inner = self.emit_type(other)?;
                Ok(inner.array(""))
            }
        }
    }

    fn emit_type_bitfield(&mut self, slice: &ast::Expr) -> Result<CType> {
        match slice {
            ast::Expr::Tuple(t) if t.elts.len() == 2 => {
                let inner = self.emit_type(&t.elts[0])?;
                let width = self.emit_expr(&t.elts[1])?;
                Ok(inner.bitfield(width))
            }
            other => Err(Error::AnnotationMismatch {
                at: Location::from_range(self.source, range_of(other)),
                detail: "`bit[T, n]` requires exactly a base type and a width".into(),
            }),
        }
    }

    fn emit_type_call(&mut self, c: &ast::ExprCall) -> Result<CType> {
        let ret = self.emit_type(&c.func)?;
        if !matches!(ret.decl, crate::ctype::Decl::Ident) {
            return Err(Error::UnrecognisedPattern {
                at: Location::from_range(self.source, range_of(&c.func)),
                expected: "a simple return type for a function-pointer type",
                found: "a derived (array/function) return type".into(),
            });
        }
        let mut params = Vec::with_capacity(c.args.len());
        for arg in &c.args {
            let pty = self.emit_type(arg)?;
            params.push(pty.render(""));
        }
        Ok(ret.function(params).pointer())
    }
}
