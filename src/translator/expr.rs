//! The expression emitter (spec.md §4.3): translates value-position AST
//! nodes into C expression text, handling the reserved wildcard `W` and the
//! cast/sizeof/compound-literal pseudo-forms.
use rustpython_ast as ast;

use crate::ast_ext::range_of;
use crate::error::{Error, Location, Result};
use crate::wildcard::{is_wildcard, is_wildcard_name, WILDCARD};

use super::Translator;

impl<'a> Translator<'a> {
    pub fn emit_expr(&mut self, expr: &ast::Expr) -> Result<String> {
        match expr {
            ast::Expr::Name(n) => self.emit_name(n),
            ast::Expr::Attribute(a) => self.emit_attribute(a),
            ast::Expr::Subscript(s) => self.emit_value_subscript(s),
            ast::Expr::Call(c) => self.emit_call(c),
            ast::Expr::BinOp(b) => self.emit_binop(b),
            ast::Expr::UnaryOp(u) => self.emit_unaryop(u),
            ast::Expr::BoolOp(b) => self.emit_boolop(b),
            ast::Expr::Compare(c) => self.emit_compare(c),
            ast::Expr::IfExp(i) => self.emit_ifexp(i),
            ast::Expr::NamedExpr(n) => self.emit_namedexpr(n),
            ast::Expr::Constant(c) => self.emit_constant(c),
            ast::Expr::List(l) => self.emit_brace_init(&l.elts),
            ast::Expr::Tuple(t) => self.emit_brace_init(&t.elts),
            other => Err(self.unrecognised(other, "value expression")),
        }
    }

    /// A list/tuple literal in value position is a C brace-init list
    /// (spec.md §3: `C` "is pushed ... on entry to each element of a
    /// brace-init list"). The element type is the contextual type's array
    /// element when `C` is an array declarator; otherwise each element is
    /// lowered under the same contextual type as the list itself, so a
    /// nested `W(...)` compound literal one level down still resolves.
    fn emit_brace_init(&mut self, elts: &[ast::Expr]) -> Result<String> {
        let elem_ty = self.contextual_type().cloned().map(|ctx| match ctx.decl {
            crate::ctype::Decl::Array(inner, _) => crate::ctype::CType {
                base: ctx.base,
                decl: *inner,
            },
            other => crate::ctype::CType {
                base: ctx.base,
                decl: other,
            },
        });
        let mut parts = Vec::with_capacity(elts.len());
        for e in elts {
            if let Some(ty) = &elem_ty {
                self.ctx.push(ty.clone());
            }
            let text = self.emit_expr(e);
            if elem_ty.is_some() {
                self.ctx.pop();
            }
            parts.push(text?);
        }
        Ok(format!("{{ {} }}", parts.join(", ")))
    }

    fn unrecognised(&self, expr: &ast::Expr, expected: &'static str) -> Error {
        Error::UnrecognisedPattern {
            at: Location::from_range(self.source, range_of(expr)),
            expected,
            found: format!("{:?}", std::mem::discriminant(expr)),
        }
    }

    fn emit_name(&mut self, n: &ast::ExprName) -> Result<String> {
        if is_wildcard_name(n.id.as_str()) {
            return Err(Error::ReservedMisuse {
                at: Location::from_range(self.source, range_of(&ast::Expr::Name(n.clone()))),
                detail: "`W` used as an ordinary identifier".into(),
            });
        }
        Ok(n.id.to_string())
    }

    /// `W.x` chain recognition: walks an attribute chain rooted at `W`,
    /// returning the dotted suffix text if the root is the wildcard.
    fn wildcard_attr_chain(&self, a: &ast::ExprAttribute) -> Option<String> {
        match a.value.as_ref() {
            ast::Expr::Name(n) if is_wildcard_name(n.id.as_str()) => Some(a.attr.to_string()),
            ast::Expr::Attribute(inner) => self
                .wildcard_attr_chain(inner)
                .map(|prefix| format!("{}.{}", prefix, a.attr)),
            _ => None,
        }
    }

    fn emit_attribute(&mut self, a: &ast::ExprAttribute) -> Result<String> {
        // `p.W.x` -> `p->x`, recognised as a single form.
        if let ast::Expr::Attribute(inner) = a.value.as_ref() {
            if inner.attr.as_str() == WILDCARD {
                let base = self.emit_expr(&inner.value)?;
                return Ok(format!("{}->{}", base, a.attr));
            }
        }
        // `e.W` -> `*e` (parenthesised unless `e` is already an atomic name).
        if a.attr.as_str() == WILDCARD {
            let base = self.emit_expr(&a.value)?;
            return Ok(if matches!(a.value.as_ref(), ast::Expr::Name(_)) {
                format!("*{}", base)
            } else {
                format!("*({})", base)
            });
        }
        // `W.x` (any attribute chain) -> `&x`.
        if let Some(chain) = self.wildcard_attr_chain(a) {
            return Ok(format!("&{}", chain));
        }
        let base = self.emit_expr(&a.value)?;
        Ok(format!("{}.{}", base, a.attr))
    }

    fn emit_value_subscript(&mut self, s: &ast::ExprSubscript) -> Result<String> {
        let base = self.emit_expr(&s.value)?;
        let index = self.emit_expr(&s.slice)?;
        Ok(format!("{}[{}]", base, index))
    }

    fn emit_call(&mut self, c: &ast::ExprCall) -> Result<String> {
        // Cast: `L(expr)` where `L` is `[T]`.
        if let Some(ty_expr) = crate::ast_ext::as_single_elt_list(&c.func) {
            if c.args.len() == 1 && c.keywords.is_empty() {
                let ty = self.emit_type(ty_expr)?;
                let inner = self.emit_expr(&c.args[0])?;
                return Ok(format!("(({})({}))", ty.render(""), inner));
            }
        }

        if let ast::Expr::Name(n) = c.func.as_ref() {
            if n.id.as_str() == "sizeof" && c.args.len() == 1 && c.keywords.is_empty() {
                return self.emit_sizeof(&c.args[0]);
            }
            if is_wildcard_name(n.id.as_str()) && c.args.is_empty() && !c.keywords.is_empty() {
                return self.emit_compound_literal(c);
            }
        }

        if !c.keywords.is_empty() {
            return Err(Error::UnrecognisedPattern {
                at: Location::from_range(self.source, range_of(&ast::Expr::Call(c.clone()))),
                expected: "a call without keyword arguments",
                found: "keyword arguments on an ordinary call".into(),
            });
        }

        let func = self.emit_expr(&c.func)?;
        let mut args = Vec::with_capacity(c.args.len());
        for a in &c.args {
            args.push(self.emit_expr(a)?);
        }
        Ok(format!("{}({})", func, args.join(", ")))
    }

    fn is_type_position(&self, e: &ast::Expr) -> bool {
        match e {
            ast::Expr::Name(n) => {
                super::types::is_primitive(n.id.as_str())
                    || self
                        .tags
                        .get(n.id.as_str())
                        .map_or(false, |i| i.typedefd)
            }
            ast::Expr::UnaryOp(u) => matches!(u.op, ast::UnaryOp::USub | ast::UnaryOp::UAdd),
            ast::Expr::Subscript(s) => matches!(
                s.value.as_ref(),
                ast::Expr::Name(n) if super::types::is_type_subscript_head(n.id.as_str())
            ),
            _ => false,
        }
    }

    fn emit_sizeof(&mut self, arg: &ast::Expr) -> Result<String> {
        if self.is_type_position(arg) {
            let ty = self.emit_type(arg)?;
            Ok(format!("sizeof({})", ty.render("")))
        } else {
            let val = self.emit_expr(arg)?;
            Ok(format!("sizeof({})", val))
        }
    }

    fn emit_compound_literal(&mut self, c: &ast::ExprCall) -> Result<String> {
        let ctx = self.contextual_type().cloned().ok_or_else(|| Error::MissingContext {
            at: Location::from_range(self.source, range_of(&ast::Expr::Call(c.clone()))),
        })?;
        let mut fields = Vec::with_capacity(c.keywords.len());
        for kw in &c.keywords {
            let name = kw.arg.as_ref().ok_or_else(|| Error::UnrecognisedPattern {
                at: Location::from_range(self.source, range_of(&kw.value)),
                expected: "a named field in a compound literal",
                found: "unpacked `**` argument".into(),
            })?;
            let value = self.emit_expr(&kw.value)?;
            fields.push(format!(".{}={}", name, value));
        }
        Ok(format!("({}){{ {} }}", ctx.render(""), fields.join(", ")))
    }

    fn emit_binop(&mut self, b: &ast::ExprBinOp) -> Result<String> {
        if matches!(b.op, ast::Operator::Pow | ast::Operator::FloorDiv) {
            return self.emit_inc_dec(b);
        }
        let op = match b.op {
            ast::Operator::Add => "+",
            ast::Operator::Sub => "-",
            ast::Operator::Mult => "*",
            ast::Operator::Div => "/",
            ast::Operator::Mod => "%",
            ast::Operator::LShift => "<<",
            ast::Operator::RShift => ">>",
            ast::Operator::BitOr => "|",
            ast::Operator::BitXor => "^",
            ast::Operator::BitAnd => "&",
            ast::Operator::Pow | ast::Operator::FloorDiv => unreachable!(),
            _ => {
                return Err(Error::UnrecognisedPattern {
                    at: Location::from_range(self.source, range_of(&ast::Expr::BinOp(b.clone()))),
                    expected: "a binary operator with a direct C counterpart",
                    found: "unsupported operator".into(),
                })
            }
        };
        let lhs = self.emit_expr(&b.left)?;
        let rhs = self.emit_expr(&b.right)?;
        Ok(format!("({} {} {})", lhs, op, rhs))
    }

    /// `e ** W` / `W ** e` / `e // W` / `W // e` — increment/decrement
    /// encodings. Only fire when one operand is exactly the wildcard;
    /// any other use of `**`/`//` is reserved.
    fn emit_inc_dec(&mut self, b: &ast::ExprBinOp) -> Result<String> {
        let is_pow = matches!(b.op, ast::Operator::Pow);
        let token = if is_pow { "++" } else { "--" };
        if is_wildcard(&b.right) && !is_wildcard(&b.left) {
            let lhs = self.emit_expr(&b.left)?;
            return Ok(format!("{}{}", lhs, token));
        }
        if is_wildcard(&b.left) && !is_wildcard(&b.right) {
            let rhs = self.emit_expr(&b.right)?;
            return Ok(format!("{}{}", token, rhs));
        }
        Err(Error::ReservedMisuse {
            at: Location::from_range(self.source, range_of(&ast::Expr::BinOp(b.clone()))),
            detail: "`**`/`//` are reserved for the wildcard increment/decrement forms".into(),
        })
    }

    fn emit_unaryop(&mut self, u: &ast::ExprUnaryOp) -> Result<String> {
        let operand = self.emit_expr(&u.operand)?;
        let text = match u.op {
            ast::UnaryOp::Not => format!("!{}", operand),
            ast::UnaryOp::Invert => format!("~{}", operand),
            ast::UnaryOp::USub => format!("-{}", operand),
            ast::UnaryOp::UAdd => format!("+{}", operand),
        };
        Ok(text)
    }

    fn emit_boolop(&mut self, b: &ast::ExprBoolOp) -> Result<String> {
        let op = match b.op {
            ast::BoolOp::And => "&&",
            ast::BoolOp::Or => "||",
        };
        let mut parts = Vec::with_capacity(b.values.len());
        for v in &b.values {
            parts.push(self.emit_expr(v)?);
        }
        Ok(format!("({})", parts.join(&format!(" {} ", op))))
    }

    fn emit_compare(&mut self, c: &ast::ExprCompare) -> Result<String> {
        if c.ops.len() != 1 {
            return Err(Error::UnrecognisedPattern {
                at: Location::from_range(self.source, range_of(&ast::Expr::Compare(c.clone()))),
                expected: "a single, non-chained comparison",
                found: "a chained comparison".into(),
            });
        }
        let op = match c.ops[0] {
            ast::CmpOp::Lt => "<",
            ast::CmpOp::LtE => "<=",
            ast::CmpOp::Gt => ">",
            ast::CmpOp::GtE => ">=",
            ast::CmpOp::Eq | ast::CmpOp::Is => "==",
            ast::CmpOp::NotEq | ast::CmpOp::IsNot => "!=",
            ast::CmpOp::In | ast::CmpOp::NotIn => {
                return Err(Error::UnrecognisedPattern {
                    at: Location::from_range(self.source, range_of(&ast::Expr::Compare(c.clone()))),
                    expected: "a comparison with a direct C counterpart",
                    found: "`in`/`not in`".into(),
                })
            }
        };
        let lhs = self.emit_expr(&c.left)?;
        let rhs = self.emit_expr(&c.comparators[0])?;
        Ok(format!("({} {} {})", lhs, op, rhs))
    }

    fn emit_ifexp(&mut self, i: &ast::ExprIfExp) -> Result<String> {
        let test = self.emit_expr(&i.test)?;
        let body = self.emit_expr(&i.body)?;
        let orelse = self.emit_expr(&i.orelse)?;
        Ok(format!("({} ? {} : {})", test, body, orelse))
    }

    fn emit_namedexpr(&mut self, n: &ast::ExprNamedExpr) -> Result<String> {
        let target = self.emit_expr(&n.target)?;
        let value = self.emit_expr(&n.value)?;
        Ok(format!("({} = {})", target, value))
    }

    fn emit_constant(&mut self, c: &ast::ExprConstant) -> Result<String> {
        use rustpython_ast::Constant;
        let text = match &c.value {
            Constant::None => "NULL".to_string(),
            Constant::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            Constant::Int(i) => i.to_string(),
            Constant::Float(f) => format!("{:?}", f),
            Constant::Str(s) => format!("\"{}\"", escape_c_string(s)),
            Constant::Bytes(b) => format!("\"{}\"", escape_c_bytes(b)),
            Constant::Ellipsis => "...".to_string(),
            Constant::Complex { .. } | Constant::Tuple(_) => {
                return Err(Error::UnrecognisedPattern {
                    at: Location::from_range(self.source, range_of(&ast::Expr::Constant(c.clone()))),
                    expected: "a constant with a direct C counterpart",
                    found: "complex/tuple constant".into(),
                })
            }
        };
        Ok(text)
    }
}

fn escape_c_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

fn escape_c_bytes(b: &[u8]) -> String {
    let mut out = String::with_capacity(b.len());
    for &byte in b {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'"' => out.push_str("\\\""),
            b'\n' => out.push_str("\\n"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(byte as char),
            other => out.push_str(&format!("\\x{:02x}", other)),
        }
    }
    out
}
