//! Stage 3: the lowering walk (spec.md §4), partitioned into the four
//! grammatical categories the spec calls out. Each category is a `impl
//! Translator` block in its own file; all of them share one `Translator`
//! that owns the tag set `T`, the contextual-type stack `C`, and the
//! output writer.
pub mod decl;
pub mod expr;
pub mod stmt;
pub mod types;
pub mod writer;

use rustpython_ast as ast;

use crate::ctype::CType;
use crate::error::Result;
use crate::tags::TagSet;
use writer::Writer;

pub struct Translator<'a> {
    pub source: &'a str,
    pub tags: TagSet,
    /// Contextual type `C`: pushed on entry to a declaration or brace-init
    /// element, popped on exit. Empty outside declaration lowering.
    pub ctx: Vec<CType>,
    pub w: Writer,
}

impl<'a> Translator<'a> {
    pub fn new(source: &'a str, tags: TagSet) -> Self {
        Translator {
            source,
            tags,
            ctx: Vec::new(),
            w: Writer::new(),
        }
    }

    pub fn contextual_type(&self) -> Option<&CType> {
        self.ctx.last()
    }

    pub fn translate_module(mut self, body: &[ast::Stmt]) -> Result<String> {
        for stmt in body {
            self.emit_stmt(stmt)?;
        }
        Ok(self.w.finish())
    }
}

/// Run the full pipeline: tag pre-pass, then the lowering walk.
pub fn translate(source: &str, body: &[ast::Stmt]) -> Result<String> {
    let tags = crate::tags::build_tag_set(body, source)?;
    let translator = Translator::new(source, tags);
    translator.translate_module(body)
}
