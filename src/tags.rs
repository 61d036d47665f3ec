//! Stage 2: the tag-name pre-pass (spec.md §4.1).
//!
//! A single walk over top-level definitions, recording composite tag names
//! and their typedef status. Emits nothing; order-independent; completes
//! before any lowering.
use std::collections::HashMap;

use rustpython_ast as ast;

use crate::ast_ext::decorator_call;
use crate::error::{Error, Location, Result};
use crate::wildcard::is_wildcard_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Struct,
    Union,
    Enum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagInfo {
    pub kind: TagKind,
    pub typedefd: bool,
}

pub type TagSet = HashMap<String, TagInfo>;

/// Classifies a class definition's base list into the composite kind it
/// declares. No base, or base `object`, is a struct.
pub fn classify_bases(bases: &[ast::Expr]) -> TagKind {
    for base in bases {
        if let ast::Expr::Name(n) = base {
            match n.id.as_str() {
                "Union" => return TagKind::Union,
                "Enum" => return TagKind::Enum,
                _ => {}
            }
        }
    }
    TagKind::Struct
}

fn has_typedef_decorator(decorators: &[ast::Expr], source: &str) -> Result<bool> {
    let mut found = false;
    for dec in decorators {
        let (name, _args) = match decorator_call(dec) {
            Some(x) => x,
            None => {
                return Err(Error::UnrecognisedPattern {
                    at: Location::from_range(source, crate::ast_ext::range_of(dec)),
                    expected: "decorator name or call",
                    found: "complex expression".into(),
                });
            }
        };
        match name {
            "Typedef" => found = true,
            "Var" => {}
            other => {
                return Err(Error::UnknownDecorator {
                    at: Location::from_range(source, crate::ast_ext::range_of(dec)),
                    name: other.to_string(),
                });
            }
        }
    }
    Ok(found)
}

/// Walks top-level statements only; records every class definition's name
/// (unless it is the anonymous wildcard `W`) together with its composite
/// kind and typedef status.
pub fn build_tag_set(body: &[ast::Stmt], source: &str) -> Result<TagSet> {
    let mut tags = TagSet::new();
    for stmt in body {
        if let ast::Stmt::ClassDef(cd) = stmt {
            let name = cd.name.as_str();
            let typedefd = has_typedef_decorator(&cd.decorator_list, source)?;
            let kind = classify_bases(&cd.bases);
            if !is_wildcard_name(name) {
                log::debug!("tag {} kind={:?} typedef'd={}", name, kind, typedefd);
                tags.insert(name.to_string(), TagInfo { kind, typedefd });
            }
        }
    }
    Ok(tags)
}
