//! The `(base, decl-tail)` intermediate representation the type emitter
//! produces (spec.md §4.2). C splits "base type" from the per-name
//! declarator suffix for arrays, function pointers and pointer-to-array;
//! this module models that split explicitly and merges it into full C
//! declarator text, the way the teacher's `translator/rg.rs` keeps a small
//! structured representation (`AliasDeclaration`, `Constant`, …) local to
//! the emitter that needs it instead of inlining string concatenation
//! everywhere.

/// The declarator tree built up around the name being declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    /// The name itself; the innermost node of every declarator tree.
    Ident,
    Ptr(Box<Decl>),
    /// Array of the inner declarator, with a (possibly empty, for a
    /// flexible array member) extent expression already lowered to text.
    Array(Box<Decl>, String),
    /// Function declarator: inner declarator applied to a parameter list.
    Func(Box<Decl>, Vec<String>),
    /// Bitfield: valid only as a struct/union field; the inner declarator
    /// is always `Ident` in practice (bitfields are not further derived).
    Bitfield(Box<Decl>, String),
}

/// A fully-formed C type: the base type text plus the declarator tree that
/// wraps a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CType {
    pub base: String,
    pub decl: Decl,
}

impl CType {
    pub fn simple(base: impl Into<String>) -> Self {
        CType {
            base: base.into(),
            decl: Decl::Ident,
        }
    }

    pub fn pointer(self) -> Self {
        CType {
            base: self.base,
            decl: Decl::Ptr(Box::new(self.decl)),
        }
    }

    pub fn array(self, extent: impl Into<String>) -> Self {
        CType {
            base: self.base,
            decl: Decl::Array(Box::new(self.decl), extent.into()),
        }
    }

    pub fn function(self, params: Vec<String>) -> Self {
        CType {
            base: self.base,
            decl: Decl::Func(Box::new(self.decl), params),
        }
    }

    pub fn bitfield(self, width: impl Into<String>) -> Self {
        CType {
            base: self.base,
            decl: Decl::Bitfield(Box::new(self.decl), width.into()),
        }
    }

    /// Render a full declaration fragment for `name` (pass `""` for an
    /// abstract declarator, e.g. inside a cast or `sizeof`).
    pub fn render(&self, name: &str) -> String {
        let declarator = render_decl(&self.decl, name);
        if declarator.is_empty() {
            self.base.clone()
        } else {
            format!("{} {}", self.base, declarator)
        }
    }

    /// True if this type's outermost declarator node is an array with an
    /// empty extent (a flexible array member).
    pub fn is_flexible_array(&self) -> bool {
        matches!(&self.decl, Decl::Array(_, extent) if extent.is_empty())
    }

    pub fn is_bitfield(&self) -> bool {
        matches!(&self.decl, Decl::Bitfield(..))
    }
}

/// True for declarator nodes that bind tighter than `*` (array and
/// function), and therefore force parentheses when a pointer wraps them
/// directly.
fn is_postfix(decl: &Decl) -> bool {
    matches!(decl, Decl::Array(..) | Decl::Func(..))
}

fn render_decl(decl: &Decl, name: &str) -> String {
    match decl {
        Decl::Ident => name.to_string(),
        Decl::Ptr(inner) => {
            let inner_text = render_decl(inner, name);
            if is_postfix(inner) {
                format!("(*{})", inner_text)
            } else {
                format!("*{}", inner_text)
            }
        }
        Decl::Array(inner, extent) => {
            let inner_text = render_decl(inner, name);
            format!("{}[{}]", inner_text, extent)
        }
        Decl::Func(inner, params) => {
            let inner_text = render_decl(inner, name);
            let plist = if params.is_empty() {
                "void".to_string()
            } else {
                params.join(", ")
            };
            format!("{}({})", inner_text, plist)
        }
        Decl::Bitfield(inner, width) => {
            let inner_text = render_decl(inner, name);
            format!("{} : {}", inner_text, width)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_name() {
        let t = CType::simple("int");
        assert_eq!(t.render("x"), "int x");
    }

    #[test]
    fn pointer() {
        let t = CType::simple("int").pointer();
        assert_eq!(t.render("px"), "int *px");
    }

    #[test]
    fn pointer_to_pointer() {
        let t = CType::simple("int").pointer().pointer();
        assert_eq!(t.render("ppx"), "int **ppx");
    }

    #[test]
    fn array_of_pointer() {
        let t = CType::simple("int").pointer().array("4");
        assert_eq!(t.render("a"), "int *a[4]");
    }

    #[test]
    fn pointer_to_array() {
        let t = CType::simple("int").array("4").pointer();
        assert_eq!(t.render("p"), "int (*p)[4]");
    }

    #[test]
    fn pointer_to_function() {
        let t = CType::simple("int")
            .function(vec!["int".to_string(), "int".to_string()])
            .pointer();
        assert_eq!(t.render("f"), "int (*f)(int, int)");
    }

    #[test]
    fn flexible_array_member() {
        let t = CType::simple("int").array("");
        assert!(t.is_flexible_array());
        assert_eq!(t.render("tail"), "int tail[]");
    }
}
