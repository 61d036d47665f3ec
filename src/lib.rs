//! Arafura: a source-to-source translator from a Python-syntax surface
//! language into C99/C11.
//!
//! The pipeline has three stages, run once per translation unit:
//! 1. AST ingest (`rustpython_parser`) — no additional preprocessing.
//! 2. The tag-name pre-pass ([`tags`]), a single read-only walk recording
//!    composite tag names and their typedef status.
//! 3. The pattern-directed lowering walk ([`translator`]), which recognises
//!    C constructs from local AST shape alone.
pub mod ast_ext;
pub mod ctype;
pub mod error;
pub mod tags;
pub mod translator;
pub mod wildcard;

pub use error::{Error, Location, Result};

/// Translate one SurfaceLang translation unit into C source text.
///
/// This is the single entry point the CLI calls; it runs all three stages
/// and returns either the emitted C text or the first error encountered.
pub fn translate(source: &str) -> Result<String> {
    log::debug!("parsing {} bytes of source", source.len());
    let parsed = rustpython_parser::parse(source, rustpython_parser::Mode::Module, "<input>")?;
    let body = match parsed {
        rustpython_ast::Mod::Module(m) => m.body,
        _ => Vec::new(),
    };
    log::debug!("parsed {} top-level statements", body.len());
    let out = translator::translate(source, &body)?;
    log::info!("emitted {} bytes of C", out.len());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_arithmetic_and_dereference() {
        let src = "\
x: int = 5\n\
px: -int = W.x\n\
v: int = px.W\n\
px.W = 10\n\
";
        let out = translate(src).unwrap();
        assert!(out.contains("int x = 5;"));
        assert!(out.contains("int *px = &x;"));
        assert!(out.contains("int v = *px;"));
        assert!(out.contains("*px = 10;"));
    }

    #[test]
    fn typedef_struct_with_pointer_member() {
        let src = "\
@Typedef(Node)\n\
class Node:\n\
    data: int\n\
    next: -Node\n\
";
        let out = translate(src).unwrap();
        assert!(out.contains("typedef struct Node {"));
        assert!(out.contains("int data;"));
        assert!(out.contains("Node *next;"));
        assert!(out.contains("} Node;"));
    }

    #[test]
    fn unrecognised_pattern_reports_a_location() {
        let src = "x: int = {1, 2}\n";
        let err = translate(src).unwrap_err();
        assert!(matches!(err, Error::Parse(_)) || matches!(err, Error::UnrecognisedPattern { .. }));
    }

    #[test]
    fn c_style_for_with_two_variables() {
        let src = "\
for (i, j) in (int, int)((i := 0, j := 10))(i < 5)((i ** W, j // W)):\n    \
pass\n";
        let out = translate(src).unwrap();
        assert!(out.contains("for (int i = 0, j = 10;"));
        assert!(out.contains("i < 5"));
        assert!(out.contains("i++, j--"));
    }

    #[test]
    fn do_while_vs_infinite_for() {
        let src = "\
while ():\n    \
stmt()\n    \
i ** W\n    \
if i < 10:\n        \
continue\n";
        let out = translate(src).unwrap();
        assert!(out.contains("do {"));
        assert!(out.contains("stmt();"));
        assert!(out.contains("i++;"));
        assert!(out.contains("while ("));
        assert!(out.contains("i < 10"));

        let src_no_continue = "\
while ():\n    \
stmt()\n    \
i ** W\n";
        let out2 = translate(src_no_continue).unwrap();
        assert!(out2.contains("for (;;) {"));
        assert!(out2.contains("stmt();"));
        assert!(out2.contains("i++;"));
    }

    #[test]
    fn preprocessor_chain() {
        let src = "\
if [DEBUG]:\n    \
a()\n\
elif [VERBOSE]:\n    \
b()\n\
elif [QUIET]:\n    \
c()\n\
else:\n    \
d()\n";
        let out = translate(src).unwrap();
        assert!(out.contains("#ifdef DEBUG"));
        assert!(out.contains("a();"));
        assert!(out.contains("#elif defined(VERBOSE)"));
        assert!(out.contains("b();"));
        assert!(out.contains("#elif defined(QUIET)"));
        assert!(out.contains("c();"));
        assert!(out.contains("#else"));
        assert!(out.contains("d();"));
        assert!(out.contains("#endif"));
    }

    #[test]
    fn switch_with_fallthrough_and_default() {
        let src = "\
match x:\n    \
case 1:\n        \
printf(\"one\")\n        \
break\n    \
case 2:\n        \
printf(\"two or three\")\n    \
case 3:\n        \
printf(\"three\")\n        \
break\n    \
case W:\n        \
printf(\"other\")\n        \
break\n";
        let out = translate(src).unwrap();
        assert!(out.contains("switch (x) {"));
        assert!(out.contains("case 1:"));
        assert!(out.contains("case 2:"));
        assert!(out.contains("case 3:"));
        assert!(out.contains("default:"));
        // case 2 falls through: no `break;` between its body and `case 3:`.
        let case2_pos = out.find("case 2:").unwrap();
        let case3_pos = out.find("case 3:").unwrap();
        assert!(!out[case2_pos..case3_pos].contains("break;"));
    }

    #[test]
    fn sizeof_typedef_name_vs_tag_reference() {
        let src = "\
@Typedef(Foo)\n\
class Foo:\n    \
x: int\n\
\n\
class Bar:\n    \
y: int\n\
\n\
a: int = sizeof(Foo)\n\
b: int = sizeof(type[Bar])\n";
        let out = translate(src).unwrap();
        assert!(out.contains("sizeof(Foo)"));
        assert!(out.contains("sizeof(struct Bar)"));
    }

    #[test]
    fn include_directives() {
        use pretty_assertions::assert_eq;
        let src = "import stdio\nfrom posix import *\n";
        let out = translate(src).unwrap();
        assert_eq!(out, "#include \"stdio.h\"\n#include <posix.h>\n");
    }

    #[test]
    fn flexible_array_member_as_last_field() {
        let src = "\
class Packet:\n    \
len: int\n    \
data: list[char]\n";
        let out = translate(src).unwrap();
        assert!(out.contains("int len;"));
        assert!(out.contains("char data[];"));
    }

    #[test]
    fn flexible_array_member_not_last_is_rejected() {
        let src = "\
class Packet:\n    \
data: list[char]\n    \
len: int\n";
        let err = translate(src).unwrap_err();
        assert!(matches!(err, Error::AnnotationMismatch { .. }));
    }

    #[test]
    fn bitfield_inside_struct() {
        let src = "\
class Flags:\n    \
ready: bit[unsigned[int], 1]\n    \
mode: bit[unsigned[int], 3]\n";
        let out = translate(src).unwrap();
        assert!(out.contains("unsigned int ready : 1;"));
        assert!(out.contains("unsigned int mode : 3;"));
    }

    #[test]
    fn bitfield_outside_struct_is_rejected() {
        let src = "x: bit[int, 4] = 0\n";
        let err = translate(src).unwrap_err();
        assert!(matches!(err, Error::AnnotationMismatch { .. }));
    }

    #[test]
    fn atomic_and_static_assert_passthrough() {
        let src = "_Static_assert(sizeof(int) == 4, \"bad int size\")\n";
        let out = translate(src).unwrap();
        assert!(out.contains("_Static_assert((sizeof(int) == 4), \"bad int size\");"));
    }

    #[test]
    fn brace_init_list_of_scalars() {
        let src = "arr: int[3] = [1, 2, 3]\n";
        let out = translate(src).unwrap();
        assert!(out.contains("int arr[3] = { 1, 2, 3 };"));
    }

    #[test]
    fn brace_init_list_of_compound_literals() {
        let src = "\
@Typedef(Node)\n\
class Node:\n    \
x: int\n\
\n\
arr: Node[2] = [W(x=1), W(x=2)]\n";
        let out = translate(src).unwrap();
        assert!(out.contains("Node arr[2] = { (Node){ .x=1 }, (Node){ .x=2 } };"));
    }

    #[test]
    fn type_alias() {
        let src = "type Celsius = int\n";
        let out = translate(src).unwrap();
        assert!(out.contains("typedef int Celsius;"));
    }

    #[test]
    fn type_alias_of_pointer() {
        let src = "type IntPtr = -int\n";
        let out = translate(src).unwrap();
        assert!(out.contains("typedef int *IntPtr;"));
    }

    #[test]
    fn reserved_names_rejected_as_ordinary_type() {
        let err = translate("x: label = 5\n").unwrap_err();
        assert!(matches!(err, Error::ReservedMisuse { .. }));

        let err = translate("y: W = 1\n").unwrap_err();
        assert!(matches!(err, Error::ReservedMisuse { .. }));
    }
}
