//! Reading trees from XML dumps.
//!
//! The external parser can serialise the trees it produces as XML, one
//! `<tree>` element per node:
//!
//! ```xml
//! <root>
//!   <tree type="CompilationUnit" pos="0" length="42">
//!     <tree type="SimpleName" label="Foo" pos="13" length="3"/>
//!   </tree>
//! </root>
//! ```
//!
//! `type` is required; `label`, `pos` and `length` default to empty and zero.
//! Elements other than `<tree>` are skipped.

mod parser;

pub use parser::{parse_file, parse_str, TreeDumpParser};
