//! PQL text: parsing and canonical serialization.
//!
//! # Syntax Overview
//!
//! ```text
//! expr       := operation (',' operation)*
//! operation  := identifier '(' arglist? ')'
//! arglist    := arg (',' arg)*
//! arg        := operation | scalar
//! scalar     := quoted-string | number | bareword
//! ```
//!
//! - **Comparators**: `eq(donor.gender,"male")`, `in(donor.age,22,23)`
//! - **Combinators**: `and(...)`, `or(...)`, `not(...)`
//! - **Raw-token operators**: `exists`, `missing`, `select`, `facets`
//! - **Meta terms**: `limit(from,size)`, `sort(+field,-field)`, `count(...,field)`
//!
//! Top-level operations separated by commas are an implicit AND.

mod parser;
mod serializer;

pub(crate) use parser::is_bareword;
pub use parser::{parse_pql, Parser, DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT};
pub use serializer::{to_pql, to_pql_json};
