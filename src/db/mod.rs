//! Database access: statements, the backend trait and the MySQL actor.
//!
//! Layout:
//! - `statement.rs`: `Statement`, `ExecResult`, row type and identifier quoting
//! - `traits.rs`: the `Database` seam every component is generic over
//! - `actor.rs`: ractor actor owning the `MySqlPool`
//! - `decode.rs`: MySQL row to JSON decoding

pub mod actor;
pub mod statement;
pub mod traits;

mod decode;

pub use actor::{DbActorHandle, spawn};
pub use statement::{ExecResult, Row, Statement, quote_ident, quote_literal};
pub use traits::Database;
