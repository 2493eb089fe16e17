//! # sqlchain
//!
//! A fluent SQL statement builder for back-tick dialects (`LIMIT n OFFSET m`,
//! `INSERT INTO t SET ...`), with declarative model definitions on top.
//!
//! ## Features
//!
//! - **Composable parts**: projections ([`Fields`]), assignments
//!   ([`Assignments`]), nested AND/OR predicates ([`Predicate`]), joins
//!   ([`Join`]) and pagination ([`Paginator`]) are plain values
//! - **Two-level parameters**: builder templates (`?n` identifiers, `?p` raw
//!   fragments, `?u` assignment lists) expand before the driver binds its `?`
//! - **Compiled statement reuse**: [`Query::execute`] rebinds parameters
//!   until a clause changes
//! - **Errors as values**: every failure is a [`ChainError`], returned and
//!   kept in the builder's error log
//! - **Models**: [`ModelRegistry`] turns TOML table/request definitions into
//!   builder calls, resolving declared links into joins
//!
//! ## Query builder
//!
//! ```
//! use sqlchain::{DryRunDriver, Query};
//!
//! let driver = DryRunDriver::new();
//!
//! // SELECT
//! Query::table(&driver, "users")
//!     .where_cmp("age", ">", 18)
//!     .order(["-age"])
//!     .limit(5)
//!     .select()?;
//!
//! // UPDATE
//! Query::table(&driver, "users")
//!     .where_("id = 1")
//!     .update([("status", "inactive")])?;
//!
//! // Batch insert through a compiled statement
//! let mut insert = Query::raw(&driver);
//! insert.prepare("INSERT INTO ?n SET ?n=?, ?n=?", vec![
//!     "dictionary".into(), "word".into(), "meaning".into(),
//! ])?;
//! for (word, meaning) in [("cat", "paka"), ("dog", "mbwa")] {
//!     insert.execute(vec![word.into(), meaning.into()])?;
//! }
//! assert_eq!(driver.prepare_count(), 1);
//! # Ok::<(), sqlchain::ChainError>(())
//! ```

pub mod assign;
pub mod config;
pub mod driver;
pub mod error;
pub mod fields;
pub mod ident;
pub mod join;
pub mod log;
pub mod model;
pub mod pager;
pub mod predicate;
pub mod query;
pub mod template;
pub mod value;

pub use assign::{Assign, AssignSource, Assignments, SetDef};
pub use config::BuilderConfig;
pub use driver::{Driver, DryRunDriver, Outcome, Recorded};
pub use error::{ChainError, ChainResult};
pub use fields::{FieldDef, FieldSource, Fields};
pub use ident::Ident;
pub use join::{Join, JoinKind, TableRef};
pub use log::StatementKind;
pub use model::{LinkDef, ModelDef, ModelRegistry, RequestDef, StatementType};
pub use pager::Paginator;
pub use predicate::{Glue, Predicate, PredicateDef, PredicateSource};
pub use query::{Direction, Query, Records, Tree};
pub use template::{Arg, Fragment};
pub use value::{Row, Value};
