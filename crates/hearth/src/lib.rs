//! ## Crate layout
//! - `core`: connections, cursors, batched loading, search conditions, and
//!   access filtering.
//! - `bootstrap`: process setup (tracing).
//! - `error`: the public error taxonomy.
//!
//! `Hearth` is built once from configuration; each incoming request opens
//! a `Request` so its connections share one entity buffer.

pub use hearth_core as core;

pub mod bootstrap;
pub mod error;
mod runtime;

pub use error::Error;
pub use runtime::{Hearth, Request};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        Error, Hearth, Request,
        core::{
            db::{
                access::AccountPermissions,
                connection::Connection,
                store::{Entity as _, EntityStore as _},
            },
            prelude::*,
        },
    };
}
