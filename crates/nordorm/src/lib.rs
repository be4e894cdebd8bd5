//! ## Crate layout
//! - `core`: the session factory runtime: metadata store, translator cache,
//!   sessions, connection gateway, and the collaborator traits they consume.
//! - `error`: the public error type with a stable kind + origin taxonomy.
//!
//! The `prelude` module carries the vocabulary needed to build a factory and
//! open sessions.

pub use nordorm_core as core;

pub mod error;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::Error;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        Error,
        core::{
            factory::{FactoryReference, FactoryRegistry, SessionFactory, SessionFactoryBuilder},
            model::{CollectionMapping, EntityMapping, Identifier, TypeKey},
            session::{Interceptor, Session},
            settings::FactoryConfig,
        },
    };
}
