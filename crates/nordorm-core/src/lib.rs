//! Core runtime for nordorm: the session factory, its metadata store and
//! translator cache, sessions, and the collaborator traits they consume.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod cache;
pub mod connection;
pub mod error;
pub mod factory;
pub mod metadata;
pub mod model;
pub mod obs;
pub mod persister;
pub mod query;
pub mod session;
pub mod settings;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Prelude contains only domain vocabulary and the factory entry points.
/// No collaborator traits or errors are re-exported here.
///

pub mod prelude {
    pub use crate::{
        factory::{SessionFactory, SessionFactoryBuilder},
        model::{CollectionMapping, EntityMapping, Identifier, TypeKey},
        session::Session,
        settings::FactoryConfig,
    };
}
