//! Mapping vocabulary consumed at factory construction: runtime type keys,
//! entity identifiers, and the entity/collection mapping descriptors.

pub mod identifier;
pub mod mapping;
pub mod type_key;

pub use identifier::Identifier;
pub use mapping::{CollectionMapping, EntityMapping, Polymorphism, PropertyMapping};
pub use type_key::TypeKey;
