use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use uuid::Uuid;

///
/// IdentityError
///

#[derive(Debug, ThisError)]
pub enum IdentityError {
    #[error("no session factory registered for uuid {uuid} or name {name:?}")]
    Unresolved { uuid: Uuid, name: Option<String> },
}

///
/// FactoryIdentity
/// `(uuid, name)` pair assigned at construction.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct FactoryIdentity {
    uuid: Uuid,
    name: Option<String>,
}

impl FactoryIdentity {
    #[must_use]
    pub const fn new(uuid: Uuid, name: Option<String>) -> Self {
        Self { uuid, name }
    }

    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn reference(&self) -> FactoryReference {
        FactoryReference {
            uuid: self.uuid,
            name: self.name.clone(),
        }
    }
}

///
/// FactoryReference
///
/// Serialized stand-in for a factory. Turning it back into a live factory
/// is an explicit `FactoryRegistry::resolve` call.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FactoryReference {
    pub uuid: Uuid,
    pub name: Option<String>,
}
