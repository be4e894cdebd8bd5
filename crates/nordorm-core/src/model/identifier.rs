use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

///
/// Identifier
/// Entity or collection-owner key passed to second-level cache eviction.
///

#[derive(
    Clone, Debug, Deserialize, Display, Eq, From, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum Identifier {
    #[display("{_0}")]
    Int(i64),

    #[display("{_0}")]
    Uint(u64),

    #[display("{_0}")]
    Text(String),

    #[display("{_0}")]
    Uuid(Uuid),
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}
