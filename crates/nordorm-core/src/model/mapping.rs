use crate::model::TypeKey;

///
/// Polymorphism
///
/// `Implicit` entities are returned by queries against any of their supertypes.
/// `Explicit` entities are only returned when queried by their exact type.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Polymorphism {
    #[default]
    Implicit,
    Explicit,
}

///
/// PropertyMapping
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PropertyMapping {
    pub name: String,
    pub type_name: String,
}

///
/// EntityMapping
///
/// Class mapping for one runtime type. The persister factory turns it into
/// an `EntityPersister`; the metadata store registers the result under the
/// type key, the mapped entity name, and the qualified type name.
///

#[derive(Clone, Debug)]
pub struct EntityMapping {
    /// Runtime type the entity maps.
    pub type_key: TypeKey,
    /// Canonical mapped name, used by queries.
    pub entity_name: String,
    /// Fully-qualified type identity, e.g. `App.Customer, App`.
    pub qualified_name: String,
    /// Direct supertypes (mapped superclass and interface markers).
    pub supertypes: Vec<TypeKey>,
    /// Mapped superclass when the entity is part of an inheritance hierarchy.
    pub superclass: Option<TypeKey>,
    pub polymorphism: Polymorphism,
    /// Abstract or otherwise non-queryable entities are skipped by implementor scans.
    pub queryable: bool,
    pub identifier_name: Option<String>,
    pub identifier_type: String,
    pub properties: Vec<PropertyMapping>,
    /// Second-level cache region, if the entity is cached.
    pub cache_region: Option<String>,
}

impl EntityMapping {
    #[must_use]
    pub fn new<T: ?Sized + 'static>(
        entity_name: impl Into<String>,
        qualified_name: impl Into<String>,
    ) -> Self {
        Self {
            type_key: TypeKey::of::<T>(),
            entity_name: entity_name.into(),
            qualified_name: qualified_name.into(),
            supertypes: Vec::new(),
            superclass: None,
            polymorphism: Polymorphism::Implicit,
            queryable: true,
            identifier_name: Some("id".to_string()),
            identifier_type: "i64".to_string(),
            properties: Vec::new(),
            cache_region: None,
        }
    }

    /// Declare the mapped superclass of this entity.
    #[must_use]
    pub fn extends<S: ?Sized + 'static>(mut self) -> Self {
        let key = TypeKey::of::<S>();
        self.superclass = Some(key);
        if !self.supertypes.contains(&key) {
            self.supertypes.push(key);
        }
        self
    }

    /// Declare an unmapped supertype (usually a `dyn Trait` marker).
    #[must_use]
    pub fn implements<S: ?Sized + 'static>(mut self) -> Self {
        let key = TypeKey::of::<S>();
        if !self.supertypes.contains(&key) {
            self.supertypes.push(key);
        }
        self
    }

    #[must_use]
    pub const fn explicit_polymorphism(mut self) -> Self {
        self.polymorphism = Polymorphism::Explicit;
        self
    }

    #[must_use]
    pub const fn not_queryable(mut self) -> Self {
        self.queryable = false;
        self
    }

    #[must_use]
    pub fn identifier(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.identifier_name = Some(name.into());
        self.identifier_type = type_name.into();
        self
    }

    #[must_use]
    pub fn property(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.properties.push(PropertyMapping {
            name: name.into(),
            type_name: type_name.into(),
        });
        self
    }

    #[must_use]
    pub fn cached(mut self, region: impl Into<String>) -> Self {
        self.cache_region = Some(region.into());
        self
    }
}

///
/// CollectionMapping
/// Mapping for one collection role, e.g. `Customer.Orders`.
///

#[derive(Clone, Debug)]
pub struct CollectionMapping {
    pub role: String,
    pub owner: Option<TypeKey>,
    pub element_type: Option<String>,
    pub cache_region: Option<String>,
}

impl CollectionMapping {
    #[must_use]
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            owner: None,
            element_type: None,
            cache_region: None,
        }
    }

    #[must_use]
    pub fn owned_by<T: ?Sized + 'static>(mut self) -> Self {
        self.owner = Some(TypeKey::of::<T>());
        self
    }

    #[must_use]
    pub fn element(mut self, type_name: impl Into<String>) -> Self {
        self.element_type = Some(type_name.into());
        self
    }

    #[must_use]
    pub fn cached(mut self, region: impl Into<String>) -> Self {
        self.cache_region = Some(region.into());
        self
    }
}
