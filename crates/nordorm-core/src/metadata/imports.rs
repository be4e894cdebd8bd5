use std::collections::BTreeMap;

///
/// ImportTable
/// Short-name aliases for mapped entities, e.g. `Customer` → `App.Customer, App`.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ImportTable {
    aliases: BTreeMap<String, String>,
}

impl ImportTable {
    #[must_use]
    pub const fn new(aliases: BTreeMap<String, String>) -> Self {
        Self { aliases }
    }

    /// Total lookup: names without an alias resolve to themselves.
    #[must_use]
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map_or(name, String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
