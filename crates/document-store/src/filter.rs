/// Filter for product lookups.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProductFilter {
    /// Every product in the catalog.
    #[default]
    All,

    /// Products whose name contains the given text (case-sensitive).
    NameContains(String),
}

impl ProductFilter {
    pub fn name_contains(query: impl Into<String>) -> Self {
        ProductFilter::NameContains(query.into())
    }

    /// Returns true if a product with this name passes the filter.
    pub fn matches_name(&self, name: &str) -> bool {
        match self {
            ProductFilter::All => true,
            ProductFilter::NameContains(query) => name.contains(query.as_str()),
        }
    }
}
