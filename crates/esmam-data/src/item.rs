use std::ops::Range;

use serde::Serialize;

/// Dense index of a non-target attribute (column).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    derive_more::Display,
    derive_more::From,
)]
pub struct AttributeId(pub usize);

/// Dense index of an `(attribute, value)` item.
///
/// Ids are assigned attribute-major: all items of attribute 0 come first, then
/// those of attribute 1, and so on. Sorting item ids therefore also groups them
/// by attribute.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    derive_more::Display,
    derive_more::From,
)]
pub struct ItemId(pub usize);

impl AttributeId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl ItemId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// One `(attribute, value)` pair of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub attribute: AttributeId,
    pub value: String,
}

/// A non-target attribute and the contiguous range of its item ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    items: Range<usize>,
}

impl Attribute {
    pub(crate) fn new(name: String, items: Range<usize>) -> Self {
        Self { name, items }
    }

    /// Item ids of this attribute's values, in catalog order.
    pub fn items(&self) -> impl Iterator<Item = ItemId> + use<> {
        self.items.clone().map(ItemId)
    }

    #[must_use]
    pub fn num_values(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn contains(&self, item: ItemId) -> bool {
        self.items.contains(&item.0)
    }
}
