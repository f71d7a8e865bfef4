use std::collections::BTreeMap;

use esmam_stats::survival::Observation;

use crate::{
    bitset::{CaseSet, ItemSet},
    item::{Attribute, AttributeId, Item, ItemId},
    table::{LoadError, RawTable},
};

/// Bit-indexed dataset: the item catalog plus coverage indices in both
/// directions.
///
/// - **Item-major** (`item_cases`): for each item, the set of cases holding it.
///   Conjunction queries are word-wise intersections of these sets.
/// - **Case-major** (`case_items`): for each case, its packed transaction (one
///   bit per catalog item). Used to find which items occur among a set of cases.
///
/// Both indices are built once and read-only afterwards. Since every case has
/// exactly one value per attribute, the item sets of one attribute partition
/// the full case set.
#[derive(Debug, Clone)]
pub struct CaseStore {
    attributes: Vec<Attribute>,
    items: Vec<Item>,
    observations: Vec<Observation>,
    item_cases: Vec<CaseSet>,
    case_items: Vec<ItemSet>,
}

impl CaseStore {
    /// Builds the store, enumerating each attribute's distinct values in
    /// first-seen order.
    pub fn from_table(table: &RawTable) -> Result<Self, LoadError> {
        Self::with_catalog(table.first_seen_catalog(), table)
    }

    /// Builds the store against an explicit catalog.
    ///
    /// The catalog lists, in attribute order, each attribute name with its
    /// exhaustive ordered value list. Item ids are assigned attribute-major in
    /// that order. A table cell whose value is absent from the catalog is a
    /// fatal [`LoadError::UnknownValue`].
    pub fn with_catalog(
        catalog: Vec<(String, Vec<String>)>,
        table: &RawTable,
    ) -> Result<Self, LoadError> {
        let num_cases = table.len();

        let mut attributes = Vec::with_capacity(catalog.len());
        let mut items = vec![];
        let mut column_of = Vec::with_capacity(catalog.len());
        for (attr_idx, (name, values)) in catalog.into_iter().enumerate() {
            let column = table
                .columns()
                .iter()
                .position(|c| *c == name)
                .ok_or_else(|| LoadError::MissingColumn { name: name.clone() })?;
            column_of.push(column);

            let start = items.len();
            for value in values {
                if items[start..]
                    .iter()
                    .any(|item: &Item| item.value == value)
                {
                    return Err(LoadError::DuplicateValue {
                        attribute: name,
                        value,
                    });
                }
                items.push(Item {
                    attribute: AttributeId(attr_idx),
                    value,
                });
            }
            attributes.push(Attribute::new(name, start..items.len()));
        }
        if attributes.is_empty() {
            return Err(LoadError::NoAttributes);
        }

        let num_items = items.len();
        let mut item_cases = vec![CaseSet::empty(num_cases); num_items];
        let mut case_items = Vec::with_capacity(num_cases);
        for (row, cells) in table.rows().iter().enumerate() {
            let mut transaction = ItemSet::empty(num_items);
            for (attribute, &column) in attributes.iter().zip(&column_of) {
                let value = &cells[column];
                let item = attribute
                    .items()
                    .find(|id| items[id.0].value == *value)
                    .ok_or_else(|| LoadError::UnknownValue {
                        row,
                        attribute: attribute.name.clone(),
                        value: value.clone(),
                    })?;
                transaction.insert(item.0);
                item_cases[item.0].insert(row);
            }
            case_items.push(transaction);
        }

        Ok(Self {
            attributes,
            items,
            observations: table.observations().to_vec(),
            item_cases,
            case_items,
        })
    }

    /// Number of cases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    #[must_use]
    pub fn num_items(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn num_attributes(&self) -> usize {
        self.attributes.len()
    }

    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    #[must_use]
    pub fn attribute(&self, attr: AttributeId) -> &Attribute {
        &self.attributes[attr.0]
    }

    #[must_use]
    pub fn item(&self, item: ItemId) -> &Item {
        &self.items[item.0]
    }

    #[must_use]
    pub fn attribute_of(&self, item: ItemId) -> AttributeId {
        self.items[item.0].attribute
    }

    /// All item ids in catalog order.
    pub fn item_ids(&self) -> impl Iterator<Item = ItemId> + use<> {
        (0..self.items.len()).map(ItemId)
    }

    /// Looks up the item for `attribute = value`.
    #[must_use]
    pub fn find_item(&self, attribute: &str, value: &str) -> Option<ItemId> {
        self.attributes
            .iter()
            .find(|a| a.name == attribute)?
            .items()
            .find(|id| self.items[id.0].value == value)
    }

    /// Human readable `attribute=value` label.
    #[must_use]
    pub fn item_label(&self, item: ItemId) -> String {
        let Item { attribute, value } = self.item(item);
        format!("{}={value}", self.attributes[attribute.0].name)
    }

    /// The full case set.
    #[must_use]
    pub fn all_cases(&self) -> CaseSet {
        CaseSet::full(self.len())
    }

    /// Cases holding `item`.
    #[must_use]
    pub fn coverage(&self, item: ItemId) -> &CaseSet {
        &self.item_cases[item.0]
    }

    /// Cases satisfying a set of items.
    ///
    /// Items of the same attribute are alternatives (OR); clauses of different
    /// attributes must all hold (AND). An empty item set covers every case.
    ///
    /// # Examples
    ///
    /// ```
    /// use esmam_data::{case_store::CaseStore, table::RawTable};
    ///
    /// let csv = "a,b,t,e\nx,p,1,1\ny,p,2,1\nz,q,3,1\nx,q,4,1\n";
    /// let table = RawTable::parse_csv(csv, "t", "e").unwrap();
    /// let store = CaseStore::from_table(&table).unwrap();
    ///
    /// let x = store.find_item("a", "x").unwrap();
    /// let y = store.find_item("a", "y").unwrap();
    /// let p = store.find_item("b", "p").unwrap();
    /// let cover = store.coverage_of([x, y, p]);
    /// assert_eq!(cover.iter().collect::<Vec<_>>(), vec![0, 1]);
    /// ```
    #[must_use]
    pub fn coverage_of<I>(&self, items: I) -> CaseSet
    where
        I: IntoIterator<Item = ItemId>,
    {
        let mut clauses: BTreeMap<AttributeId, CaseSet> = BTreeMap::new();
        for item in items {
            clauses
                .entry(self.attribute_of(item))
                .and_modify(|cases| cases.union_with(self.coverage(item)))
                .or_insert_with(|| self.coverage(item).clone());
        }
        let mut cover = self.all_cases();
        for cases in clauses.values() {
            cover.intersect_with(cases);
        }
        cover
    }

    /// Items that occur in at least one of `cases`.
    #[must_use]
    pub fn items_covering(&self, cases: &CaseSet) -> ItemSet {
        let mut items = ItemSet::empty(self.num_items());
        for case in cases.iter() {
            items.union_with(&self.case_items[case]);
        }
        items
    }

    /// Packed transaction of one case.
    #[must_use]
    pub fn transaction(&self, case: usize) -> &ItemSet {
        &self.case_items[case]
    }

    #[must_use]
    pub fn observation(&self, case: usize) -> Observation {
        self.observations[case]
    }

    /// Survival observations of every case, in row order.
    #[must_use]
    pub fn all_observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Survival observations of `cases`, in row order.
    pub fn observations<'a>(&'a self, cases: &'a CaseSet) -> impl Iterator<Item = Observation> + 'a {
        cases.iter().map(|case| self.observations[case])
    }

    /// Mean survival time over `cases`, ignoring censoring.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mean_survival(&self, cases: &CaseSet) -> Option<f64> {
        let count = cases.count();
        if count == 0 {
            return None;
        }
        let sum = self.observations(cases).map(|obs| obs.time).sum::<f64>();
        Some(sum / count as f64)
    }
}
