//! Categorical survival datasets indexed for subgroup search.
//!
//! A dataset is a table of categorical attribute columns plus two survival
//! targets (time and event flag). Every distinct `(attribute, value)` pair
//! becomes an *item* with a dense [`ItemId`]; rows are *cases*.
//!
//! - [`table`]: raw rows and survival observations, CSV parsing
//! - [`case_store`]: the bit-indexed [`CaseStore`] answering coverage queries
//! - [`cover_count`]: per-case counters of accepted-rule coverage
//! - [`bitset`]: packed fixed-universe bit sets used for case and item sets
//!
//! # Examples
//!
//! ```
//! use esmam_data::{CaseStore, RawTable};
//!
//! let csv = "sex,stage,time,status\nm,I,5,1\nf,II,8,0\nf,I,2,1\n";
//! let table = RawTable::parse_csv(csv, "time", "status")?;
//! let store = CaseStore::from_table(&table)?;
//!
//! let female = store.find_item("sex", "f").unwrap();
//! assert_eq!(store.coverage(female).count(), 2);
//! # Ok::<(), esmam_data::LoadError>(())
//! ```

pub use self::{
    bitset::{BitSet, CaseSet, ItemSet},
    case_store::CaseStore,
    cover_count::CoverCounts,
    item::{Attribute, AttributeId, Item, ItemId},
    table::{LoadError, RawTable},
};

pub mod bitset;
pub mod case_store;
pub mod cover_count;
pub mod item;
pub mod table;
