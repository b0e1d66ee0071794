//! Record store and filtered views over it

use std::sync::Arc;

use dv_core::Record;

use crate::DataError;

/// The immutable dataset of one load.
///
/// Cloning is cheap; every clone shares the same records.
#[derive(Debug, Clone)]
pub struct RecordStore {
    source_name: String,
    records: Arc<[Record]>,
}

impl RecordStore {
    /// Wrap loaded records; an empty dataset is rejected
    pub fn new(source_name: impl Into<String>, records: Vec<Record>) -> Result<Self, DataError> {
        if records.is_empty() {
            return Err(DataError::InvalidDataset(
                "dataset must contain at least one record".to_string(),
            ));
        }
        Ok(Self {
            source_name: source_name.into(),
            records: records.into(),
        })
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Authoritative column list: the first record's keys
    pub fn columns(&self) -> Vec<&str> {
        self.records
            .first()
            .map(|r| r.columns().collect())
            .unwrap_or_default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every record, unfiltered
    pub fn all(&self) -> FilteredRecordSet {
        FilteredRecordSet {
            store: self.clone(),
            rows: (0..self.records.len()).collect(),
        }
    }

    /// Records at the given positions, in the given order
    pub fn select(&self, rows: Vec<usize>) -> FilteredRecordSet {
        debug_assert!(rows.iter().all(|&r| r < self.records.len()));
        FilteredRecordSet {
            store: self.clone(),
            rows,
        }
    }
}

/// Order-preserving subsequence of a [`RecordStore`]
#[derive(Debug, Clone)]
pub struct FilteredRecordSet {
    store: RecordStore,
    rows: Vec<usize>,
}

impl FilteredRecordSet {
    /// Positions of the retained records in the store
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> + Clone {
        self.rows.iter().map(move |&row| &self.store.records[row])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True if every record of the store is present, in store order
    pub fn is_unfiltered(&self) -> bool {
        self.rows.len() == self.store.len() && self.rows.iter().enumerate().all(|(i, &r)| i == r)
    }
}

impl<'a> IntoIterator for &'a FilteredRecordSet {
    type Item = &'a Record;
    type IntoIter = Box<dyn Iterator<Item = &'a Record> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl PartialEq for FilteredRecordSet {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.store.records, &other.store.records) && self.rows == other.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dv_core::record;

    #[test]
    fn test_empty_store_rejected() {
        assert!(matches!(
            RecordStore::new("empty", Vec::new()),
            Err(DataError::InvalidDataset(_))
        ));
    }

    #[test]
    fn test_all_is_unfiltered() {
        let store = RecordStore::new("t", vec![record! { "a" => 1.0 }, record! { "a" => 2.0 }]).unwrap();
        let all = store.all();
        assert!(all.is_unfiltered());
        assert_eq!(all.len(), 2);
        assert!(!store.select(vec![1]).is_unfiltered());
        assert_eq!(store.columns(), vec!["a"]);
    }
}
