//! The in-memory catalog
//!
//! A [`Table`] is always the complete record set; saving writes the whole
//! thing back. Edits happen here, on a freshly loaded table, before a full
//! save.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use crate::core::record::{Record, ScalarField};

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub records: Vec<Record>,
    extra_columns: Vec<String>,
    id_column_present: bool,
}

impl Default for Table {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Table {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            extra_columns: Vec::new(),
            id_column_present: true,
        }
    }

    pub(crate) fn from_parts(
        records: Vec<Record>,
        extra_columns: Vec<String>,
        id_column_present: bool,
    ) -> Self {
        Self {
            records,
            extra_columns,
            id_column_present,
        }
    }

    /// A table with the same column layout holding a different set of records
    pub fn with_records(&self, records: Vec<Record>) -> Self {
        Self {
            records,
            extra_columns: self.extra_columns.clone(),
            id_column_present: self.id_column_present,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the stored sheet had an id column at all
    pub fn has_id_column(&self) -> bool {
        self.id_column_present
    }

    pub(crate) fn mark_id_column_present(&mut self) {
        self.id_column_present = true;
    }

    /// Unknown columns: those seen on load first, then any others records carry
    pub fn extra_columns(&self) -> Vec<String> {
        let mut columns = self.extra_columns.clone();
        let known: BTreeSet<&String> = self.extra_columns.iter().collect();
        let others: BTreeSet<&String> = self
            .records
            .iter()
            .flat_map(|r| r.extra.keys())
            .filter(|k| !known.contains(k))
            .collect();
        columns.extend(others.into_iter().cloned());
        columns
    }

    /// Append another table's unknown columns after this one's
    pub(crate) fn absorb_columns(&mut self, other: &Table) {
        for column in other.extra_columns() {
            if !self.extra_columns.contains(&column) {
                self.extra_columns.push(column);
            }
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.records.iter().filter_map(|r| r.id.as_u64())
    }

    pub fn contains_id(&self, id: u64) -> bool {
        self.ids().any(|existing| existing == id)
    }

    pub fn get(&self, id: u64) -> Option<&Record> {
        self.records.iter().find(|r| r.id.as_u64() == Some(id))
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Record> {
        self.records.iter_mut().find(|r| r.id.as_u64() == Some(id))
    }

    /// Remove every row carrying `id`; returns the first one removed
    pub fn remove(&mut self, id: u64) -> Option<Record> {
        let position = self.records.iter().position(|r| r.id.as_u64() == Some(id))?;
        let removed = self.records.remove(position);
        self.records.retain(|r| r.id.as_u64() != Some(id));
        Some(removed)
    }

    /// Administrative order: newest `created_at` first, undated rows last
    pub fn newest_first(&self) -> Vec<&Record> {
        let mut records: Vec<&Record> = self.records.iter().collect();
        records.sort_by_key(|r| (r.created_at.is_none(), r.created_at.map(Reverse)));
        records
    }

    /// Sorted distinct non-blank values of a field, for filter choices
    pub fn distinct(&self, field: ScalarField) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.scalar(field).trim())
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::RecordId;
    use chrono::NaiveDate;

    fn record(id: u64, day: Option<u32>) -> Record {
        Record {
            id: RecordId::Numeric(id),
            created_at: day.map(|d| {
                NaiveDate::from_ymd_opt(2025, 1, d)
                    .unwrap()
                    .and_hms_opt(9, 0, 0)
                    .unwrap()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_newest_first_puts_undated_last() {
        let table = Table::new(vec![
            record(1, Some(3)),
            record(2, None),
            record(3, Some(9)),
            record(4, Some(5)),
        ]);
        let order: Vec<u64> = table
            .newest_first()
            .iter()
            .filter_map(|r| r.id.as_u64())
            .collect();
        assert_eq!(order, vec![3, 4, 1, 2]);
    }

    #[test]
    fn test_remove_by_id() {
        let mut table = Table::new(vec![record(1, None), record(2, None)]);
        let removed = table.remove(2).unwrap();
        assert_eq!(removed.id, RecordId::Numeric(2));
        assert_eq!(table.len(), 1);
        assert!(table.remove(2).is_none());
    }

    #[test]
    fn test_distinct_sorted_and_non_blank() {
        let mut a = record(1, None);
        a.district = "Gò Vấp".into();
        let mut b = record(2, None);
        b.district = "Bình Thạnh".into();
        let mut c = record(3, None);
        c.district = " ".into();
        let mut d = record(4, None);
        d.district = "Gò Vấp".into();
        let table = Table::new(vec![a, b, c, d]);
        assert_eq!(
            table.distinct(ScalarField::District),
            vec!["Bình Thạnh".to_string(), "Gò Vấp".to_string()]
        );
    }

    #[test]
    fn test_extra_columns_include_record_only_keys() {
        let mut r = record(1, None);
        r.extra.insert("Chủ nhà".into(), "Anh Ba".into());
        let table = Table::from_parts(vec![r], vec!["Zalo".into()], true);
        assert_eq!(table.extra_columns(), vec!["Zalo".to_string(), "Chủ nhà".to_string()]);
    }
}
