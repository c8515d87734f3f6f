//! Record id allocation
//!
//! Ids are `max + 1` over the loaded table. Allocation assumes one writer
//! doing load → allocate → save at a time; two writers racing can hand out
//! the same id.

use crate::core::table::Table;

/// Next free id for `table`
///
/// - empty table, or no id column: `1`
/// - at least one numeric id: `max + 1`
/// - only blank/garbage ids: `row_count + 1`. This can collide with an id
///   that was deleted earlier, which nothing here can detect.
pub fn next_id(table: &Table) -> u64 {
    if table.is_empty() || !table.has_id_column() {
        return 1;
    }
    match table.ids().max() {
        Some(max) => max.saturating_add(1),
        None => table.len() as u64 + 1,
    }
}

/// Hands out consecutive ids starting from [`next_id`]
///
/// `reserve` lets callers skip ids already taken by rows that will be
/// appended, so a batch never repeats an id.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn for_table(table: &Table) -> Self {
        Self {
            next: next_id(table),
        }
    }

    /// Make sure `id` will never be returned
    pub fn reserve(&mut self, id: u64) {
        if id >= self.next {
            self.next = id.saturating_add(1);
        }
    }

    pub fn allocate(&mut self) -> u64 {
        let id = self.next;
        self.next = self.next.saturating_add(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::codec::Cell;
    use crate::core::record::{Record, RecordId};
    use crate::core::schema::{normalize, RawTable};

    fn table_with_ids(ids: &[RecordId]) -> Table {
        Table::new(
            ids.iter()
                .map(|id| Record {
                    id: id.clone(),
                    ..Default::default()
                })
                .collect(),
        )
    }

    #[test]
    fn test_next_id_empty_table() {
        assert_eq!(next_id(&Table::default()), 1);
    }

    #[test]
    fn test_next_id_is_max_plus_one() {
        let table = table_with_ids(&[
            RecordId::Numeric(3),
            RecordId::Numeric(7),
            RecordId::Numeric(2),
        ]);
        assert_eq!(next_id(&table), 8);
    }

    #[test]
    fn test_next_id_ignores_garbage_ids() {
        let table = table_with_ids(&[
            RecordId::Numeric(4),
            RecordId::Malformed("x".into()),
            RecordId::Missing,
        ]);
        assert_eq!(next_id(&table), 5);
    }

    #[test]
    fn test_next_id_falls_back_to_row_count() {
        let table = table_with_ids(&[RecordId::Malformed("x".into()), RecordId::Missing]);
        assert_eq!(next_id(&table), 3);
    }

    #[test]
    fn test_next_id_without_id_column() {
        let raw = RawTable {
            headers: vec!["Quận".into()],
            rows: vec![vec![Cell::Scalar("Q1".into())], vec![Cell::Scalar("Q3".into())]],
        };
        assert_eq!(next_id(&normalize(raw)), 1);
    }

    #[test]
    fn test_allocator_skips_reserved_ids() {
        let mut ids = IdAllocator::for_table(&table_with_ids(&[RecordId::Numeric(5)]));
        assert_eq!(ids.allocate(), 6);
        ids.reserve(9);
        ids.reserve(3);
        assert_eq!(ids.allocate(), 10);
        assert_eq!(ids.allocate(), 11);
    }
}
