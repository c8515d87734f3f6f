//! Catalog operations
//!
//! Every mutation is load → change in memory → save the full table. There is
//! no row-level write; two writers interleaving these steps lose one side's
//! changes.

use std::collections::HashSet;

use chrono::{Local, NaiveDateTime, SubsecRound};
use clap::ValueEnum;
use tracing::{debug, info};

use crate::core::filter::ListingFilter;
use crate::core::ids::IdAllocator;
use crate::core::record::{NewListing, Record, RecordId};
use crate::core::storage::{Outcome, Store, StoreError};
use crate::core::table::Table;

/// Current local time at second precision, as stored in `created_at`
pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

/// Add listings with consecutive fresh ids, all stamped `created_at`
pub fn add(
    store: &mut Store,
    listings: Vec<NewListing>,
    created_at: NaiveDateTime,
) -> Result<Outcome<Vec<u64>>, StoreError> {
    let loaded = store.load()?;
    let mut table = loaded.value;

    let mut ids = IdAllocator::for_table(&table);
    let mut added = Vec::with_capacity(listings.len());
    for listing in listings {
        let id = ids.allocate();
        table.records.push(listing.into_record(id, created_at));
        added.push(id);
    }
    table.mark_id_column_present();

    let saved = store.save(&table)?;
    info!(ids = ?added, "added listings");
    Ok(saved.map(|()| added).after(loaded.warnings))
}

/// Remove the listing with `id`
///
/// An unknown id is [`StoreError::NotFound`] and nothing is written.
pub fn delete(store: &mut Store, id: u64) -> Result<Outcome<Record>, StoreError> {
    let loaded = store.load()?;
    let mut table = loaded.value;

    let removed = table.remove(id).ok_or(StoreError::NotFound { id })?;
    let saved = store.save(&table)?;
    info!(id, "deleted listing");
    Ok(saved.map(|()| removed).after(loaded.warnings))
}

/// Edit one listing in place and save the full table
///
/// `id` and `created_at` are restored after `edit` runs.
pub fn update(
    store: &mut Store,
    id: u64,
    edit: impl FnOnce(&mut Record),
) -> Result<Outcome<Record>, StoreError> {
    let loaded = store.load()?;
    let mut table = loaded.value;

    let record = table.get_mut(id).ok_or(StoreError::NotFound { id })?;
    let created_at = record.created_at;
    edit(record);
    record.id = RecordId::Numeric(id);
    record.created_at = created_at;
    let updated = record.clone();

    let saved = store.save(&table)?;
    debug!(id, "updated listing");
    Ok(saved.map(|()| updated).after(loaded.warnings))
}

/// Append photo references to a listing
pub fn attach_photos(
    store: &mut Store,
    id: u64,
    photos: Vec<String>,
) -> Result<Outcome<Record>, StoreError> {
    let count = photos.len();
    let outcome = update(store, id, |record| record.photos.extend(photos))?;
    info!(id, count, "attached photos");
    Ok(outcome)
}

/// Matching listings ordered by available date
pub fn search(
    store: &mut Store,
    filter: &ListingFilter,
) -> Result<Outcome<Vec<Record>>, StoreError> {
    let loaded = store.load()?;
    Ok(loaded.map(|table| filter.apply(&table.records).into_iter().cloned().collect()))
}

/// How an imported table combines with the stored one
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImportMode {
    /// Append imported rows after the existing ones
    #[default]
    Merge,
    /// Replace the stored table with the imported one
    Overwrite,
}

/// What an import did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub mode: ImportMode,
    /// Rows taken from the imported table
    pub imported: usize,
    /// Fresh ids given to rows whose id was missing, malformed or taken
    pub assigned: Vec<u64>,
    /// Rows in the catalog afterwards
    pub total: usize,
}

/// Combine `incoming` with the stored catalog and save the result
///
/// Merge keeps every existing row untouched and appends the imported rows.
/// In both modes an imported row keeps its id only if it is a valid number
/// not already used; otherwise it gets the next free id.
pub fn import(
    store: &mut Store,
    incoming: Table,
    mode: ImportMode,
) -> Result<Outcome<ImportReport>, StoreError> {
    let (mut table, warnings) = match mode {
        ImportMode::Merge => {
            let loaded = store.load()?;
            (loaded.value, loaded.warnings)
        }
        ImportMode::Overwrite => (incoming.with_records(Vec::new()), Vec::new()),
    };
    let imported = incoming.len();

    let mut ids = IdAllocator::for_table(&table);
    for id in incoming.ids() {
        ids.reserve(id);
    }

    let mut taken: HashSet<u64> = table.ids().collect();
    let mut assigned = Vec::new();
    if mode == ImportMode::Merge {
        table.absorb_columns(&incoming);
    }
    for mut record in incoming.records {
        let keep = match record.id.as_u64() {
            Some(id) => taken.insert(id),
            None => false,
        };
        if !keep {
            let id = ids.allocate();
            record.id = RecordId::Numeric(id);
            taken.insert(id);
            assigned.push(id);
        }
        table.records.push(record);
    }
    table.mark_id_column_present();

    let saved = store.save(&table)?;
    let report = ImportReport {
        mode,
        imported,
        assigned,
        total: table.len(),
    };
    info!(
        ?mode,
        imported,
        assigned = report.assigned.len(),
        total = report.total,
        "imported listings"
    );
    Ok(saved.map(|()| report).after(warnings))
}
