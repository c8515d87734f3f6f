//! Listing filters
//!
//! A [`ListingFilter`] is a conjunction of [`Predicate`]s evaluated over
//! decoded records. Results come back ordered by available date, earliest
//! first, with undated listings last and ties kept in table order.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::core::record::{ListField, Record, ScalarField};

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Scalar field is one of the accepted values (exact match)
    OneOf {
        field: ScalarField,
        accepted: BTreeSet<String>,
    },
    /// List field shares at least one value with the accepted set
    AnyOf {
        field: ListField,
        accepted: BTreeSet<String>,
    },
    /// Price within `[min, max]`, both inclusive; unpriced listings never match
    PriceRange { min: u64, max: u64 },
    /// Available on or before the cutoff; undated listings never match
    AvailableBy(NaiveDate),
    /// Case-insensitive substring of the joined address fields
    Keyword(String),
}

impl Predicate {
    /// Predicates with nothing to test match every record
    pub fn is_noop(&self) -> bool {
        match self {
            Predicate::OneOf { accepted, .. } | Predicate::AnyOf { accepted, .. } => {
                accepted.is_empty()
            }
            Predicate::Keyword(keyword) => keyword.trim().is_empty(),
            Predicate::PriceRange { .. } | Predicate::AvailableBy(_) => false,
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        if self.is_noop() {
            return true;
        }
        match self {
            Predicate::OneOf { field, accepted } => accepted.contains(record.scalar(*field)),
            Predicate::AnyOf { field, accepted } => {
                record.list(*field).iter().any(|value| accepted.contains(value))
            }
            Predicate::PriceRange { min, max } => record
                .price
                .map(|price| *min <= price && price <= *max)
                .unwrap_or(false),
            Predicate::AvailableBy(cutoff) => record
                .available_date
                .map(|date| date <= *cutoff)
                .unwrap_or(false),
            Predicate::Keyword(keyword) => {
                let needle = keyword.trim().to_lowercase();
                record.address_text().to_lowercase().contains(&needle)
            }
        }
    }
}

/// A set of predicates combined with AND
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilter {
    predicates: Vec<Predicate>,
}

impl ListingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn one_of<I, S>(self, field: ScalarField, accepted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(Predicate::OneOf {
            field,
            accepted: accepted.into_iter().map(Into::into).collect(),
        })
    }

    pub fn any_of<I, S>(self, field: ListField, accepted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(Predicate::AnyOf {
            field,
            accepted: accepted.into_iter().map(Into::into).collect(),
        })
    }

    pub fn price_between(self, min: u64, max: u64) -> Self {
        self.with(Predicate::PriceRange { min, max })
    }

    pub fn available_by(self, cutoff: NaiveDate) -> Self {
        self.with(Predicate::AvailableBy(cutoff))
    }

    pub fn keyword(self, keyword: impl Into<String>) -> Self {
        self.with(Predicate::Keyword(keyword.into()))
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// True when every active predicate holds
    pub fn matches(&self, record: &Record) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }

    /// Matching records, ordered by available date
    pub fn apply<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        let mut matched: Vec<&Record> = records.iter().filter(|r| self.matches(r)).collect();
        sort_by_available_date(&mut matched);
        matched
    }
}

/// Stable sort: earliest available date first, undated last
pub fn sort_by_available_date(records: &mut [&Record]) {
    records.sort_by_key(|r| (r.available_date.is_none(), r.available_date));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::RecordId;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn listing(id: u64, district: &str) -> Record {
        Record {
            id: RecordId::Numeric(id),
            district: district.into(),
            ..Default::default()
        }
    }

    fn ids(records: &[&Record]) -> Vec<u64> {
        records.iter().filter_map(|r| r.id.as_u64()).collect()
    }

    #[test]
    fn test_membership_selects_exact_values() {
        let records = vec![listing(1, "A"), listing(2, "B"), listing(3, "C"), listing(4, "B")];
        let filter = ListingFilter::new().one_of(ScalarField::District, ["B"]);
        assert_eq!(ids(&filter.apply(&records)), vec![2, 4]);
    }

    #[test]
    fn test_empty_accepted_set_matches_everything() {
        let records = vec![listing(1, "A"), listing(2, "B"), listing(3, "C")];
        let filter = ListingFilter::new()
            .one_of(ScalarField::District, Vec::<String>::new())
            .any_of(ListField::Amenities, Vec::<String>::new())
            .keyword("   ");
        assert_eq!(filter.apply(&records).len(), 3);
    }

    #[test]
    fn test_list_intersection() {
        let mut a = listing(1, "A");
        a.room_type = vec!["Studio".into(), "Duplex".into()];
        let mut b = listing(2, "A");
        b.room_type = vec!["1PN".into()];
        let c = listing(3, "A");
        let records = vec![a, b, c];

        let filter = ListingFilter::new().any_of(ListField::RoomType, ["Duplex", "2PN"]);
        assert_eq!(ids(&filter.apply(&records)), vec![1]);
    }

    #[test]
    fn test_price_range_is_inclusive_and_excludes_unpriced() {
        let mut records = Vec::new();
        for (id, price) in [(1, Some(2_000_000)), (2, Some(5_000_000)), (3, Some(5_000_001)), (4, None)] {
            let mut r = listing(id, "A");
            r.price = price;
            records.push(r);
        }
        let filter = ListingFilter::new().price_between(2_000_000, 5_000_000);
        assert_eq!(ids(&filter.apply(&records)), vec![1, 2]);
    }

    #[test]
    fn test_available_by_excludes_undated() {
        let mut a = listing(1, "A");
        a.available_date = Some(date(2025, 1, 10));
        let mut b = listing(2, "A");
        b.available_date = Some(date(2025, 2, 1));
        let c = listing(3, "A");
        let records = vec![a, b, c];

        let filter = ListingFilter::new().available_by(date(2025, 1, 31));
        assert_eq!(ids(&filter.apply(&records)), vec![1]);

        let filter = ListingFilter::new().available_by(date(2025, 2, 1));
        assert_eq!(ids(&filter.apply(&records)), vec![1, 2]);
    }

    #[test]
    fn test_keyword_is_case_insensitive_over_address() {
        let mut a = listing(1, "Gò Vấp");
        a.street = "Quang Trung".into();
        let mut b = listing(2, "Bình Thạnh");
        b.house_number = "45".into();
        let records = vec![a, b];

        let filter = ListingFilter::new().keyword("  quang TRUNG ");
        assert_eq!(ids(&filter.apply(&records)), vec![1]);

        let filter = ListingFilter::new().keyword("gò vấp");
        assert_eq!(ids(&filter.apply(&records)), vec![1]);
    }

    #[test]
    fn test_predicates_combine_with_and() {
        let mut a = listing(1, "B");
        a.price = Some(3_000_000);
        let mut b = listing(2, "B");
        b.price = Some(9_000_000);
        let mut c = listing(3, "A");
        c.price = Some(3_000_000);
        let records = vec![a, b, c];

        let filter = ListingFilter::new()
            .one_of(ScalarField::District, ["B"])
            .price_between(0, 5_000_000);
        assert_eq!(ids(&filter.apply(&records)), vec![1]);
    }

    #[test]
    fn test_output_ordered_by_date_with_undated_last() {
        let mut a = listing(1, "A");
        a.available_date = Some(date(2025, 3, 1));
        let b = listing(2, "A");
        let mut c = listing(3, "A");
        c.available_date = Some(date(2025, 1, 15));
        let d = listing(4, "A");
        let records = vec![a, b, c, d];

        let sorted = ListingFilter::new().apply(&records);
        let dates: Vec<Option<NaiveDate>> = sorted.iter().map(|r| r.available_date).collect();
        assert_eq!(
            dates,
            vec![Some(date(2025, 1, 15)), Some(date(2025, 3, 1)), None, None]
        );
        // Undated ties keep their original order
        assert_eq!(ids(&sorted), vec![3, 1, 2, 4]);
    }
}
