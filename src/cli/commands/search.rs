//! `roomcat search` command - Filter listings

use chrono::NaiveDate;
use miette::Result;

use crate::cli::helpers::{open_store, print_records, print_warnings, store_error};
use crate::cli::GlobalOpts;
use crate::core::filter::ListingFilter;
use crate::core::record::{ListField, Record, ScalarField};
use crate::core::schema::parse_date;

/// Filter flags shared by `search` and `export`
///
/// Flags of one kind accept several values (any may match); different
/// flags must all match.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// District (repeatable)
    #[arg(long)]
    pub district: Vec<String>,

    /// Ward (repeatable)
    #[arg(long)]
    pub ward: Vec<String>,

    /// Street (repeatable)
    #[arg(long)]
    pub street: Vec<String>,

    /// Window type (repeatable)
    #[arg(long)]
    pub window: Vec<String>,

    /// Room type; matches listings offering any of them (repeatable)
    #[arg(long = "room-type", value_delimiter = ',')]
    pub room_type: Vec<String>,

    /// Furniture item; matches listings with any of them (repeatable)
    #[arg(long, value_delimiter = ',')]
    pub furniture: Vec<String>,

    /// Amenity; matches listings with any of them (repeatable)
    #[arg(long = "amenity", value_delimiter = ',')]
    pub amenity: Vec<String>,

    /// Minimum price, inclusive
    #[arg(long)]
    pub min_price: Option<u64>,

    /// Maximum price, inclusive
    #[arg(long)]
    pub max_price: Option<u64>,

    /// Only rooms available on or before this date
    #[arg(long, value_parser = parse_date_arg)]
    pub available_by: Option<NaiveDate>,

    /// Case-insensitive text in the address
    #[arg(long, short = 'k')]
    pub keyword: Option<String>,
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).ok_or_else(|| format!("invalid date: '{}' (use YYYY-MM-DD or DD/MM/YYYY)", s))
}

impl FilterArgs {
    pub fn to_filter(&self) -> ListingFilter {
        let mut filter = ListingFilter::new()
            .one_of(ScalarField::District, self.district.clone())
            .one_of(ScalarField::Ward, self.ward.clone())
            .one_of(ScalarField::Street, self.street.clone())
            .one_of(ScalarField::WindowType, self.window.clone())
            .any_of(ListField::RoomType, self.room_type.clone())
            .any_of(ListField::Furniture, self.furniture.clone())
            .any_of(ListField::Amenities, self.amenity.clone());

        if self.min_price.is_some() || self.max_price.is_some() {
            filter = filter.price_between(
                self.min_price.unwrap_or(0),
                self.max_price.unwrap_or(u64::MAX),
            );
        }
        if let Some(cutoff) = self.available_by {
            filter = filter.available_by(cutoff);
        }
        if let Some(keyword) = &self.keyword {
            filter = filter.keyword(keyword.clone());
        }
        filter
    }
}

#[derive(clap::Args, Debug)]
pub struct SearchArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Staff view: mask house numbers and print share text
    #[arg(long)]
    pub staff: bool,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only the count of matching listings
    #[arg(long)]
    pub count: bool,
}

pub fn run(args: SearchArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, mut store) = open_store(global)?;
    let loaded = store.load().map_err(store_error)?;
    print_warnings(&loaded.warnings);
    let table = loaded.value;

    let mut matched: Vec<&Record> = args.filter.to_filter().apply(&table.records);
    if let Some(limit) = args.limit {
        matched.truncate(limit);
    }

    if args.count {
        println!("{}", matched.len());
        return Ok(());
    }

    print_records(&table, &matched, global.format, args.staff)
}
