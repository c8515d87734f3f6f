//! `roomcat add` command - Add rooms at one address

use chrono::NaiveDate;
use console::style;
use miette::Result;

use crate::cli::helpers::{open_store, print_warnings, store_error};
use crate::cli::GlobalOpts;
use crate::core::catalog;
use crate::core::record::NewListing;
use crate::core::schema::{parse_date, parse_price};

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// House number
    #[arg(long)]
    pub house_number: String,

    /// Street
    #[arg(long)]
    pub street: String,

    /// Ward
    #[arg(long, default_value = "")]
    pub ward: String,

    /// District
    #[arg(long)]
    pub district: String,

    /// A room at this address as CODE:PRICE[:DATE[:WINDOW[:TYPE,TYPE]]] (repeatable)
    ///
    /// A room without its own window or types takes --window and --room-type.
    #[arg(long = "room", value_parser = parse_room_spec)]
    pub rooms: Vec<RoomSpec>,

    /// Price when adding a single room without --room
    #[arg(long, value_parser = parse_price_arg)]
    pub price: Option<u64>,

    /// Available date when adding a single room without --room
    #[arg(long, value_parser = parse_date_arg)]
    pub available: Option<NaiveDate>,

    /// Room type for rooms that name none (repeatable or comma-separated)
    #[arg(long = "room-type", value_delimiter = ',')]
    pub room_types: Vec<String>,

    /// Window type for rooms that name none
    #[arg(long, default_value = "")]
    pub window: String,

    /// Furniture item (repeatable or comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub furniture: Vec<String>,

    /// Amenity (repeatable or comma-separated)
    #[arg(long = "amenity", value_delimiter = ',')]
    pub amenities: Vec<String>,

    /// Photo path or URL (repeatable)
    #[arg(long = "photo")]
    pub photos: Vec<String>,

    /// Electricity rate
    #[arg(long, default_value = "")]
    pub electricity: String,

    /// Water rate
    #[arg(long, default_value = "")]
    pub water: String,

    /// Service fee
    #[arg(long, default_value = "")]
    pub service: String,

    /// Parking fee
    #[arg(long, default_value = "")]
    pub parking: String,

    /// Laundry fee
    #[arg(long, default_value = "")]
    pub laundry: String,

    /// Free-text notes
    #[arg(long, default_value = "")]
    pub notes: String,

    /// Commission terms
    #[arg(long, default_value = "")]
    pub commission: String,
}

/// One room of a multi-room add
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSpec {
    pub code: String,
    pub price: Option<u64>,
    pub available: Option<NaiveDate>,
    pub window: Option<String>,
    pub room_types: Vec<String>,
}

fn parse_price_arg(s: &str) -> Result<u64, String> {
    let digits: String = s.trim().chars().filter(|c| *c != ',' && *c != '_').collect();
    parse_price(&digits).ok_or_else(|| format!("invalid price: '{}'", s))
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).ok_or_else(|| format!("invalid date: '{}' (use YYYY-MM-DD or DD/MM/YYYY)", s))
}

fn parse_room_spec(s: &str) -> Result<RoomSpec, String> {
    let mut parts = s.splitn(5, ':');
    let code = parts.next().unwrap_or("").trim().to_string();
    if code.is_empty() {
        return Err(format!(
            "room '{}' needs a code (CODE:PRICE[:DATE[:WINDOW[:TYPE,TYPE]]])",
            s
        ));
    }
    let price = match parts.next().map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) => Some(parse_price_arg(p)?),
        None => None,
    };
    let available = match parts.next().map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => Some(parse_date_arg(d)?),
        None => None,
    };
    let window = parts
        .next()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(String::from);
    let room_types = parts
        .next()
        .map(|types| clean(types.split(',').map(String::from).collect()))
        .unwrap_or_default();
    Ok(RoomSpec {
        code,
        price,
        available,
        window,
        room_types,
    })
}

impl AddArgs {
    /// One listing per room, sharing the address and everything a room
    /// does not set itself
    fn into_listings(self) -> Vec<NewListing> {
        let rooms = if self.rooms.is_empty() {
            vec![RoomSpec {
                code: String::new(),
                price: self.price,
                available: self.available,
                window: None,
                room_types: Vec::new(),
            }]
        } else {
            self.rooms
        };

        let base = NewListing {
            house_number: self.house_number.trim().to_string(),
            street: self.street.trim().to_string(),
            ward: self.ward.trim().to_string(),
            district: self.district.trim().to_string(),
            room_type: clean(self.room_types),
            window_type: self.window,
            furniture: clean(self.furniture),
            amenities: clean(self.amenities),
            electricity_rate: self.electricity,
            water_rate: self.water,
            service_fee: self.service,
            parking_fee: self.parking,
            laundry_fee: self.laundry,
            notes: self.notes,
            commission: self.commission,
            photos: clean(self.photos),
            ..Default::default()
        };

        rooms
            .into_iter()
            .map(|room| NewListing {
                room_code: room.code,
                price: room.price,
                available_date: room.available,
                window_type: room.window.unwrap_or_else(|| base.window_type.clone()),
                room_type: if room.room_types.is_empty() {
                    base.room_type.clone()
                } else {
                    room.room_types
                },
                ..base.clone()
            })
            .collect()
    }
}

fn clean(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

pub fn run(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, mut store) = open_store(global)?;
    let listings = args.into_listings();

    let outcome = catalog::add(&mut store, listings, catalog::now()).map_err(store_error)?;
    print_warnings(&outcome.warnings);

    if !global.quiet {
        let ids: Vec<String> = outcome.value.iter().map(u64::to_string).collect();
        println!(
            "{} Added {} listing(s): {}",
            style("✓").green(),
            outcome.value.len(),
            style(ids.join(", ")).cyan()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_room_spec() {
        assert_eq!(
            parse_room_spec("P1:4,500,000:01/03/2025").unwrap(),
            RoomSpec {
                code: "P1".into(),
                price: Some(4_500_000),
                available: NaiveDate::from_ymd_opt(2025, 3, 1),
                window: None,
                room_types: Vec::new(),
            }
        );
        assert_eq!(
            parse_room_spec("P2").unwrap(),
            RoomSpec {
                code: "P2".into(),
                price: None,
                available: None,
                window: None,
                room_types: Vec::new(),
            }
        );
        assert_eq!(
            parse_room_spec("P3::2025-04-01").unwrap().available,
            NaiveDate::from_ymd_opt(2025, 4, 1)
        );
        assert!(parse_room_spec(":100").is_err());
        assert!(parse_room_spec("P1:cheap").is_err());
    }

    #[test]
    fn test_parse_room_spec_with_window_and_types() {
        let room = parse_room_spec("P4:3000000::Ban công:Studio, Gác").unwrap();
        assert_eq!(room.available, None);
        assert_eq!(room.window.as_deref(), Some("Ban công"));
        assert_eq!(room.room_types, vec!["Studio", "Gác"]);

        let room = parse_room_spec("P5:3000000:01/03/2025:").unwrap();
        assert_eq!(room.window, None);
        assert!(room.room_types.is_empty());
    }

    #[derive(clap::Parser)]
    struct Harness {
        #[command(flatten)]
        add: AddArgs,
    }

    fn add_args(extra: &[&str]) -> AddArgs {
        let base = [
            "roomcat",
            "--house-number",
            "12",
            "--street",
            "Lê Lợi",
            "--district",
            "Q1",
        ];
        <Harness as clap::Parser>::try_parse_from(base.iter().chain(extra))
            .unwrap()
            .add
    }

    #[test]
    fn test_rooms_carry_their_own_type_and_window() {
        let listings = add_args(&[
            "--room",
            "P1:3000000::Ban công:Studio",
            "--room",
            "P2:4200000:2025-05-01:Cửa sổ trời:Duplex,Gác",
            "--room",
            "P3:2500000",
            "--room-type",
            "Phòng thường",
            "--window",
            "Không cửa sổ",
            "--amenity",
            "Wifi",
        ])
        .into_listings();

        assert_eq!(listings.len(), 3);
        assert_eq!(listings[0].window_type, "Ban công");
        assert_eq!(listings[0].room_type, vec!["Studio"]);
        assert_eq!(listings[1].window_type, "Cửa sổ trời");
        assert_eq!(listings[1].room_type, vec!["Duplex", "Gác"]);
        assert_eq!(listings[1].available_date, NaiveDate::from_ymd_opt(2025, 5, 1));
        assert_eq!(listings[2].window_type, "Không cửa sổ");
        assert_eq!(listings[2].room_type, vec!["Phòng thường"]);
        assert!(listings.iter().all(|l| l.amenities == vec!["Wifi"]));
        assert!(listings.iter().all(|l| l.street == "Lê Lợi"));
    }

    #[test]
    fn test_single_room_without_room_flag() {
        let listings = add_args(&["--price", "4,500,000", "--window", "Ban công"]).into_listings();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].room_code, "");
        assert_eq!(listings[0].price, Some(4_500_000));
        assert_eq!(listings[0].window_type, "Ban công");
    }
}
