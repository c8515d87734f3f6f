//! Expected column set and the raw ⇄ typed table conversion
//!
//! Storage backends deal in [`RawTable`]s: a header row plus rows of
//! [`Cell`]s, exactly as they sit in a sheet. [`normalize`] turns one into a
//! typed [`Table`] with every expected column present; [`denormalize`] goes
//! the other way for writes, encoding list columns with the codec.
//!
//! Header labels are the ones existing catalog sheets already use, so files
//! written by older tooling load without migration.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::core::codec::{decode, encode, Cell};
use crate::core::record::{ListField, Record, RecordId, ScalarField};
use crate::core::table::Table;

/// Date format written to storage
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Timestamp format written to storage
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Columns of the catalog, in storage order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    HouseNumber,
    Street,
    Ward,
    District,
    RoomCode,
    Price,
    RoomType,
    AvailableDate,
    WindowType,
    Furniture,
    Amenities,
    ElectricityRate,
    WaterRate,
    ServiceFee,
    ParkingFee,
    LaundryFee,
    Notes,
    Commission,
    Photos,
    CreatedAt,
}

/// How a column's cells are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Id,
    Price,
    Date,
    Timestamp,
    Scalar(ScalarField),
    List(ListField),
}

impl Column {
    pub const ALL: [Column; 21] = [
        Column::Id,
        Column::HouseNumber,
        Column::Street,
        Column::Ward,
        Column::District,
        Column::RoomCode,
        Column::Price,
        Column::RoomType,
        Column::AvailableDate,
        Column::WindowType,
        Column::Furniture,
        Column::Amenities,
        Column::ElectricityRate,
        Column::WaterRate,
        Column::ServiceFee,
        Column::ParkingFee,
        Column::LaundryFee,
        Column::Notes,
        Column::Commission,
        Column::Photos,
        Column::CreatedAt,
    ];

    /// Header label used in stored sheets
    pub fn header(&self) -> &'static str {
        match self {
            Column::Id => "ID",
            Column::HouseNumber => "Số nhà",
            Column::Street => "Đường",
            Column::Ward => "Phường",
            Column::District => "Quận",
            Column::RoomCode => "Mã phòng",
            Column::Price => "Giá",
            Column::RoomType => "Loại phòng",
            Column::AvailableDate => "Ngày trống",
            Column::WindowType => "Cửa sổ",
            Column::Furniture => "Nội Thất",
            Column::Amenities => "Tiện ích",
            Column::ElectricityRate => "Điện",
            Column::WaterRate => "Nước",
            Column::ServiceFee => "Dịch vụ",
            Column::ParkingFee => "Xe",
            Column::LaundryFee => "Giặt chung",
            Column::Notes => "Ghi chú",
            Column::Commission => "Hoa hồng",
            Column::Photos => "Hình ảnh",
            Column::CreatedAt => "Ngày tạo",
        }
    }

    /// Stable ASCII key, used on the command line and accepted as a header
    pub fn key(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::HouseNumber => "house_number",
            Column::Street => "street",
            Column::Ward => "ward",
            Column::District => "district",
            Column::RoomCode => "room_code",
            Column::Price => "price",
            Column::RoomType => "room_type",
            Column::AvailableDate => "available_date",
            Column::WindowType => "window_type",
            Column::Furniture => "furniture",
            Column::Amenities => "amenities",
            Column::ElectricityRate => "electricity_rate",
            Column::WaterRate => "water_rate",
            Column::ServiceFee => "service_fee",
            Column::ParkingFee => "parking_fee",
            Column::LaundryFee => "laundry_fee",
            Column::Notes => "notes",
            Column::Commission => "commission",
            Column::Photos => "photos",
            Column::CreatedAt => "created_at",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Column::LaundryFee => &["Giặt"],
            _ => &[],
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Id => ColumnKind::Id,
            Column::Price => ColumnKind::Price,
            Column::AvailableDate => ColumnKind::Date,
            Column::CreatedAt => ColumnKind::Timestamp,
            Column::HouseNumber => ColumnKind::Scalar(ScalarField::HouseNumber),
            Column::Street => ColumnKind::Scalar(ScalarField::Street),
            Column::Ward => ColumnKind::Scalar(ScalarField::Ward),
            Column::District => ColumnKind::Scalar(ScalarField::District),
            Column::RoomCode => ColumnKind::Scalar(ScalarField::RoomCode),
            Column::WindowType => ColumnKind::Scalar(ScalarField::WindowType),
            Column::ElectricityRate => ColumnKind::Scalar(ScalarField::ElectricityRate),
            Column::WaterRate => ColumnKind::Scalar(ScalarField::WaterRate),
            Column::ServiceFee => ColumnKind::Scalar(ScalarField::ServiceFee),
            Column::ParkingFee => ColumnKind::Scalar(ScalarField::ParkingFee),
            Column::LaundryFee => ColumnKind::Scalar(ScalarField::LaundryFee),
            Column::Notes => ColumnKind::Scalar(ScalarField::Notes),
            Column::Commission => ColumnKind::Scalar(ScalarField::Commission),
            Column::RoomType => ColumnKind::List(ListField::RoomType),
            Column::Furniture => ColumnKind::List(ListField::Furniture),
            Column::Amenities => ColumnKind::List(ListField::Amenities),
            Column::Photos => ColumnKind::List(ListField::Photos),
        }
    }

    /// Match a (trimmed) header against labels, keys and known aliases
    pub fn from_header(name: &str) -> Option<Column> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let lowered = name.to_lowercase();
        Column::ALL.into_iter().find(|column| {
            column.header().to_lowercase() == lowered
                || column.key() == lowered
                || column.aliases().iter().any(|a| a.to_lowercase() == lowered)
        })
    }

    /// Header labels of the expected schema, in storage order
    pub fn headers() -> Vec<String> {
        Column::ALL.iter().map(|c| c.header().to_string()).collect()
    }
}

/// A sheet as the backends see it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    /// Header row of the expected schema and no data
    pub fn empty_schema() -> Self {
        Self {
            headers: Column::headers(),
            rows: Vec::new(),
        }
    }

    /// Build from a grid of strings whose first row is the header
    ///
    /// Short rows are padded with blanks; cells past the header get
    /// placeholder headers. Every row is kept, all-blank ones included, so a
    /// later full save writes back exactly what was read.
    pub fn from_grid(mut grid: Vec<Vec<String>>) -> Self {
        if grid.is_empty() {
            return Self::default();
        }
        let mut headers = grid.remove(0);
        let widest = grid.iter().map(Vec::len).max().unwrap_or(0);
        while headers.len() < widest {
            headers.push(format!("Unnamed: {}", headers.len()));
        }

        let rows = grid
            .into_iter()
            .map(|row| {
                let mut cells: Vec<Cell> = row.into_iter().map(Cell::from_text).collect();
                cells.resize(headers.len(), Cell::Empty);
                cells
            })
            .collect();

        Self { headers, rows }
    }

    /// Header row followed by every row, as text
    pub fn to_grid(&self) -> Vec<Vec<String>> {
        let mut grid = Vec::with_capacity(self.rows.len() + 1);
        grid.push(self.headers.clone());
        for row in &self.rows {
            grid.push(row.iter().map(Cell::to_text).collect());
        }
        grid
    }

    pub fn has_header(&self, column: Column) -> bool {
        self.headers
            .iter()
            .any(|h| Column::from_header(h) == Some(column))
    }
}

enum Slot {
    Known(Column),
    Extra(String),
}

/// Turn a raw sheet into a typed table
///
/// Headers are trimmed and matched against the expected schema. Missing
/// columns come back as blanks (lists as empty lists); unknown columns are
/// carried in each record's `extra` map. No row is dropped and no cell
/// content makes this fail.
pub fn normalize(raw: RawTable) -> Table {
    let RawTable { headers, rows } = raw;

    let mut seen: HashSet<Column> = HashSet::new();
    let mut extra_names: BTreeSet<String> = BTreeSet::new();
    let mut extra_columns = Vec::new();

    let slots: Vec<Slot> = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            let name = header.trim();
            match Column::from_header(name) {
                Some(column) if seen.insert(column) => Slot::Known(column),
                _ => {
                    let base = if name.is_empty() {
                        format!("Unnamed: {}", idx)
                    } else {
                        name.to_string()
                    };
                    let unique = unique_name(&base, &extra_names);
                    extra_names.insert(unique.clone());
                    extra_columns.push(unique.clone());
                    Slot::Extra(unique)
                }
            }
        })
        .collect();

    let id_column_present = seen.contains(&Column::Id);
    debug!(
        columns = slots.len(),
        rows = rows.len(),
        extra = extra_columns.len(),
        "normalizing table"
    );

    let records = rows
        .into_iter()
        .map(|row| {
            let mut record = Record::default();
            for (slot, cell) in slots.iter().zip(row) {
                match slot {
                    Slot::Known(column) => apply_cell(&mut record, *column, cell),
                    Slot::Extra(name) => {
                        if cell != Cell::Empty {
                            record.extra.insert(name.clone(), cell.to_text());
                        }
                    }
                }
            }
            record
        })
        .collect();

    Table::from_parts(records, extra_columns, id_column_present)
}

fn unique_name(base: &str, taken: &BTreeSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{}.{}", base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Store one raw cell into the matching typed field of `record`
pub fn apply_cell(record: &mut Record, column: Column, cell: Cell) {
    match column.kind() {
        ColumnKind::Id => record.id = parse_id(&cell),
        ColumnKind::Price => record.price = parse_price(cell.trimmed()),
        ColumnKind::Date => record.available_date = parse_date(cell.trimmed()),
        ColumnKind::Timestamp => record.created_at = parse_timestamp(cell.trimmed()),
        ColumnKind::Scalar(field) => *record.scalar_mut(field) = cell.to_text(),
        ColumnKind::List(field) => *record.list_mut(field) = decode(&cell),
    }
}

/// Inverse of [`normalize`]: every expected column in storage order, then the extras
pub fn denormalize(table: &Table) -> RawTable {
    let extra_columns = table.extra_columns();
    let mut headers = Column::headers();
    headers.extend(extra_columns.iter().cloned());

    let rows = table
        .records
        .iter()
        .map(|record| {
            let mut cells: Vec<Cell> = Column::ALL
                .iter()
                .map(|column| column_cell(record, *column))
                .collect();
            cells.extend(extra_columns.iter().map(|name| {
                record
                    .extra
                    .get(name)
                    .map(|text| Cell::from_text(text.clone()))
                    .unwrap_or_default()
            }));
            cells
        })
        .collect();

    RawTable { headers, rows }
}

fn column_cell(record: &Record, column: Column) -> Cell {
    match column.kind() {
        ColumnKind::Id => match &record.id {
            RecordId::Numeric(n) => Cell::Scalar(n.to_string()),
            RecordId::Malformed(text) => Cell::from_text(text.clone()),
            RecordId::Missing => Cell::Empty,
        },
        ColumnKind::Price => record
            .price
            .map(|p| Cell::Scalar(p.to_string()))
            .unwrap_or_default(),
        ColumnKind::Date => record
            .available_date
            .map(|d| Cell::Scalar(d.format(DATE_FORMAT).to_string()))
            .unwrap_or_default(),
        ColumnKind::Timestamp => record
            .created_at
            .map(|t| Cell::Scalar(t.format(TIMESTAMP_FORMAT).to_string()))
            .unwrap_or_default(),
        ColumnKind::Scalar(field) => Cell::from_text(record.scalar(field).to_string()),
        ColumnKind::List(field) => Cell::Scalar(encode(record.list(field))),
    }
}

/// Parse a stored id; ids are positive integers, `3.0` style floats included
pub fn parse_id(cell: &Cell) -> RecordId {
    let text = cell.trimmed();
    if cell.is_blank() {
        return RecordId::Missing;
    }
    match parse_whole_number(text) {
        Some(n) if n > 0 => RecordId::Numeric(n),
        _ => RecordId::Malformed(text.to_string()),
    }
}

/// Parse a stored price; blank or malformed prices are "no value"
pub fn parse_price(text: &str) -> Option<u64> {
    if text.is_empty() {
        return None;
    }
    let parsed = parse_whole_number(text);
    if parsed.is_none() {
        debug!(value = text, "ignoring malformed price");
    }
    parsed
}

fn parse_whole_number(text: &str) -> Option<u64> {
    if let Ok(n) = text.parse::<u64>() {
        return Some(n);
    }
    let float = text.parse::<f64>().ok()?;
    if float.is_finite() && float >= 0.0 && float.fract() == 0.0 && float <= u64::MAX as f64 {
        Some(float as u64)
    } else {
        None
    }
}

/// Parse a date permissively, ignoring any time component
///
/// Accepts ISO dates, day-first `dd/mm/YYYY` dates, datetimes and RFC 3339
/// timestamps. Anything else is "no value".
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| parse_datetime_only(text).map(|dt| dt.date()))
}

/// Parse a timestamp permissively; a bare date means midnight
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    parse_datetime_only(text).or_else(|| {
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
}

fn parse_datetime_only(text: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.naive_local())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_from_header_matches_labels_keys_and_aliases() {
        assert_eq!(Column::from_header("  Giá "), Some(Column::Price));
        assert_eq!(Column::from_header("price"), Some(Column::Price));
        assert_eq!(Column::from_header("Nội thất"), Some(Column::Furniture));
        assert_eq!(Column::from_header("Giặt"), Some(Column::LaundryFee));
        assert_eq!(Column::from_header("Giặt chung"), Some(Column::LaundryFee));
        assert_eq!(Column::from_header("Unknown"), None);
        assert_eq!(Column::from_header(""), None);
    }

    #[test]
    fn test_normalize_adds_missing_list_column_as_empty_lists() {
        let raw = RawTable::from_grid(grid(&[
            &["ID", "Quận", "Giá"],
            &["1", "Gò Vấp", "3000000"],
            &["2", "Bình Thạnh", "4500000"],
        ]));
        let table = normalize(raw);

        assert_eq!(table.len(), 2);
        for record in &table.records {
            assert!(record.amenities.is_empty());
            assert!(record.photos.is_empty());
            assert!(record.available_date.is_none());
            assert_eq!(record.notes, "");
        }
        assert_eq!(table.records[1].price, Some(4_500_000));
    }

    #[test]
    fn test_normalize_trims_headers_and_keeps_unknown_columns() {
        let raw = RawTable::from_grid(grid(&[
            &[" ID ", " Đường", "Chủ nhà", "Chủ nhà"],
            &["4", "Quang Trung", "Anh Ba", "0909"],
        ]));
        let table = normalize(raw);
        let record = &table.records[0];

        assert_eq!(record.id, RecordId::Numeric(4));
        assert_eq!(record.street, "Quang Trung");
        assert_eq!(record.extra.get("Chủ nhà").map(String::as_str), Some("Anh Ba"));
        assert_eq!(record.extra.get("Chủ nhà.1").map(String::as_str), Some("0909"));

        let raw = denormalize(&table);
        assert_eq!(raw.headers.len(), Column::ALL.len() + 2);
        assert_eq!(raw.headers[Column::ALL.len()], "Chủ nhà");
    }

    #[test]
    fn test_normalize_never_drops_rows_with_garbage() {
        let raw = RawTable::from_grid(grid(&[
            &["ID", "Giá", "Ngày trống", "Tiện ích", "Ngày tạo"],
            &["abc", "n/a", "someday", "{broken", "yesterday"],
            &["", "", "", "", ""],
            &["3.0", "2500000.0", "15/01/2025", "[\"Thang máy\"]", "2025-01-02 10:00:00"],
        ]));
        let table = normalize(raw);

        assert_eq!(table.len(), 3);
        let bad = &table.records[0];
        assert_eq!(bad.id, RecordId::Malformed("abc".into()));
        assert_eq!(bad.price, None);
        assert_eq!(bad.available_date, None);
        assert_eq!(bad.amenities, vec!["{broken".to_string()]);
        assert_eq!(bad.created_at, None);

        let blank = &table.records[1];
        assert_eq!(blank.id, RecordId::Missing);
        assert!(blank.amenities.is_empty());

        let good = &table.records[2];
        assert_eq!(good.id, RecordId::Numeric(3));
        assert_eq!(good.price, Some(2_500_000));
        assert_eq!(good.available_date, Some(date(2025, 1, 15)));
        assert_eq!(good.amenities, vec!["Thang máy".to_string()]);
    }

    #[test]
    fn test_denormalize_then_normalize_preserves_records() {
        let raw = RawTable::from_grid(grid(&[
            &["ID", "Số nhà", "Loại phòng", "Ngày trống", "Ngày tạo", "Ghi chú"],
            &["1", "12", "[\"Studio\",\"1PN\"]", "2025-03-01", "2025-02-01 09:15:00", "gần chợ"],
            &["2", "7/1", "[]", "", "", ""],
        ]));
        let table = normalize(raw);
        let again = normalize(denormalize(&table));
        assert_eq!(again.records, table.records);
    }

    #[test]
    fn test_denormalize_encodes_lists_and_blanks() {
        let table = normalize(RawTable::from_grid(grid(&[&["ID"], &["5"]])));
        let raw = denormalize(&table);
        assert_eq!(raw.headers, Column::headers());

        let row = &raw.rows[0];
        let position = |column: Column| Column::ALL.iter().position(|c| *c == column).unwrap();
        assert_eq!(row[position(Column::Id)], Cell::Scalar("5".into()));
        assert_eq!(row[position(Column::Photos)], Cell::Scalar("[]".into()));
        assert_eq!(row[position(Column::Price)], Cell::Empty);
    }

    #[test]
    fn test_from_grid_pads_and_names_overflow_cells() {
        let raw = RawTable::from_grid(grid(&[&["ID", "Quận"], &["1"], &["2", "Q1", "stray"]]));
        assert_eq!(raw.headers, vec!["ID", "Quận", "Unnamed: 2"]);
        assert_eq!(raw.rows[0].len(), 3);
        assert_eq!(raw.rows[1][2], Cell::Scalar("stray".into()));
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2025-03-01"), Some(date(2025, 3, 1)));
        assert_eq!(parse_date("01/03/2025"), Some(date(2025, 3, 1)));
        assert_eq!(parse_date("2025-03-01 00:00:00"), Some(date(2025, 3, 1)));
        assert_eq!(parse_date("2025-03-01T12:30:00+07:00"), Some(date(2025, 3, 1)));
        assert_eq!(parse_date("NaT"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("31/02/2025"), None);
    }

    #[test]
    fn test_parse_timestamp_accepts_bare_date() {
        let ts = parse_timestamp("2025-03-01").unwrap();
        assert_eq!(ts, date(2025, 3, 1).and_hms_opt(0, 0, 0).unwrap());
        let ts = parse_timestamp("2025-03-01 08:09:10.123456").unwrap();
        assert_eq!(ts.date(), date(2025, 3, 1));
    }

    #[test]
    fn test_parse_id_rejects_zero_and_fractions() {
        assert_eq!(parse_id(&Cell::Scalar("0".into())), RecordId::Malformed("0".into()));
        assert_eq!(parse_id(&Cell::Scalar("2.5".into())), RecordId::Malformed("2.5".into()));
        assert_eq!(parse_id(&Cell::Scalar(" 12 ".into())), RecordId::Numeric(12));
        assert_eq!(parse_id(&Cell::Empty), RecordId::Missing);
    }
}
