//! Listing record types

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Identifier of a stored record
///
/// Historical sheets contain blank and hand-typed ids, so a loaded record
/// keeps whatever was there instead of failing the whole load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(untagged)]
pub enum RecordId {
    Numeric(u64),
    Malformed(String),
    #[default]
    Missing,
}

impl RecordId {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            RecordId::Numeric(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Numeric(n) => write!(f, "{}", n),
            RecordId::Malformed(s) => write!(f, "{}", s),
            RecordId::Missing => Ok(()),
        }
    }
}

/// One room listing
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Record {
    pub id: RecordId,
    pub house_number: String,
    pub street: String,
    pub ward: String,
    pub district: String,
    pub room_code: String,
    pub price: Option<u64>,
    pub room_type: Vec<String>,
    pub available_date: Option<NaiveDate>,
    pub window_type: String,
    pub furniture: Vec<String>,
    pub amenities: Vec<String>,
    pub electricity_rate: String,
    pub water_rate: String,
    pub service_fee: String,
    pub parking_fee: String,
    pub laundry_fee: String,
    pub notes: String,
    pub commission: String,
    pub photos: Vec<String>,
    pub created_at: Option<NaiveDateTime>,
    /// Columns this crate does not model, carried through unchanged
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Record {
    /// Text of a scalar field
    pub fn scalar(&self, field: ScalarField) -> &str {
        match field {
            ScalarField::HouseNumber => &self.house_number,
            ScalarField::Street => &self.street,
            ScalarField::Ward => &self.ward,
            ScalarField::District => &self.district,
            ScalarField::RoomCode => &self.room_code,
            ScalarField::WindowType => &self.window_type,
            ScalarField::ElectricityRate => &self.electricity_rate,
            ScalarField::WaterRate => &self.water_rate,
            ScalarField::ServiceFee => &self.service_fee,
            ScalarField::ParkingFee => &self.parking_fee,
            ScalarField::LaundryFee => &self.laundry_fee,
            ScalarField::Notes => &self.notes,
            ScalarField::Commission => &self.commission,
        }
    }

    pub fn scalar_mut(&mut self, field: ScalarField) -> &mut String {
        match field {
            ScalarField::HouseNumber => &mut self.house_number,
            ScalarField::Street => &mut self.street,
            ScalarField::Ward => &mut self.ward,
            ScalarField::District => &mut self.district,
            ScalarField::RoomCode => &mut self.room_code,
            ScalarField::WindowType => &mut self.window_type,
            ScalarField::ElectricityRate => &mut self.electricity_rate,
            ScalarField::WaterRate => &mut self.water_rate,
            ScalarField::ServiceFee => &mut self.service_fee,
            ScalarField::ParkingFee => &mut self.parking_fee,
            ScalarField::LaundryFee => &mut self.laundry_fee,
            ScalarField::Notes => &mut self.notes,
            ScalarField::Commission => &mut self.commission,
        }
    }

    /// Values of a multi-valued field
    pub fn list(&self, field: ListField) -> &[String] {
        match field {
            ListField::RoomType => &self.room_type,
            ListField::Furniture => &self.furniture,
            ListField::Amenities => &self.amenities,
            ListField::Photos => &self.photos,
        }
    }

    pub fn list_mut(&mut self, field: ListField) -> &mut Vec<String> {
        match field {
            ListField::RoomType => &mut self.room_type,
            ListField::Furniture => &mut self.furniture,
            ListField::Amenities => &mut self.amenities,
            ListField::Photos => &mut self.photos,
        }
    }

    /// House number, street, ward and district joined by spaces
    pub fn address_text(&self) -> String {
        [
            self.house_number.as_str(),
            self.street.as_str(),
            self.ward.as_str(),
            self.district.as_str(),
        ]
        .join(" ")
    }
}

/// Free-text fields a filter or an edit can address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarField {
    HouseNumber,
    Street,
    Ward,
    District,
    RoomCode,
    WindowType,
    ElectricityRate,
    WaterRate,
    ServiceFee,
    ParkingFee,
    LaundryFee,
    Notes,
    Commission,
}

impl ScalarField {
    pub const ALL: [ScalarField; 13] = [
        ScalarField::HouseNumber,
        ScalarField::Street,
        ScalarField::Ward,
        ScalarField::District,
        ScalarField::RoomCode,
        ScalarField::WindowType,
        ScalarField::ElectricityRate,
        ScalarField::WaterRate,
        ScalarField::ServiceFee,
        ScalarField::ParkingFee,
        ScalarField::LaundryFee,
        ScalarField::Notes,
        ScalarField::Commission,
    ];
}

/// Multi-valued fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListField {
    RoomType,
    Furniture,
    Amenities,
    Photos,
}

impl ListField {
    pub const ALL: [ListField; 4] = [
        ListField::RoomType,
        ListField::Furniture,
        ListField::Amenities,
        ListField::Photos,
    ];
}

/// Everything the "add listing" form supplies; `id` and `created_at` are filled in on save
#[derive(Debug, Clone, Default)]
pub struct NewListing {
    pub house_number: String,
    pub street: String,
    pub ward: String,
    pub district: String,
    pub room_code: String,
    pub price: Option<u64>,
    pub room_type: Vec<String>,
    pub available_date: Option<NaiveDate>,
    pub window_type: String,
    pub furniture: Vec<String>,
    pub amenities: Vec<String>,
    pub electricity_rate: String,
    pub water_rate: String,
    pub service_fee: String,
    pub parking_fee: String,
    pub laundry_fee: String,
    pub notes: String,
    pub commission: String,
    pub photos: Vec<String>,
}

impl NewListing {
    pub fn into_record(self, id: u64, created_at: NaiveDateTime) -> Record {
        Record {
            id: RecordId::Numeric(id),
            house_number: self.house_number,
            street: self.street,
            ward: self.ward,
            district: self.district,
            room_code: self.room_code,
            price: self.price,
            room_type: self.room_type,
            available_date: self.available_date,
            window_type: self.window_type,
            furniture: self.furniture,
            amenities: self.amenities,
            electricity_rate: self.electricity_rate,
            water_rate: self.water_rate,
            service_fee: self.service_fee,
            parking_fee: self.parking_fee,
            laundry_fee: self.laundry_fee,
            notes: self.notes,
            commission: self.commission,
            photos: self.photos,
            created_at: Some(created_at),
            extra: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_display() {
        assert_eq!(RecordId::Numeric(7).to_string(), "7");
        assert_eq!(RecordId::Malformed("abc".into()).to_string(), "abc");
        assert_eq!(RecordId::Missing.to_string(), "");
        assert_eq!(RecordId::Malformed("abc".into()).as_u64(), None);
    }

    #[test]
    fn test_address_text_joins_subfields() {
        let record = Record {
            house_number: "12/3".into(),
            street: "Quang Trung".into(),
            ward: "Phường 10".into(),
            district: "Gò Vấp".into(),
            ..Default::default()
        };
        assert_eq!(record.address_text(), "12/3 Quang Trung Phường 10 Gò Vấp");
    }

    #[test]
    fn test_into_record_fills_id_and_timestamp() {
        let created = NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        let listing = NewListing {
            street: "An Hội".into(),
            room_type: vec!["Studio".into()],
            ..Default::default()
        };
        let record = listing.into_record(9, created);
        assert_eq!(record.id, RecordId::Numeric(9));
        assert_eq!(record.created_at, Some(created));
        assert_eq!(record.room_type, vec!["Studio".to_string()]);
        assert!(record.extra.is_empty());
    }
}
