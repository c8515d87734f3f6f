//! Human-facing renderings of a listing

use crate::core::codec::join_human;
use crate::core::record::Record;

/// Display format for available dates
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// Hide the last digits of a house number shown to staff
///
/// Only the part before the first `/` is kept: `1897 → 18xx`, `187 → 1xx`,
/// `12 → xx`, `5 → x`, `127/12/12 → 1xx`, blank → `xx`.
pub fn mask_house_number(house_number: &str) -> String {
    let head = house_number.trim().split('/').next().unwrap_or("");
    let chars: Vec<char> = head.chars().collect();
    match chars.len() {
        0 | 2 => "xx".to_string(),
        1 => "x".to_string(),
        n => {
            let kept: String = chars[..n - 2].iter().collect();
            format!("{}xx", kept)
        }
    }
}

/// Price with thousands separators, e.g. `4,500,000`
pub fn format_price(price: u64) -> String {
    let digits = price.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `12 Lê Lợi, Phường 5, Q1`, with the house number masked when `masked`
///
/// Blank ward or district parts are left out.
pub fn address_line(record: &Record, masked: bool) -> String {
    let house = if masked {
        mask_house_number(&record.house_number)
    } else {
        record.house_number.trim().to_string()
    };
    let street = format!("{} {}", house, record.street.trim());
    [street.trim(), record.ward.trim(), record.district.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Copy-paste summary of a listing for sharing with tenants
pub fn share_text(record: &Record, masked: bool) -> String {
    let price = record.price.map(format_price).unwrap_or_default();
    let date = record
        .available_date
        .map(|d| d.format(DISPLAY_DATE_FORMAT).to_string())
        .unwrap_or_default();
    let commission = if record.commission.trim().is_empty() {
        "Không"
    } else {
        record.commission.as_str()
    };

    let lines = [
        address_line(record, masked),
        "---------------".to_string(),
        "Giá + Mã phòng:".to_string(),
        format!(
            "{}: {} ({}, {}, {} TRỐNG)",
            record.room_code,
            price,
            join_human(&record.room_type),
            record.window_type,
            date
        ),
        String::new(),
        "Các chi phí:".to_string(),
        format!("+ Điện: {}", record.electricity_rate),
        format!("+ Nước: {}", record.water_rate),
        format!("+ Dịch vụ: {}", record.service_fee),
        format!("+ Giữ xe máy: {}", record.parking_fee),
        format!("+ Giặt: {}", record.laundry_fee),
        String::new(),
        format!("Nội thất: {}", join_human(&record.furniture)),
        format!("Tiện ích: {}", join_human(&record.amenities)),
        format!("Ghi chú: {}", record.notes),
        "---------------".to_string(),
        format!("Hoa hồng: {}", commission),
    ];
    lines.join("\n")
}
