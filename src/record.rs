//! The purchase and sale records kept by the cooperative.
//!
//! Records are owned by the remote API. This module only describes how they
//! look once fetched: the wire format is tolerant (numbers may arrive as
//! strings, fields may be missing) and every malformed value degrades to a
//! neutral default instead of failing the whole fetch.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset,
    format_description::{BorrowedFormatItem, well_known::Rfc3339},
    macros::format_description,
};

/// The coffee categories the cooperative trades in.
///
/// The order of [CoffeeType::ALL] is the order used for chart labels and
/// summary tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CoffeeType {
    Dry,
    Caturra,
    ColombiaVariety,
    F6,
    PinkBourbon,
    Geisha,
    Tabi,
    CastilloVariety,
}

impl CoffeeType {
    /// Every known category, in display order.
    pub const ALL: [CoffeeType; 8] = [
        CoffeeType::Dry,
        CoffeeType::Caturra,
        CoffeeType::ColombiaVariety,
        CoffeeType::F6,
        CoffeeType::PinkBourbon,
        CoffeeType::Geisha,
        CoffeeType::Tabi,
        CoffeeType::CastilloVariety,
    ];

    /// The value the remote API uses for this category.
    pub fn as_wire_value(self) -> &'static str {
        match self {
            CoffeeType::Dry => "Seco",
            CoffeeType::Caturra => "Caturra",
            CoffeeType::ColombiaVariety => "Variedad Colombia",
            CoffeeType::F6 => "F6",
            CoffeeType::PinkBourbon => "Borboun Rosado",
            CoffeeType::Geisha => "Geishar",
            CoffeeType::Tabi => "Tabi",
            CoffeeType::CastilloVariety => "Variedad Castillo",
        }
    }

    /// The human readable name of the category.
    pub fn label(self) -> &'static str {
        match self {
            CoffeeType::Dry => "Dry",
            CoffeeType::Caturra => "Caturra",
            CoffeeType::ColombiaVariety => "Colombia Variety",
            CoffeeType::F6 => "F6",
            CoffeeType::PinkBourbon => "Pink Bourbon",
            CoffeeType::Geisha => "Geisha",
            CoffeeType::Tabi => "Tabi",
            CoffeeType::CastilloVariety => "Castillo Variety",
        }
    }

    /// Match a wire value against the known categories, ignoring case and
    /// surrounding whitespace.
    pub fn from_wire_value(value: &str) -> Option<Self> {
        let value = value.trim();

        Self::ALL
            .into_iter()
            .find(|coffee_type| coffee_type.as_wire_value().eq_ignore_ascii_case(value))
    }
}

/// The direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Kind {
    #[serde(rename = "compra")]
    Purchase,
    #[serde(rename = "venta")]
    Sale,
}

impl Kind {
    pub fn as_wire_value(self) -> &'static str {
        match self {
            Kind::Purchase => "compra",
            Kind::Sale => "venta",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Kind::Purchase => "Purchase",
            Kind::Sale => "Sale",
        }
    }

    pub fn from_wire_value(value: &str) -> Option<Self> {
        let value = value.trim();

        [Kind::Purchase, Kind::Sale]
            .into_iter()
            .find(|kind| kind.as_wire_value().eq_ignore_ascii_case(value))
    }
}

/// Whether a record has been settled.
///
/// Values other than paid and pending are kept verbatim so that they can
/// still be counted and displayed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PaymentStatus {
    Paid,
    Pending,
    Other(String),
}

impl PaymentStatus {
    pub fn from_wire_value(value: &str) -> Self {
        let value = value.trim();

        if value.eq_ignore_ascii_case("pagado") {
            PaymentStatus::Paid
        } else if value.eq_ignore_ascii_case("pendiente") {
            PaymentStatus::Pending
        } else {
            PaymentStatus::Other(value.to_owned())
        }
    }

    pub fn as_wire_value(&self) -> &str {
        match self {
            PaymentStatus::Paid => "pagado",
            PaymentStatus::Pending => "pendiente",
            PaymentStatus::Other(value) => value,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Other(value) if value.is_empty() => "Unknown",
            PaymentStatus::Other(value) => value,
        }
    }
}

/// A purchase or sale of coffee as returned by the remote API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "WireRecord")]
pub struct Record {
    /// The opaque ID assigned by the remote API.
    pub id: String,
    /// The name of the buyer or seller.
    pub name: String,
    /// The phone number of the buyer or seller.
    pub phone: String,
    /// The national ID of the buyer or seller.
    pub external_id: String,
    /// The coffee type exactly as it was sent, see [Record::coffee_type].
    pub coffee_type_value: String,
    /// Weight in grams.
    pub weight: f64,
    /// Unit price.
    pub price: f64,
    /// Total price.
    pub total_price: f64,
    /// `None` if the remote API sent a kind that is neither a purchase nor a sale.
    pub kind: Option<Kind>,
    pub payment_status: PaymentStatus,
    /// `None` if the creation date could not be parsed.
    pub created_at: Option<OffsetDateTime>,
    /// The creation date exactly as it was sent.
    pub created_at_value: String,
}

impl Record {
    /// The coffee category of the record, if it is one of the known categories.
    pub fn coffee_type(&self) -> Option<CoffeeType> {
        CoffeeType::from_wire_value(&self.coffee_type_value)
    }

    /// The calendar date the record was created on in the timezone `local_offset`.
    pub fn local_date(&self, local_offset: UtcOffset) -> Option<Date> {
        self.created_at
            .map(|created_at| created_at.to_offset(local_offset).date())
    }

    /// The first eight characters of the ID, printed on receipts.
    pub fn verification_code(&self) -> &str {
        match self.id.char_indices().nth(8) {
            Some((end, _)) => &self.id[..end],
            None => &self.id,
        }
    }
}

#[derive(Deserialize)]
struct WireRecord {
    #[serde(rename = "_id", default, deserialize_with = "lenient_string")]
    document_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    id: String,
    #[serde(rename = "nombre", default, deserialize_with = "lenient_string")]
    name: String,
    #[serde(rename = "telefono", default, deserialize_with = "lenient_string")]
    phone: String,
    #[serde(rename = "identificacion", default, deserialize_with = "lenient_string")]
    external_id: String,
    #[serde(rename = "tipo_cafe", default, deserialize_with = "lenient_string")]
    coffee_type: String,
    #[serde(rename = "peso", default, deserialize_with = "lenient_number")]
    weight: f64,
    #[serde(rename = "precio", default, deserialize_with = "lenient_number")]
    price: f64,
    #[serde(rename = "precio_total", default, deserialize_with = "lenient_number")]
    total_price: f64,
    #[serde(rename = "estado", default, deserialize_with = "lenient_string")]
    kind: String,
    #[serde(rename = "estado_monetario", default, deserialize_with = "lenient_string")]
    payment_status: String,
    #[serde(rename = "date_create", default, deserialize_with = "lenient_string")]
    created_at: String,
}

impl From<WireRecord> for Record {
    fn from(wire: WireRecord) -> Self {
        Self {
            kind: Kind::from_wire_value(&wire.kind),
            payment_status: PaymentStatus::from_wire_value(&wire.payment_status),
            created_at: parse_timestamp(&wire.created_at),
            id: if wire.document_id.is_empty() {
                wire.id
            } else {
                wire.document_id
            },
            name: wire.name,
            phone: wire.phone,
            external_id: wire.external_id,
            coffee_type_value: wire.coffee_type,
            weight: wire.weight,
            price: wire.price,
            total_price: wire.total_price,
            created_at_value: wire.created_at,
        }
    }
}

/// Accept any JSON value where a string is expected.
///
/// Numbers keep their textual form, `null` and containers become empty strings.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;

    Ok(match value {
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => String::new(),
    })
}

fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;

    Ok(parse_number(&value))
}

/// Convert a JSON value to a finite number, falling back to zero.
pub fn parse_number(value: &Value) -> f64 {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    number.filter(|number| number.is_finite()).unwrap_or(0.0)
}

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");
const NAIVE_DATE_TIME_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
const NAIVE_DATE_TIME_SUBSECOND_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");

/// Parse a creation timestamp.
///
/// Accepts RFC 3339 date-times, date-times without an offset (taken as UTC)
/// and bare dates (UTC midnight).
pub fn parse_timestamp(text: &str) -> Option<OffsetDateTime> {
    let text = text.trim();

    if let Ok(date_time) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(date_time);
    }

    if let Ok(date_time) = PrimitiveDateTime::parse(text, NAIVE_DATE_TIME_SUBSECOND_FORMAT)
        .or_else(|_| PrimitiveDateTime::parse(text, NAIVE_DATE_TIME_FORMAT))
    {
        return Some(date_time.assume_utc());
    }

    Date::parse(text, DATE_FORMAT)
        .ok()
        .map(|date| PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_utc())
}

/// The data sent to the remote API to create or replace a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordDraft {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "identificacion")]
    pub external_id: String,
    #[serde(rename = "telefono")]
    pub phone: String,
    #[serde(rename = "tipo_cafe")]
    pub coffee_type: String,
    #[serde(rename = "peso")]
    pub weight: f64,
    #[serde(rename = "precio")]
    pub price: f64,
    #[serde(rename = "precio_total")]
    pub total_price: f64,
    #[serde(rename = "estado")]
    pub kind: Kind,
    #[serde(rename = "estado_monetario")]
    pub payment_status: String,
    #[serde(rename = "date_create")]
    pub created_at: String,
}

#[cfg(test)]
impl Record {
    /// Create a record with the fields the core cares about, for tests.
    pub(crate) fn build(
        kind: Kind,
        coffee_type: &str,
        weight: f64,
        price: f64,
        created_at: Option<OffsetDateTime>,
    ) -> Self {
        Self {
            id: "65f0c2a1b3d4e5f6a7b8c9d0".to_owned(),
            name: "Ana Gómez".to_owned(),
            phone: "3001234567".to_owned(),
            external_id: "1094000000".to_owned(),
            coffee_type_value: coffee_type.to_owned(),
            weight,
            price,
            total_price: price,
            kind: Some(kind),
            payment_status: PaymentStatus::Paid,
            created_at,
            created_at_value: created_at.map(|date| date.to_string()).unwrap_or_default(),
        }
    }
}
