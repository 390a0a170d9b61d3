//! Download the filtered records as a CSV file.

use axum::{
    Extension,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use time::UtcOffset;

use crate::{
    Error,
    api::SessionToken,
    record::Record,
    records::page::{RecordsQuery, display_date, select_records},
    source::DataState,
    timezone::local_today,
};

/// One line of the exported file.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    date: String,
    name: &'a str,
    id_number: &'a str,
    phone: &'a str,
    coffee_type: &'a str,
    weight_grams: f64,
    price: f64,
    total_price: f64,
    kind: &'a str,
    payment_status: &'a str,
}

impl<'a> CsvRow<'a> {
    fn new(record: &'a Record, local_offset: UtcOffset) -> Self {
        Self {
            id: &record.id,
            date: display_date(record, local_offset),
            name: &record.name,
            id_number: &record.external_id,
            phone: &record.phone,
            coffee_type: &record.coffee_type_value,
            weight_grams: record.weight,
            price: record.price,
            total_price: record.total_price,
            kind: record.kind.map(|kind| kind.as_wire_value()).unwrap_or_default(),
            payment_status: record.payment_status.as_wire_value(),
        }
    }
}

/// Write `records` as CSV with a header row.
///
/// # Errors
/// Returns [Error::CsvError] if a row cannot be written.
pub fn write_records_csv(records: &[&Record], local_offset: UtcOffset) -> Result<Vec<u8>, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for record in records {
        writer
            .serialize(CsvRow::new(record, local_offset))
            .map_err(|error| Error::CsvError(error.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|error| Error::CsvError(error.to_string()))
}

/// A route handler that downloads the records matching the query as CSV.
pub async fn get_records_csv(
    State(state): State<DataState>,
    Extension(token): Extension<SessionToken>,
    Query(query): Query<RecordsQuery>,
) -> Result<Response, Error> {
    let (local_offset, today) = local_today(&state.local_timezone)?;
    let snapshot = state.store.snapshot(&state.api, &token).await?;
    let records = select_records(&snapshot, &query, today, local_offset);

    let body = write_records_csv(&records, local_offset)
        .inspect_err(|error| tracing::error!("Could not export records: {error}"))?;
    tracing::debug!("Exporting {} records as CSV", records.len());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"records.csv\"",
            ),
        ],
        body,
    )
        .into_response())
}
