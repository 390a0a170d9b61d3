//! The records table, with search, period filtering and per-row actions.

use axum::{
    Extension,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;
use time::{Date, UtcOffset};

use crate::{
    Error,
    aggregation::sales_total_on,
    api::SessionToken,
    endpoints::{self, format_endpoint},
    filter::{filter_records, search_records},
    freshness::freshness_view,
    html::{
        BADGE_STYLE, BUTTON_DELETE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency_rounded, format_weight, link,
    },
    navigation::NavBar,
    period::{PeriodMode, PeriodQuery, parse_date, resolve},
    period_form::period_form,
    record::Record,
    source::{DataState, Snapshot},
    timezone::local_today,
};

/// The query parameters of the records table and the CSV export.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordsQuery {
    /// Only show records whose name, ID or phone number contain this text.
    pub search: Option<String>,
    #[serde(flatten)]
    pub period: PeriodQuery,
}

impl RecordsQuery {
    /// Encode the query for use in a link.
    pub fn to_query_string(&self) -> String {
        let period = self.period.to_query_string();
        let search = match self.search.as_deref().map(str::trim) {
            None | Some("") => String::new(),
            Some(search) => serde_urlencoded::to_string([("search", search)])
                .inspect_err(|error| tracing::error!("Could not encode search {search}: {error}"))
                .unwrap_or_default(),
        };

        [period, search]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Get the records in `snapshot` that match the period and search of `query`,
/// in the order the API sent them.
pub(super) fn select_records<'a>(
    snapshot: &'a Snapshot,
    query: &RecordsQuery,
    today: Date,
    local_offset: UtcOffset,
) -> Vec<&'a Record> {
    let rule = resolve(&query.period.selector(), today);
    let records = filter_records(&snapshot.records, &rule, local_offset);

    search_records(&records, query.search.as_deref().unwrap_or_default())
}

/// The date whose sales total is shown above the table.
///
/// This is the chosen date when filtering by a specific date, otherwise today.
fn sales_total_date(query: &PeriodQuery, today: Date) -> Date {
    match query.mode() {
        PeriodMode::Date => query.date.as_deref().and_then(parse_date).unwrap_or(today),
        _ => today,
    }
}

/// Display the records table.
pub async fn get_records_page(
    State(state): State<DataState>,
    Extension(token): Extension<SessionToken>,
    Query(query): Query<RecordsQuery>,
) -> Result<Response, Error> {
    let (local_offset, today) = local_today(&state.local_timezone)?;
    let snapshot = state.store.snapshot(&state.api, &token).await?;
    let records = select_records(&snapshot, &query, today, local_offset);

    let total_date = sales_total_date(&query.period, today);
    let all_records: Vec<&Record> = snapshot.records.iter().collect();
    let sales_total = sales_total_on(&all_records, total_date, local_offset);

    Ok(records_view(
        &query,
        &records,
        &snapshot,
        local_offset,
        total_date,
        sales_total,
    )
    .into_response())
}

fn records_view(
    query: &RecordsQuery,
    records: &[&Record],
    snapshot: &Snapshot,
    local_offset: UtcOffset,
    total_date: Date,
    sales_total: f64,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::RECORDS_VIEW).into_html();
    let export_url = match query.to_query_string() {
        query_string if query_string.is_empty() => endpoints::RECORDS_CSV.to_owned(),
        query_string => format!("{}?{query_string}", endpoints::RECORDS_CSV),
    };

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-xl"
            {
                (freshness_view(snapshot, local_offset))

                div class="flex flex-wrap justify-between items-center gap-4 mb-4"
                {
                    h1 class="text-xl font-bold" { "Records" }

                    div class="no-print flex gap-4"
                    {
                        (link(endpoints::NEW_RECORD_VIEW, "New record"))
                        a href=(export_url) id="export-link" class=(LINK_STYLE) { "Export CSV" }
                    }
                }

                div class="mb-4"
                {
                    (period_form(
                        endpoints::RECORDS_VIEW,
                        &query.period,
                        Some(query.search.as_deref().unwrap_or_default()),
                    ))
                }

                p id="sales-total" class="mb-4 text-lg"
                {
                    "Sales on " (total_date) ": "
                    span class="font-semibold" { (format_currency_rounded(sales_total)) }
                }

                div class="relative overflow-x-auto shadow-md rounded"
                {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "ID" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Phone" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Coffee" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Weight" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Price" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Total" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Kind" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Payment" }
                                th scope="col" class={ (TABLE_CELL_STYLE) " no-print" } { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for record in records {
                                (record_row(record, local_offset))
                            }

                            @if records.is_empty() {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td colspan="11" class={ (TABLE_CELL_STYLE) " text-center" }
                                    {
                                        "No records match the selected period and search."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Records", &[], &content)
}

/// The creation date to show for `record`, falling back to the text the API sent.
pub(super) fn display_date(record: &Record, local_offset: UtcOffset) -> String {
    match record.local_date(local_offset) {
        Some(date) => date.to_string(),
        None => record.created_at_value.clone(),
    }
}

fn record_row(record: &Record, local_offset: UtcOffset) -> Markup {
    let edit_url = format_endpoint(endpoints::EDIT_RECORD_VIEW, &record.id);
    let receipt_url = format_endpoint(endpoints::RECEIPT_VIEW, &record.id);
    let delete_url = format_endpoint(endpoints::RECORD, &record.id);
    let coffee_type = match record.coffee_type() {
        Some(coffee_type) => coffee_type.label(),
        None => record.coffee_type_value.as_str(),
    };
    let kind = record.kind.map(|kind| kind.label()).unwrap_or("Unknown");

    html!(
        tr class=(TABLE_ROW_STYLE) data-record-id=(record.id)
        {
            td class=(TABLE_CELL_STYLE) { (display_date(record, local_offset)) }
            th scope="row" class={ (TABLE_CELL_STYLE) " font-medium text-gray-900 dark:text-white" }
            {
                (record.name)
            }
            td class=(TABLE_CELL_STYLE) { (record.external_id) }
            td class=(TABLE_CELL_STYLE) { (record.phone) }
            td class=(TABLE_CELL_STYLE) { (coffee_type) }
            td class=(TABLE_CELL_STYLE) { (format_weight(record.weight)) }
            td class=(TABLE_CELL_STYLE) { (format_currency_rounded(record.price)) }
            td class=(TABLE_CELL_STYLE) { (format_currency_rounded(record.total_price)) }
            td class=(TABLE_CELL_STYLE) { (kind) }
            td class=(TABLE_CELL_STYLE)
            {
                span class=(BADGE_STYLE) { (record.payment_status.label()) }
            }
            td class={ (TABLE_CELL_STYLE) " no-print" }
            {
                div class="flex gap-4"
                {
                    a href=(receipt_url) class=(LINK_STYLE) { "Receipt" }
                    a href=(edit_url) class=(LINK_STYLE) { "Edit" }
                    button
                        type="button"
                        hx-delete=(delete_url)
                        hx-confirm={ "Delete the record for " (record.name) "?" }
                        hx-target="closest tr"
                        hx-swap="outerHTML"
                        hx-target-error="#alert-container"
                        class=(BUTTON_DELETE_STYLE)
                    {
                        "Delete"
                    }
                }
            }
        }
    )
}

/// A route handler for deleting a record.
///
/// Responds with an empty body so that HTMX removes the table row, or with an
/// alert if the record could not be deleted.
pub async fn delete_record_endpoint(
    State(state): State<DataState>,
    Extension(token): Extension<SessionToken>,
    Path(record_id): Path<String>,
) -> Response {
    let result = state.api.delete_record(&token, &record_id).await;

    if let Err(error) = state.store.mark_stale(&token) {
        return error.into_alert_response();
    }

    match result {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => {
            tracing::info!("Deleted record {record_id}");
            Html("").into_response()
        }
        Err(error) => {
            tracing::warn!("Could not delete record {record_id}: {error}");
            error.into_alert_response()
        }
    }
}
