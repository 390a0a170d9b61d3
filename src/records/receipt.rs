//! A printable receipt for a single record.

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use time::UtcOffset;

use crate::{
    Error,
    api::SessionToken,
    endpoints,
    html::{BUTTON_SECONDARY_STYLE, base, format_currency, format_weight, link},
    navigation::NavBar,
    record::Record,
    records::page::display_date,
    source::DataState,
    timezone::local_today,
};

/// Display the receipt for a record.
pub async fn get_receipt_page(
    State(state): State<DataState>,
    Extension(token): Extension<SessionToken>,
    Path(record_id): Path<String>,
) -> Result<Response, Error> {
    let (local_offset, _) = local_today(&state.local_timezone)?;
    let snapshot = state.store.snapshot(&state.api, &token).await?;
    let record = snapshot
        .records
        .iter()
        .find(|record| record.id == record_id)
        .ok_or(Error::NotFound)?;

    Ok(receipt_view(record, local_offset).into_response())
}

fn receipt_line(label: &str, id: &str, value: &str) -> Markup {
    html! {
        div class="flex justify-between gap-4 py-2 border-b border-dashed border-gray-300"
        {
            dt class="text-gray-500 dark:text-gray-400" { (label) }
            dd id=(id) class="font-medium text-right" { (value) }
        }
    }
}

fn receipt_view(record: &Record, local_offset: UtcOffset) -> Markup {
    let nav_bar = NavBar::new(endpoints::RECORDS_VIEW).into_html();
    let coffee_type = match record.coffee_type() {
        Some(coffee_type) => coffee_type.label(),
        None => record.coffee_type_value.as_str(),
    };
    let kind = record.kind.map(|kind| kind.label()).unwrap_or("Unknown");

    let content = html! {
        (nav_bar)

        div class="flex flex-col items-center px-6 py-8 mx-auto text-gray-900 dark:text-white"
        {
            article
                id="receipt"
                class="w-full max-w-md p-6 bg-white dark:bg-gray-800 rounded-lg shadow
                    print:shadow-none font-mono"
            {
                header class="text-center mb-4"
                {
                    h1 class="text-xl font-bold" { "Cafetero" }
                    p class="text-sm" { "Transaction receipt" }
                }

                dl
                {
                    (receipt_line("Transaction", "receipt-id", &record.id))
                    (receipt_line("Date", "receipt-date", &display_date(record, local_offset)))
                    (receipt_line("Client", "receipt-client", &record.name))
                    (receipt_line("ID number", "receipt-external-id", &record.external_id))
                    (receipt_line("Phone", "receipt-phone", &record.phone))
                    (receipt_line("Coffee type", "receipt-coffee-type", coffee_type))
                    (receipt_line("Weight", "receipt-weight", &format_weight(record.weight)))
                    (receipt_line("Price", "receipt-price", &format_currency(record.price)))
                    (receipt_line("Total", "receipt-total", &format_currency(record.total_price)))
                    (receipt_line("Kind", "receipt-kind", kind))
                    (receipt_line("Payment", "receipt-payment", record.payment_status.label()))
                }

                p class="mt-6 text-center text-sm"
                {
                    "Verification code: "
                    span id="verification-code" class="font-bold tracking-widest"
                    {
                        (record.verification_code())
                    }
                }
            }

            div class="no-print flex gap-4 mt-6 items-center"
            {
                button type="button" onclick="window.print()" class=(BUTTON_SECONDARY_STYLE)
                {
                    "Print"
                }

                (link(endpoints::RECORDS_VIEW, "Back to records"))
            }
        }
    };

    base("Receipt", &[], &content)
}
