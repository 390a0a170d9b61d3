//! Summary cards for the records in the selected period.
//!
//! Shows:
//! - Sales and purchase totals (unit price sum, weight and count)
//! - The number of records with a pending payment
//! - Net stock, the weight bought minus the weight sold

use maud::{Markup, html};

use crate::{
    aggregation::{Summary, Totals},
    html::{format_currency_rounded, format_weight},
    record::PaymentStatus,
};

const CARD_STYLE: &str = "bg-white dark:bg-gray-800 border border-gray-200 \
    dark:border-gray-700 rounded-lg p-4 shadow-md flex flex-col justify-between";

/// Renders the grid of summary cards for `summary`.
pub(super) fn summary_cards_view(summary: &Summary) -> Markup {
    let pending = summary.payment_status_count(&PaymentStatus::Pending);
    let paid = summary.payment_status_count(&PaymentStatus::Paid);
    let net_weight = summary.by_kind.net_weight();
    let net_stock_style = if net_weight < 0.0 {
        "text-3xl font-bold mb-1 text-red-600 dark:text-red-400"
    } else {
        "text-3xl font-bold mb-1"
    };

    html! {
        section id="summary-cards" class="w-full mx-auto mb-8"
        {
            div class="grid grid-cols-1 sm:grid-cols-2 lg:grid-cols-4 gap-4"
            {
                (totals_card("sales-card", "Sales", &summary.by_kind.sale))
                (totals_card("purchases-card", "Purchases", &summary.by_kind.purchase))

                div id="pending-card" class=(CARD_STYLE)
                {
                    h4 class="text-lg font-semibold mb-3" { "Pending payments" }
                    div class="text-3xl font-bold mb-1" data-value { (pending) }
                    div class="text-sm text-gray-600 dark:text-gray-400"
                    {
                        (paid) " paid"
                    }
                }

                div id="net-stock-card" class=(CARD_STYLE)
                {
                    h4 class="text-lg font-semibold mb-3" { "Net stock" }
                    div class=(net_stock_style) data-value
                    {
                        (format_weight(net_weight))
                    }
                    div class="text-sm text-gray-600 dark:text-gray-400"
                    {
                        "Bought minus sold"
                    }
                }
            }
        }
    }
}

fn totals_card(id: &str, title: &str, totals: &Totals) -> Markup {
    html! {
        div id=(id) class=(CARD_STYLE)
        {
            h4 class="text-lg font-semibold mb-3" { (title) }
            div class="text-3xl font-bold mb-1" data-value
            {
                (format_currency_rounded(totals.price))
            }
            div class="text-sm text-gray-600 dark:text-gray-400"
            {
                (format_weight(totals.weight)) " in " (totals.count)
                @if totals.count == 1 { " record" } @else { " records" }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};
    use time::macros::datetime;

    use crate::{
        aggregation::aggregate,
        record::{Kind, Record},
    };

    use super::summary_cards_view;

    #[track_caller]
    fn card_value(html: &Html, card_id: &str) -> String {
        let selector = Selector::parse(&format!("#{card_id} [data-value]")).unwrap();

        html.select(&selector)
            .next()
            .unwrap_or_else(|| panic!("no value in card {card_id}"))
            .text()
            .collect::<String>()
            .trim()
            .to_owned()
    }

    #[test]
    fn shows_totals_for_each_kind() {
        let records = [
            Record::build(
                Kind::Purchase,
                "Caturra",
                1000.0,
                500.0,
                Some(datetime!(2024-03-10 12:00 UTC)),
            ),
            Record::build(
                Kind::Sale,
                "F6",
                300.0,
                1500.0,
                Some(datetime!(2024-03-11 12:00 UTC)),
            ),
        ];
        let records: Vec<&Record> = records.iter().collect();

        let html = Html::parse_fragment(&summary_cards_view(&aggregate(&records)).into_string());

        assert!(html.errors.is_empty(), "{:?}", html.errors);
        assert_eq!(card_value(&html, "sales-card"), "$1,500");
        assert_eq!(card_value(&html, "purchases-card"), "$500");
        assert_eq!(card_value(&html, "pending-card"), "0");
        assert_eq!(card_value(&html, "net-stock-card"), "700 g");
    }

    #[test]
    fn empty_summary_shows_zeros() {
        let html = Html::parse_fragment(&summary_cards_view(&aggregate(&[])).into_string());

        assert_eq!(card_value(&html, "sales-card"), "$0");
        assert_eq!(card_value(&html, "purchases-card"), "$0");
        assert_eq!(card_value(&html, "pending-card"), "0");
        assert_eq!(card_value(&html, "net-stock-card"), "0 g");
    }
}
