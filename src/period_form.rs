//! The form for choosing the period shown by the dashboard and the records table.

use maud::{Markup, html};
use time::Month;

use crate::{
    html::{BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
    period::{PeriodMode, PeriodQuery},
};

const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

/// Render a GET form that submits `query` back to `action`.
///
/// Every parameter input is always rendered. Only the ones used by the chosen
/// mode are read when the query is resolved, so stale values are harmless.
/// If `search` is given, a search box is added to the form.
pub fn period_form(action: &str, query: &PeriodQuery, search: Option<&str>) -> Markup {
    let mode = query.mode();
    let value = |field: &Option<String>| field.clone().unwrap_or_default();
    let selected_month_of_year = query
        .month_of_year
        .as_deref()
        .and_then(|month| month.trim().parse::<u8>().ok());

    html! {
        form
            method="get"
            action=(action)
            id="period-form"
            class="no-print w-full grid grid-cols-2 md:grid-cols-4 gap-3 items-end
                bg-gray-50 dark:bg-gray-800 p-4 rounded-lg"
        {
            @if let Some(search) = search {
                div class="col-span-2"
                {
                    label for="search" class=(FORM_LABEL_STYLE) { "Search" }
                    input
                        type="search"
                        name="search"
                        id="search"
                        value=(search)
                        placeholder="Name, ID or phone"
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            div
            {
                label for="period" class=(FORM_LABEL_STYLE) { "Period" }
                select name="period" id="period" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for option in PeriodMode::ALL {
                        option value=(option.as_query_value()) selected[option == mode]
                        {
                            (option.label())
                        }
                    }
                }
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }
                input
                    type="date"
                    name="date"
                    id="date"
                    value=(value(&query.date))
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="week" class=(FORM_LABEL_STYLE) { "ISO week" }
                input
                    type="week"
                    name="week"
                    id="week"
                    value=(value(&query.week))
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="month" class=(FORM_LABEL_STYLE) { "Month" }
                input
                    type="month"
                    name="month"
                    id="month"
                    value=(value(&query.month))
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="week_of_month" class=(FORM_LABEL_STYLE) { "Week of month" }
                input
                    type="number"
                    name="week_of_month"
                    id="week_of_month"
                    min="1"
                    max="5"
                    value=(value(&query.week_of_month))
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="month_of_year" class=(FORM_LABEL_STYLE) { "Month of any year" }
                select name="month_of_year" id="month_of_year" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" selected[selected_month_of_year.is_none()] { "-" }

                    @for month in MONTHS {
                        option
                            value=(u8::from(month))
                            selected[selected_month_of_year == Some(u8::from(month))]
                        {
                            (month)
                        }
                    }
                }
            }

            div
            {
                label for="offset" class=(FORM_LABEL_STYLE) { "Weeks from now" }
                input
                    type="number"
                    name="offset"
                    id="offset"
                    value=(value(&query.offset))
                    placeholder="0"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Apply" }
        }
    }
}
