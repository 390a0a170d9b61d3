//! Shows when the records on a page were fetched and lets the user fetch them again.

use maud::{Markup, html};
use time::{
    OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem,
    macros::format_description,
};

use crate::{endpoints, html::BUTTON_SECONDARY_STYLE, source::Snapshot};

const FETCHED_AT_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

/// The time the records were fetched and a button for fetching them again.
///
/// Includes a warning if the latest attempt to fetch the records failed.
pub fn freshness_view(snapshot: &Snapshot, local_offset: UtcOffset) -> Markup {
    let fetched_at = format_fetched_at(snapshot.fetched_at, local_offset);

    html!(
        div class="no-print w-full flex flex-col gap-2 mb-4"
        {
            @if let Some(error) = &snapshot.refresh_error {
                div
                    id="refresh-error"
                    role="alert"
                    class="p-4 text-sm rounded-lg text-yellow-800 bg-yellow-50
                        border border-yellow-300 dark:bg-gray-800 dark:text-yellow-300
                        dark:border-yellow-800"
                {
                    p class="font-medium" { "Could not refresh the records" }
                    p { "Showing records fetched at " (fetched_at) ". " (error) }
                }
            }

            div class="flex items-center justify-end gap-3 text-sm text-gray-600 dark:text-gray-400"
            {
                span { "Updated " (fetched_at) }

                button
                    type="button"
                    hx-post=(endpoints::REFRESH)
                    hx-target-error="#alert-container"
                    class=(BUTTON_SECONDARY_STYLE)
                {
                    "Refresh"
                }
            }
        }
    )
}

fn format_fetched_at(fetched_at: OffsetDateTime, local_offset: UtcOffset) -> String {
    fetched_at
        .to_offset(local_offset)
        .format(FETCHED_AT_FORMAT)
        .inspect_err(|error| tracing::error!("Could not format {fetched_at}: {error}"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};
    use time::macros::{datetime, offset};

    use crate::{endpoints, source::Snapshot};

    use super::freshness_view;

    fn snapshot(refresh_error: Option<&str>) -> Snapshot {
        Snapshot {
            records: Vec::new().into(),
            fetched_at: datetime!(2024-03-10 15:30 UTC),
            refresh_error: refresh_error.map(str::to_owned),
        }
    }

    #[test]
    fn shows_local_fetch_time_and_refresh_button() {
        let html = Html::parse_fragment(
            &freshness_view(&snapshot(None), offset!(-5)).into_string(),
        );

        assert!(html.html().contains("Updated 2024-03-10 10:30"));
        let button = html
            .select(&Selector::parse("button").unwrap())
            .next()
            .unwrap();
        assert_eq!(button.value().attr("hx-post"), Some(endpoints::REFRESH));
        assert!(
            html.select(&Selector::parse("#refresh-error").unwrap())
                .next()
                .is_none()
        );
    }

    #[test]
    fn shows_refresh_error() {
        let html = Html::parse_fragment(
            &freshness_view(&snapshot(Some("connection refused")), offset!(UTC)).into_string(),
        );

        let warning = html
            .select(&Selector::parse("#refresh-error").unwrap())
            .next()
            .expect("no refresh warning");
        assert!(warning.text().collect::<String>().contains("connection refused"));
    }
}
