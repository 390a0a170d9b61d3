//! Dashboard HTTP handlers and view rendering.
//!
//! This module contains:
//! - The route handler for displaying the dashboard
//! - HTML view functions for rendering the dashboard UI

use axum::{
    Extension,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use time::UtcOffset;

use crate::{
    Error,
    aggregation::{Summary, aggregate, daily_sales},
    api::SessionToken,
    dashboard::{
        cards::summary_cards_view,
        charts::{DashboardChart, charts_script, charts_view, coffee_type_chart, daily_sales_chart},
    },
    endpoints,
    filter::filter_records,
    freshness::freshness_view,
    html::{HeadElement, base, link},
    navigation::NavBar,
    period::{PeriodQuery, resolve},
    period_form::period_form,
    record::Record,
    source::{DataState, Snapshot},
    timezone::local_today,
};

/// Display a page with an overview of the records in the selected period.
pub async fn get_dashboard_page(
    State(state): State<DataState>,
    Extension(token): Extension<SessionToken>,
    Query(query): Query<PeriodQuery>,
) -> Result<Response, Error> {
    let (local_offset, today) = local_today(&state.local_timezone)?;
    let snapshot = state.store.snapshot(&state.api, &token).await?;
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW);

    if snapshot.records.is_empty() {
        return Ok(dashboard_no_data_view(nav_bar, &snapshot, local_offset).into_response());
    }

    let selector = query.selector();
    let rule = resolve(&selector, today);
    let records = filter_records(&snapshot.records, &rule, local_offset);
    tracing::debug!(
        "Showing {} of {} records for {selector}",
        records.len(),
        snapshot.records.len()
    );

    let summary = aggregate(&records);
    let charts = build_dashboard_charts(&summary, &records, local_offset);

    Ok(dashboard_view(
        nav_bar,
        &query,
        &selector.to_string(),
        &summary,
        &charts,
        &snapshot,
        local_offset,
    )
    .into_response())
}

/// Creates the dashboard charts for the records in the selected period.
fn build_dashboard_charts(
    summary: &Summary,
    records: &[&Record],
    local_offset: UtcOffset,
) -> [DashboardChart; 2] {
    [
        DashboardChart {
            id: "coffee-type-chart",
            options: coffee_type_chart(summary).to_string(),
        },
        DashboardChart {
            id: "daily-sales-chart",
            options: daily_sales_chart(&daily_sales(records, local_offset)).to_string(),
        },
    ]
}

/// Renders the dashboard page when the API has no records for the user.
fn dashboard_no_data_view(
    nav_bar: NavBar<'_>,
    snapshot: &Snapshot,
    local_offset: UtcOffset,
) -> Markup {
    let nav_bar = nav_bar.into_html();
    let new_record_link = link(endpoints::NEW_RECORD_VIEW, "adding a record");

    let content = html!(
        (nav_bar)

        div class="flex flex-col items-center px-6 py-8 mx-auto max-w-screen-xl text-gray-900 dark:text-white"
        {
            (freshness_view(snapshot, local_offset))

            h2 class="text-xl font-bold"
            {
                "Nothing here yet..."
            }

            p
            {
                "Charts will show up here once there are purchases or sales.
                Get started by " (new_record_link) "."
            }
        }
    );

    base("Dashboard", &[], &content)
}

/// Renders the main dashboard page with the period form, cards and charts.
fn dashboard_view(
    nav_bar: NavBar<'_>,
    query: &PeriodQuery,
    period_description: &str,
    summary: &Summary,
    charts: &[DashboardChart],
    snapshot: &Snapshot,
    local_offset: UtcOffset,
) -> Markup {
    let nav_bar = nav_bar.into_html();

    let content = html!(
        (nav_bar)

        div
            id="dashboard-content"
            class="flex flex-col items-center px-2 lg:px-6 lg:py-8 mx-auto
                max-w-screen-xl text-gray-900 dark:text-white"
        {
            (freshness_view(snapshot, local_offset))

            div class="w-full mb-4"
            {
                (period_form(endpoints::DASHBOARD_VIEW, query, None))
            }

            h2 id="period-description" class="w-full text-xl font-bold mb-4"
            {
                (period_description)
            }

            (summary_cards_view(summary))

            (charts_view(charts))
        }
    );

    let scripts = [
        HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
        charts_script(charts),
    ];

    base("Dashboard", &scripts, &content)
}
