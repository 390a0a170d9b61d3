//! Chart generation and rendering for the dashboard.
//!
//! This module creates ECharts visualizations of the records in the selected period:
//! - **Stock by Coffee Type**: weight per coffee type as a bar chart
//! - **Daily Sales**: total price of the sales made on each day
//!
//! Each chart is generated as JSON configuration for the ECharts library and
//! rendered with corresponding HTML containers and JavaScript initialization code.

use charming::{
    Chart,
    component::{Axis, Grid, Title},
    element::{AxisLabel, AxisPointer, AxisPointerType, AxisType, JsFunction, Tooltip, Trigger},
    series::{Line, bar},
};
use maud::{Markup, PreEscaped, html};
use time::Date;

use crate::{
    aggregation::{Summary, coffee_type_series},
    html::HeadElement,
};

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Renders the HTML containers for dashboard charts.
pub(super) fn charts_view(charts: &[DashboardChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }
    )
}

/// Generates JavaScript initialization code for dashboard charts.
///
/// Creates scripts that initialize ECharts instances with dark mode support
/// and responsive resizing.
pub(super) fn charts_script(charts: &[DashboardChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{}\n}});",
        script_content
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

/// Weight per coffee type, purchases and sales combined.
pub(super) fn coffee_type_chart(summary: &Summary) -> Chart {
    let (labels, values) = coffee_type_series(summary);

    Chart::new()
        .title(
            Title::new()
                .text("Stock by Coffee Type")
                .subtext("Purchases and sales, in grams"),
        )
        .tooltip(axis_tooltip(weight_formatter()))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(weight_formatter())),
        )
        .series(bar::Bar::new().name("Weight").data(values))
}

pub(super) fn daily_sales_chart(daily_sales: &[(Date, f64)]) -> Chart {
    let (labels, values): (Vec<String>, Vec<f64>) = daily_sales
        .iter()
        .map(|(date, total)| (date.to_string(), *total))
        .unzip();

    Chart::new()
        .title(Title::new().text("Daily Sales").subtext("Total price per day"))
        .tooltip(axis_tooltip(currency_formatter()))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(Line::new().name("Sales").data(values))
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('es-CO', {
              style: 'currency',
              currency: 'COP',
              maximumFractionDigits: 0
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

#[inline]
fn weight_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "return (number) ? new Intl.NumberFormat('en-US').format(number) + ' g' : \"-\";",
    )
}

fn axis_tooltip(value_formatter: JsFunction) -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(value_formatter)
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
