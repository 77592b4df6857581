//! Chart generation and rendering for the dashboard.
//!
//! This module creates ECharts visualizations of the category totals:
//! - **Expenses by Category**: one bar per expense category
//! - **Income and Expenses by Category**: income and expense bars side by side
//!   for every category
//!
//! Each chart is generated as JSON configuration for the ECharts library and
//! rendered with corresponding HTML containers and JavaScript initialization code.

use std::collections::BTreeMap;

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, Emphasis, EmphasisFocus, JsFunction,
        Tooltip, Trigger,
    },
    series::bar,
};
use maud::{Markup, PreEscaped, html};

use crate::{
    html::HeadElement,
    transaction::{CategoryTotal, TransactionKind},
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

/// Makes chart options safe to inline in a `<script>` element.
///
/// Category names are free text, so `</` is written as `<\/` to stop a name
/// from closing the script element. Both mean the same inside JSON strings.
fn escape_script_text(options: &str) -> String {
    options.replace("</", "<\\/")
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
                chart.id,
                escape_script_text(&chart.options)
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

/// The bar values of each category, one series per kind.
#[derive(Debug, PartialEq)]
pub(super) struct CategorySeries {
    /// Category names in alphabetical order.
    pub labels: Vec<String>,
    /// The income total of each category, `None` where there is no income.
    pub incomes: Vec<Option<f64>>,
    /// The expense total of each category, `None` where there are no expenses.
    pub expenses: Vec<Option<f64>>,
}

/// Lines up the income and expense totals of every category.
pub(super) fn category_series(totals: &[CategoryTotal]) -> CategorySeries {
    let mut by_category: BTreeMap<&str, (Option<f64>, Option<f64>)> = BTreeMap::new();

    for total in totals {
        let entry = by_category.entry(total.category.as_str()).or_default();

        match total.kind {
            TransactionKind::Income => entry.0 = Some(total.total),
            TransactionKind::Expense => entry.1 = Some(total.total),
        }
    }

    let mut series = CategorySeries {
        labels: Vec::with_capacity(by_category.len()),
        incomes: Vec::with_capacity(by_category.len()),
        expenses: Vec::with_capacity(by_category.len()),
    };

    for (category, (income, expense)) in by_category {
        series.labels.push(category.to_owned());
        series.incomes.push(income);
        series.expenses.push(expense);
    }

    series
}

pub(super) fn expenses_by_category_chart(totals: &[CategoryTotal]) -> Chart {
    let (labels, values): (Vec<String>, Vec<f64>) = totals
        .iter()
        .filter(|total| total.kind == TransactionKind::Expense)
        .map(|total| (total.category.clone(), total.total))
        .unzip();

    Chart::new()
        .title(Title::new().text("Expenses by Category"))
        .tooltip(currency_tooltip())
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
        .series(bar::Bar::new().name("Expenses").data(values))
}

pub(super) fn income_and_expenses_chart(totals: &[CategoryTotal]) -> Chart {
    let series = category_series(totals);

    Chart::new()
        .title(Title::new().text("Income and Expenses by Category").left(20))
        .tooltip(currency_tooltip())
        .legend(Legend::new().left(300))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .top(60)
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(series.labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(
            bar::Bar::new()
                .name("Income")
                .emphasis(Emphasis::new().focus(EmphasisFocus::Series))
                .data(series.incomes),
        )
        .series(
            bar::Bar::new()
                .name("Expenses")
                .emphasis(Emphasis::new().focus(EmphasisFocus::Series))
                .data(series.expenses),
        )
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('de-CH', {
              style: 'currency',
              currency: 'CHF'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

/// Creates a tooltip configuration for currency values
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
