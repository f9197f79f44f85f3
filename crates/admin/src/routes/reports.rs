//! Sales report route handlers (level 2).
//!
//! The repository hands back one row per sale with the product's pricing;
//! grouping and totalling happen here in decimal arithmetic.

use std::collections::BTreeMap;

use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use tower_sessions::Session;
use tracing::instrument;

use storeroom_core::Level;

use crate::filters;
use crate::flow::{FormData, field};
use crate::db::SaleRepository;
use crate::middleware::require_level;
use crate::models::{Flash, ReportRow, Severity, flash, take_flash};
use crate::state::AppState;

/// One aggregated report line.
#[derive(Debug, Clone)]
pub struct ReportLine {
    /// Day or month the line covers, already formatted.
    pub label: String,
    pub product: String,
    pub qty: i64,
    pub total_sold: Decimal,
    pub total_cost: Decimal,
}

/// Grand totals across a report.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportTotals {
    pub sold: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
}

/// Date-range form template.
#[derive(Template)]
#[template(path = "reports/form.html")]
struct ReportFormTemplate {
    title: &'static str,
    flash: Option<Flash>,
}

/// Range report result template.
#[derive(Template)]
#[template(path = "reports/result.html")]
struct ReportResultTemplate {
    title: &'static str,
    flash: Option<Flash>,
    start: String,
    end: String,
    lines: Vec<ReportLine>,
    totals: ReportTotals,
}

/// Daily/monthly breakdown template.
#[derive(Template)]
#[template(path = "reports/breakdown.html")]
struct BreakdownTemplate {
    title: &'static str,
    flash: Option<Flash>,
    heading: String,
    lines: Vec<ReportLine>,
    totals: ReportTotals,
}

/// Build the reports router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reports/sales", get(form_page).post(range_report))
        .route("/reports/daily", get(daily))
        .route("/reports/monthly", get(monthly))
}

/// Group report rows by a label, summing quantities and totals.
fn summarize(rows: &[ReportRow], label: impl Fn(&ReportRow) -> String) -> (Vec<ReportLine>, ReportTotals) {
    let mut grouped: BTreeMap<(String, String), ReportLine> = BTreeMap::new();
    for row in rows {
        let key = (label(row), row.product.clone());
        let line = grouped.entry(key.clone()).or_insert_with(|| ReportLine {
            label: key.0,
            product: key.1,
            qty: 0,
            total_sold: Decimal::ZERO,
            total_cost: Decimal::ZERO,
        });
        line.qty += row.qty;
        line.total_sold += row.sale_price.extended(row.qty);
        line.total_cost += row.buy_price.extended(row.qty);
    }

    let mut totals = ReportTotals::default();
    for line in grouped.values() {
        totals.sold += line.total_sold;
        totals.cost += line.total_cost;
    }
    totals.profit = totals.sold - totals.cost;

    (grouped.into_values().collect(), totals)
}

/// Render the date-range form.
///
/// GET /reports/sales
#[instrument(skip(state, session))]
async fn form_page(State(state): State<AppState>, session: Session) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::SPECIAL).await {
        return denied.into_response();
    }

    let template = ReportFormTemplate {
        title: "Sales Report",
        flash: take_flash(&session).await,
    };
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {e}");
        "Internal Server Error".to_owned()
    }))
    .into_response()
}

/// Produce the range report.
///
/// POST /reports/sales
#[instrument(skip(state, session, form))]
async fn range_report(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<FormData>,
) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::SPECIAL).await {
        return denied.into_response();
    }

    let (Some(start_text), Some(end_text)) = (field(&form, "start-date"), field(&form, "end-date"))
    else {
        flash(&session, Severity::Danger, "Select dates.").await;
        return Redirect::to("/reports/sales").into_response();
    };

    let (Some(start), Some(end)) = (
        NaiveDate::parse_from_str(start_text, "%Y-%m-%d").ok(),
        NaiveDate::parse_from_str(end_text, "%Y-%m-%d").ok(),
    ) else {
        flash(&session, Severity::Danger, "Enter dates as YYYY-MM-DD.").await;
        return Redirect::to("/reports/sales").into_response();
    };

    let rows = match SaleRepository::new(state.pool()).report_rows(start, end).await {
        Ok(rows) => rows,
        Err(err) => {
            tracing::error!(error = %err, "range report query failed");
            flash(&session, Severity::Danger, "Sorry, the report failed.").await;
            return Redirect::to("/reports/sales").into_response();
        }
    };

    if rows.is_empty() {
        flash(
            &session,
            Severity::Danger,
            "Sorry, no sales were found for that period.",
        )
        .await;
        return Redirect::to("/reports/sales").into_response();
    }

    let (lines, totals) = summarize(&rows, |row| row.date.to_string());
    let template = ReportResultTemplate {
        title: "Sales Report",
        flash: take_flash(&session).await,
        start: start.to_string(),
        end: end.to_string(),
        lines,
        totals,
    };
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {e}");
        "Internal Server Error".to_owned()
    }))
    .into_response()
}

/// This month's sales, one line per day and product.
///
/// GET /reports/daily
#[instrument(skip(state, session))]
async fn daily(State(state): State<AppState>, session: Session) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::SPECIAL).await {
        return denied.into_response();
    }

    let today = Utc::now().date_naive();
    let Some((start, end)) = month_bounds(today.year(), today.month()) else {
        return Redirect::to("/admin").into_response();
    };

    breakdown_page(
        &state,
        &session,
        "Daily Sales",
        format!("Sales for {}", today.format("%B %Y")),
        start,
        end,
        |row| row.date.to_string(),
    )
    .await
}

/// This year's sales, one line per month and product.
///
/// GET /reports/monthly
#[instrument(skip(state, session))]
async fn monthly(State(state): State<AppState>, session: Session) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::SPECIAL).await {
        return denied.into_response();
    }

    let year = Utc::now().year();
    let (Some(start), Some(end)) = (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) else {
        return Redirect::to("/admin").into_response();
    };

    breakdown_page(
        &state,
        &session,
        "Monthly Sales",
        format!("Sales for {year}"),
        start,
        end,
        |row| row.date.format("%Y-%m").to_string(),
    )
    .await
}

async fn breakdown_page(
    state: &AppState,
    session: &Session,
    title: &'static str,
    heading: String,
    start: NaiveDate,
    end: NaiveDate,
    label: impl Fn(&ReportRow) -> String,
) -> Response {
    let rows = match SaleRepository::new(state.pool()).report_rows(start, end).await {
        Ok(rows) => rows,
        Err(err) => {
            tracing::error!(error = %err, "breakdown report query failed");
            flash(session, Severity::Danger, "Sorry, the report failed.").await;
            return Redirect::to("/admin").into_response();
        }
    };

    let (lines, totals) = summarize(&rows, label);
    let template = BreakdownTemplate {
        title,
        flash: take_flash(session).await,
        heading,
        lines,
        totals,
    };
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {e}");
        "Internal Server Error".to_owned()
    }))
    .into_response()
}

/// First and last day of a month.
fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((start, next.pred_opt()?))
}

#[cfg(test)]
mod tests {
    use storeroom_core::Price;

    use super::*;

    fn row(date: (i32, u32, u32), product: &str, qty: i64, sale: &str, buy: &str) -> ReportRow {
        ReportRow {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).expect("valid date"),
            product: product.to_owned(),
            qty,
            sale_price: Price::parse(sale).expect("price"),
            buy_price: Price::parse(buy).expect("price"),
        }
    }

    #[test]
    fn test_summarize_groups_by_label_and_product() {
        let rows = vec![
            row((2026, 3, 1), "Widget", 2, "3.00", "1.00"),
            row((2026, 3, 1), "Widget", 1, "3.00", "1.00"),
            row((2026, 3, 2), "Widget", 1, "3.00", "1.00"),
        ];

        let (lines, totals) = summarize(&rows, |r| r.date.to_string());
        assert_eq!(lines.len(), 2);
        let first = lines.first().expect("line");
        assert_eq!(first.label, "2026-03-01");
        assert_eq!(first.qty, 3);
        assert_eq!(first.total_sold.to_string(), "9.00");

        assert_eq!(totals.sold.to_string(), "12.00");
        assert_eq!(totals.cost.to_string(), "4.00");
        assert_eq!(totals.profit.to_string(), "8.00");
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(
            month_bounds(2026, 2),
            Some((
                NaiveDate::from_ymd_opt(2026, 2, 1).expect("date"),
                NaiveDate::from_ymd_opt(2026, 2, 28).expect("date"),
            ))
        );
        assert_eq!(
            month_bounds(2026, 12),
            Some((
                NaiveDate::from_ymd_opt(2026, 12, 1).expect("date"),
                NaiveDate::from_ymd_opt(2026, 12, 31).expect("date"),
            ))
        );
    }
}
