//! Sales report route handler.

use askama::Template;
use askama_web::WebTemplate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::instrument;

use carrito_core::{Price, SalesPoint, SalesSummary, sales};

use crate::error::Result;
use crate::filters;
use crate::middleware::SessionContext;
use crate::views::Chrome;

/// One bar of the report chart.
pub struct SalesRow {
    pub label: String,
    pub value: String,
    /// Bar width relative to the peak month, 0..=100.
    pub percent: u32,
}

/// Per-year total.
pub struct YearRow {
    pub year: i32,
    pub total: String,
}

/// Sales report template.
#[derive(Template, WebTemplate)]
#[template(path = "sales_report.html")]
pub struct SalesReportTemplate {
    pub chrome: Chrome,
    pub rows: Vec<SalesRow>,
    pub years: Vec<YearRow>,
    pub total: String,
    pub average: String,
    pub peak_label: String,
    pub peak_value: String,
}

fn rows(points: &[SalesPoint], peak: Decimal) -> Vec<SalesRow> {
    points
        .iter()
        .map(|point| {
            let percent = if peak > Decimal::ZERO {
                (point.value * Decimal::ONE_HUNDRED / peak)
                    .round()
                    .to_u32()
                    .unwrap_or(0)
            } else {
                0
            };
            SalesRow {
                label: point.time.format("%b %Y").to_string(),
                value: Price::new(point.value).to_string(),
                percent,
            }
        })
        .collect()
}

/// Display the sales report.
#[instrument(skip(ctx))]
pub async fn report(ctx: SessionContext) -> Result<SalesReportTemplate> {
    let points = sales::seeded_series();
    let summary = SalesSummary::from_points(&points);

    let (peak_label, peak_value, peak) = summary.peak.as_ref().map_or_else(
        || ("-".to_string(), Price::ZERO.to_string(), Decimal::ZERO),
        |point| {
            (
                point.time.format("%B %Y").to_string(),
                Price::new(point.value).to_string(),
                point.value,
            )
        },
    );

    Ok(SalesReportTemplate {
        chrome: ctx.chrome().await?,
        rows: rows(&points, peak),
        years: summary
            .by_year
            .iter()
            .map(|(year, total)| YearRow {
                year: *year,
                total: Price::new(*total).to_string(),
            })
            .collect(),
        total: Price::new(summary.total).to_string(),
        average: Price::new(summary.average).to_string(),
        peak_label,
        peak_value,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_scale_to_peak() {
        let points = sales::seeded_series();
        let summary = SalesSummary::from_points(&points);
        let peak = summary.peak.unwrap().value;

        let rows = rows(&points, peak);
        assert_eq!(rows.len(), points.len());
        assert_eq!(rows.iter().map(|r| r.percent).max(), Some(100));
        assert_eq!(rows[0].label, "Jan 2023");
    }

    #[test]
    fn test_rows_with_zero_peak() {
        let rows = rows(&sales::seeded_series(), Decimal::ZERO);
        assert!(rows.iter().all(|r| r.percent == 0));
    }
}
