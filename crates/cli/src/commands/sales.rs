//! Sales report summary.

use carrito_core::{Price, SalesSummary, sales};

/// Print the summary the sales report page shows.
pub fn summary() {
    let points = sales::seeded_series();
    let summary = SalesSummary::from_points(&points);

    #[allow(clippy::print_stdout)]
    {
        println!("Months:  {}", points.len());
        println!("Total:   {}", Price::new(summary.total));
        println!("Average: {}", Price::new(summary.average));
        if let Some(peak) = &summary.peak {
            println!(
                "Best:    {} ({})",
                peak.time.format("%B %Y"),
                Price::new(peak.value)
            );
        }
        for (year, total) in &summary.by_year {
            println!("{year}:    {}", Price::new(*total));
        }
    }
}
