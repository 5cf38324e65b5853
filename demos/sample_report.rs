use facility_financials::{
    format_change, format_compact, format_currency, format_percentage, format_period_range,
    generate_sample_periods, sample_dataset, summarize_periods, year_over_year, AppState,
    ImportSettings, JsonFileStore,
};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let dataset = sample_dataset()?;
    println!("📊 {} ({})", dataset.name, dataset.facility_name);
    println!("📅 {}\n", format_period_range(&dataset.period_keys()));

    let summary = summarize_periods(&dataset.periods);
    println!(
        "{:<9} {:>12} {:>12} {:>9} {:>12} {:>9}",
        "Period", "Revenue", "EBITDA", "Margin", "NOI", "Margin"
    );
    for row in &summary.periods {
        println!(
            "{:<9} {:>12} {:>12} {:>9} {:>12} {:>9}",
            row.period,
            format_currency(row.values.revenue_total),
            format_currency(row.metrics.ebitda),
            format_percentage(row.metrics.ebitda_margin, 1),
            format_currency(row.metrics.noi),
            format_percentage(row.metrics.noi_margin, 1),
        );
    }

    let totals = &summary.totals;
    println!("\nTotals");
    println!("  Revenue:  {}", format_compact(totals.revenue_total));
    println!("  OpEx:     {}", format_compact(totals.opex));
    println!(
        "  EBITDA:   {} ({})",
        format_compact(totals.ebitda),
        format_percentage(totals.ebitda_margin, 1)
    );
    println!(
        "  EBITDAR:  {} ({})",
        format_compact(totals.ebitdar),
        format_percentage(totals.ebitdar_margin, 1)
    );
    println!(
        "  NOI:      {} ({})",
        format_compact(totals.noi),
        format_percentage(totals.noi_margin, 1)
    );

    // A synthetic prior year gives the growth figures something to compare against.
    let prior = generate_sample_periods(
        &dataset.facility_name,
        "2023-01",
        6,
        &mut rand::thread_rng(),
    )?;
    let growth = year_over_year(&dataset.periods, &prior)?;
    println!("\nYear over year");
    println!("  Revenue:  {}", format_change(growth.revenue).text);
    println!("  EBITDA:   {}", format_change(growth.ebitda).text);
    println!("  NOI:      {}", format_change(growth.noi).text);

    let settings = match std::env::args().nth(1) {
        Some(path) => ImportSettings::load(std::path::Path::new(&path))?,
        None => ImportSettings::default(),
    };
    let mut state = AppState::load(JsonFileStore::from_settings(&settings)?)?;
    if state.dataset(&dataset.id).is_none() {
        state.add_dataset(dataset)?;
        println!("\n✅ Saved sample dataset to {}", state.store().dir().display());
    } else {
        println!("\n✅ Sample dataset already stored in {}", state.store().dir().display());
    }

    println!(
        "   {} datasets, {} bytes on disk",
        state.datasets().len(),
        state.store().usage()?
    );

    Ok(())
}
