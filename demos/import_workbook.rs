use anyhow::{bail, Context};
use facility_financials::{
    format_currency, summarize_periods, ImportSession, ImportSettings, MappingField, Workbook,
};
use std::path::{Path, PathBuf};

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let path: PathBuf = args
        .next()
        .context("usage: import_workbook <workbook.xlsx> [settings.json]")?
        .into();
    let settings = match args.next() {
        Some(settings_path) => ImportSettings::load(Path::new(&settings_path))?,
        None => ImportSettings::default(),
    };

    let workbook =
        Workbook::open(&path).with_context(|| format!("reading {}", path.display()))?;
    let mut session = ImportSession::new(settings, workbook);
    println!("📂 Sheets: {}", session.sheet_names().join(", "));

    let Some(sheet_name) = session.sheet_names().first().map(|s| s.to_string()) else {
        bail!("{} has no sheets", path.display());
    };
    session.select_sheet(&sheet_name)?;

    let detection = session.detect()?;
    println!("\n🔎 Suggested mapping for '{}':", sheet_name);
    for field in MappingField::ALL {
        let target = detection.mapping.get(field).unwrap_or("<unmapped>");
        println!("  {:<16} -> {}", field.key(), target);
    }

    let missing = detection.mapping.missing_required();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|f| f.key()).collect();
        println!("\n⚠️  Still needs: {}", names.join(", "));
        return Ok(());
    }

    let outcome = session.finish_partial(&detection.mapping)?;
    for warning in &outcome.validation.warnings {
        println!("⚠️  {}", warning);
    }
    for error in &outcome.validation.errors {
        println!("❌ {}", error);
    }

    let summary = summarize_periods(outcome.periods());
    println!("\n✅ {} periods imported", summary.periods.len());
    for row in &summary.periods {
        println!(
            "  {}  revenue {:>12}  EBITDA {:>12}",
            row.period,
            format_currency(row.values.revenue_total),
            format_currency(row.metrics.ebitda)
        );
    }

    Ok(())
}
