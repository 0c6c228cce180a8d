use super::ui;
use crate::core::{HistoricalSeries, MarketDataProvider};
use anyhow::Result;
use comfy_table::Cell;

/// Date ranges offered for historical prices, in days.
pub const HISTORY_WINDOWS: [u32; 6] = [7, 14, 30, 90, 180, 365];

pub fn parse_history_days(s: &str) -> Result<u32, String> {
    let days: u32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a number of days"))?;
    if HISTORY_WINDOWS.contains(&days) {
        Ok(days)
    } else {
        Err(format!("days must be one of {HISTORY_WINDOWS:?}"))
    }
}

pub async fn run(
    provider: &dyn MarketDataProvider,
    top_limit: usize,
    coin: &str,
    days: u32,
    rows: usize,
) -> Result<()> {
    let assets = super::load_top_assets(provider, top_limit).await?;
    let asset = super::find_asset(&assets, coin)?;
    let series = super::load_series(provider, &asset.id, days).await?;

    println!("{}", render(&asset.name, &series, rows));
    Ok(())
}

/// Summary, sparkline and the most recent `rows` points (all when zero).
pub fn render(name: &str, series: &HistoricalSeries, rows: usize) -> String {
    let mut output = format!(
        "{}\n\n",
        ui::style_text(
            &format!(
                "Historical Prices for {} over the last {} days",
                name, series.days
            ),
            ui::StyleType::Title
        )
    );

    let (first, last) = match (series.points.first(), series.points.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            output.push_str(&ui::style_text(
                "No price data available for this range.",
                ui::StyleType::Subtle,
            ));
            return output;
        }
    };

    let prices = series.prices();
    let low = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let high = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = ui::terminal_width().saturating_sub(4).clamp(10, 120);
    output.push_str(&format!("{}\n\n", ui::sparkline(&prices, width)));

    let mut summary = ui::new_styled_table();
    summary.set_header(vec![
        ui::header_cell("Start"),
        ui::header_cell("End"),
        ui::header_cell("Change"),
        ui::header_cell("Low"),
        ui::header_cell("High"),
    ]);
    let change = (first.price > 0.0).then(|| (last.price - first.price) / first.price * 100.0);
    summary.add_row(vec![
        ui::number_cell(ui::format_usd_price(first.price)),
        ui::number_cell(ui::format_usd_price(last.price)),
        change.map_or(ui::na_cell(), ui::change_cell),
        ui::number_cell(ui::format_usd_price(low)),
        ui::number_cell(ui::format_usd_price(high)),
    ]);
    output.push_str(&summary.to_string());

    let shown = if rows == 0 {
        series.points.len()
    } else {
        rows.min(series.points.len())
    };
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Timestamp (UTC)"),
        ui::header_cell("Price (USD)"),
    ]);
    for point in &series.points[series.points.len() - shown..] {
        table.add_row(vec![
            Cell::new(point.timestamp.format("%Y-%m-%d %H:%M")),
            ui::number_cell(ui::format_usd_price(point.price)),
        ]);
    }
    output.push_str(&format!("\n\n{table}"));

    if shown < series.points.len() {
        output.push_str(&format!(
            "\n{}",
            ui::style_text(
                &format!(
                    "Showing the latest {} of {} points, use --rows 0 for all",
                    shown,
                    series.points.len()
                ),
                ui::StyleType::Subtle
            )
        ));
    }
    output
}
