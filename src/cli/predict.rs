use super::ui;
use crate::core::config::ForecastConfig;
use crate::core::{ArimaModel, ForecastStep, HistoricalSeries, MarketDataProvider};
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Duration, Utc};
use comfy_table::Cell;

/// Column labels of the forecast table; every label is also a formatted column.
pub const FORECAST_COLUMNS: [&str; 4] = [
    "Date",
    "Predicted Price (USD)",
    "Lower Confidence Interval (USD)",
    "Upper Confidence Interval (USD)",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastRow {
    pub date: DateTime<Utc>,
    pub step: ForecastStep,
}

pub async fn run(
    provider: &dyn MarketDataProvider,
    top_limit: usize,
    coin: &str,
    horizon: u32,
    config: &ForecastConfig,
) -> Result<()> {
    let assets = super::load_top_assets(provider, top_limit).await?;
    let asset = super::find_asset(&assets, coin)?;
    let series = super::load_series(provider, &asset.id, config.training_days).await?;

    let rows = forecast_rows(&series, horizon, config)?;
    println!("{}", render(&asset.name, &series, &rows, config));
    Ok(())
}

/// Fits the configured model on `series` and dates one forecast per day
/// after the last observation.
pub fn forecast_rows(
    series: &HistoricalSeries,
    horizon: u32,
    config: &ForecastConfig,
) -> Result<Vec<ForecastRow>> {
    let last = series
        .last()
        .ok_or_else(|| anyhow!("No price history for {}", series.asset_id))?;

    let model = ArimaModel::fit(&series.prices(), config.order)
        .with_context(|| format!("Failed to train forecast model for {}", series.asset_id))?;
    let steps = model
        .forecast(horizon as usize, config.confidence)
        .context("Failed to forecast prices")?;

    Ok(steps
        .into_iter()
        .enumerate()
        .map(|(i, step)| ForecastRow {
            date: last.timestamp + Duration::days(i as i64 + 1),
            step,
        })
        .collect())
}

pub fn render(
    name: &str,
    series: &HistoricalSeries,
    rows: &[ForecastRow],
    config: &ForecastConfig,
) -> String {
    let mut output = format!(
        "{}\n{}\n\n",
        ui::style_text(
            &format!("Predicted Prices for {} over the next {} days", name, rows.len()),
            ui::StyleType::Title
        ),
        ui::style_text(
            &format!(
                "{} trained on {} observations over {} days, {:.0}% confidence intervals",
                config.order,
                series.points.len(),
                series.days,
                config.confidence * 100.0
            ),
            ui::StyleType::Subtle
        )
    );

    let mut table = ui::new_styled_table();
    table.set_header(FORECAST_COLUMNS.iter().map(|label| ui::header_cell(label)));
    for row in rows {
        table.add_row(vec![
            Cell::new(row.date.format("%Y-%m-%d")),
            ui::number_cell(format!("{:.2}", row.step.mean)),
            ui::number_cell(format!("{:.2}", row.step.lower)),
            ui::number_cell(format!("{:.2}", row.step.upper)),
        ]);
    }
    output.push_str(&table.to_string());

    let history = series.prices();
    let forecast: Vec<f64> = rows.iter().map(|r| r.step.mean).collect();
    output.push_str(&format!(
        "\n\n{} {}\n{} {}",
        ui::style_text("History ", ui::StyleType::Label),
        ui::sparkline(&history, 60),
        ui::style_text("Forecast", ui::StyleType::Label),
        ui::sparkline(&forecast, 60)
    ));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ArimaOrder, PricePoint};
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_walk(n: usize) -> HistoricalSeries {
        let mut rng = StdRng::seed_from_u64(21);
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut price: f64 = 30_000.0;
        let points = (0..n)
            .map(|i| {
                price += rng.gen_range(-250.0_f64..250.0);
                PricePoint {
                    timestamp: start + Duration::days(i as i64),
                    price,
                }
            })
            .collect();
        HistoricalSeries {
            asset_id: "bitcoin".to_string(),
            days: 365,
            points,
        }
    }

    #[test]
    fn test_forecast_rows_are_dated_daily_after_last_point() {
        let series = random_walk(120);
        let last = series.last().unwrap().timestamp;

        let rows = forecast_rows(&series, 5, &ForecastConfig::default()).unwrap();

        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].date, last + Duration::days(1));
        assert_eq!(rows[4].date, last + Duration::days(5));
        for row in &rows {
            assert!(row.step.lower < row.step.mean && row.step.mean < row.step.upper);
        }
    }

    #[test]
    fn test_forecast_rows_need_enough_history() {
        let series = random_walk(5);
        let err = forecast_rows(&series, 5, &ForecastConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to train forecast model for bitcoin"));
    }

    #[test]
    fn test_render_uses_formatted_column_labels() {
        let series = random_walk(60);
        let config = ForecastConfig {
            order: ArimaOrder { p: 2, d: 1, q: 0 },
            ..ForecastConfig::default()
        };
        let rows = forecast_rows(&series, 3, &config).unwrap();
        let output = console::strip_ansi_codes(&render("Bitcoin", &series, &rows, &config)).to_string();

        for label in FORECAST_COLUMNS {
            assert!(output.contains(label), "missing column {label}");
        }
        assert!(output.contains("Predicted Prices for Bitcoin over the next 3 days"));
        assert!(output.contains("ARIMA(2,1,0) trained on 60 observations over 365 days"));
        assert!(output.contains(&format!("{:.2}", rows[0].step.mean)));
        assert!(output.contains(&rows[2].date.format("%Y-%m-%d").to_string()));
    }
}
