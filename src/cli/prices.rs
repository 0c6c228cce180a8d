use super::ui;
use crate::core::{AssetSnapshot, MarketDataProvider};
use anyhow::Result;
use comfy_table::Cell;
use std::time::Duration;
use tracing::debug;

pub async fn run(
    provider: &dyn MarketDataProvider,
    top_limit: usize,
    ids: &[String],
    watch: Option<Duration>,
) -> Result<()> {
    let Some(interval) = watch else {
        let assets = super::load_top_assets(provider, top_limit).await?;
        println!("{}", render(&assets, ids));
        return Ok(());
    };

    let term = console::Term::stdout();
    loop {
        let assets = super::load_top_assets(provider, top_limit).await?;
        term.clear_screen()?;
        println!("{}", render(&assets, ids));
        println!(
            "\n{}",
            ui::style_text(
                &format!(
                    "Refreshing every {}s, press Ctrl+C to stop",
                    interval.as_secs()
                ),
                ui::StyleType::Subtle
            )
        );

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                debug!("Watch interrupted");
                return Ok(());
            }
        }
    }
}

/// Current metrics for each requested asset, in request order.
pub fn render(assets: &[AssetSnapshot], ids: &[String]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Cryptocurrency"),
        ui::header_cell("Price"),
        ui::header_cell("24h Change"),
        ui::header_cell("Market Cap"),
    ]);

    let mut unknown = Vec::new();
    for id in ids {
        match assets.iter().find(|a| &a.id == id) {
            Some(asset) => {
                table.add_row(vec![
                    Cell::new(&asset.name),
                    ui::number_cell(ui::format_usd_price(asset.current_price)),
                    asset
                        .price_change_percentage_24h
                        .map_or(ui::na_cell(), ui::change_cell),
                    ui::number_cell(ui::format_usd_whole(asset.market_cap)),
                ]);
            }
            None => unknown.push(id.as_str()),
        }
    }

    let mut output = format!(
        "{}\n\n",
        ui::style_text("Real-Time Cryptocurrency Prices", ui::StyleType::Title)
    );
    output.push_str(&table.to_string());

    for id in unknown {
        output.push_str(&format!(
            "\n{}",
            ui::style_text(
                &format!(
                    "'{}' is not among the top {} cryptocurrencies by market cap",
                    id,
                    assets.len()
                ),
                ui::StyleType::Error
            )
        ));
    }
    output
}
