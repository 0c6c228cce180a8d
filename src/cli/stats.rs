use super::ui;
use crate::core::ranking::{RankingMetric, top_by};
use crate::core::{AssetSnapshot, MarketDataProvider};
use anyhow::Result;
use comfy_table::Cell;

const LEADERBOARD_SIZE: usize = 10;

pub async fn run(provider: &dyn MarketDataProvider, top_limit: usize) -> Result<()> {
    let assets = super::load_top_assets(provider, top_limit).await?;
    println!("{}", render(&assets));
    Ok(())
}

fn leaderboard(
    assets: &[AssetSnapshot],
    metric: RankingMetric,
    title: &str,
    value_header: &str,
) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Cryptocurrency"),
        ui::header_cell(value_header),
    ]);

    for (rank, asset) in top_by(assets, metric, LEADERBOARD_SIZE).into_iter().enumerate() {
        let value_cell = match metric {
            RankingMetric::MarketCap => ui::number_cell(ui::format_usd_whole(asset.market_cap)),
            RankingMetric::Change24h => asset
                .price_change_percentage_24h
                .map_or(ui::na_cell(), ui::change_cell),
            RankingMetric::Price => ui::number_cell(ui::format_usd_price(asset.current_price)),
        };
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(&asset.name),
            value_cell,
        ]);
    }

    format!(
        "{}\n{}",
        ui::style_text(title, ui::StyleType::Title),
        table
    )
}

pub fn render(assets: &[AssetSnapshot]) -> String {
    let sections = [
        leaderboard(
            assets,
            RankingMetric::MarketCap,
            "Top 10 Cryptocurrencies by Market Cap",
            "Market Cap (USD)",
        ),
        leaderboard(
            assets,
            RankingMetric::Change24h,
            "Top 10 Gainers in the Last 24 Hours",
            "24h Change (%)",
        ),
        leaderboard(
            assets,
            RankingMetric::Price,
            "Top 10 Most Expensive Cryptocurrencies",
            "Price (USD)",
        ),
    ];

    let note = ui::style_text(
        &format!(
            "Rankings only consider the top {} cryptocurrencies by market cap.",
            assets.len()
        ),
        ui::StyleType::Subtle,
    );
    format!("{}\n\n{}", sections.join("\n\n"), note)
}
