//! Turns a ride-hailing order CSV into an enriched table plus heat map feeds.
//!
//! Usage: `cargo run --example congestion_heatmap -- <orders.csv> [output_dir]`

use chrono::TimeDelta;
use std::env;
use std::path::PathBuf;
use urban_metrics::{
    hexbin, time_slices, EngineConfig, HeatmapLayer, HexbinConfig, OrderDataError, OrderFrame,
    UrbanMetricsError,
};

fn main() -> Result<(), UrbanMetricsError> {
    configure_polars_display();
    let mut args = env::args().skip(1);
    let input = PathBuf::from(args.next().unwrap_or_else(|| "data/orders.csv".to_string()));
    let output_dir = PathBuf::from(args.next().unwrap_or_else(|| "output".to_string()));

    let config = EngineConfig::builder()
        .min_samples(25)
        .granularity(TimeDelta::hours(1))
        .build();

    let orders = OrderFrame::read_csv(&input)?;
    let mut enriched = orders.enrich(&config)?;
    println!("{}", enriched.frame.head(Some(10)));

    std::fs::create_dir_all(&output_dir)
        .map_err(|e| OrderDataError::WriteIo(output_dir.clone(), e))?;
    enriched.write_csv(&output_dir.join("enriched_trips.csv"))?;
    enriched.write_parquet(&output_dir.join("enriched_trips.parquet"))?;

    let layer = HeatmapLayer::from_trips(&enriched.trips);
    layer.write_json(&output_dir.join("heatmap.json"))?;
    if let Some(center) = layer.center {
        println!("Map center: {:.5}, {:.5}", center.0, center.1);
    }

    for slice in time_slices(&enriched.trips, &config)? {
        println!("{}: {} trips", slice.label, slice.points.len());
    }

    let cells = hexbin(&enriched.trips, &HexbinConfig::default());
    if let Some(worst) = cells
        .iter()
        .max_by(|a, b| a.mean_score.total_cmp(&b.mean_score))
    {
        println!(
            "Most congested cell: {:.4}, {:.4} (score {:.1} over {} trips)",
            worst.center.0, worst.center.1, worst.mean_score, worst.count
        );
    }

    Ok(())
}

fn configure_polars_display() {
    // show every column
    env::set_var("POLARS_FMT_MAX_COLS", "-1");
}
