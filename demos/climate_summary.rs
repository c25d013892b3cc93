//! Summarises the Berkeley Earth temperature CSVs in a directory.
//!
//! Usage: `cargo run --example climate_summary -- [data_dir]`

use std::env;
use std::path::PathBuf;
use urban_metrics::{
    top_countries, ClimateFrameExt, ClimateLoader, RankMetric, UrbanMetricsError, COL_AVG_TEMP,
    COL_COUNTRY, COL_LAND_AVG_TEMP, DEFAULT_BASELINE,
};

fn main() -> Result<(), UrbanMetricsError> {
    let data_dir = PathBuf::from(env::args().nth(1).unwrap_or_else(|| "data".to_string()));
    let loader = ClimateLoader::new(&data_dir);

    for info in loader.dataset_info()? {
        match info.size_mb {
            Some(size) => println!("{:<30} {:>8.1} MB", info.dataset.to_string(), size),
            None => println!("{:<30} missing", info.dataset.to_string()),
        }
    }

    let yearly = loader
        .load_global()?
        .drop_missing(COL_LAND_AVG_TEMP)
        .aggregate_by_year(COL_LAND_AVG_TEMP, &[])
        .moving_average("LandAverageTemperature_mean", 10, None)
        .temperature_change("LandAverageTemperature_mean", None, DEFAULT_BASELINE)
        .collect()?;
    println!("{}", yearly.tail(Some(10)));

    let countries = loader
        .load_country()?
        .drop_missing(COL_AVG_TEMP)
        .filter_year_range(1900, 2013);
    let warming = top_countries(countries, COL_AVG_TEMP, 10, RankMetric::Change)?;
    println!("Fastest warming {}: {}", COL_COUNTRY, warming.join(", "));

    let cities = loader
        .load_city(true)?
        .drop_missing(COL_AVG_TEMP)
        .prepare_for_geospatial(Some(30))
        .collect()?;
    println!("{}", cities.head(Some(10)));

    Ok(())
}
