//! Loading the Berkeley Earth surface temperature CSVs into polars frames.

use crate::climate::error::ClimateDataError;
use log::{info, warn};
use polars::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};

pub const COL_DT: &str = "dt";
pub const COL_YEAR: &str = "year";
pub const COL_MONTH: &str = "month";
pub const COL_CITY: &str = "City";
pub const COL_COUNTRY: &str = "Country";
pub const COL_LATITUDE: &str = "Latitude";
pub const COL_LONGITUDE: &str = "Longitude";
pub const COL_LATITUDE_NUM: &str = "Latitude_num";
pub const COL_LONGITUDE_NUM: &str = "Longitude_num";
pub const COL_AVG_TEMP: &str = "AverageTemperature";
pub const COL_AVG_TEMP_UNCERTAINTY: &str = "AverageTemperatureUncertainty";
pub const COL_LAND_AVG_TEMP: &str = "LandAverageTemperature";

/// The files of the Berkeley Earth "climate change: earth surface temperature" dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClimateDataset {
    /// Global land (and land+ocean) monthly averages.
    Global,
    Country,
    State,
    /// Every city in the dataset. Large.
    City,
    /// A curated subset of about a hundred major cities.
    MajorCity,
}

impl ClimateDataset {
    pub const ALL: [ClimateDataset; 5] = [
        ClimateDataset::Global,
        ClimateDataset::City,
        ClimateDataset::MajorCity,
        ClimateDataset::Country,
        ClimateDataset::State,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            ClimateDataset::Global => "GlobalTemperatures.csv",
            ClimateDataset::Country => "GlobalLandTemperaturesByCountry.csv",
            ClimateDataset::State => "GlobalLandTemperaturesByState.csv",
            ClimateDataset::City => "GlobalLandTemperaturesByCity.csv",
            ClimateDataset::MajorCity => "GlobalLandTemperaturesByMajorCity.csv",
        }
    }

    fn has_city_coordinates(&self) -> bool {
        matches!(self, ClimateDataset::City | ClimateDataset::MajorCity)
    }
}

impl fmt::Display for ClimateDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClimateDataset::Global => "global temperatures",
            ClimateDataset::Country => "temperatures by country",
            ClimateDataset::State => "temperatures by state",
            ClimateDataset::City => "temperatures by city",
            ClimateDataset::MajorCity => "temperatures by major city",
        };
        write!(f, "{}", name)
    }
}

/// Availability of one dataset file on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetInfo {
    pub dataset: ClimateDataset,
    pub path: PathBuf,
    /// File size in MiB, `None` if the file is missing.
    pub size_mb: Option<f64>,
}

impl DatasetInfo {
    pub fn exists(&self) -> bool {
        self.size_mb.is_some()
    }
}

/// Parses a Berkeley Earth coordinate such as `"41.78N"` or `"87.68W"` into signed degrees.
///
/// South and west are negative. Anything without a trailing `N`/`S`/`E`/`W` or with an
/// unparsable number yields `None`.
///
/// # Examples
///
/// ```
/// use urban_metrics::parse_coordinate;
///
/// assert_eq!(parse_coordinate("41.78N"), Some(41.78));
/// assert_eq!(parse_coordinate("87.68W"), Some(-87.68));
/// assert_eq!(parse_coordinate("23.13S"), Some(-23.13));
/// assert_eq!(parse_coordinate("116.38E"), Some(116.38));
/// assert_eq!(parse_coordinate("north"), None);
/// ```
pub fn parse_coordinate(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let direction = raw.chars().last()?;
    let value: f64 = raw[..raw.len() - direction.len_utf8()].parse().ok()?;
    match direction.to_ascii_uppercase() {
        'N' | 'E' => Some(value),
        'S' | 'W' => Some(-value),
        _ => None,
    }
}

/// Adds signed numeric latitude/longitude columns next to the textual ones.
fn with_parsed_coordinates(mut df: DataFrame) -> Result<DataFrame, ClimateDataError> {
    for (source, target) in [
        (COL_LATITUDE, COL_LATITUDE_NUM),
        (COL_LONGITUDE, COL_LONGITUDE_NUM),
    ] {
        let parsed: Vec<Option<f64>> = df
            .column(source)
            .map_err(|e| ClimateDataError::ColumnNotFound(source.to_string(), e))?
            .str()?
            .into_iter()
            .map(|v| v.and_then(parse_coordinate))
            .collect();
        df.with_column(Column::new(target.into(), parsed))?;
    }
    Ok(df)
}

/// Reads the temperature CSVs from a directory and adds calendar columns.
pub struct ClimateLoader {
    data_dir: PathBuf,
}

impl ClimateLoader {
    pub fn new(data_dir: &Path) -> ClimateLoader {
        ClimateLoader {
            data_dir: data_dir.to_path_buf(),
        }
    }

    pub fn path_of(&self, dataset: ClimateDataset) -> PathBuf {
        self.data_dir.join(dataset.file_name())
    }

    /// Loads a dataset with `dt` parsed to a date and `year`/`month` columns added.
    ///
    /// City datasets also get [`COL_LATITUDE_NUM`] and [`COL_LONGITUDE_NUM`].
    pub fn load(&self, dataset: ClimateDataset) -> Result<LazyFrame, ClimateDataError> {
        let path = self.path_of(dataset);
        if !path.exists() {
            warn!("Missing climate dataset {} at {:?}", dataset, path);
            return Err(ClimateDataError::FileNotFound(path));
        }
        info!("Loading {} from {:?}", dataset, path);

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.clone()))
            .map_err(|e| ClimateDataError::CsvRead {
                path: path.clone(),
                source: e,
            })?
            .finish()
            .map_err(|e| ClimateDataError::CsvRead {
                path: path.clone(),
                source: e,
            })?;

        let df = if dataset.has_city_coordinates() {
            with_parsed_coordinates(df)?
        } else {
            df
        };
        info!("Loaded {} rows of {}", df.height(), dataset);

        Ok(df
            .lazy()
            .with_column(col(COL_DT).str().to_date(StrptimeOptions {
                format: Some("%Y-%m-%d".into()),
                ..Default::default()
            }))
            .with_columns([
                col(COL_DT).dt().year().alias(COL_YEAR),
                col(COL_DT).dt().month().alias(COL_MONTH),
            ]))
    }

    pub fn load_global(&self) -> Result<LazyFrame, ClimateDataError> {
        self.load(ClimateDataset::Global)
    }

    pub fn load_country(&self) -> Result<LazyFrame, ClimateDataError> {
        self.load(ClimateDataset::Country)
    }

    pub fn load_state(&self) -> Result<LazyFrame, ClimateDataError> {
        self.load(ClimateDataset::State)
    }

    pub fn load_city(&self, major_cities_only: bool) -> Result<LazyFrame, ClimateDataError> {
        if major_cities_only {
            self.load(ClimateDataset::MajorCity)
        } else {
            self.load(ClimateDataset::City)
        }
    }

    /// Reports which dataset files are present and how large they are.
    pub fn dataset_info(&self) -> Result<Vec<DatasetInfo>, ClimateDataError> {
        ClimateDataset::ALL
            .iter()
            .map(|&dataset| {
                let path = self.path_of(dataset);
                let size_mb = if path.exists() {
                    let metadata = std::fs::metadata(&path)
                        .map_err(|e| ClimateDataError::MetadataRead(path.clone(), e))?;
                    Some(metadata.len() as f64 / (1024.0 * 1024.0))
                } else {
                    None
                };
                Ok(DatasetInfo {
                    dataset,
                    path,
                    size_mb,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_parse_coordinate_edge_cases() {
        assert_eq!(parse_coordinate(" 5.63N "), Some(5.63));
        assert_eq!(parse_coordinate("0.80w"), Some(-0.80));
        assert_eq!(parse_coordinate(""), None);
        assert_eq!(parse_coordinate("N"), None);
        assert_eq!(parse_coordinate("12.5X"), None);
    }

    #[test]
    fn test_load_global_adds_calendar_columns() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("GlobalTemperatures.csv"),
            "dt,LandAverageTemperature,LandAverageTemperatureUncertainty\n\
             1750-01-01,3.034,3.574\n\
             1750-02-01,3.083,3.702\n\
             1850-12-01,,\n",
        )?;

        let df = ClimateLoader::new(dir.path()).load_global()?.collect()?;
        assert_eq!(df.height(), 3);

        let years = df.column(COL_YEAR)?.cast(&DataType::Int32)?;
        let years: Vec<Option<i32>> = years.i32()?.into_iter().collect();
        assert_eq!(years, vec![Some(1750), Some(1750), Some(1850)]);

        let months = df.column(COL_MONTH)?.cast(&DataType::Int32)?;
        let months: Vec<Option<i32>> = months.i32()?.into_iter().collect();
        assert_eq!(months, vec![Some(1), Some(2), Some(12)]);
        Ok(())
    }

    #[test]
    fn test_load_city_parses_coordinates() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("GlobalLandTemperaturesByMajorCity.csv"),
            "dt,AverageTemperature,AverageTemperatureUncertainty,City,Country,Latitude,Longitude\n\
             2013-08-01,26.4,0.3,Chengdu,China,31.35N,103.85E\n\
             2013-08-01,22.1,0.4,Santiago,Chile,32.95S,70.69W\n",
        )?;

        let df = ClimateLoader::new(dir.path()).load_city(true)?.collect()?;
        let lat: Vec<Option<f64>> = df.column(COL_LATITUDE_NUM)?.f64()?.into_iter().collect();
        let lon: Vec<Option<f64>> = df.column(COL_LONGITUDE_NUM)?.f64()?.into_iter().collect();
        assert_eq!(lat, vec![Some(31.35), Some(-32.95)]);
        assert_eq!(lon, vec![Some(103.85), Some(-70.69)]);
        Ok(())
    }

    #[test]
    fn test_missing_dataset() {
        let dir = tempdir().unwrap();
        let Err(err) = ClimateLoader::new(dir.path()).load_country() else {
            panic!("loading a missing file should fail");
        };
        assert!(matches!(err, ClimateDataError::FileNotFound(_)));
    }

    #[test]
    fn test_dataset_info() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("GlobalLandTemperaturesByState.csv"), vec![b'x'; 1024 * 1024])?;

        let info = ClimateLoader::new(dir.path()).dataset_info()?;
        assert_eq!(info.len(), ClimateDataset::ALL.len());
        let state = info
            .iter()
            .find(|i| i.dataset == ClimateDataset::State)
            .unwrap();
        assert_eq!(state.size_mb, Some(1.0));
        assert_eq!(info.iter().filter(|i| i.exists()).count(), 1);
        Ok(())
    }
}
