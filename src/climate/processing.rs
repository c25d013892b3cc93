use crate::climate::loader::{
    COL_AVG_TEMP, COL_AVG_TEMP_UNCERTAINTY, COL_CITY, COL_COUNTRY, COL_LATITUDE_NUM,
    COL_LONGITUDE_NUM, COL_YEAR,
};
use polars::prelude::*;

/// Default reference period for temperature anomalies.
pub const DEFAULT_BASELINE: (i32, i32) = (1951, 1980);

/// Years at each end of the record compared by [`RankMetric::Change`].
const CHANGE_WINDOW_YEARS: i32 = 10;

pub trait ClimateFrameExt {
    /// Keeps rows whose `year` lies in `[start_year, end_year]`.
    fn filter_year_range(self, start_year: i32, end_year: i32) -> LazyFrame;

    /// Keeps rows whose uncertainty column is at most `max_uncertainty`.
    /// Rows with a missing uncertainty are dropped.
    fn filter_uncertainty(self, uncertainty_col: &str, max_uncertainty: f64) -> LazyFrame;

    /// Drops rows where `column` is null.
    fn drop_missing(self, column: &str) -> LazyFrame;

    /// Aggregates `column` per `group_cols` and `year`.
    ///
    /// Produces `<column>_mean`, `<column>_std` (sample), `<column>_min`, `<column>_max` and
    /// `<column>_count`, sorted by the group columns and then by year.
    fn aggregate_by_year(self, column: &str, group_cols: &[&str]) -> LazyFrame;

    /// Adds `<column>_MA`, a trailing moving average over `window` rows.
    ///
    /// The first rows of each series average whatever is available. With `group_col` the
    /// window restarts for every group. Rows should already be in chronological order.
    fn moving_average(self, column: &str, window: usize, group_col: Option<&str>) -> LazyFrame;

    /// Adds `<column>_Change`, the difference from the mean over the inclusive `baseline`
    /// years. With `group_col` every group gets its own baseline; groups without baseline
    /// data get nulls.
    fn temperature_change(
        self,
        column: &str,
        group_col: Option<&str>,
        baseline: (i32, i32),
    ) -> LazyFrame;

    /// Keeps rows more than `n_std` sample standard deviations away from the mean of `column`.
    fn outliers(self, column: &str, n_std: f64) -> LazyFrame;

    /// Reduces a city table to one row per located city with mean temperature and uncertainty.
    ///
    /// `recent_years` restricts the averages to the last N years of the record.
    /// Cities whose coordinates could not be parsed are left out.
    fn prepare_for_geospatial(self, recent_years: Option<i32>) -> LazyFrame;
}

impl ClimateFrameExt for LazyFrame {
    fn filter_year_range(self, start_year: i32, end_year: i32) -> LazyFrame {
        self.filter(
            col(COL_YEAR)
                .gt_eq(lit(start_year))
                .and(col(COL_YEAR).lt_eq(lit(end_year))),
        )
    }

    fn filter_uncertainty(self, uncertainty_col: &str, max_uncertainty: f64) -> LazyFrame {
        self.filter(col(uncertainty_col).lt_eq(lit(max_uncertainty)))
    }

    fn drop_missing(self, column: &str) -> LazyFrame {
        self.filter(col(column).is_not_null())
    }

    fn aggregate_by_year(self, column: &str, group_cols: &[&str]) -> LazyFrame {
        let keys: Vec<Expr> = group_cols
            .iter()
            .map(|c| col(*c))
            .chain(std::iter::once(col(COL_YEAR)))
            .collect();

        self.group_by(keys.clone())
            .agg([
                col(column).mean().alias(format!("{column}_mean")),
                col(column).std(1).alias(format!("{column}_std")),
                col(column).min().alias(format!("{column}_min")),
                col(column).max().alias(format!("{column}_max")),
                col(column).count().alias(format!("{column}_count")),
            ])
            .sort_by_exprs(keys, SortMultipleOptions::default())
    }

    fn moving_average(self, column: &str, window: usize, group_col: Option<&str>) -> LazyFrame {
        let rolling = col(column).rolling_mean(RollingOptionsFixedWindow {
            window_size: window.max(1),
            min_periods: 1,
            ..Default::default()
        });
        let rolling = match group_col {
            Some(group) => rolling.over([col(group)]),
            None => rolling,
        };
        self.with_column(rolling.alias(format!("{column}_MA")))
    }

    fn temperature_change(
        self,
        column: &str,
        group_col: Option<&str>,
        baseline: (i32, i32),
    ) -> LazyFrame {
        let (start, end) = baseline;
        let in_baseline = col(COL_YEAR)
            .gt_eq(lit(start))
            .and(col(COL_YEAR).lt_eq(lit(end)));
        let baseline_mean = col(column).filter(in_baseline).mean();
        let baseline_mean = match group_col {
            Some(group) => baseline_mean.over([col(group)]),
            None => baseline_mean,
        };
        let change = (col(column) - baseline_mean).alias(format!("{column}_Change"));
        self.with_column(change)
    }

    fn outliers(self, column: &str, n_std: f64) -> LazyFrame {
        let mean = col(column).mean();
        let spread = lit(n_std) * col(column).std(1);
        self.filter(
            col(column)
                .lt(mean.clone() - spread.clone())
                .or(col(column).gt(mean + spread)),
        )
    }

    fn prepare_for_geospatial(self, recent_years: Option<i32>) -> LazyFrame {
        let frame = match recent_years {
            Some(years) => self.filter(col(COL_YEAR).gt_eq(col(COL_YEAR).max() - lit(years))),
            None => self,
        };
        frame
            .group_by([
                col(COL_CITY),
                col(COL_COUNTRY),
                col(COL_LATITUDE_NUM),
                col(COL_LONGITUDE_NUM),
            ])
            .agg([
                col(COL_AVG_TEMP).mean(),
                col(COL_AVG_TEMP_UNCERTAINTY).mean(),
            ])
            .filter(
                col(COL_LATITUDE_NUM)
                    .is_not_null()
                    .and(col(COL_LONGITUDE_NUM).is_not_null()),
            )
            .sort_by_exprs(
                [col(COL_COUNTRY), col(COL_CITY)],
                SortMultipleOptions::default(),
            )
    }
}

/// How [`top_countries`] ranks countries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankMetric {
    /// Mean of the last ten years of the record minus the mean of the first ten.
    Change,
    Mean,
    /// Sample standard deviation.
    Std,
}

/// Returns the `n` countries with the highest value of `metric` over `column`, best first.
///
/// Countries for which the metric is undefined rank last.
pub fn top_countries(
    frame: LazyFrame,
    column: &str,
    n: usize,
    metric: RankMetric,
) -> PolarsResult<Vec<String>> {
    const SCORE: &str = "score";

    let scored = match metric {
        RankMetric::Mean => frame
            .group_by([col(COL_COUNTRY)])
            .agg([col(column).mean().alias(SCORE)]),
        RankMetric::Std => frame
            .group_by([col(COL_COUNTRY)])
            .agg([col(column).std(1).alias(SCORE)]),
        RankMetric::Change => {
            let recent = col(COL_YEAR).gt_eq(col("__last_year") - lit(CHANGE_WINDOW_YEARS));
            let early = col(COL_YEAR).lt_eq(col("__first_year") + lit(CHANGE_WINDOW_YEARS));
            let change = col(column).filter(recent).mean() - col(column).filter(early).mean();
            frame
                .with_columns([
                    col(COL_YEAR).max().alias("__last_year"),
                    col(COL_YEAR).min().alias("__first_year"),
                ])
                .group_by([col(COL_COUNTRY)])
                .agg([change.alias(SCORE)])
        }
    };

    let ranked = scored
        .sort_by_exprs(
            [col(SCORE)],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_nulls_last(true),
        )
        .limit(n as IdxSize)
        .collect()?;

    Ok(ranked
        .column(COL_COUNTRY)?
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect())
}
