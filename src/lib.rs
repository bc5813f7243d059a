use log::{debug, info};
use plotters::style::RGBColor;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
pub mod chart;
pub mod error;
pub mod plot;

pub use chart::{ChartLayout, Series};
pub use error::PerfError;

pub const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

pub const INPUT_CSV: &str = "performance_data.csv";
pub const OUTPUT_PNG: &str = "system_performance.png";

pub const COL_TEST_ID: &str = "TestID";
pub const COL_RESPONSE_TIME: &str = "ResponseTime(ms)";

/// One row of the load-test results
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PerformanceRecord {
    #[serde(rename = "TestID")]
    pub test_id: String,
    #[serde(rename = "ResponseTime(ms)")]
    pub response_time: f64,
}

/// The two kinds of load test, told apart by a substring of the TestID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Load1,
    Load2,
}

impl Category {
    /// drawing order
    pub const ALL: [Category; 2] = [Category::Load1, Category::Load2];

    pub fn pattern(self) -> &'static str {
        match self {
            Category::Load1 => "Load1",
            Category::Load2 => "Load2",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Load1 => "Load1 (PUT requests)",
            Category::Load2 => "Load2 (GET requests)",
        }
    }

    pub fn color(self) -> RGBColor {
        match self {
            Category::Load1 => RGBColor(31, 119, 180),
            Category::Load2 => RGBColor(255, 127, 14),
        }
    }
}

/// The main struct for the load-test results, rows kept in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceTable {
    pub records: Vec<PerformanceRecord>,
}

impl PerformanceTable {
    pub fn new(capacity: usize) -> PerformanceTable {
        PerformanceTable {
            records: Vec::with_capacity(capacity),
        }
    }

    /// Init a PerformanceTable from a csv file with a header row.
    /// A missing file is reported as NotFound, any other problem aborts
    /// the whole load; there is no partial table.
    pub fn from_csv(fin: &Path) -> Result<PerformanceTable, PerfError> {
        let file = File::open(fin).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PerfError::NotFound {
                path: fin.to_path_buf(),
            },
            _ => PerfError::Io(e),
        })?;
        PerformanceTable::from_reader(BufReader::new(file))
    }

    /// Reads csv data from any reader; the header must name both
    /// TestID and ResponseTime(ms), other columns are ignored.
    pub fn from_reader<R: Read>(rdr: R) -> Result<PerformanceTable, PerfError> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(rdr);
        let headers = reader.headers()?.clone();
        for &column in [COL_TEST_ID, COL_RESPONSE_TIME].iter() {
            if !headers.iter().any(|h| h == column) {
                return Err(PerfError::MissingColumn { column });
            }
        }
        let mut table = PerformanceTable::new(1000);
        for result in reader.deserialize() {
            let record: PerformanceRecord = result.map_err(invalid_record)?;
            table.records.push(record);
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// keeps the rows whose TestID contains `pattern` as a literal substring
    /// takes a reference and returns a new PerformanceTable
    pub fn filter_contains(&self, pattern: &str) -> PerformanceTable {
        let records = self
            .records
            .iter()
            .filter(|r| r.test_id.contains(pattern))
            .cloned()
            .collect();
        PerformanceTable { records }
    }

    pub fn category(&self, category: Category) -> PerformanceTable {
        self.filter_contains(category.pattern())
    }
}

impl std::fmt::Display for PerformanceTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{},{}", COL_TEST_ID, COL_RESPONSE_TIME)?;
        for r in self.records.iter() {
            writeln!(f, "{},{}", r.test_id, r.response_time)?
        }
        Ok(())
    }
}

fn invalid_record(e: csv::Error) -> PerfError {
    let invalid = match e.kind() {
        csv::ErrorKind::Deserialize { pos, err } => {
            Some((pos.as_ref().map_or(0, |p| p.line()), err.to_string()))
        }
        csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => Some((
            pos.as_ref().map_or(0, |p| p.line()),
            format!("expected {} fields, found {}", expected_len, len),
        )),
        _ => None,
    };
    match invalid {
        Some((line, reason)) => PerfError::InvalidRecord { line, reason },
        None => PerfError::Csv(e),
    }
}

/// min and max of a slice, None when it is empty
pub fn min_and_max<T: std::cmp::PartialOrd + Copy>(s: &[T]) -> Option<(T, T)> {
    let mut s_iter = s.iter();
    let (mut min, mut max) = match s_iter.next() {
        Some(v) => (*v, *v),
        None => return None,
    };
    for es in s_iter {
        if *es > max {
            max = *es
        }
        if *es < min {
            min = *es
        }
    }
    Some((min, max))
}

/// load, split by category, save the chart and optionally open it
pub fn run(csvin: &Path, pngout: &Path, show: bool) -> Result<(), PerfError> {
    let table = PerformanceTable::from_csv(csvin)?;
    info!("loaded {} rows from {}", table.len(), csvin.display());
    debug!("loaded table:\n{}", table);
    let series: Vec<Series> = Category::ALL
        .iter()
        .map(|&c| Series::from_table(c, &table.category(c)))
        .collect();
    for s in series.iter() {
        info!("{}: {} points", s.category.label(), s.points.len());
    }
    chart::render(&series, pngout)?;
    info!("chart saved to {}", pngout.display());
    if show {
        chart::show(pngout);
    }
    Ok(())
}
