use super::{min_and_max, Category, PerformanceTable};
use crate::error::PerfError;
use log::{debug, warn};
use plotters::prelude::*;
use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;
use std::process::Command;

/// 10x6 at 100 pixels per unit
pub const FIGURE_SIZE: (u32, u32) = (1000, 600);
pub const TITLE: &str = "System Performance Under Load";
pub const X_DESC: &str = "Test ID";
pub const Y_DESC: &str = "Response Time (ms)";

/// fraction of the data span added above and below the y data
const Y_MARGIN: f64 = 0.05;
const MARKER_SIZE: u32 = 4;
const LINE_WIDTH: u32 = 2;

/// One plotted line: the (TestID, response time) points of a category
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub category: Category,
    pub points: Vec<(String, f64)>,
}

impl Series {
    pub fn from_table(category: Category, table: &PerformanceTable) -> Series {
        let points = table
            .records
            .iter()
            .map(|r| (r.test_id.clone(), r.response_time))
            .collect();
        Series { category, points }
    }

    /// runs of finite values as (category index, value),
    /// a non-finite value ends the current run and is not drawn
    pub fn segments(&self, layout: &ChartLayout) -> Vec<Vec<(usize, f64)>> {
        self.points
            .split(|(_, y)| !y.is_finite())
            .filter(|chunk| !chunk.is_empty())
            .map(|chunk| {
                chunk
                    .iter()
                    .filter_map(|(id, y)| layout.position(id).map(|x| (x, *y)))
                    .collect()
            })
            .collect()
    }
}

/// Shared axes for all the series
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    /// x axis, TestIDs in order of first appearance
    pub categories: Vec<String>,
    pub y_range: Range<f64>,
    /// TestID to position in categories
    index: HashMap<String, usize>,
}

impl ChartLayout {
    pub fn from_series(series: &[Series]) -> ChartLayout {
        let mut categories: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for (id, _) in series.iter().flat_map(|s| s.points.iter()) {
            if !index.contains_key(id) {
                index.insert(id.clone(), categories.len());
                categories.push(id.clone());
            }
        }
        let values: Vec<f64> = series
            .iter()
            .flat_map(|s| s.points.iter().map(|(_, y)| *y))
            .filter(|y| y.is_finite())
            .collect();
        let y_range = match min_and_max(&values[..]) {
            Some((ymin, ymax)) if ymax > ymin => {
                // scaled before subtracting, the span of finite extremes can overflow
                let pad = ymax * Y_MARGIN - ymin * Y_MARGIN;
                let (lo, hi) = (ymin - pad, ymax + pad);
                if (hi - lo).is_finite() {
                    lo..hi
                } else if (ymax - ymin).is_finite() {
                    ymin..ymax
                } else {
                    // the axis span must stay finite, values beyond are clipped
                    let half = f64::MAX / 4.;
                    ymin.max(-half)..ymax.min(half)
                }
            }
            Some((ymin, ymax)) => (ymin - 1.)..(ymax + 1.),
            None => 0.0..1.0,
        };
        ChartLayout {
            categories,
            y_range,
            index,
        }
    }

    pub fn position(&self, test_id: &str) -> Option<usize> {
        self.index.get(test_id).copied()
    }
}

/// draws the series as a png line chart at fout, overwriting it
pub fn render(series: &[Series], fout: &Path) -> Result<(), PerfError> {
    let layout = ChartLayout::from_series(series);
    debug!("chart layout: {:?}", layout);
    // plotters needs at least one category, and the end of an integer axis is inclusive
    let mut xaxis = layout.categories.clone();
    if xaxis.is_empty() {
        xaxis.push(String::new());
    }
    let root = BitMapBackend::new(fout, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(TITLE, ("sans-serif", 32))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d((0..xaxis.len() - 1).into_segmented(), layout.y_range.clone())?;
    chart
        .configure_mesh()
        .light_line_style(&TRANSPARENT)
        .bold_line_style(RGBColor(200, 200, 200).stroke_width(1))
        .label_style(("sans-serif", 16))
        .x_labels(xaxis.len())
        .x_label_formatter(&|x: &SegmentValue<usize>| match x {
            SegmentValue::CenterOf(i) => xaxis.get(*i).cloned().unwrap_or_default(),
            _ => String::new(),
        })
        .x_desc(X_DESC)
        .y_desc(Y_DESC)
        .draw()?;

    let at = |x: usize| SegmentValue::CenterOf(x);
    for s in series.iter() {
        let color = s.category.color();
        let mut segments = s.segments(&layout).into_iter();
        // the first line carries the legend entry, drawn even when empty
        let first = segments.next().unwrap_or_default();
        chart
            .draw_series(LineSeries::new(
                first.iter().map(|&(x, y)| (at(x), y)),
                color.stroke_width(LINE_WIDTH),
            ))?
            .label(s.category.label())
            .legend(move |(x, y)| {
                EmptyElement::at((x, y))
                    + PathElement::new(vec![(0, 0), (20, 0)], color.stroke_width(LINE_WIDTH))
                    + Circle::new((10, 0), MARKER_SIZE, color.filled())
            });
        let rest: Vec<Vec<(usize, f64)>> = segments.collect();
        for segment in rest.iter() {
            chart.draw_series(LineSeries::new(
                segment.iter().map(|&(x, y)| (at(x), y)),
                color.stroke_width(LINE_WIDTH),
            ))?;
        }
        chart.draw_series(
            first
                .iter()
                .chain(rest.iter().flatten())
                .map(|&(x, y)| Circle::new((at(x), y), MARKER_SIZE, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font(("sans-serif", 16))
        .draw()?;
    root.present()?;
    Ok(())
}

/// opens the image with the default viewer of the host and waits for the launcher;
/// the chart is already saved, so a viewer failure is only a warning
pub fn show(fimg: &Path) {
    match viewer_command(fimg).status() {
        Ok(status) if status.success() => debug!("opened {} in the image viewer", fimg.display()),
        Ok(status) => warn!("image viewer for {} exited with {}", fimg.display(), status),
        Err(e) => warn!("could not open {} in an image viewer: {}", fimg.display(), e),
    }
}

#[cfg(target_os = "macos")]
fn viewer_command(fimg: &Path) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(fimg);
    cmd
}

#[cfg(target_os = "windows")]
fn viewer_command(fimg: &Path) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(&["/C", "start", ""]).arg(fimg);
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn viewer_command(fimg: &Path) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(fimg);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn series(category: Category, points: &[(&str, f64)]) -> Series {
        Series {
            category,
            points: points.iter().map(|&(id, y)| (id.to_string(), y)).collect(),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn categories_follow_drawing_order() {
        let s = vec![
            series(Category::Load1, &[("Load1_1", 120.), ("Load1_2", 130.)]),
            series(Category::Load2, &[("Load2_1", 95.)]),
        ];
        let layout = ChartLayout::from_series(&s);
        assert_eq!(layout.categories, vec!["Load1_1", "Load1_2", "Load2_1"]);
        assert!(close(layout.y_range.start, 93.25));
        assert!(close(layout.y_range.end, 131.75));
    }

    #[test]
    fn categories_are_not_sorted_or_duplicated() {
        let s = vec![
            series(Category::Load1, &[("Load1_b", 1.), ("Load1_a", 2.), ("Load1_b", 3.)]),
            series(Category::Load2, &[("Load1_Load2", 4.)]),
        ];
        let layout = ChartLayout::from_series(&s);
        assert_eq!(layout.categories, vec!["Load1_b", "Load1_a", "Load1_Load2"]);
        assert_eq!(layout.position("Load1_b"), Some(0));
        assert_eq!(layout.position("Load1_Load2"), Some(2));
        assert_eq!(layout.position("Load2_x"), None);
    }

    #[test]
    fn empty_series_give_default_axes() {
        let s = vec![series(Category::Load1, &[]), series(Category::Load2, &[])];
        let layout = ChartLayout::from_series(&s);
        assert!(layout.categories.is_empty());
        assert_eq!(layout.y_range, 0.0..1.0);
    }

    #[test]
    fn flat_values_are_padded() {
        let s = vec![series(Category::Load1, &[("Load1_1", 50.), ("Load1_2", 50.)])];
        assert_eq!(ChartLayout::from_series(&s).y_range, 49.0..51.0);
    }

    #[test]
    fn nan_breaks_the_line() {
        let s = series(
            Category::Load1,
            &[("a", 1.), ("b", f64::NAN), ("c", 3.), ("d", 4.), ("e", f64::NAN)],
        );
        let layout = ChartLayout::from_series(&[s.clone()]);
        assert_eq!(layout.categories.len(), 5);
        assert!(close(layout.y_range.start, 0.85));
        assert!(close(layout.y_range.end, 4.15));
        assert_eq!(s.segments(&layout), vec![vec![(0, 1.)], vec![(2, 3.), (3, 4.)]]);
    }

    #[test]
    fn second_series_points_land_after_the_first() {
        let s = vec![
            series(Category::Load1, &[("Load1_1", 120.), ("Load1_2", 130.)]),
            series(Category::Load2, &[("Load2_1", 95.)]),
        ];
        let layout = ChartLayout::from_series(&s);
        assert_eq!(s[1].segments(&layout), vec![vec![(2, 95.)]]);
    }

    #[test]
    fn series_from_table_keeps_rows() {
        let table = PerformanceTable::from_reader(
            "TestID,ResponseTime(ms)\nLoad2_1,95\nLoad2_2,97\n".as_bytes(),
        )
        .unwrap();
        assert_eq!(
            Series::from_table(Category::Load2, &table),
            series(Category::Load2, &[("Load2_1", 95.), ("Load2_2", 97.)])
        );
    }

    #[test]
    fn extreme_values_keep_a_finite_range() {
        let s = vec![series(Category::Load1, &[("Load1_1", 1e308), ("Load1_2", -1e308)])];
        let range = ChartLayout::from_series(&s).y_range;
        assert!((range.end - range.start).is_finite());
        assert!(range.start < 0. && range.end > 0.);

        let s = vec![series(Category::Load1, &[("a", 1.5e308), ("b", 1.79e308)])];
        assert_eq!(ChartLayout::from_series(&s).y_range, 1.5e308..1.79e308);

        let s = vec![series(Category::Load1, &[("a", 1e300), ("b", 3e300)])];
        let range = ChartLayout::from_series(&s).y_range;
        assert!(close(range.start / 1e300, 0.9) && close(range.end / 1e300, 3.1));
    }

    #[test]
    fn positions_of_many_rows() {
        let points: Vec<(String, f64)> = (0..20_000)
            .map(|i| (format!("Load1_{}", i % 5_000), i as f64))
            .collect();
        let s = Series {
            category: Category::Load1,
            points,
        };
        let layout = ChartLayout::from_series(&[s.clone()]);
        assert_eq!(layout.categories.len(), 5_000);
        assert_eq!(layout.position("Load1_4999"), Some(4_999));
        let segments = s.segments(&layout);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0][5_001], (1, 5_001.));
    }

    /// false when the host has no fonts to draw the text with
    fn rendered(result: Result<(), PerfError>) -> bool {
        match result {
            Ok(()) => true,
            Err(PerfError::Render(msg)) if msg.to_lowercase().contains("font") => {
                eprintln!("skipping chart check, no usable font: {}", msg);
                false
            }
            Err(e) => panic!("render failed: {}", e),
        }
    }

    #[test]
    fn renders_single_and_empty_series() {
        let dir = tempfile::tempdir().unwrap();
        let cases = vec![
            (
                "one.png",
                vec![
                    series(Category::Load1, &[("Load1_1", 120.)]),
                    series(Category::Load2, &[]),
                ],
            ),
            (
                "none.png",
                vec![series(Category::Load1, &[]), series(Category::Load2, &[])],
            ),
        ];
        for (name, s) in cases {
            let fout = dir.path().join(name);
            if rendered(render(&s, &fout)) {
                let png = std::fs::read(&fout).unwrap();
                assert!(png.starts_with(b"\x89PNG\r\n\x1a\n"), "{} is not a png", name);
            }
        }
    }
}
