use crate::config::ChartConfig;
use crate::errors::{Error, Result};
use crate::indicators::{self, Trend};
use crate::series::{self, Series};
use chrono::NaiveDate;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

pub const DATA_DIR: &str = "stock_data";
pub const CHART_DIR: &str = "stock_png";

/// Band multiplier for the volatility overlay (mean ± 2σ).
const BAND_STD_MULT: f64 = 2.0;

const FIGURE_SIZE: (u32, u32) = (1200, 1000);
/// Panel heights at a 3:1:1 ratio of the figure height.
const PRICE_PANEL_HEIGHT: u32 = 600;
const VOLUME_PANEL_HEIGHT: u32 = 200;

const BAND_LINE_COLOR: RGBColor = RGBColor(128, 0, 128);

/// Renders one chart per CSV file found in the data directory.
///
/// Each symbol runs its whole pipeline (load, colorize, band width,
/// render) before the next one starts. Failures are reported per symbol
/// and never stop the batch.
pub fn run(config: &ChartConfig) -> anyhow::Result<()> {
    std::fs::create_dir_all(CHART_DIR)?;

    let csv_files = find_csv_files(DATA_DIR)?;
    if csv_files.is_empty() {
        println!("No CSV files found in {}/ directory", DATA_DIR);
        return Ok(());
    }
    println!("Found {} CSV files to process", csv_files.len());

    let mut rendered = 0;
    let mut skipped = 0;
    for csv_file in &csv_files {
        let Some(symbol) = csv_file.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        println!("\nProcessing {}...", csv_file.display());
        match process_symbol(csv_file, symbol, config) {
            Ok(chart_path) => {
                println!("Chart saved as {}", chart_path.display());
                rendered += 1;
            }
            Err(e) => {
                eprintln!("Error processing {}: {}", csv_file.display(), e);
                skipped += 1;
            }
        }
    }

    println!(
        "\nCompleted processing all CSV files: {} rendered, {} skipped",
        rendered, skipped
    );
    Ok(())
}

/// One symbol's pipeline, start to finish. Returns the written chart path.
fn process_symbol(csv_file: &Path, symbol: &str, config: &ChartConfig) -> Result<PathBuf> {
    let series = series::load_series(csv_file, symbol, config.days)?;
    println!(
        "Data loaded successfully. {} days of data. Creating chart...",
        series.len()
    );

    let colors = indicators::volume_colors(&series);
    let widths = indicators::band_width(&series.closes(), config.band_window, BAND_STD_MULT);

    let chart_path = Path::new(CHART_DIR).join(format!("{}.png", symbol));
    render_chart(&series, &colors, &widths, config.band_window, &chart_path)?;
    Ok(chart_path)
}

fn find_csv_files(dir: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !Path::new(dir).exists() {
        return Ok(files);
    }
    // Non-recursive on purpose: an archive subdirectory is never picked up.
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("csv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Composes the three-panel figure (candlesticks, colored volume, band
/// width line) and persists it as a PNG. Every plotters failure is folded
/// into a single render error for the per-symbol boundary.
pub fn render_chart(
    series: &Series,
    colors: &[Trend],
    widths: &[Option<f64>],
    band_window: usize,
    path: &Path,
) -> Result<()> {
    draw_panels(series, colors, widths, band_window, path)
        .map_err(|e| Error::Render(e.to_string()))
}

fn draw_panels(
    series: &Series,
    colors: &[Trend],
    widths: &[Option<f64>],
    band_window: usize,
    path: &Path,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let (price_area, lower) = root.split_vertically(PRICE_PANEL_HEIGHT);
    let (volume_area, band_area) = lower.split_vertically(VOLUME_PANEL_HEIGHT);

    let bars = &series.bars;
    // The x axis advances by observation index, so non-trading days
    // collapse instead of leaving weekend gaps.
    let x_range = -1.0..bars.len() as f64;
    let dates: Vec<NaiveDate> = bars.iter().map(|bar| bar.date).collect();

    // Panel 1: candlesticks
    let (price_lo, price_hi) = price_bounds(series);
    let title = format!(
        "{} - Candlestick Chart with Volume and {}-Period BB Width",
        series.symbol, band_window
    );

    let mut price_chart = ChartBuilder::on(&price_area)
        .caption(title, ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(0)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range.clone(), price_lo..price_hi)?;
    price_chart
        .configure_mesh()
        .disable_x_mesh()
        .y_desc("Price ($)")
        .label_style(("sans-serif", 12))
        .draw()?;

    let body_width = candle_width_px(bars.len());
    price_chart.draw_series(bars.iter().enumerate().map(|(i, bar)| {
        CandleStick::new(
            i as f64,
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            GREEN.filled(),
            RED.filled(),
            body_width,
        )
    }))?;

    // Panel 2: volume histogram colored by trend
    let volume_max = bars
        .iter()
        .map(|bar| bar.volume)
        .fold(0.0f64, f64::max)
        .max(1.0);

    let mut volume_chart = ChartBuilder::on(&volume_area)
        .margin(10)
        .x_label_area_size(0)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range.clone(), 0.0..volume_max * 1.05)?;
    volume_chart
        .configure_mesh()
        .disable_x_mesh()
        .y_desc("Volume")
        .y_labels(4)
        .label_style(("sans-serif", 12))
        .draw()?;

    volume_chart.draw_series(bars.iter().zip(colors.iter()).enumerate().map(
        |(i, (bar, color))| {
            let fill = match color {
                Trend::Up => GREEN.mix(0.7).filled(),
                Trend::Down => RED.mix(0.7).filled(),
            };
            Rectangle::new([(i as f64 - 0.35, 0.0), (i as f64 + 0.35, bar.volume)], fill)
        },
    ))?;

    // Panel 3: band width line, with the warmup prefix left undrawn
    let band_max = widths.iter().flatten().copied().fold(0.0f64, f64::max);
    let band_top = if band_max > 0.0 { band_max * 1.1 } else { 1.0 };

    let mut band_chart = ChartBuilder::on(&band_area)
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, 0.0..band_top)?;
    band_chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(8)
        .x_label_formatter(&|x| date_label(&dates, *x))
        .y_desc("BB Width")
        .y_labels(4)
        .label_style(("sans-serif", 12))
        .draw()?;

    band_chart.draw_series(LineSeries::new(
        widths
            .iter()
            .enumerate()
            .filter_map(|(i, width)| width.map(|w| (i as f64, w))),
        &BAND_LINE_COLOR,
    ))?;

    root.present()?;
    Ok(())
}

/// Price axis bounds with a little headroom above and below the wicks.
fn price_bounds(series: &Series) -> (f64, f64) {
    let lo = series
        .bars
        .iter()
        .map(|bar| bar.low)
        .fold(f64::INFINITY, f64::min);
    let hi = series
        .bars
        .iter()
        .map(|bar| bar.high)
        .fold(f64::NEG_INFINITY, f64::max);
    let pad = ((hi - lo) * 0.05).max(hi.abs() * 0.01).max(1e-6);
    (lo - pad, hi + pad)
}

/// Pixel width of one candle body, scaled so the series fills the panel.
fn candle_width_px(len: usize) -> u32 {
    let plot_width = FIGURE_SIZE.0.saturating_sub(80) as usize;
    (plot_width * 2 / (len.max(1) * 3)).clamp(1, 20) as u32
}

/// Maps an index-axis coordinate back to the calendar date it stands for.
fn date_label(dates: &[NaiveDate], x: f64) -> String {
    let i = x.round();
    if i < 0.0 || i >= dates.len() as f64 {
        return String::new();
    }
    dates[i as usize].format("%Y-%m-%d").to_string()
}
