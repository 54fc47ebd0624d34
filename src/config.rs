use std::path::Path;

pub const SETTINGS_FILE: &str = "days.txt";

const DEFAULT_DAYS: usize = 90;
const DEFAULT_BAND_WINDOW: usize = 7;

/// Run settings resolved once before the batch starts. Immutable from
/// then on; every per-symbol task reads the same record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartConfig {
    /// Most recent trading days kept per series; 0 keeps everything.
    pub days: usize,
    /// Rolling window for the volatility band width.
    pub band_window: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            days: DEFAULT_DAYS,
            band_window: DEFAULT_BAND_WINDOW,
        }
    }
}

/// Reads the two-line settings file: line 1 is the day lookback, line 2
/// the band window. A missing, short, or unparseable file silently falls
/// back to the defaults.
pub fn load<P: AsRef<Path>>(path: P) -> ChartConfig {
    let path = path.as_ref();
    match try_load(path) {
        Some(config) => {
            println!(
                "Reading {} days and {} band period from {}",
                config.days,
                config.band_window,
                path.display()
            );
            config
        }
        None => {
            let config = ChartConfig::default();
            println!(
                "Could not read {}, using defaults: {} days, {} band period",
                path.display(),
                config.days,
                config.band_window
            );
            config
        }
    }
}

fn try_load(path: &Path) -> Option<ChartConfig> {
    let contents = std::fs::read_to_string(path).ok()?;
    let mut lines = contents.trim().lines();

    let days = lines.next()?.trim().parse().ok()?;

    // A file with only the day count keeps the default band window.
    let band_window: usize = match lines.next() {
        Some(line) => line.trim().parse().ok()?,
        None => DEFAULT_BAND_WINDOW,
    };
    if band_window == 0 {
        return None;
    }

    Some(ChartConfig { days, band_window })
}
