//! Derived per-series sequences: the volume trend classification and the
//! rolling volatility band width.

use crate::series::Series;

/// Close-over-close trend classification for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
}

/// Classifies each bar against the previous close, for coloring the
/// volume histogram. The first bar has no prior close and is always
/// `Up`; ties also count as `Up`.
pub fn volume_colors(series: &Series) -> Vec<Trend> {
    let mut colors = Vec::with_capacity(series.len());
    for (i, bar) in series.bars.iter().enumerate() {
        if i == 0 || bar.close >= series.bars[i - 1].close {
            colors.push(Trend::Up);
        } else {
            colors.push(Trend::Down);
        }
    }
    colors
}

/// Bollinger band width over the closes: upper minus lower band, where
/// the bands are mean ± `num_std` standard deviations over a trailing
/// `window`. Uses the sample standard deviation (ddof = 1, matching
/// pandas). The first `window - 1` entries carry no value.
pub fn band_width(closes: &[f64], window: usize, num_std: f64) -> Vec<Option<f64>> {
    let mut result = Vec::with_capacity(closes.len());
    for i in 0..closes.len() {
        if window == 0 || i + 1 < window {
            result.push(None);
            continue;
        }

        let slice = &closes[i + 1 - window..=i];
        let mean: f64 = slice.iter().sum::<f64>() / window as f64;
        // A one-bar window has no dispersion.
        let ddof = (window - 1).max(1) as f64;
        let variance: f64 = slice.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / ddof;
        let std_dev = variance.sqrt();

        let upper = mean + num_std * std_dev;
        let lower = mean - num_std * std_dev;
        result.push(Some(upper - lower));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Bar;
    use chrono::NaiveDate;

    fn series_from_closes(closes: &[f64]) -> Series {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000.0,
            })
            .collect();
        Series {
            symbol: "TEST".to_string(),
            bars,
        }
    }

    #[test]
    fn test_volume_colors_first_bar_is_up() {
        let series = series_from_closes(&[5.0]);
        assert_eq!(volume_colors(&series), vec![Trend::Up]);
    }

    #[test]
    fn test_volume_colors_follow_close_deltas() {
        let series = series_from_closes(&[5.0, 6.0, 4.0, 4.0, 3.9]);
        let colors = volume_colors(&series);
        assert_eq!(colors.len(), series.len());
        assert_eq!(
            colors,
            vec![Trend::Up, Trend::Up, Trend::Down, Trend::Up, Trend::Down]
        );
    }

    #[test]
    fn test_band_width_warmup_prefix_has_no_value() {
        let closes = [1.0, 2.0, 3.0, 4.0, 5.0];
        let widths = band_width(&closes, 3, 2.0);
        assert_eq!(widths.len(), closes.len());
        assert!(widths[0].is_none());
        assert!(widths[1].is_none());
        assert!(widths[2..].iter().all(|w| w.is_some()));
    }

    #[test]
    fn test_band_width_matches_hand_computation() {
        // Window [1, 2, 3]: mean 2, sample variance (1 + 0 + 1) / 2 = 1,
        // so width = 2 * 2 * 1 = 4.
        let closes = [1.0, 2.0, 3.0, 4.0, 5.0];
        let widths = band_width(&closes, 3, 2.0);
        assert!((widths[2].unwrap() - 4.0).abs() < 1e-12);
        assert!((widths[3].unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_band_width_constant_closes_is_zero() {
        let closes = [7.0; 10];
        let widths = band_width(&closes, 4, 2.0);
        assert!(widths[3..].iter().all(|w| w.unwrap() == 0.0));
    }

    #[test]
    fn test_band_width_is_never_negative() {
        let closes = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        for width in band_width(&closes, 3, 2.0).into_iter().flatten() {
            assert!(width >= 0.0);
        }
    }

    #[test]
    fn test_band_width_series_shorter_than_window_is_all_none() {
        let closes = [1.0, 2.0, 3.0];
        assert!(band_width(&closes, 7, 2.0).iter().all(|w| w.is_none()));
    }

    #[test]
    fn test_band_width_window_of_one_has_no_dispersion() {
        let closes = [1.0, 2.0, 3.0];
        let widths = band_width(&closes, 1, 2.0);
        assert!(widths.iter().all(|w| *w == Some(0.0)));
    }
}
