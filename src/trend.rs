//! Trend filter - fast vs slow exponential moving average
//!
//! Smoothing factor: alpha = 2 / (span + 1), folded over every bar in the
//! window. Two weightings are supported:
//! - `Adjusted`: bias-corrected weighted mean, sum((1-a)^i * x[t-i]) / sum((1-a)^i)
//! - `Recursive`: EMA[0] = x[0], EMA[t] = a * x[t] + (1 - a) * EMA[t-1]

use serde::{Deserialize, Serialize};

use crate::error::{BotError, Result};
use crate::types::BarWindow;

/// Market direction derived from the EMA pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendState {
    Up,
    Down,
    Neutral,
}

impl std::fmt::Display for TrendState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendState::Up => write!(f, "up"),
            TrendState::Down => write!(f, "down"),
            TrendState::Neutral => write!(f, "neutral"),
        }
    }
}

/// EMA weighting convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmaWeighting {
    #[default]
    Adjusted,
    Recursive,
}

/// EMA of `values` evaluated at the last element.
///
/// Returns `None` for an empty slice or a zero span.
pub fn ema_last(values: &[f64], span: usize, weighting: EmaWeighting) -> Option<f64> {
    if span == 0 {
        return None;
    }
    let (first, rest) = values.split_first()?;

    let alpha = 2.0 / (span as f64 + 1.0);
    let decay = 1.0 - alpha;
    let new_weight = match weighting {
        EmaWeighting::Adjusted => 1.0,
        EmaWeighting::Recursive => alpha,
    };

    let mut avg = *first;
    let mut old_weight = 1.0;
    for &x in rest {
        old_weight *= decay;
        avg = (old_weight * avg + new_weight * x) / (old_weight + new_weight);
        match weighting {
            EmaWeighting::Adjusted => old_weight += new_weight,
            EmaWeighting::Recursive => old_weight = 1.0,
        }
    }

    Some(avg)
}

/// Classifies direction from a fast/slow EMA pair
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendClassifier;

impl TrendClassifier {
    pub fn classify(&self, fast: f64, slow: f64) -> TrendState {
        if fast > slow {
            TrendState::Up
        } else if fast < slow {
            TrendState::Down
        } else {
            TrendState::Neutral
        }
    }
}

/// EMA values and the resulting state for one cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendReading {
    pub fast_ema: f64,
    pub slow_ema: f64,
    pub state: TrendState,
}

/// Fast EMA on the lower timeframe against slow EMA on the higher one
#[derive(Debug, Clone, Copy)]
pub struct TrendFilter {
    pub fast_span: usize,
    pub slow_span: usize,
    pub weighting: EmaWeighting,
}

impl Default for TrendFilter {
    fn default() -> Self {
        Self {
            fast_span: 10,
            slow_span: 20,
            weighting: EmaWeighting::Adjusted,
        }
    }
}

impl TrendFilter {
    pub fn evaluate(&self, fast_window: &BarWindow, slow_window: &BarWindow) -> Result<TrendReading> {
        let fast_ema = self.ema(fast_window, self.fast_span)?;
        let slow_ema = self.ema(slow_window, self.slow_span)?;

        Ok(TrendReading {
            fast_ema,
            slow_ema,
            state: TrendClassifier.classify(fast_ema, slow_ema),
        })
    }

    fn ema(&self, window: &BarWindow, span: usize) -> Result<f64> {
        if span == 0 {
            return Err(BotError::InvalidConfiguration(
                "EMA span must be at least 1".to_string(),
            ));
        }
        ema_last(&window.closes(), span, self.weighting)
            .ok_or_else(|| BotError::insufficient(window.timeframe(), 1, window.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Bar, TimeFrame};
    use chrono::{TimeZone, Utc};

    fn closes_window(timeframe: TimeFrame, closes: &[f64]) -> BarWindow {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let ts = Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap()
                    + chrono::Duration::seconds(timeframe.to_seconds() * i as i64);
                Bar::ohlc(ts, c, c, c, c)
            })
            .collect();
        BarWindow::new(timeframe, bars)
    }

    #[test]
    fn test_classify() {
        assert_eq!(TrendClassifier.classify(1995.0, 1985.0), TrendState::Up);
        assert_eq!(TrendClassifier.classify(1985.0, 1995.0), TrendState::Down);
        assert_eq!(TrendClassifier.classify(1990.0, 1990.0), TrendState::Neutral);
    }

    #[test]
    fn test_ema_single_value() {
        assert_eq!(ema_last(&[42.0], 10, EmaWeighting::Adjusted), Some(42.0));
        assert_eq!(ema_last(&[42.0], 10, EmaWeighting::Recursive), Some(42.0));
        assert_eq!(ema_last(&[], 10, EmaWeighting::Adjusted), None);
        assert_eq!(ema_last(&[1.0, 2.0], 0, EmaWeighting::Adjusted), None);
    }

    #[test]
    fn test_recursive_ema_two_values() {
        // span 3 -> alpha 0.5
        let ema = ema_last(&[10.0, 20.0], 3, EmaWeighting::Recursive).unwrap();
        assert!((ema - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_adjusted_ema_two_values() {
        // span 3 -> alpha 0.5, weights 0.5 and 1: (0.5*10 + 20) / 1.5
        let ema = ema_last(&[10.0, 20.0], 3, EmaWeighting::Adjusted).unwrap();
        assert!((ema - 50.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_adjusted_ema_matches_closed_form() {
        let values = [1990.0, 1992.5, 1988.0, 1995.0, 2001.0, 1999.5, 2003.0];
        let span = 10;
        let decay = 1.0 - 2.0 / (span as f64 + 1.0);

        let n = values.len();
        let (mut num, mut den) = (0.0, 0.0);
        for (i, v) in values.iter().enumerate() {
            let w = decay.powi((n - 1 - i) as i32);
            num += w * v;
            den += w;
        }

        let ema = ema_last(&values, span, EmaWeighting::Adjusted).unwrap();
        assert!((ema - num / den).abs() < 1e-9);
    }

    #[test]
    fn test_recursive_ema_matches_closed_form() {
        // y_n = (1-a)^n * x_0 + sum a * (1-a)^(n-i) * x_i
        let values = [1990.0, 1992.5, 1988.0, 1995.0, 2001.0, 1999.5, 2003.0];
        let span = 10;
        let alpha = 2.0 / (span as f64 + 1.0);
        let decay = 1.0 - alpha;

        let n = values.len() - 1;
        let mut expected = decay.powi(n as i32) * values[0];
        for (i, v) in values.iter().enumerate().skip(1) {
            expected += alpha * decay.powi((n - i) as i32) * v;
        }

        let ema = ema_last(&values, span, EmaWeighting::Recursive).unwrap();
        assert!((ema - expected).abs() < 1e-9);

        let adjusted = ema_last(&values, span, EmaWeighting::Adjusted).unwrap();
        assert!((ema - adjusted).abs() > 1e-6);
    }

    #[test]
    fn test_weighting_can_flip_trend() {
        let fast = closes_window(TimeFrame::M5, &[2000.0, 1900.0]);
        let slow = closes_window(TimeFrame::M15, &[1960.0, 1960.0]);

        let adjusted = TrendFilter::default().evaluate(&fast, &slow).unwrap();
        let recursive = TrendFilter {
            weighting: EmaWeighting::Recursive,
            ..Default::default()
        }
        .evaluate(&fast, &slow)
        .unwrap();

        assert_eq!(adjusted.state, TrendState::Down);
        assert_eq!(recursive.state, TrendState::Up);
    }

    #[test]
    fn test_ema_uses_whole_history() {
        let long = [100.0, 100.0, 100.0, 100.0, 200.0, 200.0];
        let short = [200.0, 200.0];
        let a = ema_last(&long, 10, EmaWeighting::Adjusted).unwrap();
        let b = ema_last(&short, 10, EmaWeighting::Adjusted).unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_filter_uptrend() {
        let fast = closes_window(TimeFrame::M5, &[1990.0, 1993.0, 1996.0, 1999.0]);
        let slow = closes_window(TimeFrame::M15, &[1980.0, 1982.0, 1985.0]);
        let reading = TrendFilter::default().evaluate(&fast, &slow).unwrap();

        assert!(reading.fast_ema > reading.slow_ema);
        assert_eq!(reading.state, TrendState::Up);
    }

    #[test]
    fn test_filter_flat_is_neutral() {
        let fast = closes_window(TimeFrame::M5, &[1990.0]);
        let slow = closes_window(TimeFrame::M15, &[1990.0]);
        let reading = TrendFilter::default().evaluate(&fast, &slow).unwrap();
        assert_eq!(reading.state, TrendState::Neutral);
    }

    #[test]
    fn test_filter_empty_window() {
        let fast = closes_window(TimeFrame::M5, &[]);
        let slow = closes_window(TimeFrame::M15, &[1990.0]);
        assert!(matches!(
            TrendFilter::default().evaluate(&fast, &slow),
            Err(BotError::InsufficientData { timeframe: TimeFrame::M5, .. })
        ));
    }
}
