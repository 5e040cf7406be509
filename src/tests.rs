//! Cross-module scenario tests

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use crate::levels::{FibonacciCalculator, PivotCalculator};
use crate::signal::{SignalDecision, SignalEngine, SignalInputs, TradeSide};
use crate::trend::{TrendClassifier, TrendState};
use crate::types::{Bar, BarWindow, TimeFrame};

fn window(timeframe: TimeFrame, hlc: &[(f64, f64, f64)]) -> BarWindow {
    let start = Utc.with_ymd_and_hms(2025, 3, 3, 8, 0, 0).unwrap();
    let bars = hlc
        .iter()
        .enumerate()
        .map(|(i, &(h, l, c))| {
            let ts = start + Duration::seconds(timeframe.to_seconds() * i as i64);
            Bar::ohlc(ts, c, h, l, c)
        })
        .collect();
    BarWindow::new(timeframe, bars)
}

#[test]
fn test_pivot_scenario() {
    let slow = window(
        TimeFrame::M15,
        &[(1995.0, 1970.0, 1985.0), (2000.0, 1980.0, 1990.0), (1991.0, 1989.0, 1990.5)],
    );
    let pivots = PivotCalculator.calculate(&slow).unwrap();

    assert_eq!(pivots.p, 1990.0);
    assert_eq!(pivots.s3, 1960.0);
    assert_eq!(pivots.r3, 2020.0);
}

#[test]
fn test_fibonacci_scenario() {
    let fast = window(
        TimeFrame::M5,
        &[(1980.0, 1950.0, 1960.0), (2000.0, 1940.0, 1990.0), (1960.0, 1900.0, 1935.0)],
    );
    let fib = FibonacciCalculator.calculate(&fast).unwrap();

    assert_eq!(fib.get("0%"), Some(2000.0));
    assert_eq!(fib.get("100%"), Some(1900.0));
    assert!((fib.level_618() - 1938.2).abs() < 1e-9);
}

#[test]
fn test_buy_then_repeat_suppressed() {
    let slow = window(TimeFrame::M15, &[(2000.0, 1980.0, 1990.0), (1990.0, 1985.0, 1987.0)]);
    let fast = window(
        TimeFrame::M5,
        &[(2000.0, 1950.0, 1990.0), (1960.0, 1900.0, 1935.0)],
    );
    let pivots = PivotCalculator.calculate(&slow).unwrap();
    let fib = FibonacciCalculator.calculate(&fast).unwrap();
    let trend = TrendClassifier.classify(1995.0, 1985.0);
    assert_eq!(trend, TrendState::Up);

    let price = fast.latest().unwrap().close;
    let inputs = SignalInputs {
        price,
        pivots: &pivots,
        fib: &fib,
        trend,
    };

    let mut engine = SignalEngine::new();
    assert_eq!(engine.evaluate(&inputs).decision, SignalDecision::Buy);
    assert_eq!(engine.last_action(), Some(TradeSide::Buy));

    assert_eq!(engine.evaluate(&inputs).decision, SignalDecision::None);
    assert_eq!(engine.last_action(), Some(TradeSide::Buy));
}

#[test]
fn test_calculators_are_pure() {
    let slow = window(TimeFrame::M15, &[(2010.0, 1975.0, 2001.0), (2000.0, 1980.0, 1990.0), (1995.0, 1990.0, 1992.0)]);
    assert_eq!(
        PivotCalculator.calculate(&slow).unwrap(),
        PivotCalculator.calculate(&slow).unwrap()
    );
    assert_eq!(
        FibonacciCalculator.calculate(&slow).unwrap(),
        FibonacciCalculator.calculate(&slow).unwrap()
    );
}

proptest! {
    #[test]
    fn prop_pivot_fan_out(low in 1.0f64..10_000.0, range in 0.0f64..500.0, close_frac in 0.0f64..=1.0) {
        let high = low + range;
        let close = low + close_frac * range;
        let levels = PivotCalculator::from_hlc(high, low, close);
        let eps = 1e-9 * high;

        prop_assert!(levels.r5 + eps >= levels.r4);
        prop_assert!(levels.r4 + eps >= levels.r3);
        prop_assert!(levels.r3 + eps >= levels.p);
        prop_assert!(levels.p + eps >= levels.s3);
        prop_assert!(levels.s3 + eps >= levels.s4);
        prop_assert!(levels.s4 + eps >= levels.s5);
    }

    #[test]
    fn prop_fib_extremes_exact(low in 1.0f64..10_000.0, range in 0.0f64..500.0) {
        let high = low + range;
        let fib = FibonacciCalculator::from_range(high, low);

        prop_assert_eq!(fib.level_0(), high);
        prop_assert_eq!(fib.level_100(), low);
        for (_, price) in fib.named() {
            prop_assert!(price <= high && price >= low);
        }
    }

    #[test]
    fn prop_never_repeats_direction(prices in proptest::collection::vec(1900.0f64..2100.0, 1..40),
                                    ups in proptest::collection::vec(any::<bool>(), 40)) {
        let pivots = PivotCalculator::from_hlc(2000.0, 1980.0, 1990.0);
        let fib = FibonacciCalculator::from_range(2000.0, 1900.0);
        let mut engine = SignalEngine::new();
        let mut last: Option<TradeSide> = None;

        for (price, up) in prices.iter().zip(ups.iter()) {
            let inputs = SignalInputs {
                price: *price,
                pivots: &pivots,
                fib: &fib,
                trend: if *up { TrendState::Up } else { TrendState::Down },
            };
            if let Some(side) = engine.evaluate(&inputs).decision.side() {
                prop_assert_ne!(Some(side), last);
                last = Some(side);
            }
        }
    }
}
