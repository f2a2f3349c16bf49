//! Trailing moving averages over a single series
//!
//! Both smoothers consume one value at a time with O(window) state at most,
//! so the slice helpers below are single-pass and re-entrant.

use crate::types::{finite, MaKind, Point};
use std::collections::VecDeque;

/// Streaming moving-average state
pub trait Smoother {
    /// Feed the next input and return the smoothed value at that position
    fn push(&mut self, value: Option<f64>) -> Option<f64>;
}

/// Simple moving average over the last `window` positions.
///
/// The mean is taken over the finite values present in the window, so gaps do
/// not pull the average towards zero. Output stays absent until `window`
/// positions have been seen.
#[derive(Debug, Clone)]
pub struct RollingMean {
    window: usize,
    buf: VecDeque<Option<f64>>,
    sum: f64,
    count: usize,
}

impl RollingMean {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            buf: VecDeque::with_capacity(window + 1),
            sum: 0.0,
            count: 0,
        }
    }
}

impl Smoother for RollingMean {
    fn push(&mut self, value: Option<f64>) -> Option<f64> {
        if self.window == 0 {
            return None;
        }

        let value = finite(value);
        self.buf.push_back(value);
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }

        if self.buf.len() > self.window {
            if let Some(Some(old)) = self.buf.pop_front() {
                self.sum -= old;
                self.count -= 1;
            }
        }

        // Drop accumulated rounding error once the window holds no values
        if self.count == 0 {
            self.sum = 0.0;
        }

        if self.buf.len() < self.window || self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// Exponential moving average with `alpha = 2 / (window + 1)`.
///
/// Seeded by the first finite value. Absent inputs leave the state untouched
/// and the previous average is reported again.
#[derive(Debug, Clone)]
pub struct ExpMean {
    alpha: f64,
    prev: Option<f64>,
    enabled: bool,
}

impl ExpMean {
    pub fn new(window: usize) -> Self {
        Self {
            alpha: 2.0 / (window as f64 + 1.0),
            prev: None,
            enabled: window > 0,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl Smoother for ExpMean {
    fn push(&mut self, value: Option<f64>) -> Option<f64> {
        if !self.enabled {
            return None;
        }
        if let Some(v) = finite(value) {
            self.prev = Some(match self.prev {
                None => v,
                Some(prev) => self.alpha * v + (1.0 - self.alpha) * prev,
            });
        }
        self.prev
    }
}

fn run<S: Smoother>(mut state: S, series: &[Point]) -> Vec<Point> {
    series
        .iter()
        .map(|p| Point {
            t: p.t.clone(),
            v: state.push(p.v),
        })
        .collect()
}

pub fn sma(series: &[Point], window: usize) -> Vec<Point> {
    run(RollingMean::new(window), series)
}

pub fn ema(series: &[Point], window: usize) -> Vec<Point> {
    run(ExpMean::new(window), series)
}

/// One output point per input point, same timestamps, same order
pub fn smooth(kind: MaKind, series: &[Point], window: usize) -> Vec<Point> {
    match kind {
        MaKind::Sma => sma(series, window),
        MaKind::Ema => ema(series, window),
    }
}
