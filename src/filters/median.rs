use super::PositionFilter;
use std::collections::VecDeque;

/// Median filter
pub struct MedianFilter {
    window_size: usize,
    buffer: VecDeque<f64>,
}

impl MedianFilter {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            buffer: VecDeque::with_capacity(window_size),
        }
    }

    fn calculate_median(values: &VecDeque<f64>) -> f64 {
        let mut sorted: Vec<f64> = values.iter().copied().collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let len = sorted.len();
        if len == 0 {
            0.0
        } else if len % 2 == 0 {
            (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
        } else {
            sorted[len / 2]
        }
    }
}

impl PositionFilter for MedianFilter {
    fn update(&mut self, value: f64) -> f64 {
        if self.buffer.len() >= self.window_size {
            self.buffer.pop_front();
        }
        self.buffer.push_back(value);

        Self::calculate_median(&self.buffer)
    }

    fn reset(&mut self) {
        self.buffer.clear();
    }

    fn name(&self) -> &str {
        "MedianFilter"
    }
}
