use super::PositionFilter;
use std::collections::VecDeque;

/// Moving average filter
pub struct MovingAverageFilter {
    window_size: usize,
    buffer: VecDeque<f64>,
}

impl MovingAverageFilter {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            buffer: VecDeque::with_capacity(window_size),
        }
    }
}

impl PositionFilter for MovingAverageFilter {
    fn update(&mut self, value: f64) -> f64 {
        if self.buffer.len() >= self.window_size {
            self.buffer.pop_front();
        }
        self.buffer.push_back(value);

        self.buffer.iter().sum::<f64>() / self.buffer.len() as f64
    }

    fn reset(&mut self) {
        self.buffer.clear();
    }

    fn name(&self) -> &str {
        "MovingAverageFilter"
    }
}
