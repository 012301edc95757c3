use super::PositionFilter;

/// Exponential smoothing filter
pub struct ExponentialFilter {
    alpha: f64,
    last: Option<f64>,
}

impl ExponentialFilter {
    pub fn new(alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "Alpha must be in (0, 1]");
        Self { alpha, last: None }
    }
}

impl PositionFilter for ExponentialFilter {
    fn update(&mut self, value: f64) -> f64 {
        let filtered = match self.last {
            Some(last) => self.alpha * value + (1.0 - self.alpha) * last,
            None => value,
        };
        self.last = Some(filtered);
        filtered
    }

    fn reset(&mut self) {
        self.last = None;
    }

    fn name(&self) -> &str {
        "ExponentialFilter"
    }
}
