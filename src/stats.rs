use std::collections::VecDeque;

/// Mean over the last `window` values pushed.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    window: usize,
    total: f64,
    vals: VecDeque<f64>,
}

impl MovingAverage {
    /// A window of 0 is treated as 1.
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        MovingAverage { window, total: 0.0, vals: VecDeque::with_capacity(window) }
    }

    pub fn push(&mut self, val: f64) {
        if self.vals.len() == self.window {
            if let Some(old) = self.vals.pop_front() {
                self.total -= old;
            }
        }
        self.vals.push_back(val);
        self.total += val;
    }

    pub fn mean(&self) -> Option<f64> {
        if self.vals.is_empty() {
            None
        } else {
            Some(self.total / self.vals.len() as f64)
        }
    }

    pub fn len(&self) -> usize { self.vals.len() }

    pub fn is_empty(&self) -> bool { self.vals.is_empty() }

    pub fn window(&self) -> usize { self.window }
}
