use std::ops::{Add, Div};

/// Moving average over the last `samples` values.
#[derive(Clone, Debug)]
pub struct Smoother<T> {
    history: Vec<T>,
    next: usize,
    zero: T,
}

impl<T> Smoother<T>
where
    T: Copy + Add<Output = T> + Div<f64, Output = T>,
{
    /// The history starts filled with `zero`, so early averages are damped.
    pub fn new(samples: usize, zero: T) -> Self {
        Self {
            history: vec![zero; samples.max(1)],
            next: 0,
            zero,
        }
    }

    /// Replaces the oldest sample with `recent` and returns the new average.
    pub fn update(&mut self, recent: T) -> T {
        self.history[self.next] = recent;
        self.next = (self.next + 1) % self.history.len();

        let sum = self.history.iter().fold(self.zero, |acc, &v| acc + v);
        sum / self.history.len() as f64
    }

    pub fn samples(&self) -> usize {
        self.history.len()
    }
}
