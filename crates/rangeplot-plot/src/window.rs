use std::collections::VecDeque;

use rangeplot_frame::{Channel, Sample, CHANNELS};

use crate::error::{PlotError, Result};

/// Fixed-capacity FIFO of the most recent samples of one channel.
///
/// Starts full of zeros, so its length is always exactly its capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    values: VecDeque<u16>,
    capacity: usize,
}

impl Window {
    /// Create a window of `capacity` zeros.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(PlotError::InvalidWindowLength(capacity));
        }
        let mut values = VecDeque::with_capacity(capacity);
        values.resize(capacity, 0);
        Ok(Self { values, capacity })
    }

    /// Append `value`, evicting the oldest sample.
    pub fn push(&mut self, value: u16) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// Contents oldest-to-newest.
    pub fn snapshot(&self) -> Vec<u16> {
        self.values.iter().copied().collect()
    }

    /// Most recent sample.
    pub fn latest(&self) -> u16 {
        self.values.back().copied().unwrap_or_default()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Always equal to [`Window::capacity`].
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One [`Window`] per channel, all with the same capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSet {
    windows: [Window; 3],
}

impl WindowSet {
    pub fn new(capacity: usize) -> Result<Self> {
        let window = Window::new(capacity)?;
        Ok(Self {
            windows: [window.clone(), window.clone(), window],
        })
    }

    pub fn push(&mut self, channel: Channel, value: u16) {
        self.windows[channel.index()].push(value);
    }

    /// Push every channel of `sample`.
    pub fn push_sample(&mut self, sample: &Sample) {
        for channel in CHANNELS {
            self.push(channel, sample.get(channel));
        }
    }

    pub fn snapshot(&self, channel: Channel) -> Vec<u16> {
        self.windows[channel.index()].snapshot()
    }

    pub fn window(&self, channel: Channel) -> &Window {
        &self.windows[channel.index()]
    }

    pub fn capacity(&self) -> usize {
        self.windows[0].capacity()
    }
}
