//! Sensor channels carried by every frame.

use std::fmt;

/// One of the three measurement series in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Time-of-flight distance.
    Lidar,
    /// Ultrasonic distance.
    Ultrasonic,
    /// Kalman-filtered fusion of the other two.
    Kalman,
}

/// All channels in wire order.
pub const CHANNELS: [Channel; 3] = [Channel::Lidar, Channel::Ultrasonic, Channel::Kalman];

impl Channel {
    /// Position of this channel in the frame and in per-channel arrays.
    pub fn index(self) -> usize {
        match self {
            Channel::Lidar => 0,
            Channel::Ultrasonic => 1,
            Channel::Kalman => 2,
        }
    }

    /// Channel at `index`, if any.
    pub fn from_index(index: usize) -> Option<Self> {
        CHANNELS.get(index).copied()
    }

    /// Offset of the low nibble byte within the payload.
    pub fn payload_offset(self) -> usize {
        self.index() * 2
    }

    /// Short lowercase name used in logs and output.
    pub fn name(self) -> &'static str {
        match self {
            Channel::Lidar => "lidar",
            Channel::Ultrasonic => "ultra",
            Channel::Kalman => "kalman",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
