use serde::{Deserialize, Serialize};
use std::fmt;

pub const ADC_CHANNELS: usize = 8;
pub const AXES: usize = 3;

/// Number of numeric fields in one flattened frame (adc + accel + gyro)
pub const FRAME_FIELDS: usize = ADC_CHANNELS + 2 * AXES;

/// Labels for the datagram fields, in wire order
pub const FIELD_LABELS: [&str; FRAME_FIELDS + 1] = [
    "Counter", "ADC1", "ADC2", "ADC3", "ADC4", "ADC5", "ADC6", "ADC7", "ADC8",
    "Ax", "Ay", "Az", "Gx", "Gy", "Gz",
];

pub type AdcSample = [i16; ADC_CHANNELS];
pub type AxisSample = [i16; AXES];

/// One complete sampling instant across all three channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorFrame {
    /// Device counter (UDP) or local read index (BLE)
    #[serde(rename = "counter")]
    pub sequence: u64,
    pub adc: AdcSample,
    #[serde(rename = "acceleration")]
    pub accel: AxisSample,
    #[serde(rename = "rotation")]
    pub gyro: AxisSample,
}

impl SensorFrame {
    pub fn new(sequence: u64, adc: AdcSample, accel: AxisSample, gyro: AxisSample) -> Self {
        Self {
            sequence,
            adc,
            accel,
            gyro,
        }
    }

    /// Flatten into adc[0..8], accel[0..3], gyro[0..3]
    pub fn fields(&self) -> [i16; FRAME_FIELDS] {
        let mut out = [0i16; FRAME_FIELDS];
        out[..ADC_CHANNELS].copy_from_slice(&self.adc);
        out[ADC_CHANNELS..ADC_CHANNELS + AXES].copy_from_slice(&self.accel);
        out[ADC_CHANNELS + AXES..].copy_from_slice(&self.gyro);
        out
    }

    /// Counter and every field paired with its display label, in wire order
    pub fn labelled(&self) -> [(&'static str, i64); FRAME_FIELDS + 1] {
        let mut out = [("", 0i64); FRAME_FIELDS + 1];
        out[0] = (FIELD_LABELS[0], self.sequence as i64);
        for (i, value) in self.fields().into_iter().enumerate() {
            out[i + 1] = (FIELD_LABELS[i + 1], i64::from(value));
        }
        out
    }

    /// Rebuild a frame from its flattened fields
    pub fn from_fields(sequence: u64, fields: &[i16; FRAME_FIELDS]) -> Self {
        let mut adc = [0i16; ADC_CHANNELS];
        let mut accel = [0i16; AXES];
        let mut gyro = [0i16; AXES];
        adc.copy_from_slice(&fields[..ADC_CHANNELS]);
        accel.copy_from_slice(&fields[ADC_CHANNELS..ADC_CHANNELS + AXES]);
        gyro.copy_from_slice(&fields[ADC_CHANNELS + AXES..]);
        Self::new(sequence, adc, accel, gyro)
    }
}

/// Logical telemetry channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Adc,
    Accel,
    Gyro,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Adc, Channel::Accel, Channel::Gyro];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Adc => "adc",
            Self::Accel => "accel",
            Self::Gyro => "gyro",
        }
    }

    /// Number of i16 values per sample on this channel
    pub fn width(&self) -> usize {
        match self {
            Self::Adc => ADC_CHANNELS,
            Self::Accel | Self::Gyro => AXES,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Undecoded payload as produced by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawFrame {
    /// Three independent characteristic reads
    Gatt {
        read_index: u64,
        adc: Vec<u8>,
        accel: Vec<u8>,
        gyro: Vec<u8>,
    },
    /// One text datagram carrying every channel
    Datagram(Vec<u8>),
}

impl RawFrame {
    pub fn layout(&self) -> FrameLayout {
        match self {
            Self::Gatt { .. } => FrameLayout::Binary,
            Self::Datagram(_) => FrameLayout::Text,
        }
    }
}

/// Wire encoding expected by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameLayout {
    /// Little-endian i16 characteristic payloads
    Binary,
    /// Comma-delimited text datagram
    Text,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_order() {
        let frame = SensorFrame::new(3, [1, 2, 3, 4, 5, 6, 7, 8], [9, 10, 11], [12, 13, 14]);
        let fields = frame.fields();
        assert_eq!(fields, [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14]);
        assert_eq!(SensorFrame::from_fields(3, &fields), frame);
    }

    #[test]
    fn test_labelled_values() {
        let frame = SensorFrame::new(7, [1, 2, 3, 4, 5, 6, 7, 8], [9, 10, 11], [12, 13, -14]);
        let labelled = frame.labelled();
        assert_eq!(labelled[0], ("Counter", 7));
        assert_eq!(labelled[8], ("ADC8", 8));
        assert_eq!(labelled[9], ("Ax", 9));
        assert_eq!(labelled[14], ("Gz", -14));
    }

    #[test]
    fn test_serialized_names_match_event_payload() {
        let frame = SensorFrame::new(1, [0; 8], [1, 2, 3], [4, 5, 6]);
        let json = serde_json::to_value(frame).unwrap();
        assert_eq!(json["counter"], 1);
        assert_eq!(json["acceleration"][2], 3);
        assert_eq!(json["rotation"][0], 4);
    }
}
