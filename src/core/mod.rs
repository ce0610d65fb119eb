pub mod decoder;
pub mod frame;

pub use decoder::{
    decode, decode_datagram, decode_gatt, decode_text, payload_len, MIN_DATAGRAM_FIELDS,
};
pub use frame::{
    AdcSample, AxisSample, Channel, FrameLayout, RawFrame, SensorFrame, ADC_CHANNELS, AXES,
    FIELD_LABELS, FRAME_FIELDS,
};
