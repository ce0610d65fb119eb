use super::frame::{
    AdcSample, AxisSample, Channel, FrameLayout, RawFrame, SensorFrame, ADC_CHANNELS, AXES,
    FRAME_FIELDS,
};
use crate::error::DecodeError;

/// Fields required in a text datagram: counter + adc + accel + gyro
pub const MIN_DATAGRAM_FIELDS: usize = FRAME_FIELDS + 1;

/// Decode a raw transport payload into a frame.
///
/// All-or-nothing: any mis-sized channel or unparsable field rejects the
/// whole frame.
pub fn decode(raw: &RawFrame, layout: FrameLayout) -> Result<SensorFrame, DecodeError> {
    match (raw, layout) {
        (
            RawFrame::Gatt {
                read_index,
                adc,
                accel,
                gyro,
            },
            FrameLayout::Binary,
        ) => decode_gatt(*read_index, adc, accel, gyro),
        (RawFrame::Datagram(bytes), FrameLayout::Text) => decode_datagram(bytes),
        (raw, layout) => Err(DecodeError::MalformedValue {
            index: 0,
            detail: format!("{:?} payload cannot be decoded as {:?}", raw.layout(), layout),
        }),
    }
}

/// Decode the three characteristic payloads of one BLE poll cycle
pub fn decode_gatt(
    read_index: u64,
    adc: &[u8],
    accel: &[u8],
    gyro: &[u8],
) -> Result<SensorFrame, DecodeError> {
    let adc: AdcSample = decode_le_i16(Channel::Adc, adc)?;
    let accel: AxisSample = decode_le_i16(Channel::Accel, accel)?;
    let gyro: AxisSample = decode_le_i16(Channel::Gyro, gyro)?;
    Ok(SensorFrame::new(read_index, adc, accel, gyro))
}

fn decode_le_i16<const N: usize>(channel: Channel, bytes: &[u8]) -> Result<[i16; N], DecodeError> {
    if bytes.len() != N * 2 {
        return Err(DecodeError::channel_length(channel, N * 2, bytes.len()));
    }

    let mut out = [0i16; N];
    for (value, chunk) in out.iter_mut().zip(bytes.chunks_exact(2)) {
        *value = i16::from_le_bytes([chunk[0], chunk[1]]);
    }
    Ok(out)
}

/// Decode one comma-delimited datagram. Extra trailing fields are ignored.
pub fn decode_datagram(bytes: &[u8]) -> Result<SensorFrame, DecodeError> {
    let text = std::str::from_utf8(bytes).map_err(|e| DecodeError::MalformedValue {
        index: 0,
        detail: format!("datagram is not UTF-8: {}", e),
    })?;
    decode_text(text)
}

pub fn decode_text(text: &str) -> Result<SensorFrame, DecodeError> {
    let fields: Vec<&str> = text.trim().split(',').map(str::trim).collect();
    if fields.len() < MIN_DATAGRAM_FIELDS {
        return Err(DecodeError::MalformedLength {
            what: "datagram fields".to_string(),
            expected: MIN_DATAGRAM_FIELDS,
            actual: fields.len(),
        });
    }

    let sequence = fields[0]
        .parse::<u64>()
        .map_err(|e| DecodeError::MalformedValue {
            index: 0,
            detail: format!("counter {:?}: {}", fields[0], e),
        })?;

    let mut values = [0i16; FRAME_FIELDS];
    for (i, value) in values.iter_mut().enumerate() {
        let index = i + 1;
        let field = fields[index];
        *value = field.parse::<i16>().map_err(|e| DecodeError::MalformedValue {
            index,
            detail: format!("{:?}: {}", field, e),
        })?;
    }

    Ok(SensorFrame::from_fields(sequence, &values))
}

/// Byte length of a characteristic payload for the given channel
pub fn payload_len(channel: Channel) -> usize {
    match channel {
        Channel::Adc => ADC_CHANNELS * 2,
        Channel::Accel | Channel::Gyro => AXES * 2,
    }
}
