use sensor_ingest::core::{decode, decode_gatt, decode_text, payload_len, Channel, FrameLayout, RawFrame};
use sensor_ingest::hal::mock::encode_le;
use sensor_ingest::DecodeError;

#[test]
fn test_gatt_triple_matches_little_endian() {
    let cases: [([i16; 8], [i16; 3], [i16; 3]); 3] = [
        ([0, 0, 0, 0, 0, 0, 0, 100], [1, 2, 3], [4, 5, 6]),
        ([i16::MIN, -1, 0, 1, i16::MAX, 256, -256, 4095], [-32000, 0, 32000], [7, -7, 0]),
        ([0x1234; 8], [0x00ff, -0x0100, 0x7f00], [0; 3]),
    ];

    for (index, (adc, accel, gyro)) in cases.iter().enumerate() {
        let frame = decode_gatt(
            index as u64,
            &encode_le(adc),
            &encode_le(accel),
            &encode_le(gyro),
        )
        .unwrap();

        assert_eq!(frame.sequence, index as u64);
        assert_eq!(&frame.adc, adc);
        assert_eq!(&frame.accel, accel);
        assert_eq!(&frame.gyro, gyro);
        assert_eq!(frame.fields().len(), 14);
    }
}

#[test]
fn test_gatt_explicit_bytes() {
    // 0x0064 = 100 little-endian in the last ADC slot
    let mut adc = vec![0u8; 16];
    adc[14] = 0x64;
    let frame = decode_gatt(0, &adc, &[1, 0, 2, 0, 3, 0], &[4, 0, 5, 0, 0xff, 0xff]).unwrap();

    assert_eq!(frame.adc, [0, 0, 0, 0, 0, 0, 0, 100]);
    assert_eq!(frame.accel, [1, 2, 3]);
    assert_eq!(frame.gyro, [4, 5, -1]);
}

#[test]
fn test_gatt_wrong_length_rejected() {
    let short_adc = encode_le(&[1; 7]);
    let result = decode_gatt(0, &short_adc, &encode_le(&[0; 3]), &encode_le(&[0; 3]));
    assert!(matches!(
        result,
        Err(DecodeError::MalformedLength { expected: 16, actual: 14, .. })
    ));

    // Odd byte count on gyro
    let result = decode_gatt(0, &encode_le(&[0; 8]), &encode_le(&[0; 3]), &[0; 7]);
    assert!(matches!(result, Err(DecodeError::MalformedLength { .. })));

    // Extra samples are not truncated away
    let result = decode_gatt(0, &encode_le(&[0; 8]), &encode_le(&[0; 4]), &encode_le(&[0; 3]));
    assert!(matches!(result, Err(DecodeError::MalformedLength { .. })));
}

#[test]
fn test_datagram_scenario() {
    let raw = RawFrame::Datagram(b"7,1,2,3,4,5,6,7,8,9,10,11,12,13,14".to_vec());
    let frame = decode(&raw, FrameLayout::Text).unwrap();

    assert_eq!(frame.sequence, 7);
    assert_eq!(frame.adc, [1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(frame.accel, [9, 10, 11]);
    assert_eq!(frame.gyro, [12, 13, 14]);
}

#[test]
fn test_datagram_short_is_malformed_length() {
    for text in ["", "1", "7,1,2,3,4,5,6,7,8,9,10,11,12,13"] {
        match decode_text(text) {
            Err(DecodeError::MalformedLength { expected, .. }) => assert_eq!(expected, 15),
            other => panic!("{:?} decoded to {:?}", text, other),
        }
    }
}

#[test]
fn test_datagram_non_numeric_is_malformed_value() {
    let result = decode_text("7,1,2,3,x,5,6,7,8,9,10,11,12,13,14");
    assert!(matches!(result, Err(DecodeError::MalformedValue { index: 4, .. })));

    // Out of i16 range
    let result = decode_text("7,1,2,3,4,5,6,7,8,9,10,11,12,13,40000");
    assert!(matches!(result, Err(DecodeError::MalformedValue { index: 14, .. })));

    let result = decode(&RawFrame::Datagram(vec![0xff, 0xfe]), FrameLayout::Text);
    assert!(matches!(result, Err(DecodeError::MalformedValue { .. })));
}

#[test]
fn test_datagram_extra_fields_ignored() {
    let frame = decode_text("1,1,2,3,4,5,6,7,8,9,10,11,12,13,14,99,temp=21").unwrap();
    assert_eq!(frame.gyro, [12, 13, 14]);
}

#[test]
fn test_payload_sizes() {
    assert_eq!(payload_len(Channel::Adc), 16);
    assert_eq!(payload_len(Channel::Accel), 6);
    assert_eq!(payload_len(Channel::Gyro), 6);
}
