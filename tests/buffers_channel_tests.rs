use sensor_ingest::buffers::{ChannelBuffer, ChannelBuffers};
use sensor_ingest::core::{Channel, SensorFrame};

#[test]
fn test_overflow_evicts_oldest() {
    let capacity = 100;
    let buffer = ChannelBuffer::new(capacity);

    for i in 1..=capacity + 1 {
        buffer.push(i);
    }

    let snapshot = buffer.snapshot();
    assert_eq!(snapshot.len(), capacity);
    assert_eq!(snapshot, (2..=capacity + 1).collect::<Vec<_>>());
}

#[test]
fn test_snapshot_is_a_copy() {
    let buffer = ChannelBuffer::new(3);
    buffer.push(1);
    let snapshot = buffer.snapshot();
    buffer.push(2);

    assert_eq!(snapshot, vec![1]);
    assert_eq!(buffer.len(), 2);
    assert_eq!(buffer.latest(), Some(2));
}

#[test]
fn test_concurrent_snapshots_never_torn() {
    use std::thread;

    let buffer: ChannelBuffer<[i16; 8]> = ChannelBuffer::new(16);
    let reader = buffer.clone();

    let writer = thread::spawn(move || {
        for i in 0..5_000i32 {
            buffer.push([(i % i16::MAX as i32) as i16; 8]);
        }
    });

    let mut checks = 0;
    while !writer.is_finished() || checks == 0 {
        let snapshot = reader.snapshot();
        assert!(snapshot.len() <= 16);
        for sample in &snapshot {
            assert!(sample.iter().all(|v| *v == sample[0]));
        }
        for pair in snapshot.windows(2) {
            assert_eq!(pair[1][0], pair[0][0] + 1);
        }
        checks += 1;
    }
    writer.join().unwrap();
    assert_eq!(reader.len(), 16);
}

#[test]
fn test_channel_buffers_split_frame() {
    let buffers = ChannelBuffers::new(2);
    for seq in 0..3i16 {
        buffers.push_frame(&SensorFrame::new(seq as u64, [seq; 8], [seq, 0, 0], [0, 0, seq]));
    }

    assert_eq!(buffers.adc.snapshot(), vec![[1; 8], [2; 8]]);
    assert_eq!(buffers.snapshot(Channel::Accel), vec![vec![1, 0, 0], vec![2, 0, 0]]);
    assert_eq!(buffers.snapshot(Channel::Gyro), vec![vec![0, 0, 1], vec![0, 0, 2]]);
    assert_eq!(buffers.capacity(), 2);
}
