//! Contract tests for `SpoolBuffer` over every shipped backend.

use spool_store::{SpillBackend, SpoolBuffer, SpoolError, StorageKind};

/// One buffer per backend flavor: plain memory, spill with the default
/// threshold, and spill with a threshold small enough that every test
/// crosses it.
fn open_all() -> Vec<SpoolBuffer> {
    vec![
        SpoolBuffer::open(StorageKind::Memory).unwrap(),
        SpoolBuffer::open(StorageKind::Spill).unwrap(),
        SpoolBuffer::with_backend(StorageKind::Spill, Box::new(SpillBackend::with_threshold(2))),
    ]
}

#[test]
fn test_round_trip_on_every_backend() {
    for mut buffer in open_all() {
        buffer.write_values(&[1, 2, 3, 4, 255]).unwrap();

        assert_eq!(buffer.read_values(2, 1).unwrap(), vec![2, 3]);
        assert_eq!(buffer.read(0, 0).unwrap(), vec![1, 2, 3, 4, 255]);
        assert_eq!(buffer.len().unwrap(), 5);
    }
}

#[test]
fn test_reads_do_not_disturb_appends() {
    for mut buffer in open_all() {
        buffer.write(b"abcd").unwrap();

        assert_eq!(buffer.byte_at(1).unwrap(), Some(b'b'));
        buffer.write(b"ef").unwrap();

        assert_eq!(buffer.read(0, 0).unwrap(), b"abcdef".to_vec());
    }
}

#[test]
fn test_read_past_end_is_empty_not_an_error() {
    for mut buffer in open_all() {
        buffer.write(b"abc").unwrap();

        assert_eq!(buffer.read(5, 3).unwrap(), Vec::<u8>::new());
        assert_eq!(buffer.read(0, 42).unwrap(), Vec::<u8>::new());
        assert_eq!(buffer.byte_at(42).unwrap(), None);
    }
}

#[test]
fn test_set_byte_zero_fills_gap_on_every_backend() {
    for mut buffer in open_all() {
        buffer.write(b"ab").unwrap();

        buffer.set_byte_at(4, 9).unwrap();

        assert_eq!(buffer.read(0, 0).unwrap(), vec![b'a', b'b', 0, 0, 9]);
    }
}

#[test]
fn test_rejects_non_byte_values() {
    for mut buffer in open_all() {
        assert!(matches!(
            buffer.write_values(&[10, 256]),
            Err(SpoolError::InvalidByte(256))
        ));
        assert!(matches!(
            buffer.write_values(&[-1]),
            Err(SpoolError::InvalidByte(-1))
        ));
        assert!(matches!(
            buffer.set_byte_at(0, 1000),
            Err(SpoolError::InvalidByte(1000))
        ));

        // Boundary values are fine.
        buffer.write_values(&[0, 255]).unwrap();
        assert_eq!(buffer.read_values(0, 0).unwrap(), vec![0, 255]);
    }
}

#[test]
fn test_close_flips_read_and_write_behavior() {
    for mut buffer in open_all() {
        buffer.write(b"abc").unwrap();
        buffer.close().unwrap();
        buffer.close().unwrap();

        assert!(buffer.is_closed());
        assert_eq!(buffer.read(0, 0).unwrap(), Vec::<u8>::new());
        assert_eq!(buffer.byte_at(0).unwrap(), None);
        assert_eq!(buffer.len().unwrap(), 0);
        assert!(matches!(buffer.write(b"x"), Err(SpoolError::Closed)));
        assert!(matches!(buffer.set_byte_at(0, 0), Err(SpoolError::Closed)));
    }
}
