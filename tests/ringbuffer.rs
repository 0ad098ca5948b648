use dmxp_pipe::SPSC::Structs::{FieldLoc, Schema, TokenType, RAW_BYTES};
use dmxp_pipe::{Pipe, PipeError};
use std::sync::Arc;

fn loc(depth: usize, offset: u32) -> FieldLoc {
    FieldLoc { depth, offset }
}

// a:int b:int c:long => id + 4 field words + trailer
fn flat_schema() -> Arc<Schema> {
    Arc::new(
        Schema::simple(&[
            ("a", TokenType::IntegerSigned),
            ("b", TokenType::IntegerSigned),
            ("c", TokenType::LongSigned),
        ])
        .unwrap(),
    )
}

fn small_pipe(schema: Arc<Schema>, word_bits: u8, byte_bits: u8) -> Pipe {
    Pipe::builder(schema)
        .with_word_bits(word_bits)
        .with_byte_bits(byte_bits)
        .build()
        .unwrap()
}

#[test]
fn unpublished_fragment_is_not_visible() {
    let mut pipe = small_pipe(flat_schema(), 6, 6);
    let (producer, consumer) = pipe.parts();

    assert!(producer.try_write_fragment(0).unwrap());
    producer.write_int(loc(0, 1), 7);
    producer.write_int(loc(0, 2), 8);
    producer.write_long(loc(0, 3), 9);
    assert_eq!(producer.working_head(), 6);
    assert_eq!(producer.ring().head(), 0);

    assert!(!consumer.try_read_fragment().unwrap());
    assert_eq!(consumer.fragments_read(), 0);
    assert_eq!(consumer.next_working_tail(), 0);

    producer.publish();
    assert_eq!(producer.ring().head(), 6);
    assert!(consumer.try_read_fragment().unwrap());
    assert_eq!(consumer.read_int(loc(0, 1)), 7);
}

#[test]
fn words_and_bytes_wrap_around_the_channels() {
    let schema = Arc::new(
        Schema::simple(&[
            ("n", TokenType::LongUnsigned),
            ("payload", TokenType::ByteArray),
        ])
        .unwrap(),
    );
    // 6 words per fragment in a 16 word ring, 5 bytes per payload in 16 bytes
    let mut pipe = small_pipe(schema, 4, 4);
    let (producer, consumer) = pipe.parts();

    let mut buf = [0u8; 16];
    for round in 0..20i64 {
        let payload = [round as u8; 5];
        assert!(producer.try_write_fragment_with_bytes(0, payload.len()).unwrap());
        producer.write_long(loc(0, 1), round * 1_000_000_007);
        producer.write_bytes(loc(0, 3), &payload).unwrap();
        producer.publish();

        assert!(consumer.try_read_fragment().unwrap());
        assert_eq!(consumer.read_long(loc(0, 1)), round * 1_000_000_007);
        let n = consumer.read_bytes(loc(0, 3), &mut buf);
        assert_eq!(&buf[..n], &payload);
    }
    assert_eq!(pipe.ring().head(), 20 * 6);
    assert_eq!(pipe.ring().bytes_head(), 20 * 5);
    assert!(pipe.positions_consistent());
}

#[test]
fn full_ring_refuses_without_side_effects() {
    let mut pipe = small_pipe(flat_schema(), 3, 4);
    let (producer, consumer) = pipe.parts();

    assert!(producer.try_write_fragment(0).unwrap());
    producer.publish();
    // 6 of 8 words used, a second fragment does not fit
    assert!(!producer.try_write_fragment(0).unwrap());
    assert_eq!(producer.working_head(), 6);

    // reading the first fragment releases nothing before it
    assert!(consumer.try_read_fragment().unwrap());
    assert_eq!(consumer.ring().tail(), 0);
    assert!(!producer.try_write_fragment(0).unwrap());
}

#[test]
fn raw_words_need_room_and_publish() {
    let mut pipe = small_pipe(flat_schema(), 3, 4);
    let (producer, consumer) = pipe.parts();

    assert!(producer.has_room_for(8, 16));
    assert!(!producer.has_room_for(9, 0));
    assert!(!producer.has_room_for(0, 17));

    for i in 0..4 {
        producer.write_raw(i, 100 + i as i32);
    }
    producer.advance_working_head(4).unwrap();
    producer.publish();
    assert_eq!(consumer.ring().word(2), 102);

    let err = producer.advance_working_head(5).unwrap_err();
    assert!(matches!(
        err,
        PipeError::Overrun {
            channel: "structured",
            requested: 9,
            limit: 8
        }
    ));

    consumer.advance_working_tail(4).unwrap();
    assert!(matches!(
        consumer.advance_working_tail(1),
        Err(PipeError::Overrun { .. })
    ));
    assert_eq!(consumer.ring().tail(), 0);
    consumer.flush_release();
    assert_eq!(consumer.ring().tail(), 4);
    assert_eq!(consumer.release_count(), 1);
}

#[test]
fn framed_messages_read_after_a_raw_skip() {
    // n:int payload:bytes => id n offset len trailer
    let schema = Arc::new(
        Schema::simple(&[("n", TokenType::IntegerSigned), ("payload", TokenType::ByteArray)]).unwrap(),
    );
    let mut pipe = small_pipe(schema, 6, 6);
    let (producer, consumer) = pipe.parts();

    assert!(producer.try_write_fragment_with_bytes(0, 3).unwrap());
    producer.write_int(loc(0, 1), 1);
    producer.write_bytes(loc(0, 2), b"abc").unwrap();
    producer.write_raw(0, 7);
    producer.write_raw(1, -5);
    producer.advance_working_head(2).unwrap();
    for (n, payload) in [(2, &b"xy"[..]), (3, &b"z"[..])] {
        assert!(producer.try_write_fragment_with_bytes(0, payload.len()).unwrap());
        producer.write_int(loc(0, 1), n);
        producer.write_bytes(loc(0, 2), payload).unwrap();
    }
    producer.publish();

    let mut buf = Vec::new();
    assert!(consumer.try_read_fragment().unwrap());
    consumer.read_bytes_into(loc(0, 2), &mut buf);
    assert_eq!(buf, b"abc");

    // the skip starts after the prepared fragment and takes its bytes along
    consumer.advance_working_tail(2).unwrap();
    assert_eq!(consumer.working_tail(), 7);
    assert_eq!(consumer.next_working_tail(), 7);
    assert_eq!(consumer.bytes_working_tail(), 3);

    assert!(consumer.try_read_fragment().unwrap());
    assert_eq!(consumer.read_int(loc(0, 1)), 2);
    assert_eq!(consumer.bytes_read_base(), 3);
    consumer.read_bytes_into(loc(0, 2), &mut buf);
    assert_eq!(buf, b"xy");

    assert!(consumer.try_read_fragment().unwrap());
    assert_eq!(consumer.read_int(loc(0, 1)), 3);
    consumer.read_bytes_into(loc(0, 2), &mut buf);
    assert_eq!(buf, b"z");
    assert_eq!(consumer.bytes_working_tail(), 5);

    consumer.flush_release();
    assert_eq!(consumer.ring().tail(), 12);
    assert_eq!(consumer.ring().bytes_tail(), 5);
    assert!(pipe.positions_consistent());
}

#[test]
fn byte_overrun_is_reported() {
    let mut pipe = small_pipe(RAW_BYTES.clone(), 4, 3);
    let producer = pipe.producer();

    assert!(producer.try_write_fragment(0).unwrap());
    let err = producer.write_bytes(loc(0, 1), &[1u8; 9]).unwrap_err();
    assert!(matches!(err, PipeError::Overrun { channel: "byte", .. }));
    assert_eq!(producer.bytes_working_head(), 0);

    producer.write_bytes(loc(0, 1), &[1u8; 8]).unwrap();
    assert!(!producer.try_write_fragment_with_bytes(0, 1).unwrap());
}

#[test]
fn window_covers_positions_around_center() {
    let mut pipe = small_pipe(flat_schema(), 4, 4);
    let producer = pipe.producer();
    for i in 0..16 {
        producer.write_raw(i, i as i32);
    }
    let (start, words) = producer.ring().window(3, 2);
    assert_eq!(start, 1);
    assert_eq!(words, vec![1, 2, 3, 4]);

    let (start, words) = producer.ring().window(1, 4);
    assert_eq!(start, 0);
    assert_eq!(words.len(), 5);
}

#[test]
fn occupancy_getters_follow_head_and_tail() {
    let mut pipe = small_pipe(RAW_BYTES.clone(), 4, 5);
    let (producer, consumer) = pipe.parts();

    assert!(producer.try_write_fragment(0).unwrap());
    producer.write_bytes(loc(0, 1), b"abcdef").unwrap();
    producer.publish();
    assert_eq!(producer.ring().used_words(), 4);
    assert_eq!(producer.ring().free_words(), 12);
    assert_eq!(producer.ring().used_bytes(), 6);
    assert_eq!(producer.ring().free_bytes(), 26);

    assert!(consumer.try_read_fragment().unwrap());
    let mut text = String::new();
    consumer.read_text(loc(0, 1), &mut text);
    assert_eq!(text, "abcdef");
    assert_eq!(consumer.read_bytes_len(loc(0, 1)), 6);
}

#[test]
fn window_dump_marks_the_focus_word() {
    use dmxp_pipe::Debug::StructDebug::format_window;

    let dump = format_window(10, &[1, -1, 7], 11);
    let lines: Vec<&str> = dump.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("->"));
    assert!(lines[1].ends_with("0xffffffff"));
    assert!(lines[0].starts_with("  "));
    assert!(lines[2].contains(" 12 "));
}
