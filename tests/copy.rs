use dmxp_pipe::SPSC::Structs::{FieldLoc, Schema, SchemaBuilder, TokenType};
use dmxp_pipe::{copy_fragment, Pipe, PipeError};
use std::sync::Arc;

fn loc(depth: usize, offset: u32) -> FieldLoc {
    FieldLoc { depth, offset }
}

fn orders_schema() -> Arc<Schema> {
    Arc::new(
        SchemaBuilder::new()
            .begin_message("Orders")
            .field("id", TokenType::IntegerUnsigned)
            .begin_sequence("outer")
            .field("name", TokenType::TextUtf8)
            .begin_sequence("inner")
            .field("qty", TokenType::LongSigned)
            .end_sequence()
            .end_sequence()
            .end_message()
            .build()
            .unwrap(),
    )
}

#[test]
fn copy_into_full_destination_changes_nothing() {
    // id + three longs + trailer = 8 words
    let schema = Arc::new(
        Schema::simple(&[
            ("x", TokenType::LongSigned),
            ("y", TokenType::LongSigned),
            ("z", TokenType::LongSigned),
        ])
        .unwrap(),
    );
    let mut source = Pipe::builder(schema.clone()).with_word_bits(6).build().unwrap();
    let mut dest = Pipe::builder(schema).with_word_bits(4).build().unwrap();

    let dp = dest.producer();
    dp.advance_working_head(11).unwrap();
    dp.publish();
    assert_eq!(dp.ring().free_words(), 5);

    let (sp, sc) = source.parts();
    assert!(sp.try_write_fragment(0).unwrap());
    sp.write_long(loc(0, 1), 1);
    sp.publish();
    assert!(sc.try_read_fragment().unwrap());

    assert!(!copy_fragment(sc, dest.producer()).unwrap());
    assert_eq!(dest.ring().head(), 11);
    assert_eq!(dest.producer().working_head(), 11);
    assert_eq!(dest.producer().fragments_written(), 0);

    // once the destination drains, the same fragment goes through
    let dc = dest.consumer();
    dc.advance_working_tail(11).unwrap();
    dc.flush_release();
    assert!(copy_fragment(source.consumer(), dest.producer()).unwrap());
    assert_eq!(dest.ring().head(), 19);
}

#[test]
fn relay_preserves_messages_bytes_and_end_of_stream() {
    let schema = orders_schema();
    let msg = schema.message_id("Orders").unwrap();
    let mut source = Pipe::builder(schema.clone())
        .with_word_bits(8)
        .with_byte_bits(9)
        .build()
        .unwrap();
    let mut dest = Pipe::builder(schema).with_word_bits(8).with_byte_bits(9).build().unwrap();

    let (sp, sc) = source.parts();
    for id in 0..3 {
        assert!(sp.try_write_fragment(msg).unwrap());
        sp.write_int(loc(0, 1), id);
        sp.write_sequence_length(loc(0, 2), 2);
        for o in 0..2 {
            assert!(sp.try_write_fragment(3).unwrap());
            sp.write_text(loc(1, 0), &format!("ü-{id}-{o}")).unwrap();
            sp.write_sequence_length(loc(1, 2), id);
            for q in 0..id {
                assert!(sp.try_write_fragment(6).unwrap());
                sp.write_long(loc(2, 0), -(q as i64) * 1_000_000_000_000);
            }
        }
    }
    assert!(sp.publish_eof());

    let mut copied = 0;
    while sc.try_read_fragment().unwrap() {
        assert!(copy_fragment(sc, dest.producer()).unwrap());
        copied += 1;
    }
    assert_eq!(copied, sc.fragments_read());
    assert_eq!(dest.producer().messages_written(), 3);
    assert_eq!(dest.ring().bytes_head(), source.ring().bytes_head());

    let dc = dest.consumer();
    let mut names = Vec::new();
    let mut qtys = Vec::new();
    let mut name = String::new();
    loop {
        assert!(dc.try_read_fragment().unwrap());
        if dc.is_end_of_stream() {
            break;
        }
        match dc.cursor() {
            3 => {
                dc.read_text(loc(1, 0), &mut name);
                names.push(name.clone());
            }
            6 => qtys.push(dc.read_long(loc(2, 0))),
            _ => {}
        }
    }
    assert_eq!(dc.messages_read(), 3);
    assert_eq!(names, ["ü-0-0", "ü-0-1", "ü-1-0", "ü-1-1", "ü-2-0", "ü-2-1"]);
    assert_eq!(qtys, [0, 0, 0, -1_000_000_000_000, 0, -1_000_000_000_000]);
}

#[test]
fn copy_needs_a_prepared_fragment() {
    let schema = orders_schema();
    let mut source = Pipe::new(schema.clone()).unwrap();
    let mut dest = Pipe::new(schema).unwrap();
    assert!(matches!(
        copy_fragment(source.consumer(), dest.producer()),
        Err(PipeError::NoActiveFragment)
    ));
}

#[test]
fn mismatched_schemas_surface_as_corruption_downstream() {
    // open, a, b, close => id a b trailer
    let wide = Arc::new(
        SchemaBuilder::new()
            .begin_message("W")
            .field("a", TokenType::IntegerSigned)
            .field("b", TokenType::IntegerSigned)
            .end_message()
            .build()
            .unwrap(),
    );
    // open, x, close => id x trailer
    let narrow = Arc::new(
        SchemaBuilder::new()
            .begin_message("N")
            .field("x", TokenType::IntegerSigned)
            .end_message()
            .build()
            .unwrap(),
    );
    let mut source = Pipe::builder(wide).with_word_bits(5).build().unwrap();
    let mut dest = Pipe::builder(narrow).with_word_bits(5).build().unwrap();

    let (sp, sc) = source.parts();
    assert!(sp.try_write_fragment(0).unwrap());
    sp.write_int(loc(0, 1), 5);
    sp.write_int(loc(0, 2), -9);
    sp.publish();
    assert!(sc.try_read_fragment().unwrap());
    assert!(copy_fragment(sc, dest.producer()).unwrap());

    let err = dest.consumer().try_read_fragment().unwrap_err();
    assert!(matches!(
        err,
        PipeError::CorruptFragmentStart {
            position: 2,
            byte_count: -9,
            ..
        }
    ));
}
