// Three threads, two pipes: a producer writes nested Orders messages, a relay
// copies every fragment into a second pipe, and a consumer checks what arrives.
//
//   cargo run --example relay -- <num_messages> [--verbose]
use crossbeam_utils::Backoff;
use dmxp_pipe::Debug::StructDebug::format_window;
use dmxp_pipe::SPSC::Structs::{FieldLoc, SchemaBuilder, TokenType};
use dmxp_pipe::{copy_fragment, Consumer, Pipe, PipeError, Producer};
use sha2::{Digest, Sha256};
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

const ID: FieldLoc = FieldLoc { depth: 0, offset: 1 };
const LINES: FieldLoc = FieldLoc { depth: 0, offset: 2 };
const SKU: FieldLoc = FieldLoc { depth: 1, offset: 0 };
const FILLS: FieldLoc = FieldLoc { depth: 1, offset: 2 };
const PRICE: FieldLoc = FieldLoc { depth: 2, offset: 0 };

fn open_fragment(p: &mut Producer, cursor: i32, bytes: usize) {
    let backoff = Backoff::new();
    while !p
        .try_write_fragment_with_bytes(cursor, bytes)
        .expect("cursor is a fragment start")
    {
        p.publish();
        backoff.snooze();
    }
}

/// Print the ring words around a corrupt position before giving up.
fn report(consumer: &Consumer, err: &PipeError) {
    eprintln!("{err}");
    let position = match err {
        PipeError::CorruptFragmentStart { position, .. }
        | PipeError::MalformedTemplateId { position, .. }
        | PipeError::PartialFragment { position, .. }
        | PipeError::BadSequenceLength { position, .. } => *position,
        _ => return,
    };
    let (start, words) = consumer.ring().window(position, 8);
    eprint!("{}", format_window(start, &words, position));
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if env::args().any(|a| a == "--verbose") {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <num_messages> [--verbose]", args[0]);
        std::process::exit(1);
    }
    let num_messages: i32 = args[1].parse().expect("Invalid number of messages");

    let schema = Arc::new(
        SchemaBuilder::new()
            .begin_message("Orders")
            .field("id", TokenType::IntegerUnsigned)
            .begin_sequence("lines")
            .field("sku", TokenType::TextAscii)
            .begin_sequence("fills")
            .field("price", TokenType::Decimal)
            .end_sequence()
            .end_sequence()
            .end_message()
            .build()
            .expect("Invalid schema"),
    );
    println!("Relay: schema {:?}", schema);

    let (mut producer, mut relay_in) = Pipe::builder(schema.clone())
        .with_word_bits(8)
        .with_byte_bits(10)
        .build_split()
        .expect("Failed to build first pipe");
    let (mut relay_out, mut consumer) = Pipe::builder(schema)
        .with_word_bits(8)
        .with_byte_bits(10)
        .with_batch_release(4)
        .build_split()
        .expect("Failed to build second pipe");

    let running = Arc::new(AtomicBool::new(true));
    let running_for_handler = Arc::clone(&running);
    ctrlc::set_handler(move || {
        running_for_handler.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    let start = Instant::now();

    let running_p = Arc::clone(&running);
    let writer = thread::spawn(move || {
        let mut rng = fastrand::Rng::with_seed(42);
        let mut hasher = Sha256::new();
        // stop only between messages so the end-of-stream marker lands on a message boundary
        for id in 0..num_messages {
            if !running_p.load(Ordering::Relaxed) {
                println!("Producer: interrupted after {} messages", id);
                break;
            }
            open_fragment(&mut producer, 0, 0);
            let lines = rng.i32(1..4);
            producer.write_int(ID, id);
            producer.write_sequence_length(LINES, lines);
            hasher.update(id.to_le_bytes());
            for line in 0..lines {
                let sku = format!("SKU-{id}-{line}");
                open_fragment(&mut producer, 3, sku.len());
                let fills = rng.i32(0..3);
                producer.write_text(SKU, &sku).expect("byte room was reserved");
                producer.write_sequence_length(FILLS, fills);
                hasher.update(sku.as_bytes());
                for _ in 0..fills {
                    open_fragment(&mut producer, 6, 0);
                    let mantissa = rng.i64(1..1_000_000);
                    producer.write_decimal(PRICE, -2, mantissa);
                    hasher.update(mantissa.to_le_bytes());
                }
            }
        }
        producer.publish();
        while !producer.publish_eof() {
            thread::yield_now();
        }
        format!("{:x}", hasher.finalize())
    });

    let relay = thread::spawn(move || {
        let backoff = Backoff::new();
        let mut relayed = 0u64;
        loop {
            match relay_in.try_read_fragment() {
                Ok(true) => {}
                Ok(false) => {
                    backoff.snooze();
                    continue;
                }
                Err(e) => {
                    report(&relay_in, &e);
                    break;
                }
            }
            backoff.reset();
            loop {
                match copy_fragment(&relay_in, &mut relay_out) {
                    Ok(true) => break,
                    Ok(false) => backoff.snooze(),
                    Err(e) => {
                        report(&relay_in, &e);
                        return relayed;
                    }
                }
            }
            relayed += 1;
            if relay_in.is_end_of_stream() {
                break;
            }
        }
        relayed
    });

    let reader = thread::spawn(move || {
        let backoff = Backoff::new();
        let mut hasher = Sha256::new();
        let mut sku = String::new();
        loop {
            match consumer.try_read_fragment() {
                Ok(true) => backoff.reset(),
                Ok(false) => {
                    backoff.snooze();
                    continue;
                }
                Err(e) => {
                    report(&consumer, &e);
                    break;
                }
            }
            if consumer.is_end_of_stream() {
                break;
            }
            match consumer.cursor() {
                0 => hasher.update(consumer.read_int(ID).to_le_bytes()),
                3 => {
                    consumer.read_text(SKU, &mut sku);
                    hasher.update(sku.as_bytes());
                }
                _ => hasher.update(consumer.read_decimal(PRICE).1.to_le_bytes()),
            }
            if consumer.messages_read() % 1000 == 0 && consumer.is_new_message() {
                println!("Consumer: {} messages", consumer.messages_read());
            }
        }
        consumer.flush_release();
        (consumer.messages_read(), format!("{:x}", hasher.finalize()))
    });

    let sent_hash = writer.join().expect("producer thread panicked");
    let relayed = relay.join().expect("relay thread panicked");
    let (received, received_hash) = reader.join().expect("consumer thread panicked");
    let elapsed = start.elapsed();

    println!("Relay: {} fragments relayed", relayed);
    println!("Consumer: {} messages in {:.2?}", received, elapsed);
    println!(
        "Throughput: {:.2} messages/sec",
        received as f64 / elapsed.as_secs_f64()
    );
    println!("Producer digest: {}", sent_hash);
    println!("Consumer digest: {}", received_hash);
    if sent_hash == received_hash {
        println!("Digests match");
    } else {
        eprintln!("Digest mismatch");
        std::process::exit(1);
    }
}
