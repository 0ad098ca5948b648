use std::fmt;

use crate::SPSC::Ring::RingStore;
use crate::SPSC::Structs::{Schema, Token};
use crate::SPSC::{Consumer, Pipe, Producer};

/// Debug function for RingStore
///
/// Shows capacities and the published counters, never the channel contents.
pub fn debug_ring_store(ring: &RingStore, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RingStore")
        .field("capacity", &ring.capacity())
        .field("byte_capacity", &ring.byte_capacity())
        .field("head", &ring.head())
        .field("tail", &ring.tail())
        .field("bytes_head", &ring.bytes_head())
        .field("bytes_tail", &ring.bytes_tail())
        .finish()
}

pub fn debug_producer(producer: &Producer, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Producer")
        .field("working_head", &producer.working_head())
        .field("bytes_working_head", &producer.bytes_working_head())
        .field("bytes_write_base", &producer.bytes_write_base())
        .field("fragments_written", &producer.fragments_written())
        .field("messages_written", &producer.messages_written())
        .finish_non_exhaustive()
}

pub fn debug_consumer(consumer: &Consumer, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Consumer")
        .field("cursor", &consumer.cursor())
        .field("next_cursor", &consumer.next_cursor())
        .field("message_id", &consumer.message_id())
        .field("working_tail", &consumer.working_tail())
        .field("next_working_tail", &consumer.next_working_tail())
        .field("sequence_depth", &consumer.sequence_depth())
        .field("release_count", &consumer.release_count())
        .finish_non_exhaustive()
}

pub fn debug_pipe(pipe: &Pipe, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Pipe")
        .field("ring", pipe.ring())
        .field("producer", &pipe.producer)
        .field("consumer", &pipe.consumer)
        .field("config", pipe.config())
        .finish()
}

/// Debug function for Schema
///
/// Lists the script as readable tokens rather than raw words.
pub fn debug_schema(schema: &Schema, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let script: Vec<String> = schema
        .tokens()
        .iter()
        .enumerate()
        .map(|(i, &t)| format!("{i}:{}({})", Token::describe(t), schema.name(i)))
        .collect();
    f.debug_struct("Schema")
        .field("script", &script)
        .field("message_starts", &schema.message_starts())
        .field("max_fragment_depth", &schema.max_fragment_depth())
        .field("max_fragment_size", &schema.max_fragment_size())
        .finish()
}

/// Render a diagnostic ring window one word per line, marking `focus`.
pub fn format_window(window_start: u64, window: &[i32], focus: u64) -> String {
    let mut out = String::new();
    for (i, word) in window.iter().enumerate() {
        let position = window_start + i as u64;
        let marker = if position == focus { "->" } else { "  " };
        out.push_str(&format!("{marker} {position:>10} {word:>12} 0x{:08x}\n", *word as u32));
    }
    out
}
