use std::sync::Arc;

use super::builder::{PipeBuilder, PipeConfig};
use super::{Consumer, Producer};
use crate::Core::error::{PipeError, Result};
use crate::SPSC::Ring::RingStore;
use crate::SPSC::Structs::Schema;

/// One ring with its two halves.
///
/// Kept whole, a pipe can be driven from a single thread (tests, replays).
/// [`Pipe::split`] hands the halves to a producer and a consumer thread, and
/// [`Pipe::join`] puts them back together, after which [`Pipe::reset`] may
/// rewind it. Reset needs `&mut Pipe`, so neither half can be in use.
pub struct Pipe {
    pub(crate) producer: Producer,
    pub(crate) consumer: Consumer,
    pub(crate) config: PipeConfig,
}

impl Pipe {
    /// A pipe with the default configuration.
    pub fn new(schema: Arc<Schema>) -> Result<Self> {
        PipeBuilder::new(schema).build()
    }

    pub fn builder(schema: Arc<Schema>) -> PipeBuilder {
        PipeBuilder::new(schema)
    }

    pub fn producer(&mut self) -> &mut Producer {
        &mut self.producer
    }

    pub fn consumer(&mut self) -> &mut Consumer {
        &mut self.consumer
    }

    /// Both halves at once, for single-threaded use.
    pub fn parts(&mut self) -> (&mut Producer, &mut Consumer) {
        (&mut self.producer, &mut self.consumer)
    }

    pub fn split(self) -> (Producer, Consumer) {
        tracing::debug!("pipe split");
        (self.producer, self.consumer)
    }

    /// Reassemble halves produced by [`Pipe::split`].
    pub fn join(producer: Producer, consumer: Consumer) -> Result<Self> {
        if !Arc::ptr_eq(&producer.ring, &consumer.ring) {
            return Err(PipeError::MismatchedHalves);
        }
        let config = PipeConfig {
            word_bits: producer.ring.capacity().trailing_zeros() as u8,
            byte_bits: producer.ring.byte_capacity().trailing_zeros() as u8,
            batch_release: consumer.walker.batch_release,
        };
        tracing::debug!("pipe joined");
        Ok(Self {
            producer,
            consumer,
            config,
        })
    }

    /// Rewind the ring and both walkers to their initial state.
    pub fn reset(&mut self) {
        self.producer.ring.clear();
        self.producer.walker.reset();
        self.consumer.walker.reset();
        tracing::debug!("pipe reset");
    }

    pub fn ring(&self) -> &RingStore {
        &self.producer.ring
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.producer.schema
    }

    pub fn config(&self) -> &PipeConfig {
        &self.config
    }

    /// `tail <= working tail <= head <= working head`, within one capacity, on both channels.
    pub fn positions_consistent(&self) -> bool {
        let ring = self.ring();
        let read = &self.consumer.walker;
        let write = &self.producer.walker;

        let words = ring.tail() <= read.working_tail
            && read.working_tail <= ring.head()
            && ring.head() <= write.working_head
            && write.working_head - ring.tail() <= ring.capacity() as u64;
        let bytes = ring.bytes_tail() <= read.bytes_working_tail
            && read.bytes_working_tail <= ring.bytes_head()
            && ring.bytes_head() <= write.bytes_working_head
            && write.bytes_working_head - ring.bytes_tail() <= ring.byte_capacity() as u64;
        words && bytes
    }
}
