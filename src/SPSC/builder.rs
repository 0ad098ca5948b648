use std::sync::Arc;

use super::{Consumer, Pipe, Producer};
use crate::Core::alloc::{allocate_ring, ChannelSizes};
use crate::Core::error::{PipeError, Result};
use crate::SPSC::Structs::Schema;

/// Sizing and release policy of a pipe.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PipeConfig {
    /// Structured channel holds `1 << word_bits` words.
    pub word_bits: u8,
    /// Byte channel holds `1 << byte_bits` bytes.
    pub byte_bits: u8,
    /// Fragments consumed between two tail releases.
    pub batch_release: i32,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            word_bits: 12, // 4096 words
            byte_bits: 14, // 16KB
            batch_release: 1,
        }
    }
}

impl PipeConfig {
    pub fn sizes(&self) -> ChannelSizes {
        ChannelSizes::new(self.word_bits, self.byte_bits)
    }

    /// Check the configuration against the schema it will carry.
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        self.sizes().validate()?;
        if self.batch_release < 1 {
            return Err(PipeError::InvalidConfig(format!(
                "batch_release must be at least 1, got {}",
                self.batch_release
            )));
        }
        let capacity = self.sizes().word_capacity();
        let largest = schema.max_fragment_size().max(schema.eof_size()) as usize;
        if capacity < largest {
            return Err(PipeError::InvalidConfig(format!(
                "structured channel of {capacity} words cannot hold a {largest} word fragment"
            )));
        }
        Ok(())
    }
}

pub struct PipeBuilder {
    schema: Arc<Schema>,
    config: PipeConfig,
}

impl PipeBuilder {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            config: PipeConfig::default(),
        }
    }

    pub fn with_word_bits(mut self, bits: u8) -> Self {
        self.config.word_bits = bits;
        self
    }

    pub fn with_byte_bits(mut self, bits: u8) -> Self {
        self.config.byte_bits = bits;
        self
    }

    pub fn with_batch_release(mut self, fragments: i32) -> Self {
        self.config.batch_release = fragments;
        self
    }

    pub fn with_config(mut self, config: PipeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Pipe> {
        self.config.validate(&self.schema)?;
        let ring = Arc::new(allocate_ring(self.config.sizes())?);

        tracing::debug!(
            words = ring.capacity(),
            bytes = ring.byte_capacity(),
            batch_release = self.config.batch_release,
            messages = self.schema.message_starts().len(),
            "pipe created"
        );
        Ok(Pipe {
            producer: Producer::new(ring.clone(), self.schema.clone()),
            consumer: Consumer::new(ring, self.schema, self.config.batch_release),
            config: self.config,
        })
    }

    /// Build and hand out both halves directly.
    pub fn build_split(self) -> Result<(Producer, Consumer)> {
        self.build().map(Pipe::split)
    }
}
