mod builder;
mod consumer;
mod copy;
mod debug;
mod getters;
mod pipe;
mod producer;

pub use builder::{PipeBuilder, PipeConfig};
pub use consumer::Consumer;
pub use copy::copy_fragment;
pub use pipe::Pipe;
pub use producer::Producer;

pub mod Ring {
    pub mod Ring;
    pub mod Ring_impl;
    pub mod layout;
    pub use Ring::{RingStore, MAX_BITS, MIN_BITS}; // re-export for stable path
}

pub mod Walker {
    pub mod Walker;
    pub mod read;
    pub mod validate;
    pub mod write;
    pub use Walker::{ReadWalker, SequenceStack, WriteWalker}; // re-export for stable path
}

pub mod Structs {
    pub mod Schema_Structs;
    pub mod Schema_builder;
    pub mod Token;
    pub use Schema_Structs::{FieldLoc, Schema, RAW_BYTES}; // re-export for stable path
    pub use Schema_builder::SchemaBuilder;
    pub use Token::TokenType;
}
