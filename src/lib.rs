// Module naming follows project convention (SPSC = Single-Producer Single-Consumer)
#[allow(non_snake_case)]
pub mod SPSC;

#[allow(non_snake_case)]
pub mod Core {
    pub mod alloc;
    pub mod error;
    pub use error::{PipeError, Result, SchemaError}; // re-export for stable path
}

#[allow(non_snake_case)]
pub mod Debug {
    pub mod StructDebug;
}

pub use Core::error::{PipeError, SchemaError};
pub use SPSC::Structs::{FieldLoc, Schema, SchemaBuilder, TokenType};
pub use SPSC::{copy_fragment, Consumer, Pipe, PipeBuilder, PipeConfig, Producer};
