// Error types shared by the schema tables, the ring store and both walker halves.

/// Errors raised while compiling a token script into schema tables.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// The script holds no tokens.
    #[error("schema script is empty")]
    EmptyScript,

    /// A message boundary was reached but the token there does not open a template.
    #[error("token {token} at script position {position} cannot start a message")]
    BadMessageStart { position: usize, token: String },

    /// A group close does not match the group it would close.
    #[error("unbalanced group at script position {position}")]
    UnbalancedGroup { position: usize },

    /// A sequence open is not directly preceded by its length token, or vice versa.
    #[error("sequence at script position {position} is not paired with a length token")]
    UnpairedSequence { position: usize },

    /// A group token appeared in a schema declared flat.
    #[error("simple schemas cannot contain groups (script position {position})")]
    GroupInSimpleSchema { position: usize },

    /// The script ends while groups are still open.
    #[error("script ends with {open} group(s) still open")]
    UnterminatedScript { open: usize },

    /// A token carries a type value this crate does not know.
    #[error("unknown token type 0x{bits:02x} at script position {position}")]
    UnknownTokenType { position: usize, bits: u32 },
}

/// Errors raised by pipe construction, usage mistakes and stream corruption.
///
/// Running out of data or room is never an error; those are reported as
/// `Ok(false)` by the operation that could not proceed.
#[derive(Debug, thiserror::Error)]
pub enum PipeError {
    #[error("invalid pipe configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The word preceding a fragment start does not hold a plausible byte count.
    #[error(
        "bad fragment start at position {position}: trailer byte count {byte_count} outside 0..={byte_capacity} (ring window from {window_start}: {window:?})"
    )]
    CorruptFragmentStart {
        position: u64,
        byte_count: i32,
        byte_capacity: usize,
        window_start: u64,
        window: Vec<i32>,
    },

    /// The id word of a message is neither a message start nor an end-of-stream marker.
    #[error(
        "malformed template id {id} at position {position}, expected one of {valid:?} (ring window from {window_start}: {window:?})"
    )]
    MalformedTemplateId {
        id: i32,
        position: u64,
        valid: Vec<i32>,
        window_start: u64,
        window: Vec<i32>,
    },

    /// The published head stops inside a fragment.
    #[error("partial fragment published: fragment at {position} needs {expected} words but only {available} are visible")]
    PartialFragment {
        position: u64,
        expected: u64,
        available: u64,
    },

    #[error("negative sequence length {length} at position {position}")]
    BadSequenceLength { position: u64, length: i32 },

    /// A fragment operation was requested at a script position that does not begin a fragment.
    #[error("script position {cursor} does not begin a fragment")]
    NotFragmentStart { cursor: i32 },

    /// A working position was pushed past the limit the other side allows.
    #[error("{channel} channel overrun: position {requested} exceeds limit {limit}")]
    Overrun {
        channel: &'static str,
        requested: u64,
        limit: u64,
    },

    /// No fragment is currently prepared on the read side.
    #[error("no fragment is active on the read side")]
    NoActiveFragment,

    #[error("producer and consumer belong to different pipes")]
    MismatchedHalves,
}

impl PipeError {
    /// True for the conditions that mean the stream itself can no longer be trusted.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            PipeError::CorruptFragmentStart { .. }
                | PipeError::MalformedTemplateId { .. }
                | PipeError::PartialFragment { .. }
                | PipeError::BadSequenceLength { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PipeError>;
