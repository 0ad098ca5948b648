// Precomputed layout tables for a token script.
//
// The walker never interprets field values; everything it needs to frame a
// stream is derived here once and then shared read-only by both pipe halves.

use std::sync::Arc;

use lazy_static::lazy_static;

use super::Token::{self, TokenType};
use crate::Core::error::SchemaError;

/// Locates a field relative to the start of the fragment that holds it.
///
/// `depth` selects the entry of the active fragment-start stack, `offset` is the
/// word offset inside that fragment.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldLoc {
    pub depth: usize,
    pub offset: u32,
}

/// Compiled message layout shared by producer and consumer.
pub struct Schema {
    pub(crate) tokens: Box<[i32]>,
    pub(crate) names: Box<[String]>,
    /// Structured words of the fragment starting here (0 elsewhere).
    pub(crate) frag_data_size: Box<[i32]>,
    /// Script tokens of the fragment starting here (0 elsewhere).
    pub(crate) frag_script_size: Box<[i32]>,
    /// Open-sequence depth of the fragment holding this token, -1 outside fragments.
    pub(crate) frag_depth: Box<[i32]>,
    /// Word offset of the token inside its fragment, -1 outside fragments.
    pub(crate) token_offset: Box<[i32]>,
    /// For group-length tokens, the script position just past the matching sequence close.
    pub(crate) sequence_end: Box<[i32]>,
    pub(crate) message_starts: Box<[i32]>,
    pub(crate) starts_message: Box<[bool]>,
    pub(crate) template_offset: i32,
    pub(crate) simple: bool,
    pub(crate) max_fragment_depth: usize,
    pub(crate) max_fragment_size: i32,
}

lazy_static! {
    /// One flat message holding a single opaque byte array.
    pub static ref RAW_BYTES: Arc<Schema> = Arc::new(Schema::flat(
        vec![Token::build(TokenType::ByteArray, 0, 0)],
        vec!["ByteArray".to_string()],
        0,
    ));
}

struct FragmentDraft {
    start: usize,
    words: i32,
    depth: i32,
}

impl Schema {
    /// Compile a flat schema: one message, no groups, a single fragment.
    pub fn simple(fields: &[(&str, TokenType)]) -> Result<Self, SchemaError> {
        let mut tokens = Vec::with_capacity(fields.len());
        let mut names = Vec::with_capacity(fields.len());
        for (i, (name, token_type)) in fields.iter().enumerate() {
            if !token_type.is_field() {
                return Err(SchemaError::GroupInSimpleSchema { position: i });
            }
            tokens.push(Token::build(*token_type, 0, i as u32));
            names.push(name.to_string());
        }
        if tokens.is_empty() {
            return Err(SchemaError::EmptyScript);
        }
        Ok(Self::flat(tokens, names, 0))
    }

    /// Compile an arbitrary token script.
    ///
    /// `names` is indexed by script position; missing entries are treated as unnamed.
    /// `template_offset` is the number of preamble words stored ahead of each template id.
    pub fn from_script(
        tokens: Vec<i32>,
        mut names: Vec<String>,
        template_offset: i32,
    ) -> Result<Self, SchemaError> {
        let n = tokens.len();
        if n == 0 {
            return Err(SchemaError::EmptyScript);
        }
        for (position, &token) in tokens.iter().enumerate() {
            if Token::token_type(token).is_none() {
                return Err(SchemaError::UnknownTokenType {
                    position,
                    bits: Token::extract_type(token),
                });
            }
        }
        names.resize(n, String::new());

        if !tokens.iter().any(|&t| Token::is_group_or_length(t)) {
            return Ok(Self::flat(tokens, names, template_offset));
        }

        let mut frag_data_size = vec![0i32; n];
        let mut frag_script_size = vec![0i32; n];
        let mut frag_depth = vec![-1i32; n];
        let mut token_offset = vec![-1i32; n];
        let mut sequence_end = vec![-1i32; n];
        let mut message_starts = Vec::new();

        let mut groups: Vec<i32> = Vec::new();
        let mut lengths: Vec<usize> = Vec::new();
        let mut seq_depth: i32 = 0;
        let mut max_seq_depth: i32 = 0;
        let mut current: Option<FragmentDraft> = None;
        let mut opens_next = true;

        let mut finish = |current: &mut Option<FragmentDraft>, end: usize| {
            if let Some(frag) = current.take() {
                // +1 for the trailing byte-count word
                frag_data_size[frag.start] = frag.words + 1;
                frag_script_size[frag.start] = (end - frag.start) as i32;
            }
        };

        for i in 0..n {
            let token = tokens[i];
            let closing = Token::is_group_close(token);

            if opens_next && !closing {
                let message_boundary = groups.is_empty();
                if message_boundary {
                    if !Token::is_template_open(token) {
                        return Err(SchemaError::BadMessageStart {
                            position: i,
                            token: Token::describe(token),
                        });
                    }
                    message_starts.push(i as i32);
                }
                current = Some(FragmentDraft {
                    start: i,
                    words: if message_boundary { template_offset + 1 } else { 0 },
                    depth: seq_depth,
                });
                opens_next = false;
            }

            if let Some(frag) = current.as_mut() {
                frag_depth[i] = frag.depth;
                token_offset[i] = frag.words;
                frag.words += Token::token_type(token).map_or(0, TokenType::data_words);
            }

            if Token::is_group_length(token) {
                if i + 1 >= n || !Token::is_sequence_open(tokens[i + 1]) {
                    return Err(SchemaError::UnpairedSequence { position: i });
                }
                lengths.push(i);
                finish(&mut current, i + 1);
                seq_depth += 1;
                max_seq_depth = max_seq_depth.max(seq_depth);
                opens_next = true;
            } else if Token::is_group_open(token) {
                if Token::is_sequence_open(token) && (i == 0 || !Token::is_group_length(tokens[i - 1])) {
                    return Err(SchemaError::UnpairedSequence { position: i });
                }
                if Token::is_template_open(token) && !groups.is_empty() {
                    return Err(SchemaError::UnbalancedGroup { position: i });
                }
                groups.push(token);
            } else if closing {
                let kind_mask = Token::GROUP_BIT_TEMPL | Token::GROUP_BIT_SEQ;
                let open = groups
                    .pop()
                    .ok_or(SchemaError::UnbalancedGroup { position: i })?;
                if Token::extract_oper(open) & kind_mask != Token::extract_oper(token) & kind_mask {
                    return Err(SchemaError::UnbalancedGroup { position: i });
                }
                if Token::is_sequence_close(token) {
                    let length_pos = lengths
                        .pop()
                        .ok_or(SchemaError::UnpairedSequence { position: i })?;
                    sequence_end[length_pos] = (i + 1) as i32;
                    finish(&mut current, i + 1);
                    seq_depth -= 1;
                    opens_next = true;
                } else if Token::extract_oper(token) & Token::GROUP_BIT_TEMPL != 0 {
                    finish(&mut current, i + 1);
                    opens_next = true;
                }
            }
        }
        if !groups.is_empty() {
            return Err(SchemaError::UnterminatedScript { open: groups.len() });
        }
        finish(&mut current, n);

        let mut starts_message = vec![false; n];
        for &start in &message_starts {
            starts_message[start as usize] = true;
        }
        let max_fragment_size = frag_data_size.iter().copied().max().unwrap_or(0);

        Ok(Self {
            tokens: tokens.into_boxed_slice(),
            names: names.into_boxed_slice(),
            frag_data_size: frag_data_size.into_boxed_slice(),
            frag_script_size: frag_script_size.into_boxed_slice(),
            frag_depth: frag_depth.into_boxed_slice(),
            token_offset: token_offset.into_boxed_slice(),
            sequence_end: sequence_end.into_boxed_slice(),
            message_starts: message_starts.into_boxed_slice(),
            starts_message: starts_message.into_boxed_slice(),
            template_offset,
            simple: false,
            max_fragment_depth: (max_seq_depth + 1) as usize,
            max_fragment_size,
        })
    }

    /// Tables for a script without groups: the whole script is one message fragment.
    fn flat(tokens: Vec<i32>, mut names: Vec<String>, template_offset: i32) -> Self {
        let n = tokens.len();
        names.resize(n, String::new());

        let mut token_offset = Vec::with_capacity(n);
        let mut words = template_offset + 1;
        for &token in &tokens {
            token_offset.push(words);
            words += Token::token_type(token).map_or(0, TokenType::data_words);
        }
        let mut frag_data_size = vec![0i32; n];
        let mut frag_script_size = vec![0i32; n];
        frag_data_size[0] = words + 1;
        frag_script_size[0] = n as i32;
        let mut starts_message = vec![false; n];
        starts_message[0] = true;

        Self {
            tokens: tokens.into_boxed_slice(),
            names: names.into_boxed_slice(),
            frag_data_size: frag_data_size.into_boxed_slice(),
            frag_script_size: frag_script_size.into_boxed_slice(),
            frag_depth: vec![0; n].into_boxed_slice(),
            token_offset: token_offset.into_boxed_slice(),
            sequence_end: vec![-1; n].into_boxed_slice(),
            message_starts: vec![0].into_boxed_slice(),
            starts_message: starts_message.into_boxed_slice(),
            template_offset,
            simple: true,
            max_fragment_depth: 1,
            max_fragment_size: words + 1,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[i32] {
        &self.tokens
    }

    pub fn token(&self, position: usize) -> i32 {
        self.tokens[position]
    }

    pub fn name(&self, position: usize) -> &str {
        &self.names[position]
    }

    pub fn frag_data_size(&self, position: usize) -> i32 {
        self.frag_data_size[position]
    }

    pub fn frag_script_size(&self, position: usize) -> i32 {
        self.frag_script_size[position]
    }

    pub fn frag_depth(&self, position: usize) -> i32 {
        self.frag_depth[position]
    }

    pub fn token_offset(&self, position: usize) -> i32 {
        self.token_offset[position]
    }

    pub fn message_starts(&self) -> &[i32] {
        &self.message_starts
    }

    pub fn template_offset(&self) -> i32 {
        self.template_offset
    }

    /// True when the schema is a single flat message.
    pub fn has_simple_messages_only(&self) -> bool {
        self.simple
    }

    /// Number of fragment-start stack slots a walker needs.
    pub fn max_fragment_depth(&self) -> usize {
        self.max_fragment_depth
    }

    /// Largest fragment in structured words.
    pub fn max_fragment_size(&self) -> i32 {
        self.max_fragment_size
    }

    /// Words taken by an end-of-stream marker: preamble, id and trailer.
    pub fn eof_size(&self) -> i32 {
        self.template_offset + 2
    }

    pub fn is_message_start(&self, position: i32) -> bool {
        position >= 0 && (position as usize) < self.len() && self.starts_message[position as usize]
    }

    pub fn is_fragment_start(&self, position: i32) -> bool {
        position >= 0 && (position as usize) < self.len() && self.frag_script_size[position as usize] > 0
    }

    /// Locator of the token at `position`, if it lies inside a fragment.
    pub fn loc(&self, position: usize) -> Option<FieldLoc> {
        let depth = *self.frag_depth.get(position)?;
        if depth < 0 {
            return None;
        }
        Some(FieldLoc {
            depth: depth as usize,
            offset: self.token_offset[position] as u32,
        })
    }

    /// Script position of the message template with the given name.
    pub fn message_id(&self, name: &str) -> Option<i32> {
        self.message_starts
            .iter()
            .copied()
            .find(|&start| self.names[start as usize] == name)
    }

    /// Script range `[start, end)` covered by a message.
    pub fn message_range(&self, message_id: i32) -> Option<(usize, usize)> {
        if !self.is_message_start(message_id) {
            return None;
        }
        let start = message_id as usize;
        let end = self
            .message_starts
            .iter()
            .map(|&s| s as usize)
            .filter(|&s| s > start)
            .min()
            .unwrap_or(self.len());
        Some((start, end))
    }

    /// Locator of the named field or sequence length inside a message.
    pub fn field_loc(&self, message_id: i32, name: &str) -> Option<FieldLoc> {
        let (start, end) = self.message_range(message_id)?;
        (start..end)
            .filter(|&pos| !Token::is_group(self.tokens[pos]))
            .find(|&pos| self.names[pos] == name)
            .and_then(|pos| self.loc(pos))
    }

    /// Script position of the named token inside a message.
    pub fn position_of(&self, message_id: i32, name: &str) -> Option<usize> {
        let (start, end) = self.message_range(message_id)?;
        (start..end).find(|&pos| self.names[pos] == name)
    }
}
