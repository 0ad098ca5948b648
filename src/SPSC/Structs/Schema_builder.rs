use super::Schema_Structs::Schema;
use super::Token::{self, TokenType};
use crate::Core::error::SchemaError;

/// Assembles a token script message by message.
///
/// ```
/// use dmxp_pipe::SPSC::Structs::{SchemaBuilder, TokenType};
///
/// let schema = SchemaBuilder::new()
///     .begin_message("Quote")
///     .field("price", TokenType::Decimal)
///     .begin_sequence("legs")
///     .field("qty", TokenType::IntegerUnsigned)
///     .end_sequence()
///     .end_message()
///     .build()
///     .unwrap();
/// assert_eq!(schema.message_starts(), &[0]);
/// ```
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    tokens: Vec<i32>,
    names: Vec<String>,
    open: Vec<(u32, String)>,
    preamble_words: i32,
    next_instance: u32,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve words ahead of every template id.
    pub fn with_preamble(mut self, words: i32) -> Self {
        self.preamble_words = words.max(0);
        self
    }

    fn push(&mut self, token_type: TokenType, oper: u32, name: &str) {
        let instance = self.next_instance;
        self.next_instance += 1;
        self.tokens.push(Token::build(token_type, oper, instance));
        self.names.push(name.to_string());
    }

    fn open_group(mut self, oper: u32, name: &str) -> Self {
        self.push(TokenType::Group, oper, name);
        self.open.push((oper, name.to_string()));
        self
    }

    // Closing an unopened group still emits a token; build() reports the imbalance.
    fn close_group(mut self) -> Self {
        let (oper, name) = self.open.pop().unwrap_or((0, String::new()));
        self.push(TokenType::Group, oper | Token::GROUP_BIT_CLOSE, &name);
        self
    }

    pub fn begin_message(self, name: &str) -> Self {
        self.open_group(Token::GROUP_BIT_TEMPL, name)
    }

    pub fn end_message(self) -> Self {
        self.close_group()
    }

    /// Non-repeating nested group; it does not split fragments.
    pub fn begin_group(self, name: &str) -> Self {
        self.open_group(0, name)
    }

    pub fn end_group(self) -> Self {
        self.close_group()
    }

    /// Emits the sequence length token followed by the sequence body open.
    pub fn begin_sequence(mut self, name: &str) -> Self {
        self.push(TokenType::GroupLength, 0, name);
        self.open_group(Token::GROUP_BIT_SEQ, name)
    }

    pub fn end_sequence(self) -> Self {
        self.close_group()
    }

    pub fn field(mut self, name: &str, token_type: TokenType) -> Self {
        self.push(token_type, 0, name);
        self
    }

    /// Raw token, for scripts produced elsewhere.
    pub fn token(mut self, token: i32, name: &str) -> Self {
        self.tokens.push(token);
        self.names.push(name.to_string());
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        Schema::from_script(self.tokens, self.names, self.preamble_words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SPSC::Structs::FieldLoc;

    fn at(depth: usize, offset: u32) -> FieldLoc {
        FieldLoc { depth, offset }
    }

    fn nested() -> Schema {
        // 0 open Orders
        // 1 id          (int)
        // 2 len outer
        // 3 open outer seq
        // 4 name        (text)
        // 5 len inner
        // 6 open inner seq
        // 7 qty         (long)
        // 8 close inner
        // 9 close outer
        // 10 close Orders
        SchemaBuilder::new()
            .begin_message("Orders")
            .field("id", TokenType::IntegerUnsigned)
            .begin_sequence("outer")
            .field("name", TokenType::TextAscii)
            .begin_sequence("inner")
            .field("qty", TokenType::LongSigned)
            .end_sequence()
            .end_sequence()
            .end_message()
            .build()
            .unwrap()
    }

    #[test]
    fn fragments_split_at_lengths_and_sequence_closes() {
        let schema = nested();
        assert_eq!(schema.len(), 11);
        assert_eq!(schema.message_starts(), &[0]);

        // id word + int + length + trailer
        assert_eq!(schema.frag_data_size(0), 4);
        assert_eq!(schema.frag_script_size(0), 3);
        // text + length + trailer
        assert_eq!(schema.frag_data_size(3), 4);
        assert_eq!(schema.frag_script_size(3), 3);
        // long + trailer
        assert_eq!(schema.frag_data_size(6), 3);
        assert_eq!(schema.frag_script_size(6), 3);

        assert_eq!(schema.frag_depth(0), 0);
        assert_eq!(schema.frag_depth(4), 1);
        assert_eq!(schema.frag_depth(7), 2);
        assert_eq!(schema.frag_depth(9), -1);
        assert_eq!(schema.frag_depth(10), -1);
        assert_eq!(schema.max_fragment_depth(), 3);
        assert_eq!(schema.max_fragment_size(), 4);
    }

    #[test]
    fn sequence_end_points_past_matching_close() {
        let schema = nested();
        assert_eq!(schema.sequence_end[2], 10);
        assert_eq!(schema.sequence_end[5], 9);
        assert_eq!(schema.sequence_end[1], -1);
    }

    #[test]
    fn locators_resolve_by_name() {
        let schema = nested();
        let id = schema.message_id("Orders").unwrap();
        assert_eq!(schema.field_loc(id, "id"), Some(at(0, 1)));
        assert_eq!(schema.field_loc(id, "outer"), Some(at(0, 2)));
        assert_eq!(schema.field_loc(id, "name"), Some(at(1, 0)));
        assert_eq!(schema.field_loc(id, "qty"), Some(at(2, 0)));
        assert_eq!(schema.field_loc(id, "missing"), None);
    }

    #[test]
    fn preamble_shifts_first_field() {
        let schema = SchemaBuilder::new()
            .with_preamble(2)
            .begin_message("M")
            .field("a", TokenType::IntegerSigned)
            .end_message()
            .build()
            .unwrap();
        assert_eq!(schema.template_offset(), 2);
        assert_eq!(schema.token_offset(1), 3);
        // preamble + id + int + trailer
        assert_eq!(schema.frag_data_size(0), 5);
        assert_eq!(schema.eof_size(), 4);
    }

    #[test]
    fn fields_after_a_sequence_start_a_new_fragment() {
        let schema = SchemaBuilder::new()
            .begin_message("M")
            .begin_sequence("s")
            .field("x", TokenType::IntegerUnsigned)
            .end_sequence()
            .field("tail", TokenType::IntegerUnsigned)
            .end_message()
            .build()
            .unwrap();
        // 0 open, 1 len, 2 seq open, 3 x, 4 seq close, 5 tail, 6 close
        assert!(schema.is_fragment_start(5));
        assert_eq!(schema.frag_script_size(5), 2);
        assert_eq!(schema.frag_depth(5), 0);
        assert_eq!(schema.frag_data_size(5), 2);
    }

    #[test]
    fn plain_groups_stay_inside_their_fragment() {
        let schema = SchemaBuilder::new()
            .begin_message("M")
            .begin_group("g")
            .field("a", TokenType::IntegerUnsigned)
            .end_group()
            .field("b", TokenType::IntegerUnsigned)
            .end_message()
            .build()
            .unwrap();
        assert_eq!(schema.frag_script_size(0), schema.len() as i32);
        assert_eq!(schema.frag_data_size(0), 4);
    }

    #[test]
    fn multiple_messages_are_recorded() {
        let schema = SchemaBuilder::new()
            .begin_message("A")
            .field("a", TokenType::IntegerUnsigned)
            .end_message()
            .begin_message("B")
            .field("b", TokenType::LongUnsigned)
            .end_message()
            .build()
            .unwrap();
        assert_eq!(schema.message_starts(), &[0, 3]);
        assert_eq!(schema.message_id("B"), Some(3));
        assert!(schema.is_message_start(3));
        assert!(!schema.is_message_start(1));
        assert!(!schema.is_message_start(-1));
        assert_eq!(schema.message_range(0), Some((0, 3)));
    }

    #[test]
    fn rejects_messages_not_opened_by_a_template() {
        let err = SchemaBuilder::new()
            .field("loose", TokenType::IntegerUnsigned)
            .begin_message("M")
            .end_message()
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::BadMessageStart { position: 0, .. }));
    }

    #[test]
    fn rejects_unbalanced_groups() {
        let err = SchemaBuilder::new()
            .begin_message("M")
            .field("a", TokenType::IntegerUnsigned)
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::UnterminatedScript { open: 1 });

        let err = SchemaBuilder::new()
            .begin_message("M")
            .end_message()
            .end_message()
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::UnbalancedGroup { position: 2 });
    }

    #[test]
    fn rejects_sequence_without_length() {
        let err = SchemaBuilder::new()
            .begin_message("M")
            .token(Token::build(TokenType::Group, Token::GROUP_BIT_SEQ, 0), "s")
            .token(
                Token::build(TokenType::Group, Token::GROUP_BIT_SEQ | Token::GROUP_BIT_CLOSE, 0),
                "s",
            )
            .end_message()
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::UnpairedSequence { position: 1 });
    }

    #[test]
    fn simple_schema_is_one_fragment() {
        let schema = Schema::simple(&[
            ("a", TokenType::IntegerUnsigned),
            ("b", TokenType::TextUtf8),
        ])
        .unwrap();
        assert!(schema.has_simple_messages_only());
        assert_eq!(schema.message_starts(), &[0]);
        assert_eq!(schema.frag_data_size(0), 1 + 1 + 2 + 1);
        assert_eq!(schema.frag_script_size(0), 2);

        let err = Schema::simple(&[("g", TokenType::Group)]).err();
        assert_eq!(err, Some(SchemaError::GroupInSimpleSchema { position: 0 }));
    }

    #[test]
    fn raw_bytes_schema_holds_one_byte_array() {
        let schema = &*crate::SPSC::Structs::RAW_BYTES;
        assert!(schema.has_simple_messages_only());
        assert_eq!(schema.frag_data_size(0), 4);
        assert_eq!(schema.loc(0), Some(at(0, 1)));
    }
}
