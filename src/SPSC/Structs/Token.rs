// Token script encoding.
//
// Layout of one 32-bit token:
//   bit 31      always set, marks the word as a token
//   bits 26..30 type
//   bits 20..25 operator
//   bits 0..19  instance (field index)

pub const SHIFT_TYPE: u32 = 26;
pub const SHIFT_OPER: u32 = 20;
pub const MASK_TYPE: u32 = 0x1F;
pub const MASK_OPER: u32 = 0x3F;
pub const MASK_INSTANCE: u32 = 0xF_FFFF;

const TOKEN_BIT: u32 = 0x8000_0000;

/// Group operator bit: this token closes its group.
pub const GROUP_BIT_CLOSE: u32 = 0x01;
/// Group operator bit: the group is a message template.
pub const GROUP_BIT_TEMPL: u32 = 0x02;
/// Group operator bit: the group is the body of a sequence.
pub const GROUP_BIT_SEQ: u32 = 0x04;

/// Type field of a token.
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenType {
    IntegerUnsigned = 0x00,
    IntegerUnsignedOptional = 0x01,
    IntegerSigned = 0x02,
    IntegerSignedOptional = 0x03,
    LongUnsigned = 0x04,
    LongUnsignedOptional = 0x05,
    LongSigned = 0x06,
    LongSignedOptional = 0x07,
    TextAscii = 0x08,
    TextAsciiOptional = 0x09,
    TextUtf8 = 0x0A,
    TextUtf8Optional = 0x0B,
    Decimal = 0x0C,
    DecimalOptional = 0x0D,
    ByteArray = 0x0E,
    ByteArrayOptional = 0x0F,
    Group = 0x10,
    GroupLength = 0x14,
    Dictionary = 0x18,
}

impl TokenType {
    pub fn from_bits(bits: u32) -> Option<Self> {
        use TokenType::*;
        Some(match bits {
            0x00 => IntegerUnsigned,
            0x01 => IntegerUnsignedOptional,
            0x02 => IntegerSigned,
            0x03 => IntegerSignedOptional,
            0x04 => LongUnsigned,
            0x05 => LongUnsignedOptional,
            0x06 => LongSigned,
            0x07 => LongSignedOptional,
            0x08 => TextAscii,
            0x09 => TextAsciiOptional,
            0x0A => TextUtf8,
            0x0B => TextUtf8Optional,
            0x0C => Decimal,
            0x0D => DecimalOptional,
            0x0E => ByteArray,
            0x0F => ByteArrayOptional,
            0x10 => Group,
            0x14 => GroupLength,
            0x18 => Dictionary,
            _ => return None,
        })
    }

    /// Number of structured words a value of this type occupies in a fragment.
    pub fn data_words(self) -> i32 {
        use TokenType::*;
        match self {
            IntegerUnsigned | IntegerUnsignedOptional | IntegerSigned | IntegerSignedOptional => 1,
            LongUnsigned | LongUnsignedOptional | LongSigned | LongSignedOptional => 2,
            // relative byte position + length
            TextAscii | TextAsciiOptional | TextUtf8 | TextUtf8Optional => 2,
            ByteArray | ByteArrayOptional => 2,
            // exponent + mantissa high + mantissa low
            Decimal | DecimalOptional => 3,
            GroupLength => 1,
            Group | Dictionary => 0,
        }
    }

    /// True for types that carry a value (everything except group structure and dictionaries).
    pub fn is_field(self) -> bool {
        !matches!(self, TokenType::Group | TokenType::GroupLength | TokenType::Dictionary)
    }
}

/// Build a token from its parts.
pub fn build(token_type: TokenType, oper: u32, instance: u32) -> i32 {
    (TOKEN_BIT
        | ((token_type as u32 & MASK_TYPE) << SHIFT_TYPE)
        | ((oper & MASK_OPER) << SHIFT_OPER)
        | (instance & MASK_INSTANCE)) as i32
}

#[inline]
pub fn extract_type(token: i32) -> u32 {
    ((token as u32) >> SHIFT_TYPE) & MASK_TYPE
}

#[inline]
pub fn extract_oper(token: i32) -> u32 {
    ((token as u32) >> SHIFT_OPER) & MASK_OPER
}

#[inline]
pub fn extract_instance(token: i32) -> u32 {
    (token as u32) & MASK_INSTANCE
}

#[inline]
pub fn token_type(token: i32) -> Option<TokenType> {
    TokenType::from_bits(extract_type(token))
}

#[inline]
pub fn is_group(token: i32) -> bool {
    extract_type(token) == TokenType::Group as u32
}

/// Group and group-length tokens share the 0b1x0xx pattern; fields never match it.
#[inline]
pub fn is_group_or_length(token: i32) -> bool {
    (token as u32 & (0x1B << SHIFT_TYPE)) == (0x10 << SHIFT_TYPE)
}

#[inline]
pub fn is_group_length(token: i32) -> bool {
    extract_type(token) == TokenType::GroupLength as u32
}

#[inline]
pub fn is_group_open(token: i32) -> bool {
    is_group(token) && extract_oper(token) & GROUP_BIT_CLOSE == 0
}

#[inline]
pub fn is_group_close(token: i32) -> bool {
    is_group(token) && extract_oper(token) & GROUP_BIT_CLOSE != 0
}

#[inline]
pub fn is_template_open(token: i32) -> bool {
    is_group_open(token) && extract_oper(token) & GROUP_BIT_TEMPL != 0
}

#[inline]
pub fn is_sequence_open(token: i32) -> bool {
    is_group_open(token) && extract_oper(token) & GROUP_BIT_SEQ != 0
}

#[inline]
pub fn is_sequence_close(token: i32) -> bool {
    is_group_close(token) && extract_oper(token) & GROUP_BIT_SEQ != 0
}

/// Human readable rendering used in diagnostics.
pub fn describe(token: i32) -> String {
    let kind = match token_type(token) {
        Some(t) => format!("{t:?}"),
        None => format!("Unknown(0x{:02x})", extract_type(token)),
    };
    let mut flags = String::new();
    if is_group(token) {
        let oper = extract_oper(token);
        if oper & GROUP_BIT_CLOSE != 0 {
            flags.push_str(":Close");
        } else {
            flags.push_str(":Open");
        }
        if oper & GROUP_BIT_TEMPL != 0 {
            flags.push_str(":Templ");
        }
        if oper & GROUP_BIT_SEQ != 0 {
            flags.push_str(":Seq");
        }
    }
    format!("{kind}{flags}/{}", extract_instance(token))
}
