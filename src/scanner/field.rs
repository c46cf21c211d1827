use bitflags::bitflags;

bitflags! {
    /// Classification of a field within its row.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FieldFlags: u8 {
        /// First field of its row.
        const ROW_START = 1;
        /// Last field of its row.
        const ROW_END = 1 << 1;
        /// Comment line, returned without its prefix.
        const COMMENT = 1 << 2;
        /// Enclosed in quotes, returned without them and unescaped.
        const QUOTED = 1 << 3;
        /// Only field of its row, and blank.
        const EMPTY_LINE = 1 << 4;
    }
}

macro_rules! flag_accessors {
    () => {
        /// Returns true if this is the first field of the row.
        pub fn at_row_start(&self) -> bool {
            self.flags.contains(FieldFlags::ROW_START)
        }

        /// Returns true if this is the last field of the row.
        pub fn at_row_end(&self) -> bool {
            self.flags.contains(FieldFlags::ROW_END)
        }

        /// Returns true if the field is a comment line.
        pub fn is_comment(&self) -> bool {
            self.flags.contains(FieldFlags::COMMENT)
        }

        /// Returns true if the field was quoted.
        pub fn is_quoted(&self) -> bool {
            self.flags.contains(FieldFlags::QUOTED)
        }

        /// Returns true if the field is an empty line.
        pub fn is_empty_line(&self) -> bool {
            self.flags.contains(FieldFlags::EMPTY_LINE)
        }

        /// All flags at once.
        pub fn flags(&self) -> FieldFlags {
            self.flags
        }

        /// Offset in bytes of the field in the input.
        pub fn offset(&self) -> usize {
            self.offset
        }
    };
}

/// The current field of a [`Tokenizer`](crate::Tokenizer).
///
/// The bytes live in the tokenizer's buffer and are overwritten by the next
/// call to `advance`; use [`Field::into_owned`] to keep them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    bytes: &'a [u8],
    offset: usize,
    flags: FieldFlags,
}

impl<'a> Field<'a> {
    pub(crate) fn new(bytes: &'a [u8], offset: usize, flags: FieldFlags) -> Self {
        Self {
            bytes,
            offset,
            flags,
        }
    }

    /// The field content: without separator, comment prefix or enclosing
    /// quotes, and with escaped quotes resolved.
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Copy the field out of the tokenizer's buffer.
    pub fn into_owned(self) -> FieldBuf {
        FieldBuf {
            bytes: self.bytes.to_vec(),
            offset: self.offset,
            flags: self.flags,
        }
    }

    flag_accessors!();
}

/// An owned copy of a field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldBuf {
    bytes: Vec<u8>,
    offset: usize,
    flags: FieldFlags,
}

impl FieldBuf {
    /// The field content.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take the field content.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Borrow as a [`Field`].
    pub fn as_field(&self) -> Field<'_> {
        Field::new(&self.bytes, self.offset, self.flags)
    }

    flag_accessors!();
}
