//! String payload.

use std::borrow::Cow;
use std::fmt;

use super::heap::HeapPayload;
use super::Kind;

/// Byte string owned by a heap value.
///
/// Literals emitted by the compiler live in static data and are borrowed,
/// never freed. Everything computed at run time owns its buffer.
pub struct StrData {
    bytes: Cow<'static, [u8]>,
}

impl StrData {
    pub(crate) fn borrowed(bytes: &'static [u8]) -> Self {
        StrData {
            bytes: Cow::Borrowed(bytes),
        }
    }

    pub(crate) fn owned(bytes: Vec<u8>) -> Self {
        StrData {
            bytes: Cow::Owned(bytes),
        }
    }

    /// Borrow the contents. Valid as long as the owning value is alive.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the runtime frees this buffer when the string is destroyed.
    pub fn is_owned(&self) -> bool {
        matches!(self.bytes, Cow::Owned(_))
    }
}

impl HeapPayload for StrData {
    const KIND: Kind = Kind::Str;
}

impl PartialEq for StrData {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl fmt::Debug for StrData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.bytes))
    }
}
