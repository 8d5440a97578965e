//! Types related to source files.

use std::fmt;
use std::ops::Range;

/// File identifier, as handed out by the driver's file database.
pub type FileId = usize;

/// Byte offsets into source files.
pub type BytePos = u32;

/// The maximum length of a source file. Keeps byte offsets within [`BytePos`].
pub const MAX_SOURCE_LEN: usize = u32::MAX as usize;

/// Byte ranges in source files.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct ByteRange {
    file_id: FileId,
    start: BytePos,
    end: BytePos,
}

impl fmt::Debug for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ByteRange({}, {}..{})",
            self.file_id, self.start, self.end
        )
    }
}

impl ByteRange {
    pub const fn new(file_id: FileId, start: BytePos, end: BytePos) -> ByteRange {
        ByteRange {
            file_id,
            start,
            end,
        }
    }

    pub const fn file_id(&self) -> FileId {
        self.file_id
    }

    pub const fn start(&self) -> BytePos {
        self.start
    }

    pub const fn end(&self) -> BytePos {
        self.end
    }
}

impl From<ByteRange> for Range<usize> {
    fn from(range: ByteRange) -> Self {
        (range.start as usize)..(range.end as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// `ByteRange` is stored on every tree node. Ensure it doesn't grow accidentally.
    fn byte_range_size() {
        assert_eq!(std::mem::size_of::<ByteRange>(), 16);
    }

    #[test]
    fn into_std_range() {
        let range: Range<usize> = ByteRange::new(3, 2, 9).into();
        assert_eq!(range, 2..9);
    }
}
