//! First pass of every encode: record sizes and the offsets derived from them.
//! Emission code only reads these tables.

/// Byte range of one record, relative to the payload it chains through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub start: usize,
    pub end: usize,
}

/// Offset table for an offset-chained record stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RecordLayout {
    pub spans: Vec<Span>,
    pub len: usize,
}

impl RecordLayout {
    pub fn from_sizes(sizes: impl IntoIterator<Item = usize>) -> Self {
        let mut spans = Vec::new();
        let mut offset = 0;
        for size in sizes {
            spans.push(Span {
                start: offset,
                end: offset + size,
            });
            offset += size;
        }
        Self { spans, len: offset }
    }
}
