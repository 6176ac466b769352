//! Bounded bookkeeping for items rewritten by the BER to DER pass
//!
//! Every constructed item is opened while its content is scanned. Only
//! those whose DER header or content differs from the input leave a
//! record behind: indefinite-length items, merged constructed strings,
//! non-minimal length forms and their ancestors.

use asn1tpl_core::{Asn1Error, Asn1Result};

use crate::tlv::length_size;

/// Maximum nesting of open indefinite-length items
pub const MAX_INDEF_DEPTH: usize = 16;

/// Maximum number of rewritten items in one input
pub const MAX_INDEF_ITEMS: usize = 128;

/// Maximum nesting of open constructed items of either length form
pub const MAX_NESTING: usize = 64;

/// One rewritten item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndefItem {
    /// Offset of the item's first identifier byte
    pub start: usize,
    /// Number of identifier bytes
    pub tag_len: usize,
    /// Nesting among open constructed items, 0 for the outermost
    pub depth: usize,
    /// Content length once rewritten in definite form
    pub content_len: usize,
    /// Unused bits of a merged BIT STRING's final fragment
    pub unused_bits: u8,
}

impl IndefItem {
    /// Size of the rewritten definite-length header
    pub fn header_len(&self) -> usize {
        self.tag_len + length_size(self.content_len)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct OpenItem {
    start: usize,
    tag_len: usize,
    /// Header size as read; `None` for the indefinite form
    header_len: Option<usize>,
    /// Content end of a definite item, else the enclosing bound
    bound: usize,
    content_len: usize,
    changed: bool,
    unused_bits: u8,
}

/// Fixed-capacity record list with a stack of open items
#[derive(Debug)]
pub struct IndefItems {
    items: [IndefItem; MAX_INDEF_ITEMS],
    count: usize,
    open: [OpenItem; MAX_NESTING],
    depth: usize,
    indefinite: usize,
}

impl IndefItems {
    pub fn new() -> Self {
        Self {
            items: [IndefItem::default(); MAX_INDEF_ITEMS],
            count: 0,
            open: [OpenItem::default(); MAX_NESTING],
            depth: 0,
            indefinite: 0,
        }
    }

    /// Open an indefinite-length item whose content must end before `bound`
    pub fn push(&mut self, start: usize, tag_len: usize, bound: usize) -> Asn1Result<()> {
        if self.indefinite == MAX_INDEF_DEPTH {
            return Err(Asn1Error::ResourceExhausted(format!(
                "indefinite-length items nested deeper than {}",
                MAX_INDEF_DEPTH
            )));
        }
        self.open_item(OpenItem {
            start,
            tag_len,
            header_len: None,
            bound,
            changed: true,
            ..Default::default()
        })?;
        self.indefinite += 1;
        Ok(())
    }

    /// Open a definite-length item whose content ends at `end`
    pub fn push_definite(
        &mut self,
        start: usize,
        tag_len: usize,
        header_len: usize,
        end: usize,
    ) -> Asn1Result<()> {
        self.open_item(OpenItem {
            start,
            tag_len,
            header_len: Some(header_len),
            bound: end,
            ..Default::default()
        })
    }

    fn open_item(&mut self, item: OpenItem) -> Asn1Result<()> {
        if self.depth == MAX_NESTING {
            return Err(Asn1Error::ResourceExhausted(format!(
                "constructed items nested deeper than {}",
                MAX_NESTING
            )));
        }
        self.open[self.depth] = item;
        self.depth += 1;
        Ok(())
    }

    fn top(&self) -> Option<&OpenItem> {
        self.open[..self.depth].last()
    }

    /// End of the innermost open item's content, or `input_len` at top level
    pub fn bound(&self, input_len: usize) -> usize {
        self.top().map_or(input_len, |item| item.bound)
    }

    /// Whether the innermost open item awaits an End-of-Content
    pub fn top_is_indefinite(&self) -> bool {
        self.top().is_some_and(|item| item.header_len.is_none())
    }

    /// Add `len` rewritten bytes to the innermost open item's content
    ///
    /// `changed` marks bytes that differ from the input.
    pub fn add_data(&mut self, len: usize, changed: bool) -> Asn1Result<()> {
        let Some(top) = self.depth.checked_sub(1) else {
            return Ok(());
        };
        let item = &mut self.open[top];
        item.content_len = item.content_len.checked_add(len).ok_or_else(|| {
            Asn1Error::ResourceExhausted("content length overflows".to_string())
        })?;
        item.changed |= changed;
        Ok(())
    }

    /// Mark the innermost item as a merged constructed string
    pub fn set_merged(&mut self, unused_bits: u8) {
        if let Some(top) = self.depth.checked_sub(1) {
            self.open[top].changed = true;
            self.open[top].unused_bits = unused_bits;
        }
    }

    /// Close every definite item whose content ends at `idx`
    pub fn close_definite(&mut self, idx: usize) -> Asn1Result<()> {
        while self
            .top()
            .is_some_and(|item| item.header_len.is_some() && item.bound == idx)
        {
            self.pop()?;
        }
        Ok(())
    }

    /// Close the innermost item, adding its rewritten size to its parent
    pub fn pop(&mut self) -> Asn1Result<()> {
        let top = self.depth.checked_sub(1).ok_or_else(|| {
            Asn1Error::InvalidEncoding("End-of-Content without open item".to_string())
        })?;
        let closed = self.open[top];
        self.depth = top;
        if closed.header_len.is_none() {
            self.indefinite -= 1;
        }
        let record = IndefItem {
            start: closed.start,
            tag_len: closed.tag_len,
            depth: top,
            content_len: closed.content_len,
            unused_bits: closed.unused_bits,
        };
        let rewritten = closed.changed || closed.header_len != Some(record.header_len());
        if rewritten {
            if self.count == MAX_INDEF_ITEMS {
                return Err(Asn1Error::ResourceExhausted(format!(
                    "more than {} rewritten items",
                    MAX_INDEF_ITEMS
                )));
            }
            self.items[self.count] = record;
            self.count += 1;
        }
        self.add_data(record.header_len() + record.content_len, rewritten)
    }

    /// Order the records by position once scanning is done
    pub fn finish(&mut self) {
        self.items[..self.count].sort_unstable_by_key(|item| item.start);
    }

    /// Record of the item starting at `start`, after [`finish`](Self::finish)
    pub fn find(&self, start: usize) -> Option<&IndefItem> {
        let records = &self.items[..self.count];
        records
            .binary_search_by_key(&start, |item| item.start)
            .ok()
            .map(|n| &records[n])
    }

    pub fn get(&self, n: usize) -> Option<&IndefItem> {
        self.items[..self.count].get(n)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether any item is still open
    pub fn has_open(&self) -> bool {
        self.depth > 0
    }
}

impl Default for IndefItems {
    fn default() -> Self {
        Self::new()
    }
}
