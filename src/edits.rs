//! Edit descriptions and offset translation across an edit batch
//!
//! The parser walks the *new* document while the previous tree is indexed by
//! *old* offsets. [`OffsetMapper`] bridges the two: it maps a post-edit
//! offset back to its pre-edit equivalent and bounds how far the parse can
//! run before the next edited region begins.

use crate::length::Length;

/// One replacement: old-document range `[start, old_end)` replaced by text
/// of length `new_length`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextEdit {
    pub start: Length,
    pub old_end: Length,
    pub new_length: Length,
}

impl TextEdit {
    pub fn new(start: Length, old_end: Length, new_length: Length) -> Self {
        debug_assert!(start <= old_end, "edit range is inverted");
        TextEdit {
            start,
            old_end,
            new_length,
        }
    }
}

/// An edit with its new-document coordinates resolved.
#[derive(Clone, Copy, Debug)]
struct MappedEdit {
    old_start: Length,
    old_end: Length,
    new_start: Length,
    new_end: Length,
}

/// Translates monotonically increasing new-document offsets against a batch
/// of edits.
pub(crate) struct OffsetMapper {
    edits: Vec<MappedEdit>,
    /// First edit not yet fully behind the scan.
    next: usize,
    last_query: Length,
}

impl OffsetMapper {
    /// Hosts deliver batches in reverse document order so earlier offsets
    /// stay valid while they apply them; accept either order and scan left
    /// to right. Overlapping or unsorted batches are programmer error.
    pub fn new(edits: &[TextEdit]) -> Self {
        let ascending: Box<dyn Iterator<Item = &TextEdit>> =
            if edits.len() >= 2 && edits[0].start > edits[edits.len() - 1].start {
                Box::new(edits.iter().rev())
            } else {
                Box::new(edits.iter())
            };

        let mut mapped = Vec::with_capacity(edits.len());
        let mut old_pos = Length::ZERO;
        let mut new_pos = Length::ZERO;
        for edit in ascending {
            assert!(edit.start <= edit.old_end, "edit range is inverted");
            assert!(
                old_pos <= edit.start,
                "edits must be sorted and non-overlapping"
            );
            let new_start = new_pos + Length::diff_non_neg(old_pos, edit.start);
            let new_end = new_start + edit.new_length;
            mapped.push(MappedEdit {
                old_start: edit.start,
                old_end: edit.old_end,
                new_start,
                new_end,
            });
            old_pos = edit.old_end;
            new_pos = new_end;
        }
        OffsetMapper {
            edits: mapped,
            next: 0,
            last_query: Length::ZERO,
        }
    }

    /// Pre-edit offset equivalent to `offset`. Inside a replacement region
    /// the whole region collapses to the edit's old start.
    pub fn offset_before_change(&mut self, offset: Length) -> Length {
        self.advance(offset);
        if let Some(edit) = self.edits.get(self.next) {
            if edit.new_start <= offset {
                return edit.old_start;
            }
        }
        match self.next.checked_sub(1).map(|i| &self.edits[i]) {
            // Untouched prefix before the first edit.
            None => offset,
            Some(prev) => prev.old_end + Length::diff_non_neg(prev.new_end, offset),
        }
    }

    /// Distance from `offset` to the start of the next edited region, `ZERO`
    /// inside one, `None` when no edit remains ahead.
    pub fn distance_to_next_change(&mut self, offset: Length) -> Option<Length> {
        self.advance(offset);
        let edit = self.edits.get(self.next)?;
        Some(Length::diff_non_neg(offset, edit.new_start))
    }

    fn advance(&mut self, offset: Length) {
        debug_assert!(
            self.last_query <= offset,
            "mapper offsets must be monotonic"
        );
        self.last_query = offset;
        while let Some(edit) = self.edits.get(self.next) {
            if edit.new_end <= offset {
                self.next += 1;
            } else {
                break;
            }
        }
    }
}
