//! Doubly-linked ordered sequence backed by an arena.
//!
//! Entries are addressed by [`Handle`]s that stay valid for the lifetime of
//! the sequence. Detaching an entry keeps its slot, so it can be spliced back
//! in elsewhere without reallocating.

use crate::error::OrderError;

/// Stable position of an entry inside a [`Sequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(usize);

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    prev: Option<Handle>,
    next: Option<Handle>,
    linked: bool,
}

#[derive(Debug, Clone)]
pub struct Sequence<T> {
    entries: Vec<Entry<T>>,
    start: Option<Handle>,
    end: Option<Handle>,
    len: usize,
}

impl<T> Default for Sequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Sequence<T> {
    pub fn new() -> Self {
        Self { entries: Vec::new(), start: None, end: None, len: 0 }
    }

    /// Number of linked entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn front(&self) -> Option<Handle> {
        self.start
    }

    pub fn back(&self) -> Option<Handle> {
        self.end
    }

    pub fn next(&self, h: Handle) -> Option<Handle> {
        self.entries.get(h.0).and_then(|e| e.next)
    }

    pub fn prev(&self, h: Handle) -> Option<Handle> {
        self.entries.get(h.0).and_then(|e| e.prev)
    }

    /// Value behind a handle, linked or detached.
    pub fn get(&self, h: Handle) -> Option<&T> {
        self.entries.get(h.0).map(|e| &e.value)
    }

    pub fn is_linked(&self, h: Handle) -> bool {
        self.entries.get(h.0).is_some_and(|e| e.linked)
    }

    /// Reserves room for `additional` more entries, so the next pushes or
    /// inserts cannot fail on allocation.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), OrderError> {
        self.entries.try_reserve(additional)?;
        Ok(())
    }

    pub fn push_back(&mut self, value: T) -> Result<Handle, OrderError> {
        let h = self.alloc(value)?;
        self.link_back(h);
        Ok(h)
    }

    /// Allocates `value` and links it directly before `anchor`.
    ///
    /// Panics if `anchor` is not linked in this sequence.
    pub fn insert_before(&mut self, anchor: Handle, value: T) -> Result<Handle, OrderError> {
        self.assert_member(anchor);
        let h = self.alloc(value)?;
        self.splice_before(anchor, h);
        Ok(h)
    }

    /// Allocates `value` and links it directly after `anchor`.
    ///
    /// Panics if `anchor` is not linked in this sequence.
    pub fn insert_after(&mut self, anchor: Handle, value: T) -> Result<Handle, OrderError> {
        self.assert_member(anchor);
        let h = self.alloc(value)?;
        self.splice_after(anchor, h);
        Ok(h)
    }

    /// Links a detached entry directly before `anchor`.
    pub fn splice_before(&mut self, anchor: Handle, h: Handle) {
        self.assert_member(anchor);
        self.assert_detached(h);

        let prev = self.entries[anchor.0].prev;
        match prev {
            Some(p) => self.entries[p.0].next = Some(h),
            None => self.start = Some(h),
        }
        self.entries[anchor.0].prev = Some(h);

        let entry = &mut self.entries[h.0];
        entry.prev = prev;
        entry.next = Some(anchor);
        entry.linked = true;
        self.len += 1;
    }

    /// Links a detached entry directly after `anchor`.
    pub fn splice_after(&mut self, anchor: Handle, h: Handle) {
        self.assert_member(anchor);
        self.assert_detached(h);

        let next = self.entries[anchor.0].next;
        match next {
            Some(n) => self.entries[n.0].prev = Some(h),
            None => self.end = Some(h),
        }
        self.entries[anchor.0].next = Some(h);

        let entry = &mut self.entries[h.0];
        entry.prev = Some(anchor);
        entry.next = next;
        entry.linked = true;
        self.len += 1;
    }

    /// Detaches `h` without destroying it. Its slot can be spliced back in.
    pub fn remove(&mut self, h: Handle) {
        self.assert_member(h);

        let (prev, next) = {
            let entry = &mut self.entries[h.0];
            entry.linked = false;
            (entry.prev.take(), entry.next.take())
        };
        match prev {
            Some(p) => self.entries[p.0].next = next,
            None => self.start = next,
        }
        match next {
            Some(n) => self.entries[n.0].prev = prev,
            None => self.end = prev,
        }
        self.len -= 1;
    }

    /// Relocates a linked entry to sit directly before `anchor`.
    pub fn move_before(&mut self, anchor: Handle, h: Handle) {
        assert_ne!(anchor, h, "cannot move an entry before itself");
        self.assert_member(anchor);
        self.remove(h);
        self.splice_before(anchor, h);
    }

    /// Detaches the last entry and returns its handle.
    pub fn pop_back(&mut self) -> Option<Handle> {
        let h = self.end?;
        self.remove(h);
        Some(h)
    }

    /// Value at position `n`, counted from the front.
    pub fn nth(&self, n: usize) -> Option<&T> {
        if n >= self.len {
            return None;
        }
        if n == self.len - 1 {
            return self.end.and_then(|h| self.get(h));
        }
        self.iter().nth(n).map(|(_, v)| v)
    }

    /// 0-based position of a linked entry. Walks from the front.
    pub fn position(&self, h: Handle) -> Option<usize> {
        if !self.is_linked(h) {
            return None;
        }
        self.iter().position(|(cur, _)| cur == h)
    }

    /// Fresh front-to-back traversal.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { seq: self, cursor: self.start, remaining: self.len }
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.iter().map(|(_, v)| v)
    }

    fn alloc(&mut self, value: T) -> Result<Handle, OrderError> {
        self.entries.try_reserve(1)?;
        let h = Handle(self.entries.len());
        self.entries.push(Entry { value, prev: None, next: None, linked: false });
        Ok(h)
    }

    fn link_back(&mut self, h: Handle) {
        match self.end {
            Some(end) => self.splice_after(end, h),
            None => {
                let entry = &mut self.entries[h.0];
                entry.linked = true;
                self.start = Some(h);
                self.end = Some(h);
                self.len = 1;
            }
        }
    }

    fn assert_member(&self, h: Handle) {
        assert!(self.is_linked(h), "{h:?} is not a member of the sequence");
    }

    fn assert_detached(&self, h: Handle) {
        assert!(
            h.0 < self.entries.len() && !self.entries[h.0].linked,
            "{h:?} is not a detached entry of the sequence"
        );
    }
}

impl<T> std::ops::Index<Handle> for Sequence<T> {
    type Output = T;

    fn index(&self, h: Handle) -> &T {
        &self.entries[h.0].value
    }
}

pub struct Iter<'a, T> {
    seq: &'a Sequence<T>,
    cursor: Option<Handle>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (Handle, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let h = self.cursor?;
        let seq = self.seq;
        let entry = &seq.entries[h.0];
        self.cursor = entry.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some((h, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a Sequence<T> {
    type Item = (Handle, &'a T);
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
