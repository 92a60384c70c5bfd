//! Span geometry shared by every text-backed entity.
//!
//! A [`Span`] is a half-open `[start, end)` range of character offsets into the
//! document text. Mentions, sentences, paragraphs and sections all expose the
//! same interval contract through [`Spannable`].

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A `[start, end)` offset range into document text.
///
/// Deserialized spans go through [`Span::try_new`], so inverted offsets from
/// matcher output are rejected at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSpan")]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

#[derive(Deserialize)]
struct RawSpan {
    start: usize,
    end: usize,
}

impl TryFrom<RawSpan> for Span {
    type Error = String;

    fn try_from(raw: RawSpan) -> Result<Self, Self::Error> {
        Span::try_new(raw.start, raw.end)
            .ok_or_else(|| format!("span start {} after end {}", raw.start, raw.end))
    }
}

impl Span {
    /// Create a span from offsets already known to be ordered.
    ///
    /// `start <= end` is only checked in debug builds; use [`Span::try_new`]
    /// for offsets that come from outside the crate.
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start {} after end {}", start, end);
        Self { start, end }
    }

    /// Create a span, returning `None` when `start > end`.
    pub fn try_new(start: usize, end: usize) -> Option<Self> {
        if start <= end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// Number of characters covered.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Slice the covered text out of `source`, where `source` begins at `base`.
    ///
    /// Returns `None` if the span falls outside `source` or splits a char.
    pub fn slice<'s>(&self, source: &'s str, base: usize) -> Option<&'s str> {
        let start = self.start.checked_sub(base)?;
        let end = self.end.checked_sub(base)?;
        source.get(start..end)
    }

    /// Ordered, deduplicated union of several span lists.
    pub fn union_sorted<'a, I>(spans: I) -> Vec<Span>
    where
        I: IntoIterator<Item = &'a Span>,
    {
        let mut all: Vec<Span> = spans.into_iter().copied().collect();
        all.sort_by(|a, b| a.compare_span(b));
        all.dedup();
        all
    }
}

/// Interval contract over anything with a start and end offset.
pub trait Spannable {
    fn start(&self) -> usize;
    fn end(&self) -> usize;

    /// `other` lies entirely within `self`.
    fn contains<S: Spannable + ?Sized>(&self, other: &S) -> bool {
        other.start() >= self.start() && other.end() <= self.end()
    }

    /// Touching boundaries (`end == start`) count as intersecting.
    fn intersects<S: Spannable + ?Sized>(&self, other: &S) -> bool {
        !(self.end() < other.start() || other.end() < self.start())
    }

    /// `self` ends at or before `other` starts.
    fn before<S: Spannable + ?Sized>(&self, other: &S) -> bool {
        self.end() <= other.start()
    }

    /// `other` ends at or before `self` starts.
    fn after<S: Spannable + ?Sized>(&self, other: &S) -> bool {
        other.end() <= self.start()
    }

    /// Order by start, then end. Equal spans compare `Equal`; sorted containers
    /// that dedupe on equality need their own tiebreaker.
    fn compare_span<S: Spannable + ?Sized>(&self, other: &S) -> Ordering {
        self.start()
            .cmp(&other.start())
            .then_with(|| self.end().cmp(&other.end()))
    }

    fn as_span(&self) -> Span {
        Span::new(self.start(), self.end())
    }
}

impl Spannable for Span {
    fn start(&self) -> usize {
        self.start
    }

    fn end(&self) -> usize {
        self.end
    }
}

impl PartialOrd for Span {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Span {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare_span(other)
    }
}
