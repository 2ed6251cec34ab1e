//! Simulated incremental delivery of an answer.
//!
//! The full answer is already known when rendering starts; [`streamify`]
//! replays it as a sequence of growing prefixes, one per character, so the
//! chat window can show a typing effect.

use futures::Stream;
use std::iter::FusedIterator;

/// Returns the prefixes of `answer`, shortest first.
///
/// The sequence has one item per `char`; an empty answer yields nothing.
pub fn streamify(answer: impl Into<String>) -> Prefixes {
    Prefixes::new(answer.into())
}

/// Same sequence as [`streamify`], exposed as a `futures::Stream`.
pub fn prefix_stream(answer: impl Into<String>) -> impl Stream<Item = String> {
    futures::stream::iter(streamify(answer))
}

/// Owning iterator over the prefixes of an answer.
///
/// Consumed once; it cannot be restarted.
#[derive(Debug, Clone)]
pub struct Prefixes {
    answer: String,
    /// Byte offset just past the last emitted prefix.
    pos: usize,
    remaining: usize,
}

impl Prefixes {
    fn new(answer: String) -> Self {
        let remaining = answer.chars().count();
        Self {
            answer,
            pos: 0,
            remaining,
        }
    }

    /// The complete answer this sequence ends with.
    pub fn full_text(&self) -> &str {
        &self.answer
    }
}

impl Iterator for Prefixes {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let ch = self.answer[self.pos..].chars().next()?;
        self.pos += ch.len_utf8();
        self.remaining -= 1;
        Some(self.answer[..self.pos].to_string())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Prefixes {}

impl FusedIterator for Prefixes {}
