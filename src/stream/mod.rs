// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Stream-side state: the append-only response buffer, a replay feeder, and fence completeness.

pub mod completeness;

pub use completeness::{is_fence_complete, position_is_complete};

/// The text received so far for one message. Append-only until cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamBuffer {
    text: String,
}

impl StreamBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_str(&mut self, chunk: &str) {
        self.text.push_str(chunk);
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Starts a new message.
    pub fn clear(&mut self) {
        self.text.clear();
    }
}

/// Replays a finished response in fixed-size chunks, standing in for a live transport.
///
/// Chunks are cut on char boundaries, so a chunk may be a few bytes longer than requested.
#[derive(Debug, Clone)]
pub struct ChunkFeeder {
    text: String,
    cursor: usize,
    chunk_bytes: usize,
}

impl ChunkFeeder {
    pub fn new(text: impl Into<String>, chunk_bytes: usize) -> Self {
        Self { text: text.into(), cursor: 0, chunk_bytes: chunk_bytes.max(1) }
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.text.len()
    }

    pub fn progress(&self) -> (usize, usize) {
        (self.cursor, self.text.len())
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    pub fn next_chunk(&mut self) -> Option<&str> {
        if self.is_finished() {
            return None;
        }

        let start = self.cursor;
        let mut end = start.saturating_add(self.chunk_bytes).min(self.text.len());
        while !self.text.is_char_boundary(end) {
            end += 1;
        }
        self.cursor = end;
        Some(&self.text[start..end])
    }

    /// Moves every remaining byte into `buffer`.
    pub fn drain_into(&mut self, buffer: &mut StreamBuffer) {
        while let Some(chunk) = self.next_chunk() {
            buffer.push_str(chunk);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ChunkFeeder, StreamBuffer};

    #[test]
    fn feeder_replays_the_whole_text_in_order() {
        let mut feeder = ChunkFeeder::new("hello world", 4);
        let mut buffer = StreamBuffer::new();
        let mut chunks = 0;
        while let Some(chunk) = feeder.next_chunk() {
            buffer.push_str(chunk);
            chunks += 1;
        }
        assert_eq!(buffer.as_str(), "hello world");
        assert_eq!(chunks, 3);
        assert!(feeder.is_finished());
    }

    #[test]
    fn feeder_cuts_on_char_boundaries() {
        let mut feeder = ChunkFeeder::new("αβγ", 1);
        assert_eq!(feeder.next_chunk(), Some("α"));
        assert_eq!(feeder.next_chunk(), Some("β"));
        assert_eq!(feeder.next_chunk(), Some("γ"));
        assert_eq!(feeder.next_chunk(), None);
    }

    #[test]
    fn rewind_restarts_replay() {
        let mut feeder = ChunkFeeder::new("abc", 8);
        let mut buffer = StreamBuffer::new();
        feeder.drain_into(&mut buffer);
        feeder.rewind();
        assert_eq!(feeder.progress(), (0, 3));
        assert_eq!(feeder.next_chunk(), Some("abc"));
    }
}
