// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::Duration;

/// Width of the highlighted window, in chars.
const SHIMMER_WIDTH: usize = 3;

/// Stand-in for a diagram whose fence has not closed yet.
///
/// Stateless: the same label, period and elapsed time always give the same frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    label: String,
    period: Duration,
}

/// One animation frame, split around the highlighted window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShimmerFrame<'a> {
    pub before: &'a str,
    pub lit: &'a str,
    pub after: &'a str,
}

impl Placeholder {
    pub fn new(label: impl Into<String>, period: Duration) -> Self {
        Self { label: label.into(), period }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Char index where the highlight starts. One sweep covers the label plus the window so the
    /// highlight enters and leaves cleanly.
    pub fn highlight_at(&self, elapsed: Duration) -> usize {
        let span = self.label.chars().count() + SHIMMER_WIDTH;
        let period = self.period.as_nanos();
        if period == 0 {
            return 0;
        }
        let phase = elapsed.as_nanos() % period;
        usize::try_from(phase * span as u128 / period).unwrap_or(0)
    }

    pub fn frame(&self, elapsed: Duration) -> ShimmerFrame<'_> {
        // The window trails the highlight position so it slides in from the left.
        let end = self.highlight_at(elapsed);
        let start = end.saturating_sub(SHIMMER_WIDTH);
        let start_byte = self.byte_offset(start);
        let end_byte = self.byte_offset(end);
        ShimmerFrame {
            before: &self.label[..start_byte],
            lit: &self.label[start_byte..end_byte],
            after: &self.label[end_byte..],
        }
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.label.char_indices().nth(chars).map_or(self.label.len(), |(idx, _)| idx)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rstest::rstest;

    use super::{Placeholder, ShimmerFrame};

    fn placeholder() -> Placeholder {
        Placeholder::new("Generating diagram…", Duration::from_secs(1))
    }

    #[test]
    fn frames_are_pure_functions_of_elapsed_time() {
        let p = placeholder();
        let at = Duration::from_millis(420);
        assert_eq!(p.frame(at), p.frame(at));
        assert_eq!(p.frame(at), p.frame(at + Duration::from_secs(3)));
    }

    #[rstest]
    #[case(0, 0)]
    #[case(500, 11)]
    #[case(999, 21)]
    fn highlight_sweeps_once_per_period(#[case] millis: u64, #[case] expected: usize) {
        assert_eq!(placeholder().highlight_at(Duration::from_millis(millis)), expected);
    }

    #[test]
    fn frame_pieces_reassemble_the_label() {
        let p = placeholder();
        for millis in (0..1000).step_by(37) {
            let ShimmerFrame { before, lit, after } = p.frame(Duration::from_millis(millis));
            assert_eq!(format!("{before}{lit}{after}"), p.label());
            assert!(lit.chars().count() <= 3);
        }
    }

    #[test]
    fn multibyte_labels_split_on_char_boundaries() {
        let p = Placeholder::new("正在生成图表…", Duration::from_secs(1));
        let frame = p.frame(Duration::from_millis(500));
        assert_eq!(frame.lit, "生成图");
    }

    #[test]
    fn zero_period_never_animates() {
        let p = Placeholder::new("x", Duration::ZERO);
        assert_eq!(p.highlight_at(Duration::from_secs(5)), 0);
        assert_eq!(p.frame(Duration::from_secs(5)).lit, "");
    }
}
