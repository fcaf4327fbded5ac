//! Code fence tracking for line-based preprocessing.
//!
//! Container markers (`:::`) inside fenced code blocks are content, not
//! syntax, so the container pass needs to know when it is inside a fence.

/// Tracks code fence state during line-by-line processing.
///
/// The closing fence must use the same character as the opening fence and
/// be at least as long.
#[derive(Debug, Default)]
pub(crate) struct FenceTracker {
    fence_char: Option<char>,
    fence_len: usize,
}

impl FenceTracker {
    pub(crate) fn in_fence(&self) -> bool {
        self.fence_char.is_some()
    }

    /// Update fence state for a line. Returns `true` for fence markers.
    pub(crate) fn update(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start();

        match self.fence_char {
            Some(fence_char) => {
                if is_closing_fence(trimmed, fence_char, self.fence_len) {
                    self.fence_char = None;
                    self.fence_len = 0;
                    return true;
                }
                false
            }
            None => {
                if let Some((ch, len)) = detect_fence(trimmed) {
                    self.fence_char = Some(ch);
                    self.fence_len = len;
                    return true;
                }
                false
            }
        }
    }
}

fn detect_fence(trimmed: &str) -> Option<(char, usize)> {
    let first = trimmed.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }
    let count = trimmed.chars().take_while(|&c| c == first).count();
    (count >= 3).then_some((first, count))
}

fn is_closing_fence(trimmed: &str, expected: char, min_len: usize) -> bool {
    if !trimmed.starts_with(expected) {
        return false;
    }
    let count = trimmed.chars().take_while(|&c| c == expected).count();
    count >= min_len && trimmed[count..].chars().all(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backtick_fence() {
        let mut tracker = FenceTracker::default();
        assert!(tracker.update("```vue"));
        assert!(tracker.in_fence());
        assert!(!tracker.update("::: warning"));
        assert!(tracker.in_fence());
        assert!(tracker.update("```"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_shorter_fence_does_not_close() {
        let mut tracker = FenceTracker::default();
        tracker.update("````md");
        assert!(!tracker.update("```"));
        assert!(tracker.in_fence());
        assert!(tracker.update("````"));
    }

    #[test]
    fn test_mismatched_char_does_not_close() {
        let mut tracker = FenceTracker::default();
        tracker.update("~~~");
        assert!(!tracker.update("```"));
        assert!(tracker.in_fence());
    }
}
