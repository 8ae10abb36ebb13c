//! Source spans

/// A byte range in a source file, tagged with the line it starts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
    /// Line of `start` (1-indexed)
    pub line: u32,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize, line: u32) -> Self {
        Self { start, end, line }
    }

    /// Combine two spans into one covering both
    pub fn merge(self, other: Span) -> Span {
        let (first, _) = if self.start <= other.start {
            (self, other)
        } else {
            (other, self)
        };
        Span {
            start: first.start,
            end: self.end.max(other.end),
            line: first.line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_first_line() {
        let a = Span::new(10, 14, 2);
        let b = Span::new(20, 25, 3);
        assert_eq!(a.merge(b), Span::new(10, 25, 2));
        assert_eq!(b.merge(a), Span::new(10, 25, 2));
    }
}
