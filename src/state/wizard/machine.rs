//! Step identity and wizard position

use std::fmt;

/// A wizard's steps, in order
pub trait StepId: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Every step, first to last. Never empty.
    const ALL: &'static [Self];

    /// Human-readable step title
    fn label(&self) -> &'static str;

    /// Zero-based position in [`StepId::ALL`]
    fn index(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0)
    }

    fn first() -> Self {
        Self::ALL[0]
    }

    fn last() -> Self {
        Self::ALL[Self::ALL.len() - 1]
    }

    fn following(&self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    fn preceding(&self) -> Option<Self> {
        self.index()
            .checked_sub(1)
            .and_then(|i| Self::ALL.get(i))
            .copied()
    }
}

/// Where a wizard currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position<S> {
    Step(S),
    /// Read-only review, reachable only once the last step validated
    Summary,
}

impl<S: StepId> Position<S> {
    pub fn start() -> Self {
        Position::Step(S::first())
    }

    pub fn is_summary(&self) -> bool {
        matches!(self, Position::Summary)
    }

    pub fn step(&self) -> Option<S> {
        match self {
            Position::Step(s) => Some(*s),
            Position::Summary => None,
        }
    }

    /// Position after the current step has validated
    pub fn advance(self) -> Self {
        match self {
            Position::Step(s) => s.following().map_or(Position::Summary, Position::Step),
            Position::Summary => Position::Summary,
        }
    }

    /// Position after going back; floored at the first step
    pub fn retreat(self) -> Self {
        match self {
            Position::Summary => Position::Step(S::last()),
            Position::Step(s) => Position::Step(s.preceding().unwrap_or(s)),
        }
    }
}
