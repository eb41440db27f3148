//! # Hardware Resources
//!
//! The two physically distinct subsystems a print step needs at once.
//!
//! Each resource only records how often it was used. Driver logic lives
//! elsewhere; what matters here is that every use happens while the caller
//! holds the resource exclusively.

/// Identifies one of the two coordinated resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceId {
    /// The laser actuator.
    Laser,
    /// The motion stage.
    Stage,
}

impl ResourceId {
    /// Position in the lock hierarchy. Joint acquisition starts with rank 0.
    #[inline]
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Laser => 0,
            Self::Stage => 1,
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Laser => "laser",
            Self::Stage => "stage",
        }
    }
}

/// Laser actuator state.
#[derive(Debug, Default)]
pub struct Laser {
    pulses: u64,
}

impl Laser {
    /// Records one exposure pulse.
    #[inline]
    pub fn fire(&mut self) {
        self.pulses += 1;
    }

    /// Pulses fired so far.
    #[inline]
    #[must_use]
    pub const fn pulses(&self) -> u64 {
        self.pulses
    }
}

/// Motion stage state.
#[derive(Debug, Default)]
pub struct Stage {
    moves: u64,
}

impl Stage {
    /// Records one stage step.
    #[inline]
    pub fn step(&mut self) {
        self.moves += 1;
    }

    /// Steps taken so far.
    #[inline]
    #[must_use]
    pub const fn moves(&self) -> u64 {
        self.moves
    }
}
