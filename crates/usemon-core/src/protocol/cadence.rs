//! Flush cadence.

use std::fmt;
use std::time::Duration;

/// Which flush cycle a tick, snapshot, or reset belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Cadence {
    /// Global cadence (`monitoring.step`) shared by metrics without an override.
    #[default]
    Default,
    /// Per-metric override, in seconds.
    Every(u64),
    /// Shutdown flush: every metric regardless of its cadence.
    All,
}

impl Cadence {
    /// Cadence of a metric given its optional interval override.
    pub fn for_interval(secs: Option<u64>) -> Self {
        match secs {
            Some(s) => Cadence::Every(s),
            None => Cadence::Default,
        }
    }

    /// Whether a metric flushed on `metric` participates in a tick for `self`.
    pub fn includes(self, metric: Cadence) -> bool {
        match self {
            Cadence::All => true,
            _ => self == metric,
        }
    }

    /// Length of the activity window for this cadence.
    /// `Default` and `All` use the global interval.
    pub fn window(self, default_secs: u64) -> Duration {
        match self {
            Cadence::Every(s) => Duration::from_secs(s),
            Cadence::Default | Cadence::All => Duration::from_secs(default_secs),
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cadence::Default => f.write_str("default"),
            Cadence::Every(s) => write!(f, "every:{s}s"),
            Cadence::All => f.write_str("all"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_includes_every_cadence() {
        assert!(Cadence::All.includes(Cadence::Default));
        assert!(Cadence::All.includes(Cadence::Every(5)));
        assert!(!Cadence::Default.includes(Cadence::Every(60)));
        assert!(!Cadence::Every(5).includes(Cadence::Every(10)));
        assert!(Cadence::Every(5).includes(Cadence::Every(5)));
    }

    #[test]
    fn window_falls_back_to_default() {
        assert_eq!(Cadence::All.window(60), Duration::from_secs(60));
        assert_eq!(Cadence::Every(5).window(60), Duration::from_secs(5));
        assert_eq!(Cadence::Every(5).to_string(), "every:5s");
    }
}
