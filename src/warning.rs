use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{GuardianError, Result};

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(3);

pub const DEFAULT_MESSAGES: &[&str] = &[
    "Attention drifting detected.",
    "Back to focus — this won’t stop otherwise.",
    "Nice try. Eyes back on screen.",
    "Focus mode is calling.",
    "Return your gaze to proceed.",
    "Focus restored = video stops.",
];

/// Picks the on-screen warning while focus is lost, holding each pick for
/// at least the cooldown. Repeats are allowed.
pub struct WarningRotator {
    catalog: Vec<String>,
    cooldown: Duration,
    current: Option<(String, Instant)>,
    rng: StdRng,
}

impl WarningRotator {
    pub fn new(catalog: Vec<String>, cooldown: Duration) -> Result<Self> {
        Self::with_rng(catalog, cooldown, StdRng::from_entropy())
    }

    pub fn seeded(catalog: Vec<String>, cooldown: Duration, seed: u64) -> Result<Self> {
        Self::with_rng(catalog, cooldown, StdRng::seed_from_u64(seed))
    }

    fn with_rng(catalog: Vec<String>, cooldown: Duration, rng: StdRng) -> Result<Self> {
        if catalog.is_empty() {
            return Err(GuardianError::Config("warning catalog is empty".into()));
        }
        Ok(Self {
            catalog,
            cooldown,
            current: None,
            rng,
        })
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_ref().map(|(msg, _)| msg.as_str())
    }

    pub fn message(&mut self, now: Instant) -> &str {
        let stale = match &self.current {
            Some((_, refreshed)) => now.saturating_duration_since(*refreshed) > self.cooldown,
            None => true,
        };

        if stale {
            let pick = self
                .catalog
                .choose(&mut self.rng)
                .cloned()
                .unwrap_or_default();
            self.current = Some((pick, now));
        }

        self.current.as_ref().map(|(msg, _)| msg.as_str()).unwrap_or_default()
    }
}

impl Default for WarningRotator {
    fn default() -> Self {
        Self {
            catalog: DEFAULT_MESSAGES.iter().map(|m| m.to_string()).collect(),
            cooldown: DEFAULT_COOLDOWN,
            current: None,
            rng: StdRng::from_entropy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<String> {
        DEFAULT_MESSAGES.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn holds_message_within_cooldown() {
        let t0 = Instant::now();
        let mut rotator = WarningRotator::seeded(catalog(), DEFAULT_COOLDOWN, 42).unwrap();

        let first = rotator.message(t0).to_string();
        let held = rotator.message(t0 + Duration::from_millis(2900)).to_string();
        let at_boundary = rotator.message(t0 + DEFAULT_COOLDOWN).to_string();

        assert_eq!(first, held);
        assert_eq!(first, at_boundary);
        assert!(DEFAULT_MESSAGES.contains(&first.as_str()));
    }

    #[test]
    fn refreshes_after_cooldown() {
        let t0 = Instant::now();
        let catalog = vec!["one".to_string(), "two".to_string()];
        let mut rotator = WarningRotator::seeded(catalog, DEFAULT_COOLDOWN, 7).unwrap();

        rotator.message(t0);
        let mut seen = std::collections::HashSet::new();
        for i in 1..=40u64 {
            let msg = rotator.message(t0 + Duration::from_millis(3100 * i));
            seen.insert(msg.to_string());
        }

        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn refresh_restarts_cooldown() {
        let t0 = Instant::now();
        let mut rotator =
            WarningRotator::seeded(vec!["only".to_string()], DEFAULT_COOLDOWN, 1).unwrap();

        rotator.message(t0);
        rotator.message(t0 + Duration::from_millis(3100));

        let (_, refreshed) = rotator.current.clone().unwrap();
        assert_eq!(refreshed, t0 + Duration::from_millis(3100));
    }

    #[test]
    fn empty_catalog_is_rejected() {
        let result = WarningRotator::new(Vec::new(), DEFAULT_COOLDOWN);

        assert!(matches!(result, Err(GuardianError::Config(_))));
    }

    #[test]
    fn default_catalog_keeps_typographic_apostrophe() {
        assert!(DEFAULT_MESSAGES.contains(&"Back to focus — this won’t stop otherwise."));
        assert!(DEFAULT_MESSAGES.iter().all(|m| !m.contains('\'')));
    }

    #[test]
    fn no_message_before_first_call() {
        let rotator = WarningRotator::default();

        assert_eq!(rotator.current(), None);
    }
}
