//! Synthetic packet loss
//!
//! The gate runs on the inbound path, after a datagram is received and
//! decoded but before the engine sees it, and decides independently per
//! datagram whether to drop it. All randomness comes from a seeded ChaCha8
//! RNG, so a lossy run is reproducible given its seed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sr_core::FrameKind;
use tracing::debug;

/// Which inbound frame kinds are subject to the drop probability.
///
/// The classic setup drops data and ACK datagrams alike, since both traverse
/// the same inbound path; the one-sided modes model asymmetric loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LossMode {
    /// Sample every inbound datagram
    #[default]
    Both,
    /// Sample only data datagrams
    Data,
    /// Sample only acknowledgments
    Ack,
}

impl LossMode {
    fn applies_to(self, kind: FrameKind) -> bool {
        match self {
            LossMode::Both => true,
            LossMode::Data => kind == FrameKind::Data,
            LossMode::Ack => kind == FrameKind::Ack,
        }
    }
}

/// Loss gate configuration.
#[derive(Debug, Clone, Copy)]
pub struct LossConfig {
    /// Drop probability in `[0.0, 1.0]`
    pub probability: f64,
    /// Which frame kinds the probability applies to
    pub mode: LossMode,
    /// RNG seed; `None` seeds from OS entropy
    pub seed: Option<u64>,
}

impl Default for LossConfig {
    fn default() -> Self {
        Self {
            probability: 0.0,
            mode: LossMode::Both,
            seed: None,
        }
    }
}

/// Per-datagram drop decisions over a seeded RNG.
pub struct LossGate {
    config: LossConfig,
    rng: ChaCha8Rng,
    dropped: u64,
    passed: u64,
}

impl LossGate {
    pub fn new(config: LossConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Self {
            config,
            rng,
            dropped: 0,
            passed: 0,
        }
    }

    /// Decide whether to drop one inbound datagram of kind `kind`.
    pub fn decide(&mut self, kind: FrameKind) -> bool {
        if self.config.probability > 0.0 && self.config.mode.applies_to(kind) {
            let roll: f64 = self.rng.gen();
            if roll < self.config.probability {
                self.dropped += 1;
                debug!(?kind, "simulated loss, dropping datagram");
                return true;
            }
        }

        self.passed += 1;
        false
    }

    /// `(dropped, passed)` datagram counts so far.
    pub fn counts(&self) -> (u64, u64) {
        (self.dropped, self.passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_gate(probability: f64, mode: LossMode, seed: u64) -> LossGate {
        LossGate::new(LossConfig {
            probability,
            mode,
            seed: Some(seed),
        })
    }

    #[test]
    fn zero_probability_never_drops() {
        let mut gate = make_gate(0.0, LossMode::Both, 1);
        for _ in 0..1000 {
            assert!(!gate.decide(FrameKind::Data));
            assert!(!gate.decide(FrameKind::Ack));
        }
    }

    #[test]
    fn certain_loss_always_drops() {
        let mut gate = make_gate(1.0, LossMode::Both, 1);
        for _ in 0..100 {
            assert!(gate.decide(FrameKind::Data));
        }
    }

    #[test]
    fn drop_rate_tracks_probability() {
        let mut gate = make_gate(0.3, LossMode::Both, 42);
        for _ in 0..10_000 {
            gate.decide(FrameKind::Data);
        }

        let (dropped, _) = gate.counts();
        let rate = dropped as f64 / 10_000.0;
        assert!((rate - 0.3).abs() < 0.03, "observed rate {rate}");
    }

    #[test]
    fn same_seed_same_decisions() {
        let decisions = |seed| {
            let mut gate = make_gate(0.5, LossMode::Both, seed);
            (0..100)
                .map(|_| gate.decide(FrameKind::Data))
                .collect::<Vec<_>>()
        };

        assert_eq!(decisions(7), decisions(7));
        assert_ne!(decisions(7), decisions(8));
    }

    #[test]
    fn one_sided_modes_spare_the_other_kind() {
        let mut gate = make_gate(1.0, LossMode::Data, 1);
        assert!(gate.decide(FrameKind::Data));
        assert!(!gate.decide(FrameKind::Ack));

        let mut gate = make_gate(1.0, LossMode::Ack, 1);
        assert!(gate.decide(FrameKind::Ack));
        assert!(!gate.decide(FrameKind::Data));
    }
}
