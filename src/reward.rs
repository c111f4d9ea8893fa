//! Weighted reward tables
//!
//! A table is walked in declaration order against a roll in [0, 100).
//! Chances need not sum to 100: whatever is left over is the "no reward"
//! outcome.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A single prize line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardEntry {
    pub reward_amount: i64,
    /// Percent chance in [0, 100]
    pub drop_chance: f32,
}

impl RewardEntry {
    pub fn new(reward_amount: i64, drop_chance: f32) -> Self {
        Self {
            reward_amount,
            drop_chance: drop_chance.clamp(0.0, 100.0),
        }
    }
}

/// Ordered reward distribution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardTable {
    pub entries: Vec<RewardEntry>,
    /// Probability in [0, 1] of flipping the rolled reward negative.
    /// Drawn independently from the primary roll.
    #[serde(default)]
    pub negate_chance: Option<f32>,
}

impl RewardTable {
    pub fn new(entries: Vec<RewardEntry>) -> Self {
        Self {
            entries,
            negate_chance: None,
        }
    }

    /// Enable the "bad outcome" sign flip
    pub fn with_negation(mut self, chance: f32) -> Self {
        self.negate_chance = Some(chance.clamp(0.0, 1.0));
        self
    }

    /// Sum of all drop chances (may be under or over 100)
    pub fn total_chance(&self) -> f32 {
        self.entries.iter().map(|e| e.drop_chance).sum()
    }

    /// Resolve a primary roll in [0, 100) against the table
    pub fn resolve(&self, roll: f32) -> i64 {
        let mut cumulative = 0.0;
        for entry in &self.entries {
            cumulative += entry.drop_chance;
            if roll <= cumulative {
                return entry.reward_amount;
            }
        }
        0
    }

    /// Draw a reward
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        let r: f32 = rng.random_range(0.0..100.0);
        let reward = self.resolve(r);

        match self.negate_chance {
            Some(chance) => {
                let flip: f32 = rng.random();
                if flip < chance { -reward } else { reward }
            }
            None => reward,
        }
    }

    /// Whether `amount` is an outcome this table can produce
    pub fn can_produce(&self, amount: i64) -> bool {
        if amount == 0 {
            return true;
        }
        self.entries.iter().any(|e| {
            e.reward_amount == amount || (self.negate_chance.is_some() && -e.reward_amount == amount)
        })
    }
}
