//! Die-roll sources for the rules pipeline.
//! This module exists so every random draw flows through one seedable seam.
//! It does not parse dice notation; callers build `Dice` values directly.

use std::collections::VecDeque;
use std::fmt;

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dice {
    pub count: u8,
    pub sides: u8,
}

impl Dice {
    pub const fn new(count: u8, sides: u8) -> Self {
        Self { count, sides }
    }

    pub fn roll(self, roller: &mut dyn DiceRoller) -> i32 {
        (0..self.count).map(|_| roller.roll(self.sides)).sum()
    }

    pub fn mean(self) -> f32 {
        f32::from(self.count) * (f32::from(self.sides) + 1.0) / 2.0
    }

    pub fn max(self) -> i32 {
        i32::from(self.count) * i32::from(self.sides)
    }
}

impl fmt::Display for Dice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)
    }
}

pub trait DiceRoller {
    /// Uniform roll in `1..=sides`; zero-sided dice roll 0.
    fn roll(&mut self, sides: u8) -> i32;

    fn d20(&mut self) -> i32 {
        self.roll(20)
    }
}

pub struct SeededDice {
    rng: ChaCha8Rng,
}

impl SeededDice {
    pub fn new(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed) }
    }
}

impl fmt::Debug for SeededDice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeededDice").finish_non_exhaustive()
    }
}

impl DiceRoller for SeededDice {
    fn roll(&mut self, sides: u8) -> i32 {
        if sides == 0 {
            return 0;
        }
        (self.rng.next_u64() % u64::from(sides)) as i32 + 1
    }
}

/// Replays a fixed roll sequence, then repeats `fallback` forever.
#[derive(Clone, Debug)]
pub struct ScriptedDice {
    rolls: VecDeque<i32>,
    fallback: i32,
}

impl ScriptedDice {
    pub fn new(rolls: impl IntoIterator<Item = i32>) -> Self {
        Self { rolls: rolls.into_iter().collect(), fallback: 1 }
    }

    pub fn with_fallback(mut self, fallback: i32) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }
}

impl DiceRoller for ScriptedDice {
    fn roll(&mut self, sides: u8) -> i32 {
        if sides == 0 {
            return 0;
        }
        self.rolls.pop_front().unwrap_or(self.fallback).clamp(1, i32::from(sides))
    }
}
