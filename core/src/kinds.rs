//! Fixed stat tables for hostile units and player defenses.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::SAMPLES_PER_UNIT;

/// Types of hostile units that travel along the route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlicerKind {
    /// Fast single-hit unit without children.
    Slicer,
    /// Splits into two slicers when destroyed.
    SuperSlicer,
    /// Splits into two superslicers when destroyed.
    MegaSlicer,
    /// Heavily armoured unit that splits into four megaslicers.
    ApexSlicer,
}

/// Base attributes shared by every unit of a [`SlicerKind`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlicerStats {
    /// Route distance covered per tick at a time scale of one.
    pub speed: f64,
    /// Health assigned on construction.
    pub health: f64,
    /// Cash credited when the unit is destroyed.
    pub reward: u32,
    /// Width of the collision footprint.
    pub width: f64,
    /// Height of the collision footprint.
    pub height: f64,
}

impl SlicerKind {
    /// Every unit kind in ascending order of toughness.
    pub const ALL: [SlicerKind; 4] = [
        SlicerKind::Slicer,
        SlicerKind::SuperSlicer,
        SlicerKind::MegaSlicer,
        SlicerKind::ApexSlicer,
    ];

    /// Stat block for the kind.
    #[must_use]
    pub const fn stats(self) -> SlicerStats {
        match self {
            Self::Slicer => SlicerStats {
                speed: 2.0,
                health: 1.0,
                reward: 2,
                width: 48.0,
                height: 58.0,
            },
            Self::SuperSlicer => SlicerStats {
                speed: 1.5,
                health: 1.0,
                reward: 15,
                width: 48.0,
                height: 58.0,
            },
            Self::MegaSlicer => SlicerStats {
                speed: 1.5,
                health: 2.0,
                reward: 10,
                width: 24.0,
                height: 30.0,
            },
            Self::ApexSlicer => SlicerStats {
                speed: 0.75,
                health: 25.0,
                reward: 150,
                width: 48.0,
                height: 58.0,
            },
        }
    }

    /// Kinds released, in order, when a unit of this kind is destroyed.
    #[must_use]
    pub const fn children(self) -> &'static [SlicerKind] {
        match self {
            Self::Slicer => &[],
            Self::SuperSlicer => &[Self::Slicer, Self::Slicer],
            Self::MegaSlicer => &[Self::SuperSlicer, Self::SuperSlicer],
            Self::ApexSlicer => &[
                Self::MegaSlicer,
                Self::MegaSlicer,
                Self::MegaSlicer,
                Self::MegaSlicer,
            ],
        }
    }

    /// Lives lost when a unit of this kind escapes.
    ///
    /// Leaf kinds cost a single life; composite kinds cost the sum of their
    /// children.
    #[must_use]
    pub fn penalty(self) -> u32 {
        let children = self.children();
        if children.is_empty() {
            return 1;
        }
        children.iter().map(|child| child.penalty()).sum()
    }

    /// Number of route samples skipped per tick at a time scale of one.
    #[must_use]
    pub fn route_stride(self) -> usize {
        (self.stats().speed * SAMPLES_PER_UNIT).floor() as usize
    }

    /// Identifier used in wave scripts.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Slicer => "slicer",
            Self::SuperSlicer => "superslicer",
            Self::MegaSlicer => "megaslicer",
            Self::ApexSlicer => "apexslicer",
        }
    }
}

impl fmt::Display for SlicerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a kind name is not recognised.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown kind `{0}`")]
pub struct UnknownKind(pub String);

impl FromStr for SlicerKind {
    type Err = UnknownKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == value)
            .ok_or_else(|| UnknownKind(value.to_owned()))
    }
}

/// Types of defenses the player can purchase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefenseKind {
    /// Entry-level stationary gun.
    Tank,
    /// Longer-ranged, faster firing stationary gun.
    SuperTank,
    /// Aircraft that crosses the field dropping explosives.
    AirSupport,
}

/// Behavioural parameters of a [`DefenseKind`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DefenseProfile {
    /// Stationary defense firing homing projectiles.
    Active {
        /// Half-width of the square detection area.
        radius: f64,
        /// Ticks between successive shots.
        cooldown: i32,
        /// Damage dealt by each projectile.
        damage: u32,
    },
    /// Moving defense dropping area charges.
    Passive {
        /// Distance travelled per tick at a time scale of one.
        speed: f64,
        /// Inclusive upper bound of the random drop interval in ticks.
        max_drop_interval: u32,
    },
}

impl DefenseKind {
    /// Every purchasable kind, in buy-panel order.
    pub const ALL: [DefenseKind; 3] = [
        DefenseKind::Tank,
        DefenseKind::SuperTank,
        DefenseKind::AirSupport,
    ];

    /// Purchase price.
    #[must_use]
    pub const fn price(self) -> u32 {
        match self {
            Self::Tank => 250,
            Self::SuperTank => 600,
            Self::AirSupport => 500,
        }
    }

    /// Behavioural parameters.
    #[must_use]
    pub const fn profile(self) -> DefenseProfile {
        match self {
            Self::Tank => DefenseProfile::Active {
                radius: 100.0,
                cooldown: 60,
                damage: 1,
            },
            Self::SuperTank => DefenseProfile::Active {
                radius: 150.0,
                cooldown: 30,
                damage: 3,
            },
            Self::AirSupport => DefenseProfile::Passive {
                speed: 5.0,
                max_drop_interval: 180,
            },
        }
    }

    /// Width and height of the defense's bounding region.
    #[must_use]
    pub const fn footprint(self) -> (f64, f64) {
        match self {
            Self::Tank => (50.0, 50.0),
            Self::SuperTank => (60.0, 60.0),
            Self::AirSupport => (64.0, 64.0),
        }
    }

    /// Reports whether the defense moves across the field.
    #[must_use]
    pub const fn is_passive(self) -> bool {
        matches!(self.profile(), DefenseProfile::Passive { .. })
    }
}
