use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AutoplayerError;

/// Party members, numbered by their battle actor id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ally {
    Rohane = 1,
    Mipsy = 2,
    Talinia = 3,
    Velm = 4,
}

impl Ally {
    pub const ALL: [Ally; 4] = [Ally::Rohane, Ally::Mipsy, Ally::Talinia, Ally::Velm];

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Ally::Rohane => "Rohane",
            Ally::Mipsy => "Mipsy",
            Ally::Talinia => "Talinia",
            Ally::Velm => "Velm",
        }
    }

    pub fn from_actor_id(id: u8) -> Option<Ally> {
        Ally::ALL.into_iter().find(|ally| ally.id() == id)
    }

    pub fn from_name(name: &str) -> Option<Ally> {
        Ally::ALL
            .into_iter()
            .find(|ally| ally.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Ally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Ally {
    type Err = AutoplayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ally::from_name(s)
            .or_else(|| s.trim().parse::<u8>().ok().and_then(Ally::from_actor_id))
            .ok_or_else(|| AutoplayerError::InvalidArgument(format!("Unknown ally: {s}")))
    }
}

pub fn is_ally_actor(id: u8) -> bool {
    (1..=4).contains(&id)
}

pub fn is_enemy_actor(id: u8) -> bool {
    (5..=8).contains(&id)
}

/// First actor id handed to enemies in a battle
pub const FIRST_ENEMY_ACTOR: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Skill {
    // Rohane
    Crit,
    DamageIncrease,
    Focus,
    Stun,
    Taunt,
    // Mipsy
    DirectDamage,
    GroupDirectDamage,
    GroupHaste,
    // Talinia
    RangedAttacks,
    Shockwave,
    // Velm
    Heal,
    GroupShield,
    // Everyone
    MagicResist,
    MeleeHaste,
    MeleeDefense,
    CastingHaste,
}

impl Skill {
    pub const ALL: [Skill; 16] = [
        Skill::Crit,
        Skill::DamageIncrease,
        Skill::Focus,
        Skill::Stun,
        Skill::Taunt,
        Skill::DirectDamage,
        Skill::GroupDirectDamage,
        Skill::GroupHaste,
        Skill::RangedAttacks,
        Skill::Shockwave,
        Skill::Heal,
        Skill::GroupShield,
        Skill::MagicResist,
        Skill::MeleeHaste,
        Skill::MeleeDefense,
        Skill::CastingHaste,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Skill::Crit => "crit",
            Skill::DamageIncrease => "damage-increase",
            Skill::Focus => "focus",
            Skill::Stun => "stun",
            Skill::Taunt => "taunt",
            Skill::DirectDamage => "direct-damage",
            Skill::GroupDirectDamage => "group-direct-damage",
            Skill::GroupHaste => "group-haste",
            Skill::RangedAttacks => "ranged-attacks",
            Skill::Shockwave => "shockwave",
            Skill::Heal => "heal",
            Skill::GroupShield => "group-shield",
            Skill::MagicResist => "magic-resist",
            Skill::MeleeHaste => "melee-haste",
            Skill::MeleeDefense => "melee-defense",
            Skill::CastingHaste => "casting-haste",
        }
    }

    /// Active abilities used from the battle menu. Everything else is passive.
    pub fn is_castable(self) -> bool {
        matches!(
            self,
            Skill::Stun
                | Skill::Taunt
                | Skill::DirectDamage
                | Skill::GroupDirectDamage
                | Skill::GroupHaste
                | Skill::Shockwave
                | Skill::Heal
                | Skill::GroupShield
        )
    }

    fn owner(self) -> Option<Ally> {
        match self {
            Skill::Crit | Skill::DamageIncrease | Skill::Focus | Skill::Stun | Skill::Taunt => {
                Some(Ally::Rohane)
            }
            Skill::DirectDamage | Skill::GroupDirectDamage | Skill::GroupHaste => Some(Ally::Mipsy),
            Skill::RangedAttacks | Skill::Shockwave => Some(Ally::Talinia),
            Skill::Heal | Skill::GroupShield => Some(Ally::Velm),
            Skill::MagicResist | Skill::MeleeHaste | Skill::MeleeDefense | Skill::CastingHaste => {
                None
            }
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Skill {
    type Err = AutoplayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        Skill::ALL
            .into_iter()
            .find(|skill| skill.name() == wanted)
            .ok_or_else(|| AutoplayerError::InvalidArgument(format!("Unknown skill: {s}")))
    }
}

/// The game's numeric id for `skill` on `ally`'s skill page.
pub fn skill_id(ally: Ally, skill: Skill) -> Result<u32, AutoplayerError> {
    let id = match (skill.owner(), skill) {
        (None, Skill::MagicResist) => 9501,
        (None, Skill::MeleeHaste) => 9502,
        (None, Skill::MeleeDefense) => 9503,
        (None, Skill::CastingHaste) => 9504,
        (Some(owner), _) if owner == ally => match skill {
            Skill::Crit => 9101,
            Skill::DamageIncrease => 9102,
            Skill::Focus => 9103,
            Skill::Stun => 9104,
            Skill::Taunt => 9105,
            Skill::DirectDamage => 9201,
            Skill::GroupDirectDamage => 9202,
            Skill::GroupHaste => 9203,
            Skill::RangedAttacks => 9301,
            Skill::Shockwave => 9302,
            Skill::Heal => 9401,
            Skill::GroupShield => 9402,
            _ => return Err(not_learnable(ally, skill)),
        },
        _ => return Err(not_learnable(ally, skill)),
    };
    Ok(id)
}

fn not_learnable(ally: Ally, skill: Skill) -> AutoplayerError {
    AutoplayerError::InvalidArgument(format!("{ally} cannot learn {skill}"))
}
