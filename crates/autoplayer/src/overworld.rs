use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::errors::AutoplayerError;
use crate::page_parser;
use crate::pages::{OverworldPage, SitePage};
use crate::urls;

/// Compass directions, numbered the way the game's movement URLs number them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North = 1,
    South = 2,
    West = 3,
    East = 4,
    Northwest = 5,
    Southwest = 6,
    Northeast = 7,
    Southeast = 8,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
        Direction::Northwest,
        Direction::Southwest,
        Direction::Northeast,
        Direction::Southeast,
    ];

    pub fn digit(self) -> u8 {
        self as u8
    }

    pub fn from_digit(c: char) -> Option<Direction> {
        let n = c.to_digit(10)?;
        Direction::ALL.into_iter().find(|d| u32::from(d.digit()) == n)
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::East => Direction::West,
            Direction::Northwest => Direction::Southeast,
            Direction::Southeast => Direction::Northwest,
            Direction::Southwest => Direction::Northeast,
            Direction::Northeast => Direction::Southwest,
        }
    }

    /// `alt` text of the matching `<area>` on the direction pad
    pub fn alt_text(self) -> &'static str {
        match self {
            Direction::North => "North",
            Direction::South => "South",
            Direction::West => "West",
            Direction::East => "East",
            Direction::Northwest => "Northwest",
            Direction::Southwest => "Southwest",
            Direction::Northeast => "Northeast",
            Direction::Southeast => "Southeast",
        }
    }
}

/// A walk across the map, one direction digit per step
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<Direction>);

impl Path {
    pub fn parse(path: &str) -> Result<Path, AutoplayerError> {
        path.chars()
            .map(|c| {
                Direction::from_digit(c).ok_or_else(|| {
                    AutoplayerError::InvalidArgument(format!(
                        "Invalid direction '{c}' in path '{path}'. Directions are digits 1-8."
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Path)
    }

    /// The way back: steps in reverse order, each one flipped.
    pub fn invert(&self) -> Path {
        Path(self.0.iter().rev().map(|d| d.opposite()).collect())
    }

    pub fn directions(&self) -> &[Direction] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for Path {
    type Err = AutoplayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for direction in &self.0 {
            write!(f, "{}", direction.digit())?;
        }
        Ok(())
    }
}

impl From<Direction> for Path {
    fn from(direction: Direction) -> Self {
        Path(vec![direction])
    }
}

/// Invert a path given as a digit string.
pub fn invert_path(path: &str) -> Result<String, AutoplayerError> {
    Ok(Path::parse(path)?.invert().to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementMode {
    Normal,
    /// Raises the encounter rate
    Hunting,
}

impl MovementMode {
    pub fn url(self) -> &'static str {
        match self {
            MovementMode::Normal => urls::MOVEMENT_NORMAL_URL,
            MovementMode::Hunting => urls::MOVEMENT_HUNTING_URL,
        }
    }
}

/// What a step landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Overworld,
    Encounter,
}

/// Moves the party across the overworld
#[derive(Clone)]
pub struct OverworldHandler {
    overworld_page: OverworldPage,
}

impl OverworldHandler {
    pub fn new(site: SitePage) -> Self {
        Self {
            overworld_page: OverworldPage::new(site),
        }
    }

    pub fn overworld_page(&self) -> &OverworldPage {
        &self.overworld_page
    }

    pub async fn is_overworld(&self) -> Result<bool, AutoplayerError> {
        let content = self.overworld_page.site().content().await?;
        Ok(page_parser::is_overworld_page(&content))
    }

    /// Take a single step with the direction pad.
    #[instrument(level = "debug", skip(self))]
    pub async fn take_step(&self, direction: Direction) -> Result<StepOutcome, AutoplayerError> {
        self.overworld_page.click_direction(direction).await?;
        self.outcome().await
    }

    /// Take a single step through the movement URL instead of the pad.
    pub async fn take_step_by_url(&self, direction: Direction) -> Result<StepOutcome, AutoplayerError> {
        self.overworld_page
            .go_to_movement_url_with_wait(&urls::movement_url(direction.digit()))
            .await?;
        self.outcome().await
    }

    async fn outcome(&self) -> Result<StepOutcome, AutoplayerError> {
        if self.is_overworld().await? {
            Ok(StepOutcome::Overworld)
        } else {
            Ok(StepOutcome::Encounter)
        }
    }

    pub async fn switch_movement_mode(&self, mode: MovementMode) -> Result<(), AutoplayerError> {
        info!("Switching to {:?} movement", mode);
        self.overworld_page
            .site()
            .go_to_url_and_wait_navigation(mode.url())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invert_path_valid() {
        assert_eq!(invert_path("1234").unwrap(), "3412");
        // 8765 flipped: SE->NW, NE->SW, SW->NE, NW->SE
        assert_eq!(invert_path("5678").unwrap(), "5678");
        assert_eq!(invert_path("112").unwrap(), "122");
    }

    #[test]
    fn test_invert_path_invalid() {
        // 9 is not a valid direction
        assert!(matches!(
            invert_path("129"),
            Err(AutoplayerError::InvalidArgument(_))
        ));
        assert!(Path::parse("1a").is_err());
    }

    #[test]
    fn test_invert_path_empty() {
        assert_eq!(invert_path("").unwrap(), "");
    }

    #[test]
    fn test_invert_twice_is_identity() {
        let path = Path::parse("2666222866333").unwrap();
        assert_eq!(path.invert().invert(), path);
        assert_eq!(path.to_string(), "2666222866333");
        assert_eq!(path.len(), 13);
    }

    #[test]
    fn test_opposites_pair_up() {
        for direction in Direction::ALL {
            assert_ne!(direction.opposite(), direction);
            assert_eq!(direction.opposite().opposite(), direction);
        }
        assert_eq!(Direction::Northwest.opposite(), Direction::Southeast);
        assert_eq!(Direction::Southwest.opposite(), Direction::Northeast);
    }
}
