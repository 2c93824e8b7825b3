//! Room types and derived room counts

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Closed set of room types recognized in prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoomType {
    #[serde(rename = "bedroom")]
    Bedroom,
    #[serde(rename = "bathroom")]
    Bathroom,
    #[serde(rename = "kitchen")]
    Kitchen,
    #[serde(rename = "living room")]
    LivingRoom,
    #[serde(rename = "dining room")]
    DiningRoom,
    #[serde(rename = "office")]
    Office,
    #[serde(rename = "studio")]
    Studio,
    #[serde(rename = "balcony")]
    Balcony,
    #[serde(rename = "patio")]
    Patio,
    #[serde(rename = "garage")]
    Garage,
}

impl RoomType {
    /// Every room type, in display order
    pub const ALL: [RoomType; 10] = [
        RoomType::Bedroom,
        RoomType::Bathroom,
        RoomType::Kitchen,
        RoomType::LivingRoom,
        RoomType::DiningRoom,
        RoomType::Office,
        RoomType::Studio,
        RoomType::Balcony,
        RoomType::Patio,
        RoomType::Garage,
    ];

    /// Human-readable label, as it appears in prompts
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bedroom => "bedroom",
            Self::Bathroom => "bathroom",
            Self::Kitchen => "kitchen",
            Self::LivingRoom => "living room",
            Self::DiningRoom => "dining room",
            Self::Office => "office",
            Self::Studio => "studio",
            Self::Balcony => "balcony",
            Self::Patio => "patio",
            Self::Garage => "garage",
        }
    }

    /// Regex fragment matching the singular or plural form of the room word
    pub(crate) fn word_pattern(&self) -> &'static str {
        match self {
            Self::Bedroom => r"bedrooms?",
            Self::Bathroom => r"bathrooms?",
            Self::Kitchen => r"kitchens?",
            Self::LivingRoom => r"living\s+rooms?",
            Self::DiningRoom => r"dining\s+rooms?",
            Self::Office => r"offices?",
            Self::Studio => r"studios?",
            Self::Balcony => r"balcon(?:y|ies)",
            Self::Patio => r"patios?",
            Self::Garage => r"garages?",
        }
    }
}

impl std::fmt::Display for RoomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Room counts derived from a prompt
///
/// Only room types that were mentioned are present; counts are always positive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomInfo(BTreeMap<RoomType, u32>);

impl RoomInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a count; zero counts are not stored
    pub fn insert(&mut self, room: RoomType, count: u32) {
        if count > 0 {
            self.0.insert(room, count);
        }
    }

    pub fn get(&self, room: RoomType) -> Option<u32> {
        self.0.get(&room).copied()
    }

    pub fn contains(&self, room: RoomType) -> bool {
        self.0.contains_key(&room)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RoomType, u32)> + '_ {
        self.0.iter().map(|(room, count)| (*room, *count))
    }

    /// Sum of all counts, used as the plan's `room_count` summary
    pub fn total(&self) -> u32 {
        self.0.values().fold(0u32, |acc, n| acc.saturating_add(*n))
    }
}

impl std::ops::Index<RoomType> for RoomInfo {
    type Output = u32;

    fn index(&self, room: RoomType) -> &Self::Output {
        &self.0[&room]
    }
}
