//! Prompt feature extraction
//!
//! Derives room counts from a free-text prompt with lexical rules. For each
//! room type the first matching rule wins:
//!
//! 1. digits followed by the room word ("3 bedrooms", "2-bathroom")
//! 2. a number word followed by the room word ("two bathrooms")
//! 3. the room word on its own ("with a garage") counts as one
//!
//! Room types that are not mentioned are left out of the result.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::domain::{RoomInfo, RoomType};

/// Compiled match rules for one room type
struct RoomRules {
    room: RoomType,
    numeric: Regex,
    spelled: Regex,
    bare: Regex,
}

static RULES: LazyLock<Vec<RoomRules>> = LazyLock::new(|| {
    RoomType::ALL
        .iter()
        .map(|room| {
            let word = room.word_pattern();
            RoomRules {
                room: *room,
                numeric: compile(&format!(r"(?i)\b(\d+)[\s-]*(?:{word})\b")),
                spelled: compile(&format!(r"(?i)\b(one|two|three|four|five)[\s-]+(?:{word})\b")),
                bare: compile(&format!(r"(?i)\b(?:{word})\b")),
            }
        })
        .collect()
});

fn compile(pattern: &str) -> Regex {
    // Patterns are built from the fixed fragments in RoomType::word_pattern
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid room pattern {pattern}: {e}"))
}

/// Map an English number word to its value, defaulting to 1
fn number_word_value(word: &str) -> u32 {
    match word.to_ascii_lowercase().as_str() {
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        _ => 1,
    }
}

/// Extract room counts from a prompt
///
/// Pure and deterministic; an empty prompt yields an empty mapping.
pub fn extract_room_info(prompt: &str) -> RoomInfo {
    debug!(prompt_len = prompt.len(), "extract_room_info: called");
    let mut info = RoomInfo::new();

    if prompt.trim().is_empty() {
        debug!("extract_room_info: empty prompt");
        return info;
    }

    for rules in RULES.iter() {
        if let Some(count) = count_for(rules, prompt) {
            info.insert(rules.room, count);
        }
    }

    debug!(rooms = info.len(), "extract_room_info: done");
    info
}

fn count_for(rules: &RoomRules, prompt: &str) -> Option<u32> {
    if let Some(caps) = rules.numeric.captures(prompt)
        && let Ok(count) = caps[1].parse::<u32>()
    {
        // "0 garages" means no garage, not one
        return (count > 0).then_some(count);
    }

    if let Some(caps) = rules.spelled.captures(prompt) {
        return Some(number_word_value(&caps[1]));
    }

    rules.bare.is_match(prompt).then_some(1)
}
