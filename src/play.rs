use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const MAX_PARTICIPANTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "home" | "h" => Some(Side::Home),
            "away" | "a" | "visitor" => Some(Side::Away),
            _ => None,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }

    /// Storage key used for the team-game record.
    pub fn key(self) -> &'static str {
        match self {
            Side::Home => "home",
            Side::Away => "away",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PlayType {
    Pass,
    Run,
    Kickoff,
    Punt,
    Sack,
    FieldGoal,
    Pat,
    #[default]
    Other,
}

impl PlayType {
    /// Unrecognized labels map to `Other`.
    pub fn parse(raw: &str) -> Self {
        match normalize_label(raw).as_str() {
            "pass" | "passing" => PlayType::Pass,
            "run" | "rush" | "rushing" => PlayType::Run,
            "kickoff" | "ko" => PlayType::Kickoff,
            "punt" => PlayType::Punt,
            "sack" => PlayType::Sack,
            "fieldgoal" | "fg" => PlayType::FieldGoal,
            "pat" | "extrapoint" | "xp" => PlayType::Pat,
            _ => PlayType::Other,
        }
    }
}

/// Closed vocabulary of play tags that drive classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SignificantPlay {
    Touchdown,
    Turnover,
    Fumble,
    FumbleRecoveredByDefense,
    Intercept,
    Sack,
    Safety,
    Penalty,
    FirstDown,
    Touchback,
    BlockedKick,
}

impl SignificantPlay {
    pub const ALL: [SignificantPlay; 11] = [
        SignificantPlay::Touchdown,
        SignificantPlay::Turnover,
        SignificantPlay::Fumble,
        SignificantPlay::FumbleRecoveredByDefense,
        SignificantPlay::Intercept,
        SignificantPlay::Sack,
        SignificantPlay::Safety,
        SignificantPlay::Penalty,
        SignificantPlay::FirstDown,
        SignificantPlay::Touchback,
        SignificantPlay::BlockedKick,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        let tag = match normalize_label(raw).as_str() {
            "touchdown" | "td" => SignificantPlay::Touchdown,
            "turnover" => SignificantPlay::Turnover,
            "fumble" => SignificantPlay::Fumble,
            "fumblerecoveredbydefense" | "defensivefumblerecovery" => {
                SignificantPlay::FumbleRecoveredByDefense
            }
            "intercept" | "interception" | "int" => SignificantPlay::Intercept,
            "sack" => SignificantPlay::Sack,
            "safety" => SignificantPlay::Safety,
            "penalty" => SignificantPlay::Penalty,
            "firstdown" => SignificantPlay::FirstDown,
            "touchback" => SignificantPlay::Touchback,
            "blockedkick" | "blockedpunt" | "blockedfieldgoal" => SignificantPlay::BlockedKick,
            _ => return None,
        };
        Some(tag)
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl fmt::Display for SignificantPlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SignificantPlay::Touchdown => "touchdown",
            SignificantPlay::Turnover => "turnover",
            SignificantPlay::Fumble => "fumble",
            SignificantPlay::FumbleRecoveredByDefense => "fumble-recovered-by-defense",
            SignificantPlay::Intercept => "intercept",
            SignificantPlay::Sack => "sack",
            SignificantPlay::Safety => "safety",
            SignificantPlay::Penalty => "penalty",
            SignificantPlay::FirstDown => "first-down",
            SignificantPlay::Touchback => "touchback",
            SignificantPlay::BlockedKick => "blocked-kick",
        };
        f.write_str(label)
    }
}

/// Set of significant-play tags. Order and duplicates are irrelevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TagSet(u16);

impl TagSet {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, tag: SignificantPlay) {
        self.0 |= tag.bit();
    }

    pub fn contains(&self, tag: SignificantPlay) -> bool {
        self.0 & tag.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = SignificantPlay> + '_ {
        SignificantPlay::ALL
            .into_iter()
            .filter(|tag| self.contains(*tag))
    }
}

impl FromIterator<SignificantPlay> for TagSet {
    fn from_iter<I: IntoIterator<Item = SignificantPlay>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticipantRole {
    PrimaryCarrier,
    SecondaryCarrier,
    PrimaryTackler,
    SecondaryTackler,
}

impl ParticipantRole {
    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_label(raw).as_str() {
            "primarycarrier" | "carrier" | "ballcarrier" => Some(ParticipantRole::PrimaryCarrier),
            "secondarycarrier" | "target" | "receiver" => Some(ParticipantRole::SecondaryCarrier),
            "primarytackler" | "tackler" => Some(ParticipantRole::PrimaryTackler),
            "secondarytackler" | "assisttackler" => Some(ParticipantRole::SecondaryTackler),
            _ => None,
        }
    }

    pub fn is_offense(self) -> bool {
        matches!(
            self,
            ParticipantRole::PrimaryCarrier | ParticipantRole::SecondaryCarrier
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub jersey_number: u32,
    pub position: String,
    pub role: ParticipantRole,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Play {
    /// `None` when the clip's offense indicator could not be read.
    pub offense: Option<Side>,
    pub play_type: PlayType,
    pub yards: i32,
    pub tags: TagSet,
    pub participants: Vec<Participant>,
}

impl Play {
    pub fn has_tag(&self, tag: SignificantPlay) -> bool {
        self.tags.contains(tag)
    }

    pub fn involves(&self, jersey_number: u32) -> bool {
        self.participants
            .iter()
            .any(|p| p.jersey_number == jersey_number)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GameRecord {
    pub game_key: String,
    pub game_date: String,
    pub home_team_name: String,
    pub away_team_name: String,
    pub plays: Vec<Play>,
}

impl GameRecord {
    pub fn team_name(&self, side: Side) -> &str {
        match side {
            Side::Home => &self.home_team_name,
            Side::Away => &self.away_team_name,
        }
    }

    /// Plays a given jersey took part in, in game order.
    pub fn plays_for(&self, jersey_number: u32) -> Vec<&Play> {
        self.plays
            .iter()
            .filter(|play| play.involves(jersey_number))
            .collect()
    }

    pub fn participating_jerseys(&self) -> BTreeSet<u32> {
        self.plays
            .iter()
            .flat_map(|play| play.participants.iter().map(|p| p.jersey_number))
            .collect()
    }
}

fn normalize_label(raw: &str) -> String {
    raw.chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_spellings_resolve_to_one_kind() {
        assert_eq!(
            SignificantPlay::parse("fumble-recovered-by-defense"),
            Some(SignificantPlay::FumbleRecoveredByDefense)
        );
        assert_eq!(
            SignificantPlay::parse("Fumble_Recovered_By_Defense"),
            Some(SignificantPlay::FumbleRecoveredByDefense)
        );
        assert_eq!(
            SignificantPlay::parse("Interception"),
            Some(SignificantPlay::Intercept)
        );
        assert_eq!(SignificantPlay::parse("trick play"), None);
        // recovery by either side is not a defensive recovery
        assert_eq!(SignificantPlay::parse("fumble-recovery"), None);
    }

    #[test]
    fn tag_set_ignores_duplicates() {
        let tags: TagSet = [
            SignificantPlay::Sack,
            SignificantPlay::Sack,
            SignificantPlay::Fumble,
        ]
        .into_iter()
        .collect();
        assert!(tags.contains(SignificantPlay::Sack));
        assert!(tags.contains(SignificantPlay::Fumble));
        assert!(!tags.contains(SignificantPlay::Intercept));
        assert_eq!(tags.iter().count(), 2);
    }

    #[test]
    fn play_type_labels() {
        assert_eq!(PlayType::parse("Field Goal"), PlayType::FieldGoal);
        assert_eq!(PlayType::parse("kick-off"), PlayType::Kickoff);
        assert_eq!(PlayType::parse("PAT"), PlayType::Pat);
        assert_eq!(PlayType::parse("kneel"), PlayType::Other);
    }
}
