use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use tracing::{debug, warn};

use crate::play::{
    GameRecord, MAX_PARTICIPANTS, Participant, ParticipantRole, Play, PlayType, Side,
    SignificantPlay, TagSet,
};
use crate::player_stats::GameStatsUpdate;
use crate::stat_fields::StatLine;

/// A validated game plus the per-player deltas the position analyzers produced.
#[derive(Debug, Clone)]
pub struct IngestedGame {
    pub game: GameRecord,
    pub player_stats: Vec<GameStatsUpdate>,
}

pub fn load_game_file(path: &Path) -> Result<IngestedGame> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read game file {}", path.display()))?;
    parse_game_json(&raw).with_context(|| format!("parse game file {}", path.display()))
}

/// Parses a game document. Individual plays are lenient: unreadable fields
/// fall back to neutral values instead of failing the game.
pub fn parse_game_json(raw: &str) -> Result<IngestedGame> {
    let value = serde_json::from_str::<Value>(raw.trim()).context("invalid game json")?;

    let game_key = str_field(&value, &["gameKey", "game_key", "id"])
        .ok_or_else(|| anyhow!("game is missing gameKey"))?;
    let game_date = str_field(&value, &["gameDate", "game_date", "date"]).unwrap_or_default();
    let home_team_name = str_field(&value, &["homeTeamName", "homeTeam", "home"])
        .ok_or_else(|| anyhow!("game {game_key} is missing homeTeamName"))?;
    let away_team_name = str_field(&value, &["awayTeamName", "awayTeam", "away"])
        .ok_or_else(|| anyhow!("game {game_key} is missing awayTeamName"))?;

    let plays_raw = value
        .get("plays")
        .or_else(|| value.get("clips"))
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow!("game {game_key} has no plays array"))?;
    if plays_raw.is_empty() {
        return Err(anyhow!("game {game_key} has an empty plays array"));
    }
    let plays = plays_raw
        .iter()
        .enumerate()
        .map(|(idx, v)| parse_play(v, &game_key, idx))
        .collect::<Vec<_>>();

    let game = GameRecord {
        game_key,
        game_date,
        home_team_name,
        away_team_name,
        plays,
    };

    let player_stats = value
        .get("playerStats")
        .and_then(|v| v.as_array())
        .map(|rows| {
            rows.iter()
                .filter_map(|row| parse_player_stats(row, &game))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    Ok(IngestedGame { game, player_stats })
}

pub fn parse_play(v: &Value, game_key: &str, idx: usize) -> Play {
    let offense = str_field(v, &["offense", "offensiveTeam", "possession"])
        .as_deref()
        .and_then(Side::parse);
    if offense.is_none() {
        warn!(game_key, play = idx, "play offense indicator missing or unreadable");
    }

    let play_type = str_field(v, &["playType", "type"])
        .as_deref()
        .map(PlayType::parse)
        .unwrap_or_default();

    let yards = ["yards", "yardsGained", "yardage"]
        .iter()
        .find_map(|key| v.get(*key))
        .and_then(as_i64_any)
        .and_then(|n| i32::try_from(n).ok())
        .unwrap_or(0);

    let mut tags = TagSet::new();
    if let Some(raw_tags) = v
        .get("significantPlays")
        .or_else(|| v.get("tags"))
        .and_then(|t| t.as_array())
    {
        for tag in raw_tags.iter().filter_map(|t| t.as_str()) {
            match SignificantPlay::parse(tag) {
                Some(kind) => tags.insert(kind),
                None => debug!(game_key, play = idx, tag, "unknown significant-play tag"),
            }
        }
    }

    let participants = v
        .get("participants")
        .or_else(|| v.get("players"))
        .and_then(|p| p.as_array())
        .map(|slots| {
            slots
                .iter()
                .filter_map(parse_participant)
                .take(MAX_PARTICIPANTS)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    Play {
        offense,
        play_type,
        yards,
        tags,
        participants,
    }
}

fn parse_participant(v: &Value) -> Option<Participant> {
    let jersey_number = ["jerseyNumber", "jersey", "number"]
        .iter()
        .find_map(|key| v.get(*key))
        .and_then(as_u32_any)?;
    let role = str_field(v, &["role"]).as_deref().and_then(ParticipantRole::parse)?;
    let position = str_field(v, &["position", "pos"]).unwrap_or_default();
    Some(Participant {
        jersey_number,
        position,
        role,
    })
}

fn parse_player_stats(v: &Value, game: &GameRecord) -> Option<GameStatsUpdate> {
    let jersey_number = ["jerseyNumber", "jersey", "number"]
        .iter()
        .find_map(|key| v.get(*key))
        .and_then(as_u32_any)?;
    let stats = v
        .get("stats")
        .and_then(|s| s.as_object())
        .map(StatLine::from_json_map)
        .unwrap_or_default();
    Some(GameStatsUpdate {
        jersey_number,
        game_key: game.game_key.clone(),
        game_date: game.game_date.clone(),
        home_team: game.home_team_name.clone(),
        away_team: game.away_team_name.clone(),
        stats,
    })
}

fn str_field(v: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| v.get(*key))
        .find_map(|x| match x {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

fn as_i64_any(v: &Value) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    if let Some(f) = v.as_f64() {
        return Some(f.round() as i64);
    }
    v.as_str()?.trim().parse::<i64>().ok()
}

fn as_u32_any(v: &Value) -> Option<u32> {
    let n = as_i64_any(v)?;
    u32::try_from(n).ok()
}
