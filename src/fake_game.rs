//! Synthetic games for benchmarks and local demos. Plays and the per-player
//! stat lines are generated together so the two stay consistent.

use std::collections::BTreeMap;

use rand::Rng;

use crate::ingest::IngestedGame;
use crate::play::{
    GameRecord, Participant, ParticipantRole, Play, PlayType, Side, SignificantPlay, TagSet,
};
use crate::player::Player;
use crate::player_stats::GameStatsUpdate;
use crate::stat_fields::{StatField, StatLine};

const HOME_ROSTER: &[(u32, &str)] = &[
    (12, "QB"),
    (22, "RB"),
    (11, "WR"),
    (18, "WR"),
    (44, "TE"),
    (3, "K"),
    (4, "P"),
    (33, "LB"),
    (24, "DB"),
    (40, "DL"),
];

/// Away jerseys are offset so one directory can hold both rosters.
const AWAY_OFFSET: u32 = 50;

pub fn roster(side: Side) -> Vec<(u32, &'static str)> {
    let offset = match side {
        Side::Home => 0,
        Side::Away => AWAY_OFFSET,
    };
    HOME_ROSTER
        .iter()
        .map(|(jersey, position)| (jersey + offset, *position))
        .collect()
}

pub fn fake_players(league: &str, season: &str) -> Vec<Player> {
    [Side::Home, Side::Away]
        .into_iter()
        .flat_map(roster)
        .map(|(jersey, position)| Player {
            id: i64::from(jersey) + 1000,
            jersey_number: jersey,
            name: format!("{position} #{jersey}"),
            position: position.to_string(),
            league: league.to_string(),
            season: season.to_string(),
            active: true,
        })
        .collect()
}

struct BoxScore {
    lines: BTreeMap<u32, StatLine>,
}

impl BoxScore {
    fn bump(&mut self, jersey: u32, field: StatField, value: f64) {
        self.lines
            .entry(jersey)
            .or_default()
            .accumulate(&StatLine::new().with(field, value));
    }
}

fn pick(side: Side, position: &str, rng: &mut impl Rng) -> u32 {
    let options = roster(side)
        .into_iter()
        .filter(|(_, pos)| *pos == position)
        .map(|(jersey, _)| jersey)
        .collect::<Vec<_>>();
    options[rng.gen_range(0..options.len())]
}

fn slot(jersey_number: u32, position: &str, role: ParticipantRole) -> Participant {
    Participant {
        jersey_number,
        position: position.to_string(),
        role,
    }
}

pub fn fake_game(
    rng: &mut impl Rng,
    game_key: &str,
    game_date: &str,
    home_team_name: &str,
    away_team_name: &str,
    play_count: usize,
) -> IngestedGame {
    let mut plays = Vec::with_capacity(play_count);
    let mut stats = BoxScore {
        lines: BTreeMap::new(),
    };
    let mut offense = Side::Home;
    let mut drive_plays = 0usize;

    for idx in 0..play_count {
        let defense = offense.opposite();
        let mut tags = TagSet::new();
        let mut participants = Vec::new();
        let mut change_possession = false;

        let roll = rng.gen_range(0..100);
        let (play_type, yards) = if idx == 0 {
            let kicker = pick(defense, "K", rng);
            stats.bump(kicker, StatField::Kickoffs, 1.0);
            participants.push(slot(kicker, "K", ParticipantRole::PrimaryCarrier));
            (PlayType::Kickoff, rng.gen_range(0..35))
        } else if roll < 42 {
            let carrier = pick(offense, "RB", rng);
            let tackler = pick(defense, "LB", rng);
            let yards: i32 = rng.gen_range(-3..16);
            stats.bump(carrier, StatField::RushingAttempts, 1.0);
            stats.bump(carrier, StatField::RushingYards, f64::from(yards));
            stats.bump(carrier, StatField::LongestRush, f64::from(yards));
            stats.bump(tackler, StatField::Tackles, 1.0);
            stats.bump(tackler, StatField::SoloTackles, 1.0);
            if rng.gen_bool(0.04) {
                tags.insert(SignificantPlay::Touchdown);
                stats.bump(carrier, StatField::RushingTouchdowns, 1.0);
            } else if rng.gen_bool(0.02) {
                tags.insert(SignificantPlay::Fumble);
                stats.bump(carrier, StatField::Fumbles, 1.0);
                if rng.gen_bool(0.5) {
                    tags.insert(SignificantPlay::FumbleRecoveredByDefense);
                    stats.bump(carrier, StatField::FumblesLost, 1.0);
                    stats.bump(tackler, StatField::FumbleRecoveries, 1.0);
                    change_possession = true;
                }
            }
            participants.push(slot(carrier, "RB", ParticipantRole::PrimaryCarrier));
            participants.push(slot(tackler, "LB", ParticipantRole::PrimaryTackler));
            (PlayType::Run, yards)
        } else if roll < 84 {
            let qb = pick(offense, "QB", rng);
            participants.push(slot(qb, "QB", ParticipantRole::PrimaryCarrier));
            let outcome = rng.gen_range(0..100);
            if outcome < 7 {
                let rusher = pick(defense, "DL", rng);
                let loss: i32 = rng.gen_range(1..11);
                tags.insert(SignificantPlay::Sack);
                stats.bump(qb, StatField::SacksTaken, 1.0);
                stats.bump(qb, StatField::SackYardsLost, f64::from(loss));
                stats.bump(rusher, StatField::Sacks, 1.0);
                stats.bump(rusher, StatField::Tackles, 1.0);
                participants.push(slot(rusher, "DL", ParticipantRole::PrimaryTackler));
                (PlayType::Pass, -loss)
            } else if outcome < 10 {
                let db = pick(defense, "DB", rng);
                tags.insert(SignificantPlay::Intercept);
                stats.bump(qb, StatField::PassingAttempts, 1.0);
                stats.bump(qb, StatField::InterceptionsThrown, 1.0);
                stats.bump(db, StatField::Interceptions, 1.0);
                participants.push(slot(db, "DB", ParticipantRole::PrimaryTackler));
                change_possession = true;
                (PlayType::Pass, rng.gen_range(0..30))
            } else {
                let (receiver, position) = if rng.gen_bool(0.75) {
                    (pick(offense, "WR", rng), "WR")
                } else {
                    (pick(offense, "TE", rng), "TE")
                };
                stats.bump(qb, StatField::PassingAttempts, 1.0);
                stats.bump(receiver, StatField::Targets, 1.0);
                participants.push(slot(receiver, position, ParticipantRole::SecondaryCarrier));
                if rng.gen_bool(0.64) {
                    let yards: i32 = rng.gen_range(0..35);
                    stats.bump(qb, StatField::Completions, 1.0);
                    stats.bump(qb, StatField::PassingYards, f64::from(yards));
                    stats.bump(qb, StatField::LongestPass, f64::from(yards));
                    stats.bump(receiver, StatField::Receptions, 1.0);
                    stats.bump(receiver, StatField::ReceivingYards, f64::from(yards));
                    stats.bump(receiver, StatField::LongestReception, f64::from(yards));
                    if rng.gen_bool(0.06) {
                        tags.insert(SignificantPlay::Touchdown);
                        stats.bump(qb, StatField::PassingTouchdowns, 1.0);
                        stats.bump(receiver, StatField::ReceivingTouchdowns, 1.0);
                    }
                    let tackler = pick(defense, "DB", rng);
                    stats.bump(tackler, StatField::Tackles, 1.0);
                    participants.push(slot(tackler, "DB", ParticipantRole::PrimaryTackler));
                    (PlayType::Pass, yards)
                } else {
                    (PlayType::Pass, 0)
                }
            }
        } else if roll < 91 {
            let punter = pick(offense, "P", rng);
            let distance: i32 = rng.gen_range(30..56);
            stats.bump(punter, StatField::Punts, 1.0);
            stats.bump(punter, StatField::PuntingYards, f64::from(distance));
            stats.bump(punter, StatField::LongestPunt, f64::from(distance));
            participants.push(slot(punter, "P", ParticipantRole::PrimaryCarrier));
            change_possession = true;
            (PlayType::Punt, rng.gen_range(0..15))
        } else if roll < 96 {
            let kicker = pick(offense, "K", rng);
            let distance: i32 = rng.gen_range(20..55);
            stats.bump(kicker, StatField::FieldGoalsAttempted, 1.0);
            if rng.gen_bool(0.8) {
                stats.bump(kicker, StatField::FieldGoalsMade, 1.0);
                stats.bump(kicker, StatField::LongestFieldGoal, f64::from(distance));
            }
            participants.push(slot(kicker, "K", ParticipantRole::PrimaryCarrier));
            change_possession = true;
            (PlayType::FieldGoal, 0)
        } else {
            let kicker = pick(offense, "K", rng);
            stats.bump(kicker, StatField::ExtraPointsAttempted, 1.0);
            if rng.gen_bool(0.95) {
                stats.bump(kicker, StatField::ExtraPointsMade, 1.0);
            }
            participants.push(slot(kicker, "K", ParticipantRole::PrimaryCarrier));
            (PlayType::Pat, 0)
        };

        plays.push(Play {
            offense: Some(offense),
            play_type,
            yards,
            tags,
            participants,
        });

        drive_plays += 1;
        if change_possession || drive_plays >= 8 || tags.contains(SignificantPlay::Touchdown) {
            offense = offense.opposite();
            drive_plays = 0;
        }
    }

    let game = GameRecord {
        game_key: game_key.to_string(),
        game_date: game_date.to_string(),
        home_team_name: home_team_name.to_string(),
        away_team_name: away_team_name.to_string(),
        plays,
    };
    let player_stats = stats
        .lines
        .into_iter()
        .map(|(jersey_number, line)| GameStatsUpdate {
            jersey_number,
            game_key: game.game_key.clone(),
            game_date: game.game_date.clone(),
            home_team: game.home_team_name.clone(),
            away_team: game.away_team_name.clone(),
            stats: line,
        })
        .collect();

    IngestedGame { game, player_stats }
}
