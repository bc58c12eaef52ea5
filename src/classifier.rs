use serde::{Deserialize, Serialize};

use crate::play::{Play, PlayType, SignificantPlay};

/// Per-team yardage and turnover contribution of one or more plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDelta {
    pub passing_yards: i64,
    pub rushing_yards: i64,
    pub interception_return_yards: i64,
    pub punt_return_yards: i64,
    pub kickoff_return_yards: i64,
    pub turnovers: i64,
    pub sack_yards: i64,
}

impl TeamDelta {
    pub fn add(&mut self, other: &TeamDelta) {
        self.passing_yards += other.passing_yards;
        self.rushing_yards += other.rushing_yards;
        self.interception_return_yards += other.interception_return_yards;
        self.punt_return_yards += other.punt_return_yards;
        self.kickoff_return_yards += other.kickoff_return_yards;
        self.turnovers += other.turnovers;
        self.sack_yards += other.sack_yards;
    }

    pub fn is_zero(&self) -> bool {
        *self == TeamDelta::default()
    }
}

/// Classifies one play into `(offense, defense)` deltas.
///
/// Return yardage on punts, kickoffs and interceptions is credited to the
/// defense, the side that gains possession. Turnovers are charged to the
/// offense. The three turnover checks are independent, so a play tagged both
/// `turnover` and `intercept` counts twice.
///
/// The team names are carried for symmetry with the stored records; the
/// classification itself only depends on the play.
pub fn classify(play: &Play, _offense_team: &str, _defense_team: &str) -> (TeamDelta, TeamDelta) {
    let mut offense = TeamDelta::default();
    let mut defense = TeamDelta::default();
    let yards = i64::from(play.yards);

    if play.play_type == PlayType::Pass && yards > 0 {
        offense.passing_yards += yards;
    }
    if play.play_type == PlayType::Run && yards > 0 {
        offense.rushing_yards += yards;
    }
    if play.has_tag(SignificantPlay::Sack) && yards < 0 {
        offense.sack_yards += yards.abs();
    }
    if play.has_tag(SignificantPlay::Intercept) && yards > 0 {
        defense.interception_return_yards += yards;
    }
    if play.play_type == PlayType::Punt && yards > 0 {
        defense.punt_return_yards += yards;
    }
    if play.play_type == PlayType::Kickoff && yards > 0 {
        defense.kickoff_return_yards += yards;
    }

    if play.has_tag(SignificantPlay::Turnover) {
        offense.turnovers += 1;
    }
    if play.has_tag(SignificantPlay::Fumble)
        && play.has_tag(SignificantPlay::FumbleRecoveredByDefense)
    {
        offense.turnovers += 1;
    }
    if play.has_tag(SignificantPlay::Intercept) {
        offense.turnovers += 1;
    }

    (offense, defense)
}
