//! Schema of the per-player counting stats exchanged between the position
//! analyzers and the tiered aggregator.
//!
//! Every field is declared once in [`FIELDS`] with the way it folds across
//! games: summed, or kept as a running maximum.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Sum,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatField {
    // passing
    PassingYards,
    PassingAttempts,
    Completions,
    PassingTouchdowns,
    InterceptionsThrown,
    SacksTaken,
    SackYardsLost,
    // rushing
    RushingYards,
    RushingAttempts,
    RushingTouchdowns,
    Fumbles,
    FumblesLost,
    // receiving
    Receptions,
    Targets,
    ReceivingYards,
    ReceivingTouchdowns,
    YardsAfterCatch,
    Drops,
    // kicking / punting
    FieldGoalsMade,
    FieldGoalsAttempted,
    ExtraPointsMade,
    ExtraPointsAttempted,
    Punts,
    PuntingYards,
    PuntsInside20,
    Kickoffs,
    Touchbacks,
    // defense
    Tackles,
    SoloTackles,
    AssistedTackles,
    TacklesForLoss,
    Sacks,
    Interceptions,
    PassesDefended,
    ForcedFumbles,
    FumbleRecoveries,
    DefensiveTouchdowns,
    // returns
    KickReturns,
    KickReturnYards,
    PuntReturns,
    PuntReturnYards,
    ReturnTouchdowns,
    // discipline / ball security
    Penalties,
    PenaltyYards,
    Turnovers,
    // single-play bests
    LongestPass,
    LongestRush,
    LongestReception,
    LongestFieldGoal,
    LongestPunt,
}

pub struct FieldSpec {
    pub field: StatField,
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn sum(field: StatField, name: &'static str) -> FieldSpec {
    FieldSpec {
        field,
        name,
        kind: FieldKind::Sum,
    }
}

const fn max(field: StatField, name: &'static str) -> FieldSpec {
    FieldSpec {
        field,
        name,
        kind: FieldKind::Max,
    }
}

pub const FIELDS: &[FieldSpec] = &[
    sum(StatField::PassingYards, "passingYards"),
    sum(StatField::PassingAttempts, "passingAttempts"),
    sum(StatField::Completions, "completions"),
    sum(StatField::PassingTouchdowns, "passingTouchdowns"),
    sum(StatField::InterceptionsThrown, "interceptionsThrown"),
    sum(StatField::SacksTaken, "sacksTaken"),
    sum(StatField::SackYardsLost, "sackYardsLost"),
    sum(StatField::RushingYards, "rushingYards"),
    sum(StatField::RushingAttempts, "rushingAttempts"),
    sum(StatField::RushingTouchdowns, "rushingTouchdowns"),
    sum(StatField::Fumbles, "fumbles"),
    sum(StatField::FumblesLost, "fumblesLost"),
    sum(StatField::Receptions, "receptions"),
    sum(StatField::Targets, "targets"),
    sum(StatField::ReceivingYards, "receivingYards"),
    sum(StatField::ReceivingTouchdowns, "receivingTouchdowns"),
    sum(StatField::YardsAfterCatch, "yardsAfterCatch"),
    sum(StatField::Drops, "drops"),
    sum(StatField::FieldGoalsMade, "fieldGoalsMade"),
    sum(StatField::FieldGoalsAttempted, "fieldGoalsAttempted"),
    sum(StatField::ExtraPointsMade, "extraPointsMade"),
    sum(StatField::ExtraPointsAttempted, "extraPointsAttempted"),
    sum(StatField::Punts, "punts"),
    sum(StatField::PuntingYards, "puntingYards"),
    sum(StatField::PuntsInside20, "puntsInside20"),
    sum(StatField::Kickoffs, "kickoffs"),
    sum(StatField::Touchbacks, "touchbacks"),
    sum(StatField::Tackles, "tackles"),
    sum(StatField::SoloTackles, "soloTackles"),
    sum(StatField::AssistedTackles, "assistedTackles"),
    sum(StatField::TacklesForLoss, "tacklesForLoss"),
    sum(StatField::Sacks, "sacks"),
    sum(StatField::Interceptions, "interceptions"),
    sum(StatField::PassesDefended, "passesDefended"),
    sum(StatField::ForcedFumbles, "forcedFumbles"),
    sum(StatField::FumbleRecoveries, "fumbleRecoveries"),
    sum(StatField::DefensiveTouchdowns, "defensiveTouchdowns"),
    sum(StatField::KickReturns, "kickReturns"),
    sum(StatField::KickReturnYards, "kickReturnYards"),
    sum(StatField::PuntReturns, "puntReturns"),
    sum(StatField::PuntReturnYards, "puntReturnYards"),
    sum(StatField::ReturnTouchdowns, "returnTouchdowns"),
    sum(StatField::Penalties, "penalties"),
    sum(StatField::PenaltyYards, "penaltyYards"),
    sum(StatField::Turnovers, "turnovers"),
    max(StatField::LongestPass, "longestPass"),
    max(StatField::LongestRush, "longestRush"),
    max(StatField::LongestReception, "longestReception"),
    max(StatField::LongestFieldGoal, "longestFieldGoal"),
    max(StatField::LongestPunt, "longestPunt"),
];

static BY_NAME: Lazy<HashMap<&'static str, &'static FieldSpec>> =
    Lazy::new(|| FIELDS.iter().map(|spec| (spec.name, spec)).collect());

static BY_FIELD: Lazy<HashMap<StatField, &'static FieldSpec>> =
    Lazy::new(|| FIELDS.iter().map(|spec| (spec.field, spec)).collect());

const TOUCHDOWN_FIELDS: [StatField; 5] = [
    StatField::PassingTouchdowns,
    StatField::RushingTouchdowns,
    StatField::ReceivingTouchdowns,
    StatField::DefensiveTouchdowns,
    StatField::ReturnTouchdowns,
];

impl StatField {
    pub fn from_name(name: &str) -> Option<Self> {
        BY_NAME.get(name.trim()).map(|spec| spec.field)
    }

    pub fn spec(self) -> &'static FieldSpec {
        // Every variant has exactly one row in FIELDS.
        BY_FIELD[&self]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn kind(self) -> FieldKind {
        self.spec().kind
    }
}

/// Sparse set of stat values. Fields that were never reported are absent,
/// which is distinct from a reported zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatLine(BTreeMap<StatField, f64>);

impl StatLine {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builds a line from an analyzer's `name -> number` map. Names outside
    /// the schema and non-numeric values are dropped.
    pub fn from_json_map(map: &serde_json::Map<String, Value>) -> Self {
        let mut line = StatLine::new();
        for (name, value) in map {
            let Some(field) = StatField::from_name(name) else {
                debug!(field = %name, "ignoring stat outside the schema");
                continue;
            };
            let number = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            match number {
                Some(n) if n.is_finite() => line.set(field, n),
                _ => debug!(field = %name, "ignoring non-numeric stat value"),
            }
        }
        line
    }

    pub fn with(mut self, field: StatField, value: f64) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: StatField, value: f64) {
        self.0.insert(field, value);
    }

    pub fn get(&self, field: StatField) -> Option<f64> {
        self.0.get(&field).copied()
    }

    /// Absent fields read as zero.
    pub fn value(&self, field: StatField) -> f64 {
        self.get(field).unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StatField, f64)> + '_ {
        self.0.iter().map(|(field, value)| (*field, *value))
    }

    /// Folds `delta` in: sums add, maxima ratchet. Fields absent from the
    /// delta are left as stored.
    pub fn accumulate(&mut self, delta: &StatLine) {
        for (field, incoming) in delta.iter() {
            match field.kind() {
                FieldKind::Sum => *self.0.entry(field).or_insert(0.0) += incoming,
                // A first value is taken as is, so a negative best survives.
                FieldKind::Max => {
                    self.0
                        .entry(field)
                        .and_modify(|stored| *stored = stored.max(incoming))
                        .or_insert(incoming);
                }
            }
        }
    }

    pub fn total_yards(&self) -> f64 {
        self.value(StatField::PassingYards)
            + self.value(StatField::RushingYards)
            + self.value(StatField::ReceivingYards)
    }

    pub fn total_touchdowns(&self) -> f64 {
        TOUCHDOWN_FIELDS.iter().map(|f| self.value(*f)).sum()
    }
}

/// Ratios recomputed from accumulated totals after every fold.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedStats {
    pub completion_percentage: f64,
    pub yards_per_pass_attempt: f64,
    pub yards_per_carry: f64,
    pub yards_per_reception: f64,
    pub field_goal_percentage: f64,
    pub extra_point_percentage: f64,
    pub punt_average: f64,
    pub total_yards: f64,
    pub total_touchdowns: f64,
}

impl DerivedStats {
    /// A ratio whose denominator is not positive keeps its previous value.
    pub fn recompute(&mut self, totals: &StatLine) {
        let ratio = |num: StatField, den: StatField, scale: f64, slot: &mut f64| {
            let d = totals.value(den);
            if d > 0.0 {
                *slot = round1(totals.value(num) / d * scale);
            }
        };
        ratio(
            StatField::Completions,
            StatField::PassingAttempts,
            100.0,
            &mut self.completion_percentage,
        );
        ratio(
            StatField::PassingYards,
            StatField::PassingAttempts,
            1.0,
            &mut self.yards_per_pass_attempt,
        );
        ratio(
            StatField::RushingYards,
            StatField::RushingAttempts,
            1.0,
            &mut self.yards_per_carry,
        );
        ratio(
            StatField::ReceivingYards,
            StatField::Receptions,
            1.0,
            &mut self.yards_per_reception,
        );
        ratio(
            StatField::FieldGoalsMade,
            StatField::FieldGoalsAttempted,
            100.0,
            &mut self.field_goal_percentage,
        );
        ratio(
            StatField::ExtraPointsMade,
            StatField::ExtraPointsAttempted,
            100.0,
            &mut self.extra_point_percentage,
        );
        ratio(
            StatField::PuntingYards,
            StatField::Punts,
            1.0,
            &mut self.punt_average,
        );
        self.total_yards = totals.total_yards();
        self.total_touchdowns = totals.total_touchdowns();
    }

    pub fn from_totals(totals: &StatLine) -> Self {
        let mut out = DerivedStats::default();
        out.recompute(totals);
        out
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        let value = match name {
            "completionPercentage" => self.completion_percentage,
            "yardsPerPassAttempt" => self.yards_per_pass_attempt,
            "yardsPerCarry" => self.yards_per_carry,
            "yardsPerReception" => self.yards_per_reception,
            "fieldGoalPercentage" => self.field_goal_percentage,
            "extraPointPercentage" => self.extra_point_percentage,
            "puntAverage" => self.punt_average,
            "totalYards" => self.total_yards,
            "totalTouchdowns" => self.total_touchdowns,
            _ => return None,
        };
        Some(value)
    }
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_one_schema_row() {
        assert_eq!(BY_FIELD.len(), FIELDS.len());
        assert_eq!(BY_NAME.len(), FIELDS.len());
        for spec in FIELDS {
            assert_eq!(StatField::from_name(spec.name), Some(spec.field));
        }
    }

    #[test]
    fn serialized_names_match_schema_names() {
        for spec in FIELDS {
            let json = serde_json::to_string(&spec.field).unwrap();
            assert_eq!(json, format!("\"{}\"", spec.name));
        }
    }

    #[test]
    fn first_max_value_is_kept_even_when_negative() {
        let mut line = StatLine::new();
        line.accumulate(&StatLine::new().with(StatField::LongestRush, -3.0));
        assert_eq!(line.get(StatField::LongestRush), Some(-3.0));
        line.accumulate(&StatLine::new().with(StatField::LongestRush, -5.0));
        assert_eq!(line.get(StatField::LongestRush), Some(-3.0));
        line.accumulate(&StatLine::new().with(StatField::RushingYards, -3.0));
        assert_eq!(line.get(StatField::RushingYards), Some(-3.0));
    }

    #[test]
    fn round1_half_up() {
        assert_eq!(round1(75.0), 75.0);
        assert_eq!(round1(2.0 / 3.0 * 100.0), 66.7);
        assert_eq!(round1(4.25), 4.3);
    }

    #[test]
    fn ratio_without_denominator_keeps_previous_value() {
        let mut derived = DerivedStats {
            yards_per_carry: 4.2,
            ..DerivedStats::default()
        };
        derived.recompute(&StatLine::new().with(StatField::PassingYards, 100.0));
        assert_eq!(derived.yards_per_carry, 4.2);
        assert_eq!(derived.total_yards, 100.0);
    }
}
