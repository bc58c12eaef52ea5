use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::rankings::{RankingQuery, get_career_rankings, get_season_rankings};
use crate::stat_fields::StatField;
use crate::store::StatsDb;

#[derive(Debug)]
pub struct ExportReport {
    pub season_rows: usize,
    pub career_rows: usize,
}

const STAT_COLUMNS: &[StatField] = &[
    StatField::PassingYards,
    StatField::PassingTouchdowns,
    StatField::RushingYards,
    StatField::RushingTouchdowns,
    StatField::ReceivingYards,
    StatField::ReceivingTouchdowns,
    StatField::Tackles,
    StatField::Sacks,
    StatField::Interceptions,
    StatField::LongestPass,
    StatField::LongestRush,
    StatField::LongestReception,
];

/// Writes a two-sheet workbook: the season leaderboard and the active-career
/// leaderboard, both ordered by the query's metric.
pub fn export_rankings(
    db: &StatsDb,
    path: &Path,
    season: &str,
    league: &str,
    query: &RankingQuery<'_>,
) -> Result<ExportReport> {
    let season_ranked =
        get_season_rankings(db, season, league, query).context("load season rankings")?;
    let career_ranked = get_career_rankings(db, query).context("load career rankings")?;

    let mut season_rows = vec![header(&[
        "Rank",
        "Player ID",
        "Position",
        query.sort_by,
        "Games",
        "Comp %",
        "Yds/Carry",
        "Yds/Rec",
    ])];
    for row in &season_ranked {
        let r = &row.record;
        let mut cells = vec![
            row.rank.to_string(),
            row.player_id.to_string(),
            row.position.clone(),
            fmt_num(row.value),
            r.games_played.to_string(),
            fmt_num(r.derived.completion_percentage),
            fmt_num(r.derived.yards_per_carry),
            fmt_num(r.derived.yards_per_reception),
        ];
        cells.extend(STAT_COLUMNS.iter().map(|f| fmt_num(r.stats.value(*f))));
        season_rows.push(cells);
    }
    season_rows[0].extend(STAT_COLUMNS.iter().map(|f| f.name().to_string()));

    let mut career_rows = vec![header(&[
        "Rank",
        "Player ID",
        "Position",
        query.sort_by,
        "Seasons",
        "Games",
        "Best Season Yds",
        "Best Season",
        "Most TD (season)",
    ])];
    for row in &career_ranked {
        let r = &row.record;
        let mut cells = vec![
            row.rank.to_string(),
            row.player_id.to_string(),
            row.position.clone(),
            fmt_num(row.value),
            r.total_seasons.to_string(),
            r.total_games_played.to_string(),
            fmt_num(r.best_season_yards),
            r.best_season_year.clone().unwrap_or_default(),
            fmt_num(r.most_touchdowns_in_season),
        ];
        cells.extend(STAT_COLUMNS.iter().map(|f| fmt_num(r.stats.value(*f))));
        career_rows.push(cells);
    }
    career_rows[0].extend(STAT_COLUMNS.iter().map(|f| f.name().to_string()));

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet
        .set_name(sheet_name(season))
        .context("name season sheet")?;
    write_rows(sheet, &season_rows)?;
    let sheet = workbook.add_worksheet();
    sheet.set_name("Career").context("name career sheet")?;
    write_rows(sheet, &career_rows)?;

    workbook
        .save(path)
        .with_context(|| format!("save workbook {}", path.display()))?;

    Ok(ExportReport {
        season_rows: season_ranked.len(),
        career_rows: career_ranked.len(),
    })
}

fn sheet_name(season: &str) -> String {
    let cleaned = season
        .chars()
        .map(|ch| if "[]:*?/\\".contains(ch) { '-' } else { ch })
        .collect::<String>();
    format!("Season {cleaned}").chars().take(31).collect()
}

fn header(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|c| c.to_string()).collect()
}

fn fmt_num(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_names_drop_reserved_characters() {
        assert_eq!(sheet_name("2024/25"), "Season 2024-25");
        assert!(sheet_name(&"x".repeat(40)).chars().count() <= 31);
    }
}
