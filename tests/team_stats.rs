use std::fs;
use std::path::PathBuf;

use rand::SeedableRng;
use rand::rngs::StdRng;

use gridiron_stats::fake_game::fake_game;
use gridiron_stats::ingest::parse_game_json;
use gridiron_stats::play::{GameRecord, Play, PlayType, Side, SignificantPlay, TagSet};
use gridiron_stats::store::StatsDb;
use gridiron_stats::team_stats::{
    analyze_and_save_team_stats, analyze_team_stats, get_team_stats_by_game, save_team_stats,
};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn play(offense: Side, play_type: PlayType, yards: i32, tags: &[SignificantPlay]) -> Play {
    Play {
        offense: Some(offense),
        play_type,
        yards,
        tags: tags.iter().copied().collect::<TagSet>(),
        participants: Vec::new(),
    }
}

fn game(plays: Vec<Play>) -> GameRecord {
    GameRecord {
        game_key: "G1".to_string(),
        game_date: "2024-09-06".to_string(),
        home_team_name: "Harbor".to_string(),
        away_team_name: "Ridge".to_string(),
        plays,
    }
}

#[test]
fn sack_yardage_is_netted_out_of_rushing() {
    let stats = analyze_team_stats(&game(vec![
        play(Side::Home, PlayType::Run, 12, &[]),
        play(Side::Home, PlayType::Pass, -8, &[SignificantPlay::Sack]),
    ]));
    assert_eq!(stats.home.rushing_yards, 4);
    assert_eq!(stats.home.sack_yards, 8);
    assert_eq!(stats.home.total_yards, 4);
    assert_eq!(stats.away.total_yards, 0);
    assert_eq!(stats.home.team_name, "Harbor");
    assert_eq!(stats.away.team_name, "Ridge");
}

#[test]
fn return_yards_land_on_the_side_without_the_ball() {
    let stats = analyze_team_stats(&game(vec![
        play(Side::Away, PlayType::Punt, 14, &[]),
        play(Side::Home, PlayType::Kickoff, 30, &[]),
        play(Side::Home, PlayType::Other, 22, &[SignificantPlay::Intercept]),
    ]));
    assert_eq!(stats.home.punt_return_yards, 14);
    assert_eq!(stats.away.punt_return_yards, 0);
    assert_eq!(stats.away.kickoff_return_yards, 30);
    assert_eq!(stats.home.kickoff_return_yards, 0);
    assert_eq!(stats.away.interception_return_yards, 22);
    assert_eq!(stats.home.turnovers, 1);
    assert_eq!(stats.away.turnovers, 0);
}

#[test]
fn fixture_game_totals() {
    let ingested = parse_game_json(&read_fixture("game_basic.json")).expect("fixture should parse");
    let stats = analyze_team_stats(&ingested.game);

    assert_eq!(stats.home.passing_yards, 31);
    assert_eq!(stats.home.rushing_yards, 4);
    assert_eq!(stats.home.sack_yards, 8);
    assert_eq!(stats.home.interception_return_yards, 17);
    assert_eq!(stats.home.kickoff_return_yards, 24);
    assert_eq!(stats.home.turnovers, 0);
    assert_eq!(stats.home.total_yards, 76);

    assert_eq!(stats.away.passing_yards, 17);
    assert_eq!(stats.away.rushing_yards, 6);
    assert_eq!(stats.away.punt_return_yards, 9);
    // intercept + turnover tags on one clip, plus a lost fumble
    assert_eq!(stats.away.turnovers, 3);
    assert_eq!(stats.away.total_yards, 32);
    assert_eq!(stats.away.penalty_yards, 0);
}

#[test]
fn play_without_offense_side_is_excluded() {
    let mut orphan = play(Side::Home, PlayType::Run, 50, &[]);
    orphan.offense = None;
    let stats = analyze_team_stats(&game(vec![orphan, play(Side::Away, PlayType::Run, 3, &[])]));
    assert_eq!(stats.home.rushing_yards, 0);
    assert_eq!(stats.away.rushing_yards, 3);
}

#[test]
fn total_yards_identity_holds_for_generated_games() {
    let mut rng = StdRng::seed_from_u64(7);
    for n in 0..25 {
        let ingested = fake_game(&mut rng, &format!("G{n}"), "2024-09-06", "Harbor", "Ridge", 140);
        let stats = analyze_team_stats(&ingested.game);
        for side in [Side::Home, Side::Away] {
            let s = stats.side(side);
            assert_eq!(
                s.total_yards,
                s.passing_yards
                    + s.rushing_yards
                    + s.interception_return_yards
                    + s.punt_return_yards
                    + s.kickoff_return_yards
            );

            let gross_run: i64 = ingested
                .game
                .plays
                .iter()
                .filter(|p| p.offense == Some(side) && p.play_type == PlayType::Run && p.yards > 0)
                .map(|p| i64::from(p.yards))
                .sum();
            let sacked: i64 = ingested
                .game
                .plays
                .iter()
                .filter(|p| p.offense == Some(side) && p.has_tag(SignificantPlay::Sack) && p.yards < 0)
                .map(|p| i64::from(p.yards.abs()))
                .sum();
            assert_eq!(s.rushing_yards, gross_run - sacked);
        }
    }
}

#[test]
fn saving_twice_overwrites_instead_of_doubling() {
    let mut db = StatsDb::open_in_memory().unwrap();
    let g = game(vec![
        play(Side::Home, PlayType::Pass, 25, &[]),
        play(Side::Away, PlayType::Run, 9, &[]),
    ]);

    let first = analyze_and_save_team_stats(&mut db, &g).unwrap();
    let stored_once = get_team_stats_by_game(&db, "G1").unwrap().expect("both sides stored");
    analyze_and_save_team_stats(&mut db, &g).unwrap();
    let stored_twice = get_team_stats_by_game(&db, "G1").unwrap().expect("both sides stored");

    assert_eq!(stored_once, first);
    assert_eq!(stored_once, stored_twice);
    assert_eq!(stored_twice.home.passing_yards, 25);

    let docs: Vec<String> = db
        .conn()
        .prepare("SELECT doc FROM team_game_stats WHERE game_key = 'G1' ORDER BY home_or_away")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(docs.len(), 2);
}

#[test]
fn reanalysis_replaces_previous_totals() {
    let mut db = StatsDb::open_in_memory().unwrap();
    let original = game(vec![play(Side::Home, PlayType::Run, 30, &[])]);
    analyze_and_save_team_stats(&mut db, &original).unwrap();

    let corrected = game(vec![play(Side::Home, PlayType::Run, 18, &[])]);
    save_team_stats(&mut db, "G1", &analyze_team_stats(&corrected)).unwrap();

    let stored = get_team_stats_by_game(&db, "G1").unwrap().unwrap();
    assert_eq!(stored.home.rushing_yards, 18);
}

#[test]
fn unknown_game_reads_as_not_found() {
    let db = StatsDb::open_in_memory().unwrap();
    assert!(get_team_stats_by_game(&db, "nope").unwrap().is_none());
}
