//! Derived-table construction
//!
//! Builds the four transformed tables the model consumes: a column
//! selection from a previously loaded table, table-specific cleaning, then
//! a load with an explicit schema instead of an inferred one.

use crate::data::loader::{load_with_options, LoadOptions, LoadReport};
use crate::data::store::Store;
use crate::data::table::{Column, ColumnType, Table, Value};
use crate::Result;

/// Placeholder for missing categorical values
const UNKNOWN: &str = "Unknown";

/// Build every derived table, strictly in sequence
pub fn run_all(store: &mut Store) -> Result<()> {
    weekly_stats(store)?;
    team_stats(store)?;
    game_info(store)?;
    win_totals(store)?;
    Ok(())
}

/// Per-player weekly stats with missing values filled
pub fn weekly_stats(store: &mut Store) -> Result<LoadReport> {
    let schema = vec![
        Column::new("player_name", ColumnType::Text),
        Column::new("player_display_name", ColumnType::Text),
        Column::new("position", ColumnType::Text),
        Column::new("recent_team", ColumnType::Text),
        Column::new("opponent_team", ColumnType::Text),
        Column::new("season", ColumnType::Integer),
        Column::new("week", ColumnType::Integer),
        Column::new("passing_yards", ColumnType::Float),
        Column::new("rushing_yards", ColumnType::Float),
        Column::new("fantasy_points", ColumnType::Float),
    ];

    let mut table = store.fetch_table(
        "SELECT player_name, player_display_name, position, recent_team, \
                opponent_team, season, week, passing_yards, rushing_yards, \
                fantasy_points \
         FROM weekly",
    )?;
    fill_missing(&mut table, &schema);

    load_explicit(store, &table, "league_weekly_stats_transformed", schema)
}

/// Minimal team identity table
pub fn team_stats(store: &mut Store) -> Result<LoadReport> {
    let schema = vec![
        Column::new("team_id", ColumnType::Text),
        Column::new("team_abbr", ColumnType::Text),
        Column::new("team_name", ColumnType::Text),
    ];

    let table = store.fetch_table("SELECT team_id, team_abbr, team_name FROM team_descriptions")?;

    load_explicit(store, &table, "team_stats_transformed", schema)
}

/// Per-game info used for training; nulls pass through unchanged
pub fn game_info(store: &mut Store) -> Result<LoadReport> {
    let schema = vec![
        Column::new("game_id", ColumnType::Text),
        Column::new("season", ColumnType::Integer),
        Column::new("week", ColumnType::Integer),
        Column::new("home_team", ColumnType::Text),
        Column::new("away_team", ColumnType::Text),
        Column::new("home_score", ColumnType::Integer),
        Column::new("away_score", ColumnType::Integer),
    ];

    let table = store.fetch_table(
        "SELECT game_id, season, week, home_team, away_team, home_score, away_score \
         FROM schedules",
    )?;

    load_explicit(store, &table, "game_info_transformed", schema)
}

/// Betting lines with odds columns coerced to numeric
pub fn win_totals(store: &mut Store) -> Result<LoadReport> {
    let schema = vec![
        Column::new("game_id", ColumnType::Text),
        Column::new("market_type", ColumnType::Text),
        Column::new("abbr", ColumnType::Text),
        Column::new("lines", ColumnType::Float),
        Column::new("odds", ColumnType::Float),
        Column::new("opening_lines", ColumnType::Float),
        Column::new("opening_odds", ColumnType::Float),
        Column::new("book", ColumnType::Text),
        Column::new("season", ColumnType::Integer),
    ];

    let mut table = store.fetch_table(
        "SELECT game_id, market_type, abbr, lines, odds, opening_lines, \
                opening_odds, book, season \
         FROM win_totals",
    )?;
    coerce_numeric(
        &mut table,
        &["lines", "odds", "opening_lines", "opening_odds"],
    );

    load_explicit(store, &table, "win_totals_transformed", schema)
}

fn load_explicit(
    store: &mut Store,
    table: &Table,
    destination: &str,
    schema: Vec<Column>,
) -> Result<LoadReport> {
    let options = LoadOptions {
        exclude: vec![],
        schema: Some(schema),
    };
    load_with_options(store, table, destination, &options)
}

/// Fill nulls per target column type: 0 for numeric columns, "Unknown" for
/// the rest.
fn fill_missing(table: &mut Table, schema: &[Column]) {
    let fills: Vec<Value> = schema
        .iter()
        .map(|c| match c.ty {
            ColumnType::Integer => Value::Integer(0),
            ColumnType::Float => Value::Float(0.0),
            _ => Value::Text(UNKNOWN.to_string()),
        })
        .collect();

    for row in table.rows_mut() {
        for (i, value) in row.iter_mut().enumerate() {
            if value.is_null() || value.is_missing_sentinel() {
                if let Some(fill) = fills.get(i) {
                    *value = fill.clone();
                }
            }
        }
    }
}

/// Coerce the named columns to float, with anything non-numeric becoming 0
fn coerce_numeric(table: &mut Table, columns: &[&str]) {
    let indices: Vec<usize> = columns
        .iter()
        .filter_map(|name| table.column_index(name))
        .collect();

    for row in table.rows_mut() {
        for &i in &indices {
            if let Some(value) = row.get_mut(i) {
                let coerced = match &*value {
                    Value::Integer(v) => *v as f64,
                    Value::Float(v) if v.is_finite() => *v,
                    Value::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
                    _ => 0.0,
                };
                *value = Value::Float(coerced);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn seed_weekly(store: &mut Store) {
        let mut table = Table::new(names(&[
            "player_name",
            "player_display_name",
            "position",
            "recent_team",
            "opponent_team",
            "season",
            "week",
            "passing_yards",
            "rushing_yards",
            "fantasy_points",
        ]));
        table.push_row(vec![
            "P.Mahomes".into(),
            "Patrick Mahomes".into(),
            "QB".into(),
            "KC".into(),
            "TB".into(),
            Value::Integer(2023),
            Value::Integer(1),
            Value::Float(305.0),
            Value::Float(12.0),
            Value::Float(24.3),
        ]);
        table.push_row(vec![
            "T.Kelce".into(),
            "Travis Kelce".into(),
            Value::Null,
            "KC".into(),
            "TB".into(),
            Value::Integer(2023),
            Value::Integer(1),
            Value::Null,
            Value::Null,
            Value::Float(15.1),
        ]);
        load(store, &table, "weekly").unwrap();
    }

    #[test]
    fn test_weekly_stats_fills_missing() {
        let mut store = Store::in_memory().unwrap();
        seed_weekly(&mut store);

        let report = weekly_stats(&mut store).unwrap();
        assert_eq!(report.inserted, 2);

        let loaded = store
            .fetch_table(
                "SELECT position, passing_yards FROM league_weekly_stats_transformed \
                 ORDER BY player_name",
            )
            .unwrap();
        // Kelce row: categorical null -> Unknown, numeric null -> 0
        assert_eq!(loaded.rows()[1][0], Value::Text(UNKNOWN.to_string()));
        assert_eq!(loaded.rows()[1][1], Value::Float(0.0));
    }

    #[test]
    fn test_game_info_passes_nulls_through() {
        let mut store = Store::in_memory().unwrap();
        let mut schedules = Table::new(names(&[
            "game_id",
            "season",
            "week",
            "home_team",
            "away_team",
            "home_score",
            "away_score",
        ]));
        schedules.push_row(vec![
            "2023_01_TB_KC".into(),
            Value::Integer(2023),
            Value::Integer(1),
            "KC".into(),
            "TB".into(),
            Value::Integer(27),
            Value::Integer(20),
        ]);
        // Unplayed game: scores are null and must stay null
        schedules.push_row(vec![
            "2023_02_KC_TB".into(),
            Value::Integer(2023),
            Value::Integer(2),
            "TB".into(),
            "KC".into(),
            Value::Null,
            Value::Null,
        ]);
        load(&mut store, &schedules, "schedules").unwrap();

        game_info(&mut store).unwrap();

        let loaded = store
            .fetch_table("SELECT home_score FROM game_info_transformed ORDER BY week")
            .unwrap();
        assert_eq!(loaded.rows()[0][0], Value::Integer(27));
        assert_eq!(loaded.rows()[1][0], Value::Null);
    }

    #[test]
    fn test_win_totals_coerces_odds() {
        let mut store = Store::in_memory().unwrap();
        let mut totals = Table::new(names(&[
            "game_id",
            "market_type",
            "abbr",
            "lines",
            "odds",
            "opening_lines",
            "opening_odds",
            "book",
            "season",
        ]));
        totals.push_row(vec![
            "2023_01_TB_KC".into(),
            "win_total".into(),
            "KC".into(),
            Value::Float(11.5),
            Value::Text("-110".to_string()),
            Value::Text("under".to_string()),
            Value::Null,
            "DraftKings".into(),
            Value::Integer(2023),
        ]);
        load(&mut store, &totals, "win_totals").unwrap();

        win_totals(&mut store).unwrap();

        let loaded = store
            .fetch_table(
                "SELECT lines, odds, opening_lines, opening_odds FROM win_totals_transformed",
            )
            .unwrap();
        assert_eq!(loaded.rows()[0][0], Value::Float(11.5));
        assert_eq!(loaded.rows()[0][1], Value::Float(-110.0));
        // Non-numeric and null both coerce to 0
        assert_eq!(loaded.rows()[0][2], Value::Float(0.0));
        assert_eq!(loaded.rows()[0][3], Value::Float(0.0));
    }

    #[test]
    fn test_team_stats_schema() {
        let mut store = Store::in_memory().unwrap();
        let mut teams = Table::new(names(&["team_id", "team_abbr", "team_name"]));
        teams.push_row(vec![
            "2310".into(),
            "KC".into(),
            "Kansas City Chiefs".into(),
        ]);
        load(&mut store, &teams, "team_descriptions").unwrap();

        team_stats(&mut store).unwrap();

        let schema = store.table_schema("team_stats_transformed").unwrap();
        assert_eq!(
            schema,
            vec![
                ("team_id".to_string(), "TEXT".to_string()),
                ("team_abbr".to_string(), "TEXT".to_string()),
                ("team_name".to_string(), "TEXT".to_string()),
            ]
        );
    }
}
