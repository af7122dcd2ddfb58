//! Feature construction for the win classifier
//!
//! Builds the training matrix from `game_info_transformed`: a binary
//! home-win label, the raw week/score columns, and one-hot encoded team
//! columns. The ordered feature-name schema is persisted next to the model
//! so inference can reproduce the exact vector shape.

use crate::data::table::{Table, Value};
use crate::{GridironError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Ordered feature names shared between training and inference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub names: Vec<String>,
}

impl FeatureSchema {
    /// Base columns plus one-hot team columns, home then away, each sorted
    pub fn new(home_teams: &BTreeSet<String>, away_teams: &BTreeSet<String>) -> Self {
        let mut names = vec![
            "week".to_string(),
            "home_score".to_string(),
            "away_score".to_string(),
        ];
        names.extend(home_teams.iter().map(|t| format!("home_team_{}", t)));
        names.extend(away_teams.iter().map(|t| format!("away_team_{}", t)));
        FeatureSchema { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn zero_vector(&self) -> Vec<f32> {
        vec![0.0; self.names.len()]
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| GridironError::Parse(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|_| GridironError::NoModel)?;
        serde_json::from_str(&content).map_err(|e| GridironError::Parse(e.to_string()))
    }
}

/// Feature matrix with aligned labels (1.0 = home win, 0.0 otherwise)
#[derive(Debug, Clone)]
pub struct TrainingData {
    pub schema: FeatureSchema,
    pub rows: Vec<Vec<f32>>,
    pub labels: Vec<f32>,
}

/// Build the training matrix from a game-info table
pub fn build_training_data(games: &Table) -> Result<TrainingData> {
    let week = required_column(games, "week")?;
    let home_team = required_column(games, "home_team")?;
    let away_team = required_column(games, "away_team")?;
    let home_score = required_column(games, "home_score")?;
    let away_score = required_column(games, "away_score")?;

    let home_teams: BTreeSet<String> = distinct_text(games, home_team);
    let away_teams: BTreeSet<String> = distinct_text(games, away_team);
    let schema = FeatureSchema::new(&home_teams, &away_teams);

    let mut rows = Vec::with_capacity(games.row_count());
    let mut labels = Vec::with_capacity(games.row_count());

    for row in games.rows() {
        let mut features = schema.zero_vector();
        features[0] = value_as_f32(row.get(week));
        features[1] = value_as_f32(row.get(home_score));
        features[2] = value_as_f32(row.get(away_score));

        if let Some(Value::Text(team)) = row.get(home_team) {
            if let Some(i) = schema.index_of(&format!("home_team_{}", team)) {
                features[i] = 1.0;
            }
        }
        if let Some(Value::Text(team)) = row.get(away_team) {
            if let Some(i) = schema.index_of(&format!("away_team_{}", team)) {
                features[i] = 1.0;
            }
        }

        let home_win = match (row.get(home_score), row.get(away_score)) {
            (Some(Value::Integer(h)), Some(Value::Integer(a))) => h > a,
            (Some(Value::Float(h)), Some(Value::Float(a))) => h > a,
            (Some(Value::Integer(h)), Some(Value::Float(a))) => (*h as f64) > *a,
            (Some(Value::Float(h)), Some(Value::Integer(a))) => *h > (*a as f64),
            // Null scores never compare greater
            _ => false,
        };

        rows.push(features);
        labels.push(if home_win { 1.0 } else { 0.0 });
    }

    Ok(TrainingData {
        schema,
        rows,
        labels,
    })
}

fn required_column(table: &Table, name: &str) -> Result<usize> {
    table
        .column_index(name)
        .ok_or_else(|| GridironError::UnknownColumn(name.to_string()))
}

fn distinct_text(table: &Table, index: usize) -> BTreeSet<String> {
    table
        .rows()
        .iter()
        .filter_map(|row| match row.get(index) {
            Some(Value::Text(s)) => Some(s.clone()),
            _ => None,
        })
        .collect()
}

/// Missing or non-numeric values read as 0
fn value_as_f32(value: Option<&Value>) -> f32 {
    match value {
        Some(Value::Integer(i)) => *i as f32,
        Some(Value::Float(f)) if f.is_finite() => *f as f32,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn game_table() -> Table {
        let mut table = Table::new(names(&[
            "game_id",
            "season",
            "week",
            "home_team",
            "away_team",
            "home_score",
            "away_score",
        ]));
        table.push_row(vec![
            "g1".into(),
            Value::Integer(2023),
            Value::Integer(1),
            "KC".into(),
            "TB".into(),
            Value::Integer(27),
            Value::Integer(20),
        ]);
        table.push_row(vec![
            "g2".into(),
            Value::Integer(2023),
            Value::Integer(2),
            "TB".into(),
            "KC".into(),
            Value::Integer(17),
            Value::Integer(24),
        ]);
        table
    }

    #[test]
    fn test_schema_layout() {
        let data = build_training_data(&game_table()).unwrap();
        assert_eq!(
            data.schema.names,
            vec![
                "week",
                "home_score",
                "away_score",
                "home_team_KC",
                "home_team_TB",
                "away_team_KC",
                "away_team_TB",
            ]
        );
    }

    #[test]
    fn test_labels_follow_score_comparison() {
        let data = build_training_data(&game_table()).unwrap();
        // g1: home (KC) 27-20 win; g2: home (TB) 17-24 loss
        assert_eq!(data.labels, vec![1.0, 0.0]);
    }

    #[test]
    fn test_one_hot_rows() {
        let data = build_training_data(&game_table()).unwrap();
        let schema = &data.schema;
        let row = &data.rows[0];
        assert_eq!(row[schema.index_of("week").unwrap()], 1.0);
        assert_eq!(row[schema.index_of("home_team_KC").unwrap()], 1.0);
        assert_eq!(row[schema.index_of("home_team_TB").unwrap()], 0.0);
        assert_eq!(row[schema.index_of("away_team_TB").unwrap()], 1.0);
        assert_eq!(row[schema.index_of("home_score").unwrap()], 27.0);
    }

    #[test]
    fn test_null_scores_label_zero() {
        let mut table = game_table();
        table.push_row(vec![
            "g3".into(),
            Value::Integer(2023),
            Value::Integer(3),
            "KC".into(),
            "TB".into(),
            Value::Null,
            Value::Null,
        ]);
        let data = build_training_data(&table).unwrap();
        assert_eq!(data.labels[2], 0.0);
        let row = &data.rows[2];
        assert_eq!(row[data.schema.index_of("home_score").unwrap()], 0.0);
    }

    #[test]
    fn test_schema_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feature_schema.json");

        let data = build_training_data(&game_table()).unwrap();
        data.schema.save(&path).unwrap();
        let loaded = FeatureSchema::load(&path).unwrap();
        assert_eq!(loaded, data.schema);
    }

    #[test]
    fn test_missing_schema_is_no_model() {
        assert!(matches!(
            FeatureSchema::load("/nonexistent/feature_schema.json"),
            Err(GridironError::NoModel)
        ));
    }
}
