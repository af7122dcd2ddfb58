//! Single-game inference
//!
//! Loads the serialized model and feature schema, zero-fills a feature
//! vector of the training shape, sets the matchup fields, and emits a win
//! probability with the 0.5 threshold decision.

use crate::features::FeatureSchema;
use crate::training::load_model;
use crate::{DataConfig, GridironError, Result};
use gbdt::decision_tree::Data;
use gbdt::gradient_boost::GBDT;

/// A single game to predict
#[derive(Debug, Clone)]
pub struct Matchup {
    pub home_team: String,
    pub away_team: String,
    pub week: u32,
}

/// Model output for one matchup
#[derive(Debug, Clone)]
pub struct GamePrediction {
    pub home_team: String,
    pub away_team: String,
    pub home_win_prob: f32,
    pub home_win: bool,
}

impl GamePrediction {
    pub fn predicted_winner(&self) -> &str {
        if self.home_win {
            &self.home_team
        } else {
            &self.away_team
        }
    }
}

/// Predictor holding a loaded model and its feature schema
pub struct Predictor {
    model: GBDT,
    schema: FeatureSchema,
}

impl Predictor {
    /// Load the model and feature schema from the configured paths
    pub fn load(data: &DataConfig) -> Result<Self> {
        let model = load_model(&data.model_path)?;
        let schema = FeatureSchema::load(&data.feature_schema_path)?;
        Ok(Predictor { model, schema })
    }

    pub fn from_parts(model: GBDT, schema: FeatureSchema) -> Self {
        Predictor { model, schema }
    }

    /// Predict the home-win probability for a matchup
    pub fn predict(&self, matchup: &Matchup) -> Result<GamePrediction> {
        let mut features = self.schema.zero_vector();

        let week = self
            .schema
            .index_of("week")
            .ok_or_else(|| GridironError::UnknownColumn("week".to_string()))?;
        features[week] = matchup.week as f32;

        let home = self
            .schema
            .index_of(&format!("home_team_{}", matchup.home_team))
            .ok_or_else(|| GridironError::UnknownTeam(matchup.home_team.clone()))?;
        features[home] = 1.0;

        let away = self
            .schema
            .index_of(&format!("away_team_{}", matchup.away_team))
            .ok_or_else(|| GridironError::UnknownTeam(matchup.away_team.clone()))?;
        features[away] = 1.0;

        let probe = vec![Data::new_test_data(features, None)];
        let home_win_prob = self.model.predict(&probe)[0];

        Ok(GamePrediction {
            home_team: matchup.home_team.clone(),
            away_team: matchup.away_team.clone(),
            home_win_prob,
            home_win: home_win_prob > 0.5,
        })
    }
}
