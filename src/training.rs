//! Gradient boosted win classifier: train, evaluate, persist
//!
//! One-shot flow over the feature matrix from [`crate::features`]: seeded
//! train/test split, boosted-tree fit with the boosting-round count chosen
//! by held-out error, accuracy report, and model serialization.

use crate::features::TrainingData;
use crate::{GridironError, Result, TrainingConfig};
use gbdt::config::Config as GbdtConfig;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::Path;

/// Summary of a completed training run
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub accuracy: f64,
    pub iterations: usize,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Trainer for the boosted win classifier
pub struct GbmTrainer {
    config: TrainingConfig,
}

impl GbmTrainer {
    pub fn new(config: &TrainingConfig) -> Self {
        GbmTrainer {
            config: config.clone(),
        }
    }

    /// Train on a seeded split of the data and evaluate on the held-out part
    pub fn train(&self, data: &TrainingData) -> Result<(GBDT, TrainOutcome)> {
        if data.rows.len() < 2 {
            return Err(GridironError::Model(format!(
                "need at least 2 rows to train, got {}",
                data.rows.len()
            )));
        }

        let (train, test) = split(data, self.config.test_fraction, self.config.seed);
        let feature_size = data.schema.len();

        log::info!(
            "Training on {} rows, validating on {} ({} features)",
            train.len(),
            test.len(),
            feature_size
        );

        // Boosting-round count chosen by held-out error, stopping once the
        // error has not improved within the patience window.
        let max_iterations = self.config.iterations.max(1);
        let step = self
            .config
            .early_stopping_rounds
            .clamp(1, max_iterations);
        let patience = self.config.early_stopping_rounds.max(1);

        let mut best_error = f64::INFINITY;
        let mut best_iterations = step;
        let mut since_best = 0;

        let mut iterations = step;
        loop {
            let model = self.fit(&train, feature_size, iterations);
            let error = classification_error(&model, &test);
            log::info!(
                "Boosting rounds {}: validation error {:.4}",
                iterations,
                error
            );

            if error < best_error {
                best_error = error;
                best_iterations = iterations;
                since_best = 0;
            } else {
                since_best += step;
                if since_best >= patience {
                    log::info!(
                        "Early stopping at {} rounds (best was {})",
                        iterations,
                        best_iterations
                    );
                    break;
                }
            }

            if iterations >= max_iterations {
                break;
            }
            iterations = (iterations + step).min(max_iterations);
        }

        let model = self.fit(&train, feature_size, best_iterations);
        let accuracy = 1.0 - classification_error(&model, &test);

        log::info!(
            "Model accuracy: {:.2} ({} boosting rounds)",
            accuracy,
            best_iterations
        );

        Ok((
            model,
            TrainOutcome {
                accuracy,
                iterations: best_iterations,
                train_rows: train.len(),
                test_rows: test.len(),
            },
        ))
    }

    fn fit(&self, train: &DataVec, feature_size: usize, iterations: usize) -> GBDT {
        let mut cfg = GbdtConfig::new();
        cfg.set_feature_size(feature_size);
        cfg.set_max_depth(self.config.max_depth);
        cfg.set_iterations(iterations);
        cfg.set_shrinkage(self.config.learning_rate as f32);
        cfg.set_loss("LogLikelyhood");
        cfg.set_debug(false);

        let mut model = GBDT::new(&cfg);
        let mut train = train.clone();
        model.fit(&mut train);
        model
    }
}

/// Seeded shuffle split into training and held-out data. Labels are mapped
/// to the ±1 encoding the log-likelihood loss expects.
fn split(data: &TrainingData, test_fraction: f64, seed: u64) -> (DataVec, DataVec) {
    let mut indices: Vec<usize> = (0..data.rows.len()).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_count = ((data.rows.len() as f64 * test_fraction).round() as usize)
        .clamp(1, data.rows.len() - 1);
    let (test_idx, train_idx) = indices.split_at(test_count);

    let to_data = |i: &usize| {
        Data::new_training_data(
            data.rows[*i].clone(),
            1.0,
            signed_label(data.labels[*i]),
            None,
        )
    };

    (
        train_idx.iter().map(to_data).collect(),
        test_idx.iter().map(to_data).collect(),
    )
}

fn signed_label(label: f32) -> f32 {
    if label > 0.5 {
        1.0
    } else {
        -1.0
    }
}

/// Fraction of held-out rows the model gets wrong at the 0.5 threshold
fn classification_error(model: &GBDT, test: &DataVec) -> f64 {
    if test.is_empty() {
        return 0.0;
    }
    let predictions = model.predict(test);
    let wrong = predictions
        .iter()
        .zip(test.iter())
        .filter(|(p, d)| (**p > 0.5) != (d.label > 0.0))
        .count();
    wrong as f64 / test.len() as f64
}

/// Serialize the fitted model to the given path
pub fn save_model<P: AsRef<Path>>(model: &GBDT, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    model
        .save_model(&path.to_string_lossy())
        .map_err(|e| GridironError::Model(format!("failed to save model: {}", e)))
}

/// Load a previously serialized model
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<GBDT> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(GridironError::NoModel);
    }
    GBDT::load_model(&path.to_string_lossy())
        .map_err(|e| GridironError::Model(format!("failed to load model: {}", e)))
}
