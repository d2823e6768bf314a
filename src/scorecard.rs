//! Fixed model performance scorecard for the comparison view.
//!
//! The figures are the held-out evaluation results recorded when the models
//! were trained; they ship with the dashboard rather than being recomputed.

use serde::Serialize;

/// Held-out performance of one trained model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelScore {
    pub model: &'static str,
    pub r2: f64,
    pub rmse: f64,
    pub mae: f64,
}

/// The comparison table: every model evaluated during training, in training
/// order, with the hybrid last.
pub fn reference_scorecard() -> Vec<ModelScore> {
    vec![
        ModelScore {
            model: "Simple Regression",
            r2: -0.0010,
            rmse: 7022.09,
            mae: 3300.09,
        },
        ModelScore {
            model: "Multiple Regression",
            r2: 0.4490,
            rmse: 5210.02,
            mae: 2751.42,
        },
        ModelScore {
            model: "Decision Tree",
            r2: 0.7342,
            rmse: 3618.53,
            mae: 1190.42,
        },
        ModelScore {
            model: "Random Forest",
            r2: 0.8023,
            rmse: 3120.58,
            mae: 1059.69,
        },
        ModelScore {
            model: "LightGBM",
            r2: 0.7650,
            rmse: 3401.94,
            mae: 1293.71,
        },
        ModelScore {
            model: "XGBoost",
            r2: 0.8044,
            rmse: 3103.80,
            mae: 1010.34,
        },
        ModelScore {
            model: "Hybrid",
            r2: 0.7976,
            rmse: 3157.08,
            mae: 1093.13,
        },
    ]
}

/// Row with the highest R².
pub fn best_by_r2(scores: &[ModelScore]) -> Option<&ModelScore> {
    scores
        .iter()
        .max_by(|a, b| a.r2.partial_cmp(&b.r2).expect("scorecard values are finite"))
}

/// Row with the lowest RMSE.
pub fn lowest_rmse(scores: &[ModelScore]) -> Option<&ModelScore> {
    scores
        .iter()
        .min_by(|a, b| a.rmse.partial_cmp(&b.rmse).expect("scorecard values are finite"))
}

/// Row with the lowest MAE.
pub fn lowest_mae(scores: &[ModelScore]) -> Option<&ModelScore> {
    scores
        .iter()
        .min_by(|a, b| a.mae.partial_cmp(&b.mae).expect("scorecard values are finite"))
}
