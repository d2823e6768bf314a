//! Model loading and hybrid inference components

pub mod hybrid;
pub mod inference;
pub mod loader;

pub use hybrid::WeightTriple;
pub use inference::{PredictionEngine, Regressor};
pub use loader::ModelLoader;
