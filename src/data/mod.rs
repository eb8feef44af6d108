//! Tabular data loading and train/test splitting

pub mod loader;
pub mod split;

pub use loader::DataLoader;
pub use split::{stratified_split, TrainTestSplit};
