pub mod engine;
pub mod pipeline;

pub use crate::domain::model::{ImportOutcome, ImportReport, Record, TransformResult};
pub use crate::domain::ports::{Pipeline, Storage, UserGateway};
pub use crate::utils::error::Result;
