use crate::core::{ImportReport, Pipeline};
use crate::utils::error::Result;
use std::time::Instant;

pub struct ImportEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ImportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<ImportReport> {
        let started = Instant::now();
        tracing::info!("Starting user import");

        // Extract
        let rows = self.pipeline.extract().await?;
        tracing::info!("Extracted {} rows", rows.len());

        // Transform
        let transformed = self.pipeline.transform(rows).await?;
        tracing::info!(
            "Prepared {} users ({} rows rejected)",
            transformed.accepted.len(),
            transformed.rejected.len()
        );

        // Load
        let report = self.pipeline.load(transformed).await?;
        tracing::info!(
            "Import finished in {:?}: {} created, {} failed",
            started.elapsed(),
            report.created_count(),
            report.failed_count()
        );

        Ok(report)
    }
}
