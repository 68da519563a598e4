//! BasicCleaningStage - fetch, clean, publish
//!
//! Wraps [`clean_table`] with the artifact store and run registry side effects.

use contracts::{
    validate_artifact_name, ArtifactMetadata, ArtifactRef, ArtifactStore, ContractError,
    PublishRequest, RunHandle, RunRegistry, RunStatus, Stage,
};
use observability::{record_rows_filtered, CleaningCounts};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::clean::{clean_table, CleaningParams};
use crate::filters::PriceBounds;
use crate::table::Table;

/// Job type recorded in the run registry
pub const JOB_TYPE: &str = "basic_cleaning";

/// Parameters of one cleaning run
#[derive(Debug, Clone, Serialize)]
pub struct CleaningArgs {
    /// Input table, e.g. `sample.csv:latest`
    pub input_artifact: ArtifactRef,
    /// Name of the cleaned artifact (also its file name)
    pub output_artifact: String,
    pub output_type: String,
    pub output_description: String,
    pub min_price: f64,
    pub max_price: f64,
}

/// The cleaning stage bound to a store and a registry
pub struct BasicCleaningStage<S, R> {
    store: S,
    registry: R,
}

impl<S: ArtifactStore, R: RunRegistry> BasicCleaningStage<S, R> {
    pub fn new(store: S, registry: R) -> Self {
        Self { store, registry }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Clean `args.input_artifact` and publish the result as `args.output_artifact`
    ///
    /// # Errors
    /// - configuration error for inverted price bounds or an output name that is
    ///   not a plain file name (before a run is started)
    /// - [`ContractError::ArtifactNotFound`] when the input cannot be fetched
    /// - [`ContractError::Schema`] when a required column is missing; nothing is
    ///   published in that case
    #[instrument(
        skip(self, args),
        fields(input = %args.input_artifact, output = %args.output_artifact)
    )]
    pub fn run(&self, args: &CleaningArgs) -> Result<ArtifactMetadata, ContractError> {
        let bounds = PriceBounds::new(args.min_price, args.max_price)?;
        // the output name becomes a file name inside the scratch directory
        validate_artifact_name(&args.output_artifact)?;
        let run = self
            .registry
            .start_run(JOB_TYPE, &serde_json::to_value(args)?)?;

        let result = self.execute(&run, args, CleaningParams::with_price(bounds));

        let status = if result.is_ok() {
            RunStatus::Finished
        } else {
            RunStatus::Failed
        };
        if let Err(e) = self.registry.finish_run(&run, status) {
            warn!(run_id = %run.id, error = %e, "Failed to close run");
        }

        result
    }

    fn execute(
        &self,
        run: &RunHandle,
        args: &CleaningArgs,
        params: CleaningParams,
    ) -> Result<ArtifactMetadata, ContractError> {
        info!("Fetching input artifact");
        let input = self.store.fetch(&args.input_artifact)?;
        self.registry.use_artifact(run, &input.metadata)?;

        let table = Table::read_csv(&input.path)?;
        let (cleaned, report) = clean_table(table, &params)?;
        info!(
            input_rows = report.input_rows,
            after_price_filter = report.after_price_filter,
            output_rows = report.output_rows,
            missing_review_dates = report.missing_review_dates,
            "Dataset cleaned"
        );
        record_rows_filtered(
            Stage::BasicCleaning,
            CleaningCounts {
                input_rows: report.input_rows,
                output_rows: report.output_rows,
            },
        );

        // Removed when `scratch` drops, on the error paths too
        let scratch = tempfile::tempdir()?;
        let local_path = scratch.path().join(&args.output_artifact);
        cleaned.write_csv(&local_path)?;

        let request = PublishRequest {
            name: args.output_artifact.clone(),
            artifact_type: args.output_type.clone(),
            description: args.output_description.clone(),
            source_run: Some(run.id.clone()),
        };
        let published = self.store.publish(&request, &local_path)?;
        self.registry.log_artifact(run, &published)?;

        info!(
            artifact = %published.reference(),
            rows = report.output_rows,
            "Cleaned dataset published"
        );
        Ok(published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artifact_store::{LocalArtifactStore, LocalRunRegistry};
    use contracts::TrackingSettings;
    use std::path::Path;

    const RAW: &str = "\
id,name,price,longitude,latitude,last_review
1,Budget room,5,-73.95,40.72,2019-05-21
2,Park view,150,-73.97,40.77,2019/06/01
3,Penthouse,5000,-73.98,40.76,
4,Jersey flat,120,-75.00,40.73,2019-01-02
";

    fn stage(root: &Path) -> BasicCleaningStage<LocalArtifactStore, LocalRunRegistry> {
        let settings = TrackingSettings::new("nyc_airbnb", "test", root);
        BasicCleaningStage::new(
            LocalArtifactStore::new(&settings),
            LocalRunRegistry::new(&settings),
        )
    }

    fn seed(
        stage: &BasicCleaningStage<LocalArtifactStore, LocalRunRegistry>,
        dir: &Path,
        csv: &str,
    ) {
        let path = dir.join("sample.csv");
        std::fs::write(&path, csv).unwrap();
        let request = PublishRequest {
            name: "sample.csv".into(),
            artifact_type: "raw_data".into(),
            description: "Raw file as downloaded".into(),
            source_run: None,
        };
        stage.store().publish(&request, &path).unwrap();
    }

    fn args() -> CleaningArgs {
        CleaningArgs {
            input_artifact: ArtifactRef::latest("sample.csv"),
            output_artifact: "clean_sample.csv".into(),
            output_type: "clean_sample".into(),
            output_description: "Data with outliers and null values removed".into(),
            min_price: 10.0,
            max_price: 350.0,
        }
    }

    #[test]
    fn test_run_publishes_cleaned_table() {
        let tmp = tempfile::tempdir().unwrap();
        let stage = stage(&tmp.path().join("store"));
        seed(&stage, tmp.path(), RAW);

        let published = stage.run(&args()).unwrap();
        assert_eq!(published.name, "clean_sample.csv");
        assert_eq!(published.artifact_type, "clean_sample");
        assert_eq!(published.version, 1);

        let fetched = stage
            .store()
            .fetch(&ArtifactRef::latest("clean_sample.csv"))
            .unwrap();
        let table = Table::read_csv(&fetched.path).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0][0], "2");
        assert_eq!(table.rows[0][5], "2019-06-01");

        let records = stage.registry().records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].job_type, JOB_TYPE);
        assert_eq!(records[0].status, RunStatus::Finished);
        assert_eq!(records[0].inputs, vec!["sample.csv:v1"]);
        assert_eq!(records[0].outputs, vec!["clean_sample.csv:v1"]);
        assert_eq!(records[0].config["min_price"], serde_json::json!(10.0));
    }

    #[test]
    fn test_missing_price_column_publishes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let stage = stage(&tmp.path().join("store"));
        seed(
            &stage,
            tmp.path(),
            "id,longitude,latitude,last_review\n1,-73.95,40.72,2019-05-21\n",
        );

        let err = stage.run(&args()).unwrap_err();
        assert!(matches!(err, ContractError::Schema { ref column } if column == "price"));

        let missing = stage
            .store()
            .fetch(&ArtifactRef::latest("clean_sample.csv"))
            .unwrap_err();
        assert!(matches!(missing, ContractError::ArtifactNotFound { .. }));

        let records = stage.registry().records().unwrap();
        assert_eq!(records[0].status, RunStatus::Failed);
        assert!(records[0].outputs.is_empty());
    }

    #[test]
    fn test_missing_input_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let stage = stage(&tmp.path().join("store"));
        let err = stage.run(&args()).unwrap_err();
        assert!(matches!(err, ContractError::ArtifactNotFound { .. }));
    }

    #[test]
    fn test_inverted_bounds_rejected_before_run() {
        let tmp = tempfile::tempdir().unwrap();
        let stage = stage(&tmp.path().join("store"));
        seed(&stage, tmp.path(), RAW);

        let mut inverted = args();
        inverted.min_price = 400.0;
        let err = stage.run(&inverted).unwrap_err();
        assert!(err.is_configuration());
        assert!(stage.registry().records().unwrap().is_empty());
    }

    #[test]
    fn test_rerun_creates_new_version_with_same_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let stage = stage(&tmp.path().join("store"));
        seed(&stage, tmp.path(), RAW);

        let first = stage.run(&args()).unwrap();
        let second = stage.run(&args()).unwrap();
        assert_eq!(second.version, first.version + 1);

        let read = |metadata: &ArtifactMetadata| {
            let fetched = stage.store().fetch(&metadata.reference()).unwrap();
            Table::read_csv(&fetched.path).unwrap()
        };
        assert_eq!(read(&first), read(&second));
    }

    #[test]
    fn test_output_name_cannot_escape_scratch() {
        let tmp = tempfile::tempdir().unwrap();
        let stage = stage(&tmp.path().join("store"));
        seed(&stage, tmp.path(), RAW);

        let escaped = std::env::temp_dir().join("escaped_clean_sample.csv");
        for name in ["../escaped_clean_sample.csv", escaped.to_str().unwrap()] {
            let mut bad = args();
            bad.output_artifact = name.to_string();
            let err = stage.run(&bad).unwrap_err();
            assert!(err.is_configuration(), "{name}: {err}");
        }

        assert!(!escaped.exists());
        assert!(stage.registry().records().unwrap().is_empty());
    }
}
