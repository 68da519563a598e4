//! # Integration Tests
//!
//! End-to-end tests across crates, against a store in a temporary directory:
//! - seeded raw sample -> basic cleaning -> published clean artifact
//! - provenance recorded by the run registry
//! - configuration loading with step overrides

#[cfg(test)]
mod fixtures {
    use std::fs;
    use std::path::Path;

    use artifact_store::{LocalArtifactStore, LocalRunRegistry};
    use basic_cleaning::{BasicCleaningStage, CleaningArgs};
    use contracts::{ArtifactRef, ArtifactStore, PublishRequest, TrackingSettings};
    use tempfile::TempDir;

    pub const SAMPLE_HEADER: &str = "id,name,host_id,neighbourhood_group,neighbourhood,latitude,longitude,room_type,price,minimum_nights,number_of_reviews,last_review,reviews_per_month";

    /// Six listings; ids 1, 4 and 6 survive cleaning with bounds [10, 350]
    pub const SAMPLE_ROWS: [&str; 6] = [
        "1,Sunny loft,101,Brooklyn,Williamsburg,40.71,-73.95,Entire home/apt,150,2,45,2019-05-21,0.38",
        "2,Budget bunk,102,Queens,Astoria,40.76,-73.92,Shared room,5,1,3,2019-06-01,0.10",
        "3,Penthouse,103,Manhattan,Midtown,40.75,-73.98,Entire home/apt,400,3,12,2019-06-20,0.50",
        "4,Quiet studio,104,Manhattan,Harlem,40.81,-73.94,Private room,350,5,0,,",
        "5,Shore house,105,Staten Island,Tottenville,40.50,-74.30,Entire home/apt,100,2,8,2019-01-02,0.20",
        "6,\"Cozy, bright room\",106,Bronx,Riverdale,41.00,-73.90,Private room,10,1,20,2018-10-19,1.10",
    ];

    pub struct Workspace {
        pub dir: TempDir,
        pub settings: TrackingSettings,
    }

    impl Workspace {
        pub fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let settings =
                TrackingSettings::new("nyc_airbnb", "development", dir.path().join("store"));
            Self { dir, settings }
        }

        pub fn store(&self) -> LocalArtifactStore {
            LocalArtifactStore::new(&self.settings)
        }

        pub fn registry(&self) -> LocalRunRegistry {
            LocalRunRegistry::new(&self.settings)
        }

        pub fn stage(&self) -> BasicCleaningStage<LocalArtifactStore, LocalRunRegistry> {
            BasicCleaningStage::new(self.store(), self.registry())
        }

        /// Publish `content` as a new version of `sample.csv`
        pub fn seed_raw(&self, content: &str) {
            let path = self.dir.path().join("sample.csv");
            fs::write(&path, content).unwrap();
            self.store()
                .publish(
                    &PublishRequest {
                        name: "sample.csv".into(),
                        artifact_type: "raw_data".into(),
                        description: "Raw file as downloaded".into(),
                        source_run: None,
                    },
                    &path,
                )
                .unwrap();
        }

        pub fn seed_sample(&self) {
            let mut content = String::from(SAMPLE_HEADER);
            for row in SAMPLE_ROWS {
                content.push('\n');
                content.push_str(row);
            }
            content.push('\n');
            self.seed_raw(&content);
        }
    }

    pub fn cleaning_args(input: &str) -> CleaningArgs {
        CleaningArgs {
            input_artifact: ArtifactRef::parse(input).unwrap(),
            output_artifact: "clean_sample.csv".into(),
            output_type: "clean_sample".into(),
            output_description: "Data with outliers and null values removed".into(),
            min_price: 10.0,
            max_price: 350.0,
        }
    }

    pub fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }
}

#[cfg(test)]
mod cleaning_e2e_tests {
    use basic_cleaning::{GeoBox, Table, NO_REVIEW};
    use contracts::{ArtifactRef, ArtifactStore, ContractError, RunStatus};

    use super::fixtures::{cleaning_args, read, Workspace, SAMPLE_HEADER};

    #[test]
    fn test_clean_sample_end_to_end() {
        let ws = Workspace::new();
        ws.seed_sample();

        let published = ws.stage().run(&cleaning_args("sample.csv:latest")).unwrap();
        assert_eq!(published.name, "clean_sample.csv");
        assert_eq!(published.version, 1);
        assert_eq!(published.artifact_type, "clean_sample");

        let fetched = ws
            .store()
            .fetch(&ArtifactRef::latest("clean_sample.csv"))
            .unwrap();
        let table = Table::read_csv(&fetched.path).unwrap();

        // column set and order unchanged
        assert_eq!(table.headers.join(","), SAMPLE_HEADER);

        let ids: Vec<_> = table.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(ids, vec!["1", "4", "6"]);

        let price = table.column_index("price").unwrap();
        let lon = table.column_index("longitude").unwrap();
        let lat = table.column_index("latitude").unwrap();
        let review = table.column_index("last_review").unwrap();
        let geo = GeoBox::default();
        for row in &table.rows {
            let p: f64 = row[price].parse().unwrap();
            assert!((10.0..=350.0).contains(&p));
            assert!(geo.contains(row[lon].parse().unwrap(), row[lat].parse().unwrap()));
        }

        assert_eq!(table.rows[0][review], "2019-05-21");
        assert_eq!(table.rows[1][review], NO_REVIEW);
        assert_eq!(table.rows[2][1], "Cozy, bright room");
    }

    #[test]
    fn test_rerun_publishes_new_identical_version() {
        let ws = Workspace::new();
        ws.seed_sample();
        let stage = ws.stage();

        let first = stage.run(&cleaning_args("sample.csv:latest")).unwrap();
        let second = stage.run(&cleaning_args("sample.csv:latest")).unwrap();
        assert_eq!((first.version, second.version), (1, 2));

        let store = ws.store();
        let v1 = store.fetch(&first.reference()).unwrap();
        let v2 = store.fetch(&second.reference()).unwrap();
        assert_eq!(read(&v1.path), read(&v2.path));
        assert_eq!(store.aliases("clean_sample.csv").unwrap()["latest"], 2);
    }

    #[test]
    fn test_cleaning_is_idempotent() {
        let ws = Workspace::new();
        ws.seed_sample();
        let stage = ws.stage();

        let once = stage.run(&cleaning_args("sample.csv:latest")).unwrap();
        let twice = stage.run(&cleaning_args("clean_sample.csv:v1")).unwrap();

        let store = ws.store();
        assert_eq!(
            read(&store.fetch(&once.reference()).unwrap().path),
            read(&store.fetch(&twice.reference()).unwrap().path)
        );
    }

    #[test]
    fn test_missing_price_column_publishes_nothing() {
        let ws = Workspace::new();
        ws.seed_raw("id,latitude,longitude,last_review\n1,40.7,-73.9,2019-05-21\n");

        let err = ws
            .stage()
            .run(&cleaning_args("sample.csv:latest"))
            .unwrap_err();
        assert!(matches!(err, ContractError::Schema { .. }), "{err}");
        assert!(ws.store().versions("clean_sample.csv").unwrap().is_empty());

        let records = ws.registry().records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, RunStatus::Failed);
    }

    #[test]
    fn test_missing_input_artifact() {
        let ws = Workspace::new();
        let err = ws
            .stage()
            .run(&cleaning_args("sample.csv:latest"))
            .unwrap_err();
        assert!(matches!(err, ContractError::ArtifactNotFound { .. }), "{err}");
    }

    #[test]
    fn test_inverted_bounds_rejected_before_run() {
        let ws = Workspace::new();
        ws.seed_sample();

        let mut args = cleaning_args("sample.csv:latest");
        args.min_price = 500.0;
        let err = ws.stage().run(&args).unwrap_err();
        assert!(err.is_configuration());
        assert!(ws.registry().records().unwrap().is_empty());
    }
}

#[cfg(test)]
mod provenance_tests {
    use contracts::{ArtifactRef, ArtifactStore, ArtifactVersion, RunStatus};

    use super::fixtures::{cleaning_args, Workspace};

    #[test]
    fn test_run_records_inputs_and_outputs() {
        let ws = Workspace::new();
        ws.seed_sample();

        let published = ws.stage().run(&cleaning_args("sample.csv:latest")).unwrap();

        let records = ws.registry().records().unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.project, "nyc_airbnb");
        assert_eq!(record.group, "development");
        assert_eq!(record.job_type, basic_cleaning::JOB_TYPE);
        assert_eq!(record.status, RunStatus::Finished);
        assert_eq!(record.inputs, vec!["sample.csv:v1"]);
        assert_eq!(record.outputs, vec!["clean_sample.csv:v1"]);
        assert_eq!(record.config["min_price"], serde_json::json!(10.0));
        assert_eq!(published.source_run.as_deref(), Some(record.id.as_str()));
    }

    #[test]
    fn test_reference_alias_survives_new_versions() {
        let ws = Workspace::new();
        ws.seed_sample();
        let stage = ws.stage();
        let store = ws.store();

        let first = stage.run(&cleaning_args("sample.csv:latest")).unwrap();
        store.add_alias(&first.reference(), "reference").unwrap();
        stage.run(&cleaning_args("sample.csv:latest")).unwrap();

        let reference = ArtifactRef::new(
            "clean_sample.csv",
            ArtifactVersion::Alias("reference".into()),
        );
        assert_eq!(store.fetch(&reference).unwrap().metadata.version, 1);
        assert_eq!(
            store
                .fetch(&ArtifactRef::latest("clean_sample.csv"))
                .unwrap()
                .metadata
                .version,
            2
        );
    }
}

#[cfg(test)]
mod config_tests {
    use std::fs;

    use config_loader::ConfigLoader;
    use contracts::Stage;

    const CONFIG: &str = r#"
[main]
project_name = "nyc_airbnb"
experiment_name = "development"
steps = "all"
components_repository = "components"

[etl]
sample = "sample1.csv"
min_price = 10.0
max_price = 350.0

[data_check]
kl_threshold = 0.2

[modeling]
test_size = 0.2
val_size = 0.2
random_seed = 42
stratify_by = "neighbourhood_group"
max_tfidf_features = 5

[modeling.random_forest]
n_estimators = 100
max_depth = 15
"#;

    #[test]
    fn test_steps_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, CONFIG).unwrap();

        let all = ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(all.active_stages().len(), 5);
        assert!(!all.active_stages().contains(&Stage::TestRegressionModel));

        let only = ConfigLoader::load_with_overrides(&path, Some("basic_cleaning")).unwrap();
        assert_eq!(only.active_stages(), vec![Stage::BasicCleaning]);

        let err = ConfigLoader::load_with_overrides(&path, Some("cleaning")).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_stage_needs_its_section() {
        let without_modeling = CONFIG
            .split("[modeling]")
            .next()
            .unwrap()
            .replace("steps = \"all\"", "steps = \"basic_cleaning,data_check\"");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, &without_modeling).unwrap();

        assert!(ConfigLoader::load_from_path(&path).is_ok());
        let err = ConfigLoader::load_with_overrides(&path, Some("data_split")).unwrap_err();
        assert!(err.is_configuration());
    }
}
