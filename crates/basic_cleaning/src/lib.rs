//! # Basic Cleaning
//!
//! The data-quality stage of the rental price pipeline.
//!
//! Consumes one tabular artifact and publishes a filtered copy:
//! - rows priced outside `[min_price, max_price]` are dropped
//! - `last_review` becomes a `YYYY-MM-DD` date or an empty cell
//! - rows outside the New York City bounding box are dropped
//!
//! Every other column passes through untouched, and row order is preserved.
//!
//! # Example
//!
//! ```no_run
//! use artifact_store::{LocalArtifactStore, LocalRunRegistry};
//! use basic_cleaning::{BasicCleaningStage, CleaningArgs};
//! use contracts::{ArtifactRef, TrackingSettings};
//!
//! let settings = TrackingSettings::new("nyc_airbnb", "development", "artifacts");
//! let stage = BasicCleaningStage::new(
//!     LocalArtifactStore::new(&settings),
//!     LocalRunRegistry::new(&settings),
//! );
//! let published = stage.run(&CleaningArgs {
//!     input_artifact: ArtifactRef::latest("sample.csv"),
//!     output_artifact: "clean_sample.csv".into(),
//!     output_type: "clean_sample".into(),
//!     output_description: "Data with outliers and null values removed".into(),
//!     min_price: 10.0,
//!     max_price: 350.0,
//! }).unwrap();
//! println!("published {}", published.reference());
//! ```

mod clean;
mod filters;
mod stage;
mod table;

pub use clean::{clean_table, CleaningParams, CleaningReport, REQUIRED_COLUMNS};
pub use filters::{
    normalize_review_date, parse_number, parse_review_date, GeoBox, PriceBounds, NO_REVIEW,
};
pub use stage::{BasicCleaningStage, CleaningArgs, JOB_TYPE};
pub use table::Table;
