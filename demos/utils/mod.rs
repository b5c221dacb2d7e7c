use std::path::PathBuf;

/// Returns the path to the sample sales CSV shipped with the crate.
pub fn sample_csv_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join("sales.csv")
}
