// 🔗 Pipeline - load → flatten → write, wired from one configuration

use crate::db::write_database;
use crate::loader::{load_customer_records, load_vip_ids};
use crate::records::CustomerRecord;
use crate::sink::write_table;
use crate::transform::{FlattenReport, FlatteningTransformer, OutputRow};
use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// Output artifact kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Sqlite,
}

impl OutputFormat {
    pub fn name(&self) -> &str {
        match self {
            OutputFormat::Csv => "CSV",
            OutputFormat::Sqlite => "SQLite",
        }
    }

    /// Default file name when no output path is given
    pub fn default_output(&self) -> PathBuf {
        match self {
            OutputFormat::Csv => PathBuf::from("cleaned_customer_orders.csv"),
            OutputFormat::Sqlite => PathBuf::from("cleaned_customer_orders.db"),
        }
    }

    pub fn write(&self, path: &Path, rows: &[OutputRow]) -> Result<()> {
        match self {
            OutputFormat::Csv => write_table(path, rows),
            OutputFormat::Sqlite => write_database(path, rows).map(|_| ()),
        }
    }
}

/// Input and output locations for one run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub customers_path: PathBuf,
    pub vip_path: PathBuf,
    pub output_path: PathBuf,
    pub format: OutputFormat,
}

/// Loaded inputs, ready to be flattened
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    pub vip_ids: HashSet<i64>,
    pub customers: Vec<CustomerRecord>,
}

impl Extractor {
    pub fn new(vip_ids: HashSet<i64>, customers: Vec<CustomerRecord>) -> Self {
        Extractor { vip_ids, customers }
    }

    pub fn load(config: &PipelineConfig) -> Result<Self> {
        let vip_ids = load_vip_ids(&config.vip_path)?;
        let customers = load_customer_records(&config.customers_path)?;

        info!(
            vip_ids = vip_ids.len(),
            customers = customers.len(),
            "loaded inputs"
        );

        Ok(Extractor::new(vip_ids, customers))
    }

    pub fn transform(&self) -> (Vec<OutputRow>, FlattenReport) {
        FlatteningTransformer::new().flatten(&self.vip_ids, &self.customers)
    }
}

/// Run the whole pipeline; only I/O problems fail it
pub fn run(config: &PipelineConfig) -> Result<FlattenReport> {
    let extractor = Extractor::load(config)?;
    let (rows, report) = extractor.transform();

    config.format.write(&config.output_path, &rows)?;

    info!(
        rows = rows.len(),
        format = config.format.name(),
        path = %config.output_path.display(),
        "saved table"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_outputs() {
        assert_eq!(
            OutputFormat::Csv.default_output(),
            PathBuf::from("cleaned_customer_orders.csv")
        );
        assert_eq!(
            OutputFormat::Sqlite.default_output(),
            PathBuf::from("cleaned_customer_orders.db")
        );
        assert_eq!(OutputFormat::default(), OutputFormat::Csv);
    }

    #[test]
    fn test_run_missing_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            customers_path: dir.path().join("missing.json"),
            vip_path: dir.path().join("missing.txt"),
            output_path: dir.path().join("out.csv"),
            format: OutputFormat::Csv,
        };

        assert!(run(&config).is_err());
        assert!(!config.output_path.exists());
    }

    #[test]
    fn test_extractor_transform() {
        let customers: Vec<CustomerRecord> = serde_json::from_str(
            r#"[{"id": 4, "name": "Dee", "registration_date": "2022-06-01",
                 "orders": [{"order_id": 1, "order_date": "2022-06-02",
                             "items": [{"item_id": 9, "product_name": "Novel", "category": 3,
                                        "price": "$15.00", "quantity": 2}]}]}]"#,
        )
        .unwrap();

        let extractor = Extractor::new(HashSet::from([4]), customers);
        let (rows, report) = extractor.transform();

        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_vip);
        assert_eq!(rows[0].category, "Books");
        assert_eq!(rows[0].total_item_price, 30.0);
        assert_eq!(report.rows_emitted, 1);
    }
}
