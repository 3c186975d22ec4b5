//! Input tables: the transaction ledger and the customer roster.
//!
//! Both are plain row vectors. The pipeline never mutates them; one
//! `InputTables` value is one immutable snapshot.

use crate::{error::RetentionResult, types::CustomerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub customer_id:      CustomerId,
    pub transaction_date: DateTime<Utc>,
    pub amount:           f64,
    /// Returned units in this transaction.
    pub returns:          u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub customer_id: CustomerId,
    pub segment:     String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputTables {
    pub ledger: Vec<Transaction>,
    pub roster: Vec<RosterEntry>,
}

impl InputTables {
    pub fn new(ledger: Vec<Transaction>, roster: Vec<RosterEntry>) -> Self {
        Self { ledger, roster }
    }

    /// Read both tables from JSON arrays on disk.
    pub fn load(ledger_path: &Path, roster_path: &Path) -> RetentionResult<Self> {
        let ledger: Vec<Transaction> = read_json_rows(ledger_path)?;
        let roster: Vec<RosterEntry> = read_json_rows(roster_path)?;
        log::debug!(
            "Loaded {} ledger rows and {} roster rows",
            ledger.len(),
            roster.len(),
        );
        Ok(Self { ledger, roster })
    }

    /// Write both tables as `ledger.json` and `roster.json` under `dir`.
    pub fn write_json(&self, dir: &Path) -> RetentionResult<()> {
        std::fs::create_dir_all(dir)
            .map_err(|e| anyhow::anyhow!("Cannot create {}: {e}", dir.display()))?;
        for (name, json) in [
            ("ledger.json", serde_json::to_string_pretty(&self.ledger)?),
            ("roster.json", serde_json::to_string_pretty(&self.roster)?),
        ] {
            let path = dir.join(name);
            std::fs::write(&path, json)
                .map_err(|e| anyhow::anyhow!("Cannot write {}: {e}", path.display()))?;
        }
        Ok(())
    }
}

fn read_json_rows<T: serde::de::DeserializeOwned>(path: &Path) -> RetentionResult<Vec<T>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn sample() -> InputTables {
        let day = Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap();
        InputTables::new(
            vec![
                Transaction {
                    customer_id:      "c-000001".into(),
                    transaction_date: day,
                    amount:           129.99,
                    returns:          0,
                },
                Transaction {
                    customer_id:      "c-000002".into(),
                    transaction_date: day - chrono::Duration::days(40),
                    amount:           18.5,
                    returns:          1,
                },
            ],
            vec![RosterEntry {
                customer_id: "c-000001".into(),
                segment:     "loyal".into(),
            }],
        )
    }

    #[test]
    fn written_tables_load_back_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("snapshot");
        let tables = sample();

        tables.write_json(&dir).unwrap();
        let loaded =
            InputTables::load(&dir.join("ledger.json"), &dir.join("roster.json")).unwrap();

        assert_eq!(loaded, tables);
    }

    #[test]
    fn missing_file_names_the_path() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("ledger.json");

        let err = InputTables::load(&missing, &missing).unwrap_err();
        assert!(err.to_string().contains("ledger.json"), "{err}");
    }

    #[test]
    fn malformed_rows_are_a_serialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = temp_dir.path().join("ledger.json");
        let roster = temp_dir.path().join("roster.json");
        std::fs::write(&ledger, r#"[{"customer_id": "a"}]"#).unwrap();
        std::fs::write(&roster, "[]").unwrap();

        assert!(matches!(
            InputTables::load(&ledger, &roster),
            Err(crate::error::RetentionError::Serialization(_))
        ));
    }
}
