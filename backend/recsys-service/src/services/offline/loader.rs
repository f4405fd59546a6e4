//! Tabular snapshot reader for offline recommendation tables
//!
//! Supported formats, chosen by extension:
//! - `.csv`: header row, extra columns ignored
//! - `.json` / `.jsonl`: one JSON object per line

use crate::error::{AppError, Result};
use crate::models::{DefaultRow, ItemId, PersonalRow, UserId};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SnapshotFormat {
    Csv,
    JsonLines,
}

impl SnapshotFormat {
    fn detect(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("csv") => Ok(SnapshotFormat::Csv),
            Some("json") | Some("jsonl") => Ok(SnapshotFormat::JsonLines),
            _ => Err(AppError::Validation(format!(
                "unsupported snapshot format: {}",
                path.display()
            ))),
        }
    }
}

/// Read every row of a snapshot file
pub fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let format = SnapshotFormat::detect(path)?;
    let file = File::open(path)
        .map_err(|e| AppError::from(e).with_context(&path.display().to_string()))?;
    let reader = BufReader::new(file);

    match format {
        SnapshotFormat::Csv => {
            let mut csv_reader = csv::ReaderBuilder::new()
                .has_headers(true)
                .trim(csv::Trim::All)
                .from_reader(reader);
            let mut rows = Vec::new();
            for record in csv_reader.deserialize::<T>() {
                rows.push(record?);
            }
            Ok(rows)
        }
        SnapshotFormat::JsonLines => {
            let mut rows = Vec::new();
            for (line_no, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let row = serde_json::from_str(&line).map_err(|e| {
                    AppError::Load(format!("{} line {}: {}", path.display(), line_no + 1, e))
                })?;
                rows.push(row);
            }
            Ok(rows)
        }
    }
}

/// Personal table: each user's items in ascending rank order
#[derive(Debug, Default)]
pub struct PersonalTable {
    pub(crate) recs: HashMap<UserId, Vec<ItemId>>,
    pub(crate) rows: usize,
}

impl PersonalTable {
    pub fn from_rows(rows: Vec<PersonalRow>) -> Self {
        let row_count = rows.len();
        let mut ranked: HashMap<UserId, Vec<(u32, ItemId)>> = HashMap::new();
        for row in rows {
            ranked
                .entry(row.user_id)
                .or_default()
                .push((row.rank, row.item_id));
        }

        let recs = ranked
            .into_iter()
            .map(|(user_id, mut items)| {
                // Stable: equal ranks keep file order
                items.sort_by_key(|(rank, _)| *rank);
                (user_id, items.into_iter().map(|(_, item)| item).collect())
            })
            .collect();

        Self {
            recs,
            rows: row_count,
        }
    }

    pub fn top_k(&self, user_id: UserId, k: usize) -> Option<Vec<ItemId>> {
        self.recs
            .get(&user_id)
            .map(|items| items.iter().take(k).copied().collect())
    }

    pub fn user_count(&self) -> usize {
        self.recs.len()
    }
}

/// Default table: globally ranked popular items
#[derive(Debug, Default)]
pub struct DefaultTable {
    pub(crate) items: Vec<ItemId>,
}

impl DefaultTable {
    pub fn from_rows(mut rows: Vec<DefaultRow>) -> Self {
        rows.sort_by_key(|row| row.rank);
        Self {
            items: rows.into_iter().map(|row| row.item_id).collect(),
        }
    }

    pub fn top_k(&self, k: usize) -> Vec<ItemId> {
        self.items.iter().take(k).copied().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(suffix: &str, body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_personal_csv_with_extra_columns() {
        let file = write_file(
            ".csv",
            "user_id,item_id,score,rank\n1,10,0.9,2\n1,11,0.95,1\n2,20,0.5,1\n",
        );
        let rows: Vec<PersonalRow> = read_rows(file.path()).unwrap();
        let table = PersonalTable::from_rows(rows);

        assert_eq!(table.rows, 3);
        assert_eq!(table.user_count(), 2);
        assert_eq!(table.top_k(1, 10), Some(vec![11, 10]));
        assert_eq!(table.top_k(2, 0), Some(vec![]));
        assert_eq!(table.top_k(3, 10), None);
    }

    #[test]
    fn test_read_default_jsonl() {
        let file = write_file(
            ".jsonl",
            "{\"item_id\":5,\"rank\":2}\n\n{\"item_id\":7,\"rank\":1}\n",
        );
        let rows: Vec<DefaultRow> = read_rows(file.path()).unwrap();
        let table = DefaultTable::from_rows(rows);

        assert_eq!(table.top_k(10), vec![7, 5]);
        assert_eq!(table.top_k(1), vec![7]);
    }

    #[test]
    fn test_float_ranks_from_dataframe_export() {
        let file = write_file(".csv", "item_id,rank\n8,2.0\n9,1.0\n");
        let rows: Vec<DefaultRow> = read_rows(file.path()).unwrap();

        assert_eq!(DefaultTable::from_rows(rows).top_k(10), vec![9, 8]);

        let file = write_file(".csv", "item_id,rank\n8,1.5\n");
        assert!(matches!(
            read_rows::<DefaultRow>(file.path()),
            Err(AppError::Load(_))
        ));
    }

    #[test]
    fn test_equal_ranks_keep_file_order() {
        let rows = vec![
            DefaultRow { item_id: 3, rank: 1 },
            DefaultRow { item_id: 1, rank: 1 },
            DefaultRow { item_id: 2, rank: 0 },
        ];
        assert_eq!(DefaultTable::from_rows(rows).top_k(3), vec![2, 3, 1]);
    }

    #[test]
    fn test_malformed_csv_is_load_error() {
        let file = write_file(".csv", "item_id,rank\nabc,1\n");
        let result: Result<Vec<DefaultRow>> = read_rows(file.path());
        assert!(matches!(result, Err(AppError::Load(_))));
    }

    #[test]
    fn test_malformed_json_reports_line() {
        let file = write_file(".json", "{\"item_id\":1,\"rank\":1}\nnot json\n");
        let err = read_rows::<DefaultRow>(file.path()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_unknown_extension_and_missing_file() {
        let file = write_file(".parquet", "");
        assert!(matches!(
            read_rows::<DefaultRow>(file.path()),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            read_rows::<DefaultRow>(Path::new("/nonexistent/top.csv")),
            Err(AppError::NotFound(_))
        ));
    }
}
