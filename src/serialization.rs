//! Persists merge-rule tables as an ordered JSON merge list.
//!
//! The on-disk format is a UTF-8 JSON array of `{"pair": [left, right],
//! "new_id": id}` objects in ascending rank order; rank is implicit in list
//! position. Loading rebuilds both lookup directions and recomputes the
//! next available id from the largest id seen.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BytepairError, Result};
use crate::table::{MergeRuleTable, Pair, TokenId};

/// One persisted merge rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SerializedMerge {
    /// `[left, right]` token ids the rule merges.
    pub pair: [TokenId; 2],
    /// Composite id the pair merges into.
    pub new_id: TokenId,
}

fn records(table: &MergeRuleTable) -> Vec<SerializedMerge> {
    table
        .rules()
        .iter()
        .map(|&((left, right), new_id)| SerializedMerge {
            pair: [left, right],
            new_id,
        })
        .collect()
}

/// Serialises `table` to a JSON string.
pub fn table_json(table: &MergeRuleTable, pretty: bool) -> Result<String> {
    let records = records(table);
    let json = if pretty {
        serde_json::to_string_pretty(&records)?
    } else {
        serde_json::to_string(&records)?
    };
    Ok(json)
}

fn into_rules(records: Vec<SerializedMerge>) -> Vec<(Pair, TokenId)> {
    records
        .into_iter()
        .map(|record| ((record.pair[0], record.pair[1]), record.new_id))
        .collect()
}

/// Parses a table from the JSON merge-list format.
pub fn table_from_json(json: &str) -> Result<MergeRuleTable> {
    let records: Vec<SerializedMerge> = serde_json::from_str(json)?;
    MergeRuleTable::from_rules(into_rules(records))
}

/// Writes `table` to `path`, creating or truncating the file.
pub fn save_table<P: AsRef<Path>>(table: &MergeRuleTable, path: P, pretty: bool) -> Result<()> {
    let path = path.as_ref();
    let file =
        File::create(path).map_err(|err| BytepairError::io(err, Some(path.to_path_buf())))?;
    let writer = BufWriter::new(file);
    let records = records(table);
    if pretty {
        serde_json::to_writer_pretty(writer, &records)?;
    } else {
        serde_json::to_writer(writer, &records)?;
    }
    Ok(())
}

/// Reads a table from `path`.
///
/// A missing file surfaces as an IO error; structural problems in the JSON
/// surface as serialization errors.
pub fn load_table<P: AsRef<Path>>(path: P) -> Result<MergeRuleTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| BytepairError::io(err, Some(path.to_path_buf())))?;
    let reader = BufReader::new(file);
    let records: Vec<SerializedMerge> = serde_json::from_reader(reader)?;
    MergeRuleTable::from_rules(into_rules(records))
}
