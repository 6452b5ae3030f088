//! Reading bitset fixtures: JSON documents with one presence bitmap per column.
use crate::utils::all_set_bitset;
use anyhow::{Context, Result};
use base64::Engine;
use log::info;
use serde::{Deserialize, Deserializer};
use sha1::{Digest, Sha1};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// All the columns of a fixture
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Bitsets {
    pub row_count: usize,
    pub column_count: usize,
    pub bitsets: BTreeMap<String, BitsetRecord>,
}

/// One column
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BitsetRecord {
    /// count of set bits
    pub set: usize,
    /// the bitmap, base64 in the JSON; missing or null for a column present in every row
    #[serde(default, deserialize_with = "from_base64")]
    pub presence: Option<Vec<u8>>,
}

impl BitsetRecord {
    /// The bitmap; empty for a record that was dropped by [`dedup_bitsets`]
    pub fn bytes(&self) -> &[u8] {
        self.presence.as_deref().unwrap_or_default()
    }
}

fn from_base64<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<u8>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|s| {
            base64::engine::general_purpose::STANDARD
                .decode(s)
                .map_err(serde::de::Error::custom)
        })
        .transpose()
}

/// Parses a fixture, without any cleanup
pub fn parse_bitsets(json: &str) -> Result<Bitsets> {
    serde_json::from_str(json).context("Cannot parse bitset fixture")
}

/// Reduces noise in a fixture:
/// - the first column without a presence bitmap gets an all-set one of `row_count` bits,
///   later ones are dropped
/// - of columns with identical bitmaps only the first one (by name) is kept
pub fn dedup_bitsets(mut bs: Bitsets) -> Bitsets {
    let rows = bs.row_count;
    let mut seen = HashSet::new();
    let mut first_empty = true;

    bs.bitsets.retain(|_name, r| {
        if let Some(p) = &r.presence {
            return seen.insert(Sha1::digest(p).to_vec());
        }
        if first_empty {
            first_empty = false;
            r.presence = Some(all_set_bitset(rows));
            true
        } else {
            false
        }
    });
    bs
}

/// Reads and cleans up the fixture at `path`, see [`dedup_bitsets`]
pub fn read_bitsets(path: impl AsRef<Path>) -> Result<Bitsets> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read fixture {}", path.display()))?;
    let bs = parse_bitsets(&json).with_context(|| format!("In {}", path.display()))?;
    info!(
        "Read {} records, with {} columns",
        bs.row_count, bs.column_count
    );
    let bs = dedup_bitsets(bs);
    info!("... of which {} unique.", bs.bitsets.len());
    Ok(bs)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    const FIXTURE: &str = r#"{
        "rowCount": 12,
        "columnCount": 5,
        "bitsets": {
            "a": { "set": 12, "presence": null },
            "b": { "set": 1, "presence": "gAA=" },
            "c": { "set": 1, "presence": "gAA=" },
            "d": { "set": 12 },
            "e": { "set": 4, "presence": "DwA=" }
        }
    }"#;

    #[test]
    fn test_parse() {
        let bs = parse_bitsets(FIXTURE).unwrap();
        assert_eq!(bs.row_count, 12);
        assert_eq!(bs.column_count, 5);
        assert_eq!(bs.bitsets.len(), 5);
        assert_eq!(bs.bitsets["b"].presence, Some(vec![0x80, 0x00]));
        assert_eq!(bs.bitsets["a"].presence, None);
        assert_eq!(bs.bitsets["d"].presence, None);
    }

    #[test]
    fn test_dedup() {
        let bs = dedup_bitsets(parse_bitsets(FIXTURE).unwrap());
        let names: Vec<_> = bs.bitsets.keys().cloned().collect();
        assert_eq!(names, vec!["a", "b", "e"]);
        assert_eq!(bs.bitsets["a"].bytes(), &[0xFF, 0x0F]);
        assert_eq!(bs.bitsets["e"].bytes(), &[0x0F, 0x00]);
    }

    #[test]
    fn test_bad_base64() {
        let json = r#"{"rowCount": 1, "columnCount": 1, "bitsets": {"a": {"set": 0, "presence": "!!"}}}"#;
        assert!(parse_bitsets(json).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(read_bitsets("/no/such/fixture.json").is_err());
    }
}
