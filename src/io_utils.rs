//! Parsing of tab-delimited junction/intron records into membership bits.
//!
//! Each record carries a comma-separated list of integer indices in a fixed
//! column. Malformed records are never fatal: they contribute no membership.
//! Indices that fall outside the configured population are fatal.

use std::io::BufRead;

use log::warn;

use crate::bit_vector::{BitVector, BitVectorStore};
use crate::error::Result;
use crate::params::StoreParams;
use crate::progress::progress_spinner;

/// Extract the comma-separated index list found after skipping `field_offset`
/// tab-delimited fields.
///
/// Returns `None` for empty lines, lines with too few fields, or any entry
/// that is not a non-negative integer. Empty entries (e.g. a trailing comma)
/// are ignored.
pub fn parse_index_field(line: &str, field_offset: usize) -> Option<Vec<usize>> {
    let line = line.trim_end_matches(['\n', '\r']);
    if line.is_empty() {
        return None;
    }

    let field = line.split('\t').nth(field_offset)?;

    field
        .split(',')
        .filter(|token| !token.is_empty())
        .map(|token| token.parse::<usize>().ok())
        .collect()
}

/// Decode a raw record and extract its index list.
///
/// Records that are not valid UTF-8 are malformed like any other unparsable
/// line.
pub fn parse_record(record: &[u8], field_offset: usize) -> Option<Vec<usize>> {
    let line = std::str::from_utf8(record).ok()?;
    parse_index_field(line, field_offset)
}

/// Fill `members` with the sample indices listed on a junction record.
///
/// The vector is cleared first, so a malformed record leaves it empty. Returns
/// true if the record was parsed.
pub fn junction_members(record: &[u8], field_offset: usize, members: &mut BitVector) -> Result<bool> {
    members.clear();

    let Some(indices) = parse_record(record, field_offset) else {
        return Ok(false);
    };

    for sample in indices {
        members.set(sample)?;
    }

    Ok(true)
}

/// Counts gathered while ingesting a store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub records: usize,
    pub malformed: usize,
}

/// Build a per-entity store from intron records.
///
/// Record `i` (0-based, counting empty and malformed records) becomes bit
/// `i`, and every entity listed on that record has the bit set. Records are
/// split on raw newlines so that undecodable bytes only affect their own
/// record; read failures are still fatal.
pub fn load_store<R: BufRead>(reader: R, params: &StoreParams) -> Result<(BitVectorStore, IngestSummary)> {
    let width = params.intron_count();
    let mut store = BitVectorStore::new(params.sample_count(), width)?;
    let mut summary = IngestSummary::default();

    let spinner = progress_spinner("Loading introns");
    for (bit_position, record) in reader.split(b'\n').enumerate() {
        let record = record?;
        summary.records += 1;

        match parse_record(&record, params.field_offset()) {
            Some(indices) => {
                for entity in indices {
                    store.set(entity, bit_position)?;
                }
            }
            None => summary.malformed += 1,
        }

        if summary.records % 100_000 == 0 {
            spinner.set_position(summary.records as u64);
        }
    }
    spinner.finish_with_message("Loaded introns");

    // records past the width can only get here if none of them listed an entity
    if summary.records > width {
        warn!(
            "Read {} records but vector width is {}; the {} records past the width were empty or malformed.",
            summary.records,
            width,
            summary.records - width
        );
    }

    Ok((store, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JxError;
    use std::io::Cursor;

    fn store_params(samples: usize, introns: usize) -> StoreParams {
        StoreParams::new(samples, introns, 3).unwrap()
    }

    #[test]
    fn test_parse_index_field() {
        let line = "chr1+\t100\t200\t0,3,7\t5,1,2\n";
        assert_eq!(parse_index_field(line, 3), Some(vec![0, 3, 7]));
        assert_eq!(parse_index_field(line, 4), Some(vec![5, 1, 2]));
    }

    #[test]
    fn test_parse_last_field() {
        assert_eq!(parse_index_field("a\tb\t1,2\r\n", 2), Some(vec![1, 2]));
        assert_eq!(parse_index_field("a\tb\t4", 2), Some(vec![4]));
    }

    #[test]
    fn test_parse_malformed() {
        assert_eq!(parse_index_field("", 0), None);
        assert_eq!(parse_index_field("\n", 0), None);
        assert_eq!(parse_index_field("a\tb", 3), None);
        assert_eq!(parse_index_field("a\tb\t1,x,3", 2), None);
        assert_eq!(parse_index_field("a\tb\t-1", 2), None);
    }

    #[test]
    fn test_parse_trailing_comma() {
        assert_eq!(parse_index_field("a\t1,2,\tz", 1), Some(vec![1, 2]));
        assert_eq!(parse_index_field("a\t\tz", 1), Some(vec![]));
    }

    #[test]
    fn test_junction_members() {
        let mut members = BitVector::zeros(8).unwrap();
        members.set(7).unwrap();

        let parsed = junction_members(b"j\t1,4", 1, &mut members).unwrap();
        assert!(parsed);
        assert_eq!(members.ones().collect::<Vec<_>>(), vec![1, 4]);

        let parsed = junction_members(b"garbage", 1, &mut members).unwrap();
        assert!(!parsed);
        assert_eq!(members.count_ones(), 0);

        assert!(matches!(
            junction_members(b"j\t8", 1, &mut members),
            Err(JxError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_load_store() {
        // line index is the bit; listed samples are the entities
        let input = "chr1+\t1\t2\t0,1,3\n\
                     chr1+\t3\t4\t0,3\n\
                     \n\
                     chr1+\t5\t6\t1,3\n";
        let (store, summary) = load_store(Cursor::new(input), &store_params(4, 4)).unwrap();

        assert_eq!(summary.records, 4);
        assert_eq!(summary.malformed, 1);

        assert_eq!(store.vector_at(0).unwrap().ones().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(store.vector_at(1).unwrap().ones().collect::<Vec<_>>(), vec![0, 3]);
        assert_eq!(store.cardinality(2), 0);
        assert_eq!(store.vector_at(3).unwrap().ones().collect::<Vec<_>>(), vec![0, 1, 3]);
    }

    #[test]
    fn test_load_store_entity_out_of_range() {
        let input = "a\tb\tc\t0,5\n";
        let result = load_store(Cursor::new(input), &store_params(4, 4));
        assert!(matches!(result, Err(JxError::IndexOutOfRange { .. })));
    }

    #[test]
    fn test_load_store_too_many_lines() {
        let input = "a\tb\tc\t0\na\tb\tc\t0\n";
        let result = load_store(Cursor::new(input), &store_params(1, 1));
        assert!(matches!(result, Err(JxError::IndexOutOfRange { .. })));
    }

    #[test]
    fn test_undecodable_record_is_malformed() {
        assert_eq!(parse_record(b"a\t\xff\xfe", 1), None);
        assert_eq!(parse_record(b"a\t2,3", 1), Some(vec![2, 3]));

        let mut members = BitVector::zeros(4).unwrap();
        members.set(1).unwrap();
        assert!(!junction_members(b"\xff\t1", 1, &mut members).unwrap());
        assert_eq!(members.count_ones(), 0);
    }

    #[test]
    fn test_load_store_skips_undecodable_record() {
        // the bad record still occupies bit 1
        let input: &[u8] = b"a\tb\tc\t0\n\xff\tb\tc\t1\na\tb\tc\t1\n";
        let (store, summary) = load_store(Cursor::new(input), &StoreParams::new(2, 3, 3).unwrap()).unwrap();

        assert_eq!(summary.records, 3);
        assert_eq!(summary.malformed, 1);
        assert_eq!(store.vector_at(0).unwrap().ones().collect::<Vec<_>>(), vec![0]);
        assert_eq!(store.vector_at(1).unwrap().ones().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_load_store_empty_records_past_width() {
        let input = "a\tb\tc\t0\n\nbad\n";
        let (store, summary) = load_store(Cursor::new(input), &store_params(1, 1)).unwrap();

        assert_eq!(summary.records, 3);
        assert_eq!(summary.malformed, 2);
        assert_eq!(store.cardinality(0), 1);
    }
}
