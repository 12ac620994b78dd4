use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::constants::pipeline::FIELD_DELIMITER;
use crate::data::Record;
use crate::errors::DedupeError;
use crate::identity::IdentityMapper;
use crate::normalize::normalize_function;
use crate::types::InternalKey;

/// In-memory store of ingested records keyed by internal key.
///
/// Iteration follows ingestion order: a key keeps the position of the line
/// that first introduced its identifier, even when a later line overwrites
/// its record.
#[derive(Clone, Debug, Default)]
pub struct RecordStore {
    records: IndexMap<InternalKey, Record>,
    mapper: IdentityMapper,
}

impl RecordStore {
    /// Create an empty store that assigns keys through `mapper`.
    pub fn new(mapper: IdentityMapper) -> Self {
        Self {
            records: IndexMap::new(),
            mapper,
        }
    }

    /// Ingest every line from `reader`, returning the number of lines read.
    ///
    /// Fails on the first malformed line; records from earlier lines stay in
    /// the store but callers are expected to abandon the run.
    pub fn ingest_reader<R: BufRead>(&mut self, reader: R) -> Result<usize, DedupeError> {
        let mut lines = 0usize;
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            self.ingest_line(idx + 1, &line)?;
            lines += 1;
        }
        Ok(lines)
    }

    /// Parse, normalize, and store one input line. `line_no` is 1-based and
    /// only used for error context.
    pub fn ingest_line(&mut self, line_no: usize, line: &str) -> Result<InternalKey, DedupeError> {
        let (external_id, raw_function) = split_fields(line_no, line)?;
        let key = self.mapper.get_id(external_id)?;
        let record = Record::new(external_id, normalize_function(raw_function));
        if let Some(previous) = self.records.insert(key, record) {
            debug!(
                "[dedupe:ingest] line {} overwrites record for '{}' (key={})",
                line_no, previous.external_id, key
            );
        }
        Ok(key)
    }

    /// Record stored under `key`.
    pub fn get(&self, key: InternalKey) -> Option<&Record> {
        self.records.get(&key)
    }

    /// True when `key` has a record.
    pub fn contains(&self, key: InternalKey) -> bool {
        self.records.contains_key(&key)
    }

    /// Iterate `(key, record)` pairs in ingestion order.
    pub fn iter(&self) -> impl Iterator<Item = (InternalKey, &Record)> + '_ {
        self.records.iter().map(|(&key, record)| (key, record))
    }

    /// Keys in ingestion order.
    pub fn keys(&self) -> impl Iterator<Item = InternalKey> + '_ {
        self.records.keys().copied()
    }

    /// Number of distinct records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing was ingested.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Identity mapper that produced this store's keys.
    pub fn mapper(&self) -> &IdentityMapper {
        &self.mapper
    }
}

/// Ingest all lines from `reader` into a fresh store keyed by `mapper`.
pub fn ingest<R: BufRead>(reader: R, mapper: IdentityMapper) -> Result<RecordStore, DedupeError> {
    let mut store = RecordStore::new(mapper);
    store.ingest_reader(reader)?;
    Ok(store)
}

/// Open `path` and ingest it into a fresh store keyed by `mapper`.
pub fn ingest_file(path: &Path, mapper: IdentityMapper) -> Result<RecordStore, DedupeError> {
    if !path.exists() {
        return Err(DedupeError::MissingInputFile {
            path: path.to_path_buf(),
        });
    }
    info!("[dedupe:ingest] importing data from {}", path.display());
    let file = File::open(path)?;
    let store = ingest(BufReader::new(file), mapper)?;
    info!(
        "[dedupe:ingest] imported {} records from {}",
        store.len(),
        path.display()
    );
    Ok(store)
}

/// Split a line into `(external_id, raw_function)`, ignoring extra columns.
pub fn split_fields(line_no: usize, line: &str) -> Result<(&str, &str), DedupeError> {
    let mut fields = line.split(FIELD_DELIMITER);
    match (fields.next(), fields.next()) {
        (Some(external_id), Some(raw_function)) => Ok((external_id, raw_function)),
        _ => Err(DedupeError::MalformedInput {
            line: line_no,
            fields: line.split(FIELD_DELIMITER).count(),
            content: line.to_string(),
        }),
    }
}
