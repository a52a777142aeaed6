//! Selection of exportable records and the shared image/category numbering.

use std::collections::HashMap;

use crate::format::error::ExportError;
use crate::format::traits::{ExportSource, FormatWarning, WarningSeverity};
use crate::model::{BoundingBox2D, HistoryItem, HistoryResult, RecordKey};
use crate::store::{Blob, BlobStore, StoreError};

impl ExportSource for BlobStore {
    fn history_result(&self, key: RecordKey) -> Result<Option<HistoryResult>, StoreError> {
        self.get_history_result(key)
    }

    fn history_image(&self, key: RecordKey) -> Result<Option<Blob>, StoreError> {
        self.get_history_image(key)
    }
}

/// A curated record with its boxes, if its result could be read.
#[derive(Debug, Clone)]
pub struct CuratedRecord<'a> {
    pub item: &'a HistoryItem,
    pub boxes: Option<Vec<BoundingBox2D>>,
}

/// Curated 2D box records of a history list, in list order.
#[derive(Debug, Clone)]
pub struct CuratedDataset<'a> {
    pub records: Vec<CuratedRecord<'a>>,
    pub warnings: Vec<FormatWarning>,
}

impl<'a> CuratedDataset<'a> {
    /// Select the curated 2D box records and read their results.
    ///
    /// Records whose result is missing or is not a box list are kept with
    /// `boxes: None` and a warning.
    pub fn collect(
        history: &'a [HistoryItem],
        source: &dyn ExportSource,
    ) -> Result<Self, ExportError> {
        let curated: Vec<&HistoryItem> = history.iter().filter(|i| i.is_curated_2d()).collect();
        if curated.is_empty() {
            return Err(ExportError::NothingToExport);
        }

        let mut warnings = Vec::new();
        let mut records = Vec::with_capacity(curated.len());
        for item in curated {
            let boxes = match source.history_result(item.id)? {
                Some(HistoryResult::Boxes(boxes)) => {
                    if boxes.is_empty() {
                        warnings.push(
                            FormatWarning::info(format!("Record {} has no boxes", item.id))
                                .with_record(item.id),
                        );
                    }
                    Some(boxes)
                }
                Some(_) => {
                    warnings.push(
                        FormatWarning::warning(format!(
                            "Result of record {} is not a list of 2D boxes",
                            item.id
                        ))
                        .with_record(item.id),
                    );
                    None
                }
                None => {
                    warnings.push(
                        FormatWarning::warning(format!("No stored result for record {}", item.id))
                            .with_record(item.id),
                    );
                    None
                }
            };
            records.push(CuratedRecord { item, boxes });
        }

        for warning in &warnings {
            match warning.severity {
                WarningSeverity::Info => log::info!("{}", warning.message),
                WarningSeverity::Warning => log::warn!("{}", warning.message),
            }
        }
        Ok(Self { records, warnings })
    }

    /// Records that have boxes.
    pub fn with_boxes(&self) -> impl Iterator<Item = (&'a HistoryItem, &[BoundingBox2D])> {
        self.records
            .iter()
            .filter_map(|r| r.boxes.as_deref().map(|boxes| (r.item, boxes)))
    }
}

/// Dense numbering of values in first-seen order.
#[derive(Debug, Clone)]
pub struct FirstSeen<K> {
    order: Vec<K>,
    index: HashMap<K, usize>,
}

impl<K> Default for FirstSeen<K> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: std::hash::Hash + Eq + Clone> FirstSeen<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 0-based index of `key`, and whether it was seen for the first time.
    pub fn insert(&mut self, key: &K) -> (usize, bool) {
        if let Some(&idx) = self.index.get(key) {
            return (idx, false);
        }
        let idx = self.order.len();
        self.order.push(key.clone());
        self.index.insert(key.clone(), idx);
        (idx, true)
    }

    pub fn get(&self, key: &K) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Values in first-seen order.
    pub fn values(&self) -> &[K] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
