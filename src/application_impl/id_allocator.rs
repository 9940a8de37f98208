use crate::domain_model::LegacyId;
use crate::domain_port::*;
use crate::logger::*;
use std::sync::Arc;

/// Picks the next id for tables whose text primary key holds sequential integers.
///
/// The read and the caller's insert are not atomic: two concurrent callers can
/// get the same id, and the loser sees a duplicate key at insert time.
pub struct SequentialIdAllocator {
    source: Arc<dyn SequenceSource>,
}

impl SequentialIdAllocator {
    pub fn new(source: Arc<dyn SequenceSource>) -> Self {
        SequentialIdAllocator { source }
    }

    /// Never fails. Store errors degrade to the top numeric id plus one, then to `1`.
    pub async fn allocate(&self, table: SequenceTable) -> LegacyId {
        match self.try_allocate(table).await {
            Ok(id) => id,
            Err(e) => {
                warn!(table = table.table, "id allocation failed, using fallback: {}", e);
                self.fallback(table).await
            }
        }
    }

    async fn try_allocate(&self, table: SequenceTable) -> Result<LegacyId, StoreError> {
        let mut candidate = match self.source.last_by_creation(table).await? {
            Some(last) => {
                let next = successor(last)?;
                if self.source.id_exists(table, next).await? {
                    let max = self.source.max_numeric_id(table, None).await?;
                    successor(max.unwrap_or(last))?
                } else {
                    next
                }
            }
            None => {
                let max = self.source.max_numeric_id(table, None).await?;
                successor(max.unwrap_or(LegacyId(0)))?
            }
        };

        if candidate == LegacyId::SEED && self.source.id_exists(table, LegacyId::SEED).await? {
            let max = self
                .source
                .max_numeric_id(table, Some(LegacyId::SEED))
                .await?;
            candidate = successor(max.unwrap_or(LegacyId::SEED))?;
        }

        debug!(table = table.table, id = %candidate, "allocated id");
        Ok(candidate)
    }

    async fn fallback(&self, table: SequenceTable) -> LegacyId {
        match self.source.top_numeric_id(table).await {
            Ok(Some(top)) => top.next().unwrap_or_else(|| {
                error!(table = table.table, top = %top, "id space exhausted, using 1");
                LegacyId::SEED
            }),
            Ok(None) => LegacyId::SEED,
            Err(e) => {
                error!(table = table.table, "id fallback failed, using 1: {}", e);
                LegacyId::SEED
            }
        }
    }
}

fn successor(id: LegacyId) -> Result<LegacyId, StoreError> {
    id.next()
        .ok_or_else(|| StoreError::Backend(format!("id {} has no successor", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Failures {
        last_by_creation: bool,
        id_exists: bool,
        max_numeric_id: bool,
        top_numeric_id: bool,
    }

    /// Rows of one table as `(id, created_on)`.
    #[derive(Default)]
    struct ScriptedSource {
        rows: Vec<(String, Option<DateTime<Utc>>)>,
        failures: Failures,
        /// Overrides the unfiltered max, like a scan that misses some rows.
        stale_max: Option<Option<LegacyId>>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl ScriptedSource {
        fn with_rows(rows: &[(&str, Option<i64>)]) -> Self {
            ScriptedSource {
                rows: rows
                    .iter()
                    .map(|(id, ts)| {
                        let ts = ts.and_then(|s| Utc.timestamp_opt(s, 0).single());
                        (id.to_string(), ts)
                    })
                    .collect(),
                ..ScriptedSource::default()
            }
        }

        fn failing(mut self, failures: Failures) -> Self {
            self.failures = failures;
            self
        }

        fn numeric(&self) -> impl Iterator<Item = (i64, Option<DateTime<Utc>>)> + '_ {
            self.rows
                .iter()
                .filter_map(|(id, ts)| id.parse::<i64>().ok().map(|n| (n, *ts)))
        }

        fn record(&self, call: &'static str, fail: bool) -> Result<(), StoreError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(call);
            }
            if fail {
                Err(StoreError::Backend(format!("{} unavailable", call)))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait::async_trait]
    impl SequenceSource for ScriptedSource {
        async fn last_by_creation(
            &self,
            _table: SequenceTable,
        ) -> Result<Option<LegacyId>, StoreError> {
            self.record("last_by_creation", self.failures.last_by_creation)?;
            Ok(self
                .numeric()
                .filter_map(|(n, ts)| ts.map(|ts| (ts, n)))
                .max()
                .map(|(_, n)| LegacyId(n)))
        }

        async fn id_exists(&self, _table: SequenceTable, id: LegacyId) -> Result<bool, StoreError> {
            self.record("id_exists", self.failures.id_exists)?;
            Ok(self.rows.iter().any(|(row, _)| *row == id.to_string()))
        }

        async fn max_numeric_id(
            &self,
            _table: SequenceTable,
            excluding: Option<LegacyId>,
        ) -> Result<Option<LegacyId>, StoreError> {
            self.record("max_numeric_id", self.failures.max_numeric_id)?;
            if let (None, Some(stale)) = (excluding, self.stale_max) {
                return Ok(stale);
            }
            Ok(self
                .numeric()
                .map(|(n, _)| n)
                .filter(|n| Some(LegacyId(*n)) != excluding)
                .max()
                .map(LegacyId))
        }

        async fn top_numeric_id(
            &self,
            _table: SequenceTable,
        ) -> Result<Option<LegacyId>, StoreError> {
            self.record("top_numeric_id", self.failures.top_numeric_id)?;
            Ok(self.numeric().map(|(n, _)| n).max().map(LegacyId))
        }
    }

    async fn allocate(source: ScriptedSource) -> LegacyId {
        SequentialIdAllocator::new(Arc::new(source))
            .allocate(SequenceTable::LOGIN_USERS)
            .await
    }

    #[tokio::test]
    async fn empty_table_starts_at_one() {
        assert_eq!(allocate(ScriptedSource::default()).await, LegacyId(1));
    }

    #[tokio::test]
    async fn without_timestamps_uses_max_not_count() {
        let source = ScriptedSource::with_rows(&[("1", None), ("2", None), ("5", None)]);
        assert_eq!(allocate(source).await, LegacyId(6));
    }

    #[tokio::test]
    async fn follows_most_recent_row() {
        let source = ScriptedSource::with_rows(&[("10", Some(100)), ("3", Some(200))]);
        assert_eq!(allocate(source).await, LegacyId(4));
    }

    #[tokio::test]
    async fn stale_recent_row_falls_back_to_max() {
        let source =
            ScriptedSource::with_rows(&[("7", Some(100)), ("3", Some(200)), ("4", None)]);
        assert_eq!(allocate(source).await, LegacyId(8));
    }

    #[tokio::test]
    async fn ignores_non_numeric_ids() {
        let source = ScriptedSource::with_rows(&[("ADMIN", Some(300)), ("2", Some(100))]);
        assert_eq!(allocate(source).await, LegacyId(3));
    }

    #[tokio::test]
    async fn never_hands_out_the_seed_row() {
        // Most recent row is "0" so the heuristic lands on the seed.
        let source = ScriptedSource::with_rows(&[("1", None), ("0", Some(100))]);
        assert_eq!(allocate(source).await, LegacyId(2));

        let source = ScriptedSource::with_rows(&[("1", None), ("0", Some(100)), ("9", None)]);
        assert_eq!(allocate(source).await, LegacyId(10));
    }

    #[tokio::test]
    async fn seed_guard_rechecks_when_max_is_stale() {
        let mut source = ScriptedSource::with_rows(&[("1", None), ("6", None)]);
        source.stale_max = Some(None);
        assert_eq!(allocate(source).await, LegacyId(7));

        let mut source = ScriptedSource::with_rows(&[("1", None)]);
        source.stale_max = Some(None);
        assert_eq!(allocate(source).await, LegacyId(2));
    }

    #[tokio::test]
    async fn query_failure_uses_top_numeric_id() {
        let source = ScriptedSource::with_rows(&[("1", None), ("41", Some(100))]).failing(
            Failures {
                last_by_creation: true,
                ..Failures::default()
            },
        );
        assert_eq!(allocate(source).await, LegacyId(42));

        let source = ScriptedSource::with_rows(&[("12", Some(100))]).failing(Failures {
            id_exists: true,
            ..Failures::default()
        });
        assert_eq!(allocate(source).await, LegacyId(13));

        let source = ScriptedSource::with_rows(&[("5", None)]).failing(Failures {
            max_numeric_id: true,
            ..Failures::default()
        });
        assert_eq!(allocate(source).await, LegacyId(6));
    }

    #[tokio::test]
    async fn total_failure_returns_one() {
        let source = ScriptedSource::with_rows(&[("5", Some(100))]).failing(Failures {
            last_by_creation: true,
            id_exists: true,
            max_numeric_id: true,
            top_numeric_id: true,
        });
        assert_eq!(allocate(source).await, LegacyId(1));
    }

    #[tokio::test]
    async fn top_of_the_id_range_degrades_to_one() {
        let source = ScriptedSource::with_rows(&[("9223372036854775807", Some(100))]);
        assert_eq!(allocate(source).await, LegacyId(1));

        // The collision path jumps to the max, which has no successor either.
        let source = ScriptedSource::with_rows(&[
            ("5", Some(200)),
            ("6", None),
            ("9223372036854775807", None),
        ]);
        assert_eq!(allocate(source).await, LegacyId(1));
    }

    #[tokio::test]
    async fn fallback_runs_only_after_a_failure() {
        let source = Arc::new(ScriptedSource::with_rows(&[("2", Some(100))]));
        let allocator = SequentialIdAllocator::new(source.clone());
        assert_eq!(allocator.allocate(SequenceTable::PERSON).await, LegacyId(3));
        let calls = source.calls.lock().unwrap().clone();
        assert_eq!(calls, vec!["last_by_creation", "id_exists"]);
    }
}
