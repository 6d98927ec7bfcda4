//! 运行断点 - 业务能力层
//!
//! 每处理完一个月写一次 `manifest.json`，续跑时跳过已完整完成的月份

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, AppResult, ConfigError, LedgerError};
use crate::models::{BatchRun, MonthOutcome, YearMonth};

const MANIFEST_FILE: &str = "manifest.json";

/// 运行清单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: String,
    pub batch: BatchRun,
    pub seed: Option<u64>,
    pub months: Vec<MonthOutcome>,
}

impl RunManifest {
    pub fn new(run_id: impl Into<String>, batch: BatchRun, seed: Option<u64>) -> Self {
        Self {
            run_id: run_id.into(),
            batch,
            seed,
            months: Vec::new(),
        }
    }

    /// 该月是否已完整完成
    pub fn is_completed(&self, month: YearMonth) -> bool {
        self.months
            .iter()
            .any(|m| m.month == month && m.is_complete())
    }

    /// 该月下一次处理的序号
    pub fn next_attempt(&self, month: YearMonth) -> u32 {
        self.months
            .iter()
            .find(|m| m.month == month)
            .map_or(1, |m| m.attempt + 1)
    }

    /// 记录某月结果，覆盖同月的旧记录
    pub fn record(&mut self, outcome: MonthOutcome) {
        self.months.retain(|m| m.month != outcome.month);
        self.months.push(outcome);
        self.months.sort_by_key(|m| m.month);
    }
}

/// 断点存储
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(run_dir: &Path) -> Self {
        Self {
            path: run_dir.join(MANIFEST_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取已有清单，不存在时返回 `None`
    pub fn load(&self) -> AppResult<Option<RunManifest>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| AppError::ledger_read_failed(self.path.display().to_string(), e))?;
        let manifest = serde_json::from_str(&content).map_err(|source| LedgerError::Manifest {
            path: self.path.display().to_string(),
            source,
        })?;

        Ok(Some(manifest))
    }

    /// 读取清单并校验与本次运行参数一致
    pub fn load_for(&self, batch: &BatchRun) -> AppResult<Option<RunManifest>> {
        match self.load()? {
            Some(manifest) if manifest.batch != *batch => Err(ConfigError::CheckpointMismatch {
                path: self.path.display().to_string(),
            }
            .into()),
            other => Ok(other),
        }
    }

    /// 原子写入：先写临时文件再重命名
    pub fn save(&self, manifest: &RunManifest) -> AppResult<()> {
        let path_str = self.path.display().to_string();
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| AppError::ledger_write_failed(&path_str, e))?;
        }

        let content =
            serde_json::to_vec_pretty(manifest).map_err(|source| LedgerError::Manifest {
                path: path_str.clone(),
                source,
            })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).map_err(|e| AppError::ledger_write_failed(&path_str, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| AppError::ledger_write_failed(&path_str, e))?;

        debug!("断点已保存: {}", path_str);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StageReport, StageType};
    use chrono::NaiveDate;

    fn batch() -> BatchRun {
        BatchRun::new(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 3, 31).unwrap(),
            12,
        )
    }

    fn outcome(month: u32, complete: bool) -> MonthOutcome {
        let stages = if complete {
            StageType::CHAIN
                .iter()
                .map(|s| StageReport {
                    stage: *s,
                    attempted: 4,
                    succeeded: 4,
                    skipped: 0,
                })
                .collect()
        } else {
            vec![StageReport {
                stage: StageType::Order,
                attempted: 4,
                succeeded: 0,
                skipped: 0,
            }]
        };
        MonthOutcome {
            month: YearMonth::new(2023, month),
            target_count: 4,
            attempt: 1,
            stages,
            exhausted_at: (!complete).then_some(StageType::Order),
        }
    }

    #[test]
    fn saved_manifest_round_trips_and_tracks_completion() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        assert!(store.load().unwrap().is_none());

        let mut manifest = RunManifest::new("run-1", batch(), Some(7));
        manifest.record(outcome(2, false));
        manifest.record(outcome(1, true));
        store.save(&manifest).unwrap();

        let loaded = store.load_for(&batch()).unwrap().unwrap();
        assert_eq!(loaded, manifest);
        assert!(loaded.is_completed(YearMonth::new(2023, 1)));
        assert!(!loaded.is_completed(YearMonth::new(2023, 2)));
        assert!(!loaded.is_completed(YearMonth::new(2023, 3)));
        assert_eq!(loaded.months[0].month, YearMonth::new(2023, 1));
    }

    #[test]
    fn rerecording_a_month_replaces_it() {
        let mut manifest = RunManifest::new("run-1", batch(), None);
        manifest.record(outcome(2, false));
        manifest.record(outcome(2, true));
        assert_eq!(manifest.months.len(), 1);
        assert!(manifest.is_completed(YearMonth::new(2023, 2)));
    }

    #[test]
    fn attempts_count_up_per_recorded_month() {
        let mut manifest = RunManifest::new("run-1", batch(), None);
        assert_eq!(manifest.next_attempt(YearMonth::new(2023, 2)), 1);

        manifest.record(outcome(2, false));
        assert_eq!(manifest.next_attempt(YearMonth::new(2023, 2)), 2);
        assert_eq!(manifest.next_attempt(YearMonth::new(2023, 3)), 1);
    }

    #[test]
    fn manifest_for_other_batch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        store.save(&RunManifest::new("run-1", batch(), None)).unwrap();

        let other = BatchRun::new(batch().start_date, batch().end_date, 99);
        assert!(store.load_for(&other).unwrap_err().is_fatal());
    }

    #[test]
    fn unreadable_manifest_is_a_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        fs::create_dir_all(store.path()).unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, AppError::Ledger(LedgerError::ReadFailed { .. })));
        assert!(err.is_fatal());
    }
}
