//! 批处理结果与 JSON 汇总（对外暴露）
use serde::Serialize;
use std::error::Error as _;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::engine::ScanOutcome;
use crate::error::ScanError;
use crate::resolver::DiscoveryMiss;

/// 单个文件的处理结果（按解析顺序排列）
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: Result<ScanOutcome, ScanError>,
}

/// 整批运行的结果
#[derive(Debug)]
pub struct BatchReport {
    pub destination: PathBuf,
    pub misses: Vec<DiscoveryMiss>,
    pub outcomes: Vec<FileOutcome>,
    /// 运行结束时产物目录为空并已删除
    pub destination_removed: bool,
}

/// 汇总计数（便于 CLI 打印）
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub files_resolved: usize,
    pub files_missing: usize,
    pub files_flagged: usize,
    pub files_clean: usize,
    pub files_failed: usize,
    pub issue_occurrences: u64,
}

/// 输出项结构（对应 JSON 汇总中 files 数组的单个元素）
#[derive(Debug, Serialize)]
pub struct OutputItem<'a> {
    pub path: &'a Path,
    #[serde(flatten)]
    pub outcome: Option<&'a ScanOutcome>,
    #[serde(flatten)]
    pub failure: Option<FailureItem>,
}

/// JSON 汇总的顶层结构
#[derive(Debug, Serialize)]
pub struct Summary<'a> {
    pub destination: &'a Path,
    pub destination_removed: bool,
    pub stats: BatchStats,
    pub misses: &'a [DiscoveryMiss],
    pub files: Vec<OutputItem<'a>>,
}

#[derive(Debug, Serialize)]
pub struct FailureItem {
    pub status: &'static str,
    pub kind: &'static str,
    pub message: String,
}

impl BatchReport {
    pub fn stats(&self) -> BatchStats {
        let mut stats = BatchStats {
            files_resolved: self.outcomes.len(),
            files_missing: self.misses.len(),
            ..BatchStats::default()
        };
        for o in &self.outcomes {
            match &o.result {
                Ok(ScanOutcome::Flagged { occurrences, .. }) => {
                    stats.files_flagged += 1;
                    stats.issue_occurrences += occurrences;
                }
                Ok(ScanOutcome::Clean { .. }) => stats.files_clean += 1,
                Err(_) => stats.files_failed += 1,
            }
        }
        stats
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Path, &ScanError)> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err().map(|e| (o.path.as_path(), e)))
    }

    pub fn items(&self) -> Vec<OutputItem<'_>> {
        self.outcomes
            .iter()
            .map(|o| match &o.result {
                Ok(outcome) => OutputItem { path: &o.path, outcome: Some(outcome), failure: None },
                Err(e) => OutputItem {
                    path: &o.path,
                    outcome: None,
                    failure: Some(FailureItem { status: "failed", kind: e.kind(), message: describe(e) }),
                },
            })
            .collect()
    }

    pub fn summary(&self) -> Summary<'_> {
        Summary {
            destination: &self.destination,
            destination_removed: self.destination_removed,
            stats: self.stats(),
            misses: &self.misses,
            files: self.items(),
        }
    }

    /// 非 UTF-8 路径无法写入 JSON，返回错误而非 panic
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self.summary())
    }

    pub fn write_json(&self, out: &mut dyn Write) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(&mut *out, &self.summary())
    }
}

/// 错误信息附带底层原因
fn describe(err: &ScanError) -> String {
    match err.source() {
        Some(src) => format!("{err}: {src}"),
        None => err.to_string(),
    }
}
