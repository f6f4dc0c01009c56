//! 单文件扫描状态机
//!
//! 状态：`NotStarted → Scanning → (Clean | Flagged)`。
//! - 首次命中时创建产物（副本 + 报告路径），之后的命中只更新计数。
//! - 没有命中的文件不产生任何产物。
//! - 行按冒号切分为 token，去空白、丢弃空 token 后逐个匹配。
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::artifacts::{append_issue_report, append_keyword_report, create_artifacts, timestamp_now, ArtifactSet};
use crate::config::ScanConfiguration;
use crate::error::ScanError;
use crate::findings::IssueTally;

/// 单文件扫描结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanOutcome {
    Clean { lines: u64 },
    Flagged {
        artifacts: ArtifactSet,
        lines: u64,
        distinct_issues: usize,
        occurrences: u64,
    },
}

impl ScanOutcome {
    pub fn is_flagged(&self) -> bool {
        matches!(self, ScanOutcome::Flagged { .. })
    }

    pub fn artifacts(&self) -> Option<&ArtifactSet> {
        match self {
            ScanOutcome::Flagged { artifacts, .. } => Some(artifacts),
            ScanOutcome::Clean { .. } => None,
        }
    }
}

#[derive(Debug)]
enum ScanState {
    NotStarted,
    Scanning,
    Flagged(ArtifactSet),
}

/// 行切分：按字面冒号拆分、去两端空白、丢弃空 token
pub fn tokenize(line: &str) -> impl Iterator<Item = &str> {
    line.split(':').map(str::trim).filter(|t| !t.is_empty())
}

struct FileScan<'a> {
    cfg: &'a ScanConfiguration,
    path: &'a Path,
    state: ScanState,
    issues: IssueTally,
    keywords: IssueTally,
    lines: u64,
}

impl<'a> FileScan<'a> {
    fn new(cfg: &'a ScanConfiguration, path: &'a Path) -> Self {
        Self {
            cfg,
            path,
            state: ScanState::NotStarted,
            issues: IssueTally::new(),
            keywords: IssueTally::new(),
            lines: 0,
        }
    }

    fn feed_line(&mut self, line: &str) -> Result<(), ScanError> {
        self.lines += 1;
        for token in tokenize(line) {
            let Some(keyword) = self.cfg.matcher().first_match(token) else { continue };
            if !matches!(self.state, ScanState::Flagged(_)) {
                self.flag()?;
            }
            debug!(file = %self.path.display(), %token, "issue token");
            self.issues.record(token);
            if self.cfg.keyword_report() {
                self.keywords.record(keyword);
            }
        }
        Ok(())
    }

    /// 首次命中：认领产物名并写入副本
    fn flag(&mut self) -> Result<(), ScanError> {
        let set = create_artifacts(self.cfg.destination(), self.path, &timestamp_now(), self.cfg.keyword_report())?;
        info!(
            source = %self.path.display(),
            copy = %set.copy.display(),
            report = %set.issues.display(),
            "issues found, copied log and writing report"
        );
        self.state = ScanState::Flagged(set);
        Ok(())
    }

    fn finish(self) -> Result<ScanOutcome, ScanError> {
        let set = match self.state {
            ScanState::Flagged(set) => set,
            ScanState::NotStarted | ScanState::Scanning => return Ok(ScanOutcome::Clean { lines: self.lines }),
        };

        let mut written = append_issue_report(&set.issues, &self.issues).map_err(|e| (set.issues.clone(), e));
        if written.is_ok() {
            if let Some(kw_path) = &set.keywords {
                written = append_keyword_report(kw_path, &self.keywords).map_err(|e| (kw_path.clone(), e));
            }
        }
        if let Err((artifact, source)) = written {
            let rolled_back = set.remove_written();
            return Err(ScanError::Write { artifact, rolled_back, source });
        }

        Ok(ScanOutcome::Flagged {
            distinct_issues: self.issues.len(),
            occurrences: self.issues.total(),
            lines: self.lines,
            artifacts: set,
        })
    }

    /// 中途失败时撤销已写入的产物
    fn abort(self, err: ScanError) -> ScanError {
        if let ScanState::Flagged(set) = &self.state {
            let removed = set.remove_written();
            debug!(file = %self.path.display(), ?removed, "rolled back partial artifacts");
        }
        err
    }
}

/// 扫描单个文件；读取前再次确认文件仍存在且为普通文件
pub fn scan_file(cfg: &ScanConfiguration, path: &Path) -> Result<ScanOutcome, ScanError> {
    let md = fs::metadata(path).map_err(|e| ScanError::from_read(path.to_path_buf(), e))?;
    if !md.is_file() {
        return Err(ScanError::Disappeared { path: path.to_path_buf() });
    }
    if let Some(limit) = cfg.max_file_size() {
        if md.len() > limit {
            return Err(ScanError::TooLarge { path: path.to_path_buf(), size: md.len(), limit });
        }
    }

    let file = File::open(path).map_err(|e| ScanError::from_read(path.to_path_buf(), e))?;
    let mut reader = BufReader::new(file);
    let mut scan = FileScan::new(cfg, path);
    scan.state = ScanState::Scanning;

    // 按字节读取行，非 UTF-8 内容做有损转换，避免整文件因编码失败被跳过
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => return Err(scan.abort(ScanError::from_read(path.to_path_buf(), e))),
        }
        let line = String::from_utf8_lossy(&buf);
        if let Err(e) = scan.feed_line(line.trim_end_matches(['\n', '\r'])) {
            return Err(scan.abort(e));
        }
    }

    scan.finish()
}
