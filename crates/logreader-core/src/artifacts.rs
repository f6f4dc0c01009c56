//! 产物写入：带时间戳的源文件副本 + 问题报告
//!
//! 命名规则（`{base}`/`{suffix}` 取自源文件名）：
//! - 副本：`{base}_{timestamp}{suffix}`
//! - 问题报告：`{base}_{timestamp}_issues{suffix}`
//! - 关键字报告：`{base}_{timestamp}_issues_keywords{suffix}`
//!
//! 同一秒内重复运行时时间戳相同，此时在时间戳后追加 `-1`、`-2`……，
//! 副本以 `create_new` 独占创建，保证不同运行/线程不会写到同一组产物。
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;

use crate::error::ScanError;
use crate::findings::IssueTally;

/// 同名产物的最大重试次数
const MAX_NAME_ATTEMPTS: usize = 10_000;

/// ISO-8601 本地时间，去掉冒号与小数秒，例如 `2024-01-02T030405`
pub fn timestamp_now() -> String {
    Local::now().format("%Y-%m-%dT%H%M%S").to_string()
}

/// 单个被标记文件的一组产物路径
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactSet {
    pub copy: PathBuf,
    pub issues: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<PathBuf>,
}

impl ArtifactSet {
    /// 按源文件名与时间戳推导路径；`attempt > 0` 时追加序号
    pub fn derive(dest_dir: &Path, source: &Path, timestamp: &str, attempt: usize, keyword_report: bool) -> Self {
        let base = source.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let suffix = source
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let stem = if attempt == 0 { format!("{base}_{timestamp}") } else { format!("{base}_{timestamp}-{attempt}") };

        Self {
            copy: dest_dir.join(format!("{stem}{suffix}")),
            issues: dest_dir.join(format!("{stem}_issues{suffix}")),
            keywords: keyword_report.then(|| dest_dir.join(format!("{stem}_issues_keywords{suffix}"))),
        }
    }

    fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        std::iter::once(&self.copy).chain(std::iter::once(&self.issues)).chain(self.keywords.iter())
    }

    /// 删除已存在的产物，返回实际删除的路径
    pub(crate) fn remove_written(&self) -> Vec<PathBuf> {
        self.paths().filter(|p| fs::remove_file(p).is_ok()).cloned().collect()
    }
}

/// 认领一组未被占用的产物名，并把源文件原样复制到副本路径
pub(crate) fn create_artifacts(
    dest_dir: &Path,
    source: &Path,
    timestamp: &str,
    keyword_report: bool,
) -> Result<ArtifactSet, ScanError> {
    let (set, out) = claim(dest_dir, source, timestamp, keyword_report)?;
    if let Err(err) = write_copy(source, out) {
        let rolled_back = set.remove_written();
        return Err(match err {
            CopyError::Source(e) => ScanError::from_read(source.to_path_buf(), e),
            CopyError::Dest(e) => ScanError::Write { artifact: set.copy, rolled_back, source: e },
        });
    }
    Ok(set)
}

fn claim(
    dest_dir: &Path,
    source: &Path,
    timestamp: &str,
    keyword_report: bool,
) -> Result<(ArtifactSet, File), ScanError> {
    let mut last = None;
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let set = ArtifactSet::derive(dest_dir, source, timestamp, attempt, keyword_report);
        // 报告按追加方式写入，残留的同名报告会污染新结果，跳过该名字
        if set.issues.exists() || set.keywords.as_ref().is_some_and(|k| k.exists()) {
            continue;
        }
        match OpenOptions::new().write(true).create_new(true).open(&set.copy) {
            Ok(file) => return Ok((set, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => last = Some(set.copy),
            Err(e) => return Err(ScanError::Write { artifact: set.copy, rolled_back: Vec::new(), source: e }),
        }
    }
    Err(ScanError::Write {
        artifact: last.unwrap_or_else(|| dest_dir.to_path_buf()),
        rolled_back: Vec::new(),
        source: io::Error::new(io::ErrorKind::AlreadyExists, "no free artifact name for this timestamp"),
    })
}

enum CopyError {
    Source(io::Error),
    Dest(io::Error),
}

/// 逐字节复制源文件内容到已创建的副本
fn write_copy(source: &Path, out: File) -> Result<u64, CopyError> {
    let mut src = File::open(source).map_err(CopyError::Source)?;
    let mut out = BufWriter::new(out);
    let n = io::copy(&mut src, &mut out).map_err(|e| match e.kind() {
        io::ErrorKind::PermissionDenied | io::ErrorKind::NotFound => CopyError::Source(e),
        _ => CopyError::Dest(e),
    })?;
    out.flush().map_err(CopyError::Dest)?;
    Ok(n)
}

/// 以追加方式写入问题报告：每项为「次数、完整命中文本、空行」
pub fn append_issue_report(path: &Path, tally: &IssueTally) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut w = BufWriter::new(file);
    for (text, count) in tally.sorted() {
        writeln!(w, "{count}")?;
        writeln!(w, "{text}")?;
        writeln!(w)?;
    }
    w.flush()
}

/// 关键字报告，格式与排序同问题报告
pub fn append_keyword_report(path: &Path, tally: &IssueTally) -> io::Result<()> {
    append_issue_report(path, tally)
}
