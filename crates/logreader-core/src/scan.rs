//! 扫描主流程与并行调度
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::ScanConfiguration;
use crate::engine::scan_file;
use crate::error::ConfigError;
use crate::outdir::{ensure_exists, remove_if_empty};
use crate::types::{BatchReport, FileOutcome};

/// 执行一次完整批处理：创建产物目录 → 逐个扫描 → 目录为空则删除
///
/// 只有配置类错误会中止整批；单文件错误被记录在对应的 `FileOutcome` 中，
/// 之前文件已写出的产物保留。
pub fn run_batch(cfg: &ScanConfiguration) -> Result<BatchReport, ConfigError> {
    ensure_exists(cfg.destination())?;

    let files = &cfg.files().files;
    info!(files = files.len(), pattern = cfg.matcher().as_str(), "scanning");

    let outcomes = if cfg.threads() > 1 && files.len() > 1 {
        scan_parallel(cfg, files)
    } else {
        files.iter().map(|p| scan_one(cfg, p)).collect()
    };

    // 所有文件处理完（并行时即所有任务汇合）后再检查目录
    let destination_removed = remove_if_empty(cfg.destination());

    Ok(BatchReport {
        destination: cfg.destination().to_path_buf(),
        misses: cfg.files().misses.clone(),
        outcomes,
        destination_removed,
    })
}

fn scan_one(cfg: &ScanConfiguration, path: &Path) -> FileOutcome {
    let result = scan_file(cfg, path);
    if let Err(e) = &result {
        warn!(file = %path.display(), error = %e, "skipping file");
    }
    FileOutcome { path: path.to_path_buf(), result }
}

/// 并行调度：每个文件独立计数，结果按解析顺序收集
fn scan_parallel(cfg: &ScanConfiguration, files: &[PathBuf]) -> Vec<FileOutcome> {
    use rayon::prelude::*;

    match rayon::ThreadPoolBuilder::new().num_threads(cfg.threads()).build() {
        Ok(pool) => pool.install(|| files.par_iter().map(|p| scan_one(cfg, p)).collect()),
        Err(e) => {
            warn!(error = %e, "thread pool unavailable, scanning sequentially");
            files.iter().map(|p| scan_one(cfg, p)).collect()
        }
    }
}
