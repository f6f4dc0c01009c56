//! 日志问题提取核心库
//!
//! 设计要点：
//! - 按冒号切分日志行，对每个 token 做大小写不敏感的关键字匹配；报告中保留原文大小写。
//! - 产物懒创建：文件出现首个命中时才写入带时间戳的副本，无命中的文件不留任何产物。
//! - 单文件内按 token 文本去重计数，报告按次数降序、同次数保持首次出现顺序。
//! - 单文件失败（无权限、文件消失、写入失败）只跳过该文件，不中止整批。
//! - 批处理结束后产物目录若无任何文件则删除，恢复运行前状态。

mod artifacts;
mod config;
mod engine;
mod error;
mod findings;
mod options;
mod outdir;
mod pattern;
mod profile;
mod resolver;
mod scan;
mod types;

pub use artifacts::{append_issue_report, append_keyword_report, timestamp_now, ArtifactSet};
pub use config::ScanConfiguration;
pub use engine::{scan_file, tokenize, ScanOutcome};
pub use error::{ConfigError, ScanError};
pub use findings::IssueTally;
pub use options::{
    FileSelection, KeywordSpec, ScanOptions, DEFAULT_DESTINATION, DEFAULT_FILE_NAMES, DEFAULT_KEYWORDS,
    DEFAULT_SOURCE_DIR, DEFAULT_SUFFIXES,
};
pub use outdir::{ensure_exists, remove_if_empty};
pub use pattern::KeywordMatcher;
pub use profile::Profile;
pub use resolver::{resolve_files, DiscoveryMiss, ResolvedFileSet};
pub use scan::run_batch;
pub use types::{BatchReport, BatchStats, FailureItem, FileOutcome, OutputItem, Summary};
