//! 扫描选项（构建 ScanConfiguration 的原始输入）
use std::path::PathBuf;

/// 默认源目录（系统日志目录）
pub const DEFAULT_SOURCE_DIR: &str = "/var/log";
/// 默认产物目录（相对当前工作目录）
pub const DEFAULT_DESTINATION: &str = "./logs";
/// 未指定文件时使用的内置文件名列表
pub const DEFAULT_FILE_NAMES: &[&str] = &["boot.log", "messages.log", "auth.log", "daemon.log", "kern.log"];
/// 目录枚举时接受的后缀
pub const DEFAULT_SUFFIXES: &[&str] = &[".log", ".txt"];
/// 默认关键字（交替式）
pub const DEFAULT_KEYWORDS: &str = "error|failed|warning";

/// 文件选择方式
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FileSelection {
    /// 内置默认文件名列表
    #[default]
    Default,
    /// 显式文件名列表（相对源目录）
    Names(Vec<String>),
    /// 枚举源目录中带指定后缀的文件
    Suffixes(Vec<String>),
}

impl FileSelection {
    /// 逗号分隔的文件名列表
    pub fn from_csv(csv: &str) -> Self {
        FileSelection::Names(split_csv(csv))
    }
}

/// 关键字来源
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KeywordSpec {
    #[default]
    Default,
    /// 用户提供的逗号分隔关键字
    List(String),
}

/// 扫描选项
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub source_dir: PathBuf,
    pub selection: FileSelection,
    pub keywords: KeywordSpec,
    pub destination: PathBuf,
    /// 额外生成仅含关键字的统计报告
    pub keyword_report: bool,
    /// 最大文件大小（字节）；超过则跳过
    pub max_file_size: Option<u64>,
    /// 线程数：None 表示自动（等于 CPU 核数）；Some(1) 走串行
    pub threads: Option<usize>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
            selection: FileSelection::Default,
            keywords: KeywordSpec::Default,
            destination: PathBuf::from(DEFAULT_DESTINATION),
            keyword_report: false,
            max_file_size: None,
            threads: Some(1),
        }
    }
}

/// 拆分逗号列表：去空白、丢弃空项
pub(crate) fn split_csv(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
