//! 错误分类：配置错误（整批中止）与单文件扫描错误（仅跳过该文件）
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// 配置阶段错误：任何一种都会在扫描开始前中止整批运行
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("keyword pattern is empty after removing blank entries")]
    EmptyPattern,

    #[error("keyword pattern `{0}` matches the empty string and would flag every token")]
    PatternMatchesEmpty(String),

    #[error("invalid keyword pattern `{pattern}`")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("source directory does not exist: {0}")]
    SourceMissing(PathBuf),

    #[error("cannot access source directory {path}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("source path is not a directory: {0}")]
    SourceNotDirectory(PathBuf),

    #[error("destination exists and is not a directory: {0}")]
    DestinationNotDirectory(PathBuf),

    #[error("cannot create destination directory {path}")]
    DestinationCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read profile {path}")]
    ProfileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse profile {path}")]
    ProfileParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// 单文件错误：在文件粒度捕获，批处理继续
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("permission denied reading {path}")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 解析之后、读取之前文件消失或不再是普通文件
    #[error("{path} disappeared before it could be scanned")]
    Disappeared { path: PathBuf },

    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} is {size} bytes, over the {limit} byte limit")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    /// 产物写入失败；`rolled_back` 列出已删除的同批产物
    #[error("failed to write artifact {artifact}")]
    Write {
        artifact: PathBuf,
        rolled_back: Vec<PathBuf>,
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    /// 将打开/读取源文件时的 io 错误归类
    pub(crate) fn from_read(path: PathBuf, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => ScanError::PermissionDenied { path, source: err },
            io::ErrorKind::NotFound => ScanError::Disappeared { path },
            _ => ScanError::Read { path, source: err },
        }
    }

    /// 稳定的错误类别名（用于 JSON 汇总）
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::PermissionDenied { .. } => "permission_denied",
            ScanError::Disappeared { .. } => "disappeared",
            ScanError::Read { .. } => "read",
            ScanError::TooLarge { .. } => "too_large",
            ScanError::Write { .. } => "write",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_errors_are_classified_by_kind() {
        let p = PathBuf::from("/var/log/auth.log");
        let denied = ScanError::from_read(p.clone(), io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(denied.kind(), "permission_denied");

        let gone = ScanError::from_read(p.clone(), io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(gone, ScanError::Disappeared { .. }));

        let other = ScanError::from_read(p, io::Error::new(io::ErrorKind::Other, "bad sector"));
        assert_eq!(other.kind(), "read");
    }

    #[test]
    fn messages_name_the_file() {
        let err = ScanError::TooLarge { path: PathBuf::from("kern.log"), size: 10, limit: 5 };
        assert_eq!(err.to_string(), "kern.log is 10 bytes, over the 5 byte limit");
        assert_eq!(
            ConfigError::EmptyPattern.to_string(),
            "keyword pattern is empty after removing blank entries"
        );
    }
}
