//! 关键字编译：逗号列表 → 单个大小写不敏感的交替正则
use regex::{Regex, RegexBuilder};

use crate::error::ConfigError;
use crate::options::{split_csv, KeywordSpec, DEFAULT_KEYWORDS};

/// 编译后的关键字匹配器
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    re: Regex,
}

impl KeywordMatcher {
    /// 按关键字来源编译
    pub fn compile(spec: &KeywordSpec) -> Result<Self, ConfigError> {
        match spec {
            KeywordSpec::Default => Self::from_alternation(DEFAULT_KEYWORDS),
            KeywordSpec::List(csv) => {
                // 每一项作为一个交替分支；整体为空则拒绝，避免空模式匹配一切
                let alternation = split_csv(csv)
                    .iter()
                    .map(|k| format!("(?:{k})"))
                    .collect::<Vec<_>>()
                    .join("|");
                Self::from_alternation(&alternation)
            }
        }
    }

    fn from_alternation(pattern: &str) -> Result<Self, ConfigError> {
        if pattern.trim().is_empty() {
            return Err(ConfigError::EmptyPattern);
        }
        let re = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| ConfigError::InvalidPattern { pattern: pattern.to_string(), source })?;
        // 能匹配空串的模式（如 `panic|`、`x*`）会命中每个 token
        if re.is_match("") {
            return Err(ConfigError::PatternMatchesEmpty(pattern.to_string()));
        }
        Ok(Self { re })
    }

    /// 返回首个命中的关键字片段（保留原文大小写）
    pub fn first_match<'t>(&self, token: &'t str) -> Option<&'t str> {
        self.re.find(token).map(|m| m.as_str())
    }

    pub fn as_str(&self) -> &str {
        self.re.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_case_insensitively() {
        let m = KeywordMatcher::compile(&KeywordSpec::Default).unwrap();
        assert_eq!(m.first_match("ERROR"), Some("ERROR"));
        assert_eq!(m.first_match("Failed password for root"), Some("Failed"));
        assert_eq!(m.first_match("Accepted password for root"), None);
    }

    #[test]
    fn user_list_is_trimmed_and_joined() {
        let m = KeywordMatcher::compile(&KeywordSpec::List(" denied , ,timeout".into())).unwrap();
        assert_eq!(m.as_str(), "(?:denied)|(?:timeout)");
        assert_eq!(m.first_match("Connection TIMEOUT after 30s"), Some("TIMEOUT"));
    }

    #[test]
    fn blank_list_is_rejected() {
        let err = KeywordMatcher::compile(&KeywordSpec::List(" , ,  ".into())).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyPattern));
    }

    #[test]
    fn empty_matching_keywords_are_rejected() {
        for csv in ["panic|", "x*", ".?", "disk, (?:)"] {
            let res = KeywordMatcher::compile(&KeywordSpec::List(csv.into()));
            assert!(matches!(res, Err(ConfigError::PatternMatchesEmpty(_))), "{csv}");
        }
        // 尾随逗号产生的空项已被丢弃，不属于空匹配
        assert!(KeywordMatcher::compile(&KeywordSpec::List("error, ".into())).is_ok());
    }

    #[test]
    fn broken_regex_is_a_config_error() {
        let err = KeywordMatcher::compile(&KeywordSpec::List("err(".into())).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }
}
