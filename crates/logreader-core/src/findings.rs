//! 命中计数与排序

use indexmap::IndexMap;

/// 单文件的去重计数表（插入顺序即首次出现顺序）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueTally {
    counts: IndexMap<String, u64>,
}

impl IssueTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次命中：新键计 1，已有键加 1
    pub fn record(&mut self, key: &str) {
        match self.counts.get_mut(key) {
            Some(n) => *n += 1,
            None => {
                self.counts.insert(key.to_string(), 1);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.counts.get(key).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// 不同键的数量
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// 总命中次数
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// 报告顺序：次数降序；次数相同保持首次出现顺序（稳定排序）
    pub fn sorted(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> = self.counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }
}
