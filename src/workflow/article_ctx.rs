//! 文章处理上下文
//!
//! 封装"我正在处理第几篇文章、它的 ID 是什么"这一信息

use std::fmt::Display;

use crate::models::ArticleId;

/// 文章处理上下文
#[derive(Debug, Clone)]
pub struct ArticleCtx {
    /// 文章ID
    pub article_id: ArticleId,

    /// 本次运行中的序号（从1开始，仅用于日志显示）
    pub index: usize,

    /// 本次运行的文章总数
    pub total: usize,
}

impl ArticleCtx {
    pub fn new(article_id: ArticleId, index: usize, total: usize) -> Self {
        Self {
            article_id,
            index,
            total,
        }
    }

    /// 单独处理一篇文章时使用
    pub fn single(article_id: ArticleId) -> Self {
        Self::new(article_id, 1, 1)
    }
}

impl Display for ArticleCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[文章 {}/{} ID#{}]", self.index, self.total, self.article_id)
    }
}
