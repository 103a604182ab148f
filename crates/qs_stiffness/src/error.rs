// crates/qs_stiffness/src/error.rs
//! 刚度计算错误类型
//!
//! 数值奇异不是错误：它以 `None`/NaN 在数据中传递。这里只收录配置错误、
//! 缓存文件错误与底层错误的透传。

use qs_foundation::QsError;
use qs_geo::GeoError;
use thiserror::Error;

/// 刚度模块结果类型别名
pub type StiffResult<T> = Result<T, StiffnessError>;

/// 刚度错误枚举
#[derive(Error, Debug)]
pub enum StiffnessError {
    /// 请求的操作缺少必需的聚合阶段
    #[error("缺少聚合阶段: {stage}")]
    MissingAggregation {
        /// 阶段名
        stage: &'static str,
    },

    /// 不允许的自作用请求
    #[error("不允许子段对自身的作用: {id}")]
    SelfInteraction {
        /// 子段编号
        id: usize,
    },

    /// 子段在给定间距下没有任何面元
    #[error("子段 {section} 在当前网格间距下没有面元")]
    NoPatches {
        /// 子段编号
        section: usize,
    },

    /// 子段编号与数组下标不一致
    #[error("子段编号必须稠密且从 0 开始: 下标 {index} 处编号为 {id}")]
    SectionIdMismatch {
        /// 数组下标
        index: usize,
        /// 实际编号
        id: usize,
    },

    /// 多源查询没有任何可用源
    #[error("接收子段 {receiver} 没有可用的源子段")]
    NoSources {
        /// 接收子段编号
        receiver: usize,
    },

    /// 缓存维度不一致
    #[error("缓存维度不一致: 期望 {expected} 个子段, 实际 {actual}")]
    CacheShapeMismatch {
        /// 期望子段数
        expected: usize,
        /// 实际子段数
        actual: usize,
    },

    /// 缓存文件行格式错误
    #[error("缓存文件第 {line} 行格式错误: {message}")]
    MalformedCacheRow {
        /// 行号（含表头，从 1 开始）
        line: u64,
        /// 错误描述
        message: String,
    },

    /// IO 错误
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// CSV 读写错误
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// 投影错误
    #[error(transparent)]
    Geo(#[from] GeoError),

    /// 基础层错误
    #[error(transparent)]
    Foundation(#[from] QsError),
}

impl StiffnessError {
    /// 创建缺少聚合阶段错误
    pub fn missing(stage: &'static str) -> Self {
        Self::MissingAggregation { stage }
    }

    /// 创建缓存行格式错误
    pub fn malformed_row(line: u64, message: impl Into<String>) -> Self {
        Self::MalformedCacheRow {
            line,
            message: message.into(),
        }
    }
}

impl From<StiffnessError> for QsError {
    fn from(err: StiffnessError) -> Self {
        match err {
            StiffnessError::Foundation(e) => e,
            StiffnessError::Geo(e) => e.into(),
            StiffnessError::Io(e) => e.into(),
            StiffnessError::Csv(e) => QsError::serialization(e.to_string()),
            StiffnessError::MalformedCacheRow { line, message } => {
                QsError::invalid_input(format!("缓存文件第 {line} 行: {message}"))
            }
            other => QsError::config(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let err = StiffnessError::missing("sect_to_sect_agg");
        assert!(err.to_string().contains("sect_to_sect_agg"));
        let err = StiffnessError::NoPatches { section: 7 };
        assert!(err.to_string().contains('7'));
    }

    #[test]
    fn test_conversion_to_foundation() {
        let qs: QsError = StiffnessError::SelfInteraction { id: 3 }.into();
        assert!(matches!(qs, QsError::Config { .. }));
        let qs: QsError = StiffnessError::Foundation(QsError::not_found("x")).into();
        assert!(matches!(qs, QsError::NotFound { .. }));
    }
}
