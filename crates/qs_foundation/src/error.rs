// crates/qs_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `QsError` 枚举和 `QsResult` 类型别名。
//!
//! 基础层只定义通用错误；刚度计算相关的错误在 `qs_stiffness` 中扩展，
//! 并可通过 `From` 转换回 `QsError`。
//!
//! # 示例
//!
//! ```
//! use qs_foundation::error::{QsError, QsResult};
//!
//! fn read_model() -> QsResult<()> {
//!     Err(QsError::config("断层模型为空"))
//! }
//! assert!(read_model().is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// 统一结果类型
pub type QsResult<T> = Result<T, QsError>;

/// QuakeStiff 错误类型
#[derive(Error, Debug)]
pub enum QsError {
    // ========================================================================
    // IO 相关错误
    // ========================================================================
    /// IO 错误
    #[error("IO错误: {message}")]
    Io {
        /// 描述性错误信息
        message: String,
        #[source]
        /// 可选的底层 IO 错误
        source: Option<std::io::Error>,
    },

    /// 文件不存在
    #[error("文件不存在: {path}")]
    FileNotFound {
        /// 未找到的路径
        path: PathBuf,
    },

    /// 文件解析错误
    #[error("文件解析错误: {file} 第{line}行: {message}")]
    ParseError {
        /// 文件路径
        file: PathBuf,
        /// 行号
        line: usize,
        /// 错误信息
        message: String,
    },

    // ========================================================================
    // 数据校验错误
    // ========================================================================
    /// 无效输入
    #[error("无效的输入数据: {message}")]
    InvalidInput {
        /// 说明无效原因
        message: String,
    },

    /// 数据超出范围
    #[error("数据超出范围: {field}={value}, 期望范围=[{min}, {max}]")]
    OutOfRange {
        /// 字段名
        field: &'static str,
        /// 实际值
        value: f64,
        /// 最小允许值
        min: f64,
        /// 最大允许值
        max: f64,
    },

    /// 索引越界
    #[error("索引越界: {index_type} 索引 {index} 超出范围 0..{len}")]
    IndexOutOfBounds {
        /// 索引类别描述
        index_type: &'static str,
        /// 访问的索引
        index: usize,
        /// 上界（长度）
        len: usize,
    },

    // ========================================================================
    // 配置错误
    // ========================================================================
    /// 配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 具体错误信息
        message: String,
    },

    /// 配置值无效
    #[error("配置值无效: {key}={value}, 原因: {reason}")]
    InvalidConfig {
        /// 配置键名
        key: String,
        /// 配置值
        value: String,
        /// 无效原因说明
        reason: String,
    },

    /// 序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        /// 序列化失败原因
        message: String,
    },

    /// 投影错误
    #[error("投影错误: {0}")]
    Projection(String),

    /// 资源未找到
    #[error("资源未找到: {resource}")]
    NotFound {
        /// 资源名称
        resource: String,
    },
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl QsError {
    /// 文件不存在
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// 解析错误
    pub fn parse(file: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    /// 无效输入
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 数据超出范围
    pub fn out_of_range(field: &'static str, value: f64, min: f64, max: f64) -> Self {
        Self::OutOfRange {
            field,
            value,
            min,
            max,
        }
    }

    /// 索引越界
    pub fn index_out_of_bounds(index_type: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds {
            index_type,
            index,
            len,
        }
    }

    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 配置值无效
    pub fn invalid_config(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// 序列化错误
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// 投影错误
    pub fn projection(message: impl Into<String>) -> Self {
        Self::Projection(message.into())
    }

    /// 资源未找到
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }
}

// ========================================================================
// 验证辅助方法
// ========================================================================

impl QsError {
    /// 检查值是否在闭区间内（NaN 视为越界）
    #[inline]
    pub fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> QsResult<()> {
        if value >= min && value <= max {
            Ok(())
        } else {
            Err(Self::out_of_range(field, value, min, max))
        }
    }

    /// 检查索引是否在范围内
    #[inline]
    pub fn check_index(index_type: &'static str, index: usize, len: usize) -> QsResult<()> {
        if index >= len {
            Err(Self::index_out_of_bounds(index_type, index, len))
        } else {
            Ok(())
        }
    }
}

// ========================================================================
// 前置条件宏
// ========================================================================

/// 条件不满足时提前返回错误
///
/// 错误表达式只在失败分支求值，并通过 `Into` 转换为函数的错误类型。
///
/// ```
/// use qs_foundation::{ensure, QsError, QsResult};
///
/// fn positive(x: f64) -> QsResult<f64> {
///     ensure!(x > 0.0, QsError::invalid_input("x 必须为正"));
///     Ok(x)
/// }
/// assert!(positive(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            return Err(::core::convert::Into::into($err));
        }
    };
}

/// 解包 `Option`，为 `None` 时提前返回错误
///
/// ```
/// use qs_foundation::{require, QsError, QsResult};
///
/// fn first(v: &[f64]) -> QsResult<f64> {
///     let x = require!(v.first(), QsError::invalid_input("空数组"));
///     Ok(*x)
/// }
/// assert!(first(&[]).is_err());
/// ```
#[macro_export]
macro_rules! require {
    ($opt:expr, $err:expr $(,)?) => {
        match $opt {
            Some(value) => value,
            None => return Err(::core::convert::Into::into($err)),
        }
    };
}

// ========================================================================
// 标准库错误转换
// ========================================================================

impl From<std::io::Error> for QsError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

// ========================================================================
// 测试
// ========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QsError::config("测试配置错误");
        assert!(err.to_string().contains("配置错误"));
    }

    #[test]
    fn test_file_not_found() {
        let err = QsError::file_not_found("/path/to/model.json");
        assert!(err.to_string().contains("/path/to/model.json"));
    }

    #[test]
    fn test_index_out_of_bounds() {
        let err = QsError::index_out_of_bounds("SectionId", 10, 5);
        let msg = err.to_string();
        assert!(msg.contains("SectionId"));
        assert!(msg.contains("10"));
        assert!(msg.contains('5'));
    }

    #[test]
    fn test_check_range() {
        assert!(QsError::check_range("dip", 45.0, 0.0, 90.0).is_ok());
        assert!(QsError::check_range("dip", -1.0, 0.0, 90.0).is_err());
        assert!(QsError::check_range("dip", 91.0, 0.0, 90.0).is_err());
        assert!(QsError::check_range("dip", f64::NAN, 0.0, 90.0).is_err());
    }

    #[test]
    fn test_check_index() {
        assert!(QsError::check_index("SectionId", 5, 10).is_ok());
        assert!(QsError::check_index("SectionId", 10, 10).is_err());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: QsError = io_err.into();
        assert!(matches!(err, QsError::Io { source: Some(_), .. }));
    }

    #[test]
    fn test_ensure_and_require() {
        fn check(v: Option<i32>) -> QsResult<i32> {
            let x = require!(v, QsError::not_found("value"));
            ensure!(x > 0, QsError::invalid_input("non-positive"));
            Ok(x)
        }
        assert_eq!(check(Some(3)).ok(), Some(3));
        assert!(matches!(check(None), Err(QsError::NotFound { .. })));
        assert!(matches!(check(Some(-1)), Err(QsError::InvalidInput { .. })));
    }
}
