// crates/qs_geo/src/error.rs
//! 地理空间处理错误类型
//!
//! 包含坐标越界、UTM 带号无效、投影失败等错误。
//! 所有错误可转换为 `qs_foundation::QsError` 向上传播。

use qs_foundation::QsError;
use thiserror::Error;

/// Geo 模块结果类型
pub type GeoResult<T> = Result<T, GeoError>;

/// 地理空间处理错误
#[derive(Error, Debug)]
pub enum GeoError {
    /// 坐标超出有效范围
    #[error("{coord_type} 超出范围: {value:.6} (允许范围: {min} 到 {max})")]
    CoordinateOutOfRange {
        /// 坐标类型（如"纬度"、"经度"）
        coord_type: &'static str,
        /// 实际值
        value: f64,
        /// 最小允许值
        min: f64,
        /// 最大允许值
        max: f64,
    },

    /// UTM 带号无效
    #[error("无效的 UTM 带号: {zone} (允许范围: 1-60)")]
    InvalidUtmZone {
        /// 无效的带号
        zone: u8,
    },

    /// UTM 纬度带字母无效
    #[error("无效的 UTM 纬度带字母: {letter}")]
    InvalidUtmLetter {
        /// 无效的字母
        letter: char,
    },

    /// 空位置集合（无法确定投影带）
    #[error("位置集合为空，无法确定投影")]
    EmptyLocationSet,

    /// 投影转换失败
    #[error("投影转换失败: {operation}: {message}")]
    ProjectionFailed {
        /// 操作类型（如"正向投影"）
        operation: &'static str,
        /// 错误详情
        message: String,
    },

    /// 基础层错误
    #[error("基础层错误: {0}")]
    Foundation(#[from] QsError),
}

impl GeoError {
    /// 创建坐标越界错误
    #[inline]
    pub fn coordinate_out_of_range(
        coord_type: &'static str,
        value: f64,
        min: f64,
        max: f64,
    ) -> Self {
        Self::CoordinateOutOfRange {
            coord_type,
            value,
            min,
            max,
        }
    }

    /// 检查坐标是否在闭区间内
    #[inline]
    pub fn check_coordinate(coord_type: &'static str, value: f64, min: f64, max: f64) -> GeoResult<()> {
        if value >= min && value <= max {
            Ok(())
        } else {
            Err(Self::coordinate_out_of_range(coord_type, value, min, max))
        }
    }
}

impl From<GeoError> for QsError {
    fn from(err: GeoError) -> Self {
        match err {
            GeoError::CoordinateOutOfRange {
                coord_type,
                value,
                min,
                max,
            } => QsError::out_of_range(coord_type, value, min, max),
            GeoError::InvalidUtmZone { zone } => {
                QsError::invalid_input(format!("无效的UTM带号 {zone} (允许范围: 1-60)"))
            }
            GeoError::InvalidUtmLetter { letter } => {
                QsError::invalid_input(format!("无效的UTM纬度带字母 {letter}"))
            }
            GeoError::EmptyLocationSet => QsError::invalid_input("位置集合为空"),
            GeoError::ProjectionFailed { operation, message } => {
                QsError::projection(format!("[{operation}] {message}"))
            }
            GeoError::Foundation(err) => err,
        }
    }
}
