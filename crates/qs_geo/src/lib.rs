// crates/qs_geo/src/lib.rs
//! QuakeStiff 地理空间模块
//!
//! 提供断层几何所需的地理坐标、球面距离/方位角计算，以及把经纬度
//! 映射到局部平面米制坐标的 UTM 投影。
//!
//! # 模块
//!
//! - `ellipsoid`: 参考椭球体参数
//! - `location`: 带深度的地理位置与球面几何
//! - `projection`: 横轴墨卡托 / UTM 投影与 [`LocalProjection`] 能力
//!
//! # 示例
//!
//! ```
//! use qs_geo::prelude::*;
//!
//! let loc = Location::new(34.0, -118.0, 5.0);
//! let proj = UtmProjection::for_location(&loc).unwrap();
//! let p = proj.to_local(&loc).unwrap();
//! assert!((p.z + 5000.0).abs() < 1e-9);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod ellipsoid;
pub mod error;
pub mod location;
pub mod projection;

/// 预导入模块
pub mod prelude {
    pub use crate::error::{GeoError, GeoResult};
    pub use crate::location::{Location, LocationBounds};
    pub use crate::projection::{LocalProjection, UtmProjection};
}

pub use ellipsoid::Ellipsoid;
pub use error::{GeoError, GeoResult};
pub use location::{Location, LocationBounds};
pub use projection::{LocalProjection, UtmProjection};
