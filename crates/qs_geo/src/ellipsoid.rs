// crates/qs_geo/src/ellipsoid.rs
//! 椭球体定义
//!
//! ```
//! use qs_geo::ellipsoid::Ellipsoid;
//!
//! let wgs84 = Ellipsoid::WGS84;
//! assert!((wgs84.e2() - 0.006_694_379_990_14).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};

/// 参考椭球体
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    /// 长半轴 (m)
    pub a: f64,
    /// 扁率 (flattening)
    pub f: f64,
}

impl Ellipsoid {
    /// WGS84 椭球体
    pub const WGS84: Self = Self {
        a: 6_378_137.0,
        f: 1.0 / 298.257_223_563,
    };

    /// 第一偏心率平方 e² = f(2 - f)
    #[inline]
    #[must_use]
    pub fn e2(&self) -> f64 {
        self.f * (2.0 - self.f)
    }

    /// 带符号的第一偏心率
    #[inline]
    #[must_use]
    pub fn signed_e(&self) -> f64 {
        self.f.signum() * self.e2().abs().sqrt()
    }

    /// 第三扁率 n = f / (2 - f)
    #[inline]
    #[must_use]
    pub fn third_flattening(&self) -> f64 {
        self.f / (2.0 - self.f)
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}
