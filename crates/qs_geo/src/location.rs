// crates/qs_geo/src/location.rs
//! 地理位置与球面几何
//!
//! 断层迹线与网格节点统一用 [`Location`] 表示：纬度、经度（度）以及
//! 向下为正的深度（km）。水平距离与方位角在平均半径球面上计算。

use qs_foundation::require;
use serde::{Deserialize, Serialize};

use crate::error::{GeoError, GeoResult};

/// 地球平均半径 (km)
pub const EARTH_MEAN_RADIUS_KM: f64 = 6_371.008_8;

/// 地理位置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// 纬度 (度)
    pub latitude: f64,
    /// 经度 (度)
    pub longitude: f64,
    /// 深度 (km，向下为正)
    #[serde(default)]
    pub depth: f64,
}

impl Location {
    /// 创建位置
    #[inline]
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64, depth: f64) -> Self {
        Self {
            latitude,
            longitude,
            depth,
        }
    }

    /// Haversine 水平距离 (km)
    #[must_use]
    pub fn horizontal_distance_km(&self, other: &Self) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_MEAN_RADIUS_KM * a.sqrt().min(1.0).asin()
    }

    /// 初始方位角（度，正北顺时针，范围 [0, 360)）
    #[must_use]
    pub fn azimuth_deg(&self, other: &Self) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();

        let x = lat2.cos() * dlon.sin();
        let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
        (x.atan2(y).to_degrees() + 360.0) % 360.0
    }

    /// 按方位角、水平距离与竖向距离偏移
    ///
    /// `vertical_km` 向下为正，与 `depth` 同号。
    #[must_use]
    pub fn offset(&self, azimuth_deg: f64, horizontal_km: f64, vertical_km: f64) -> Self {
        let lat1 = self.latitude.to_radians();
        let lon1 = self.longitude.to_radians();
        let az = azimuth_deg.to_radians();
        let delta = horizontal_km / EARTH_MEAN_RADIUS_KM;

        let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * az.cos()).asin();
        let lon2 = lon1 + (az.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

        Self::new(lat2.to_degrees(), lon2.to_degrees(), self.depth + vertical_km)
    }

}

/// 经纬度包围盒
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationBounds {
    /// 最小纬度
    pub min_lat: f64,
    /// 最大纬度
    pub max_lat: f64,
    /// 最小经度
    pub min_lon: f64,
    /// 最大经度
    pub max_lon: f64,
}

impl LocationBounds {
    /// 由位置集合计算包围盒，集合为空时报错
    pub fn from_locations<'a>(locs: impl IntoIterator<Item = &'a Location>) -> GeoResult<Self> {
        let mut iter = locs.into_iter();
        let first = require!(iter.next(), GeoError::EmptyLocationSet);
        let init = Self {
            min_lat: first.latitude,
            max_lat: first.latitude,
            min_lon: first.longitude,
            max_lon: first.longitude,
        };
        Ok(iter.fold(init, |b, loc| Self {
            min_lat: b.min_lat.min(loc.latitude),
            max_lat: b.max_lat.max(loc.latitude),
            min_lon: b.min_lon.min(loc.longitude),
            max_lon: b.max_lon.max(loc.longitude),
        }))
    }

    /// 包围盒中点（地表）
    #[must_use]
    pub fn center(&self) -> Location {
        Location::new(
            self.min_lat + 0.5 * (self.max_lat - self.min_lat),
            self.min_lon + 0.5 * (self.max_lon - self.min_lon),
            0.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_distance() {
        // 洛杉矶到旧金山，约 559 km
        let la = Location::new(34.05, -118.25, 0.0);
        let sf = Location::new(37.77, -122.42, 0.0);
        let d = la.horizontal_distance_km(&sf);
        assert!((d - 559.0).abs() < 10.0, "LA-SF: {d} km");
        assert_eq!(la.horizontal_distance_km(&la), 0.0);
    }

    #[test]
    fn test_azimuth_cardinal() {
        let origin = Location::new(0.0, 0.0, 0.0);
        let north = Location::new(1.0, 0.0, 0.0);
        let east = Location::new(0.0, 1.0, 0.0);
        assert!(origin.azimuth_deg(&north).abs() < 1e-9);
        assert!((origin.azimuth_deg(&east) - 90.0).abs() < 1e-9);
        assert!((north.azimuth_deg(&origin) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_offset_roundtrip() {
        let start = Location::new(35.0, -117.0, 2.0);
        let end = start.offset(37.0, 12.5, 3.0);
        assert!((start.horizontal_distance_km(&end) - 12.5).abs() < 1e-9);
        assert!((start.azimuth_deg(&end) - 37.0).abs() < 1e-6);
        assert!((end.depth - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_bounds_center() {
        let locs = [
            Location::new(34.0, -118.0, 0.0),
            Location::new(36.0, -121.0, 0.0),
            Location::new(35.0, -119.0, 0.0),
        ];
        let b = LocationBounds::from_locations(&locs).unwrap();
        let c = b.center();
        assert!((c.latitude - 35.0).abs() < 1e-12);
        assert!((c.longitude + 119.5).abs() < 1e-12);
        assert!(LocationBounds::from_locations(std::iter::empty()).is_err());
    }
}
