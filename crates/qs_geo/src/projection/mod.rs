//! 投影模块
//!
//! 刚度计算在局部平面米制坐标中进行。一个计算器实例内所有子段共用同一
//! 个 UTM 带（带号 + 纬度带字母），由全部迹线点经纬度范围的中点确定。

pub mod math_utils;
pub mod transverse_mercator;

use glam::DVec3;

use crate::error::{GeoError, GeoResult};
use crate::location::{Location, LocationBounds};
pub use transverse_mercator::TransverseMercator;

/// UTM 比例因子
pub const UTM_K0: f64 = 0.9996;

/// UTM 纬度带字母，从 -80° 起每 8° 一带，X 带延伸到 84°
const UTM_LETTERS: &[u8; 20] = b"CDEFGHJKLMNPQRSTUVWX";

/// 局部平面投影能力
///
/// 把地理位置映射到 (东, 北, 上) 米制坐标。
pub trait LocalProjection: Send + Sync {
    /// 地理位置 → 局部坐标 (m)
    fn to_local(&self, loc: &Location) -> GeoResult<DVec3>;
}

/// 由经度计算 UTM 带号 (1-60)
#[must_use]
pub fn utm_zone(lon: f64) -> u8 {
    let zone = ((lon + 180.0) / 6.0).floor() as i32 + 1;
    zone.clamp(1, 60) as u8
}

/// 由纬度计算 UTM 纬度带字母
pub fn utm_letter(lat: f64) -> GeoResult<char> {
    GeoError::check_coordinate("纬度", lat, -80.0, 84.0)?;
    let band = (((lat + 80.0) / 8.0).floor() as usize).min(UTM_LETTERS.len() - 1);
    Ok(char::from(UTM_LETTERS[band]))
}

/// 固定带号的 UTM 投影
#[derive(Debug, Clone)]
pub struct UtmProjection {
    zone: u8,
    letter: char,
    tm: TransverseMercator,
}

impl UtmProjection {
    /// 由带号与纬度带字母创建
    pub fn new(zone: u8, letter: char) -> GeoResult<Self> {
        if !(1..=60).contains(&zone) {
            return Err(GeoError::InvalidUtmZone { zone });
        }
        let upper = letter.to_ascii_uppercase();
        if !upper.is_ascii() || !UTM_LETTERS.contains(&(upper as u8)) {
            return Err(GeoError::InvalidUtmLetter { letter });
        }
        Ok(Self {
            zone,
            letter: upper,
            tm: TransverseMercator::utm(zone, upper >= 'N'),
        })
    }

    /// 包含给定位置的 UTM 带
    pub fn for_location(loc: &Location) -> GeoResult<Self> {
        Self::new(utm_zone(loc.longitude), utm_letter(loc.latitude)?)
    }

    /// 以位置集合经纬度范围中点确定的 UTM 带
    pub fn for_locations<'a>(locs: impl IntoIterator<Item = &'a Location>) -> GeoResult<Self> {
        let bounds = LocationBounds::from_locations(locs)?;
        Self::for_location(&bounds.center())
    }

    /// 带号
    #[must_use]
    pub fn zone(&self) -> u8 {
        self.zone
    }

    /// 纬度带字母
    #[must_use]
    pub fn letter(&self) -> char {
        self.letter
    }

    /// 是否北半球
    #[must_use]
    pub fn is_north(&self) -> bool {
        self.letter >= 'N'
    }

}

impl LocalProjection for UtmProjection {
    fn to_local(&self, loc: &Location) -> GeoResult<DVec3> {
        let (x, y) = self.tm.forward(loc.longitude, loc.latitude)?;
        Ok(DVec3::new(x, y, -1000.0 * loc.depth))
    }
}
