//! 高精度横轴墨卡托投影（Karney 2011）
//!
//! 6 阶 Krüger 级数，Clenshaw 求和。系数在构造时计算一次，正向投影
//! 调用不再重复计算。
//!
//! Karney, C. F. F. (2011). "Transverse Mercator with an accuracy of a few nanometers".
//! Journal of Geodesy, 85(8), 475-485.

use std::f64::consts::FRAC_PI_2;

use num_complex::Complex64;

use super::math_utils::{ang_diff, polyval, sincosd, taupf};
use crate::ellipsoid::Ellipsoid;
use crate::error::{GeoError, GeoResult};

const MAX_ORDER: usize = 6;

/// alpha 系数 (正向投影)，每行最后一项为分母
const ALPHA_COEFFS: [&[f64]; MAX_ORDER] = [
    &[31564.0, -66675.0, 34440.0, 47250.0, -100800.0, 75600.0, 151200.0],
    &[-1983433.0, 863232.0, 748608.0, -1161216.0, 524160.0, 1935360.0],
    &[670412.0, 406647.0, -533952.0, 184464.0, 725760.0],
    &[6601661.0, -7732800.0, 2230245.0, 7257600.0],
    &[-13675556.0, 3438171.0, 7983360.0],
    &[212378941.0, 319334400.0],
];

/// rectifying radius 系数
const B1_COEFFS: [f64; 5] = [1.0, 4.0, 64.0, 256.0, 256.0];

/// 预计算的横轴墨卡托投影
#[derive(Debug, Clone)]
pub struct TransverseMercator {
    central_meridian: f64,
    k0: f64,
    false_easting: f64,
    false_northing: f64,
    e2: f64,
    es: f64,
    e2m: f64,
    b1: f64,
    a1: f64,
    alp: [f64; MAX_ORDER],
}

impl TransverseMercator {
    /// 由椭球与投影参数构造
    #[must_use]
    pub fn new(
        ellipsoid: Ellipsoid,
        central_meridian: f64,
        k0: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let e2 = ellipsoid.e2();
        let n = ellipsoid.third_flattening();
        let n2 = n * n;
        let b1 = polyval(&B1_COEFFS[..4], n2) / (B1_COEFFS[4] * (1.0 + n));

        let mut alp = [0.0; MAX_ORDER];
        let mut d = n;
        for l in 0..MAX_ORDER {
            let ca = ALPHA_COEFFS[l];
            let m = ca.len() - 1;
            alp[l] = d * polyval(&ca[..m], n) / ca[m];
            d *= n;
        }

        Self {
            central_meridian,
            k0,
            false_easting,
            false_northing,
            e2,
            es: ellipsoid.signed_e(),
            e2m: 1.0 - e2,
            b1,
            a1: b1 * ellipsoid.a,
            alp,
        }
    }

    /// WGS84 上的 UTM 投影参数
    #[must_use]
    pub fn utm(zone: u8, north: bool) -> Self {
        Self::new(
            Ellipsoid::WGS84,
            f64::from(zone) * 6.0 - 183.0,
            super::UTM_K0,
            500_000.0,
            if north { 0.0 } else { 10_000_000.0 },
        )
    }

    /// 中央子午线 (度)
    #[must_use]
    pub fn central_meridian(&self) -> f64 {
        self.central_meridian
    }

    /// 正向投影：(lon, lat) 度 → (x, y) 米
    pub fn forward(&self, lon: f64, lat: f64) -> GeoResult<(f64, f64)> {
        GeoError::check_coordinate("纬度", lat, -90.0, 90.0)?;

        let lon_diff = ang_diff(self.central_meridian, lon);
        let latsign = if lat.is_sign_negative() { -1.0 } else { 1.0 };
        let lonsign = if lon_diff.is_sign_negative() { -1.0 } else { 1.0 };
        let lat = lat.abs();
        let lon_diff = lon_diff.abs();
        let backside = lon_diff > 90.0;
        let lon_diff = if backside { 180.0 - lon_diff } else { lon_diff };

        let (sphi, cphi) = sincosd(lat);
        let (slam, clam) = sincosd(lon_diff);

        let (xip, etap) = if lat == 90.0 {
            (FRAC_PI_2, 0.0)
        } else {
            let taup = taupf(sphi / cphi, self.es);
            (taup.atan2(clam), (slam / taup.hypot(clam)).asinh())
        };

        let c0 = (2.0 * xip).cos();
        let ch0 = (2.0 * etap).cosh();
        let s0 = (2.0 * xip).sin();
        let sh0 = (2.0 * etap).sinh();
        let a = Complex64::new(2.0 * c0 * ch0, -2.0 * s0 * sh0);

        let mut y0 = Complex64::new(0.0, 0.0);
        let mut y1 = Complex64::new(0.0, 0.0);
        for j in (0..MAX_ORDER).rev() {
            let tmp = y0;
            y0 = a * y0 - y1 + self.alp[j];
            y1 = tmp;
        }
        let sin_zeta = Complex64::new(s0 * ch0, c0 * sh0);
        let zeta = Complex64::new(xip, etap) + sin_zeta * y0;

        let scale = self.a1 * self.k0;
        let xi = if backside { std::f64::consts::PI - zeta.re } else { zeta.re };
        let y = scale * xi * latsign;
        let x = scale * zeta.im * lonsign;

        Ok((x + self.false_easting, y + self.false_northing))
    }

    /// 椭球第一偏心率平方
    #[must_use]
    pub fn e2(&self) -> f64 {
        self.e2
    }

    /// 1 - e²
    #[must_use]
    pub fn e2m(&self) -> f64 {
        self.e2m
    }

    /// rectifying radius 与长半轴之比
    #[must_use]
    pub fn b1(&self) -> f64 {
        self.b1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_central_meridian() {
        let tm = TransverseMercator::utm(11, true);
        let (x, _y) = tm.forward(-117.0, 34.0).unwrap();
        assert!((x - 500_000.0).abs() < 1e-6, "x = {x}");
    }

    #[test]
    fn test_forward_reference_point() {
        // EPSG:32651
        let tm = TransverseMercator::utm(51, true);
        let (x, y) = tm.forward(121.880356, 29.887703).unwrap();
        assert!((x - 391_888.063_726_413).abs() < 1e-3, "x = {x}");
        assert!((y - 3_306_868.456_385_104).abs() < 1e-3, "y = {y}");
    }

    #[test]
    fn test_hemisphere_symmetry() {
        let tm = TransverseMercator::utm(11, true);
        for (dlon, lat) in [(1.5, 34.0), (2.5, 36.2), (0.7, 12.0)] {
            let (xe, yn) = tm.forward(-117.0 + dlon, lat).unwrap();
            let (xw, ys) = tm.forward(-117.0 - dlon, -lat).unwrap();
            assert!((xe - 500_000.0 + (xw - 500_000.0)).abs() < 1e-6, "({dlon}, {lat})");
            assert!((yn + ys).abs() < 1e-6, "({dlon}, {lat})");
        }
    }

    #[test]
    fn test_southern_false_northing() {
        let tm = TransverseMercator::utm(19, false);
        let (_x, y) = tm.forward(-69.0, -33.0).unwrap();
        assert!(y > 6_000_000.0 && y < 10_000_000.0, "y = {y}");
        assert!(tm.forward(-69.0, -91.0).is_err());
    }

    #[test]
    fn test_constants() {
        let tm = TransverseMercator::utm(11, true);
        assert!((tm.e2() + tm.e2m() - 1.0).abs() < 1e-15);
        assert!(tm.b1() > 0.99 && tm.b1() < 1.0);
        assert_eq!(tm.central_meridian(), -117.0);
    }
}
