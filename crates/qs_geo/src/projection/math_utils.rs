//! 高精度数学工具（横轴墨卡托级数所需）

/// 误差补偿求和，返回 (和, 舍入误差)
#[inline]
pub fn sum_exact(u: f64, v: f64) -> (f64, f64) {
    let s = u + v;
    let up = s - v;
    let vpp = s - up;
    let up = up - u;
    let vpp = vpp - v;
    (s, -(up + vpp))
}

/// e * atanh(e * x) 的稳定计算
#[inline]
pub fn eatanhe(x: f64, es: f64) -> f64 {
    if es > 0.0 {
        es * (es * x).atanh()
    } else if es < 0.0 {
        -es * (-es * x).atan()
    } else {
        0.0
    }
}

/// tan(φ) → tan(φ')，共形纬度正向转换
#[inline]
pub fn taupf(tau: f64, es: f64) -> f64 {
    let tau1 = tau.hypot(1.0);
    let sig = eatanhe(tau / tau1, es).sinh();
    sig.hypot(1.0) * tau - sig * tau1
}

/// 角度归一化到 [-180, 180)
#[inline]
pub fn ang_normalize(x: f64) -> f64 {
    let mut x = x % 360.0;
    if x < -180.0 {
        x += 360.0;
    }
    if x >= 180.0 {
        x -= 360.0;
    }
    x
}

/// 角度差 y - x
pub fn ang_diff(x: f64, y: f64) -> f64 {
    let (d, t) = sum_exact(ang_normalize(-x), ang_normalize(y));
    ang_normalize(d) + t
}

/// 度数版 sin/cos，对 90° 的整数倍给出精确结果
pub fn sincosd(x: f64) -> (f64, f64) {
    let mut r = x % 360.0;
    if r < 0.0 {
        r += 360.0;
    }
    let q = (r / 90.0 + 0.5).floor() as i32;
    r -= 90.0 * f64::from(q);
    let (s, c) = r.to_radians().sin_cos();

    match q & 3 {
        0 => (s, c),
        1 => (c, -s),
        2 => (-s, -c),
        _ => (-c, s),
    }
}

/// Horner 多项式求值，系数从高次到低次
#[inline]
pub fn polyval(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().fold(0.0, |acc, &c| acc * x + c)
}
