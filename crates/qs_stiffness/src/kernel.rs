// crates/qs_stiffness/src/kernel.rs
//! 面元间刚度核
//!
//! 源面元单位滑动在接收面元中心产生的正应力与剪应力变化。
//!
//! 1. 以源面元 c0 角点为原点、走向为 +x 旋转坐标
//! 2. 调用 [`dc3d`] 求位移梯度（滑动角分解为走滑与倾滑分量）
//! 3. 各向同性线弹性：`S = μ(∇u + ∇uᵀ) + λ tr(∇u) I`
//! 4. 旋转回全局坐标，投影到接收面元的法向与滑动方向
//!
//! 求解器约定张为正；这里只对正应力取一次反号，得到压为正的 `sigma`。

use glam::{DMat3, DVec3};

use crate::okada::{dc3d, Dislocation, DislocationSource};
use crate::patch::Patch;

/// 单次面元作用的应力变化
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StressChange {
    /// 正应力变化，压为正
    pub sigma: f64,
    /// 沿接收滑动方向的剪应力变化
    pub tau: f64,
}

impl StressChange {
    /// 库仑应力变化
    #[inline]
    #[must_use]
    pub fn coulomb(&self, coeff_of_friction: f64) -> f64 {
        coulomb_stress(self.tau, self.sigma, coeff_of_friction)
    }
}

/// 库仑应力变化 `tau - f * sigma`（忽略孔隙压力）
#[inline]
#[must_use]
pub fn coulomb_stress(tau: f64, sigma: f64, coeff_of_friction: f64) -> f64 {
    tau - coeff_of_friction * sigma
}

/// 源面元单位滑动在接收面元上的应力变化
///
/// 观测点落在源面元边缘或其负向延长线上时返回 `None`。
#[must_use]
pub fn calc_stiffness(lambda: f64, mu: f64, source: &Patch, receiver: &Patch) -> Option<StressChange> {
    let alpha = (lambda + mu) / (lambda + 2.0 * mu);
    let theta = std::f64::consts::FRAC_PI_2 - source.strike();
    let (sin_t, cos_t) = theta.sin_cos();

    let origin = source.corner(0);
    let rc = receiver.center();
    let x = rc.x - origin.x;
    let y = rc.y - origin.y;
    let xx = x * cos_t + y * sin_t;
    let yy = -x * sin_t + y * cos_t;

    let dislocation_source = DislocationSource {
        depth: -origin.z,
        dip: source.dip().to_degrees(),
        al1: 0.0,
        al2: source.length(),
        aw1: 0.0,
        aw2: source.width(),
    };
    let disl = Dislocation {
        strike_slip: source.rake().cos(),
        dip_slip: source.rake().sin(),
        tensile: 0.0,
    };
    let disp = dc3d(alpha, xx, yy, rc.z, &dislocation_source, &disl)?;

    let du = disp.du;
    let trace = du[0][0] + du[1][1] + du[2][2];
    let s = |i: usize, j: usize| {
        let v = mu * (du[i][j] + du[j][i]);
        if i == j {
            v + lambda * trace
        } else {
            v
        }
    };
    let (s0, s1, s2, s3, s4, s5) = (s(0, 0), s(0, 1), s(0, 2), s(1, 1), s(1, 2), s(2, 2));

    // 绕 z 轴旋转回全局坐标
    let k0 = s0 * cos_t * cos_t - 2.0 * s1 * sin_t * cos_t + s3 * sin_t * sin_t;
    let k1 = s0 * sin_t * cos_t + s1 * (cos_t * cos_t - sin_t * sin_t) - s3 * sin_t * cos_t;
    let k2 = s2 * cos_t - s4 * sin_t;
    let k3 = s0 * sin_t * sin_t + 2.0 * s1 * sin_t * cos_t + s3 * cos_t * cos_t;
    let k4 = s2 * sin_t + s4 * cos_t;
    let k5 = s5;
    let stress = DMat3::from_cols(
        DVec3::new(k0, k1, k2),
        DVec3::new(k1, k3, k4),
        DVec3::new(k2, k4, k5),
    );

    let n = receiver.normal();
    let traction = stress * n;
    Some(StressChange {
        sigma: -n.dot(traction),
        tau: receiver.slip().dot(traction),
    })
}
