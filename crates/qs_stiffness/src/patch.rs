// crates/qs_stiffness/src/patch.rs
//! 矩形位错面元
//!
//! 局部直角坐标：x 向东、y 向北、z 向上（米或千米，全系统一致即可）。
//! 面元由中心、沿走向长度 L、沿倾向宽度 W 与震源机制确定；构造时预先
//! 计算四个角点、单位法向与单位滑动方向。
//!
//! 角点编号：`c0 = c - L/2·ŝ + W/2·d̂`，`c1 = c + L/2·ŝ + W/2·d̂`，
//! `c2 = c + L/2·ŝ - W/2·d̂`，`c3 = c - L/2·ŝ - W/2·d̂`，其中 ŝ 为走向
//! 单位向量，d̂ 为沿倾向向下的单位向量。c0 是位错求解的参考角点。

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// 震源机制 (度)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocalMechanism {
    /// 走向，北起顺时针
    pub strike: f64,
    /// 倾角
    pub dip: f64,
    /// 滑动角
    pub rake: f64,
}

impl FocalMechanism {
    /// 创建震源机制
    #[must_use]
    pub const fn new(strike: f64, dip: f64, rake: f64) -> Self {
        Self { strike, dip, rake }
    }
}

/// 矩形面元
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    center: DVec3,
    length: f64,
    width: f64,
    strike: f64,
    dip: f64,
    rake: f64,
    corners: [DVec3; 4],
    normal: DVec3,
    slip: DVec3,
}

impl Patch {
    /// 由中心、长宽与震源机制构造
    #[must_use]
    pub fn new(center: DVec3, length: f64, width: f64, mech: FocalMechanism) -> Self {
        let strike = mech.strike.to_radians();
        let dip = mech.dip.to_radians();
        let rake = mech.rake.to_radians();

        let (sin_s, cos_s) = strike.sin_cos();
        let (sin_d, cos_d) = dip.sin_cos();
        let along_strike = DVec3::new(sin_s, cos_s, 0.0);
        let down_dip = DVec3::new(cos_d * cos_s, -cos_d * sin_s, -sin_d);

        let hl = 0.5 * length * along_strike;
        let hw = 0.5 * width * down_dip;
        let corners = [
            center - hl + hw,
            center + hl + hw,
            center + hl - hw,
            center - hl - hw,
        ];

        let up_dip = -down_dip;
        let normal = along_strike.cross(up_dip);
        let slip = rake.cos() * along_strike + rake.sin() * up_dip;

        Self {
            center,
            length,
            width,
            strike,
            dip,
            rake,
            corners,
            normal,
            slip,
        }
    }

    /// 中心
    #[inline]
    #[must_use]
    pub fn center(&self) -> DVec3 {
        self.center
    }

    /// 沿走向长度
    #[inline]
    #[must_use]
    pub fn length(&self) -> f64 {
        self.length
    }

    /// 沿倾向宽度
    #[inline]
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// 走向 (弧度)
    #[inline]
    #[must_use]
    pub fn strike(&self) -> f64 {
        self.strike
    }

    /// 倾角 (弧度)
    #[inline]
    #[must_use]
    pub fn dip(&self) -> f64 {
        self.dip
    }

    /// 滑动角 (弧度)
    #[inline]
    #[must_use]
    pub fn rake(&self) -> f64 {
        self.rake
    }

    /// 角点
    #[inline]
    #[must_use]
    pub fn corner(&self, i: usize) -> DVec3 {
        self.corners[i]
    }

    /// 上盘一侧的单位法向
    #[inline]
    #[must_use]
    pub fn normal(&self) -> DVec3 {
        self.normal
    }

    /// 单位滑动方向
    #[inline]
    #[must_use]
    pub fn slip(&self) -> DVec3 {
        self.slip
    }

    /// 面积
    #[must_use]
    pub fn area(&self) -> f64 {
        self.length * self.width
    }
}
