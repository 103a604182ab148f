// crates/qs_stiffness/src/types.rs
//! 刚度物理量

use std::fmt;

use serde::{Deserialize, Serialize};

/// 刚度物理量：正应力变化、剪应力变化、库仑应力变化
///
/// 顺序固定（0, 1, 2），成对结果数组按此下标存放。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StiffnessType {
    /// 正应力变化，压为正
    Sigma,
    /// 沿滑动方向的剪应力变化
    Tau,
    /// 库仑应力变化 `tau - f * sigma`
    Cff,
}

impl StiffnessType {
    /// 所有物理量，按下标顺序
    pub const ALL: [StiffnessType; 3] = [Self::Sigma, Self::Tau, Self::Cff];

    /// 数组下标
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 显示名
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sigma => "ΔSigma",
            Self::Tau => "ΔTau",
            Self::Cff => "ΔCFF",
        }
    }

    /// 单位
    #[must_use]
    pub const fn units(self) -> &'static str {
        "MPa"
    }

    /// 文件名标签
    #[must_use]
    pub const fn file_tag(self) -> &'static str {
        match self {
            Self::Sigma => "sigma",
            Self::Tau => "tau",
            Self::Cff => "cff",
        }
    }
}

impl fmt::Display for StiffnessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.units())
    }
}
