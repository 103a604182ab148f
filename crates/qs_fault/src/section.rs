// crates/qs_fault/src/section.rs
//! 断层子段能力
//!
//! 编号是稠密、从 0 开始的整数，缓存层直接用它索引数组。

use qs_foundation::QsResult;
use serde::{Deserialize, Serialize};

use crate::surface::EvenlyGriddedSurface;
use crate::trace::FaultTrace;

/// 断层子段
pub trait FaultSection: Send + Sync {
    /// 稠密子段编号
    fn section_id(&self) -> usize;

    /// 所属母断层编号
    fn parent_section_id(&self) -> Option<usize>;

    /// 名称
    fn name(&self) -> &str;

    /// 迹线
    fn fault_trace(&self) -> &FaultTrace;

    /// 平均倾角 (度)
    fn ave_dip(&self) -> f64;

    /// 平均滑动角 (度)
    fn ave_rake(&self) -> f64;

    /// 上界深度 (km)
    fn upper_depth_km(&self) -> f64;

    /// 下界深度 (km)
    fn lower_depth_km(&self) -> f64;

    /// 按 `spacing_km` 生成均匀网格曲面
    fn gridded_surface(&self, spacing_km: f64) -> QsResult<EvenlyGriddedSurface> {
        EvenlyGriddedSurface::build(
            self.fault_trace(),
            self.ave_dip(),
            self.upper_depth_km(),
            self.lower_depth_km(),
            spacing_km,
        )
    }
}

/// 可序列化的简单断层子段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleFaultSection {
    /// 稠密子段编号
    pub id: usize,
    /// 母断层编号
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<usize>,
    /// 名称
    #[serde(default)]
    pub name: String,
    /// 迹线
    pub trace: FaultTrace,
    /// 平均倾角 (度)
    pub dip: f64,
    /// 平均滑动角 (度)
    pub rake: f64,
    /// 上界深度 (km)
    #[serde(default)]
    pub upper_depth: f64,
    /// 下界深度 (km)
    pub lower_depth: f64,
}

impl FaultSection for SimpleFaultSection {
    fn section_id(&self) -> usize {
        self.id
    }

    fn parent_section_id(&self) -> Option<usize> {
        self.parent_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn fault_trace(&self) -> &FaultTrace {
        &self.trace
    }

    fn ave_dip(&self) -> f64 {
        self.dip
    }

    fn ave_rake(&self) -> f64 {
        self.rake
    }

    fn upper_depth_km(&self) -> f64 {
        self.upper_depth
    }

    fn lower_depth_km(&self) -> f64 {
        self.lower_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qs_geo::Location;

    #[test]
    fn test_default_surface_from_section() {
        let start = Location::new(34.0, -117.0, 0.0);
        let sect = SimpleFaultSection {
            id: 0,
            parent_id: Some(12),
            name: "Test Fault, Subsection 0".into(),
            trace: FaultTrace::new(vec![start, start.offset(0.0, 6.0, 0.0)]).unwrap(),
            dip: 90.0,
            rake: 180.0,
            upper_depth: 0.0,
            lower_depth: 4.0,
        };
        let surf = sect.gridded_surface(2.0).unwrap();
        assert_eq!((surf.num_rows(), surf.num_cols()), (3, 4));
        assert_eq!(sect.parent_section_id(), Some(12));
        assert_eq!(sect.name(), "Test Fault, Subsection 0");
    }
}
