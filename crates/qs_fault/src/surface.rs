// crates/qs_fault/src/surface.rs
//! 均匀网格断层曲面
//!
//! 行沿倾向向下，列沿走向。顶行是迹线按上界深度沿倾向平移后的等距
//! 重采样点；第 r 行再沿倾向下移 `r * dip_spacing`（沿倾斜面度量）。
//!
//! 实际的沿走向/沿倾向间距不超过请求间距：段数取 `ceil(长度 / 间距)`。

use std::ops::Index;

use qs_foundation::{QsError, QsResult};
use qs_geo::Location;

use crate::trace::FaultTrace;

/// 均匀网格曲面
#[derive(Debug, Clone)]
pub struct EvenlyGriddedSurface {
    trace: FaultTrace,
    dip: f64,
    dip_direction: f64,
    upper_depth: f64,
    width: f64,
    rows: usize,
    cols: usize,
    strike_spacing: f64,
    dip_spacing: f64,
    nodes: Vec<Location>,
}

impl EvenlyGriddedSurface {
    /// 由迹线、倾角 (度)、上下界深度 (km) 与网格间距 (km) 构建
    pub fn build(
        trace: &FaultTrace,
        dip: f64,
        upper_depth: f64,
        lower_depth: f64,
        spacing_km: f64,
    ) -> QsResult<Self> {
        if !(spacing_km > 0.0 && spacing_km.is_finite()) {
            return Err(QsError::invalid_config(
                "grid_spacing_km",
                spacing_km.to_string(),
                "网格间距必须为正",
            ));
        }
        if !(dip > 0.0 && dip <= 90.0) {
            return Err(QsError::out_of_range("dip", dip, f64::MIN_POSITIVE, 90.0));
        }
        QsError::check_range("upper_depth", upper_depth, 0.0, f64::MAX)?;
        QsError::check_range("lower_depth", lower_depth, upper_depth, f64::MAX)?;

        let (sin_dip, _) = dip.to_radians().sin_cos();
        let length = trace.length_km();
        let width = (lower_depth - upper_depth) / sin_dip;

        let strike_segments = segment_count(length, spacing_km);
        let strike_spacing = length / strike_segments as f64;
        let (rows, dip_spacing) = if width > 0.0 {
            let segs = segment_count(width, spacing_km);
            (segs + 1, width / segs as f64)
        } else {
            (1, 0.0)
        };
        let cols = strike_segments + 1;

        let mut surface = Self {
            trace: trace.clone(),
            dip,
            dip_direction: (trace.average_strike() + 90.0) % 360.0,
            upper_depth,
            width,
            rows,
            cols,
            strike_spacing,
            dip_spacing,
            nodes: Vec::with_capacity(rows * cols),
        };

        let top = trace.resample(strike_segments);
        for r in 0..rows {
            let ddw = dip_spacing * r as f64;
            for loc in &top {
                let node = surface.move_down_dip(loc, ddw);
                surface.nodes.push(node);
            }
        }
        Ok(surface)
    }

    /// 把迹线上的点移到上界以下沿倾向 `ddw` (km) 处
    fn move_down_dip(&self, trace_loc: &Location, ddw: f64) -> Location {
        let (sin_dip, cos_dip) = self.dip.to_radians().sin_cos();
        let along_dip = self.upper_depth / sin_dip + ddw;
        let mut loc = trace_loc.offset(self.dip_direction, along_dip * cos_dip, 0.0);
        loc.depth = self.upper_depth + ddw * sin_dip;
        loc
    }

    /// 行数（沿倾向）
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.rows
    }

    /// 列数（沿走向）
    #[must_use]
    pub fn num_cols(&self) -> usize {
        self.cols
    }

    /// 网格节点
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<&Location> {
        if row < self.rows && col < self.cols {
            self.nodes.get(row * self.cols + col)
        } else {
            None
        }
    }

    /// 沿走向长度 (km)
    #[must_use]
    pub fn length_km(&self) -> f64 {
        self.trace.length_km()
    }

    /// 沿倾向宽度 (km)
    #[must_use]
    pub fn width_km(&self) -> f64 {
        self.width
    }

    /// 实际沿走向节点间距 (km)
    #[must_use]
    pub fn strike_spacing(&self) -> f64 {
        self.strike_spacing
    }

    /// 实际沿倾向节点间距 (km)
    #[must_use]
    pub fn dip_spacing(&self) -> f64 {
        self.dip_spacing
    }

    /// 倾角 (度)
    #[must_use]
    pub fn dip(&self) -> f64 {
        self.dip
    }

    /// 沿走向 `das`、沿倾向 `ddw` (km) 处的曲面位置
    #[must_use]
    pub fn interpolated_location(&self, das: f64, ddw: f64) -> Location {
        self.move_down_dip(&self.trace.location_at(das), ddw)
    }

    /// 沿走向 `das` 处的局部走向 (度)
    #[must_use]
    pub fn strike_at(&self, das: f64) -> f64 {
        self.trace.strike_at(das)
    }
}

/// 覆盖 `extent` 所需的段数；低于 1e-9 个间距的舍入误差不增加一段
fn segment_count(extent: f64, spacing: f64) -> usize {
    ((extent / spacing - 1e-9).ceil() as usize).max(1)
}

impl Index<(usize, usize)> for EvenlyGriddedSurface {
    type Output = Location;

    /// 按 `(行, 列)` 取网格节点，越界时 panic
    fn index(&self, (row, col): (usize, usize)) -> &Location {
        assert!(
            row < self.rows && col < self.cols,
            "网格节点 ({row}, {col}) 超出 {}x{}",
            self.rows,
            self.cols
        );
        &self.nodes[row * self.cols + col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace_10km() -> FaultTrace {
        let a = Location::new(35.0, -118.0, 0.0);
        let b = a.offset(90.0, 10.0, 0.0);
        FaultTrace::new(vec![a, b]).unwrap()
    }

    #[test]
    fn test_grid_dimensions() {
        let surf = EvenlyGriddedSurface::build(&trace_10km(), 90.0, 0.0, 8.0, 2.0).unwrap();
        assert_eq!(surf.num_cols(), 6);
        assert_eq!(surf.num_rows(), 5);
        assert!((surf.strike_spacing() - 2.0).abs() < 1e-9);
        assert!((surf.dip_spacing() - 2.0).abs() < 1e-9);
        assert!(surf.get(5, 0).is_none());
        let bottom = surf.get(4, 0).unwrap();
        assert!((bottom.depth - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_index_matches_get() {
        let surf = EvenlyGriddedSurface::build(&trace_10km(), 60.0, 0.0, 6.0, 2.0).unwrap();
        for r in 0..surf.num_rows() {
            for c in 0..surf.num_cols() {
                assert_eq!(&surf[(r, c)], surf.get(r, c).unwrap());
            }
        }
    }

    #[test]
    #[should_panic]
    fn test_index_out_of_range_panics() {
        let surf = EvenlyGriddedSurface::build(&trace_10km(), 90.0, 0.0, 4.0, 2.0).unwrap();
        let _ = &surf[(surf.num_rows(), 0)];
    }

    #[test]
    fn test_spacing_never_exceeds_request() {
        let surf = EvenlyGriddedSurface::build(&trace_10km(), 60.0, 1.0, 10.0, 3.0).unwrap();
        assert!(surf.strike_spacing() <= 3.0);
        assert!(surf.dip_spacing() <= 3.0);
        assert_eq!(surf.num_cols(), 5);
        let w = 9.0 / 60f64.to_radians().sin();
        assert!((surf.width_km() - w).abs() < 1e-9);
    }

    #[test]
    fn test_zero_width_single_row() {
        let surf = EvenlyGriddedSurface::build(&trace_10km(), 45.0, 5.0, 5.0, 1.0).unwrap();
        assert_eq!(surf.num_rows(), 1);
        assert_eq!(surf.width_km(), 0.0);
    }

    #[test]
    fn test_dipping_nodes_move_toward_dip_direction() {
        // 东西走向 (90°)，倾向朝南 (180°)
        let surf = EvenlyGriddedSurface::build(&trace_10km(), 45.0, 0.0, 4.0, 1.0).unwrap();
        let top = surf.get(0, 0).unwrap();
        let bottom = surf.get(surf.num_rows() - 1, 0).unwrap();
        assert!(bottom.latitude < top.latitude);
        let horiz = top.horizontal_distance_km(bottom);
        assert!((horiz - 4.0).abs() < 1e-6, "horiz = {horiz}");
    }

    #[test]
    fn test_interpolation_matches_nodes() {
        let surf = EvenlyGriddedSurface::build(&trace_10km(), 60.0, 2.0, 12.0, 2.0).unwrap();
        let node = surf.get(2, 3).unwrap();
        let interp = surf.interpolated_location(3.0 * surf.strike_spacing(), 2.0 * surf.dip_spacing());
        assert!(node.horizontal_distance_km(&interp) < 1e-6);
        assert!((node.depth - interp.depth).abs() < 1e-9);
        assert!((surf.strike_at(5.0) - 90.0).abs() < 0.1);
    }

    #[test]
    fn test_invalid_parameters() {
        let trace = trace_10km();
        assert!(EvenlyGriddedSurface::build(&trace, 0.0, 0.0, 5.0, 1.0).is_err());
        assert!(EvenlyGriddedSurface::build(&trace, 45.0, 5.0, 4.0, 1.0).is_err());
        assert!(EvenlyGriddedSurface::build(&trace, 45.0, 0.0, 5.0, 0.0).is_err());
    }
}
