// crates/qs_stiffness/src/patch_builder.rs
//! 子段离散为面元
//!
//! 所有面元的长宽都取请求的网格间距，而不是实际节点间距：这样全模型
//! 每个面元面积相同，单位滑动对应的地震矩也相同。

use std::fmt;

use glam::DVec3;
use qs_fault::{EvenlyGriddedSurface, FaultSection};
use qs_geo::{LocalProjection, Location};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StiffResult, StiffnessError};
use crate::patch::{FocalMechanism, Patch};

/// 面元布置方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PatchAlignment {
    /// 每个网格单元一个面元，中心为四个节点的平均
    #[default]
    GridCells,
    /// 沿走向/沿倾向 `floor(长度 / 间距)` 个面元，均匀居中
    Center,
    /// 首尾面元贴边，中间面元等重叠铺满
    FillOverlap,
}

impl PatchAlignment {
    /// 所有布置方式
    pub const ALL: [PatchAlignment; 3] = [Self::GridCells, Self::Center, Self::FillOverlap];

    /// 名称
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GridCells => "GridCells",
            Self::Center => "Center",
            Self::FillOverlap => "FillOverlap",
        }
    }
}

impl fmt::Display for PatchAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 按给定间距 (km) 与布置方式把子段离散为面元
///
/// 面元中心经 `projection` 投影到局部坐标（米），长宽为 `spacing_km * 1000`。
/// 没有任何面元时返回 [`StiffnessError::NoPatches`]。
pub fn build_patches(
    section: &dyn FaultSection,
    spacing_km: f64,
    projection: &dyn LocalProjection,
    alignment: PatchAlignment,
) -> StiffResult<Vec<Patch>> {
    let surface = section.gridded_surface(spacing_km)?;
    let size_m = spacing_km * 1000.0;
    let dip = section.ave_dip();
    let rake = section.ave_rake();

    let patches = match alignment {
        PatchAlignment::GridCells => grid_cell_patches(&surface, size_m, dip, rake, projection)?,
        PatchAlignment::Center => {
            let das = centered(surface.length_km(), spacing_km);
            let ddw = centered(surface.width_km(), spacing_km);
            sampled_patches(&surface, &das, &ddw, size_m, dip, rake, projection)?
        }
        PatchAlignment::FillOverlap => {
            let das = full_overlap_centers(surface.length_km(), spacing_km);
            let ddw = full_overlap_centers(surface.width_km(), spacing_km);
            sampled_patches(&surface, &das, &ddw, size_m, dip, rake, projection)?
        }
    };

    if patches.is_empty() {
        return Err(StiffnessError::NoPatches {
            section: section.section_id(),
        });
    }
    debug!(
        section = section.section_id(),
        patches = patches.len(),
        %alignment,
        "子段面元构建完成"
    );
    Ok(patches)
}

fn grid_cell_patches(
    surface: &EvenlyGriddedSurface,
    size_m: f64,
    dip: f64,
    rake: f64,
    projection: &dyn LocalProjection,
) -> StiffResult<Vec<Patch>> {
    let rows = surface.num_rows();
    let cols = surface.num_cols();
    let mut patches = Vec::with_capacity(rows.saturating_sub(1) * cols.saturating_sub(1));

    for r in 0..rows.saturating_sub(1) {
        for c in 0..cols.saturating_sub(1) {
            let tl = &surface[(r, c)];
            let tr = &surface[(r, c + 1)];
            let bl = &surface[(r + 1, c)];
            let br = &surface[(r + 1, c + 1)];
            let center = Location::new(
                (tl.latitude + tr.latitude + bl.latitude + br.latitude) / 4.0,
                (tl.longitude + tr.longitude + bl.longitude + br.longitude) / 4.0,
                (tl.depth + tr.depth + bl.depth + br.depth) / 4.0,
            );
            let strike = tl.azimuth_deg(tr);
            patches.push(Patch::new(
                projection.to_local(&center)?,
                size_m,
                size_m,
                FocalMechanism::new(strike, dip, rake),
            ));
        }
    }
    Ok(patches)
}

fn sampled_patches(
    surface: &EvenlyGriddedSurface,
    das_centers: &[f64],
    ddw_centers: &[f64],
    size_m: f64,
    dip: f64,
    rake: f64,
    projection: &dyn LocalProjection,
) -> StiffResult<Vec<Patch>> {
    let mut patches = Vec::with_capacity(das_centers.len() * ddw_centers.len());
    for &das in das_centers {
        let strike = surface.strike_at(das);
        for &ddw in ddw_centers {
            let center: DVec3 = projection.to_local(&surface.interpolated_location(das, ddw))?;
            patches.push(Patch::new(center, size_m, size_m, FocalMechanism::new(strike, dip, rake)));
        }
    }
    Ok(patches)
}

/// `max(1, floor(len / spacing))` 个等分段的中点
fn centered(length: f64, spacing: f64) -> Vec<f64> {
    let n = ((length / spacing) as usize).max(1);
    let step = length / n as f64;
    (0..n).map(|i| step * (i as f64 + 0.5)).collect()
}

/// 首尾面元贴边、中间面元等重叠的中心位置
fn full_overlap_centers(length: f64, spacing: f64) -> Vec<f64> {
    if length <= spacing {
        return vec![0.5 * length];
    }
    let first = 0.5 * spacing;
    let last = length - 0.5 * spacing;
    let mut centers = vec![first];

    let residual = length - 2.0 * spacing;
    if residual > 0.0 {
        let middles = (residual / spacing).ceil() as usize;
        if middles == 1 {
            centers.push(0.5 * length);
        } else {
            let step = (length - spacing) / (middles + 1) as f64;
            centers.extend((0..middles).map(|i| first + step * (i + 1) as f64));
        }
    }
    centers.push(last);
    centers
}
