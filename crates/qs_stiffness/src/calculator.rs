// crates/qs_stiffness/src/calculator.rs
//! 子段刚度计算器
//!
//! 持有全部断层子段、介质参数与统一的 UTM 投影。面元列表在第一次使用时
//! 对全部子段并行构建一次；之后任何子段对的面元交叉积都直接复用。
//!
//! 每个物理量各有一个 [`PersistentAggregationCache`]，由计算器持有，供
//! [`AggregationEngine`](crate::aggregation::AggregationEngine) 记忆化并写盘。

use std::fmt::Write as _;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use qs_fault::FaultSection;
use qs_foundation::{QsError, SectionId};
use qs_geo::UtmProjection;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::distribution::StiffnessDistribution;
use crate::error::{StiffResult, StiffnessError};
use crate::kernel::{calc_stiffness, coulomb_stress};
use crate::patch::Patch;
use crate::patch_builder::{build_patches, PatchAlignment};
use crate::persistent_cache::PersistentAggregationCache;
use crate::types::StiffnessType;

/// 计算器参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StiffnessParams {
    /// 网格间距 (km)，也是面元边长
    pub grid_spacing_km: f64,
    /// 拉梅常数 λ (MPa)
    pub lame_lambda: f64,
    /// 剪切模量 μ (MPa)
    pub lame_mu: f64,
    /// 有效摩擦系数
    pub coeff_of_friction: f64,
    /// 面元布置方式
    pub patch_alignment: PatchAlignment,
    /// 自刚度上限倍数，0 表示不限制
    pub self_stiffness_cap: f64,
}

impl Default for StiffnessParams {
    fn default() -> Self {
        Self {
            grid_spacing_km: 2.0,
            lame_lambda: 30000.0,
            lame_mu: 30000.0,
            coeff_of_friction: 0.5,
            patch_alignment: PatchAlignment::GridCells,
            self_stiffness_cap: 0.0,
        }
    }
}

impl StiffnessParams {
    /// 参数合法性检查
    pub fn validate(&self) -> StiffResult<()> {
        let positive = |key: &str, v: f64| -> StiffResult<()> {
            if v > 0.0 && v.is_finite() {
                Ok(())
            } else {
                Err(QsError::invalid_config(key, v.to_string(), "必须为正").into())
            }
        };
        positive("grid_spacing_km", self.grid_spacing_km)?;
        positive("lame_lambda", self.lame_lambda)?;
        positive("lame_mu", self.lame_mu)?;
        QsError::check_range("coeff_of_friction", self.coeff_of_friction, 0.0, f64::MAX)?;
        QsError::check_range("self_stiffness_cap", self.self_stiffness_cap, 0.0, f64::MAX)?;
        Ok(())
    }
}

/// 子段刚度计算器
pub struct StiffnessCalculator {
    sections: Vec<Arc<dyn FaultSection>>,
    params: StiffnessParams,
    projection: UtmProjection,
    patches: OnceCell<Vec<Vec<Patch>>>,
    self_cff: Vec<OnceCell<Vec<f64>>>,
    caches: [PersistentAggregationCache; 3],
}

impl StiffnessCalculator {
    /// 创建计算器
    ///
    /// 子段编号必须与下标一致；投影带由全部迹线点经纬度范围的中点确定。
    pub fn new(sections: Vec<Arc<dyn FaultSection>>, params: StiffnessParams) -> StiffResult<Self> {
        params.validate()?;
        if sections.is_empty() {
            return Err(QsError::invalid_input("断层模型没有任何子段").into());
        }
        for (index, sect) in sections.iter().enumerate() {
            if sect.section_id() != index {
                return Err(StiffnessError::SectionIdMismatch {
                    index,
                    id: sect.section_id(),
                });
            }
        }

        let projection = UtmProjection::for_locations(
            sections.iter().flat_map(|s| s.fault_trace().locations()),
        )?;
        debug!(
            sections = sections.len(),
            zone = projection.zone(),
            letter = %projection.letter(),
            "刚度计算器已创建"
        );

        let n = sections.len();
        Ok(Self {
            self_cff: (0..n).map(|_| OnceCell::new()).collect(),
            caches: StiffnessType::ALL.map(|ty| PersistentAggregationCache::new(n, ty)),
            sections,
            params,
            projection,
            patches: OnceCell::new(),
        })
    }

    /// 参数
    #[must_use]
    pub fn params(&self) -> &StiffnessParams {
        &self.params
    }

    /// 子段数
    #[must_use]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// 投影
    #[must_use]
    pub fn projection(&self) -> &UtmProjection {
        &self.projection
    }

    /// 校验原始编号
    pub fn section_id(&self, raw: usize) -> StiffResult<SectionId> {
        Ok(SectionId::checked(raw, self.sections.len())?)
    }

    /// 子段
    pub fn section(&self, id: SectionId) -> StiffResult<&dyn FaultSection> {
        self.check(id)?;
        Ok(self.sections[id.get()].as_ref())
    }

    fn check(&self, id: SectionId) -> StiffResult<()> {
        Ok(QsError::check_index("SectionId", id.get(), self.sections.len())?)
    }

    /// 全部子段
    #[must_use]
    pub fn sections(&self) -> &[Arc<dyn FaultSection>] {
        &self.sections
    }

    fn all_patches(&self) -> StiffResult<&Vec<Vec<Patch>>> {
        self.patches.get_or_try_init(|| {
            let spacing = self.params.grid_spacing_km;
            let alignment = self.params.patch_alignment;
            let built = self
                .sections
                .par_iter()
                .map(|s| build_patches(s.as_ref(), spacing, &self.projection, alignment))
                .collect::<StiffResult<Vec<_>>>()?;
            let total: usize = built.iter().map(Vec::len).sum();
            info!(
                sections = built.len(),
                patches = total,
                %alignment,
                "面元构建完成"
            );
            Ok(built)
        })
    }

    /// 子段的面元
    pub fn patches(&self, id: SectionId) -> StiffResult<&[Patch]> {
        self.check(id)?;
        Ok(self.all_patches()?[id.get()].as_slice())
    }

    /// 子段每个面元对自身的库仑应力变化
    pub fn self_stiffness(&self, id: SectionId) -> StiffResult<&[f64]> {
        self.check(id)?;
        let cell = &self.self_cff[id.get()];
        let values = cell.get_or_try_init(|| {
            let patches = self.patches(id)?;
            let p = &self.params;
            Ok::<_, StiffnessError>(
                patches
                    .iter()
                    .map(|patch| {
                        calc_stiffness(p.lame_lambda, p.lame_mu, patch, patch)
                            .map_or(f64::NAN, |sc| sc.coulomb(p.coeff_of_friction))
                    })
                    .collect(),
            )
        })?;
        Ok(values.as_slice())
    }

    /// 源子段全部面元对接收子段全部面元的作用，不经任何缓存
    pub fn calc_stiffness_distribution(
        &self,
        source: SectionId,
        receiver: SectionId,
    ) -> StiffResult<StiffnessDistribution> {
        let source_patches = self.patches(source)?;
        let receiver_patches = self.patches(receiver)?;
        let p = self.params;
        let self_cff = if p.self_stiffness_cap > 0.0 {
            Some(self.self_stiffness(receiver)?)
        } else {
            None
        };

        let rows: Vec<([Vec<f64>; 3], usize)> = receiver_patches
            .par_iter()
            .enumerate()
            .map(|(r, rec)| {
                let cap = self_cff.map_or(f64::NAN, |s| s[r].abs() * p.self_stiffness_cap);
                let mut sigma = Vec::with_capacity(source_patches.len());
                let mut tau = Vec::with_capacity(source_patches.len());
                let mut cff = Vec::with_capacity(source_patches.len());
                let mut clamped = 0;
                for src in source_patches {
                    match calc_stiffness(p.lame_lambda, p.lame_mu, src, rec) {
                        Some(sc) => {
                            let mut c = coulomb_stress(sc.tau, sc.sigma, p.coeff_of_friction);
                            if c > cap {
                                c = cap;
                                clamped += 1;
                            } else if c < -cap {
                                c = -cap;
                                clamped += 1;
                            }
                            sigma.push(sc.sigma);
                            tau.push(sc.tau);
                            cff.push(c);
                        }
                        None => {
                            sigma.push(f64::NAN);
                            tau.push(f64::NAN);
                            cff.push(f64::NAN);
                        }
                    }
                }
                ([sigma, tau, cff], clamped)
            })
            .collect();

        let clamped: usize = rows.iter().map(|(_, c)| c).sum();
        if clamped > 0 {
            warn!(
                source = source.get(),
                receiver = receiver.get(),
                clamped,
                cap = p.self_stiffness_cap,
                "库仑应力超过自刚度上限，已截断"
            );
        }

        let mut values: [Vec<Vec<f64>>; 3] = Default::default();
        for (row, _) in rows {
            for (matrix, v) in values.iter_mut().zip(row) {
                matrix.push(v);
            }
        }
        debug!(
            source = source.get(),
            receiver = receiver.get(),
            source_patches = source_patches.len(),
            receiver_patches = receiver_patches.len(),
            "面元交叉积计算完成"
        );
        Ok(StiffnessDistribution::new(source.get(), receiver.get(), values))
    }

    /// 某物理量的持久化聚合缓存
    #[must_use]
    pub fn aggregation_cache(&self, ty: StiffnessType) -> &PersistentAggregationCache {
        &self.caches[ty.index()]
    }

    /// 清空全部持久化聚合缓存
    pub fn clear_caches(&self) {
        for cache in &self.caches {
            cache.clear();
        }
    }

    /// 某物理量缓存文件的建议文件名，编码全部影响结果的参数
    #[must_use]
    pub fn cache_file_name(&self, ty: StiffnessType) -> String {
        let p = &self.params;
        let mut name = format!(
            "{}_cache_{}_sects_{}km_lambda{}_mu{}_coeff{}_align{}",
            ty.file_tag(),
            self.sections.len(),
            p.grid_spacing_km,
            p.lame_lambda,
            p.lame_mu,
            p.coeff_of_friction,
            p.patch_alignment,
        );
        if p.self_stiffness_cap > 0.0 {
            let _ = write!(name, "_selfCap{}", p.self_stiffness_cap);
        }
        name.push_str(".csv");
        name
    }
}

impl std::fmt::Debug for StiffnessCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StiffnessCalculator")
            .field("sections", &self.sections.len())
            .field("params", &self.params)
            .field("zone", &self.projection.zone())
            .field("letter", &self.projection.letter())
            .finish_non_exhaustive()
    }
}
