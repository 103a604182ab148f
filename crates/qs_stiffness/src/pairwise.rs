// crates/qs_stiffness/src/pairwise.rs
//! 子段对刚度统计及其记忆化缓存
//!
//! [`PairwiseStiffnessCache::stiffness`] 对每个有序子段对至多计算一次面元
//! 交叉积，归约为 SIGMA/TAU/CFF 三个 [`StiffnessResult`]（顺序固定）。
//!
//! 簇级查询遍历全部（源子段 × 接收子段）对（跳过自身对），再用
//! [`StiffnessResult::combine`] 合并。合并对均值与中位数直接求和，是一种
//! 近似：合并后的"中位数"不是合并数据的真实中位数。

use std::fmt;
use std::sync::Arc;

use qs_fault::FaultSubsectionCluster;
use qs_foundation::SectionId;
use tracing::debug;

use crate::aggregation::Summary;
use crate::calculator::StiffnessCalculator;
use crate::error::{StiffResult, StiffnessError};
use crate::memo::MemoMap;
use crate::types::StiffnessType;

/// 一组面元对作用值的统计
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StiffnessResult {
    /// 源编号（子段或母断层）；合并结果可能没有
    pub source_id: Option<usize>,
    /// 接收编号（子段或母断层）；合并结果可能没有
    pub receiver_id: Option<usize>,
    /// 物理量
    pub stiffness_type: StiffnessType,
    /// 非奇异值均值
    pub mean: f64,
    /// 非奇异值中位数
    pub median: f64,
    /// 非奇异值最小值
    pub min: f64,
    /// 非奇异值最大值
    pub max: f64,
    /// 非负值占全部值的比例
    pub fraction_positive: f64,
    /// 奇异值占全部值的比例
    pub fraction_singular: f64,
    /// 全部值个数（含奇异）
    pub count: usize,
}

impl StiffnessResult {
    /// 由原始值构造，NaN 视为奇异
    #[must_use]
    pub fn from_values(
        source_id: Option<usize>,
        receiver_id: Option<usize>,
        stiffness_type: StiffnessType,
        values: &[f64],
    ) -> Self {
        let summary = Summary::of(values);
        let count = values.len();
        let (fraction_positive, fraction_singular) = if count == 0 {
            (f64::NAN, f64::NAN)
        } else {
            let positive = values.iter().filter(|&&v| v >= 0.0).count();
            let singular = values.iter().filter(|v| v.is_nan()).count();
            (positive as f64 / count as f64, singular as f64 / count as f64)
        };
        Self {
            source_id,
            receiver_id,
            stiffness_type,
            mean: summary.mean(),
            median: summary.median(),
            min: summary.min(),
            max: summary.max(),
            fraction_positive,
            fraction_singular,
            count,
        }
    }

    /// 合并若干子结果
    ///
    /// 个数、均值、中位数求和，最小/最大取极值，两个比例取平均。
    /// 没有子结果时返回 `None`。
    #[must_use]
    pub fn combine(
        source_id: Option<usize>,
        receiver_id: Option<usize>,
        stiffness_type: StiffnessType,
        children: &[StiffnessResult],
    ) -> Option<Self> {
        if children.is_empty() {
            return None;
        }
        let n = children.len() as f64;
        let mut combined = Self {
            source_id,
            receiver_id,
            stiffness_type,
            mean: 0.0,
            median: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            fraction_positive: 0.0,
            fraction_singular: 0.0,
            count: 0,
        };
        for child in children {
            combined.count += child.count;
            combined.mean += child.mean;
            combined.median += child.median;
            combined.min = combined.min.min(child.min);
            combined.max = combined.max.max(child.max);
            combined.fraction_positive += child.fraction_positive;
            combined.fraction_singular += child.fraction_singular;
        }
        combined.fraction_positive /= n;
        combined.fraction_singular /= n;
        Some(combined)
    }
}

impl fmt::Display for StiffnessResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = |v: Option<usize>| v.map_or_else(|| "-".to_string(), |v| v.to_string());
        write!(
            f,
            "[{}→{}] {}: mean={:.4e} median={:.4e} range=[{:.4e}, {:.4e}] fractPositive={:.3} fractSingular={:.3} count={}",
            id(self.source_id),
            id(self.receiver_id),
            self.stiffness_type,
            self.mean,
            self.median,
            self.min,
            self.max,
            self.fraction_positive,
            self.fraction_singular,
            self.count
        )
    }
}

/// 一个子段对的三个物理量结果，按 [`StiffnessType`] 下标排列
pub type PairStiffness = Arc<[StiffnessResult; 3]>;

/// 子段对刚度记忆化缓存
pub struct PairwiseStiffnessCache {
    calc: Arc<StiffnessCalculator>,
    memo: MemoMap<(SectionId, SectionId), PairStiffness>,
}

impl PairwiseStiffnessCache {
    /// 创建缓存
    #[must_use]
    pub fn new(calc: Arc<StiffnessCalculator>) -> Self {
        Self {
            calc,
            memo: MemoMap::new(),
        }
    }

    /// 计算器
    #[must_use]
    pub fn calculator(&self) -> &Arc<StiffnessCalculator> {
        &self.calc
    }

    /// 有序子段对的 SIGMA/TAU/CFF 统计
    ///
    /// 同一对至多计算一次；并发的同键调用等待首个计算完成。
    pub fn stiffness(&self, source: SectionId, receiver: SectionId) -> StiffResult<PairStiffness> {
        if source == receiver {
            return Err(StiffnessError::SelfInteraction { id: source.get() });
        }
        self.memo.get_or_try_insert(&(source, receiver), || {
            let dist = self.calc.calc_stiffness_distribution(source, receiver)?;
            debug!(source = source.get(), receiver = receiver.get(), "子段对刚度已计算");
            let ids = (Some(source.get()), Some(receiver.get()));
            Ok(Arc::new(StiffnessType::ALL.map(|ty| {
                StiffnessResult::from_values(ids.0, ids.1, ty, &dist.flatten(ty))
            })))
        })
    }

    /// 已缓存的子段对数
    #[must_use]
    pub fn len(&self) -> usize {
        self.memo.len()
    }

    /// 是否为空
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }

    /// 清空
    pub fn clear(&self) {
        self.memo.clear();
    }

    fn combine_pairs(
        &self,
        ty: StiffnessType,
        ids: (Option<usize>, Option<usize>),
        sources: &[SectionId],
        receivers: &[SectionId],
        empty_receiver: usize,
    ) -> StiffResult<StiffnessResult> {
        let mut children = Vec::with_capacity(sources.len() * receivers.len());
        for &receiver in receivers {
            for &source in sources {
                if source != receiver {
                    children.push(self.stiffness(source, receiver)?[ty.index()]);
                }
            }
        }
        StiffnessResult::combine(ids.0, ids.1, ty, &children).ok_or(StiffnessError::NoSources {
            receiver: empty_receiver,
        })
    }

    fn parent_members(&self, parent_id: usize) -> Vec<SectionId> {
        self.calc
            .sections()
            .iter()
            .filter(|s| s.parent_section_id() == Some(parent_id))
            .map(|s| SectionId::new(s.section_id()))
            .collect()
    }

    /// 母断层对母断层
    pub fn calc_parent_stiffness(
        &self,
        ty: StiffnessType,
        source_parent: usize,
        receiver_parent: usize,
    ) -> StiffResult<StiffnessResult> {
        let sources = self.parent_members(source_parent);
        let receivers = self.parent_members(receiver_parent);
        self.combine_pairs(
            ty,
            (Some(source_parent), Some(receiver_parent)),
            &sources,
            &receivers,
            receiver_parent,
        )
    }

    /// 子段簇对子段簇
    pub fn calc_cluster_stiffness(
        &self,
        ty: StiffnessType,
        source: &FaultSubsectionCluster,
        receiver: &FaultSubsectionCluster,
    ) -> StiffResult<StiffnessResult> {
        self.combine_pairs(
            ty,
            (Some(source.parent_section_id), Some(receiver.parent_section_id)),
            &source.subsections,
            &receiver.subsections,
            receiver.parent_section_id,
        )
    }

    /// 破裂中除接收簇以外的全部簇对接收簇
    pub fn calc_agg_rup_to_cluster_stiffness(
        &self,
        ty: StiffnessType,
        rupture: &[FaultSubsectionCluster],
        receiver: &FaultSubsectionCluster,
    ) -> StiffResult<StiffnessResult> {
        let others: Vec<FaultSubsectionCluster> =
            rupture.iter().filter(|c| *c != receiver).cloned().collect();
        self.combine_pairs(
            ty,
            (None, Some(receiver.parent_section_id)),
            &FaultSubsectionCluster::flatten(&others),
            &receiver.subsections,
            receiver.parent_section_id,
        )
    }

    /// 给定的若干源簇对接收簇
    pub fn calc_agg_clusters_to_cluster_stiffness(
        &self,
        ty: StiffnessType,
        sources: &[FaultSubsectionCluster],
        receiver: &FaultSubsectionCluster,
    ) -> StiffResult<StiffnessResult> {
        self.combine_pairs(
            ty,
            (None, Some(receiver.parent_section_id)),
            &FaultSubsectionCluster::flatten(sources),
            &receiver.subsections,
            receiver.parent_section_id,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(mean: f64, median: f64, min: f64, max: f64, fp: f64, fs: f64, count: usize) -> StiffnessResult {
        StiffnessResult {
            source_id: Some(0),
            receiver_id: Some(1),
            stiffness_type: StiffnessType::Cff,
            mean,
            median,
            min,
            max,
            fraction_positive: fp,
            fraction_singular: fs,
            count,
        }
    }

    #[test]
    fn test_from_values_counts_singular() {
        let r = StiffnessResult::from_values(Some(2), Some(5), StiffnessType::Tau, &[1.0, -3.0, f64::NAN, 0.0]);
        assert_eq!(r.count, 4);
        assert_eq!(r.fraction_singular, 0.25);
        assert_eq!(r.fraction_positive, 0.5);
        assert_eq!(r.min, -3.0);
        assert_eq!(r.max, 1.0);
        assert_eq!(r.median, 0.0);
        assert!((r.mean + 2.0 / 3.0).abs() < 1e-15);
    }

    #[test]
    fn test_combine_is_approximate_sum() {
        let a = result(1.0, 0.5, -1.0, 4.0, 0.6, 0.0, 10);
        let b = result(-2.0, -1.5, -6.0, 2.0, 0.2, 0.5, 6);
        let c = StiffnessResult::combine(None, Some(1), StiffnessType::Cff, &[a, b]).unwrap();
        assert_eq!(c.count, 16);
        assert_eq!(c.mean, -1.0);
        // 中位数直接求和，不是合并数据的中位数
        assert_eq!(c.median, -1.0);
        assert_eq!((c.min, c.max), (-6.0, 4.0));
        assert!((c.fraction_positive - 0.4).abs() < 1e-15);
        assert_eq!(c.fraction_singular, 0.25);
        assert_eq!(c.source_id, None);
        assert!(StiffnessResult::combine(None, None, StiffnessType::Cff, &[]).is_none());
    }
}
