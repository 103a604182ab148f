// crates/qs_stiffness/src/distribution.rs
//! 子段对的原始面元刚度分布

use crate::aggregation::AggregationMethod;
use crate::types::StiffnessType;

/// 源子段对接收子段的全部面元作用
///
/// 每个物理量一张 `[接收面元][源面元]` 矩阵，奇异面元对存为 NaN。
#[derive(Debug, Clone, PartialEq)]
pub struct StiffnessDistribution {
    source_id: usize,
    receiver_id: usize,
    values: [Vec<Vec<f64>>; 3],
}

impl StiffnessDistribution {
    /// 由三张矩阵构造
    #[must_use]
    pub fn new(source_id: usize, receiver_id: usize, values: [Vec<Vec<f64>>; 3]) -> Self {
        Self {
            source_id,
            receiver_id,
            values,
        }
    }

    /// 源子段编号
    #[must_use]
    pub fn source_id(&self) -> usize {
        self.source_id
    }

    /// 接收子段编号
    #[must_use]
    pub fn receiver_id(&self) -> usize {
        self.receiver_id
    }

    /// 某物理量的全部行
    #[must_use]
    pub fn values(&self, ty: StiffnessType) -> &[Vec<f64>] {
        &self.values[ty.index()]
    }

    /// 某接收面元的一行
    #[must_use]
    pub fn row(&self, ty: StiffnessType, receiver_patch: usize) -> &[f64] {
        &self.values[ty.index()][receiver_patch]
    }

    /// 展平为一维
    #[must_use]
    pub fn flatten(&self, ty: StiffnessType) -> Vec<f64> {
        self.values[ty.index()].iter().flatten().copied().collect()
    }

    /// 接收面元个数
    #[must_use]
    pub fn receiver_patch_count(&self) -> usize {
        self.values[0].len()
    }

    /// 每个接收面元上的源面元个数
    #[must_use]
    pub fn source_patch_count(&self) -> usize {
        self.values[0].first().map_or(0, Vec::len)
    }

    /// 每行按 `method` 归约为一个值，得到单列分布
    #[must_use]
    pub fn receiver_aggregate(&self, method: AggregationMethod) -> Self {
        let values = StiffnessType::ALL.map(|ty| {
            self.values[ty.index()]
                .iter()
                .map(|row| vec![method.reduce(row)])
                .collect()
        });
        Self::new(self.source_id, self.receiver_id, values)
    }

    /// 去掉每个面元对自身的作用（同一子段的对角线）
    #[must_use]
    pub fn without_self_patches(&self) -> Self {
        let values = StiffnessType::ALL.map(|ty| {
            self.values[ty.index()]
                .iter()
                .enumerate()
                .map(|(r, row)| {
                    row.iter()
                        .enumerate()
                        .filter(|&(s, _)| s != r)
                        .map(|(_, &v)| v)
                        .collect()
                })
                .collect()
        });
        Self::new(self.source_id, self.receiver_id, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StiffnessDistribution {
        let sigma = vec![vec![1.0, 2.0], vec![3.0, f64::NAN]];
        let tau = vec![vec![-1.0, 0.5], vec![2.0, 4.0]];
        let cff = vec![vec![0.0, -3.0], vec![6.0, 1.0]];
        StiffnessDistribution::new(4, 9, [sigma, tau, cff])
    }

    #[test]
    fn test_shape_and_rows() {
        let dist = sample();
        assert_eq!(dist.receiver_patch_count(), 2);
        assert_eq!(dist.source_patch_count(), 2);
        assert_eq!(dist.row(StiffnessType::Tau, 1), &[2.0, 4.0]);
        assert_eq!(dist.flatten(StiffnessType::Cff), vec![0.0, -3.0, 6.0, 1.0]);
        assert_eq!((dist.source_id(), dist.receiver_id()), (4, 9));
    }

    #[test]
    fn test_receiver_aggregate() {
        let agg = sample().receiver_aggregate(AggregationMethod::Sum);
        assert_eq!(agg.source_patch_count(), 1);
        assert_eq!(agg.flatten(StiffnessType::Tau), vec![-0.5, 6.0]);
        // NaN 被跳过
        assert_eq!(agg.flatten(StiffnessType::Sigma), vec![3.0, 3.0]);
    }

    #[test]
    fn test_without_self_patches() {
        let dist = sample().without_self_patches();
        assert_eq!(dist.flatten(StiffnessType::Tau), vec![0.5, 2.0]);
        assert_eq!(dist.source_patch_count(), 1);
    }
}
