// crates/qs_fault/src/cluster.rs
//! 子段簇：同一母断层下连续的若干子段

use qs_foundation::SectionId;
use serde::{Deserialize, Serialize};

/// 子段簇
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultSubsectionCluster {
    /// 母断层编号
    pub parent_section_id: usize,
    /// 成员子段
    pub subsections: Vec<SectionId>,
}

impl FaultSubsectionCluster {
    /// 创建子段簇
    #[must_use]
    pub fn new(parent_section_id: usize, subsections: Vec<SectionId>) -> Self {
        Self {
            parent_section_id,
            subsections,
        }
    }

    /// 是否包含给定子段
    #[must_use]
    pub fn contains(&self, id: SectionId) -> bool {
        self.subsections.contains(&id)
    }

    /// 把若干簇（一次破裂）展开为子段列表
    #[must_use]
    pub fn flatten(clusters: &[FaultSubsectionCluster]) -> Vec<SectionId> {
        clusters
            .iter()
            .flat_map(|c| c.subsections.iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_preserves_order() {
        let a = FaultSubsectionCluster::new(1, vec![SectionId::new(0), SectionId::new(1)]);
        let b = FaultSubsectionCluster::new(2, vec![SectionId::new(5)]);
        let flat = FaultSubsectionCluster::flatten(&[a.clone(), b]);
        assert_eq!(flat, vec![SectionId::new(0), SectionId::new(1), SectionId::new(5)]);
        assert!(a.contains(SectionId::new(1)));
        assert!(!a.contains(SectionId::new(5)));
    }
}
