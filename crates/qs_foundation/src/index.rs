// crates/qs_foundation/src/index.rs

//! 断层子段索引
//!
//! 断层模型中的子段以稠密、从 0 开始的整数编号。缓存层直接用该编号
//! 索引二维数组，因此编号必须等于子段在模型中的位置。

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{QsError, QsResult};

/// 稠密子段索引
///
/// `new` 不做校验；需要与模型大小对照时使用 [`SectionId::checked`]。
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct SectionId(usize);

impl SectionId {
    /// 创建索引
    #[inline]
    pub const fn new(idx: usize) -> Self {
        Self(idx)
    }

    /// 创建并校验索引落在 `0..count` 内
    #[inline]
    pub fn checked(idx: usize, count: usize) -> QsResult<Self> {
        QsError::check_index("SectionId", idx, count)?;
        Ok(Self(idx))
    }

    /// 获取索引值
    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }

    /// 生成 `0..count` 的全部索引
    pub fn range(count: usize) -> impl Iterator<Item = SectionId> + Clone {
        (0..count).map(SectionId)
    }
}

impl From<SectionId> for usize {
    #[inline]
    fn from(id: SectionId) -> usize {
        id.0
    }
}

impl fmt::Debug for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SectionId({})", self.0)
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
