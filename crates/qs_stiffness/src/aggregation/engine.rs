// crates/qs_stiffness/src/aggregation/engine.rs
//! 多阶段聚合引擎
//!
//! 四个可选阶段，由内到外：
//!
//! 1. `receiver_patch_agg`: 每个接收面元上对全部源面元归约
//! 2. `sect_to_sect_agg`: 子段对归约为一个值（必需）
//! 3. `sects_to_sect_agg`: 多个源子段对一个接收子段
//! 4. `sects_to_sects_agg`: 多个源子段对多个接收子段
//!
//! 子段对结果记忆在计算器持有的持久化缓存中（按阶段 1 方法分槽），
//! 多源对单接收的结果按接收子段与排序后的源列表（保留重复）记忆在引擎内。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use qs_foundation::SectionId;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::method::{AggregationMethod, StiffnessAggregation};
use crate::calculator::StiffnessCalculator;
use crate::error::{StiffResult, StiffnessError};
use crate::types::StiffnessType;

/// 聚合流水线配置（构建后不可变）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// 物理量
    pub quantity: StiffnessType,
    /// 接收面元聚合
    pub receiver_patch_agg: Option<AggregationMethod>,
    /// 子段对聚合
    pub sect_to_sect_agg: Option<AggregationMethod>,
    /// 多源对单接收聚合
    pub sects_to_sect_agg: Option<AggregationMethod>,
    /// 多源对多接收聚合
    pub sects_to_sects_agg: Option<AggregationMethod>,
    /// 是否允许子段作为自身的源（此时排除面元对自身的作用）
    pub allow_sect_to_self: bool,
}

impl AggregationConfig {
    /// 开始构建
    #[must_use]
    pub fn builder(quantity: StiffnessType) -> AggregationConfigBuilder {
        AggregationConfigBuilder {
            config: Self {
                quantity,
                receiver_patch_agg: None,
                sect_to_sect_agg: None,
                sects_to_sect_agg: None,
                sects_to_sects_agg: None,
                allow_sect_to_self: false,
            },
        }
    }

    fn stages(&self) -> impl Iterator<Item = (&'static str, AggregationMethod)> {
        [
            ("Patch", self.receiver_patch_agg),
            ("Sect", self.sect_to_sect_agg),
            ("Sects→Sect", self.sects_to_sect_agg),
            ("Sects→Sects", self.sects_to_sects_agg),
        ]
        .into_iter()
        .filter_map(|(label, m)| m.map(|m| (label, m)))
    }

    /// 全部已配置阶段的方法都带物理单位
    #[must_use]
    pub fn has_units(&self) -> bool {
        self.stages().all(|(_, m)| m.has_units())
    }

    /// 可读的标量名，外层阶段在前，如 `"Sum Sects→Sect Median Sect ΔCFF"`
    #[must_use]
    pub fn scalar_name(&self) -> String {
        let mut parts: Vec<String> = self
            .stages()
            .map(|(label, m)| format!("{} {label}", m.display_name()))
            .collect();
        parts.reverse();
        parts.push(self.quantity.name().to_string());
        parts.join(" ")
    }
}

impl fmt::Display for AggregationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stages: Vec<&str> = self.stages().map(|(_, m)| m.display_name()).collect();
        write!(f, "AggregationEngine[{}: {}]", self.quantity.name(), stages.join(" -> "))
    }
}

/// [`AggregationConfig`] 构建器
#[derive(Debug, Clone, Copy)]
#[must_use]
pub struct AggregationConfigBuilder {
    config: AggregationConfig,
}

impl AggregationConfigBuilder {
    /// 接收面元聚合
    pub fn receiver_patch_agg(mut self, method: AggregationMethod) -> Self {
        self.config.receiver_patch_agg = Some(method);
        self
    }

    /// 子段对聚合
    pub fn sect_to_sect_agg(mut self, method: AggregationMethod) -> Self {
        self.config.sect_to_sect_agg = Some(method);
        self
    }

    /// 多源对单接收聚合
    pub fn sects_to_sect_agg(mut self, method: AggregationMethod) -> Self {
        self.config.sects_to_sect_agg = Some(method);
        self
    }

    /// 多源对多接收聚合
    pub fn sects_to_sects_agg(mut self, method: AggregationMethod) -> Self {
        self.config.sects_to_sects_agg = Some(method);
        self
    }

    /// 是否允许自作用
    pub fn allow_sect_to_self(mut self, allow: bool) -> Self {
        self.config.allow_sect_to_self = allow;
        self
    }

    /// 完成构建
    #[must_use]
    pub fn build(self) -> AggregationConfig {
        self.config
    }
}

type SectsKey = (SectionId, Vec<SectionId>);

/// 聚合引擎
pub struct AggregationEngine {
    calc: Arc<StiffnessCalculator>,
    config: AggregationConfig,
    sects_memo: RwLock<HashMap<SectsKey, StiffnessAggregation>>,
}

impl AggregationEngine {
    /// 创建引擎
    #[must_use]
    pub fn new(calc: Arc<StiffnessCalculator>, config: AggregationConfig) -> Self {
        Self {
            calc,
            config,
            sects_memo: RwLock::new(HashMap::new()),
        }
    }

    /// 配置
    #[must_use]
    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// 计算器
    #[must_use]
    pub fn calculator(&self) -> &Arc<StiffnessCalculator> {
        &self.calc
    }

    /// 物理量
    #[must_use]
    pub fn stiffness_type(&self) -> StiffnessType {
        self.config.quantity
    }

    /// 全部已配置阶段的方法都带物理单位
    #[must_use]
    pub fn has_units(&self) -> bool {
        self.config.has_units()
    }

    /// 清空多源记忆（子段对结果在计算器的持久化缓存中）
    pub fn clear(&self) {
        self.sects_memo.write().clear();
    }

    fn sect_to_sect(&self) -> StiffResult<AggregationMethod> {
        self.config
            .sect_to_sect_agg
            .ok_or(StiffnessError::missing("sect_to_sect_agg"))
    }

    fn check_pair(&self, source: SectionId, receiver: SectionId) -> StiffResult<()> {
        if source == receiver && !self.config.allow_sect_to_self {
            return Err(StiffnessError::SelfInteraction { id: source.get() });
        }
        Ok(())
    }

    /// 阶段 1 的结果：每个接收面元上的归约值
    pub fn calc_receiver_patch_values(&self, source: SectionId, receiver: SectionId) -> StiffResult<Vec<f64>> {
        let method = self
            .config
            .receiver_patch_agg
            .ok_or(StiffnessError::missing("receiver_patch_agg"))?;
        self.check_pair(source, receiver)?;
        let mut dist = self.calc.calc_stiffness_distribution(source, receiver)?;
        if source == receiver {
            dist = dist.without_self_patches();
        }
        Ok(dist.receiver_aggregate(method).flatten(self.config.quantity))
    }

    /// 子段对在全部聚合方法下的结果
    pub fn get_sect_aggregation(&self, source: SectionId, receiver: SectionId) -> StiffResult<StiffnessAggregation> {
        self.check_pair(source, receiver)?;
        let ty = self.config.quantity;
        let patch_agg = self.config.receiver_patch_agg;
        let cache = self.calc.aggregation_cache(ty);
        if let Some(agg) = cache.get(patch_agg, source, receiver) {
            return Ok(agg);
        }

        let mut dist = self.calc.calc_stiffness_distribution(source, receiver)?;
        if source == receiver {
            dist = dist.without_self_patches();
        }
        let values = match patch_agg {
            Some(method) => dist.receiver_aggregate(method).flatten(ty),
            None => dist.flatten(ty),
        };
        let agg = StiffnessAggregation::new(&values);
        cache.put(patch_agg, source, receiver, agg)?;
        trace!(source = source.get(), receiver = receiver.get(), "子段对聚合已缓存");
        Ok(agg)
    }

    /// 子段对标量
    pub fn calc(&self, source: SectionId, receiver: SectionId) -> StiffResult<f64> {
        let method = self.sect_to_sect()?;
        Ok(self.get_sect_aggregation(source, receiver)?.get(method))
    }

    /// 全部非自身源的子段对标量，保留重复的源；过滤后为空时报错
    fn source_values(&self, sources: &[SectionId], receiver: SectionId) -> StiffResult<Vec<f64>> {
        let mut values = Vec::with_capacity(sources.len());
        for &source in sources {
            if source == receiver && !self.config.allow_sect_to_self {
                continue;
            }
            values.push(self.calc(source, receiver)?);
        }
        if values.is_empty() {
            return Err(StiffnessError::NoSources {
                receiver: receiver.get(),
            });
        }
        Ok(values)
    }

    /// 多源对单接收：每个源的子段对标量在全部聚合方法下的结果
    ///
    /// 需要 `sect_to_sect_agg`。不允许自作用时跳过与接收相同的源，
    /// 没有剩余的源时返回 [`StiffnessError::NoSources`]。重复的源按次数计入。
    pub fn get_sects_to_sect_aggregation(
        &self,
        sources: &[SectionId],
        receiver: SectionId,
    ) -> StiffResult<StiffnessAggregation> {
        self.sect_to_sect()?;

        let mut key_sources = sources.to_vec();
        key_sources.sort_unstable();
        let key = (receiver, key_sources);
        if let Some(agg) = self.sects_memo.read().get(&key) {
            return Ok(*agg);
        }

        let agg = StiffnessAggregation::new(&self.source_values(sources, receiver)?);
        self.sects_memo.write().insert(key, agg);
        Ok(agg)
    }

    /// 多源对单接收标量
    ///
    /// 方法取 `sects_to_sect_agg`，未配置时退用 `sects_to_sects_agg`；两者之外
    /// 还需要 `sect_to_sect_agg`（见 [`Self::get_sects_to_sect_aggregation`]）。
    pub fn calc_sects_to_sect(&self, sources: &[SectionId], receiver: SectionId) -> StiffResult<f64> {
        let method = self
            .config
            .sects_to_sect_agg
            .or(self.config.sects_to_sects_agg)
            .ok_or(StiffnessError::missing("sects_to_sect_agg"))?;
        Ok(self.get_sects_to_sect_aggregation(sources, receiver)?.get(method))
    }

    /// 多源对多接收在全部聚合方法下的结果
    ///
    /// 配置了 `sects_to_sect_agg` 时先对每个接收归约；否则汇集全部子段对标量。
    /// 任一接收没有非自身的源时返回 [`StiffnessError::NoSources`]。
    pub fn get_sects_to_sects_aggregation(
        &self,
        sources: &[SectionId],
        receivers: &[SectionId],
    ) -> StiffResult<StiffnessAggregation> {
        self.sect_to_sect()?;
        let mut values = Vec::new();
        match self.config.sects_to_sect_agg {
            Some(_) => {
                for &receiver in receivers {
                    values.push(self.calc_sects_to_sect(sources, receiver)?);
                }
            }
            None => {
                for &receiver in receivers {
                    values.extend(self.source_values(sources, receiver)?);
                }
            }
        }
        Ok(StiffnessAggregation::new(&values))
    }

    /// 多源对多接收标量
    pub fn calc_sects_to_sects(&self, sources: &[SectionId], receivers: &[SectionId]) -> StiffResult<f64> {
        let method = self
            .config
            .sects_to_sects_agg
            .ok_or(StiffnessError::missing("sects_to_sects_agg"))?;
        Ok(self.get_sects_to_sects_aggregation(sources, receivers)?.get(method))
    }
}

impl fmt::Display for AggregationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.config, f)
    }
}

impl fmt::Debug for AggregationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregationEngine")
            .field("config", &self.config)
            .field("sects_memo", &self.sects_memo.read().len())
            .finish_non_exhaustive()
    }
}
