// crates/qs_stiffness/src/aggregation/mod.rs
//! 聚合方法与多阶段聚合引擎
//!
//! - [`method`]: 十种聚合方法、[`Summary`] 统计与 [`StiffnessAggregation`]
//! - [`engine`]: [`AggregationEngine`] 四阶段流水线

pub mod engine;
pub mod method;

pub use engine::{AggregationConfig, AggregationConfigBuilder, AggregationEngine};
pub use method::{AggregationMethod, StiffnessAggregation, Summary, METHOD_COUNT};
