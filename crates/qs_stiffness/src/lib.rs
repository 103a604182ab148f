// crates/qs_stiffness/src/lib.rs
//! QuakeStiff 刚度引擎
//!
//! 把断层子段离散为矩形面元，用 Okada (1992) 弹性半空间解计算面元对面元的
//! 正应力、剪应力与库仑应力变化，并在此之上提供子段对统计缓存与多阶段聚合。
//!
//! # 模块
//!
//! - [`okada`]: DC3D 位移与位移梯度
//! - [`patch`] / [`kernel`]: 矩形面元与单对应力核
//! - [`patch_builder`]: 按间距把子段切分为面元
//! - [`calculator`]: 面元缓存、子段对分布与持久化聚合缓存的持有者
//! - [`pairwise`]: 子段对 SIGMA/TAU/CFF 统计的记忆化缓存与簇级查询
//! - [`aggregation`]: 聚合方法与 [`AggregationEngine`]
//! - [`persistent_cache`]: 聚合结果的 CSV 持久化
//!
//! # 示例
//!
//! ```
//! use glam::DVec3;
//! use qs_stiffness::{calc_stiffness, FocalMechanism, Patch};
//!
//! let src = Patch::new(DVec3::new(0.0, 0.0, -1.0), 2.0, 2.0, FocalMechanism::new(0.0, 45.0, 90.0));
//! let rec = Patch::new(DVec3::new(5.0, 0.0, -1.0), 2.0, 2.0, FocalMechanism::new(180.0, 45.0, 90.0));
//! let s = calc_stiffness(30000.0, 30000.0, &src, &rec).unwrap();
//! assert!((s.sigma + 333.8749).abs() < 1e-3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregation;
pub mod calculator;
pub mod distribution;
pub mod error;
pub mod kernel;
pub mod memo;
pub mod okada;
pub mod pairwise;
pub mod patch;
pub mod patch_builder;
pub mod persistent_cache;
pub mod types;

pub use aggregation::{
    AggregationConfig, AggregationConfigBuilder, AggregationEngine, AggregationMethod,
    StiffnessAggregation, METHOD_COUNT,
};
pub use calculator::{StiffnessCalculator, StiffnessParams};
pub use distribution::StiffnessDistribution;
pub use error::{StiffResult, StiffnessError};
pub use kernel::{calc_stiffness, coulomb_stress, StressChange};
pub use pairwise::{PairStiffness, PairwiseStiffnessCache, StiffnessResult};
pub use patch::{FocalMechanism, Patch};
pub use patch_builder::{build_patches, PatchAlignment};
pub use persistent_cache::{cache_file_header, PersistentAggregationCache};
pub use types::StiffnessType;
