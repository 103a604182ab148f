// crates/qs_fault/src/lib.rs
//! QuakeStiff 断层模型
//!
//! 刚度引擎只消费一个抽象的"断层子段"能力：稳定的稠密编号、迹线、
//! 平均倾角与滑动角、上下界深度，以及按给定间距生成均匀网格曲面。
//!
//! # 模块
//!
//! - `trace`: 断层迹线与沿迹线插值
//! - `section`: [`FaultSection`] 能力与 [`SimpleFaultSection`] 实现
//! - `surface`: [`EvenlyGriddedSurface`] 均匀网格曲面
//! - `cluster`: 同一母断层下的子段簇
//! - `model`: JSON 断层模型读写

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cluster;
pub mod model;
pub mod section;
pub mod surface;
pub mod trace;

pub use cluster::FaultSubsectionCluster;
pub use model::{load_fault_model, save_fault_model};
pub use section::{FaultSection, SimpleFaultSection};
pub use surface::EvenlyGriddedSurface;
pub use trace::FaultTrace;
