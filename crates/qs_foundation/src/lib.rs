// crates/qs_foundation/src/lib.rs

//! QuakeStiff Foundation Layer
//!
//! 基础层，提供整个工作区共享的错误类型与强类型索引。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型 `QsError` 以及前置条件宏
//! - [`index`]: 稠密、从 0 开始的断层子段索引 `SectionId`
//!
//! # 示例
//!
//! ```
//! use qs_foundation::{QsError, QsResult, SectionId};
//!
//! fn lookup(id: SectionId, count: usize) -> QsResult<usize> {
//!     QsError::check_index("SectionId", id.get(), count)?;
//!     Ok(id.get())
//! }
//!
//! assert!(lookup(SectionId::new(2), 3).is_ok());
//! assert!(lookup(SectionId::new(3), 3).is_err());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod index;

pub use error::{QsError, QsResult};
pub use index::SectionId;

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::error::{QsError, QsResult};
    pub use crate::index::SectionId;
    pub use crate::{ensure, require};
}
