// crates/qs_stiffness/src/persistent_cache.rs
//! 可持久化的子段对聚合缓存
//!
//! 按"接收面元聚合方法"分槽（不聚合 + 每种方法各一槽），每槽是
//! `[接收子段][源子段]` 的锯齿数组，行在第一次写入时才分配。
//!
//! 文件格式为带表头的 CSV：
//!
//! ```text
//! Source ID, Receiver ID, Receiver Patch Aggregation, MEAN, MEDIAN, ..., GREATER_MEAN_MEDIAN
//! ```
//!
//! 方法列必须与当前 [`AggregationMethod`] 的名称和顺序完全一致，否则视为
//! 过期缓存：记录告警、返回 0、不载入任何条目。

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use qs_foundation::{QsError, SectionId};
use tracing::{info, warn};

use crate::aggregation::{AggregationMethod, StiffnessAggregation, METHOD_COUNT};
use crate::error::{StiffResult, StiffnessError};
use crate::types::StiffnessType;

const SOURCE_COLUMN: &str = "Source ID";
const RECEIVER_COLUMN: &str = "Receiver ID";
const PATCH_AGG_COLUMN: &str = "Receiver Patch Aggregation";
const LEADING_COLUMNS: usize = 3;
const SLOT_COUNT: usize = METHOD_COUNT + 1;

type Rows = Vec<Option<Vec<Option<StiffnessAggregation>>>>;

fn slot_index(patch_method: Option<AggregationMethod>) -> usize {
    patch_method.map_or(0, |m| m.index() + 1)
}

fn slot_method(slot: usize) -> Option<AggregationMethod> {
    slot.checked_sub(1).map(|i| AggregationMethod::ALL[i])
}

/// 缓存文件表头
#[must_use]
pub fn cache_file_header() -> Vec<&'static str> {
    let mut header = vec![SOURCE_COLUMN, RECEIVER_COLUMN, PATCH_AGG_COLUMN];
    header.extend(AggregationMethod::ALL.iter().map(|m| m.name()));
    header
}

/// 子段对聚合缓存
pub struct PersistentAggregationCache {
    ty: StiffnessType,
    num_sections: usize,
    slots: Vec<RwLock<Rows>>,
}

impl PersistentAggregationCache {
    /// 创建空缓存
    #[must_use]
    pub fn new(num_sections: usize, ty: StiffnessType) -> Self {
        Self {
            ty,
            num_sections,
            slots: (0..SLOT_COUNT)
                .map(|_| RwLock::new(vec![None; num_sections]))
                .collect(),
        }
    }

    /// 物理量
    #[must_use]
    pub fn stiffness_type(&self) -> StiffnessType {
        self.ty
    }

    /// 子段数
    #[must_use]
    pub fn num_sections(&self) -> usize {
        self.num_sections
    }

    /// 查找缓存条目
    #[must_use]
    pub fn get(
        &self,
        patch_method: Option<AggregationMethod>,
        source: SectionId,
        receiver: SectionId,
    ) -> Option<StiffnessAggregation> {
        let rows = self.slots[slot_index(patch_method)].read();
        rows.get(receiver.get())?
            .as_ref()?
            .get(source.get())
            .copied()
            .flatten()
    }

    /// 写入缓存条目
    pub fn put(
        &self,
        patch_method: Option<AggregationMethod>,
        source: SectionId,
        receiver: SectionId,
        aggregation: StiffnessAggregation,
    ) -> StiffResult<()> {
        QsError::check_index("source", source.get(), self.num_sections)?;
        QsError::check_index("receiver", receiver.get(), self.num_sections)?;
        let mut rows = self.slots[slot_index(patch_method)].write();
        let row = rows[receiver.get()].get_or_insert_with(|| vec![None; self.num_sections]);
        row[source.get()] = Some(aggregation);
        Ok(())
    }

    /// 清空
    pub fn clear(&self) {
        for slot in &self.slots {
            let mut rows = slot.write();
            rows.iter_mut().for_each(|row| *row = None);
        }
    }

    /// 条目总数
    #[must_use]
    pub fn calc_cache_size(&self) -> usize {
        self.slots
            .iter()
            .map(|slot| {
                slot.read()
                    .iter()
                    .flatten()
                    .map(|row| row.iter().filter(|e| e.is_some()).count())
                    .sum::<usize>()
            })
            .sum()
    }

    /// 写入缓存文件，返回写出的条目数
    ///
    /// 先写同目录下的临时文件再改名，写到一半失败不会破坏已有文件。
    pub fn write_cache_file(&self, path: impl AsRef<Path>) -> StiffResult<usize> {
        let path = path.as_ref();
        let tmp = temp_sibling(path);
        let mut writer = csv::Writer::from_path(&tmp)?;
        writer.write_record(cache_file_header())?;

        let mut written = 0;
        for (slot, lock) in self.slots.iter().enumerate() {
            let method_name = slot_method(slot).map_or("", AggregationMethod::name);
            let rows = lock.read();
            for (receiver, row) in rows.iter().enumerate() {
                let Some(row) = row else { continue };
                for (source, entry) in row.iter().enumerate() {
                    let Some(agg) = entry else { continue };
                    let mut record = Vec::with_capacity(LEADING_COLUMNS + METHOD_COUNT);
                    record.push(source.to_string());
                    record.push(receiver.to_string());
                    record.push(method_name.to_string());
                    record.extend(agg.as_array().iter().map(f64::to_string));
                    writer.write_record(&record)?;
                    written += 1;
                }
            }
        }
        writer.flush()?;
        drop(writer);
        fs::rename(&tmp, path)?;

        info!(
            path = %path.display(),
            entries = written,
            quantity = %self.ty,
            "聚合缓存已写出"
        );
        Ok(written)
    }

    /// 载入缓存文件，返回载入的条目数
    ///
    /// 表头不匹配时告警并返回 0；任何数据行格式错误都使整个载入失败，
    /// 缓存保持原状。
    pub fn load_cache_file(&self, path: impl AsRef<Path>) -> StiffResult<usize> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let header = reader.headers()?.clone();
        let expected = cache_file_header();
        if header.len() != expected.len() || header.iter().zip(&expected).any(|(a, b)| a != *b) {
            warn!(
                path = %path.display(),
                found = ?header.iter().collect::<Vec<_>>(),
                "聚合缓存表头与当前聚合方法不一致，跳过载入"
            );
            return Ok(0);
        }

        let mut entries = Vec::new();
        for record in reader.records() {
            let record = record?;
            let line = record.position().map_or(0, csv::Position::line);
            entries.push(self.parse_record(&record, line)?);
        }

        for &(slot, source, receiver, agg) in &entries {
            let mut rows = self.slots[slot].write();
            let row = rows[receiver].get_or_insert_with(|| vec![None; self.num_sections]);
            row[source] = Some(agg);
        }

        info!(
            path = %path.display(),
            entries = entries.len(),
            quantity = %self.ty,
            "聚合缓存已载入"
        );
        Ok(entries.len())
    }

    fn parse_record(
        &self,
        record: &csv::StringRecord,
        line: u64,
    ) -> StiffResult<(usize, usize, usize, StiffnessAggregation)> {
        if record.len() != LEADING_COLUMNS + METHOD_COUNT {
            return Err(StiffnessError::malformed_row(
                line,
                format!("期望 {} 列, 实际 {}", LEADING_COLUMNS + METHOD_COUNT, record.len()),
            ));
        }
        let id = |i: usize| -> StiffResult<usize> {
            let raw = &record[i];
            let id: usize = raw
                .parse()
                .map_err(|_| StiffnessError::malformed_row(line, format!("无效编号: {raw:?}")))?;
            if id >= self.num_sections {
                return Err(StiffnessError::malformed_row(
                    line,
                    format!("编号 {id} 超出子段数 {}", self.num_sections),
                ));
            }
            Ok(id)
        };
        let source = id(0)?;
        let receiver = id(1)?;

        let slot = match &record[2] {
            "" => 0,
            name => {
                let method = AggregationMethod::from_name(name).ok_or_else(|| {
                    StiffnessError::malformed_row(line, format!("未知聚合方法: {name:?}"))
                })?;
                slot_index(Some(method))
            }
        };

        let mut values = [0.0; METHOD_COUNT];
        for (i, v) in values.iter_mut().enumerate() {
            let raw = &record[LEADING_COLUMNS + i];
            *v = raw
                .parse()
                .map_err(|_| StiffnessError::malformed_row(line, format!("无效数值: {raw:?}")))?;
        }
        Ok((slot, source, receiver, StiffnessAggregation::from_array(values)))
    }

    /// 从另一个缓存复制全部条目，返回复制的条目数
    pub fn copy_cache_from(&self, other: &PersistentAggregationCache) -> StiffResult<usize> {
        if other.num_sections != self.num_sections {
            return Err(StiffnessError::CacheShapeMismatch {
                expected: self.num_sections,
                actual: other.num_sections,
            });
        }
        if std::ptr::eq(self, other) {
            return Ok(self.calc_cache_size());
        }

        let mut copied = 0;
        for (dst, src) in self.slots.iter().zip(&other.slots) {
            let snapshot = src.read().clone();
            let mut rows = dst.write();
            for (receiver, src_row) in snapshot.into_iter().enumerate() {
                let Some(src_row) = src_row else { continue };
                let row = rows[receiver].get_or_insert_with(|| vec![None; self.num_sections]);
                for (source, entry) in src_row.into_iter().enumerate() {
                    if entry.is_some() {
                        row[source] = entry;
                        copied += 1;
                    }
                }
            }
        }
        Ok(copied)
    }
}

impl std::fmt::Debug for PersistentAggregationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentAggregationCache")
            .field("type", &self.ty)
            .field("num_sections", &self.num_sections)
            .field("entries", &self.calc_cache_size())
            .finish()
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
