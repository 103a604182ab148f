// crates/qs_fault/src/model.rs
//! JSON 断层模型读写
//!
//! 模型文件是 [`SimpleFaultSection`] 的 JSON 数组，编号必须与数组下标一致。

use std::fs;
use std::path::Path;

use qs_foundation::{ensure, QsError, QsResult};

use crate::section::SimpleFaultSection;

/// 读取断层模型
pub fn load_fault_model(path: impl AsRef<Path>) -> QsResult<Vec<SimpleFaultSection>> {
    let path = path.as_ref();
    ensure!(path.exists(), QsError::file_not_found(path));
    let content = fs::read_to_string(path)?;
    let sections: Vec<SimpleFaultSection> = serde_json::from_str(&content)
        .map_err(|e| QsError::parse(path, e.line(), e.to_string()))?;

    for (index, sect) in sections.iter().enumerate() {
        ensure!(
            sect.id == index,
            QsError::invalid_input(format!(
                "子段编号必须稠密且从 0 开始: 下标 {index} 处编号为 {}",
                sect.id
            ))
        );
    }
    Ok(sections)
}

/// 保存断层模型
pub fn save_fault_model(path: impl AsRef<Path>, sections: &[SimpleFaultSection]) -> QsResult<()> {
    let content = serde_json::to_string_pretty(sections)
        .map_err(|e| QsError::serialization(e.to_string()))?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::FaultTrace;
    use qs_geo::Location;

    fn section(id: usize) -> SimpleFaultSection {
        let start = Location::new(34.0 + 0.1 * id as f64, -117.0, 0.0);
        SimpleFaultSection {
            id,
            parent_id: None,
            name: format!("S{id}"),
            trace: FaultTrace::new(vec![start, start.offset(0.0, 5.0, 0.0)]).unwrap(),
            dip: 90.0,
            rake: 0.0,
            upper_depth: 0.0,
            lower_depth: 10.0,
        }
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let sections = vec![section(0), section(1)];
        save_fault_model(&path, &sections).unwrap();
        let loaded = load_fault_model(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].name, "S1");
        assert!((loaded[1].trace.length_km() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_sparse_ids_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        save_fault_model(&path, &[section(0), section(2)]).unwrap();
        assert!(matches!(load_fault_model(&path), Err(QsError::InvalidInput { .. })));
    }

    #[test]
    fn test_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_fault_model(dir.path().join("none.json")),
            Err(QsError::FileNotFound { .. })
        ));
        let path = dir.path().join("bad.json");
        fs::write(&path, "[{\"id\": 0,").unwrap();
        assert!(matches!(load_fault_model(&path), Err(QsError::ParseError { .. })));
    }
}
