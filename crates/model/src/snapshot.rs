use crate::types::{DocTag, PackageDoc, TypeDoc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Duplicate type: {0}")]
    DuplicateType(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// 宿主文档模型的能力面
///
/// 只读, 所有图的构建都基于同一个不可变模型。
pub trait DocModel {
    /// 全部类型, 保持宿主给出的顺序
    fn types(&self) -> &[TypeDoc];

    /// 按限定名查找类型
    fn find_type(&self, qualified_name: &str) -> Option<&TypeDoc>;

    /// 包上声明的文档标签
    fn package_tags(&self, package: &str) -> &[DocTag];

    /// 宿主自身的 class path (用于耦合度分析)
    fn class_path(&self) -> &[PathBuf];
}

/// 模型快照 - 宿主交给本工具的内存模型
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelSnapshot {
    #[serde(default)]
    types: Vec<TypeDoc>,
    #[serde(default)]
    packages: Vec<PackageDoc>,
    #[serde(default)]
    class_path: Vec<PathBuf>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl ModelSnapshot {
    pub fn new(types: Vec<TypeDoc>, packages: Vec<PackageDoc>) -> Result<Self> {
        let mut snapshot = Self {
            types,
            packages,
            class_path: Vec::new(),
            index: HashMap::new(),
        };
        snapshot.reindex()?;
        Ok(snapshot)
    }

    pub fn with_class_path(mut self, class_path: Vec<PathBuf>) -> Self {
        self.class_path = class_path;
        self
    }

    /// 从 JSON 文本加载
    pub fn from_json(text: &str) -> Result<Self> {
        let mut snapshot: Self = serde_json::from_str(text)?;
        snapshot.reindex()?;
        Ok(snapshot)
    }

    /// 从 JSON 文件加载
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let snapshot = Self::from_json(&text)?;
        tracing::debug!(
            "Loaded model {}: {} types, {} packages",
            path.display(),
            snapshot.types.len(),
            snapshot.packages.len()
        );
        Ok(snapshot)
    }

    fn reindex(&mut self) -> Result<()> {
        self.index.clear();
        for (i, ty) in self.types.iter().enumerate() {
            let name = ty.qualified_name();
            if self.index.insert(name.clone(), i).is_some() {
                return Err(ModelError::DuplicateType(name));
            }
        }
        Ok(())
    }
}

impl DocModel for ModelSnapshot {
    fn types(&self) -> &[TypeDoc] {
        &self.types
    }

    fn find_type(&self, qualified_name: &str) -> Option<&TypeDoc> {
        self.index.get(qualified_name).map(|&i| &self.types[i])
    }

    fn package_tags(&self, package: &str) -> &[DocTag] {
        self.packages
            .iter()
            .find(|p| p.name == package)
            .map(|p| p.tags.as_slice())
            .unwrap_or(&[])
    }

    fn class_path(&self) -> &[PathBuf] {
        &self.class_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeKind;

    #[test]
    fn test_find_type_by_qualified_name() {
        let model = ModelSnapshot::new(
            vec![
                TypeDoc::new(Some("a"), "Foo", TypeKind::Class),
                TypeDoc::new(Some("b"), "Foo", TypeKind::Interface),
            ],
            vec![],
        )
        .unwrap();

        assert_eq!(model.find_type("b.Foo").unwrap().kind, TypeKind::Interface);
        assert!(model.find_type("c.Foo").is_none());
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let result = ModelSnapshot::new(
            vec![
                TypeDoc::new(Some("a"), "Foo", TypeKind::Class),
                TypeDoc::new(Some("a"), "Foo", TypeKind::Class),
            ],
            vec![],
        );
        assert!(matches!(result, Err(ModelError::DuplicateType(n)) if n == "a.Foo"));
    }

    #[test]
    fn test_from_json_builds_index() {
        let json = r#"{
            "types": [
                {"name": "Foo", "package": "a", "kind": "class", "superclass": "a.Base"},
                {"name": "Base", "package": "a", "kind": "class"}
            ],
            "packages": [{"name": "a", "tags": [{"name": "hidden"}]}],
            "class_path": ["target/classes"]
        }"#;
        let model = ModelSnapshot::from_json(json).unwrap();

        assert_eq!(model.types().len(), 2);
        assert_eq!(model.find_type("a.Foo").unwrap().superclass.as_deref(), Some("a.Base"));
        assert_eq!(model.package_tags("a").len(), 1);
        assert!(model.package_tags("zzz").is_empty());
        assert_eq!(model.class_path(), &[PathBuf::from("target/classes")]);
    }
}
