//! 图生成配置

use crate::category::CategoryTable;
use crate::error::{DiagramError, Result};
use crate::graph::EdgeKind;
use model::{HiddenRules, MemberUse};
use std::path::PathBuf;
use std::time::Duration;

/// 成员引用的连线约定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemberEdges {
    /// 字段为关联, 参数/返回值为依赖
    #[default]
    FieldsAsAssociation,
    /// 全部为关联
    Association,
    /// 全部为依赖
    Dependency,
}

impl MemberEdges {
    pub fn edge_kind(&self, usage: MemberUse) -> EdgeKind {
        match (self, usage) {
            (Self::FieldsAsAssociation, MemberUse::Field) => EdgeKind::Association,
            (Self::FieldsAsAssociation, _) => EdgeKind::Dependency,
            (Self::Association, _) => EdgeKind::Association,
            (Self::Dependency, _) => EdgeKind::Dependency,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fields-association" => Some(Self::FieldsAsAssociation),
            "association" => Some(Self::Association),
            "dependency" => Some(Self::Dependency),
            _ => None,
        }
    }
}

/// 页面查找方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageLookupMode {
    /// 只查找期望路径
    Exact,
    /// 找不到时按旧版单文件命名逐级回退
    #[default]
    Legacy,
}

/// 图生成配置 (上游已解析)
#[derive(Debug, Clone)]
pub struct DiagramConfig {
    /// 已生成文档的根目录
    pub output_dir: PathBuf,
    /// 分类定义 `name[:fill[:line]]`
    pub categories: Vec<String>,
    /// 隐藏包规则
    pub excluded_packages: Vec<String>,
    /// 耦合度分析的额外 class path; Some(空) 视为配置错误
    pub source_class_path: Option<Vec<PathBuf>>,
    /// 不在总览页生成包依赖图
    pub no_package_diagram: bool,
    pub member_edges: MemberEdges,
    pub page_lookup: PageLookupMode,
    pub render_timeout: Duration,
    pub graphviz_home: Option<PathBuf>,
    /// 外部耦合度分析程序
    pub metrics_command: Option<PathBuf>,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            categories: Vec::new(),
            excluded_packages: Vec::new(),
            source_class_path: None,
            no_package_diagram: false,
            member_edges: MemberEdges::default(),
            page_lookup: PageLookupMode::default(),
            render_timeout: Duration::from_secs(60),
            graphviz_home: None,
            metrics_command: None,
        }
    }
}

impl DiagramConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("DOCVIZ_GRAPHVIZ_HOME").or_else(|_| std::env::var("GRAPHVIZ_HOME")) {
            if !v.is_empty() {
                config.graphviz_home = Some(PathBuf::from(v));
            }
        }

        if let Ok(v) = std::env::var("DOCVIZ_RENDER_TIMEOUT") {
            if let Ok(secs) = v.parse() {
                config.render_timeout = Duration::from_secs(secs);
            }
        }

        config
    }

    /// 生成前校验, 失败即终止
    pub fn validate(&self) -> Result<()> {
        if let Some(cp) = &self.source_class_path {
            if cp.is_empty() {
                return Err(DiagramError::configuration(
                    "--source-class-path",
                    "requires at least one valid class path",
                ));
            }
            for entry in cp {
                if std::fs::metadata(entry).is_err() {
                    return Err(DiagramError::configuration(
                        "--source-class-path",
                        format!("{} doesn't exist or is not readable", entry.display()),
                    ));
                }
            }
        }

        if self.render_timeout.is_zero() {
            return Err(DiagramError::configuration(
                "--render-timeout",
                "must be greater than zero",
            ));
        }

        self.category_table()?;
        Ok(())
    }

    pub fn category_table(&self) -> Result<CategoryTable> {
        CategoryTable::from_definitions(&self.categories)
    }

    pub fn hidden_rules(&self) -> HiddenRules {
        HiddenRules::new(self.excluded_packages.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = DiagramConfig::default();
        assert_eq!(config.render_timeout, Duration::from_secs(60));
        assert_eq!(config.page_lookup, PageLookupMode::Legacy);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_member_edges_convention() {
        let conv = MemberEdges::default();
        assert_eq!(conv.edge_kind(MemberUse::Field), EdgeKind::Association);
        assert_eq!(conv.edge_kind(MemberUse::Return), EdgeKind::Dependency);
        assert_eq!(MemberEdges::Dependency.edge_kind(MemberUse::Field), EdgeKind::Dependency);
        assert_eq!(MemberEdges::parse("association"), Some(MemberEdges::Association));
        assert_eq!(MemberEdges::parse("bogus"), None);
    }

    #[test]
    fn test_validate_empty_class_path() {
        let config = DiagramConfig {
            source_class_path: Some(vec![]),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("--source-class-path"));
    }

    #[test]
    fn test_validate_missing_class_path_entry() {
        let config = DiagramConfig {
            source_class_path: Some(vec![PathBuf::from("/definitely/not/here")]),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here"));
    }

    #[test]
    fn test_validate_bad_category() {
        let config = DiagramConfig {
            categories: vec!["io:not a color".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DiagramError::Configuration { .. })
        ));
    }
}
