use crate::error::{DiagramError, Result};
use std::collections::BTreeMap;

/// 未声明颜色时按注册顺序取色
const PALETTE: [&str; 8] = [
    "#FFE0B2", "#C8E6C9", "#BBDEFB", "#F8BBD0", "#D1C4E9", "#FFF9C4", "#B2DFDB", "#D7CCC8",
];

pub const DEFAULT_FILL: &str = "#FFFFFF";
pub const DEFAULT_LINE: &str = "#404040";

/// 节点样式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    pub fill: String,
    pub line: String,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: DEFAULT_FILL.to_string(),
            line: DEFAULT_LINE.to_string(),
        }
    }
}

/// 分类 -> 颜色表
///
/// 构建一次, 所有图共享; 查询永不失败。
#[derive(Debug, Clone, Default)]
pub struct CategoryTable {
    styles: BTreeMap<String, Style>,
    default: Style,
}

impl CategoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析 `name[:fill[:line]]` 形式的定义
    pub fn from_definitions<S: AsRef<str>>(definitions: &[S]) -> Result<Self> {
        let mut table = Self::new();
        for def in definitions {
            let (name, style) = table.parse_definition(def.as_ref())?;
            table.register(&name, style);
        }
        Ok(table)
    }

    fn parse_definition(&self, text: &str) -> Result<(String, Style)> {
        let mut parts = text.split(':').map(str::trim);
        let name = parts.next().unwrap_or_default();
        if name.is_empty() {
            return Err(DiagramError::configuration(
                "--category",
                format!("missing category name in '{}'", text),
            ));
        }

        let fill = match parts.next().filter(|s| !s.is_empty()) {
            Some(c) => Self::check_color(c, text)?,
            None => PALETTE[self.styles.len() % PALETTE.len()].to_string(),
        };
        let line = match parts.next().filter(|s| !s.is_empty()) {
            Some(c) => Self::check_color(c, text)?,
            None => DEFAULT_LINE.to_string(),
        };
        if parts.next().is_some() {
            return Err(DiagramError::configuration(
                "--category",
                format!("too many segments in '{}'", text),
            ));
        }

        Ok((name.to_string(), Style { fill, line }))
    }

    /// `#RRGGBB`, `#RRGGBBAA` 或颜色名
    fn check_color(color: &str, text: &str) -> Result<String> {
        let valid = match color.strip_prefix('#') {
            Some(hex) => {
                (hex.len() == 6 || hex.len() == 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
            }
            None => color.chars().all(|c| c.is_ascii_alphanumeric()),
        };
        if valid {
            Ok(color.to_string())
        } else {
            Err(DiagramError::configuration(
                "--category",
                format!("invalid color '{}' in '{}'", color, text),
            ))
        }
    }

    /// 注册分类, 同名时先注册者生效
    pub fn register(&mut self, name: &str, style: Style) -> bool {
        if self.styles.contains_key(name) {
            tracing::warn!("Category {} already defined, ignoring later definition", name);
            return false;
        }
        self.styles.insert(name.to_string(), style);
        true
    }

    /// 查询样式, 未知分类回落到默认样式
    pub fn resolve(&self, category: Option<&str>) -> &Style {
        category
            .and_then(|c| self.styles.get(c))
            .unwrap_or(&self.default)
    }
}
