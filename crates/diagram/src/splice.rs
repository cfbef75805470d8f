//! 把渲染好的图插入宿主生成的页面
//!
//! 插入点由一组按顺序尝试的锚点策略决定, 第一个命中的生效;
//! 全部未命中时报错, 不写入任何内容。

use crate::config::PageLookupMode;
use crate::dot::MAP_NAME;
use crate::error::{DiagramError, Result};
use crate::graphviz::RenderedDiagram;
use regex::bytes::Regex;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// 插入点策略
///
/// 页面按字节处理, 不假设编码。
pub trait AnchorStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// 插入位置的字节偏移
    fn find(&self, page: &[u8]) -> Option<usize>;
}

/// 紧跟在后面接着段落的 `</PRE>` 之后
pub struct AfterPreformatted {
    pattern: Regex,
}

impl AfterPreformatted {
    const CLOSING: &'static str = "</PRE>";

    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"</PRE>\s*<P>").expect("static pattern"),
        }
    }
}

impl Default for AfterPreformatted {
    fn default() -> Self {
        Self::new()
    }
}

impl AnchorStrategy for AfterPreformatted {
    fn name(&self) -> &str {
        "after-preformatted-block"
    }

    fn find(&self, page: &[u8]) -> Option<usize> {
        self.pattern
            .find(page)
            .map(|m| m.start() + Self::CLOSING.len())
    }
}

/// 在某段固定文本之前
pub struct BeforeText {
    name: &'static str,
    text: &'static str,
}

impl BeforeText {
    pub const fn new(name: &'static str, text: &'static str) -> Self {
        Self { name, text }
    }

    /// `<TABLE BORDER="1"` 摘要表
    pub const fn bordered_table() -> Self {
        Self::new("before-summary-table", "<TABLE BORDER=\"1\"")
    }

    /// `<div class="contentContainer"` 内容容器
    pub const fn content_container() -> Self {
        Self::new("before-content-container", "<div class=\"contentContainer\"")
    }
}

impl AnchorStrategy for BeforeText {
    fn name(&self) -> &str {
        self.name
    }

    fn find(&self, page: &[u8]) -> Option<usize> {
        let needle = self.text.as_bytes();
        if needle.is_empty() {
            return None;
        }
        page.windows(needle.len()).position(|w| w == needle)
    }
}

/// 页面种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Type,
    PackageSummary,
    Overview,
}

impl PageKind {
    /// 包摘要和总览页需要额外的底部间距
    pub fn needs_bottom_margin(&self) -> bool {
        matches!(self, Self::PackageSummary | Self::Overview)
    }
}

/// 页面及其产物的位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    /// 逻辑名, 相对输出目录, 不含扩展名
    pub name: String,
    base: PathBuf,
}

impl PageLocation {
    fn new(output_dir: &Path, name: &str) -> Self {
        Self {
            name: name.to_string(),
            base: output_dir.join(name),
        }
    }

    fn with_suffix(&self, suffix: &str) -> PathBuf {
        let mut path = OsString::from(self.base.as_os_str());
        path.push(suffix);
        PathBuf::from(path)
    }

    pub fn page(&self) -> PathBuf {
        self.with_suffix(".html")
    }

    pub fn image(&self) -> PathBuf {
        self.with_suffix(".png")
    }

    pub fn map(&self) -> PathBuf {
        self.with_suffix(".map")
    }
}

/// 页面查找结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLookup {
    Found(PageLocation),
    /// 期望路径和旧版命名下都不存在
    Missing { name: String },
}

/// 查找页面; 旧版模式下从最右侧的分隔符开始逐个折叠为 '.'
pub fn locate_page(output_dir: &Path, name: &str, mode: PageLookupMode) -> PageLookup {
    let location = PageLocation::new(output_dir, name);
    if location.page().is_file() {
        return PageLookup::Found(location);
    }

    if mode == PageLookupMode::Legacy {
        let mut candidate = name.to_string();
        while let Some(idx) = candidate.rfind('/').filter(|&i| i > 0) {
            candidate = format!("{}.{}", &candidate[..idx], &candidate[idx + 1..]);
            let location = PageLocation::new(output_dir, &candidate);
            if location.page().is_file() {
                tracing::debug!("Using legacy page name {} for {}", candidate, name);
                return PageLookup::Found(location);
            }
        }
    }

    PageLookup::Missing {
        name: name.to_string(),
    }
}

/// 离开作用域时删除的临时文件
struct TempArtifact(PathBuf);

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.0) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to delete {}: {}", self.0.display(), e);
            }
        }
    }
}

/// 页面拼接器
pub struct Splicer {
    anchors: Vec<Box<dyn AnchorStrategy>>,
}

impl Splicer {
    pub fn new(anchors: Vec<Box<dyn AnchorStrategy>>) -> Self {
        Self { anchors }
    }

    pub fn anchor_names(&self) -> Vec<String> {
        self.anchors.iter().map(|a| a.name().to_string()).collect()
    }

    /// 第一个命中的策略及其偏移
    pub fn find_anchor(&self, page: &[u8]) -> Option<(&str, usize)> {
        self.anchors
            .iter()
            .find_map(|a| a.find(page).map(|pos| (a.name(), pos)))
    }

    /// 插入的内容: image map, 居中图片, 需要时再加一个间距
    pub fn payload(map_markup: &str, image_file: &str, kind: PageKind) -> String {
        format!(
            "{}\n<CENTER><IMG SRC=\"{}\" USEMAP=\"#{}\" BORDER=\"0\"></CENTER>\n{}\n",
            map_markup.trim_end(),
            image_file,
            MAP_NAME,
            if kind.needs_bottom_margin() { "<BR>" } else { "" }
        )
    }

    /// 在锚点处插入, 锚点前后的内容保持不变
    pub fn splice(&self, page: &[u8], payload: &[u8]) -> Option<Vec<u8>> {
        let (_, pos) = self.find_anchor(page)?;
        let mut out = Vec::with_capacity(page.len() + payload.len());
        out.extend_from_slice(&page[..pos]);
        out.extend_from_slice(payload);
        out.extend_from_slice(&page[pos..]);
        Some(out)
    }

    /// 改写页面; 无论成功与否, 临时 map 文件都会被删除, 图片保留
    pub fn instrument(&self, page: &Path, rendered: &RenderedDiagram, kind: PageKind) -> Result<()> {
        let _map_guard = TempArtifact(rendered.map.clone());

        let content = std::fs::read(page)?;
        let map_markup = String::from_utf8_lossy(&std::fs::read(&rendered.map)?).into_owned();
        let image_file = rendered
            .image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let payload = Self::payload(&map_markup, &image_file, kind);
        let spliced = self
            .splice(&content, payload.as_bytes())
            .ok_or_else(|| DiagramError::AnchorNotFound {
                page: page.to_path_buf(),
                tried: self.anchor_names(),
            })?;

        Self::replace_page(page, &spliced)
    }

    /// 先写临时文件再替换, 失败时原页面保持不变
    fn replace_page(page: &Path, content: &[u8]) -> Result<()> {
        let dir = page
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let permissions = std::fs::metadata(page)?.permissions();

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(content)?;
        tmp.as_file().set_permissions(permissions)?;
        tmp.persist(page).map_err(|e| e.error)?;
        Ok(())
    }
}

impl Default for Splicer {
    fn default() -> Self {
        Self::new(vec![
            Box::new(AfterPreformatted::new()),
            Box::new(BeforeText::bordered_table()),
            Box::new(BeforeText::content_container()),
        ])
    }
}
