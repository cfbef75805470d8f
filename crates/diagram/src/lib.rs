//! diagram - 文档图生成
//!
//! 类图、包图、包依赖总览图的构建, DOT 输出, Graphviz 渲染和页面拼接

mod builder;
mod category;
mod config;
mod dot;
mod error;
mod graph;
mod graphviz;
mod pipeline;
mod splice;

pub use builder::GraphBuilder;
pub use category::{CategoryTable, Style, DEFAULT_FILL, DEFAULT_LINE};
pub use config::{DiagramConfig, MemberEdges, PageLookupMode};
pub use dot::{DotWriter, MAP_NAME};
pub use error::{DiagramError, Result};
pub use graph::{DiagramGraph, DiagramTarget, Edge, EdgeKind, Node, NodeKind};
pub use graphviz::{GraphvizEngine, RenderEngine, RenderedDiagram};
pub use pipeline::{generate, Diagnostic, DiagramRun, MetricsStatus, RunReport};
pub use splice::{
    locate_page, AfterPreformatted, AnchorStrategy, BeforeText, PageKind, PageLocation, PageLookup,
    Splicer,
};
