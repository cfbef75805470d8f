use crate::category::Style;
use metrics::Coupling;
use model::TypeKind;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// 图目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagramTarget {
    /// 单个类型的类图
    Class(String),
    /// 包摘要图
    PackageSummary(String),
    /// 总览页的包依赖图
    Overview,
}

impl fmt::Display for DiagramTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(name) => write!(f, "class diagram of {}", name),
            Self::PackageSummary(name) => write!(f, "package diagram of {}", name),
            Self::Overview => write!(f, "overview diagram"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Type(TypeKind),
    Package,
}

/// 边类型, 渲染样式只取决于它
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EdgeKind {
    Inheritance,
    Realization,
    Association,
    Dependency,
    Aggregation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// 限定名, 图内唯一
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub style: Style,
    /// 相对文档根目录的页面路径
    pub link: String,
    pub coupling: Option<Coupling>,
    /// 图的主体 (类图的根类型)
    pub emphasized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    /// 基数标签, 如 "1..*"
    pub label: Option<String>,
}

impl Edge {
    pub fn new(source: &str, target: &str, kind: EdgeKind) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            kind,
            label: None,
        }
    }

    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }
}

/// 关系图: 构建后不可变, 节点和边都按 id 排序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramGraph {
    target: DiagramTarget,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl DiagramGraph {
    pub fn target(&self) -> &DiagramTarget {
        &self.target
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes
            .binary_search_by(|n| n.id.as_str().cmp(id))
            .ok()
            .map(|i| &self.nodes[i])
    }
}

/// 构建过程中的可变累加器
#[derive(Debug, Default)]
pub(crate) struct GraphAssembly {
    nodes: BTreeMap<String, Node>,
    edges: BTreeSet<Edge>,
}

impl GraphAssembly {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// 同 id 的节点先加入者生效
    pub(crate) fn add_node(&mut self, node: Node) {
        self.nodes.entry(node.id.clone()).or_insert(node);
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub(crate) fn add_edge(&mut self, edge: Edge) {
        self.edges.insert(edge);
    }

    /// 丢弃端点不在节点集中的边, 保证闭包
    pub(crate) fn finish(self, target: DiagramTarget) -> DiagramGraph {
        let Self { nodes, edges } = self;
        let edges = edges
            .into_iter()
            .filter(|e| nodes.contains_key(&e.source) && nodes.contains_key(&e.target))
            .collect();
        DiagramGraph {
            target,
            nodes: nodes.into_values().collect(),
            edges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_node(id: &str) -> Node {
        Node {
            id: id.to_string(),
            label: id.to_string(),
            kind: NodeKind::Package,
            style: Style::default(),
            link: format!("{}.html", id),
            coupling: None,
            emphasized: false,
        }
    }

    #[test]
    fn test_finish_sorts_nodes_and_edges() {
        let mut asm = GraphAssembly::new();
        asm.add_node(make_node("c"));
        asm.add_node(make_node("a"));
        asm.add_node(make_node("b"));
        asm.add_edge(Edge::new("c", "a", EdgeKind::Dependency));
        asm.add_edge(Edge::new("a", "b", EdgeKind::Dependency));

        let graph = asm.finish(DiagramTarget::Overview);
        let ids: Vec<_> = graph.nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(graph.edges()[0].source, "a");
        assert_eq!(graph.edges()[1].source, "c");
    }

    #[test]
    fn test_finish_drops_dangling_edges() {
        let mut asm = GraphAssembly::new();
        asm.add_node(make_node("a"));
        asm.add_edge(Edge::new("a", "missing", EdgeKind::Association));
        let graph = asm.finish(DiagramTarget::Overview);
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn test_first_node_wins() {
        let mut asm = GraphAssembly::new();
        let mut first = make_node("a");
        first.emphasized = true;
        asm.add_node(first);
        asm.add_node(make_node("a"));
        let graph = asm.finish(DiagramTarget::Overview);
        assert_eq!(graph.nodes().len(), 1);
        assert!(graph.node("a").unwrap().emphasized);
        assert!(graph.node("zzz").is_none());
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let mut asm = GraphAssembly::new();
        asm.add_node(make_node("a"));
        asm.add_node(make_node("b"));
        asm.add_edge(Edge::new("a", "b", EdgeKind::Dependency));
        asm.add_edge(Edge::new("a", "b", EdgeKind::Dependency));
        let graph = asm.finish(DiagramTarget::Overview);
        assert_eq!(graph.edges().len(), 1);
    }

    #[test]
    fn test_target_display() {
        assert_eq!(
            DiagramTarget::Class("a.Foo".to_string()).to_string(),
            "class diagram of a.Foo"
        );
        assert_eq!(DiagramTarget::Overview.to_string(), "overview diagram");
    }
}
