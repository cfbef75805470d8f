use crate::graph::{DiagramGraph, DiagramTarget, Edge, EdgeKind, Node, NodeKind};
use model::TypeKind;

/// 图名, 同时是 image map 的名字 (`USEMAP="#DOCVIZ"`)
pub const MAP_NAME: &str = "DOCVIZ";

const FONT: &str = "Helvetica";

/// Graphviz DOT 生成器
pub struct DotWriter {
    /// 节点链接前缀, 把文档根相对路径变成页面相对路径
    link_prefix: String,
}

impl DotWriter {
    pub fn new() -> Self {
        Self {
            link_prefix: String::new(),
        }
    }

    pub fn with_link_prefix(mut self, prefix: &str) -> Self {
        self.link_prefix = prefix.to_string();
        self
    }

    /// 按页面所在目录深度生成 `../` 前缀
    pub fn for_page(page_name: &str) -> Self {
        let depth = page_name.matches('/').count();
        Self::new().with_link_prefix(&"../".repeat(depth))
    }

    /// 生成 DOT 源码
    pub fn write(&self, graph: &DiagramGraph) -> String {
        let rankdir = match graph.target() {
            DiagramTarget::Overview => "TB",
            _ => "BT",
        };

        let mut lines = vec![
            format!("digraph {} {{", MAP_NAME),
            format!(
                "    graph [rankdir=\"{}\", ranksep=\"0.4\", nodesep=\"0.3\", fontname=\"{}\"];",
                rankdir, FONT
            ),
            format!(
                "    node [shape=\"box\", style=\"filled\", fontname=\"{}\", fontsize=\"10\", height=\"0.3\"];",
                FONT
            ),
            format!("    edge [fontname=\"{}\", fontsize=\"9\"];", FONT),
        ];

        for node in graph.nodes() {
            lines.push(format!("    {}", self.node_statement(node)));
        }
        for edge in graph.edges() {
            lines.push(format!("    {}", Self::edge_statement(edge)));
        }

        lines.push("}".to_string());
        lines.join("\n") + "\n"
    }

    fn node_statement(&self, node: &Node) -> String {
        let (shape, stereotype) = match node.kind {
            NodeKind::Type(TypeKind::Class) => ("box", None),
            NodeKind::Type(kind) => ("box", Some(kind.as_str())),
            NodeKind::Package => ("tab", None),
        };

        let mut label = String::new();
        if let Some(s) = stereotype {
            label.push_str(&format!("«{}»\n", s));
        }
        label.push_str(&node.label);
        if let Some(c) = node.coupling {
            label.push_str(&format!("\nCa: {}, Ce: {}", c.afferent, c.efferent));
        }

        let style = match node.kind {
            NodeKind::Type(TypeKind::Interface) => "filled,rounded",
            _ => "filled",
        };

        let mut attrs = vec![
            format!("label=\"{}\"", Self::escape(&label)),
            format!("shape=\"{}\"", shape),
            format!("style=\"{}\"", style),
            format!("fillcolor=\"{}\"", node.style.fill),
            format!("color=\"{}\"", node.style.line),
            format!("URL=\"{}{}\"", self.link_prefix, Self::escape(&node.link)),
            format!("tooltip=\"{}\"", Self::escape(&node.id)),
        ];
        if node.emphasized {
            attrs.push("penwidth=\"2\"".to_string());
            attrs.push(format!("fontname=\"{}-Bold\"", FONT));
        }

        format!("\"{}\" [{}];", Self::escape(&node.id), attrs.join(", "))
    }

    fn edge_statement(edge: &Edge) -> String {
        let mut attrs = match edge.kind {
            EdgeKind::Inheritance => vec!["arrowhead=\"empty\"", "style=\"solid\""],
            EdgeKind::Realization => vec!["arrowhead=\"empty\"", "style=\"dashed\""],
            EdgeKind::Association => vec!["arrowhead=\"open\"", "style=\"solid\""],
            EdgeKind::Dependency => vec!["arrowhead=\"open\"", "style=\"dashed\""],
            EdgeKind::Aggregation => vec![
                "dir=\"both\"",
                "arrowtail=\"odiamond\"",
                "arrowhead=\"open\"",
                "style=\"solid\"",
            ],
        }
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

        if let Some(label) = &edge.label {
            attrs.push(format!("headlabel=\"{}\"", Self::escape(label)));
        }

        format!(
            "\"{}\" -> \"{}\" [{}];",
            Self::escape(&edge.source),
            Self::escape(&edge.target),
            attrs.join(", ")
        )
    }

    #[doc(hidden)]
    pub fn escape(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => {}
                _ => out.push(c),
            }
        }
        out
    }
}

impl Default for DotWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Style;
    use crate::graph::GraphAssembly;
    use metrics::Coupling;

    fn make_node(id: &str, kind: NodeKind) -> Node {
        Node {
            id: id.to_string(),
            label: id.rsplit('.').next().unwrap_or(id).to_string(),
            kind,
            style: Style::default(),
            link: format!("{}.html", id.replace('.', "/")),
            coupling: None,
            emphasized: false,
        }
    }

    fn make_graph() -> DiagramGraph {
        let mut asm = GraphAssembly::new();
        let mut root = make_node("a.Foo", NodeKind::Type(TypeKind::Class));
        root.emphasized = true;
        asm.add_node(root);
        asm.add_node(make_node("a.Api", NodeKind::Type(TypeKind::Interface)));
        asm.add_edge(Edge::new("a.Foo", "a.Api", EdgeKind::Realization));
        asm.finish(DiagramTarget::Class("a.Foo".to_string()))
    }

    #[test]
    fn test_escape_quotes_and_newlines() {
        assert_eq!(DotWriter::escape("a\"b"), "a\\\"b");
        assert_eq!(DotWriter::escape("x\ny"), "x\\ny");
        assert_eq!(DotWriter::escape("c:\\d"), "c:\\\\d");
    }

    #[test]
    fn test_for_page_prefix_depth() {
        assert_eq!(DotWriter::for_page("a/b/Foo").link_prefix, "../../");
        assert_eq!(DotWriter::for_page("overview-summary").link_prefix, "");
    }

    #[test]
    fn test_write_class_diagram() {
        let dot = DotWriter::for_page("a/Foo").write(&make_graph());

        assert!(dot.starts_with("digraph DOCVIZ {\n"));
        assert!(dot.contains("rankdir=\"BT\""));
        assert!(dot.contains(
            "\"a.Api\" [label=\"«interface»\\nApi\", shape=\"box\", style=\"filled,rounded\", \
             fillcolor=\"#FFFFFF\", color=\"#404040\", URL=\"../a/Api.html\", tooltip=\"a.Api\"];"
        ));
        assert!(dot.contains("penwidth=\"2\""));
        assert!(dot.contains("\"a.Foo\" -> \"a.Api\" [arrowhead=\"empty\", style=\"dashed\"];"));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn test_nodes_written_before_edges_in_id_order() {
        let dot = DotWriter::new().write(&make_graph());
        let api = dot.find("\"a.Api\" [").unwrap();
        let foo = dot.find("\"a.Foo\" [").unwrap();
        let edge = dot.find("->").unwrap();
        assert!(api < foo && foo < edge);
    }

    #[test]
    fn test_edge_styles_by_kind() {
        let edge = |kind| DotWriter::edge_statement(&Edge::new("a", "b", kind));
        assert!(edge(EdgeKind::Inheritance).contains("arrowhead=\"empty\", style=\"solid\""));
        assert!(edge(EdgeKind::Association).contains("arrowhead=\"open\", style=\"solid\""));
        assert!(edge(EdgeKind::Dependency).contains("arrowhead=\"open\", style=\"dashed\""));
        assert!(edge(EdgeKind::Aggregation).contains("arrowtail=\"odiamond\""));

        let labelled = Edge::new("a", "b", EdgeKind::Aggregation).with_label(Some("1..*".to_string()));
        assert!(DotWriter::edge_statement(&labelled).contains("headlabel=\"1..*\""));
    }

    #[test]
    fn test_package_node_with_coupling() {
        let mut asm = GraphAssembly::new();
        let mut node = make_node("net", NodeKind::Package);
        node.coupling = Some(Coupling {
            afferent: 3,
            efferent: 1,
        });
        asm.add_node(node);
        let dot = DotWriter::new().write(&asm.finish(DiagramTarget::Overview));

        assert!(dot.contains("rankdir=\"TB\""));
        assert!(dot.contains("label=\"net\\nCa: 3, Ce: 1\", shape=\"tab\""));
    }

    #[test]
    fn test_write_is_deterministic() {
        let writer = DotWriter::new();
        assert_eq!(writer.write(&make_graph()), writer.write(&make_graph()));
    }
}
