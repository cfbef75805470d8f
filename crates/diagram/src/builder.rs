//! 关系图构建
//!
//! 三种目标各有一套规则:
//!
//! - 类图: 根类型, 父类链, 直接实现的接口, 成员引用到的类型, 已知的直接子类型
//! - 包摘要图: 包内类型及其直接引用的外部类型, 只保留至少一端在包内的边
//! - 总览图: 可见包之间的依赖, 每对有序包只保留一条边, 可附带耦合度

use crate::category::CategoryTable;
use crate::config::{MemberEdges, PageLookupMode};
use crate::error::{DiagramError, Result};
use crate::graph::{DiagramGraph, DiagramTarget, Edge, EdgeKind, GraphAssembly, Node, NodeKind};
use crate::splice::{locate_page, PageLookup};
use metrics::PackageMetrics;
use model::{DocModel, ModelView, PackageDoc, TypeDoc, TypeKind};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// 类型间的一条关系
#[derive(Debug, Clone)]
struct Relation<'a> {
    target: &'a TypeDoc,
    kind: EdgeKind,
    label: Option<String>,
}

impl EdgeKind {
    /// 同一目标有多种关系时保留最强的一种
    fn strength(&self) -> u8 {
        match self {
            Self::Inheritance | Self::Realization => 4,
            Self::Aggregation => 3,
            Self::Association => 2,
            Self::Dependency => 1,
        }
    }
}

/// 关系图构建器
///
/// 只读取模型, 每次调用都返回一个新构建的图。
pub struct GraphBuilder<'a, M: DocModel + ?Sized> {
    view: ModelView<'a, M>,
    categories: &'a CategoryTable,
    member_edges: MemberEdges,
    /// 输出目录与页面查找方式, 用于把节点链接指向实际存在的页面
    page_root: Option<(&'a Path, PageLookupMode)>,
}

impl<'a, M: DocModel + ?Sized> GraphBuilder<'a, M> {
    pub fn new(view: ModelView<'a, M>, categories: &'a CategoryTable) -> Self {
        Self {
            view,
            categories,
            member_edges: MemberEdges::default(),
            page_root: None,
        }
    }

    pub fn with_member_edges(mut self, member_edges: MemberEdges) -> Self {
        self.member_edges = member_edges;
        self
    }

    pub fn with_page_root(mut self, output_dir: &'a Path, mode: PageLookupMode) -> Self {
        self.page_root = Some((output_dir, mode));
        self
    }

    pub fn view(&self) -> &ModelView<'a, M> {
        &self.view
    }

    /// 类图
    pub fn class_diagram(&self, qualified_name: &str) -> Result<DiagramGraph> {
        let root = self
            .view
            .model()
            .find_type(qualified_name)
            .ok_or_else(|| DiagramError::UnknownType {
                name: qualified_name.to_string(),
            })?;
        let home = root.package.as_deref();
        let root_id = root.qualified_name();
        let in_scope = |ty: &TypeDoc| self.view.is_visible(ty);

        let mut asm = GraphAssembly::new();
        asm.add_node(self.type_node(root, home, true));

        let mut child_id = root_id.clone();
        for sup in self.superclass_chain(root) {
            let sup_id = sup.qualified_name();
            asm.add_node(self.type_node(sup, home, false));
            asm.add_edge(Edge::new(&child_id, &sup_id, EdgeKind::Inheritance));
            child_id = sup_id;
        }

        for rel in self.relations(root, &in_scope) {
            asm.add_node(self.type_node(rel.target, home, false));
            asm.add_edge(
                Edge::new(&root_id, &rel.target.qualified_name(), rel.kind).with_label(rel.label),
            );
        }

        for (sub, kind) in self.subtypes(root) {
            let sub_id = sub.qualified_name();
            asm.add_node(self.type_node(sub, home, false));
            asm.add_edge(Edge::new(&sub_id, &root_id, kind));
        }

        Ok(asm.finish(DiagramTarget::Class(root_id)))
    }

    /// 包摘要图
    pub fn package_diagram(&self, package: &str) -> DiagramGraph {
        let members = self.view.types_in(package);
        let in_scope =
            |ty: &TypeDoc| ty.package.as_deref() == Some(package) || self.view.is_visible(ty);

        let mut asm = GraphAssembly::new();
        for member in &members {
            asm.add_node(self.type_node(member, Some(package), false));
        }

        let mut externals: Vec<&TypeDoc> = Vec::new();
        for member in &members {
            let member_id = member.qualified_name();
            for rel in self.relations(member, &in_scope) {
                let target_id = rel.target.qualified_name();
                if !asm.contains(&target_id) {
                    asm.add_node(self.type_node(rel.target, Some(package), false));
                    externals.push(rel.target);
                }
                asm.add_edge(Edge::new(&member_id, &target_id, rel.kind).with_label(rel.label));
            }
        }

        // 外部类型指回包内的关系
        let is_member = |ty: &TypeDoc| ty.package.as_deref() == Some(package);
        for external in externals {
            let external_id = external.qualified_name();
            for rel in self.relations(external, &is_member) {
                asm.add_edge(
                    Edge::new(&external_id, &rel.target.qualified_name(), rel.kind)
                        .with_label(rel.label),
                );
            }
        }

        asm.finish(DiagramTarget::PackageSummary(package.to_string()))
    }

    /// 总览图
    pub fn overview_diagram(&self, metrics: Option<&PackageMetrics>) -> DiagramGraph {
        let packages: Vec<&str> = self
            .view
            .packages()
            .into_iter()
            .filter(|p| !self.view.is_hidden(p))
            .collect();
        let in_scope = |ty: &TypeDoc| self.view.is_visible(ty);

        let mut asm = GraphAssembly::new();
        for package in &packages {
            asm.add_node(Node {
                id: package.to_string(),
                label: package.to_string(),
                kind: NodeKind::Package,
                style: self.categories.resolve(None).clone(),
                link: self.page_link(&PackageDoc::summary_page_name(package)),
                coupling: metrics.and_then(|m| m.get(package)),
                emphasized: false,
            });
        }

        for ty in self.view.visible_types() {
            let from = match ty.package.as_deref() {
                Some(p) if !p.is_empty() => p,
                _ => continue,
            };
            for rel in self.relations(ty, &in_scope) {
                match rel.target.package.as_deref() {
                    Some(to) if !to.is_empty() && to != from => {
                        asm.add_edge(Edge::new(from, to, EdgeKind::Dependency));
                    }
                    _ => {}
                }
            }
        }

        asm.finish(DiagramTarget::Overview)
    }

    fn type_node(&self, ty: &TypeDoc, home: Option<&str>, emphasized: bool) -> Node {
        let label = match ty.package.as_deref() {
            Some(p) if !p.is_empty() && Some(p) != home => format!("{}\n({})", ty.name, p),
            _ => ty.name.clone(),
        };
        Node {
            id: ty.qualified_name(),
            label,
            kind: NodeKind::Type(ty.kind),
            style: self.categories.resolve(ty.category()).clone(),
            link: self.page_link(&ty.page_name()),
            coupling: None,
            emphasized,
        }
    }

    /// 相对输出目录的页面链接, 旧版单文件页面存在时指向它
    fn page_link(&self, name: &str) -> String {
        let name = match self.page_root {
            Some((dir, mode)) => match locate_page(dir, name, mode) {
                PageLookup::Found(location) => location.name,
                _ => name.to_string(),
            },
            None => name.to_string(),
        };
        format!("{}.html", name)
    }

    /// 按限定名或同包简单名解析类型引用
    fn resolve(&self, from: &TypeDoc, name: &str) -> Option<&'a TypeDoc> {
        let name = name.trim().trim_end_matches("[]");
        if name.is_empty() {
            return None;
        }
        let model = self.view.model();
        model.find_type(name).or_else(|| {
            from.package
                .as_deref()
                .filter(|p| !p.is_empty())
                .and_then(|p| model.find_type(&format!("{}.{}", p, name)))
        })
    }

    fn interface_edge(ty: &TypeDoc) -> EdgeKind {
        if ty.kind == TypeKind::Interface {
            EdgeKind::Inheritance
        } else {
            EdgeKind::Realization
        }
    }

    /// 一个类型直接指向的全部关系, 每个目标只保留最强的一条
    fn relations(&self, ty: &TypeDoc, in_scope: &dyn Fn(&TypeDoc) -> bool) -> Vec<Relation<'a>> {
        let self_id = ty.qualified_name();
        let mut candidates: Vec<(&str, EdgeKind, Option<String>)> = Vec::new();

        if let Some(sup) = ty.superclass.as_deref() {
            candidates.push((sup, EdgeKind::Inheritance, None));
        }
        for iface in &ty.interfaces {
            candidates.push((iface, Self::interface_edge(ty), None));
        }
        for text in ty.tag_values("has") {
            let mut words = text.split_whitespace();
            if let Some(target) = words.next() {
                let label = words.collect::<Vec<_>>().join(" ");
                let label = (!label.is_empty()).then_some(label);
                candidates.push((target, EdgeKind::Aggregation, label));
            }
        }
        for text in ty.tag_values("uses") {
            if let Some(target) = text.split_whitespace().next() {
                candidates.push((target, EdgeKind::Dependency, None));
            }
        }
        for (usage, target) in ty.member_uses() {
            candidates.push((target, self.member_edges.edge_kind(usage), None));
        }

        let mut by_target: BTreeMap<String, Relation<'a>> = BTreeMap::new();
        for (name, kind, label) in candidates {
            let target = match self.resolve(ty, name) {
                Some(t) if in_scope(t) => t,
                _ => continue,
            };
            let target_id = target.qualified_name();
            if target_id == self_id {
                continue;
            }
            let stronger = by_target
                .get(&target_id)
                .map_or(true, |existing| kind.strength() > existing.kind.strength());
            if stronger {
                by_target.insert(target_id, Relation { target, kind, label });
            }
        }
        by_target.into_values().collect()
    }

    fn superclass_chain(&self, ty: &TypeDoc) -> Vec<&'a TypeDoc> {
        let mut chain = Vec::new();
        let mut seen = BTreeSet::from([ty.qualified_name()]);
        let mut next = ty
            .superclass
            .as_deref()
            .and_then(|s| self.resolve(ty, s));

        while let Some(sup) = next.filter(|s| self.view.is_visible(s)) {
            if !seen.insert(sup.qualified_name()) {
                break;
            }
            chain.push(sup);
            next = sup.superclass.as_deref().and_then(|s| self.resolve(sup, s));
        }
        chain
    }

    /// 可见的直接子类 / 实现者
    fn subtypes(&self, root: &TypeDoc) -> Vec<(&'a TypeDoc, EdgeKind)> {
        let root_id = root.qualified_name();
        let points_at_root =
            |from: &TypeDoc, name: &str| self.resolve(from, name).is_some_and(|t| t.qualified_name() == root_id);

        let mut subs = Vec::new();
        for ty in self.view.visible_types() {
            if ty.qualified_name() == root_id {
                continue;
            }
            if ty.superclass.as_deref().is_some_and(|s| points_at_root(ty, s)) {
                subs.push((ty, EdgeKind::Inheritance));
            } else if ty.interfaces.iter().any(|i| points_at_root(ty, i)) {
                subs.push((ty, Self::interface_edge(ty)));
            }
        }
        subs
    }
}
