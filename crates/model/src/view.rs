use crate::snapshot::DocModel;
use crate::types::TypeDoc;

/// 包排除规则
///
/// `a.b` 精确匹配, `a.b.*` 匹配 a.b 及其子包。
#[derive(Debug, Clone, Default)]
pub struct HiddenRules {
    patterns: Vec<String>,
}

impl HiddenRules {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, package: &str) -> bool {
        self.patterns.iter().any(|p| Self::pattern_matches(p, package))
    }

    fn pattern_matches(pattern: &str, package: &str) -> bool {
        match pattern.strip_suffix(".*") {
            Some(prefix) => package
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('.')),
            None => pattern == package,
        }
    }
}

/// 文档模型视图 - 包枚举与可见性判断
pub struct ModelView<'a, M: DocModel + ?Sized> {
    model: &'a M,
    rules: &'a HiddenRules,
}

impl<'a, M: DocModel + ?Sized> ModelView<'a, M> {
    pub fn new(model: &'a M, rules: &'a HiddenRules) -> Self {
        Self { model, rules }
    }

    pub fn model(&self) -> &'a M {
        self.model
    }

    /// 由类型列表推导出的包, 去重, 按首次出现的顺序
    pub fn packages(&self) -> Vec<&'a str> {
        let mut packages: Vec<&'a str> = Vec::new();
        for ty in self.model.types() {
            if let Some(p) = ty.package.as_deref().filter(|p| !p.is_empty()) {
                if !packages.contains(&p) {
                    packages.push(p);
                }
            }
        }
        packages
    }

    /// 包是否被隐藏: 命中排除规则或带有 `hidden` 标签
    pub fn is_hidden(&self, package: &str) -> bool {
        self.rules.matches(package)
            || self
                .model
                .package_tags(package)
                .iter()
                .any(|t| t.name == "hidden")
    }

    /// 默认包中的类型总是可见
    pub fn is_visible(&self, ty: &TypeDoc) -> bool {
        match ty.package.as_deref() {
            Some(p) if !p.is_empty() => !self.is_hidden(p),
            _ => true,
        }
    }

    /// 按名称查找可见类型
    pub fn visible_type(&self, qualified_name: &str) -> Option<&'a TypeDoc> {
        self.model
            .find_type(qualified_name)
            .filter(|ty| self.is_visible(ty))
    }

    /// 包内声明的类型
    pub fn types_in(&self, package: &str) -> Vec<&'a TypeDoc> {
        self.model
            .types()
            .iter()
            .filter(|ty| ty.package.as_deref() == Some(package))
            .collect()
    }

    pub fn visible_types(&self) -> impl Iterator<Item = &'a TypeDoc> + '_ {
        self.model.types().iter().filter(|ty| self.is_visible(ty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::ModelSnapshot;
    use crate::types::{DocTag, PackageDoc, TypeKind};

    fn make_model() -> ModelSnapshot {
        ModelSnapshot::new(
            vec![
                TypeDoc::new(Some("b"), "One", TypeKind::Class),
                TypeDoc::new(Some("a"), "Two", TypeKind::Class),
                TypeDoc::new(Some("b"), "Three", TypeKind::Interface),
                TypeDoc::new(None, "Loose", TypeKind::Class),
                TypeDoc::new(Some("a.internal"), "Secret", TypeKind::Class),
            ],
            vec![PackageDoc {
                name: "b".to_string(),
                tags: vec![DocTag::new("hidden", "")],
            }],
        )
        .unwrap()
    }

    #[test]
    fn test_packages_first_occurrence_order() {
        let model = make_model();
        let rules = HiddenRules::default();
        let view = ModelView::new(&model, &rules);
        assert_eq!(view.packages(), vec!["b", "a", "a.internal"]);
    }

    #[test]
    fn test_packages_empty_model() {
        let model = ModelSnapshot::default();
        let rules = HiddenRules::default();
        let view = ModelView::new(&model, &rules);
        assert!(view.packages().is_empty());
    }

    #[test]
    fn test_is_hidden_by_tag_and_rule() {
        let model = make_model();
        let rules = HiddenRules::new(["a.*"]);
        let view = ModelView::new(&model, &rules);

        assert!(view.is_hidden("b"));
        assert!(view.is_hidden("a"));
        assert!(view.is_hidden("a.internal"));
        assert!(!view.is_hidden("ab"));
    }

    #[test]
    fn test_pattern_exact_match_only() {
        let rules = HiddenRules::new(["a.internal"]);
        assert!(rules.matches("a.internal"));
        assert!(!rules.matches("a.internal.deep"));
        assert!(!rules.matches("a"));
    }

    #[test]
    fn test_default_package_always_visible() {
        let model = make_model();
        let rules = HiddenRules::new(["a.*"]);
        let view = ModelView::new(&model, &rules);

        let loose = model.find_type("Loose").unwrap();
        assert!(view.is_visible(loose));
        assert!(view.visible_type("a.Two").is_none());

        let visible: Vec<_> = view.visible_types().map(|t| t.qualified_name()).collect();
        assert_eq!(visible, vec!["Loose"]);
    }

    #[test]
    fn test_types_in_package() {
        let model = make_model();
        let rules = HiddenRules::default();
        let view = ModelView::new(&model, &rules);
        let names: Vec<_> = view.types_in("b").iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["One", "Three"]);
    }
}
