use serde::{Deserialize, Serialize};

/// 类型种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Annotation,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Enum => "enum",
            Self::Annotation => "annotation",
        }
    }
}

/// 文档标签 (`@category foo` -> name: "category", text: "foo")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocTag {
    pub name: String,
    #[serde(default)]
    pub text: String,
}

impl DocTag {
    pub fn new(name: &str, text: &str) -> Self {
        Self {
            name: name.to_string(),
            text: text.to_string(),
        }
    }
}

/// 字段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDoc {
    pub name: String,
    /// 字段类型的限定名
    #[serde(rename = "type")]
    pub type_name: String,
}

/// 方法 / 构造器
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MethodDoc {
    pub name: String,
    /// 参数类型限定名
    #[serde(default)]
    pub params: Vec<String>,
    /// 返回类型限定名
    #[serde(default)]
    pub returns: Option<String>,
}

/// 成员引用方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MemberUse {
    Field,
    Parameter,
    Return,
}

/// 类型文档 - 宿主文档引擎提供的类型元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDoc {
    /// 简单名, 嵌套类型为 "Outer.Inner"
    pub name: String,
    /// 所在包, 默认包为 None
    #[serde(default)]
    pub package: Option<String>,
    pub kind: TypeKind,
    /// 父类限定名
    #[serde(default)]
    pub superclass: Option<String>,
    /// 直接实现 (或继承) 的接口限定名
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldDoc>,
    #[serde(default)]
    pub methods: Vec<MethodDoc>,
    #[serde(default)]
    pub tags: Vec<DocTag>,
}

impl TypeDoc {
    pub fn new(package: Option<&str>, name: &str, kind: TypeKind) -> Self {
        Self {
            name: name.to_string(),
            package: package.map(str::to_string),
            kind,
            superclass: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// 完整限定名: "com.example.Outer.Inner"
    pub fn qualified_name(&self) -> String {
        match &self.package {
            Some(p) if !p.is_empty() => format!("{}.{}", p, self.name),
            _ => self.name.clone(),
        }
    }

    /// 编译产物中的类名: 嵌套类型用 '$' 连接
    pub fn binary_name(&self) -> String {
        let name = self.name.replace('.', "$");
        match &self.package {
            Some(p) if !p.is_empty() => format!("{}.{}", p, name),
            _ => name,
        }
    }

    /// 文档页面逻辑名 (不含扩展名): "com/example/Outer.Inner"
    pub fn page_name(&self) -> String {
        match &self.package {
            Some(p) if !p.is_empty() => format!("{}/{}", p.replace('.', "/"), self.name),
            _ => self.name.clone(),
        }
    }

    /// 指定名称的全部标签文本
    pub fn tag_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.tags
            .iter()
            .filter(move |t| t.name == name)
            .map(|t| t.text.trim())
    }

    /// 分类标签, 只取第一个
    pub fn category(&self) -> Option<&str> {
        self.tag_values("category").find(|t| !t.is_empty())
    }

    /// 字段/参数/返回值引用到的类型
    pub fn member_uses(&self) -> Vec<(MemberUse, &str)> {
        let mut uses = Vec::new();
        for field in &self.fields {
            uses.push((MemberUse::Field, field.type_name.as_str()));
        }
        for method in &self.methods {
            for param in &method.params {
                uses.push((MemberUse::Parameter, param.as_str()));
            }
            if let Some(ret) = &method.returns {
                uses.push((MemberUse::Return, ret.as_str()));
            }
        }
        uses
    }
}

/// 包文档
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageDoc {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<DocTag>,
}

impl PackageDoc {
    /// 包摘要页面逻辑名: "com/example/package-summary"
    pub fn summary_page_name(name: &str) -> String {
        if name.is_empty() {
            "package-summary".to_string()
        } else {
            format!("{}/package-summary", name.replace('.', "/"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name_with_package() {
        let ty = TypeDoc::new(Some("com.example"), "Foo", TypeKind::Class);
        assert_eq!(ty.qualified_name(), "com.example.Foo");
    }

    #[test]
    fn test_qualified_name_default_package() {
        let ty = TypeDoc::new(None, "Foo", TypeKind::Class);
        assert_eq!(ty.qualified_name(), "Foo");
        assert_eq!(ty.page_name(), "Foo");
    }

    #[test]
    fn test_binary_name_nested_type() {
        let ty = TypeDoc::new(Some("a.b"), "Outer.Inner", TypeKind::Class);
        assert_eq!(ty.binary_name(), "a.b.Outer$Inner");
        assert_eq!(ty.qualified_name(), "a.b.Outer.Inner");
    }

    #[test]
    fn test_page_name_mirrors_package() {
        let ty = TypeDoc::new(Some("a.b"), "Outer.Inner", TypeKind::Class);
        assert_eq!(ty.page_name(), "a/b/Outer.Inner");
        assert_eq!(PackageDoc::summary_page_name("a.b"), "a/b/package-summary");
    }

    #[test]
    fn test_category_takes_first_non_empty() {
        let mut ty = TypeDoc::new(Some("a"), "Foo", TypeKind::Class);
        ty.tags.push(DocTag::new("category", "  "));
        ty.tags.push(DocTag::new("category", " io "));
        ty.tags.push(DocTag::new("category", "net"));
        assert_eq!(ty.category(), Some("io"));
    }

    #[test]
    fn test_member_uses_collects_fields_params_returns() {
        let mut ty = TypeDoc::new(Some("a"), "Foo", TypeKind::Class);
        ty.fields.push(FieldDoc {
            name: "bar".to_string(),
            type_name: "a.Bar".to_string(),
        });
        ty.methods.push(MethodDoc {
            name: "run".to_string(),
            params: vec!["a.Baz".to_string()],
            returns: Some("a.Qux".to_string()),
        });

        let uses = ty.member_uses();
        assert_eq!(
            uses,
            vec![
                (MemberUse::Field, "a.Bar"),
                (MemberUse::Parameter, "a.Baz"),
                (MemberUse::Return, "a.Qux"),
            ]
        );
    }

    #[test]
    fn test_deserialize_minimal_type() {
        let ty: TypeDoc = serde_json::from_str(r#"{"name":"Foo","kind":"interface"}"#).unwrap();
        assert_eq!(ty.kind, TypeKind::Interface);
        assert!(ty.package.is_none());
        assert!(ty.fields.is_empty());
    }
}
