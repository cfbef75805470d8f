use crate::engine::{CouplingEngine, CouplingReport};
use model::{DocModel, ModelView};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// 包耦合度: Ca (传入) / Ce (传出)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coupling {
    pub afferent: usize,
    pub efferent: usize,
}

/// 包名 -> 耦合度
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetrics {
    packages: BTreeMap<String, Coupling>,
}

impl PackageMetrics {
    pub fn get(&self, package: &str) -> Option<Coupling> {
        self.packages.get(package).copied()
    }

    fn from_report(report: &CouplingReport) -> Self {
        let packages = report
            .packages
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    Coupling {
                        afferent: p.afferent,
                        efferent: p.efferent,
                    },
                )
            })
            .collect();
        Self { packages }
    }
}

/// 分析结果: 要么完整可用, 要么整体不可用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricsOutcome {
    Available(PackageMetrics),
    Unavailable {
        reason: String,
        /// 交叉校验时第一个找不到的类型
        missing_type: Option<String>,
    },
}

impl MetricsOutcome {
    fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
            missing_type: None,
        }
    }

    pub fn metrics(&self) -> Option<&PackageMetrics> {
        match self {
            Self::Available(m) => Some(m),
            Self::Unavailable { .. } => None,
        }
    }
}

/// 耦合度分析的 class path
#[derive(Debug, Clone, Default)]
pub struct ClassPath {
    entries: Vec<PathBuf>,
}

impl ClassPath {
    /// 显式配置的条目在前, 宿主的 class path 在后, 按顺序去重
    pub fn resolve(configured: &[PathBuf], host: &[PathBuf]) -> Self {
        let mut entries: Vec<PathBuf> = Vec::new();
        for entry in configured.iter().chain(host) {
            if !entries.contains(entry) {
                entries.push(entry.clone());
            }
        }
        Self { entries }
    }

    /// 按平台路径分隔符拆分
    pub fn split(list: &str) -> Vec<PathBuf> {
        std::env::split_paths(list)
            .filter(|p| !p.as_os_str().is_empty())
            .collect()
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// 只有目录参与分析
    pub fn directories(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        for entry in &self.entries {
            if entry.is_dir() {
                tracing::info!("Included into dependency analysis: {}", entry.display());
                dirs.push(entry.clone());
            } else {
                tracing::info!("Excluded from dependency analysis: {}", entry.display());
            }
        }
        dirs
    }
}

/// 交叉校验: 每个可见类型都必须出现在分析到的编译类中
///
/// 返回第一个找不到的编译类名。
pub fn cross_check<M: DocModel + ?Sized>(
    report: &CouplingReport,
    view: &ModelView<'_, M>,
) -> Result<(), String> {
    for ty in view.visible_types() {
        let package = match ty.package.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => continue,
        };
        let binary_name = ty.binary_name();
        let found = report
            .package(package)
            .is_some_and(|p| p.classes.iter().any(|c| *c == binary_name));
        if !found {
            return Err(binary_name);
        }
    }
    Ok(())
}

/// 运行耦合度分析
///
/// 任何失败都只降级为 `Unavailable`, 不会中断文档生成。
pub async fn analyze<M: DocModel + ?Sized>(
    engine: Option<&dyn CouplingEngine>,
    view: &ModelView<'_, M>,
    class_path: &ClassPath,
) -> MetricsOutcome {
    let engine = match engine {
        Some(e) => e,
        None => return MetricsOutcome::unavailable("no coupling engine configured"),
    };

    let packages: Vec<String> = view
        .packages()
        .into_iter()
        .filter(|p| !view.is_hidden(p))
        .map(str::to_string)
        .collect();
    let directories = class_path.directories();

    let report = match engine.analyze(&directories, &packages).await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!("Coupling analysis failed: {}", e);
            return MetricsOutcome::unavailable(format!("coupling analysis failed: {}", e));
        }
    };

    if report.class_count() == 0 {
        tracing::warn!("Coupling engine was not able to locate any compiled class files.");
        return MetricsOutcome::unavailable("not able to locate any compiled class files");
    }

    if let Err(missing) = cross_check(&report, view) {
        tracing::warn!(
            "Coupling engine was not able to locate some compiled class files: {}",
            missing
        );
        return MetricsOutcome::Unavailable {
            reason: format!("not able to locate some compiled class files: {}", missing),
            missing_type: Some(missing),
        };
    }

    MetricsOutcome::Available(PackageMetrics::from_report(&report))
}
