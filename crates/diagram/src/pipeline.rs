use crate::builder::GraphBuilder;
use crate::config::DiagramConfig;
use crate::dot::DotWriter;
use crate::error::{DiagramError, Result};
use crate::graph::DiagramGraph;
use crate::graphviz::RenderEngine;
use crate::splice::{locate_page, PageKind, PageLocation, PageLookup, Splicer};
use metrics::{ClassPath, CouplingEngine, MetricsOutcome};
use model::{DocModel, ModelView, PackageDoc};
use std::fmt;
use std::path::PathBuf;

const OVERVIEW_PAGE: &str = "overview-summary";

/// 降级类问题, 需要展示给用户
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    RendererUnavailable(String),
    MetricsUnavailable(String),
    PageSkipped(String),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RendererUnavailable(reason) => {
                write!(f, "{}; skipping diagram generation", reason)
            }
            Self::MetricsUnavailable(reason) => write!(
                f,
                "{}; make sure --source-class-path is correct. \
                 Package dependency diagram is generated without coupling metrics",
                reason
            ),
            Self::PageSkipped(name) => write!(f, "Page not found, skipped: {}.html", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetricsStatus {
    #[default]
    NotRequested,
    Available,
    Unavailable,
}

/// 一次运行的结果
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub renderer_available: bool,
    pub instrumented: Vec<PathBuf>,
    pub skipped: Vec<String>,
    pub metrics: MetricsStatus,
    pub diagnostics: Vec<Diagnostic>,
}

impl RunReport {
    fn diagnose(&mut self, diagnostic: Diagnostic) {
        tracing::warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }
}

/// 顺序执行: 类图 -> 包摘要图 -> 总览图, 每张图 构建 -> 渲染 -> 拼接 完成后才开始下一张
pub struct DiagramRun<'a, M: DocModel + ?Sized> {
    builder: GraphBuilder<'a, M>,
    renderer: &'a dyn RenderEngine,
    splicer: &'a Splicer,
    config: &'a DiagramConfig,
    coupling: Option<&'a dyn CouplingEngine>,
}

impl<'a, M: DocModel + ?Sized> DiagramRun<'a, M> {
    pub fn new(
        builder: GraphBuilder<'a, M>,
        renderer: &'a dyn RenderEngine,
        splicer: &'a Splicer,
        config: &'a DiagramConfig,
    ) -> Self {
        Self {
            builder,
            renderer,
            splicer,
            config,
            coupling: None,
        }
    }

    pub fn with_coupling_engine(mut self, engine: Option<&'a dyn CouplingEngine>) -> Self {
        self.coupling = engine;
        self
    }

    pub async fn execute(&self) -> Result<RunReport> {
        let mut report = RunReport::default();

        if let Err(e) = self.renderer.probe().await {
            if e.is_fatal() {
                return Err(e);
            }
            report.diagnose(Diagnostic::RendererUnavailable(e.to_string()));
            return Ok(report);
        }
        report.renderer_available = true;

        let view = self.builder.view();

        for ty in view.model().types() {
            if let Some(location) = self.locate(&ty.page_name(), &mut report) {
                let graph = self.builder.class_diagram(&ty.qualified_name())?;
                self.emit(&location, &graph, PageKind::Type, &mut report).await?;
            }
        }

        for package in view.packages() {
            let name = PackageDoc::summary_page_name(package);
            if let Some(location) = self.locate(&name, &mut report) {
                let graph = self.builder.package_diagram(package);
                self.emit(&location, &graph, PageKind::PackageSummary, &mut report)
                    .await?;
            }
        }

        if self.config.no_package_diagram {
            tracing::info!("Package dependency diagram disabled");
        } else if let Some(location) = self.locate(OVERVIEW_PAGE, &mut report) {
            let outcome = self.coupling_metrics(view).await;
            match &outcome {
                MetricsOutcome::Available(_) => report.metrics = MetricsStatus::Available,
                MetricsOutcome::Unavailable { reason, missing_type } => {
                    report.metrics = MetricsStatus::Unavailable;
                    let reason = match missing_type {
                        Some(t) => DiagramError::ModelInconsistency {
                            missing_type: t.clone(),
                        }
                        .to_string(),
                        None => reason.clone(),
                    };
                    report.diagnose(Diagnostic::MetricsUnavailable(reason));
                }
            }
            let graph = self.builder.overview_diagram(outcome.metrics());
            self.emit(&location, &graph, PageKind::Overview, &mut report)
                .await?;
        }

        Ok(report)
    }

    async fn coupling_metrics(&self, view: &ModelView<'a, M>) -> MetricsOutcome {
        let configured = self.config.source_class_path.as_deref().unwrap_or(&[]);
        let class_path = ClassPath::resolve(configured, view.model().class_path());
        metrics::analyze(self.coupling, view, &class_path).await
    }

    fn locate(&self, name: &str, report: &mut RunReport) -> Option<PageLocation> {
        match locate_page(&self.config.output_dir, name, self.config.page_lookup) {
            PageLookup::Found(location) => Some(location),
            PageLookup::Missing { name } => {
                report.diagnose(Diagnostic::PageSkipped(name.clone()));
                report.skipped.push(name);
                None
            }
        }
    }

    async fn emit(
        &self,
        location: &PageLocation,
        graph: &DiagramGraph,
        kind: PageKind,
        report: &mut RunReport,
    ) -> Result<()> {
        let source = DotWriter::for_page(&location.name).write(graph);
        let image = location.image();
        tracing::info!("Generating {}...", image.display());

        let rendered = self
            .renderer
            .render(&graph.target().to_string(), &source, &image, &location.map())
            .await?;
        self.splicer.instrument(&location.page(), &rendered, kind)?;

        report.instrumented.push(location.page());
        Ok(())
    }
}

/// 校验配置并执行一次完整的图生成
pub async fn generate<M: DocModel + ?Sized>(
    model: &M,
    config: &DiagramConfig,
    renderer: &dyn RenderEngine,
    coupling: Option<&dyn CouplingEngine>,
    splicer: &Splicer,
) -> Result<RunReport> {
    config.validate()?;
    let categories = config.category_table()?;
    let rules = config.hidden_rules();

    let builder = GraphBuilder::new(ModelView::new(model, &rules), &categories)
        .with_member_edges(config.member_edges)
        .with_page_root(&config.output_dir, config.page_lookup);

    DiagramRun::new(builder, renderer, splicer, config)
        .with_coupling_engine(coupling)
        .execute()
        .await
}
