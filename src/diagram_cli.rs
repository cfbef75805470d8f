//! Diagram subcommands

use clap::{Args, Subcommand};
use diagram::{
    DiagramConfig, DiagramError, DotWriter, GraphBuilder, GraphvizEngine, MemberEdges,
    PageLookupMode, RunReport, Splicer,
};
use metrics::{ClassPath, CommandEngine, CouplingEngine};
use model::{DocModel, ModelSnapshot, ModelView, PackageDoc, TypeDoc};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Subcommand)]
pub enum DiagramCommands {
    /// Render diagrams and splice them into generated documentation pages
    Generate {
        #[command(flatten)]
        model: ModelArgs,
        /// Generated documentation root
        #[arg(short = 'd', long = "output", default_value = ".")]
        output: PathBuf,
        /// Class path entries for coupling analysis (path list, repeatable)
        #[arg(long = "source-class-path")]
        source_class_path: Vec<String>,
        /// Do not add the package dependency diagram to the overview page
        #[arg(long)]
        no_package_diagram: bool,
        /// Only look for pages at their expected path
        #[arg(long)]
        strict_page_paths: bool,
        /// Per-diagram render timeout in seconds
        #[arg(long)]
        render_timeout: Option<u64>,
        /// External coupling analysis program
        #[arg(long)]
        metrics_command: Option<PathBuf>,
        /// Extra argument passed to the coupling analysis program (repeatable)
        #[arg(long = "metrics-arg", allow_hyphen_values = true)]
        metrics_args: Vec<String>,
        /// JSON output
        #[arg(long)]
        json: bool,
    },
    /// Print the DOT source of one diagram without rendering it
    Dot {
        #[command(flatten)]
        model: ModelArgs,
        #[command(flatten)]
        target: DotTarget,
    },
}

#[derive(Args)]
pub struct ModelArgs {
    /// Model snapshot (JSON)
    model: PathBuf,
    /// Category definition `name[:fill[:line]]` (repeatable)
    #[arg(long = "category")]
    categories: Vec<String>,
    /// Hidden package pattern, `a.b` or `a.b.*` (repeatable)
    #[arg(long = "exclude-package")]
    excluded_packages: Vec<String>,
    /// Member reference convention: fields-association, association, dependency
    #[arg(long, default_value = "fields-association")]
    member_edges: String,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct DotTarget {
    /// Class diagram of a type (qualified name)
    #[arg(long = "type")]
    type_name: Option<String>,
    /// Package diagram
    #[arg(long)]
    package: Option<String>,
    /// Package dependency overview
    #[arg(long)]
    overview: bool,
}

pub async fn run(cmd: DiagramCommands) -> anyhow::Result<()> {
    match cmd {
        DiagramCommands::Generate {
            model,
            output,
            source_class_path,
            no_package_diagram,
            strict_page_paths,
            render_timeout,
            metrics_command,
            metrics_args,
            json,
        } => {
            let mut config = model.config()?;
            config.output_dir = output;
            config.no_package_diagram = no_package_diagram;
            if !source_class_path.is_empty() {
                config.source_class_path = Some(
                    source_class_path
                        .iter()
                        .flat_map(|list| ClassPath::split(list))
                        .collect(),
                );
            }
            if strict_page_paths {
                config.page_lookup = PageLookupMode::Exact;
            }
            if let Some(secs) = render_timeout {
                config.render_timeout = Duration::from_secs(secs);
            }
            if metrics_command.is_some() {
                config.metrics_command = metrics_command;
            }
            cmd_generate(&model.model, &config, metrics_args, json).await
        }
        DiagramCommands::Dot { model, target } => cmd_dot(&model, &target),
    }
}

impl ModelArgs {
    fn config(&self) -> anyhow::Result<DiagramConfig> {
        let member_edges = MemberEdges::parse(&self.member_edges).ok_or_else(|| {
            DiagramError::configuration(
                "--member-edges",
                format!("unknown convention: {}", self.member_edges),
            )
        })?;

        Ok(DiagramConfig {
            categories: self.categories.clone(),
            excluded_packages: self.excluded_packages.clone(),
            member_edges,
            ..DiagramConfig::from_env()
        })
    }
}

async fn cmd_generate(
    model_path: &Path,
    config: &DiagramConfig,
    metrics_args: Vec<String>,
    json: bool,
) -> anyhow::Result<()> {
    config.validate()?;

    let snapshot = ModelSnapshot::load(model_path)?;
    println!("Loaded model: {}", model_path.display());

    let renderer = GraphvizEngine::new(config.graphviz_home.as_deref(), config.render_timeout);
    let coupling = config
        .metrics_command
        .as_ref()
        .map(|program| CommandEngine::new(program.clone()).with_args(metrics_args));
    let splicer = Splicer::default();

    let report = diagram::generate(
        &snapshot,
        config,
        &renderer,
        coupling.as_ref().map(|c| c as &dyn CouplingEngine),
        &splicer,
    )
    .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report_json(&report))?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn cmd_dot(args: &ModelArgs, target: &DotTarget) -> anyhow::Result<()> {
    let config = args.config()?;
    let snapshot = ModelSnapshot::load(&args.model)?;
    let categories = config.category_table()?;
    let rules = config.hidden_rules();
    let builder = GraphBuilder::new(ModelView::new(&snapshot, &rules), &categories)
        .with_member_edges(config.member_edges);

    let (graph, page) = if let Some(name) = &target.type_name {
        let graph = builder.class_diagram(name)?;
        let page = snapshot
            .find_type(name)
            .map(TypeDoc::page_name)
            .unwrap_or_default();
        (graph, page)
    } else if let Some(package) = &target.package {
        (builder.package_diagram(package), PackageDoc::summary_page_name(package))
    } else {
        (builder.overview_diagram(None), "overview-summary".to_string())
    };

    print!("{}", DotWriter::for_page(&page).write(&graph));
    Ok(())
}

fn print_report(report: &RunReport) {
    if !report.renderer_available {
        println!("Graphviz not available, no diagrams generated");
    }

    println!("Instrumented pages: {}", report.instrumented.len());
    for page in &report.instrumented {
        println!("  {}", page.display());
    }

    if !report.skipped.is_empty() {
        println!("Skipped pages: {}", report.skipped.len());
        for name in &report.skipped {
            println!("  {}", name);
        }
    }

    println!("Coupling metrics: {:?}", report.metrics);

    if !report.diagnostics.is_empty() {
        println!("\nDiagnostics:");
        for d in &report.diagnostics {
            println!("  - {}", d);
        }
    }
}

fn report_json(report: &RunReport) -> serde_json::Value {
    serde_json::json!({
        "renderer_available": report.renderer_available,
        "instrumented": report.instrumented,
        "skipped": report.skipped,
        "metrics": format!("{:?}", report.metrics),
        "diagnostics": report
            .diagnostics
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>(),
    })
}
