use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Coupling engine exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },
    #[error("Coupling engine timed out after {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, MetricsError>;

/// 单个包的分析结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageCoupling {
    pub name: String,
    /// 分析到的编译类名 ("a.b.Outer$Inner")
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub afferent: usize,
    #[serde(default)]
    pub efferent: usize,
}

/// 引擎输出
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CouplingReport {
    #[serde(default)]
    pub packages: Vec<PackageCoupling>,
}

impl CouplingReport {
    pub fn class_count(&self) -> usize {
        self.packages.iter().map(|p| p.classes.len()).sum()
    }

    pub fn package(&self, name: &str) -> Option<&PackageCoupling> {
        self.packages.iter().find(|p| p.name == name)
    }

    /// 只保留被接受的包
    pub fn retain_packages(&mut self, accepted: &[String]) {
        self.packages.retain(|p| accepted.contains(&p.name));
    }
}

/// 耦合度分析引擎
#[async_trait]
pub trait CouplingEngine: Send + Sync {
    /// 分析给定目录下的编译产物, 只统计 `packages` 中的包
    async fn analyze(&self, directories: &[PathBuf], packages: &[String]) -> Result<CouplingReport>;
}

/// 外部命令实现: `<program> [args..] --packages a,b <dir>..`, 从 stdout 读取 JSON 报告
pub struct CommandEngine {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CouplingEngine for CommandEngine {
    async fn analyze(&self, directories: &[PathBuf], packages: &[String]) -> Result<CouplingReport> {
        tracing::debug!(
            "Running coupling engine: {} on {} directories",
            self.program.display(),
            directories.len()
        );

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg("--packages")
            .arg(packages.join(","))
            .args(directories)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| MetricsError::Timeout(self.timeout))??;

        if !output.status.success() {
            return Err(MetricsError::Exit {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let mut report: CouplingReport = serde_json::from_slice(&output.stdout)?;
        report.retain_packages(packages);
        Ok(report)
    }
}
