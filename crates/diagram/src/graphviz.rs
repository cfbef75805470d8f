use crate::error::{DiagramError, Result};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// 一次渲染的产物: 图片和 image map, 二者同时存在
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDiagram {
    pub image: PathBuf,
    pub map: PathBuf,
}

/// 外部渲染引擎
#[async_trait]
pub trait RenderEngine: Send + Sync {
    /// 可用性探测, 每次运行只调用一次
    async fn probe(&self) -> Result<()>;

    /// 渲染一张图; 失败时不留下任何产物
    async fn render(&self, diagram: &str, source: &str, image: &Path, map: &Path) -> Result<RenderedDiagram>;
}

/// Graphviz `dot`
pub struct GraphvizEngine {
    executable: Option<PathBuf>,
    timeout: Duration,
}

impl GraphvizEngine {
    pub fn new(home: Option<&Path>, timeout: Duration) -> Self {
        Self {
            executable: Self::locate(home),
            timeout,
        }
    }

    pub fn with_executable(executable: PathBuf, timeout: Duration) -> Self {
        Self {
            executable: Some(executable),
            timeout,
        }
    }

    /// 优先 `<home>/bin/dot`, 其次 `<home>/dot`, 最后在 PATH 中查找
    #[doc(hidden)]
    pub fn locate(home: Option<&Path>) -> Option<PathBuf> {
        let name = if cfg!(windows) { "dot.exe" } else { "dot" };
        if let Some(home) = home {
            return [home.join("bin").join(name), home.join(name)]
                .into_iter()
                .find(|p| p.is_file());
        }
        which::which("dot").ok()
    }

    fn output_arg(path: &Path) -> OsString {
        let mut arg = OsString::from("-o");
        arg.push(path);
        arg
    }

    fn discard(image: &Path, map: &Path) {
        let _ = std::fs::remove_file(image);
        let _ = std::fs::remove_file(map);
    }
}

#[async_trait]
impl RenderEngine for GraphvizEngine {
    async fn probe(&self) -> Result<()> {
        let exe = self.executable.as_ref().ok_or_else(|| DiagramError::RendererUnavailable {
            reason: "dot executable not found (set GRAPHVIZ_HOME or add it to PATH)".to_string(),
        })?;

        let mut cmd = Command::new(exe);
        cmd.arg("-V")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| DiagramError::RendererUnavailable {
                reason: format!("{} -V timed out", exe.display()),
            })?
            .map_err(|e| DiagramError::RendererUnavailable {
                reason: format!("{}: {}", exe.display(), e),
            })?;

        if !output.status.success() {
            return Err(DiagramError::RendererUnavailable {
                reason: format!("{} -V exited with {}", exe.display(), output.status),
            });
        }

        tracing::debug!(
            "Graphviz found: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
        Ok(())
    }

    async fn render(&self, diagram: &str, source: &str, image: &Path, map: &Path) -> Result<RenderedDiagram> {
        let exe = self.executable.as_ref().ok_or_else(|| DiagramError::RendererUnavailable {
            reason: "dot executable not found".to_string(),
        })?;
        let failed = |reason: String| DiagramError::RendererExecution {
            diagram: diagram.to_string(),
            reason,
        };

        let mut child = Command::new(exe)
            .arg("-Tcmapx")
            .arg(Self::output_arg(map))
            .arg("-Tpng")
            .arg(Self::output_arg(image))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| failed(e.to_string()))?;

        // 超时后 future 被丢弃, kill_on_drop 负责结束子进程
        let result = tokio::time::timeout(self.timeout, async {
            let written = match child.stdin.take() {
                Some(mut stdin) => stdin.write_all(source.as_bytes()).await,
                None => Ok(()),
            };
            // dot 提前退出时写入会遇到 BrokenPipe, 仍需等它退出以取得 stderr
            child.wait_with_output().await.map(|output| (written, output))
        })
        .await;

        let (written, output) = match result {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => {
                Self::discard(image, map);
                return Err(failed(e.to_string()));
            }
            Err(_) => {
                Self::discard(image, map);
                return Err(DiagramError::RendererTimeout {
                    diagram: diagram.to_string(),
                    timeout: self.timeout,
                });
            }
        };

        if !output.status.success() {
            Self::discard(image, map);
            return Err(failed(format!(
                "dot exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        if let Err(e) = written {
            Self::discard(image, map);
            return Err(failed(format!("failed to send DOT source: {}", e)));
        }

        for artifact in [image, map] {
            if !artifact.is_file() {
                Self::discard(image, map);
                return Err(failed(format!("missing output file {}", artifact.display())));
            }
        }

        Ok(RenderedDiagram {
            image: image.to_path_buf(),
            map: map.to_path_buf(),
        })
    }
}
