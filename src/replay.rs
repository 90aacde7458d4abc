//! 变更脚本回放
//!
//! 调试工具：加载项目文档，逐行回放变更记录脚本，驱动模型层与
//! 编辑历史走完整的 record → commit → undo/redo 路径。
//!
//! 脚本是 JSON Lines：每行要么是一条 `ChangeRecord`，要么是
//! `commit` / `undo` / `redo` 指令；空行和 `#` 开头的行跳过。

use crate::models::{ChangeRecord, EditHistory, Project, ProjectDoc, ProjectError};
use std::{
    fmt,
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

#[derive(Debug)]
pub enum ReplayError {
    Io(io::Error),
    BadDocument(serde_json::Error),
    Project(ProjectError),
    BadLine { line: usize },
    Apply { line: usize, source: ProjectError },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayError::Io(e) => write!(f, "io error: {e}"),
            ReplayError::BadDocument(e) => write!(f, "invalid project document: {e}"),
            ReplayError::Project(e) => write!(f, "invalid project document: {e}"),
            ReplayError::BadLine { line } => {
                write!(f, "line {line}: not a change record or directive")
            }
            ReplayError::Apply { line, source } => write!(f, "line {line}: {source}"),
        }
    }
}

impl std::error::Error for ReplayError {}

impl From<io::Error> for ReplayError {
    fn from(e: io::Error) -> Self {
        ReplayError::Io(e)
    }
}

#[derive(Debug, Default)]
pub struct ReplaySummary {
    pub records: usize,
    pub commits: usize,
    pub undos: usize,
    pub redos: usize,
    pub history_len: usize,
}

pub fn load_project(path: &Path) -> Result<Project, ReplayError> {
    let file = File::open(path)?;
    let doc: ProjectDoc =
        serde_json::from_reader(BufReader::new(file)).map_err(ReplayError::BadDocument)?;
    Project::from_document(doc).map_err(ReplayError::Project)
}

/// 回放脚本；undo/redo 指令在栈为空时跳过（边界 no-op，不算错误）
pub fn replay_script<R: BufRead>(
    project: &mut Project,
    reader: R,
) -> Result<ReplaySummary, ReplayError> {
    let mut history = EditHistory::new();
    let mut summary = ReplaySummary::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        match trimmed {
            "commit" => {
                history.commit();
                summary.commits += 1;
            }
            "undo" => match history.undo() {
                Some(commit) => {
                    apply_commit(project, commit.records(), line_no)?;
                    summary.undos += 1;
                }
                None => tracing::warn!(line = line_no, "nothing to undo"),
            },
            "redo" => match history.redo() {
                Some(commit) => {
                    apply_commit(project, commit.records(), line_no)?;
                    summary.redos += 1;
                }
                None => tracing::warn!(line = line_no, "nothing to redo"),
            },
            _ => {
                let record = ChangeRecord::from_json_line(trimmed)
                    .ok_or(ReplayError::BadLine { line: line_no })?;
                project
                    .apply(&record)
                    .map_err(|source| ReplayError::Apply {
                        line: line_no,
                        source,
                    })?;
                history.record(record);
                summary.records += 1;
            }
        }
    }

    summary.history_len = history.len();
    tracing::info!(
        records = summary.records,
        commits = summary.commits,
        undos = summary.undos,
        redos = summary.redos,
        "replay finished"
    );
    Ok(summary)
}

fn apply_commit(
    project: &mut Project,
    records: &[ChangeRecord],
    line_no: usize,
) -> Result<(), ReplayError> {
    for record in records {
        project.apply(record).map_err(|source| ReplayError::Apply {
            line: line_no,
            source,
        })?;
    }
    Ok(())
}
