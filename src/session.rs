//! 文档会话层
//!
//! 一个打开的文档对应一个 `DocumentSession`，持有自己的项目模型和
//! 编辑历史（历史随文档打开创建、关闭丢弃，不做进程级共享）。
//! 编辑方法都走"先改模型、再把记录转发进历史"的路径；命令层在一次
//! 用户动作结束时调用 `commit()`，Undo/Redo 菜单命令映射到
//! `undo()`/`redo()`。

use crate::models::{EditHistory, ElementId, Project, ProjectError};
use serde_json::Value;

pub struct DocumentSession {
    project: Project,
    history: EditHistory,
}

impl DocumentSession {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            history: EditHistory::new(),
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    fn resolve(&self, object_id: &str) -> Result<ElementId, ProjectError> {
        self.project
            .lookup(object_id)
            .ok_or(ProjectError::UnknownObject)
    }

    pub fn set_property(
        &mut self,
        object_id: &str,
        name: &str,
        value: Value,
    ) -> Result<(), ProjectError> {
        let id = self.resolve(object_id)?;
        let record = self.project.set_property(id, name, value)?;
        self.history.record(record);
        Ok(())
    }

    pub fn add_property(
        &mut self,
        object_id: &str,
        name: &str,
        value: Value,
    ) -> Result<(), ProjectError> {
        let id = self.resolve(object_id)?;
        let record = self.project.add_property(id, name, value)?;
        self.history.record(record);
        Ok(())
    }

    pub fn remove_property(&mut self, object_id: &str, name: &str) -> Result<(), ProjectError> {
        let id = self.resolve(object_id)?;
        let record = self.project.remove_property(id, name)?;
        self.history.record(record);
        Ok(())
    }

    pub fn splice_property(
        &mut self,
        object_id: &str,
        name: &str,
        index: usize,
        remove: usize,
        added: Vec<Value>,
    ) -> Result<(), ProjectError> {
        let id = self.resolve(object_id)?;
        let record = self
            .project
            .splice_property(id, name, index, remove, added)?;
        self.history.record(record);
        Ok(())
    }

    /// 结束一次逻辑动作；空动作是 no-op，可无条件调用
    pub fn commit(&mut self) {
        self.history.commit();
    }

    /// 放弃未提交的暂存记录。已应用到模型的修改不会被回滚，
    /// 回滚需要调用方自行应用逆记录。
    pub fn abandon(&mut self) {
        self.history.clear_stage();
    }

    /// 撤销最近一次提交，把逆记录应用回模型。
    /// 没有可撤销的提交时返回 Ok(false)。
    pub fn undo(&mut self) -> Result<bool, ProjectError> {
        let Some(commit) = self.history.undo() else {
            return Ok(false);
        };
        for record in commit.records() {
            self.project.apply(record)?;
        }
        Ok(true)
    }

    /// 重做最近一次撤销，把记录重新应用到模型
    pub fn redo(&mut self) -> Result<bool, ProjectError> {
        let Some(commit) = self.history.redo() else {
            return Ok(false);
        };
        for record in commit.records() {
            self.project.apply(record)?;
        }
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}
