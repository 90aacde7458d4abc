//! 编辑历史（提交模型）
//!
//! 两个栈实现线性 undo/redo：
//! - 细粒度变更先累积在 Stage（一次用户动作内的所有 record）
//! - commit() 将 Stage 冻结为不可变 Commit 压入 commits 栈
//! - undo/redo 在 commits 与 reverts 之间搬移反转后的 Commit
//! - 新的 commit 使 redo 历史失效（标准编辑器模型，不分支）
//!
//! 历史只存在于会话内存中，不随项目文档持久化。

use super::change::ChangeRecord;

/// 编辑历史配置
#[derive(Clone, Debug, Default)]
pub struct EditHistoryConfig {
    /// 可撤销提交数上限；None 表示不限制
    pub max_commits: Option<usize>,
}

/// 尚未提交的变更缓冲区
#[derive(Debug, Default)]
pub struct EditHistoryStage {
    records: Vec<ChangeRecord>,
}

impl EditHistoryStage {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// 追加一条记录；记录顺序即修改发生顺序，不去重不重排
    pub fn add(&mut self, record: ChangeRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 将当前缓冲冻结为 Commit；不清空缓冲，由调用方决定
    pub fn to_commit(&self) -> EditHistoryCommit {
        EditHistoryCommit {
            records: self.records.clone(),
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// 一次可撤销的原子变更批次；创建后不可变
#[derive(Clone, Debug, PartialEq)]
pub struct EditHistoryCommit {
    records: Vec<ChangeRecord>,
}

impl EditHistoryCommit {
    pub fn records(&self) -> &[ChangeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 求逆提交：逐条求逆并倒序，保证 [r1, r2, r3] 的逆是
    /// [inv(r3), inv(r2), inv(r1)]，中间状态按依赖顺序恢复
    pub fn revert(&self) -> EditHistoryCommit {
        EditHistoryCommit {
            records: self.records.iter().rev().map(|r| r.inverse()).collect(),
        }
    }
}

/// 一个打开文档的 undo/redo 状态机
pub struct EditHistory {
    stage: EditHistoryStage,
    commits: Vec<EditHistoryCommit>,
    reverts: Vec<EditHistoryCommit>,
    config: EditHistoryConfig,
}

impl EditHistory {
    pub fn new() -> Self {
        Self {
            stage: EditHistoryStage::new(),
            commits: Vec::new(),
            reverts: Vec::new(),
            config: EditHistoryConfig::default(),
        }
    }

    /// 设置配置
    pub fn with_config(mut self, config: EditHistoryConfig) -> Self {
        self.config = config;
        self
    }

    /// 记录一条观察到的修改；不提交
    pub fn record(&mut self, record: ChangeRecord) {
        tracing::trace!(
            object = record.change.object(),
            name = record.change.name(),
            "record change"
        );
        self.stage.add(record);
    }

    /// 当前暂存的记录数
    pub fn staged_len(&self) -> usize {
        self.stage.len()
    }

    /// 结束一次逻辑动作：空 Stage 时是 no-op，可以在每个动作末尾
    /// 无条件调用而不产生空历史项
    pub fn commit(&mut self) {
        if self.stage.is_empty() {
            return;
        }

        // 任何新的编辑都使 redo 历史失效
        self.reverts.clear();

        let commit = self.stage.to_commit();
        self.stage.clear();

        tracing::debug!(
            records = commit.len(),
            depth = self.commits.len() + 1,
            "commit"
        );
        self.commits.push(commit);

        if let Some(max) = self.config.max_commits {
            while self.commits.len() > max {
                self.commits.remove(0);
            }
        }
    }

    /// 查看最近第 offset 个提交（0 为最新）；只看 undo 栈
    pub fn peek(&self, offset: usize) -> Option<&EditHistoryCommit> {
        let idx = self.commits.len().checked_sub(offset + 1)?;
        self.commits.get(idx)
    }

    /// Undo：弹出最近提交，将其逆压入 redo 栈并返回。
    /// 返回的提交由调用方应用回模型；历史本身不碰模型对象。
    /// 无可撤销提交时返回 None，状态不变。
    pub fn undo(&mut self) -> Option<EditHistoryCommit> {
        let commit = self.commits.pop()?;
        let inverse = commit.revert();
        self.reverts.push(inverse.clone());

        tracing::debug!(
            records = inverse.len(),
            commits = self.commits.len(),
            reverts = self.reverts.len(),
            "undo"
        );
        Some(inverse)
    }

    /// Redo：弹出最近撤销项，再求逆恢复原方向，压回 undo 栈并返回
    pub fn redo(&mut self) -> Option<EditHistoryCommit> {
        let undone = self.reverts.pop()?;
        let commit = undone.revert();
        self.commits.push(commit.clone());

        tracing::debug!(
            records = commit.len(),
            commits = self.commits.len(),
            reverts = self.reverts.len(),
            "redo"
        );
        Some(commit)
    }

    /// 可撤销提交数
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        !self.commits.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.reverts.is_empty()
    }

    /// 放弃未提交的暂存记录，不产生 Commit
    pub fn clear_stage(&mut self) {
        self.stage.clear();
    }
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::change::Change;
    use serde_json::{json, Value};

    fn update(name: &str, old: Value, new: Value) -> ChangeRecord {
        ChangeRecord::new(
            "project-1",
            "root/el-1",
            Change::Update {
                object: "el-1".into(),
                name: name.into(),
                old_value: old,
                new_value: new,
            },
        )
    }

    #[test]
    fn test_new_history_is_empty() {
        let history = EditHistory::new();
        assert_eq!(history.len(), 0);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_record_without_commit_is_invisible() {
        let mut history = EditHistory::new();
        history.record(update("a", json!(0), json!(1)));
        history.record(update("b", json!(0), json!(1)));
        assert_eq!(history.len(), 0);
        assert_eq!(history.staged_len(), 2);
    }

    #[test]
    fn test_commit_of_empty_stage_is_noop() {
        let mut history = EditHistory::new();
        history.commit();
        history.commit();
        assert_eq!(history.len(), 0);
    }

    #[test]
    fn test_batching_one_commit_for_many_records() {
        let mut history = EditHistory::new();
        for i in 0..5 {
            history.record(update("n", json!(i), json!(i + 1)));
        }
        history.commit();

        assert_eq!(history.len(), 1);
        let commit = history.peek(0).unwrap();
        assert_eq!(commit.len(), 5);
        // 原始顺序保留
        for (i, record) in commit.records().iter().enumerate() {
            match &record.change {
                Change::Update { old_value, .. } => assert_eq!(old_value, &json!(i)),
                other => panic!("unexpected change: {other:?}"),
            }
        }
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut history = EditHistory::new();
        for name in ["a", "b", "c"] {
            history.record(update(name, json!(false), json!(true)));
            history.commit();
        }
        assert_eq!(history.len(), 3);

        let undone = history.undo().unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.can_redo());

        let redone = history.redo().unwrap();
        assert_eq!(history.len(), 3);
        assert!(!history.can_redo());

        // redo 返回的提交与被撤销的提交逐条相等
        assert_eq!(redone, undone.revert());
        assert_eq!(history.peek(0).unwrap(), &redone);
    }

    #[test]
    fn test_double_revert_identity() {
        let mut stage = EditHistoryStage::new();
        stage.add(update("a", json!(1), json!(2)));
        stage.add(update("b", json!("x"), json!("y")));
        let commit = stage.to_commit();
        assert_eq!(commit.revert().revert(), commit);
    }

    #[test]
    fn test_new_edit_invalidates_redo() {
        let mut history = EditHistory::new();
        history.record(update("a", json!(0), json!(1)));
        history.commit();
        history.undo().unwrap();
        assert!(history.can_redo());

        history.record(update("b", json!(0), json!(1)));
        history.commit();
        assert!(!history.can_redo());
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_concrete_scenario() {
        let mut history = EditHistory::new();
        history.record(update("a", json!(false), json!(true)));
        history.record(update("b", json!(false), json!(true)));
        history.commit();
        assert_eq!(history.len(), 1);

        let commit = history.peek(0).unwrap();
        assert_eq!(commit.len(), 2);
        assert_eq!(commit.records()[0].change.name(), "a");
        assert_eq!(commit.records()[1].change.name(), "b");

        // 逆提交：顺序反转，新旧值互换
        let inverse = history.undo().unwrap();
        assert_eq!(inverse.records()[0].change.name(), "b");
        assert_eq!(inverse.records()[1].change.name(), "a");
        match &inverse.records()[0].change {
            Change::Update {
                old_value,
                new_value,
                ..
            } => {
                assert_eq!(old_value, &json!(true));
                assert_eq!(new_value, &json!(false));
            }
            other => panic!("unexpected change: {other:?}"),
        }
    }

    #[test]
    fn test_undo_redo_boundaries() {
        let mut history = EditHistory::new();
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert_eq!(history.len(), 0);
    }

    #[test]
    fn test_peek_out_of_range() {
        let mut history = EditHistory::new();
        assert!(history.peek(0).is_none());

        history.record(update("a", json!(0), json!(1)));
        history.commit();
        assert!(history.peek(0).is_some());
        assert!(history.peek(1).is_none());
    }

    #[test]
    fn test_clear_stage_discards_records() {
        let mut history = EditHistory::new();
        history.record(update("a", json!(0), json!(1)));
        history.clear_stage();
        history.commit();
        assert_eq!(history.len(), 0);
    }

    #[test]
    fn test_max_commits_drops_oldest() {
        let mut history = EditHistory::new().with_config(EditHistoryConfig {
            max_commits: Some(2),
        });
        for name in ["a", "b", "c"] {
            history.record(update(name, json!(0), json!(1)));
            history.commit();
        }
        assert_eq!(history.len(), 2);
        assert_eq!(history.peek(0).unwrap().records()[0].change.name(), "c");
        assert_eq!(history.peek(1).unwrap().records()[0].change.name(), "b");
    }
}
