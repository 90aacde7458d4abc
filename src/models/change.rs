//! 变更记录：对项目状态的单次原子修改的描述
//!
//! 模型层是唯一的生产者：任何修改共享项目状态的代码都必须构造一条
//! `ChangeRecord` 描述该修改。记录中的值全部是结构化快照
//! （`serde_json::Value`），不持有活对象引用，之后对同一对象的修改
//! 不会污染已记录的变更。

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 修改类型（可穷举匹配，求逆时不会漏分支）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Change {
    Update {
        object: CompactString,
        name: CompactString,
        old_value: Value,
        new_value: Value,
    },
    Add {
        object: CompactString,
        name: CompactString,
        new_value: Value,
        index: Option<usize>,
    },
    Delete {
        object: CompactString,
        name: CompactString,
        old_value: Value,
        index: Option<usize>,
    },
    Splice {
        object: CompactString,
        name: CompactString,
        index: usize,
        removed: Vec<Value>,
        added: Vec<Value>,
    },
}

impl Change {
    /// 被修改对象的 id
    pub fn object(&self) -> &str {
        match self {
            Change::Update { object, .. }
            | Change::Add { object, .. }
            | Change::Delete { object, .. }
            | Change::Splice { object, .. } => object,
        }
    }

    /// 被修改属性的名字
    pub fn name(&self) -> &str {
        match self {
            Change::Update { name, .. }
            | Change::Add { name, .. }
            | Change::Delete { name, .. }
            | Change::Splice { name, .. } => name,
        }
    }

    /// 求逆：Update 交换新旧值，Add 与 Delete 互逆，Splice 交换增删
    pub fn inverse(&self) -> Change {
        match self {
            Change::Update {
                object,
                name,
                old_value,
                new_value,
            } => Change::Update {
                object: object.clone(),
                name: name.clone(),
                old_value: new_value.clone(),
                new_value: old_value.clone(),
            },
            Change::Add {
                object,
                name,
                new_value,
                index,
            } => Change::Delete {
                object: object.clone(),
                name: name.clone(),
                old_value: new_value.clone(),
                index: *index,
            },
            Change::Delete {
                object,
                name,
                old_value,
                index,
            } => Change::Add {
                object: object.clone(),
                name: name.clone(),
                new_value: old_value.clone(),
                index: *index,
            },
            Change::Splice {
                object,
                name,
                index,
                removed,
                added,
            } => Change::Splice {
                object: object.clone(),
                name: name.clone(),
                index: *index,
                removed: added.clone(),
                added: removed.clone(),
            },
        }
    }
}

/// 带项目与路径上下文的变更记录
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub project_id: CompactString,
    pub path: CompactString,
    pub change: Change,
}

impl ChangeRecord {
    pub fn new(
        project_id: impl Into<CompactString>,
        path: impl Into<CompactString>,
        change: Change,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            path: path.into(),
            change,
        }
    }

    /// 求逆记录，保留项目与路径上下文
    pub fn inverse(&self) -> ChangeRecord {
        ChangeRecord {
            project_id: self.project_id.clone(),
            path: self.path.clone(),
            change: self.change.inverse(),
        }
    }

    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_json_line(line: &str) -> Option<Self> {
        serde_json::from_str(line).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update(name: &str, old: Value, new: Value) -> Change {
        Change::Update {
            object: "el-1".into(),
            name: name.into(),
            old_value: old,
            new_value: new,
        }
    }

    #[test]
    fn test_update_inverse_swaps_values() {
        let change = update("visible", json!(false), json!(true));
        let inverse = change.inverse();
        assert_eq!(
            inverse,
            update("visible", json!(true), json!(false))
        );
    }

    #[test]
    fn test_add_delete_inverse() {
        let add = Change::Add {
            object: "el-1".into(),
            name: "label".into(),
            new_value: json!("Hello"),
            index: Some(2),
        };
        let delete = add.inverse();
        assert_eq!(
            delete,
            Change::Delete {
                object: "el-1".into(),
                name: "label".into(),
                old_value: json!("Hello"),
                index: Some(2),
            }
        );
        // Delete 的逆回到 Add
        assert_eq!(delete.inverse(), add);
    }

    #[test]
    fn test_splice_inverse_swaps_removed_added() {
        let splice = Change::Splice {
            object: "el-1".into(),
            name: "children".into(),
            index: 1,
            removed: vec![json!("a")],
            added: vec![json!("b"), json!("c")],
        };
        let inverse = splice.inverse();
        assert_eq!(
            inverse,
            Change::Splice {
                object: "el-1".into(),
                name: "children".into(),
                index: 1,
                removed: vec![json!("b"), json!("c")],
                added: vec![json!("a")],
            }
        );
    }

    #[test]
    fn test_double_inverse_identity() {
        let changes = vec![
            update("x", json!(1), json!(2)),
            Change::Add {
                object: "el-2".into(),
                name: "y".into(),
                new_value: json!(null),
                index: None,
            },
            Change::Splice {
                object: "el-3".into(),
                name: "items".into(),
                index: 0,
                removed: vec![],
                added: vec![json!({"k": "v"})],
            },
        ];
        for change in changes {
            assert_eq!(change.inverse().inverse(), change);
        }
    }

    #[test]
    fn test_record_json_line_round_trip() {
        let record = ChangeRecord::new(
            "project-1",
            "root/header",
            update("title", json!("Old"), json!("New")),
        );
        let line = record.to_json_line();
        let restored = ChangeRecord::from_json_line(&line).unwrap();
        assert_eq!(restored, record);
    }

    #[test]
    fn test_record_inverse_keeps_context() {
        let record = ChangeRecord::new("p", "root/a", update("v", json!(0), json!(1)));
        let inverse = record.inverse();
        assert_eq!(inverse.project_id, record.project_id);
        assert_eq!(inverse.path, record.path);
        assert_eq!(inverse.change, record.change.inverse());
    }
}
