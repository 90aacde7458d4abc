//! 项目数据模型
//!
//! 一个项目是一棵元素树：每个元素有全局唯一的字符串 id、名字、
//! 属性袋（JSON 值）和有序子元素列表。所有修改接口都返回描述该
//! 修改的 `ChangeRecord`（显式生产者契约），`apply` 则把一条记录
//! 应用回活状态，undo/redo 和回放都走这一条路。

use super::change::{Change, ChangeRecord};
use compact_str::CompactString;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use slotmap::{new_key_type, SlotMap};
use std::{collections::BTreeMap, fmt};

new_key_type! { pub struct ElementId; }

#[derive(Debug)]
pub enum ProjectError {
    UnknownObject,
    DuplicateId,
    UnknownProperty,
    PropertyExists,
    NotAnArray,
    SpliceOutOfRange,
    InvalidElementId,
}

impl fmt::Display for ProjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectError::UnknownObject => write!(f, "object id not found in project"),
            ProjectError::DuplicateId => write!(f, "element id already exists in project"),
            ProjectError::UnknownProperty => write!(f, "property does not exist on element"),
            ProjectError::PropertyExists => write!(f, "property already exists on element"),
            ProjectError::NotAnArray => write!(f, "property value is not an array"),
            ProjectError::SpliceOutOfRange => write!(f, "splice range out of bounds"),
            ProjectError::InvalidElementId => write!(f, "invalid element id"),
        }
    }
}

impl std::error::Error for ProjectError {}

#[derive(Debug, Clone)]
pub struct Element {
    id: CompactString,
    name: CompactString,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    properties: BTreeMap<CompactString, Value>,
}

impl Element {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// 项目文档形式（嵌套元素树），用于加载与导出
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElementDoc {
    pub id: CompactString,
    pub name: CompactString,
    #[serde(default)]
    pub properties: BTreeMap<CompactString, Value>,
    #[serde(default)]
    pub children: Vec<ElementDoc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectDoc {
    pub id: CompactString,
    pub name: CompactString,
    pub root: ElementDoc,
}

pub struct Project {
    id: CompactString,
    name: CompactString,
    arena: SlotMap<ElementId, Element>,
    root: ElementId,
    by_id: FxHashMap<CompactString, ElementId>,
}

impl Project {
    /// 新建空项目，根元素 id 固定为 "root"
    pub fn new(id: impl Into<CompactString>, name: impl Into<CompactString>) -> Self {
        let id = id.into();
        let name = name.into();
        let mut arena = SlotMap::with_key();
        let root = arena.insert(Element {
            id: CompactString::from("root"),
            name: name.clone(),
            parent: None,
            children: Vec::new(),
            properties: BTreeMap::new(),
        });

        let mut by_id = FxHashMap::default();
        by_id.insert(CompactString::from("root"), root);

        Self {
            id,
            name,
            arena,
            root,
            by_id,
        }
    }

    pub fn from_document(doc: ProjectDoc) -> Result<Self, ProjectError> {
        let mut arena = SlotMap::with_key();
        let root = arena.insert(Element {
            id: doc.root.id.clone(),
            name: doc.root.name.clone(),
            parent: None,
            children: Vec::new(),
            properties: doc.root.properties.clone(),
        });

        let mut by_id = FxHashMap::default();
        by_id.insert(doc.root.id.clone(), root);

        let mut project = Self {
            id: doc.id,
            name: doc.name,
            arena,
            root,
            by_id,
        };
        for child in doc.root.children {
            project.insert_subtree(root, child)?;
        }
        Ok(project)
    }

    pub fn to_document(&self) -> ProjectDoc {
        ProjectDoc {
            id: self.id.clone(),
            name: self.name.clone(),
            root: self.subtree_doc(self.root),
        }
    }

    fn subtree_doc(&self, id: ElementId) -> ElementDoc {
        let element = &self.arena[id];
        ElementDoc {
            id: element.id.clone(),
            name: element.name.clone(),
            properties: element.properties.clone(),
            children: element
                .children
                .iter()
                .map(|&child| self.subtree_doc(child))
                .collect(),
        }
    }

    fn insert_subtree(&mut self, parent: ElementId, doc: ElementDoc) -> Result<(), ProjectError> {
        let id = self.insert_child_with_properties(parent, doc.id, doc.name, doc.properties)?;
        for child in doc.children {
            self.insert_subtree(id, child)?;
        }
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.arena.get(id)
    }

    /// 按字符串 id 查元素
    pub fn lookup(&self, object_id: &str) -> Option<ElementId> {
        self.by_id.get(object_id).copied()
    }

    pub fn insert_child(
        &mut self,
        parent: ElementId,
        id: impl Into<CompactString>,
        name: impl Into<CompactString>,
    ) -> Result<ElementId, ProjectError> {
        self.insert_child_with_properties(parent, id.into(), name.into(), BTreeMap::new())
    }

    fn insert_child_with_properties(
        &mut self,
        parent: ElementId,
        id: CompactString,
        name: CompactString,
        properties: BTreeMap<CompactString, Value>,
    ) -> Result<ElementId, ProjectError> {
        if !self.arena.contains_key(parent) {
            return Err(ProjectError::InvalidElementId);
        }
        if self.by_id.contains_key(&id) {
            return Err(ProjectError::DuplicateId);
        }

        let element_id = self.arena.insert(Element {
            id: id.clone(),
            name,
            parent: Some(parent),
            children: Vec::new(),
            properties,
        });
        self.arena[parent].children.push(element_id);
        self.by_id.insert(id, element_id);
        Ok(element_id)
    }

    /// 元素在项目树内的路径：从根到该元素的 id，以 '/' 连接
    pub fn path_of(&self, id: ElementId) -> CompactString {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(element_id) = current {
            match self.arena.get(element_id) {
                Some(element) => {
                    segments.push(element.id.as_str());
                    current = element.parent;
                }
                None => break,
            }
        }
        segments.reverse();
        CompactString::from(segments.join("/"))
    }

    pub fn element_at_path(&self, path: &str) -> Option<ElementId> {
        let mut segments = path.split('/');
        let root_segment = segments.next()?;
        if self.arena[self.root].id != root_segment {
            return None;
        }

        let mut current = self.root;
        for segment in segments {
            let next = self.arena[current]
                .children
                .iter()
                .copied()
                .find(|&child| self.arena[child].id == segment)?;
            current = next;
        }
        Some(current)
    }

    fn record_for(&self, id: ElementId, change: Change) -> ChangeRecord {
        ChangeRecord {
            project_id: self.id.clone(),
            path: self.path_of(id),
            change,
        }
    }

    /// 修改已有属性，返回描述记录
    pub fn set_property(
        &mut self,
        id: ElementId,
        name: &str,
        new_value: Value,
    ) -> Result<ChangeRecord, ProjectError> {
        let element = self.arena.get_mut(id).ok_or(ProjectError::InvalidElementId)?;
        let object = element.id.clone();
        let old_value = element
            .properties
            .get(name)
            .cloned()
            .ok_or(ProjectError::UnknownProperty)?;
        element
            .properties
            .insert(CompactString::from(name), new_value.clone());

        Ok(self.record_for(
            id,
            Change::Update {
                object,
                name: CompactString::from(name),
                old_value,
                new_value,
            },
        ))
    }

    /// 新增属性，返回描述记录
    pub fn add_property(
        &mut self,
        id: ElementId,
        name: &str,
        new_value: Value,
    ) -> Result<ChangeRecord, ProjectError> {
        let element = self.arena.get_mut(id).ok_or(ProjectError::InvalidElementId)?;
        if element.properties.contains_key(name) {
            return Err(ProjectError::PropertyExists);
        }
        let object = element.id.clone();
        element
            .properties
            .insert(CompactString::from(name), new_value.clone());

        Ok(self.record_for(
            id,
            Change::Add {
                object,
                name: CompactString::from(name),
                new_value,
                index: None,
            },
        ))
    }

    /// 删除属性，返回描述记录
    pub fn remove_property(
        &mut self,
        id: ElementId,
        name: &str,
    ) -> Result<ChangeRecord, ProjectError> {
        let element = self.arena.get_mut(id).ok_or(ProjectError::InvalidElementId)?;
        let object = element.id.clone();
        let old_value = element
            .properties
            .remove(name)
            .ok_or(ProjectError::UnknownProperty)?;

        Ok(self.record_for(
            id,
            Change::Delete {
                object,
                name: CompactString::from(name),
                old_value,
                index: None,
            },
        ))
    }

    /// 对数组属性做有序拼接修改（替换 [index, index+remove) 为 added）
    pub fn splice_property(
        &mut self,
        id: ElementId,
        name: &str,
        index: usize,
        remove: usize,
        added: Vec<Value>,
    ) -> Result<ChangeRecord, ProjectError> {
        let element = self.arena.get_mut(id).ok_or(ProjectError::InvalidElementId)?;
        let object = element.id.clone();
        let value = element
            .properties
            .get_mut(name)
            .ok_or(ProjectError::UnknownProperty)?;
        let items = value.as_array_mut().ok_or(ProjectError::NotAnArray)?;

        let end = index
            .checked_add(remove)
            .ok_or(ProjectError::SpliceOutOfRange)?;
        if end > items.len() {
            return Err(ProjectError::SpliceOutOfRange);
        }
        let removed: Vec<Value> = items.splice(index..end, added.iter().cloned()).collect();

        Ok(self.record_for(
            id,
            Change::Splice {
                object,
                name: CompactString::from(name),
                index,
                removed,
                added,
            },
        ))
    }

    /// 将一条变更记录应用到活状态（undo/redo 与回放的应用路径）
    pub fn apply(&mut self, record: &ChangeRecord) -> Result<(), ProjectError> {
        let id = self
            .lookup(record.change.object())
            .ok_or(ProjectError::UnknownObject)?;
        let element = self.arena.get_mut(id).ok_or(ProjectError::InvalidElementId)?;

        match &record.change {
            Change::Update {
                name, new_value, ..
            } => {
                let slot = element
                    .properties
                    .get_mut(name.as_str())
                    .ok_or(ProjectError::UnknownProperty)?;
                *slot = new_value.clone();
            }
            Change::Add {
                name, new_value, ..
            } => {
                if element.properties.contains_key(name.as_str()) {
                    return Err(ProjectError::PropertyExists);
                }
                element.properties.insert(name.clone(), new_value.clone());
            }
            Change::Delete { name, .. } => {
                element
                    .properties
                    .remove(name.as_str())
                    .ok_or(ProjectError::UnknownProperty)?;
            }
            Change::Splice {
                name,
                index,
                removed,
                added,
                ..
            } => {
                let value = element
                    .properties
                    .get_mut(name.as_str())
                    .ok_or(ProjectError::UnknownProperty)?;
                let items = value.as_array_mut().ok_or(ProjectError::NotAnArray)?;
                let end = index
                    .checked_add(removed.len())
                    .ok_or(ProjectError::SpliceOutOfRange)?;
                if end > items.len() {
                    return Err(ProjectError::SpliceOutOfRange);
                }
                items.splice(*index..end, added.iter().cloned());
            }
        }
        Ok(())
    }
}
