//! alva - 设计文档编辑引擎库
//!
//! 模块结构：
//! - models: 数据模型（ChangeRecord, EditHistory, Project）
//! - session: 会话层（DocumentSession，驱动 record/commit/undo/redo）
//! - replay: 变更脚本回放工具
//! - logging: tracing 初始化（由可执行入口调用）

pub mod logging;
pub mod models;
pub mod replay;
pub mod session;
