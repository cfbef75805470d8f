//! model - 文档模型适配层
//!
//! 宿主文档引擎的只读类型/包元数据视图

mod snapshot;
mod types;
mod view;

pub use snapshot::{DocModel, ModelError, ModelSnapshot, Result};
pub use types::{DocTag, FieldDoc, MemberUse, MethodDoc, PackageDoc, TypeDoc, TypeKind};
pub use view::{HiddenRules, ModelView};
