pub use crate::class::{Member, MemberKind, ModuleClass, ModuleDefinition, action, mutation};
pub use crate::descriptor::{
    ActionTree, GetterTree, ModuleDescriptor, MutationTree, StateSource,
};
pub use crate::error::ModuleError;
pub use crate::options::{DynamicModuleOptions, ModuleConfig, ModuleOptions};
pub use crate::register::{Registered, Registrar, configure, register_default};
pub use crate::statics::{StaticsBundle, statics_of};
pub use crate::store::{ActionContext, ActionFuture, Store};
pub use serde::{Deserialize, Serialize};
