use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::store::{ActionContext, ActionFuture};

/// `(moduleState) -> value`
pub type GetterFn = Rc<dyn Fn(&Value) -> anyhow::Result<Value>>;
/// Mutates module state in place with one payload.
pub type MutationFn = Rc<dyn Fn(&mut Value, Value) -> anyhow::Result<()>>;
pub type ActionFn = Rc<dyn Fn(Rc<dyn ActionContext>, Value) -> ActionFuture>;
pub type StateFactory = Rc<dyn Fn() -> anyhow::Result<Value>>;

pub type GetterTree = BTreeMap<String, GetterFn>;
pub type MutationTree = BTreeMap<String, MutationFn>;
pub type ActionTree = BTreeMap<String, ActionFn>;

/// Where a module's initial state comes from.
#[derive(Clone)]
pub enum StateSource {
    /// One shared, eagerly built instance.
    Instance(Value),
    /// Invoked by the store per instantiation (several stores, hot reload).
    Factory(StateFactory),
}

impl StateSource {
    pub fn produce(&self) -> anyhow::Result<Value> {
        match self {
            StateSource::Instance(v) => Ok(v.clone()),
            StateSource::Factory(f) => f(),
        }
    }

    pub fn is_factory(&self) -> bool {
        matches!(self, StateSource::Factory(_))
    }
}

impl fmt::Debug for StateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateSource::Instance(v) => f.debug_tuple("Instance").field(v).finish(),
            StateSource::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// The record a store registers: state, getters, mutations, actions and the
/// namespacing flag.
///
/// Sections are `None` when the module doesn't declare them. After
/// registration `state` and `getters` are always `Some`.
#[derive(Clone, Default)]
pub struct ModuleDescriptor {
    pub state: Option<StateSource>,
    pub getters: Option<GetterTree>,
    pub mutations: Option<MutationTree>,
    pub actions: Option<ActionTree>,
    pub namespaced: bool,
}

impl ModuleDescriptor {
    pub fn getter_names(&self) -> impl Iterator<Item = &str> {
        self.getters.iter().flat_map(|t| t.keys().map(String::as_str))
    }

    pub fn mutation_names(&self) -> impl Iterator<Item = &str> {
        self.mutations.iter().flat_map(|t| t.keys().map(String::as_str))
    }

    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().flat_map(|t| t.keys().map(String::as_str))
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("state", &self.state)
            .field("getters", &self.getters.as_ref().map(|t| t.keys().collect::<Vec<_>>()))
            .field("mutations", &self.mutations.as_ref().map(|t| t.keys().collect::<Vec<_>>()))
            .field("actions", &self.actions.as_ref().map(|t| t.keys().collect::<Vec<_>>()))
            .field("namespaced", &self.namespaced)
            .finish()
    }
}
