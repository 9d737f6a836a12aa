use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::descriptor::ModuleDescriptor;

/// What an action (and therefore `Store::dispatch`) resolves to.
pub type ActionFuture = Pin<Box<dyn Future<Output = anyhow::Result<Value>>>>;

pub const NAMESPACE_SEPARATOR: char = '/';

/// Joins a namespace and a member name into a store path (`"counter/increment"`).
///
/// Only one namespace level is supported; nested module paths are not built here.
pub fn namespaced_path(namespace: &str, member: &str) -> String {
    format!("{namespace}{NAMESPACE_SEPARATOR}{member}")
}

/// The reactive store, seen from the registration layer.
///
/// Only these five operations are ever used. The store is passed around
/// explicitly as `Rc<dyn Store>`; there is no global instance.
pub trait Store {
    /// Current state of the module registered under `namespace`.
    fn state(&self, namespace: &str) -> Option<Value>;

    /// Value of the getter addressed by `path` (`"namespace/name"`).
    fn getter(&self, path: &str) -> anyhow::Result<Option<Value>>;

    fn commit(&self, path: &str, payload: Value) -> anyhow::Result<()>;

    fn dispatch(&self, path: &str, payload: Value) -> ActionFuture;

    fn register_module(&self, name: &str, descriptor: &ModuleDescriptor) -> anyhow::Result<()>;
}

/// Module-local view of the store handed to every action.
///
/// Names are local to the module: `commit("increment", ..)` inside the
/// `counter` module addresses `counter/increment`.
pub trait ActionContext {
    fn state(&self) -> Value;
    fn getter(&self, name: &str) -> anyhow::Result<Option<Value>>;
    fn commit(&self, mutation: &str, payload: Value) -> anyhow::Result<()>;
    fn dispatch(&self, action: &str, payload: Value) -> ActionFuture;
}

impl dyn ActionContext {
    pub fn state_as<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        Ok(serde_json::from_value(self.state())?)
    }

    pub fn getter_as<T: DeserializeOwned>(&self, name: &str) -> anyhow::Result<Option<T>> {
        match self.getter(name)? {
            Some(v) => Ok(Some(serde_json::from_value(v)?)),
            None => Ok(None),
        }
    }

    pub fn commit_with<P: Serialize>(&self, mutation: &str, payload: P) -> anyhow::Result<()> {
        self.commit(mutation, serde_json::to_value(payload)?)
    }

    pub fn dispatch_with<P: Serialize>(&self, action: &str, payload: P) -> ActionFuture {
        match serde_json::to_value(payload) {
            Ok(payload) => self.dispatch(action, payload),
            Err(err) => Box::pin(std::future::ready(Err::<Value, anyhow::Error>(err.into()))),
        }
    }
}
