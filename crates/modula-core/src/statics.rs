//! Direct-access proxies for dynamically registered modules.
//!
//! A [`StaticsBundle`] lets callers treat a module living in a store like a
//! plain object: read state fields and getters, commit mutations and dispatch
//! actions without spelling out `namespace/name` paths. Every proxy reads or
//! forwards at call time; nothing is cached and nothing is retried.

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::descriptor::ModuleDescriptor;
use crate::error::{MemberSection, ModuleError};
use crate::options::DynamicModuleOptions;
use crate::store::{ActionFuture, Store, namespaced_path};

thread_local! {
    static ATTACHED: RefCell<HashMap<TypeId, Rc<StaticsBundle>>> = RefCell::new(HashMap::new());
}

/// Reads `store.state[namespace][field]`.
#[derive(Clone)]
pub struct StateProxy {
    namespace: String,
    field: String,
    store: Rc<dyn Store>,
}

impl StateProxy {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn get(&self) -> Option<Value> {
        let state = self.store.state(&self.namespace)?;
        state.get(&self.field).cloned()
    }
}

/// Reads `store.getters["namespace/name"]`.
#[derive(Clone)]
pub struct GetterProxy {
    path: String,
    store: Rc<dyn Store>,
}

impl GetterProxy {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn get(&self) -> anyhow::Result<Option<Value>> {
        self.store.getter(&self.path)
    }
}

/// Forwards to `store.commit("namespace/name", payload)`.
#[derive(Clone)]
pub struct MutationProxy {
    path: String,
    store: Rc<dyn Store>,
}

impl MutationProxy {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn call(&self, payload: Value) -> anyhow::Result<()> {
        log::trace!("commit {}", self.path);
        self.store.commit(&self.path, payload)
    }
}

/// Forwards to `store.dispatch("namespace/name", payload)` and hands back the
/// store's future as is.
#[derive(Clone)]
pub struct ActionProxy {
    path: String,
    store: Rc<dyn Store>,
}

impl ActionProxy {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn call(&self, payload: Value) -> ActionFuture {
        log::trace!("dispatch {}", self.path);
        self.store.dispatch(&self.path, payload)
    }
}

/// All proxies of one dynamically registered module. Built once, never changed.
pub struct StaticsBundle {
    namespace: String,
    state: BTreeMap<String, StateProxy>,
    getters: BTreeMap<String, GetterProxy>,
    mutations: BTreeMap<String, MutationProxy>,
    actions: BTreeMap<String, ActionProxy>,
}

impl StaticsBundle {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn state(&self, field: &str) -> Option<&StateProxy> {
        self.state.get(field)
    }

    pub fn getter(&self, name: &str) -> Option<&GetterProxy> {
        self.getters.get(name)
    }

    pub fn mutation(&self, name: &str) -> Option<&MutationProxy> {
        self.mutations.get(name)
    }

    pub fn action(&self, name: &str) -> Option<&ActionProxy> {
        self.actions.get(name)
    }

    pub fn state_fields(&self) -> impl Iterator<Item = &str> {
        self.state.keys().map(String::as_str)
    }

    pub fn getter_names(&self) -> impl Iterator<Item = &str> {
        self.getters.keys().map(String::as_str)
    }

    pub fn mutation_names(&self) -> impl Iterator<Item = &str> {
        self.mutations.keys().map(String::as_str)
    }

    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    /// Current value of a state field, decoded as `T`.
    ///
    /// `Ok(None)` when the store has no value for the field right now.
    pub fn get<T: DeserializeOwned>(&self, field: &str) -> Result<Option<T>, ModuleError> {
        let proxy = self
            .state(field)
            .ok_or_else(|| self.unknown(MemberSection::State, field))?;
        match proxy.get() {
            Some(v) => Ok(Some(serde_json::from_value(v)?)),
            None => Ok(None),
        }
    }

    pub fn getter_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ModuleError> {
        let proxy = self
            .getter(name)
            .ok_or_else(|| self.unknown(MemberSection::Getter, name))?;
        match proxy.get()? {
            Some(v) => Ok(Some(serde_json::from_value(v)?)),
            None => Ok(None),
        }
    }

    pub fn commit<P: Serialize>(&self, name: &str, payload: P) -> Result<(), ModuleError> {
        let proxy = self
            .mutation(name)
            .ok_or_else(|| self.unknown(MemberSection::Mutation, name))?;
        proxy.call(serde_json::to_value(payload)?)?;
        Ok(())
    }

    pub fn dispatch<P: Serialize>(
        &self,
        name: &str,
        payload: P,
    ) -> Result<ActionFuture, ModuleError> {
        let proxy = self
            .action(name)
            .ok_or_else(|| self.unknown(MemberSection::Action, name))?;
        Ok(proxy.call(serde_json::to_value(payload)?))
    }

    /// Dispatches and decodes the action's result as `T`.
    pub async fn dispatch_as<T, P>(&self, name: &str, payload: P) -> Result<T, ModuleError>
    where
        T: DeserializeOwned,
        P: Serialize,
    {
        let value = self.dispatch(name, payload)?.await?;
        Ok(serde_json::from_value(value)?)
    }

    fn unknown(&self, kind: MemberSection, name: &str) -> ModuleError {
        ModuleError::UnknownMember {
            kind,
            namespace: self.namespace.clone(),
            name: name.to_owned(),
        }
    }
}

impl fmt::Debug for StaticsBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticsBundle")
            .field("namespace", &self.namespace)
            .field("state", &self.state.keys().collect::<Vec<_>>())
            .field("getters", &self.getters.keys().collect::<Vec<_>>())
            .field("mutations", &self.mutations.keys().collect::<Vec<_>>())
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builds the proxies for a complete descriptor about to be registered under
/// `options.name`. Sections the descriptor lacks get no proxies.
pub fn synthesize_statics(
    descriptor: &ModuleDescriptor,
    options: &DynamicModuleOptions,
) -> Result<StaticsBundle, ModuleError> {
    let namespace = options.name.clone();
    let store = &options.store;

    let state = match &descriptor.state {
        Some(source) => state_proxies(&namespace, &source.produce()?, store),
        None => BTreeMap::new(),
    };

    let getters = section(descriptor.getters.as_ref(), &namespace, |path| GetterProxy {
        path,
        store: store.clone(),
    });
    let mutations = section(descriptor.mutations.as_ref(), &namespace, |path| MutationProxy {
        path,
        store: store.clone(),
    });
    let actions = section(descriptor.actions.as_ref(), &namespace, |path| ActionProxy {
        path,
        store: store.clone(),
    });

    Ok(StaticsBundle {
        namespace,
        state,
        getters,
        mutations,
        actions,
    })
}

fn section<T, P>(
    tree: Option<&BTreeMap<String, T>>,
    namespace: &str,
    mut proxy: impl FnMut(String) -> P,
) -> BTreeMap<String, P> {
    tree.into_iter()
        .flat_map(|t| t.keys())
        .map(|name| (name.clone(), proxy(namespaced_path(namespace, name))))
        .collect()
}

// One proxy per top-level field; a non-object state has none.
fn state_proxies(
    namespace: &str,
    state: &Value,
    store: &Rc<dyn Store>,
) -> BTreeMap<String, StateProxy> {
    let Some(fields) = state.as_object() else {
        return BTreeMap::new();
    };
    fields
        .keys()
        .map(|field| {
            let proxy = StateProxy {
                namespace: namespace.to_owned(),
                field: field.clone(),
                store: store.clone(),
            };
            (field.clone(), proxy)
        })
        .collect()
}

/// Associates `bundle` with `C`. Callers check [`is_attached`] first; an
/// existing bundle is never replaced.
pub(crate) fn attach<C: 'static>(bundle: Rc<StaticsBundle>) {
    ATTACHED.with(|t| {
        t.borrow_mut().entry(TypeId::of::<C>()).or_insert(bundle);
    })
}

pub(crate) fn is_attached<C: 'static>() -> bool {
    ATTACHED.with(|t| t.borrow().contains_key(&TypeId::of::<C>()))
}

/// Statics attached to `C` by dynamic registration on this thread.
pub fn statics_of<C: 'static>() -> Option<Rc<StaticsBundle>> {
    ATTACHED.with(|t| t.borrow().get(&TypeId::of::<C>()).cloned())
}
