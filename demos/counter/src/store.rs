use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use anyhow::{Context, anyhow, bail};
use modula_core::{ActionContext, ActionFuture, ModuleDescriptor, Store, namespaced_path};
use serde_json::Value;

struct Entry {
    descriptor: ModuleDescriptor,
    state: Value,
}

/// Minimal single-threaded store: one state value per namespace, getters
/// evaluated on read, no subscriptions.
pub struct MemoryStore {
    this: Weak<MemoryStore>,
    modules: RefCell<BTreeMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|this| MemoryStore {
            this: this.clone(),
            modules: RefCell::new(BTreeMap::new()),
        })
    }

    pub fn snapshot(&self) -> Value {
        let modules = self.modules.borrow();
        Value::Object(
            modules
                .iter()
                .map(|(name, e)| (name.clone(), e.state.clone()))
                .collect(),
        )
    }

    fn split(path: &str) -> anyhow::Result<(&str, &str)> {
        path.split_once('/')
            .ok_or_else(|| anyhow!("'{path}' is not a namespaced path"))
    }
}

impl Store for MemoryStore {
    fn state(&self, namespace: &str) -> Option<Value> {
        self.modules.borrow().get(namespace).map(|e| e.state.clone())
    }

    fn getter(&self, path: &str) -> anyhow::Result<Option<Value>> {
        let (ns, name) = Self::split(path)?;
        let modules = self.modules.borrow();
        let Some(entry) = modules.get(ns) else {
            return Ok(None);
        };
        match entry.descriptor.getters.as_ref().and_then(|g| g.get(name)) {
            Some(getter) => Ok(Some(getter(&entry.state)?)),
            None => Ok(None),
        }
    }

    fn commit(&self, path: &str, payload: Value) -> anyhow::Result<()> {
        let (ns, name) = Self::split(path)?;
        let mut modules = self.modules.borrow_mut();
        let entry = modules
            .get_mut(ns)
            .ok_or_else(|| anyhow!("unknown mutation type: {path}"))?;
        let mutation = entry
            .descriptor
            .mutations
            .as_ref()
            .and_then(|t| t.get(name))
            .cloned()
            .ok_or_else(|| anyhow!("unknown mutation type: {path}"))?;
        log::debug!("commit {path} {payload}");
        mutation(&mut entry.state, payload).with_context(|| format!("mutation {path} failed"))
    }

    fn dispatch(&self, path: &str, payload: Value) -> ActionFuture {
        let found = Self::split(path).and_then(|(ns, name)| {
            let modules = self.modules.borrow();
            let action = modules
                .get(ns)
                .and_then(|e| e.descriptor.actions.as_ref())
                .and_then(|t| t.get(name))
                .cloned()
                .ok_or_else(|| anyhow!("unknown action type: {path}"))?;
            let store = self.this.upgrade().ok_or_else(|| anyhow!("store dropped"))?;
            Ok((action, ns.to_owned(), store))
        });
        match found {
            Ok((action, namespace, store)) => {
                log::debug!("dispatch {path} {payload}");
                let ctx: Rc<dyn ActionContext> = Rc::new(ModuleContext { store, namespace });
                action(ctx, payload)
            }
            Err(err) => Box::pin(std::future::ready(Err::<Value, anyhow::Error>(err))),
        }
    }

    fn register_module(&self, name: &str, descriptor: &ModuleDescriptor) -> anyhow::Result<()> {
        let mut modules = self.modules.borrow_mut();
        if modules.contains_key(name) {
            bail!("duplicate module name: {name}");
        }
        let state = match &descriptor.state {
            Some(source) => source.produce()?,
            None => Value::Object(Default::default()),
        };
        log::info!("registered module '{name}'");
        modules.insert(
            name.to_owned(),
            Entry {
                descriptor: descriptor.clone(),
                state,
            },
        );
        Ok(())
    }
}

/// What an action sees: the store, scoped to its own module.
struct ModuleContext {
    store: Rc<MemoryStore>,
    namespace: String,
}

impl ActionContext for ModuleContext {
    fn state(&self) -> Value {
        self.store.state(&self.namespace).unwrap_or_default()
    }

    fn getter(&self, name: &str) -> anyhow::Result<Option<Value>> {
        self.store.getter(&namespaced_path(&self.namespace, name))
    }

    fn commit(&self, mutation: &str, payload: Value) -> anyhow::Result<()> {
        self.store
            .commit(&namespaced_path(&self.namespace, mutation), payload)
    }

    fn dispatch(&self, action: &str, payload: Value) -> ActionFuture {
        self.store
            .dispatch(&namespaced_path(&self.namespace, action), payload)
    }
}
