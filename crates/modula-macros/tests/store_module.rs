use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use modula_core::*;
use modula_macros::store_module;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Counter {
    count: i64,
    step: i64,
}

#[store_module]
impl Counter {
    #[getter]
    fn doubled(&self) -> i64 {
        self.count * 2
    }

    #[getter(name = "isZero")]
    fn is_zero(&self) -> bool {
        self.count == 0
    }

    #[setter]
    fn set_step(&mut self, step: i64) {
        self.step = step;
    }

    #[mutation]
    fn increment(&mut self, delta: i64) {
        self.count += delta;
    }

    #[mutation]
    fn reset(&mut self) {
        self.count = 0;
    }

    #[action(name = "fetchTotal")]
    async fn fetch_total(ctx: Rc<dyn ActionContext>, bonus: i64) -> anyhow::Result<i64> {
        let me: Counter = ctx.state_as()?;
        Ok(me.count + bonus)
    }

    #[action]
    async fn ping(_ctx: Rc<dyn ActionContext>) -> anyhow::Result<&'static str> {
        Ok("pong")
    }

    fn describe(&self) -> String {
        format!("{} by {}", self.count, self.step)
    }

    fn helper() -> i64 {
        7
    }
}

#[test]
fn test_members_are_classified() {
    let proto = Counter::prototype();
    let getters: Vec<_> = proto.iter().filter(|m| m.is_getter()).map(|m| m.name).collect();
    assert_eq!(getters, vec!["doubled", "isZero"]);

    let setters: Vec<_> = proto
        .iter()
        .filter(|m| matches!(m.kind, MemberKind::Setter))
        .map(|m| m.name)
        .collect();
    assert_eq!(setters, vec!["set_step"]);

    let methods: Vec<_> = proto
        .iter()
        .filter(|m| matches!(m.kind, MemberKind::Method))
        .map(|m| m.name)
        .collect();
    assert_eq!(methods, vec!["increment", "reset", "describe"]);

    // untouched by the macro
    assert_eq!(Counter::helper(), 7);
    assert_eq!(Counter::default().describe(), "0 by 0");
}

#[test]
fn test_getters_extracted_from_accessors() {
    let def = register_default::<Counter>().unwrap();
    let getters = def.descriptor().getters.as_ref().unwrap();
    assert_eq!(getters.keys().collect::<Vec<_>>(), vec!["doubled", "isZero"]);

    let state = json!({ "count": 21, "step": 1 });
    assert_eq!(getters["doubled"](&state).unwrap(), json!(42));
    assert_eq!(getters["isZero"](&state).unwrap(), json!(false));
}

#[test]
fn test_mutations_run_against_state_tree() {
    let def = register_default::<Counter>().unwrap();
    let mutations = def.descriptor().mutations.as_ref().unwrap();
    assert_eq!(mutations.keys().collect::<Vec<_>>(), vec!["increment", "reset"]);

    let mut state = json!({ "count": 1, "step": 1 });
    mutations["increment"](&mut state, json!(4)).unwrap();
    assert_eq!(state["count"], json!(5));
    mutations["reset"](&mut state, Value::Null).unwrap();
    assert_eq!(state["count"], json!(0));
}

#[test]
fn test_bad_payload_leaves_state_alone() {
    let def = register_default::<Counter>().unwrap();
    let increment = &def.descriptor().mutations.as_ref().unwrap()["increment"];

    let mut state = json!({ "count": 1, "step": 1 });
    assert!(increment(&mut state, json!("four")).is_err());
    assert_eq!(state, json!({ "count": 1, "step": 1 }));
}

struct FixedContext(Value);

impl ActionContext for FixedContext {
    fn state(&self) -> Value {
        self.0.clone()
    }
    fn getter(&self, _name: &str) -> anyhow::Result<Option<Value>> {
        Ok(None)
    }
    fn commit(&self, _mutation: &str, _payload: Value) -> anyhow::Result<()> {
        Ok(())
    }
    fn dispatch(&self, _action: &str, _payload: Value) -> ActionFuture {
        Box::pin(std::future::ready(Ok::<Value, anyhow::Error>(Value::Null)))
    }
}

#[test]
fn test_actions_named_and_wrapped() {
    let def = register_default::<Counter>().unwrap();
    let actions = def.descriptor().actions.as_ref().unwrap();
    assert_eq!(actions.keys().collect::<Vec<_>>(), vec!["fetchTotal", "ping"]);

    let ctx: Rc<dyn ActionContext> = Rc::new(FixedContext(json!({ "count": 40, "step": 1 })));
    let total = pollster::block_on(actions["fetchTotal"](ctx.clone(), json!(2))).unwrap();
    assert_eq!(total, json!(42));

    let pong = pollster::block_on(actions["ping"](ctx, Value::Null)).unwrap();
    assert_eq!(pong, json!("pong"));
}

/// Just enough store to route proxy calls through registered descriptors.
#[derive(Default)]
struct TinyStore {
    modules: RefCell<HashMap<String, (ModuleDescriptor, Value)>>,
}

impl Store for TinyStore {
    fn state(&self, namespace: &str) -> Option<Value> {
        self.modules.borrow().get(namespace).map(|(_, s)| s.clone())
    }

    fn getter(&self, path: &str) -> anyhow::Result<Option<Value>> {
        let (ns, name) = path.split_once('/').unwrap_or(("", path));
        let modules = self.modules.borrow();
        let Some((d, state)) = modules.get(ns) else {
            return Ok(None);
        };
        match d.getters.as_ref().and_then(|g| g.get(name)) {
            Some(g) => Ok(Some(g(state)?)),
            None => Ok(None),
        }
    }

    fn commit(&self, path: &str, payload: Value) -> anyhow::Result<()> {
        let (ns, name) = path.split_once('/').unwrap_or(("", path));
        let mut modules = self.modules.borrow_mut();
        let (d, state) = modules
            .get_mut(ns)
            .ok_or_else(|| anyhow::anyhow!("unknown module {ns}"))?;
        let m = d
            .mutations
            .as_ref()
            .and_then(|t| t.get(name))
            .ok_or_else(|| anyhow::anyhow!("unknown mutation {path}"))?;
        m(state, payload)
    }

    fn dispatch(&self, path: &str, payload: Value) -> ActionFuture {
        let (ns, name) = path.split_once('/').unwrap_or(("", path));
        let modules = self.modules.borrow();
        let found = modules
            .get(ns)
            .and_then(|(d, s)| Some((d.actions.as_ref()?.get(name)?.clone(), s.clone())));
        match found {
            Some((action, state)) => action(Rc::new(FixedContext(state)), payload),
            None => Box::pin(std::future::ready(Err::<Value, anyhow::Error>(
                anyhow::anyhow!("unknown action {path}"),
            ))),
        }
    }

    fn register_module(&self, name: &str, descriptor: &ModuleDescriptor) -> anyhow::Result<()> {
        let state = descriptor
            .state
            .as_ref()
            .map(StateSource::produce)
            .transpose()?
            .unwrap_or_default();
        self.modules
            .borrow_mut()
            .insert(name.to_owned(), (descriptor.clone(), state));
        Ok(())
    }
}

#[test]
fn test_dynamic_module_through_statics() {
    let store: Rc<dyn Store> = Rc::new(TinyStore::default());
    configure(ModuleOptions::new().namespaced(true).dynamic("counter", store))
        .register::<Counter>()
        .unwrap();

    let counter = statics_of::<Counter>().unwrap();
    assert_eq!(counter.get::<i64>("count").unwrap(), Some(0));

    counter.commit("increment", 5).unwrap();
    assert_eq!(counter.get::<i64>("count").unwrap(), Some(5));
    assert_eq!(counter.getter_as::<i64>("doubled").unwrap(), Some(10));
    assert_eq!(counter.getter_as::<bool>("isZero").unwrap(), Some(false));

    let total: i64 = pollster::block_on(counter.dispatch_as("fetchTotal", 37)).unwrap();
    assert_eq!(total, 42);

    counter.commit("reset", ()).unwrap();
    assert_eq!(counter.get::<i64>("count").unwrap(), Some(0));
}
