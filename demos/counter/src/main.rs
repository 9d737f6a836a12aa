use std::rc::Rc;

use modula_core::prelude::*;
use modula_macros::store_module;

mod store;

use store::MemoryStore;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Counter {
    count: i64,
    history: Vec<i64>,
}

#[store_module]
impl Counter {
    #[getter]
    fn doubled(&self) -> i64 {
        self.count * 2
    }

    #[getter(name = "lastChange")]
    fn last_change(&self) -> Option<i64> {
        self.history.last().copied()
    }

    #[mutation]
    fn increment(&mut self, delta: i64) {
        self.count += delta;
        self.history.push(delta);
    }

    #[action(name = "incrementTwice")]
    async fn increment_twice(ctx: Rc<dyn ActionContext>, delta: i64) -> anyhow::Result<i64> {
        ctx.commit_with("increment", delta)?;
        ctx.commit_with("increment", delta)?;
        let me: Counter = ctx.state_as()?;
        Ok(me.count)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let store = MemoryStore::new();
    let handle: Rc<dyn Store> = store.clone();
    configure(ModuleOptions::new().namespaced(true).dynamic("counter", handle))
        .register::<Counter>()?;

    let counter =
        statics_of::<Counter>().ok_or_else(|| anyhow::anyhow!("counter not attached"))?;

    counter.commit("increment", 5)?;
    let total: i64 = pollster::block_on(counter.dispatch_as("incrementTwice", 3))?;

    println!("count       = {}", counter.get::<i64>("count")?.unwrap_or_default());
    println!("doubled     = {}", counter.getter_as::<i64>("doubled")?.unwrap_or_default());
    println!("last change = {:?}", counter.getter_as::<Option<i64>>("lastChange")?.flatten());
    println!("action said = {total}");
    println!("store state = {}", store.snapshot());
    Ok(())
}
