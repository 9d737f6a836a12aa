use std::rc::Rc;

use crate::class::ModuleClass;
use crate::descriptor::{ModuleDescriptor, StateFactory, StateSource};
use crate::error::ModuleError;
use crate::options::ModuleOptions;

/// `|| new C()`: a fresh default instance, as a state value.
pub fn state_factory<C: ModuleClass>() -> StateFactory {
    Rc::new(|| -> anyhow::Result<serde_json::Value> {
        Ok(serde_json::to_value(C::default())?)
    })
}

/// Fills in `state` unless the definition already declares one.
///
/// With `state_factory` the factory itself becomes the state, otherwise it is
/// invoked once and the instance is stored.
pub fn materialize<C: ModuleClass>(
    descriptor: &mut ModuleDescriptor,
    options: &ModuleOptions,
) -> Result<(), ModuleError> {
    if descriptor.state.is_some() {
        log::trace!("{}: keeping declared state", std::any::type_name::<C>());
        return Ok(());
    }

    let factory = state_factory::<C>();
    let source = if options.state_factory {
        StateSource::Factory(factory)
    } else {
        StateSource::Instance(factory()?)
    };
    descriptor.state = Some(source);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Todo {
        items: Vec<String>,
        filter: String,
    }

    impl Default for Todo {
        fn default() -> Self {
            Self {
                items: vec!["milk".into()],
                filter: "all".into(),
            }
        }
    }

    impl ModuleClass for Todo {}

    #[test]
    fn test_materialize_eager_instance() {
        let mut d = ModuleDescriptor::default();
        materialize::<Todo>(&mut d, &ModuleOptions::default()).unwrap();
        match d.state {
            Some(StateSource::Instance(v)) => {
                assert_eq!(v, json!({ "items": ["milk"], "filter": "all" }))
            }
            other => panic!("expected instance, got {other:?}"),
        }
    }

    #[test]
    fn test_materialize_factory_gives_fresh_values() {
        let mut d = ModuleDescriptor::default();
        materialize::<Todo>(&mut d, &ModuleOptions::new().state_factory(true)).unwrap();
        let state = d.state.unwrap();
        assert!(state.is_factory());

        let a = state.produce().unwrap();
        let b = state.produce().unwrap();
        assert_eq!(a, b);
        assert_eq!(a, serde_json::to_value(Todo::default()).unwrap());
    }

    #[test]
    fn test_materialize_keeps_declared_state() {
        let declared = json!({ "items": [], "filter": "done" });
        let mut d = ModuleDescriptor {
            state: Some(StateSource::Instance(declared.clone())),
            ..Default::default()
        };
        materialize::<Todo>(&mut d, &ModuleOptions::new().state_factory(true)).unwrap();
        match &d.state {
            Some(StateSource::Instance(v)) => assert_eq!(v, &declared),
            other => panic!("state was replaced: {other:?}"),
        }
    }

    #[test]
    fn test_materialize_keeps_declared_factory_identity() {
        let factory: StateFactory = Rc::new(|| Ok(json!({ "n": 1 })));
        let mut d = ModuleDescriptor {
            state: Some(StateSource::Factory(factory.clone())),
            ..Default::default()
        };
        materialize::<Todo>(&mut d, &ModuleOptions::default()).unwrap();
        match &d.state {
            Some(StateSource::Factory(f)) => assert!(Rc::ptr_eq(f, &factory)),
            other => panic!("state was replaced: {other:?}"),
        }
    }
}
