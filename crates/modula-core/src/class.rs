use std::future::Future;
use std::marker::PhantomData;
use std::rc::Rc;

use serde::Serialize;
use serde::de::{Deserialize, DeserializeOwned};
use serde_json::Value;

use crate::descriptor::{
    ActionFn, ActionTree, GetterTree, ModuleDescriptor, MutationFn, MutationTree, StateSource,
};
use crate::statics::{StaticsBundle, statics_of};
use crate::store::{ActionContext, ActionFuture};

/// A type usable as a store module.
///
/// `Default` stands in for field initializers: a fresh default instance is the
/// module's initial state. Serde moves instances in and out of the store's
/// state tree.
///
/// Normally implemented by `#[store_module]` on the type's `impl` block.
pub trait ModuleClass: Default + Serialize + DeserializeOwned + 'static {
    /// Members declared on the type, classified up front.
    fn prototype() -> Vec<Member<Self>> {
        Vec::new()
    }

    fn mutations() -> Option<MutationTree> {
        None
    }

    fn actions() -> Option<ActionTree> {
        None
    }
}

pub type Accessor<C> = Rc<dyn Fn(&C) -> serde_json::Result<Value>>;

pub struct Member<C> {
    pub name: &'static str,
    pub kind: MemberKind<C>,
}

pub enum MemberKind<C> {
    /// Read accessor: parameterless derivation from the instance.
    Getter(Accessor<C>),
    /// Write-only accessor.
    Setter,
    Method,
}

impl<C: 'static> Member<C> {
    pub fn getter<R, F>(name: &'static str, accessor: F) -> Self
    where
        R: Serialize + 'static,
        F: Fn(&C) -> R + 'static,
    {
        let accessor: Accessor<C> = Rc::new(move |this: &C| serde_json::to_value(accessor(this)));
        Member {
            name,
            kind: MemberKind::Getter(accessor),
        }
    }

    pub fn setter(name: &'static str) -> Self {
        Member {
            name,
            kind: MemberKind::Setter,
        }
    }

    pub fn method(name: &'static str) -> Self {
        Member {
            name,
            kind: MemberKind::Method,
        }
    }

    pub fn is_getter(&self) -> bool {
        matches!(self.kind, MemberKind::Getter(_))
    }
}

/// Wraps a typed mutation so it runs against the store's state tree.
///
/// The state value is read into `C`, mutated, and written back. If reading the
/// state or the payload fails the state is left as it was.
pub fn mutation<C, P, F>(f: F) -> MutationFn
where
    C: ModuleClass,
    P: DeserializeOwned + 'static,
    F: Fn(&mut C, P) + 'static,
{
    Rc::new(move |state: &mut Value, payload: Value| -> anyhow::Result<()> {
        let mut this = <C as Deserialize>::deserialize(&*state)?;
        let payload: P = serde_json::from_value(payload)?;
        f(&mut this, payload);
        *state = serde_json::to_value(this)?;
        Ok(())
    })
}

/// Wraps a typed (usually `async`) action.
pub fn action<P, R, E, Fut, F>(f: F) -> ActionFn
where
    P: DeserializeOwned + 'static,
    R: Serialize + 'static,
    E: Into<anyhow::Error> + 'static,
    Fut: Future<Output = Result<R, E>> + 'static,
    F: Fn(Rc<dyn ActionContext>, P) -> Fut + 'static,
{
    Rc::new(move |ctx: Rc<dyn ActionContext>, payload: Value| -> ActionFuture {
        let payload: P = match serde_json::from_value(payload) {
            Ok(p) => p,
            Err(err) => {
                return Box::pin(std::future::ready(Err::<Value, anyhow::Error>(err.into())));
            }
        };
        let fut = f(ctx, payload);
        Box::pin(async move {
            let out = fut.await.map_err(Into::<anyhow::Error>::into)?;
            serde_json::to_value(out).map_err(anyhow::Error::from)
        })
    })
}

/// Runtime record of a module type: owns its descriptor.
///
/// Starts out with the type's own mutations and actions; `state` and
/// `getters` are filled in by registration unless set here first.
pub struct ModuleDefinition<C> {
    pub(crate) descriptor: ModuleDescriptor,
    _class: PhantomData<fn() -> C>,
}

impl<C: ModuleClass> ModuleDefinition<C> {
    pub fn new() -> Self {
        Self {
            descriptor: ModuleDescriptor {
                mutations: C::mutations(),
                actions: C::actions(),
                ..ModuleDescriptor::default()
            },
            _class: PhantomData,
        }
    }

    /// Declares the state explicitly; registration will not derive one.
    pub fn with_state(mut self, state: StateSource) -> Self {
        self.descriptor.state = Some(state);
        self
    }

    /// Declares getters explicitly. A non-empty tree turns off accessor extraction.
    pub fn with_getters(mut self, getters: GetterTree) -> Self {
        self.descriptor.getters = Some(getters);
        self
    }

    pub fn with_mutations(mut self, mutations: MutationTree) -> Self {
        self.descriptor.mutations = Some(mutations);
        self
    }

    pub fn with_actions(mut self, actions: ActionTree) -> Self {
        self.descriptor.actions = Some(actions);
        self
    }

    pub fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    pub fn into_descriptor(self) -> ModuleDescriptor {
        self.descriptor
    }

    /// Names of the descriptor fields currently set, in a fixed order.
    ///
    /// Statics attached by dynamic registration are never listed.
    pub fn own_properties(&self) -> Vec<&'static str> {
        let d = &self.descriptor;
        let mut props = Vec::with_capacity(5);
        if d.state.is_some() {
            props.push("state");
        }
        if d.getters.is_some() {
            props.push("getters");
        }
        if d.mutations.is_some() {
            props.push("mutations");
        }
        if d.actions.is_some() {
            props.push("actions");
        }
        props.push("namespaced");
        props
    }

    /// Statics attached to `C` by a dynamic registration, if any.
    pub fn statics(&self) -> Option<Rc<StaticsBundle>> {
        statics_of::<C>()
    }
}

impl<C: ModuleClass> Default for ModuleDefinition<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for ModuleDefinition<C> {
    fn clone(&self) -> Self {
        Self {
            descriptor: self.descriptor.clone(),
            _class: PhantomData,
        }
    }
}

impl<C> std::fmt::Debug for ModuleDefinition<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleDefinition")
            .field("class", &std::any::type_name::<C>())
            .field("descriptor", &self.descriptor)
            .finish()
    }
}
