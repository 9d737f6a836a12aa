use std::rc::Rc;

use serde::Deserialize;
use serde_json::Value;

use crate::class::{Accessor, MemberKind, ModuleClass};
use crate::descriptor::{GetterFn, GetterTree, ModuleDescriptor};

/// Every read accessor on `C`, as `(moduleState) -> value`.
///
/// Plain methods and write-only accessors produce nothing.
pub fn getters_of<C: ModuleClass>() -> GetterTree {
    let mut tree = GetterTree::new();
    for member in C::prototype() {
        if let MemberKind::Getter(accessor) = member.kind {
            tree.insert(member.name.to_owned(), rebind::<C>(accessor));
        }
    }
    tree
}

/// Extracts `C`'s accessors into the descriptor's getters.
///
/// Leaves a non-empty tree alone. `getters` is always `Some` afterwards.
pub fn extract_getters<C: ModuleClass>(descriptor: &mut ModuleDescriptor) {
    let getters = descriptor.getters.get_or_insert_with(GetterTree::new);
    if !getters.is_empty() {
        log::trace!(
            "{}: getters already declared ({}), skipping extraction",
            std::any::type_name::<C>(),
            getters.len()
        );
        return;
    }
    getters.extend(getters_of::<C>());
}

// The accessor runs against whatever state the store hands in, not a
// particular instance.
fn rebind<C: ModuleClass>(accessor: Accessor<C>) -> GetterFn {
    Rc::new(move |state: &Value| -> anyhow::Result<Value> {
        let this = <C as Deserialize>::deserialize(state)?;
        Ok(accessor(&this)?)
    })
}
