//! `#[store_module]`: classifies the members of an `impl` block at compile time
//! and implements `modula_core::ModuleClass` from it.
//!
//! ```ignore
//! #[store_module]
//! impl Counter {
//!     #[getter]
//!     fn doubled(&self) -> i64 { self.count * 2 }
//!
//!     #[mutation]
//!     fn increment(&mut self, delta: i64) { self.count += delta }
//!
//!     #[action(name = "fetchTotal")]
//!     async fn fetch_total(ctx: Rc<dyn ActionContext>, _: ()) -> anyhow::Result<i64> { .. }
//!
//!     fn reset(&mut self) { .. } // plain method
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Attribute, Error, FnArg, ImplItem, ImplItemFn, ItemImpl, LitStr, Result, parse_macro_input,
};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    Getter,
    Setter,
    Mutation,
    Action,
    Method,
}

impl Kind {
    fn from_ident(ident: &str) -> Option<Kind> {
        Some(match ident {
            "getter" => Kind::Getter,
            "setter" => Kind::Setter,
            "mutation" => Kind::Mutation,
            "action" => Kind::Action,
            _ => return None,
        })
    }
}

struct Classified {
    kind: Kind,
    name: String,
    func: syn::Ident,
    /// Number of non-receiver arguments.
    arity: usize,
}

#[proc_macro_attribute]
pub fn store_module(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return Error::new(
            proc_macro2::Span::call_site(),
            "#[store_module] takes no arguments",
        )
        .to_compile_error()
        .into();
    }
    let mut item = parse_macro_input!(item as ItemImpl);
    match expand(&mut item) {
        Ok(class_impl) => quote!(#item #class_impl).into(),
        Err(err) => {
            let err = err.to_compile_error();
            quote!(#item #err).into()
        }
    }
}

fn expand(item: &mut ItemImpl) -> Result<TokenStream2> {
    if let Some((_, path, _)) = &item.trait_ {
        return Err(Error::new_spanned(
            path,
            "#[store_module] goes on an inherent impl block",
        ));
    }

    let mut members = Vec::new();
    for impl_item in item.items.iter_mut() {
        if let ImplItem::Fn(f) = impl_item
            && let Some(m) = classify(f)?
        {
            members.push(m);
        }
    }

    let prototype = members.iter().filter_map(|m| {
        let name = &m.name;
        let func = &m.func;
        match m.kind {
            Kind::Getter => Some(quote!(::modula_core::Member::getter(#name, Self::#func))),
            Kind::Setter => Some(quote!(::modula_core::Member::setter(#name))),
            Kind::Mutation | Kind::Method => Some(quote!(::modula_core::Member::method(#name))),
            Kind::Action => None,
        }
    });

    let mutations: Vec<_> = members
        .iter()
        .filter(|m| m.kind == Kind::Mutation)
        .map(|m| {
            let name = &m.name;
            let func = &m.func;
            let wrapped = if m.arity == 0 {
                quote!(|this: &mut Self, _: ()| Self::#func(this))
            } else {
                quote!(Self::#func)
            };
            quote! {
                tree.insert(
                    ::std::string::String::from(#name),
                    ::modula_core::mutation::<Self, _, _>(#wrapped),
                );
            }
        })
        .collect();

    let actions: Vec<_> = members
        .iter()
        .filter(|m| m.kind == Kind::Action)
        .map(|m| {
            let name = &m.name;
            let func = &m.func;
            let wrapped = if m.arity == 1 {
                quote! {
                    |ctx: ::std::rc::Rc<dyn ::modula_core::ActionContext>, _: ()| Self::#func(ctx)
                }
            } else {
                quote!(Self::#func)
            };
            quote! {
                tree.insert(::std::string::String::from(#name), ::modula_core::action(#wrapped));
            }
        })
        .collect();

    let mutations_fn = (!mutations.is_empty()).then(|| {
        quote! {
            fn mutations() -> ::std::option::Option<::modula_core::MutationTree> {
                let mut tree = ::modula_core::MutationTree::new();
                #(#mutations)*
                ::std::option::Option::Some(tree)
            }
        }
    });
    let actions_fn = (!actions.is_empty()).then(|| {
        quote! {
            fn actions() -> ::std::option::Option<::modula_core::ActionTree> {
                let mut tree = ::modula_core::ActionTree::new();
                #(#actions)*
                ::std::option::Option::Some(tree)
            }
        }
    });

    let self_ty = &item.self_ty;
    let (impl_generics, _, where_clause) = item.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::modula_core::ModuleClass for #self_ty #where_clause {
            fn prototype() -> ::std::vec::Vec<::modula_core::Member<Self>> {
                ::std::vec![#(#prototype),*]
            }
            #mutations_fn
            #actions_fn
        }
    })
}

/// Strips our helper attribute from `f` and works out what kind of member it is.
/// Associated functions without a tag are not members.
fn classify(f: &mut ImplItemFn) -> Result<Option<Classified>> {
    let mut tag: Option<(Kind, Option<String>, Attribute)> = None;
    let mut kept = Vec::with_capacity(f.attrs.len());
    for attr in f.attrs.drain(..) {
        let kind = attr
            .path()
            .get_ident()
            .and_then(|i| Kind::from_ident(&i.to_string()));
        let Some(kind) = kind else {
            kept.push(attr);
            continue;
        };
        if let Some((_, _, first)) = &tag {
            let mut err = Error::new_spanned(&attr, "a member can only have one kind");
            err.combine(Error::new_spanned(first, "first declared here"));
            return Err(err);
        }
        let name = member_name(&attr)?;
        tag = Some((kind, name, attr));
    }
    f.attrs = kept;

    let receiver = f.sig.receiver().map(|r| r.mutability.is_some() || r.reference.is_none());
    let arity = f
        .sig
        .inputs
        .iter()
        .filter(|a| matches!(a, FnArg::Typed(_)))
        .count();
    let func = f.sig.ident.clone();

    let (kind, name) = match tag {
        Some((kind, name, _)) => (kind, name),
        None if receiver.is_some() => (Kind::Method, None),
        None => return Ok(None),
    };

    match kind {
        Kind::Getter => {
            if receiver != Some(false) || arity != 0 {
                return Err(Error::new_spanned(
                    &f.sig,
                    "#[getter] expects `fn(&self) -> T`",
                ));
            }
        }
        Kind::Setter => {
            if receiver.is_none() || arity != 1 {
                return Err(Error::new_spanned(
                    &f.sig,
                    "#[setter] expects `fn(&mut self, value: T)`",
                ));
            }
        }
        Kind::Mutation => {
            let by_ref_mut = f
                .sig
                .receiver()
                .is_some_and(|r| r.reference.is_some() && r.mutability.is_some());
            if !by_ref_mut || arity > 1 {
                return Err(Error::new_spanned(
                    &f.sig,
                    "#[mutation] expects `fn(&mut self)` or `fn(&mut self, payload: P)`",
                ));
            }
        }
        Kind::Action => {
            if receiver.is_some() || !(1..=2).contains(&arity) {
                return Err(Error::new_spanned(
                    &f.sig,
                    "#[action] expects `fn(ctx: Rc<dyn ActionContext>, payload: P) -> impl Future<Output = Result<R, E>>`",
                ));
            }
        }
        Kind::Method => {}
    }

    Ok(Some(Classified {
        kind,
        name: name.unwrap_or_else(|| func.to_string()),
        func,
        arity,
    }))
}

/// `#[getter]` or `#[getter(name = "fetchTotal")]`.
fn member_name(attr: &Attribute) -> Result<Option<String>> {
    if matches!(attr.meta, syn::Meta::Path(_)) {
        return Ok(None);
    }
    let mut name = None;
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("name") {
            let lit: LitStr = meta.value()?.parse()?;
            if lit.value().is_empty() {
                return Err(meta.error("member name must not be empty"));
            }
            name = Some(lit.value());
            Ok(())
        } else {
            Err(meta.error("unsupported member option; expected `name = \"...\"`"))
        }
    })?;
    Ok(name)
}
