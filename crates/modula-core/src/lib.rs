//! # Store modules from plain types
//!
//! Modula turns an ordinary Rust type into a module for a centralized
//! reactive store: initial state, getters, mutations and actions. There are
//! four pieces:
//!
//! - `materialize` — builds the initial state (or a state factory) from the
//!   type's `Default`.
//! - `extract_getters` — turns the type's read accessors into
//!   `(moduleState) -> value` getters.
//! - `synthesize_statics` — for dynamic modules, proxies that read and write
//!   the module through the store.
//! - `register_default` / `configure` — the entry points tying it together.
//!
//! ## Static modules
//!
//! ```ignore
//! use modula_core::*;
//! use modula_macros::store_module;
//!
//! #[derive(Default, Serialize, Deserialize)]
//! struct Counter {
//!     count: i64,
//! }
//!
//! #[store_module]
//! impl Counter {
//!     #[getter]
//!     fn doubled(&self) -> i64 {
//!         self.count * 2
//!     }
//!
//!     #[mutation]
//!     fn increment(&mut self, delta: i64) {
//!         self.count += delta;
//!     }
//! }
//!
//! let counter = register_default::<Counter>()?;
//! // hand `counter.descriptor()` to whatever assembles the store tree
//! ```
//!
//! ## Dynamic modules
//!
//! With a name and a store the module registers itself and gets statics:
//!
//! ```ignore
//! let registered = configure(ModuleOptions::new().namespaced(true).dynamic("counter", store))
//!     .register::<Counter>()?;
//!
//! let counter = statics_of::<Counter>().unwrap();
//! counter.commit("increment", 5)?;             // store.commit("counter/increment", 5)
//! let n: Option<i64> = counter.get("count")?;  // store.state["counter"]["count"]
//! let d: Option<i64> = counter.getter_as("doubled")?;
//! ```
//!
//! - Proxies re-read the store on every access.
//! - Action proxies return the store's future untouched.
//! - A dynamic configuration with an empty name is rejected before the
//!   store sees anything.

pub mod class;
pub mod descriptor;
pub mod error;
pub mod getters;
pub mod options;
pub mod prelude;
pub mod register;
pub mod state;
pub mod statics;
pub mod store;

pub use class::*;
pub use descriptor::*;
pub use error::*;
pub use getters::*;
pub use options::*;
pub use prelude::*;
pub use register::*;
pub use state::*;
pub use statics::*;
pub use store::*;
