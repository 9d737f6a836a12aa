use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::store::Store;

/// Options shared by static and dynamic registration.
///
/// Deserializes from `{ "namespaced": true, "stateFactory": true }`; missing
/// keys fall back to `false` and any other key is an error. Dynamic options
/// hold a live store and only come from [`ModuleOptions::dynamic`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct ModuleOptions {
    pub namespaced: bool,
    /// Keep `state` as a factory instead of building one instance up front.
    pub state_factory: bool,
}

impl ModuleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespaced(mut self, namespaced: bool) -> Self {
        self.namespaced = namespaced;
        self
    }

    pub fn state_factory(mut self, state_factory: bool) -> Self {
        self.state_factory = state_factory;
        self
    }

    /// Switches to dynamic registration under `name` in `store`.
    pub fn dynamic(self, name: impl Into<String>, store: Rc<dyn Store>) -> DynamicModuleOptions {
        DynamicModuleOptions {
            options: self,
            name: name.into(),
            store,
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Options for a module registered with a store at definition time.
#[derive(Clone)]
pub struct DynamicModuleOptions {
    pub options: ModuleOptions,
    /// Registration namespace; must not be empty.
    pub name: String,
    pub store: Rc<dyn Store>,
}

impl fmt::Debug for DynamicModuleOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicModuleOptions")
            .field("options", &self.options)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum ModuleConfig {
    Static(ModuleOptions),
    Dynamic(DynamicModuleOptions),
}

impl ModuleConfig {
    pub fn options(&self) -> &ModuleOptions {
        match self {
            ModuleConfig::Static(o) => o,
            ModuleConfig::Dynamic(d) => &d.options,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, ModuleConfig::Dynamic(_))
    }
}

impl Default for ModuleConfig {
    fn default() -> Self {
        ModuleConfig::Static(ModuleOptions::default())
    }
}

impl From<ModuleOptions> for ModuleConfig {
    fn from(options: ModuleOptions) -> Self {
        ModuleConfig::Static(options)
    }
}

impl From<DynamicModuleOptions> for ModuleConfig {
    fn from(options: DynamicModuleOptions) -> Self {
        ModuleConfig::Dynamic(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_json() {
        let o =
            ModuleOptions::from_json(r#"{ "namespaced": true, "stateFactory": true }"#).unwrap();
        assert!(o.namespaced);
        assert!(o.state_factory);

        let o = ModuleOptions::from_json("{}").unwrap();
        assert_eq!(o, ModuleOptions::default());
    }

    #[test]
    fn test_options_reject_unknown_keys() {
        let err = ModuleOptions::from_json(r#"{ "dynamic": true, "name": "x" }"#).unwrap_err();
        assert!(err.to_string().contains("unknown field `dynamic`"));

        assert!(ModuleOptions::from_json(r#"{ "state_factory": true }"#).is_err());
    }

    #[test]
    fn test_options_builder() {
        let o = ModuleOptions::new().namespaced(true);
        assert!(o.namespaced);
        assert!(!o.state_factory);
        assert!(!ModuleConfig::from(o).is_dynamic());
    }
}
