use std::rc::Rc;

use crate::class::{ModuleClass, ModuleDefinition};
use crate::descriptor::GetterTree;
use crate::error::ModuleError;
use crate::getters::extract_getters;
use crate::options::ModuleConfig;
use crate::state::materialize;
use crate::statics::{StaticsBundle, attach, is_attached, synthesize_statics};

/// Result of applying a registrar: the completed definition and, for dynamic
/// modules, its statics.
#[derive(Debug)]
pub struct Registered<C> {
    pub definition: ModuleDefinition<C>,
    pub statics: Option<Rc<StaticsBundle>>,
}

/// Turns `C` into a static module descriptor with default options.
///
/// The result is meant to be composed into a store by the caller.
pub fn register_default<C: ModuleClass>() -> Result<ModuleDefinition<C>, ModuleError> {
    let Registered { definition, .. } = configure(ModuleConfig::default()).register::<C>()?;
    Ok(definition)
}

pub fn configure(config: impl Into<ModuleConfig>) -> Registrar {
    Registrar {
        config: config.into(),
    }
}

/// A configured registration, applicable to any number of module types.
#[derive(Debug, Clone)]
pub struct Registrar {
    config: ModuleConfig,
}

impl Registrar {
    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    pub fn register<C: ModuleClass>(&self) -> Result<Registered<C>, ModuleError> {
        self.apply(ModuleDefinition::new())
    }

    /// Completes `definition` and, for a dynamic configuration, registers it
    /// with the store and attaches its statics to `C`.
    ///
    /// A dynamic configuration without a name, or for a type that already has
    /// statics attached, fails before the store is touched. Anything the store or the type itself raises comes back as
    /// [`ModuleError::Collaborator`].
    pub fn apply<C: ModuleClass>(
        &self,
        mut definition: ModuleDefinition<C>,
    ) -> Result<Registered<C>, ModuleError> {
        let options = self.config.options();
        let class = std::any::type_name::<C>();

        materialize::<C>(&mut definition.descriptor, options)?;
        definition.descriptor.getters.get_or_insert_with(GetterTree::new);
        extract_getters::<C>(&mut definition.descriptor);
        definition.descriptor.namespaced = options.namespaced;

        let ModuleConfig::Dynamic(dynamic) = &self.config else {
            log::debug!("{class}: static module ready");
            return Ok(Registered {
                definition,
                statics: None,
            });
        };

        if dynamic.name.is_empty() {
            return Err(ModuleError::MissingName);
        }
        if is_attached::<C>() {
            return Err(ModuleError::AlreadyAttached { class });
        }

        let statics = Rc::new(synthesize_statics(&definition.descriptor, dynamic)?);
        dynamic
            .store
            .register_module(&dynamic.name, &definition.descriptor)?;
        log::debug!("{class}: registered as '{}'", dynamic.name);

        attach::<C>(statics.clone());
        Ok(Registered {
            definition,
            statics: Some(statics),
        })
    }
}
