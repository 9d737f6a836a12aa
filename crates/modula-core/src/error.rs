use thiserror::Error;

/// Errors surfaced by module registration and by the statics bundle.
///
/// Anything raised by a collaborator (the type's own state construction, the
/// store's registration call, commits or dispatches) is carried through
/// `Collaborator` untouched; its message and source chain are the collaborator's.
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("Name of module not provided in decorator options")]
    MissingName,

    #[error("no {kind} named '{name}' in module '{namespace}'")]
    UnknownMember {
        kind: MemberSection,
        namespace: String,
        name: String,
    },

    /// `C` already carries statics from an earlier dynamic registration.
    #[error("statics are already attached to {class}")]
    AlreadyAttached { class: &'static str },

    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

impl ModuleError {
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ModuleError::MissingName | ModuleError::AlreadyAttached { .. }
        )
    }
}

impl From<serde_json::Error> for ModuleError {
    fn from(err: serde_json::Error) -> Self {
        ModuleError::Collaborator(err.into())
    }
}

/// The four descriptor sections a member can live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberSection {
    State,
    Getter,
    Mutation,
    Action,
}

impl std::fmt::Display for MemberSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MemberSection::State => "state field",
            MemberSection::Getter => "getter",
            MemberSection::Mutation => "mutation",
            MemberSection::Action => "action",
        };
        f.write_str(s)
    }
}
