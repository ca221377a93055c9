use async_trait::async_trait;

use crate::services::media::SessionId;

/// Resolves an application identifier to a name fit for display
#[async_trait]
pub trait NameResolver: Send + Sync {
    /// Display name for the application owning `id`, if one can be found
    async fn friendly_name(&self, id: &SessionId) -> Option<String>;
}

/// Resolver that derives the name from the identifier itself.
///
/// Executable-style identifiers lose their `.exe` suffix; anything else is
/// returned unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentifierNameResolver;

#[async_trait]
impl NameResolver for IdentifierNameResolver {
    async fn friendly_name(&self, id: &SessionId) -> Option<String> {
        if id.is_empty() {
            return None;
        }

        let name = id.as_str();
        Some(name.strip_suffix(".exe").unwrap_or(name).to_string())
    }
}
