//! Where a request's context comes from: inline data or the profile store.

use crate::pipeline::ContextInput;
use edupilot_store::StoreClient;
use tracing::{debug, warn};

/// Pick the context for a request. Inline data wins; otherwise the user's
/// record is read from the store. A record that cannot be obtained is
/// reported as unavailable, never as an error.
pub async fn resolve_context(
    store: Option<&StoreClient>,
    inline: Option<serde_json::Value>,
    user_id: Option<&str>,
) -> Option<ContextInput> {
    if let Some(raw) = inline.filter(|v| !v.is_null()) {
        return Some(ContextInput::Raw(raw));
    }

    let user_id = user_id?;
    let Some(store) = store else {
        debug!(user_id, "No profile store configured; using placeholder context");
        return Some(ContextInput::Unavailable);
    };

    let handle = match store.handle().await {
        Ok(handle) => handle,
        Err(e) => {
            warn!(error = %e, "Profile store unavailable; using placeholder context");
            return Some(ContextInput::Unavailable);
        }
    };

    match handle.fetch(user_id).await {
        Ok(Some(record)) => Some(ContextInput::Raw(record)),
        Ok(None) => {
            warn!(user_id, store = handle.name(), "No profile record; using placeholder context");
            Some(ContextInput::Unavailable)
        }
        Err(e) => {
            warn!(user_id, error = %e, "Profile fetch failed; using placeholder context");
            Some(ContextInput::Unavailable)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use edupilot_core::error::StoreError;
    use edupilot_core::profile::ProfileStore;
    use edupilot_store::InMemoryProfileStore;
    use serde_json::{Value, json};
    use std::sync::Arc;

    struct BrokenStore;

    #[async_trait]
    impl ProfileStore for BrokenStore {
        fn name(&self) -> &str {
            "broken"
        }
        async fn fetch(&self, _user_id: &str) -> Result<Option<Value>, StoreError> {
            Err(StoreError::QueryFailed("disk on fire".into()))
        }
        async fn put(&self, _user_id: &str, _record: Value) -> Result<(), StoreError> {
            Ok(())
        }
        async fn remove(&self, _user_id: &str) -> Result<bool, StoreError> {
            Ok(false)
        }
        async fn count(&self) -> Result<usize, StoreError> {
            Ok(0)
        }
    }

    fn asha_store() -> StoreClient {
        StoreClient::from_store(Arc::new(InMemoryProfileStore::with_records([(
            "s-001".to_string(),
            json!({"role": "Student", "name": "Asha"}),
        )])))
    }

    #[tokio::test]
    async fn inline_data_wins_over_store() {
        let store = asha_store();
        let inline = json!({"name": "Inline"});
        let context = resolve_context(Some(&store), Some(inline.clone()), Some("s-001")).await;
        assert_eq!(context, Some(ContextInput::Raw(inline)));
    }

    #[tokio::test]
    async fn null_inline_falls_back_to_store() {
        let store = asha_store();
        let context = resolve_context(Some(&store), Some(Value::Null), Some("s-001")).await;
        assert_eq!(
            context,
            Some(ContextInput::Raw(json!({"role": "Student", "name": "Asha"})))
        );
    }

    #[tokio::test]
    async fn no_inline_and_no_user_means_no_context() {
        let store = asha_store();
        assert_eq!(resolve_context(Some(&store), None, None).await, None);
    }

    #[tokio::test]
    async fn unobtainable_records_are_unavailable() {
        let broken = StoreClient::from_store(Arc::new(BrokenStore));
        let known = asha_store();

        assert_eq!(
            resolve_context(None, None, Some("s-001")).await,
            Some(ContextInput::Unavailable)
        );
        assert_eq!(
            resolve_context(Some(&known), None, Some("nobody")).await,
            Some(ContextInput::Unavailable)
        );
        assert_eq!(
            resolve_context(Some(&broken), None, Some("s-001")).await,
            Some(ContextInput::Unavailable)
        );
    }
}
