use crate::bookmark::{BookmarkNode, BookmarkTree};
use crate::store::{Store, StoreError, BOOKMARK_TREE_KEY, SYNC_PAYLOAD_KEY};

/// The user's profile: the bookmark tree plus the store it is saved to.
pub struct Profile<S: Store> {
    pub tree: BookmarkTree,
    store: S,
}

impl<S: Store> Profile<S> {
    /// Load the stored tree, or start an empty one.
    pub async fn load(store: S) -> Result<Self, StoreError> {
        let tree = store.get(BOOKMARK_TREE_KEY).await?.unwrap_or_default();
        Ok(Self { tree, store })
    }

    pub fn with_tree(store: S, tree: BookmarkTree) -> Self {
        Self { tree, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Persist the whole tree.
    pub async fn save(&self) -> Result<(), StoreError> {
        self.store.save(BOOKMARK_TREE_KEY, &self.tree).await
    }

    /// Put a node snapshot where another profile can pick it up.
    pub async fn stage_sync_payload(&self, node: &BookmarkNode) -> Result<(), StoreError> {
        self.store.save(SYNC_PAYLOAD_KEY, node).await
    }

    /// Read and clear the staged snapshot, if any.
    pub async fn take_sync_payload(&self) -> Result<Option<BookmarkNode>, StoreError> {
        if !self.store.has(SYNC_PAYLOAD_KEY).await? {
            return Ok(None);
        }
        let node = self.store.get(SYNC_PAYLOAD_KEY).await?;
        self.store.remove(SYNC_PAYLOAD_KEY).await?;
        Ok(node)
    }
}
