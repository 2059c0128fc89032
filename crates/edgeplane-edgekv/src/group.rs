//! Group items data source

use crate::api::{EdgeKvApi, ItemGroup};
use crate::error::{EdgeKvError, Result};
use edgeplane_provider::ResourceId;
use std::collections::BTreeMap;

/// Every item of one EdgeKV group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupItems {
    /// `namespace:network:group`
    pub id: ResourceId,
    pub items: BTreeMap<String, String>,
}

/// List the group, then fetch the value of each item.
pub async fn read_group_items(api: &dyn EdgeKvApi, group: &ItemGroup) -> Result<GroupItems> {
    tracing::debug!("Reading EdgeKV group items");

    let keys = api.list_items(group).await.map_err(EdgeKvError::ListItems)?;

    let mut items = BTreeMap::new();
    for key in keys {
        let value = api
            .get_item(group, &key)
            .await
            .map_err(|source| EdgeKvError::GetItem {
                item: key.clone(),
                source,
            })?;
        items.insert(key, value);
    }

    Ok(GroupItems {
        id: group.id()?,
        items,
    })
}
