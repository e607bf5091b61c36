use asset_features_core::{Lookup, MapConfigurationHeader, StoreError};
use serde::Deserialize;
use uuid::Uuid;

use super::{keys, ProcedureCaller};
use crate::traits::ProcArg;

#[derive(Debug, Deserialize)]
struct MapConfigRow {
    id: Uuid,
    name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    is_active: Option<bool>,
}

impl From<MapConfigRow> for MapConfigurationHeader {
    fn from(row: MapConfigRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            is_active: row.is_active.unwrap_or(false),
        }
    }
}

/// Top-level map configuration rows. Assembly into full documents happens in
/// [`crate::service::MapConfigurationAssembler`].
#[derive(Clone)]
pub struct MapConfigRepository {
    caller: ProcedureCaller,
}

impl MapConfigRepository {
    #[must_use]
    pub fn new(caller: ProcedureCaller) -> Self {
        Self { caller }
    }

    /// # Errors
    ///
    /// Fatal store faults only.
    pub async fn get_all(&self) -> Result<Lookup<Vec<MapConfigurationHeader>>, StoreError> {
        self.caller
            .list::<MapConfigRow, MapConfigurationHeader>(keys::GET_MAP_CONFIGS, &[])
            .await
    }

    /// # Errors
    ///
    /// Fatal store faults only.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Lookup<MapConfigurationHeader>, StoreError> {
        self.caller
            .single::<MapConfigRow, MapConfigurationHeader>(
                keys::GET_MAP_CONFIG_BY_ID,
                &[ProcArg::Uuid(id)],
            )
            .await
    }
}
