use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SystemHealth {
    pub upc_online: bool,
    pub movies_online: bool,
    pub series_online: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BackendInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AvailableBackends {
    pub upc: Vec<BackendInfo>,
    pub managers: Vec<BackendInfo>,
}
