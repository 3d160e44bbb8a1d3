use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlobalSetting {
    pub setting_key: String,
    pub setting_value: f64,
}
