//! # API Key Credentials
//!
//! A JSON file as issued by the cluster's create-API-key endpoint:
//!
//! ```json
//! { "id": "VuaCfGcBCdbkQm-e5aOx", "name": "eql-reader", "api_key": "ui2lp2axTNmsyakw9tvNnw" }
//! ```

use std::fmt;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;

use crate::{FanoutError, Result};

#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub id: String,
    pub name: String,
    pub api_key: String,
}

impl Credentials {
    /// Read and parse a credentials file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| FanoutError::Credentials {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| FanoutError::Credentials {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Value for the `Authorization` header: `ApiKey base64(id:api_key)`.
    pub fn authorization(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.id, self.api_key));
        format!("ApiKey {}", token)
    }
}

// The key itself never reaches logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
