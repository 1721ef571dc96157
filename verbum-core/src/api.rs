//! Wire envelope shared by every endpoint: `{ success, data?, error? }`

use serde::{Deserialize, Serialize};

use crate::error::{ReaderError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Present on list endpoints that page their results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
    pub has_more: bool,
}

impl<T> Envelope<T> {
    /// Turn `success: false` into [`ReaderError::Api`] carrying the backend text
    pub fn into_result(self) -> Result<T> {
        if !self.success {
            return Err(ReaderError::Api(
                self.error
                    .unwrap_or_else(|| "request failed without an error message".to_string()),
            ));
        }
        self.data
            .ok_or_else(|| ReaderError::Decode("successful response without data".to_string()))
    }

    /// For endpoints whose success carries no payload (DELETE)
    pub fn into_unit(self) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            Err(ReaderError::Api(
                self.error
                    .unwrap_or_else(|| "request failed without an error message".to_string()),
            ))
        }
    }
}

/// Decode an envelope body, mapping malformed JSON to [`ReaderError::Decode`]
pub fn decode<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<Envelope<T>> {
    serde_json::from_slice(body).map_err(|e| ReaderError::Decode(e.to_string()))
}
