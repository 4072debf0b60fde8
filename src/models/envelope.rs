use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The `{ success, message, data? }` wrapper around every server response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Returns the payload, treating `success = false` or a missing payload as failures.
    pub fn into_data(self) -> Result<T> {
        if !self.success {
            return Err(Error::Rejected(self.message));
        }
        self.data
            .ok_or_else(|| Error::Decode(format!("response carried no data: '{}'", self.message)))
    }

    /// For endpoints whose payload is only a confirmation text.
    pub fn into_message(self) -> Result<String> {
        if self.success {
            Ok(self.message)
        } else {
            Err(Error::Rejected(self.message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_payload() {
        let r: ApiResponse<u32> =
            serde_json::from_str(r#"{"success": true, "message": "ok", "data": 4}"#).unwrap();
        assert_eq!(r.into_data().unwrap(), 4);
    }

    #[test]
    fn failure_flag_wins_over_payload() {
        let r: ApiResponse<u32> =
            serde_json::from_str(r#"{"success": false, "message": "no team", "data": 4}"#)
                .unwrap();
        assert!(matches!(r.into_data(), Err(Error::Rejected(m)) if m == "no team"));
    }

    #[test]
    fn missing_payload_is_a_decode_error() {
        let r: ApiResponse<u32> = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(matches!(r.into_data(), Err(Error::Decode(_))));
    }
}
