use serde::{Deserialize, Serialize};

/// One completed query/response cycle.
///
/// This is also the record appended to the history log: the response is
/// stored verbatim, including the fallback text when generation failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub user_query: String,
    pub response: String,
}

impl Turn {
    pub fn new(user_query: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            user_query: user_query.into(),
            response: response.into(),
        }
    }
}
