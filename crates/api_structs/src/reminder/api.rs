use serde::{Deserialize, Serialize};

pub mod dispatch_reminders {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub processed: usize,
        pub sent: usize,
        pub failed: usize,
    }
}

pub mod dispatch_push_reminders {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct HorizonResult {
        /// Number of notifications that were delivered
        pub processed: usize,
        pub errors: Vec<String>,
    }

    #[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
    pub struct HorizonResults {
        pub reminder_30min: HorizonResult,
        pub reminder_2h: HorizonResult,
        pub reminder_24h: HorizonResult,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub success: bool,
        pub results: HorizonResults,
        pub timestamp: i64,
    }
}
