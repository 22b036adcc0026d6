pub mod client;
pub mod types;

pub use client::Client;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("request error: {0:?}")]
    Http(#[from] reqwest::Error),

    #[error("json deserialization error: {0:?}")]
    Json(#[from] serde_json::Error),

    #[error("telegram api error: code={code}, description={description}")]
    Api { code: i64, description: String },
}
