use std::{fmt, num::NonZeroU64, str::FromStr};

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::ApiError;

// --- Core Resource ---

/// Record
///
/// A single resource held by the record store. The `id` is assigned by the store on
/// insert and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Record {
    #[schema(example = 3)]
    pub id: u64,
    #[schema(example = "Dune")]
    pub title: String,
    #[schema(example = "Frank Herbert")]
    pub author: String,
}

/// RecordId
///
/// A validated record identifier: a positive base-10 integer. Store operations only
/// accept this type, so malformed identifiers are rejected before any lookup happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(NonZeroU64);

impl RecordId {
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl FromStr for RecordId {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<NonZeroU64>()
            .map(Self)
            .map_err(|_| ApiError::BadRequest("Invalid record ID".to_string()))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// --- Request Payloads ---

/// RecordInput
///
/// Body of `POST /records` and `PUT /records/{id}`. Both fields are required; an `id`
/// field in the body is ignored because serde skips unknown fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RecordInput {
    #[schema(example = "Dune")]
    pub title: String,
    #[schema(example = "Frank Herbert")]
    pub author: String,
}

/// LoginRequest
///
/// Body of `POST /login`. Missing fields deserialize as empty strings so the verifier
/// can answer with its dedicated "required" message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    #[serde(default)]
    #[schema(example = "test@example.com")]
    pub email: String,
    #[serde(default)]
    #[schema(example = "1234")]
    pub password: String,
}

// --- Responses ---

/// LoginResponse
///
/// Successful login envelope carrying the signed bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginResponse {
    pub status: bool,
    #[schema(example = "Login Success")]
    pub message: String,
    pub token: String,
}

/// DeleteResponse
///
/// Confirmation returned by `DELETE /records/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DeleteResponse {
    #[schema(example = "deleted")]
    pub status: String,
    #[schema(example = "Record deleted")]
    pub message: String,
}
