// handlers/utils.rs - helpers shared by the resource handlers

use axum::extract::rejection::JsonRejection;
use axum::Json;
use mongodb::bson::{self, Document};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::document_to_json;
use crate::database::StoreError;
use crate::error::ApiError;

/// Unwrap a JSON body, turning extractor rejections into our error shape
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    let Json(value) = payload?;
    Ok(value)
}

/// The single entity a get-by-id pipeline was looking for
pub fn first_document(documents: Vec<Document>) -> Result<Document, StoreError> {
    documents.into_iter().next().ok_or(StoreError::NotFound)
}

pub fn first_json(documents: Vec<Document>) -> Result<Value, StoreError> {
    first_document(documents).map(|d| document_to_json(&d))
}

pub fn decode<T: DeserializeOwned>(document: Document) -> Result<T, StoreError> {
    Ok(bson::from_document(document)?)
}
