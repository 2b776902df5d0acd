//! Extractors whose rejections render as [`AppError`] JSON bodies.

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query},
    Json,
};

use crate::error::AppError;

/// `Json` body that rejects with a 400 `{"error": ..}` response
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Query` string that rejects with a 400 `{"error": ..}` response
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// `Path` parameters that reject with a 400 `{"error": ..}` response
#[derive(Debug, FromRequestParts)]
#[from_request(via(Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);
