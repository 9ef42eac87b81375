//! Narrow interfaces to the managed backend-as-a-service.
//!
//! Handlers only ever see `Arc<dyn ObjectStore>` / `Arc<dyn AuthProvider>`;
//! `main` picks the HTTP implementations when a backend URL is configured and
//! the in-process ones otherwise.

pub mod auth;
pub mod storage;
