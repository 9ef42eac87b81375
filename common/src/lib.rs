//! Types shared by the `backend` server and the `frontend` wasm client.
//!
//! Everything that crosses the HTTP boundary lives here so both sides agree
//! on the JSON shape, together with the boundary validation rules and the
//! runtime-agnostic client helpers (realtime bridge, infinite scroll).

pub mod jobs;
pub mod model;
pub mod realtime;
pub mod requests;
pub mod scroll;
pub mod validation;
