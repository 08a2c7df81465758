//! # sheetstore-shared
//!
//! Types shared by every handler: the function-runtime style request and
//! response envelope, and the CORS constants each handler advertises.

pub mod constants;
pub mod event;

pub use event::{HandlerEvent, HandlerResponse};
