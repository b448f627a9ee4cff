//! marks-core - Core library for Smart Bookmark
//!
//! This crate contains the bookmark model, the Supabase clients (auth,
//! PostgREST, realtime) and the view controller shared by every Smart
//! Bookmark interface.

pub mod auth;
pub mod config;
pub mod controller;
pub mod error;
pub mod models;
pub mod realtime;
pub mod remote;
pub mod search;
pub mod util;

pub use controller::{
    AddOutcome, BookmarkController, Dashboard, Mount, Navigation, ViewEvent, ViewState,
};
pub use error::{Error, Result};
pub use models::{Bookmark, BookmarkId, NewBookmark};
