//! Rotaplay Core - Rotating media playlist engine
//!
//! This crate provides media discovery, cycle ordering strategies and the
//! thread-safe playlist engine that rotates a pre-staged next cycle into
//! place when the current one runs out.

pub mod command;
pub mod library;
pub mod order;
pub mod playlist;
pub mod service;

pub use command::{ Command, CommandError };
pub use library::{ MediaCollector, MediaExtensions, ScanError };
pub use order::{ Alphabetical, KeepOrder, OrderKind, RandomOrder, SortStrategy };
pub use playlist::{ MediaList, PlaylistError };
pub use service::{ PlaylistHandle, PlaylistService, ServiceError };
