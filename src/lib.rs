//! Library crate behind the `mapedit` bulk editor for Minetest-style voxel
//! world databases.
//!
//! ## Terminology
//! ### Node
//! A node is a single voxel. Every mapblock holds 16·16·16 of them, each
//! with a content id (resolved through the block's own name-id map), an
//! 8-bit `param1` (lighting) and an 8-bit `param2` (rotation / content
//! specific state).
//!
//! ### Mapblock
//! World data is divided into mapblocks of 16·16·16 nodes, addressed by a
//! signed 64-bit key packed from block coordinates. See [`geometry::Vec3`].
//!
//! ## Example usage
//!
//! Opening a world database and rewriting every stone node to air within an
//! area:
//! ```no_run
//! use mapedit::commands::{replacenodes, Instance};
//! use mapedit::error::Result;
//! use mapedit::geometry::{Area, Vec3};
//! use mapedit::progress::NullProgress;
//! use mapedit::store::SqliteStore;
//!
//! async_std::task::block_on(async {
//!     # async fn run() -> Result<()> {
//!     let store = SqliteStore::open("map.sqlite").await?;
//!     let area = Area::new(Vec3::new(0, 0, 0), Vec3::new(79, 79, 79));
//!     let mut inst = Instance::new(store, None, false, NullProgress);
//!     replacenodes::run(&mut inst, "default:stone", "air", Some(area), false).await?;
//!     inst.db.commit().await?;
//!     # Ok(())
//!     # }
//!     # let _ = run();
//! });
//! ```
#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Shared big-endian cursor helpers used by the mapblock codecs.
pub mod byteio;
/// Command-line argument parsing.
pub mod cli;
/// Selection-scoped block transformations (clone, overlay, fill, ...).
pub mod commands;
/// Crate-wide error hierarchy.
pub mod error;
/// 3D integer vectors and axis-aligned box geometry.
pub mod geometry;
/// The versioned mapblock binary codec.
pub mod mapblock;
/// Region-scoped partial-mapblock merge engine.
pub mod merge;
/// Per-position metadata variable and static-object-data codecs.
pub mod metadata;
/// Block selection planning (by area and/or byte-substring search).
pub mod planner;
/// Progress reporting for long-running bulk operations.
pub mod progress;
/// The buffered-transaction SQLite store adapter.
pub mod store;
/// zlib section slicing shared by the mapblock codec.
pub mod zlib_section;
