//! An endless, draggable wall of cards rendered with wgpu.
//!
//! A grid of cards is replicated into a 3×3 block of tiles and wrapped
//! around the viewport so dragging never reaches an edge. Release momentum,
//! a zoom-out-while-dragging camera, hover highlighting and a vignette plus
//! lens-warp post chain sit on top.

pub mod app;
pub mod camera;
pub mod cards;
pub mod config;
pub mod engine;
pub mod grid;
pub mod host;
pub mod hover;
pub mod motion;
pub mod post;
pub mod renderer;
pub mod texture;
pub mod tween;
pub mod ui;
pub mod wrap;

#[cfg(test)]
mod testing;
