//! Prism engine crate.
//!
//! A minimal real-time rasterization host: geometry and shader parameters
//! are uploaded every frame, drawn with one indexed draw, and presented.
//!
//! Rendering components are written against [`device::GpuDevice`] and take
//! the device by reference on each call. [`device::WgpuDevice`] backs them
//! with wgpu; [`window::Runtime`] wires that device to a winit window.

pub mod camera;
pub mod coords;
pub mod core;
pub mod device;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod logging;
pub mod shader;
pub mod time;
pub mod window;

pub use error::{RenderError, Result};
