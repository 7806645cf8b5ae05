// THEORY:
// This file is the main entry point for the `pixel_sorter` library crate.
// It defines the public API exposed to consumers such as the `sort_tester`
// command line tool.
//
// The high-level interface is the `PixelPipeline` and its configuration
// (`PipelineConfig`, `EffectMode`, `Report`), plus `image_helper` for getting
// grids in and out of image files. The building blocks in `core_modules` stay
// public so the individual effects (line sorting, congregation) can be driven
// directly.

pub mod core_modules;
pub mod error;
pub mod image_helper;
pub mod pipeline;

pub use error::{Error, Result};
pub use pipeline::{CongregationPass, EffectMode, PipelineConfig, PixelPipeline, Report};
