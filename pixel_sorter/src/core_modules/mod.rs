// Pixel model and algorithms, bottom-up.
pub mod color;
pub mod sort_policy;
pub mod chunk;
pub mod pixel_grid;
pub mod kernel;
pub mod fitness;
pub mod line_sorter;
pub mod congregator;
