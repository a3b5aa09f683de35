pub mod analysis;
pub mod autocorr;
pub mod buffer;
pub mod decode;
pub mod filter;
pub mod grid;
pub mod intervals;
pub mod model;
pub mod peaks;
pub mod tempo;
