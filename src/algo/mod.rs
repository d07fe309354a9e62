pub mod aggregate;
pub mod dataset;
pub mod feature;
pub mod normalize;
