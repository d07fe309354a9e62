mod dashboard;
mod frequency;
mod normalize;
mod top_species;
pub mod util;

pub use dashboard::Dashboard;
pub use frequency::Frequency;
pub use normalize::Normalize;
pub use top_species::TopSpecies;
