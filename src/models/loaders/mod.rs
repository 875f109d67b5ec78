pub mod criteria_loader;

pub use criteria_loader::{load_criteria_file, parse_criteria, LoadedCriteria};
