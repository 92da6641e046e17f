pub mod agent;
pub mod assistant;
pub mod codeforces;
pub mod errors;
pub mod knowledge;
pub mod models;
pub mod prompt_template;
pub mod providers;
pub mod systems;
