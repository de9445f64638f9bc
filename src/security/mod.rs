pub mod auth;
pub mod governor;
pub mod middleware;
pub mod reports;

pub use auth::ApiKeyValidator;
pub use governor::RequestGovernor;
pub use reports::ReportTracker;
