//! Command handlers for the Relief CLI.

pub mod ask;
pub mod corpus;
pub mod route;
pub mod serve;

pub use ask::AskCommand;
pub use corpus::CorpusCommand;
pub use route::RouteCommand;
pub use serve::ServeCommand;
