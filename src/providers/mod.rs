pub mod odds_client;
pub mod results_client;
pub mod team_names;
pub mod types;

pub use odds_client::{OddsApiClient, OddsClientError};
pub use results_client::{FootballDataClient, ResultsClientError};
pub use types::{Bookmaker, FdMatch, OddsEvent, Quote};
