//! Shared, I/O-free primitives used by every other crate in the workspace:
//! name normalization, date parsing, deterministic identity construction,
//! county/basin lookups, process configuration, and the shared error type.

pub mod config;
pub mod date;
pub mod error;
pub mod geo;
pub mod ident;
pub mod name;

pub use config::Config;
pub use date::{first_of_month, parse_flexible_date};
pub use error::{Result, WelldexError};
pub use geo::{basin_for_county, basin_for_latitude, county_name, LatitudeBand};
pub use ident::{asset_id, deterministic_uuid, operator_id};
pub use name::{canonicalize_display_name, normalize_for_matching};
