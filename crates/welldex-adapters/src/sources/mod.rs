//! One module per regulatory source. Each owns its own status/type mapping
//! tables and county/basin tables — see spec.md §4.2, these are genuinely
//! source-specific and do not generalize.

pub mod co_cogcc;
pub mod la_ldnr;
pub mod nd_ndic;
pub mod nm_ocd;
pub mod ok_occ;
pub mod tx_rrc;
