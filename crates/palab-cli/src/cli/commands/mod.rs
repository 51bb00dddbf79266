//! CLI command handlers, one file per command.

mod bootstrap;
mod checksum;
mod fetch;
mod provenance;
mod reset;
mod status;

pub use bootstrap::run_bootstrap;
pub use checksum::run_checksum;
pub use fetch::run_fetch;
pub use provenance::run_provenance;
pub use reset::run_reset;
pub use status::run_status;
