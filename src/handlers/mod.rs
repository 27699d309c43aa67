// Request handlers grouped by resource. Access rules are not enforced here:
// the gate in `middleware::auth` applies the policy table before any handler
// runs.
pub mod inventory;
pub mod service;
pub mod session;
pub mod users;
