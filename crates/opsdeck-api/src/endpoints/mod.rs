// Admin REST endpoint surfaces, grouped by back-office area.
//
// Each file adds inherent methods to `AdminClient` for one area of the
// admin API; the client itself only knows transport mechanics.

mod alerts;
mod plans;
mod system;
mod users;
