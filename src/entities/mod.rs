// Entity Store
//
// Each entity module has:
// - A plain record struct read back from SQLite
// - Pure validators run before any SQL mutation
// - Free functions over `&Connection` for create/read/update/delete/list
//
// Cascade deletes are explicit: dependents first, then the parent, in one
// transaction.

pub mod activity;
pub mod camper;
pub mod signup;

pub use activity::{delete_activity, get_activity, insert_activity, list_activities, Activity};
pub use camper::{
    delete_camper, get_camper, insert_camper, list_campers, update_camper, validate_age,
    validate_name, Camper, CamperField,
};
pub use signup::{
    get_signup, insert_signup, list_signups, signups_for_activity, signups_for_camper,
    validate_time, Signup,
};
