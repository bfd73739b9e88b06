//! The `services` collection: what the company offers.

pub mod site_services_shared;
