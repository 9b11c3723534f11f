pub mod organization;
pub mod subscriber_group;

mod transaction;
