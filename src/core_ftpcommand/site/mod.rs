pub mod handler;
pub mod helper;
pub mod site_addip;
pub mod site_adduser;
pub mod site_delip;
pub mod site_deluser;
pub mod site_kick;
pub mod site_user;
pub mod site_who;

pub use handler::SiteCommand;
