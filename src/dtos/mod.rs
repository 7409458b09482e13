pub mod biddtos;
pub mod messagedtos;
pub mod projectdtos;
pub mod ratingdtos;
pub mod userdtos;
