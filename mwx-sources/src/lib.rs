pub mod cocorahs;
#[cfg(feature = "api")]
pub mod http;
pub mod hydro_report;
pub mod nws;
pub mod observation;
pub mod station;
pub mod summit_table;
pub mod synoptic;
pub mod uvm;
