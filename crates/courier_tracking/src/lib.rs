pub mod backend;
pub mod driver_state;
pub mod navigator;
pub mod session;
pub mod sink;
pub mod source;
pub mod trip_feed;
pub mod tracking;

#[cfg(test)]
pub(crate) mod test_utils;
