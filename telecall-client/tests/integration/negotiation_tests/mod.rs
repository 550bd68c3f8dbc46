pub mod test_buffered_candidates;
pub mod test_ice_restart;
pub mod test_webrtc_collision;
