pub mod mkz_calibrator;
pub mod mkz_model;
