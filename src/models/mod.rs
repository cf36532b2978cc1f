// Data models for decoded media, body landmarks, and posture results

pub mod capture;
pub mod pose;
pub mod posture;
