// Domain layer - Wire format, channel catalogue and mask semantics
pub mod anomaly;
pub mod channel;
pub mod field;
pub mod frame;
