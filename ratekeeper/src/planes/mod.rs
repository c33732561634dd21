// Data plane serves reads, control plane handles currency administration
pub mod control;
pub mod data;
