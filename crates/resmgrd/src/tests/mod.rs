//! Test suites for the resource-manager daemon.

mod device_behaviour;
mod support;
