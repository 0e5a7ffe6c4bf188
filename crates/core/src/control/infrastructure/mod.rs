pub mod command_solver;
pub mod serial_transport;
