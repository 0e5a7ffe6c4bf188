pub mod command_transport;
pub mod cube_solver;
