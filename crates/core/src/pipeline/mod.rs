pub mod capture_state_use_case;
pub mod cube_state;
pub mod solve_use_case;
