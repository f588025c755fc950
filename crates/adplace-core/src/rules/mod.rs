//! Field validation rules shared by creation and update paths

pub mod validation;
