//! Customer records: data model and form validation.

pub mod model;
pub mod validation;

pub use model::{Customer, CustomerUpdate, NewCustomer};
pub use validation::{CustomerForm, ValidationErrors};
