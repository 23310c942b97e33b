mod account;
mod customer;
mod integrity;
mod money;
mod transaction;
mod validation;

pub use account::*;
pub use customer::*;
pub use integrity::*;
pub use money::*;
pub use transaction::*;
pub use validation::*;
