//! Resolver logic, independent of the GraphQL context plumbing

pub mod update_fund;
pub mod voters;

pub use update_fund::{update_fund, MutationUpdateFundInput};
pub use voters::resolve_voters;
