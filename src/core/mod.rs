pub mod expression;
pub mod orchestrator;
pub mod properties;
pub mod resolvers;
pub mod selection;
pub mod validator;
pub mod wildcard;
