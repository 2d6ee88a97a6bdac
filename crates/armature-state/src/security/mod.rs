//! Security expressions and access checking

pub mod checker;
pub mod evaluator;
pub mod expression;

pub use checker::{ExpressionAccessChecker, ResourceAccessChecker};
pub use evaluator::{PUBLIC_ACCESS, SecurityVariables, evaluate, evaluate_bool, truthy};
pub use expression::{BinaryOp, Expr, parse_expression};
