//! 条件查询校验库
//!
//! 把 `id=1 && (division=eng || division=fin)` 这样的查询编译成条件树，
//! 然后对内存中的记录求值、过滤记录序列，或者与另一条规则比较。
//!
//! ```
//! use query_validator::{Record, Validator};
//!
//! let validator = Validator::new("id=1 && (division=eng || division=fin)");
//! let record = Record::new("Member").field("id", 1).field("division", "fin");
//! assert!(validator.validate(&record).unwrap());
//! ```

pub mod ast;
pub mod comparison;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod filter;
pub mod flatten;
pub mod lexer;
pub mod parser;
pub mod processor;
pub mod token;
pub mod utils;
pub mod value;

pub use ast::{Attribute, Clause, Condition, Connector, Group, OperatorKind, ValueType};
pub use config::{ConfigError, ValidatorConfig};
pub use error::{EvalError, Result};
pub use flatten::FlatRecord;
pub use processor::{compile, Validator};
pub use value::{Field, Record, ToValue, Value};
