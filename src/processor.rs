//! 对外入口
//!
//! 查询只编译一次，之后用得到的 [`Validator`] 校验记录、过滤序列，
//! 或者与其他规则比较。编译好的条件树是只读的，可以在多个线程间共享。

use log::debug;

use crate::ast::Condition;
use crate::comparison::ConditionComparator;
use crate::config::ValidatorConfig;
use crate::error::Result;
use crate::evaluator::RecordEvaluator;
use crate::filter;
use crate::flatten::{flatten_many, flatten_value, FlatRecord};
use crate::lexer::tokenize;
use crate::parser::Parser;
use crate::value::{ToValue, Value};

/// 把查询文本编译成条件树，从不失败，参见 [`Condition::has_attributes`]
pub fn compile(query: &str) -> Condition {
    let tokens = tokenize(query);
    let condition = Parser::new(&tokens).parse();
    debug!(
        "compiled query: {} tokens, {} attributes",
        tokens.len(),
        condition.leaf_count()
    );
    condition
}

/// 编译好的条件以及读取记录时使用的配置
#[derive(Debug, Clone, PartialEq)]
pub struct Validator {
    condition: Condition,
    config: ValidatorConfig,
}

impl Validator {
    pub fn new(query: &str) -> Self {
        Self::from_condition(compile(query))
    }

    pub fn from_condition(condition: Condition) -> Self {
        Self {
            condition,
            config: ValidatorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn set_remove_prefix(&mut self, value: bool) -> &mut Self {
        self.config.remove_prefix = value;
        self
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// 校验单条记录，null 或非记录值返回错误
    pub fn validate(&self, data: &dyn ToValue) -> Result<bool> {
        let record = flatten_value(&data.to_value(), &self.config)?;
        self.validate_flat(&record)
    }

    /// 校验已经展平的记录
    pub fn validate_flat(&self, record: &FlatRecord) -> Result<bool> {
        RecordEvaluator::new(record, &self.config).evaluate(&self.condition)
    }

    /// 把多条异构记录展平到同一个命名空间后校验
    pub fn validate_many(&self, data: &[&dyn ToValue]) -> Result<bool> {
        let values: Vec<Value> = data.iter().map(|d| d.to_value()).collect();
        let record = flatten_many(&values, &self.config)?;
        self.validate_flat(&record)
    }

    /// 以当前规则为参考，与另一条编译好的规则比较
    pub fn validate_condition(&self, input: &Condition) -> bool {
        ConditionComparator::new(&self.condition).matches(input)
    }

    pub fn filter_sequence(&self, sequence: &Value) -> Result<Value> {
        filter::filter_sequence(&self.condition, sequence, &self.config)
    }

    pub fn filter_slice<'t, T: ToValue>(&self, items: &'t [T]) -> Result<Vec<&'t T>> {
        filter::filter_slice(&self.condition, items, &self.config)
    }
}
