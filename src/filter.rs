//! 基于记录校验的序列过滤

use crate::ast::Condition;
use crate::config::ValidatorConfig;
use crate::error::{EvalError, Result};
use crate::evaluator::RecordEvaluator;
use crate::flatten::flatten_value;
use crate::value::{ToValue, Value};

fn keep(condition: &Condition, item: &Value, config: &ValidatorConfig) -> Result<bool> {
    let record = flatten_value(item, config)?;
    RecordEvaluator::new(&record, config).evaluate(condition)
}

/// 按原顺序保留 `Value::List` 中满足 `condition` 的元素
/// 第一个出错的元素会中止扫描
pub fn filter_sequence(condition: &Condition, sequence: &Value, config: &ValidatorConfig) -> Result<Value> {
    let items = match sequence {
        Value::List(items) => items,
        Value::Null => return Err(EvalError::InvalidData("sequence is null".to_string())),
        other => {
            return Err(EvalError::InvalidType(format!(
                "expected a sequence, got {}",
                other.kind_name()
            )))
        }
    };

    let mut kept = Vec::new();
    for item in items {
        if keep(condition, item, config)? {
            kept.push(item.clone());
        }
    }
    Ok(Value::List(kept))
}

/// [`filter_sequence`] 的强类型版本，返回指向 `items` 元素的引用
pub fn filter_slice<'t, T: ToValue>(
    condition: &Condition,
    items: &'t [T],
    config: &ValidatorConfig,
) -> Result<Vec<&'t T>> {
    let mut kept = Vec::new();
    for item in items {
        if keep(condition, &item.to_value(), config)? {
            kept.push(item);
        }
    }
    Ok(kept)
}
