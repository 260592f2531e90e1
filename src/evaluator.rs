//! 记录校验引擎
//!
//! 在展平后的记录上对条件树求值。分组按每个子节点的连接符严格从左到右折叠。
//! 叶子在记录中查找属性，按字段的运行时类型比较：
//!
//! | 字段类型 | 字面量解析为 | 运算符 |
//! |---|---|---|
//! | 整数 | `i64`（小数字面量退回 `f64`） | `=` `!=` 大小比较 |
//! | 浮点数 | `f64` | `=` `!=` 大小比较 |
//! | 日期时间 | RFC 3339 时间点 | `=` `!=` 大小比较 |
//! | 布尔 | `t` / `true` | `=` `!=` |
//! | 文本 | 原始文本 | 全部 |
//!
//! 文本字段上的大小比较使用字面量的推断类型：数字字面量把字段解析成数字比较，
//! 日期字面量把字段解析成日期比较（无法解析的字段不匹配），
//! 纯文本字面量直接报错。

use std::borrow::Cow;
use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};
use log::trace;
use regex::Regex;

use crate::ast::{Attribute, Condition, OperatorKind, ValueType};
use crate::config::ValidatorConfig;
use crate::error::{EvalError, Result};
use crate::flatten::FlatRecord;
use crate::utils::{normalize_name, parse_datetime, parse_integer, parse_number, str_to_bool};
use crate::value::Value;

pub struct RecordEvaluator<'a> {
    record: &'a FlatRecord,
    config: &'a ValidatorConfig,
}

impl<'a> RecordEvaluator<'a> {
    pub fn new(record: &'a FlatRecord, config: &'a ValidatorConfig) -> Self {
        Self { record, config }
    }

    pub fn evaluate(&self, condition: &Condition) -> Result<bool> {
        match condition {
            Condition::Leaf(attr) => self.evaluate_leaf(attr),
            Condition::Group(group) => {
                let mut result = self.evaluate(group.head())?;
                for clause in group.clauses() {
                    let next = self.evaluate(&clause.condition)?;
                    result = clause.connector.fold(result, next);
                }
                Ok(result)
            }
        }
    }

    fn lookup_name<'n>(&self, name: &'n str) -> Cow<'n, str> {
        if self.config.snake_case_names {
            Cow::Owned(normalize_name(name))
        } else {
            Cow::Borrowed(name)
        }
    }

    fn evaluate_leaf(&self, attr: &Attribute) -> Result<bool> {
        if attr.is_empty() {
            return Ok(false);
        }

        let name = self.lookup_name(&attr.name);
        let Some(value) = self.record.get(&name) else {
            trace!("{}: attribute not present", attr);
            return Ok(false);
        };

        let result = compare_field(attr, value)?;
        trace!("{} against {:?}: {}", attr, value, result);
        Ok(result)
    }
}

/// 比较一个字段值与叶子的字面量
pub fn compare_field(attr: &Attribute, value: &Value) -> Result<bool> {
    let op = attr.operator;
    let literal = attr.value.as_str();

    match value {
        Value::Null => Ok(false),
        Value::Int(field) => {
            reject_text_operators(attr, value)?;
            if let Some(lit) = parse_integer(literal) {
                Ok(ordering_matches(op, field.cmp(&lit)))
            } else if let Some(lit) = parse_number(literal) {
                Ok(float_matches(op, *field as f64, lit))
            } else {
                Err(malformed(attr, "integer"))
            }
        }
        Value::Float(field) => {
            reject_text_operators(attr, value)?;
            let lit = parse_number(literal).ok_or_else(|| malformed(attr, "number"))?;
            Ok(float_matches(op, *field, lit))
        }
        Value::DateTime(field) => {
            reject_text_operators(attr, value)?;
            let lit = parse_datetime(literal).ok_or_else(|| malformed(attr, "date-time"))?;
            Ok(ordering_matches(op, field.cmp(&lit)))
        }
        Value::Bool(field) => match op {
            OperatorKind::Eq => Ok(*field == str_to_bool(literal)),
            OperatorKind::NotEq => Ok(*field != str_to_bool(literal)),
            _ => Err(unsupported(attr, value)),
        },
        Value::Text(field) => compare_text(attr, field),
        Value::Record(_) | Value::List(_) => Err(EvalError::UnsupportedKind {
            field: attr.name.clone(),
            kind: value.kind_name(),
        }),
    }
}

fn compare_text(attr: &Attribute, field: &str) -> Result<bool> {
    let literal = attr.value.as_str();
    match attr.operator {
        OperatorKind::Eq => Ok(field == literal),
        OperatorKind::NotEq => Ok(field != literal),
        OperatorKind::Contains => Ok(field.contains(literal)),
        OperatorKind::ContainsRegex => Ok(compile_pattern(literal)?.is_match(field)),
        op => match attr.value_type {
            ValueType::Numeric => Ok(match parse_number(field) {
                Some(number) => float_matches(op, number, parse_number(literal).unwrap_or(0.0)),
                None => false,
            }),
            ValueType::Date => Ok(match (parse_datetime(field), parse_datetime(literal)) {
                (Some(a), Some(b)) => date_matches(op, &a, &b),
                _ => false,
            }),
            ValueType::Text => Err(EvalError::UnsupportedOperator {
                field: attr.name.clone(),
                operator: op,
                kind: "text",
            }),
        },
    }
}

pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| EvalError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn reject_text_operators(attr: &Attribute, value: &Value) -> Result<()> {
    match attr.operator {
        OperatorKind::Contains | OperatorKind::ContainsRegex => Err(unsupported(attr, value)),
        _ => Ok(()),
    }
}

fn unsupported(attr: &Attribute, value: &Value) -> EvalError {
    EvalError::UnsupportedOperator {
        field: attr.name.clone(),
        operator: attr.operator,
        kind: value.kind_name(),
    }
}

fn malformed(attr: &Attribute, expected: &'static str) -> EvalError {
    EvalError::MalformedLiteral {
        field: attr.name.clone(),
        literal: attr.value.clone(),
        expected,
    }
}

/// 把相等或大小运算符应用到 `field.cmp(literal)` 的结果上
pub(crate) fn ordering_matches(op: OperatorKind, ordering: Ordering) -> bool {
    match op {
        OperatorKind::Eq => ordering == Ordering::Equal,
        OperatorKind::NotEq => ordering != Ordering::Equal,
        OperatorKind::Lt => ordering == Ordering::Less,
        OperatorKind::Lte => ordering != Ordering::Greater,
        OperatorKind::Gt => ordering == Ordering::Greater,
        OperatorKind::Gte => ordering != Ordering::Less,
        OperatorKind::Contains | OperatorKind::ContainsRegex => false,
    }
}

pub(crate) fn float_matches(op: OperatorKind, field: f64, literal: f64) -> bool {
    match field.partial_cmp(&literal) {
        Some(ordering) => ordering_matches(op, ordering),
        // NaN 与任何值都不相等
        None => op == OperatorKind::NotEq,
    }
}

pub(crate) fn date_matches(
    op: OperatorKind,
    field: &DateTime<FixedOffset>,
    literal: &DateTime<FixedOffset>,
) -> bool {
    ordering_matches(op, field.cmp(literal))
}
